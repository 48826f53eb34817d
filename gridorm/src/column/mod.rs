// Column type registry - kinds, factories, per-kind value domains

use crate::error::{OrmError, Result};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// The six column kinds. Serialized by their short tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "time")]
    Time,
    #[serde(rename = "str")]
    String,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "bool")]
    Boolean,
    #[serde(rename = "fk")]
    ForeignKey,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; 6] = [
        ColumnKind::Date,
        ColumnKind::Time,
        ColumnKind::String,
        ColumnKind::Number,
        ColumnKind::Boolean,
        ColumnKind::ForeignKey,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ColumnKind::Date => "date",
            ColumnKind::Time => "time",
            ColumnKind::String => "str",
            ColumnKind::Number => "number",
            ColumnKind::Boolean => "bool",
            ColumnKind::ForeignKey => "fk",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ColumnKind> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// The blank value a freshly constructed entity holds for this kind.
    pub fn default_value(&self) -> Value {
        match self {
            ColumnKind::String | ColumnKind::ForeignKey => Value::Text(String::new()),
            ColumnKind::Number => Value::Number(0.0),
            ColumnKind::Boolean => Value::Bool(false),
            ColumnKind::Date | ColumnKind::Time => Value::Empty,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            ColumnKind::Date => "date",
            ColumnKind::Time => "time of day",
            ColumnKind::String => "string",
            ColumnKind::Number => "number",
            ColumnKind::Boolean => "boolean",
            ColumnKind::ForeignKey => "record id",
        }
    }

    /// Bring a value into this kind's domain.
    ///
    /// Spreadsheet cells are loosely typed, so text that parses as the
    /// target kind is accepted (a number column reading `"42"`, a string
    /// column reading `42`). Anything else is a type error naming `column`.
    pub fn coerce(&self, column: &str, value: Value) -> Result<Value> {
        if value == Value::Empty {
            return Ok(Value::Empty);
        }

        let mismatch = |found: &Value| OrmError::Type {
            column: column.to_string(),
            expected: self.expected(),
            found: found.type_name(),
        };

        match (self, value) {
            (ColumnKind::String, Value::Text(s)) => Ok(Value::Text(s)),
            (ColumnKind::String, v @ (Value::Number(_) | Value::Bool(_)))
                if v.as_f64().map_or(true, f64::is_finite) =>
            {
                Ok(Value::Text(v.to_json().to_string()))
            }

            // NaN and infinities have no cell representation
            (ColumnKind::Number, Value::Number(n)) if n.is_finite() => Ok(Value::Number(n)),
            (ColumnKind::Number, Value::Text(s)) if s.trim().is_empty() => Ok(Value::Empty),
            (ColumnKind::Number, Value::Text(s)) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Number(n)),
                _ => Err(mismatch(&Value::Text(s))),
            },

            (ColumnKind::Boolean, Value::Bool(b)) => Ok(Value::Bool(b)),
            (ColumnKind::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(Value::Empty),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(mismatch(&Value::Text(s))),
            },

            (ColumnKind::Date, Value::Date(d)) => Ok(Value::Date(d)),
            (ColumnKind::Date, Value::Text(s)) if s.trim().is_empty() => Ok(Value::Empty),
            (ColumnKind::Date, Value::Text(s)) => parse_date(s.trim())
                .map(Value::Date)
                .ok_or_else(|| mismatch(&Value::Text(s))),

            (ColumnKind::Time, Value::Time(t)) => Ok(Value::Time(t)),
            // Sheets keep times of day as dates on an epoch day
            (ColumnKind::Time, Value::Date(d)) => Ok(Value::Time(d.time())),
            (ColumnKind::Time, Value::Text(s)) if s.trim().is_empty() => Ok(Value::Empty),
            (ColumnKind::Time, Value::Text(s)) => parse_time(s.trim())
                .map(Value::Time)
                .ok_or_else(|| mismatch(&Value::Text(s))),

            (ColumnKind::ForeignKey, Value::Text(s)) => Ok(Value::Text(s)),
            // All-digit ids come back as numbers from some sheets
            (ColumnKind::ForeignKey, Value::Number(n)) if n.fract() == 0.0 => {
                Ok(Value::Text(format!("{}", n as i64)))
            }

            (_, other) => Err(mismatch(&other)),
        }
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// A typed column declared on a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub required: bool,
    pub default: Value,
    /// Referenced record type, set only for foreign-key columns.
    pub foreign_type: Option<String>,
}

impl Column {
    fn new(name: &str, kind: ColumnKind) -> Self {
        Column {
            name: name.to_string(),
            kind,
            required: true,
            default: kind.default_value(),
            foreign_type: None,
        }
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    pub fn time(name: &str) -> Self {
        Self::new(name, ColumnKind::Time)
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ColumnKind::String)
    }

    pub fn number(name: &str) -> Self {
        Self::new(name, ColumnKind::Number)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ColumnKind::Boolean)
    }

    pub fn foreign_key(name: &str, referenced_type: &str) -> Self {
        Column {
            foreign_type: Some(referenced_type.to_string()),
            ..Self::new(name, ColumnKind::ForeignKey)
        }
    }

    pub fn optional(self) -> Self {
        self.required(false)
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Replace the blank default. The value must fit the column's kind.
    pub fn with_default(mut self, value: impl Into<Value>) -> Result<Self> {
        self.default = self.kind.coerce(&self.name, value.into())?;
        Ok(self)
    }

    pub fn coerce(&self, value: Value) -> Result<Value> {
        self.kind.coerce(&self.name, value)
    }
}
