use crate::column::{Column, ColumnKind};
use crate::error::{OrmError, Result};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const ID: &str = "id";
pub const CREATED: &str = "created";
pub const MODIFIED: &str = "modified";
pub const CREATED_BY: &str = "createdBy";
pub const LAST_MODIFIED_BY: &str = "lastModifiedBy";

/// Bookkeeping columns every record type carries ahead of its own.
pub const IMPLICIT_COLUMNS: [&str; 5] = [ID, CREATED, MODIFIED, CREATED_BY, LAST_MODIFIED_BY];

fn implicit_columns() -> Vec<Column> {
    vec![
        Column::string(ID),
        Column::date(CREATED),
        Column::date(MODIFIED),
        Column::string(CREATED_BY).optional(),
        Column::string(LAST_MODIFIED_BY).optional(),
    ]
}

/// The ordered column list of one record type. Built once, shared by
/// every entity of that type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    name: String,
    columns: Vec<Column>,
}

impl RecordSchema {
    pub fn builder(name: &str) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Record type name; also the backing table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Implicit columns followed by declared columns, in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn declared_columns(&self) -> &[Column] {
        &self.columns[IMPLICIT_COLUMNS.len()..]
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn is_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn foreign_keys(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::ForeignKey)
    }
}

pub struct RecordSchemaBuilder {
    name: String,
    columns: Vec<Column>,
}

impl RecordSchemaBuilder {
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.columns.extend(columns);
        self
    }

    pub fn build(self) -> Result<RecordSchema> {
        if self.name.trim().is_empty() {
            return Err(OrmError::Schema("Record type name must not be empty".into()));
        }

        let mut columns = implicit_columns();
        for column in self.columns {
            if column.name.trim().is_empty() {
                return Err(OrmError::Schema(format!(
                    "Record '{}' declares a column with an empty name",
                    self.name
                )));
            }
            if IMPLICIT_COLUMNS.contains(&column.name.as_str()) {
                return Err(OrmError::Schema(format!(
                    "Column '{}.{}' clashes with an implicit column",
                    self.name, column.name
                )));
            }
            if columns.iter().any(|c| c.name == column.name) {
                return Err(OrmError::Schema(format!(
                    "Column '{}.{}' is declared twice",
                    self.name, column.name
                )));
            }
            match (column.kind, &column.foreign_type) {
                (ColumnKind::ForeignKey, None) => {
                    return Err(OrmError::Schema(format!(
                        "Foreign key '{}.{}' has no target record type",
                        self.name, column.name
                    )));
                }
                (kind, Some(_)) if kind != ColumnKind::ForeignKey => {
                    return Err(OrmError::Schema(format!(
                        "Column '{}.{}' has a target but is not a foreign key",
                        self.name, column.name
                    )));
                }
                _ => {}
            }
            columns.push(column);
        }

        Ok(RecordSchema {
            name: self.name,
            columns,
        })
    }
}

/// Engine settings, read from the `settings` block of schema.yaml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Length of generated record ids.
    #[serde(default = "default_id_length")]
    pub id_length: i64,
}

fn default_id_length() -> i64 {
    8
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            id_length: default_id_length(),
        }
    }
}

/// Every record type known to an [`crate::Orm`], keyed by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaDefinition {
    pub settings: Settings,
    records: HashMap<String, Arc<RecordSchema>>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_record(mut self, record: RecordSchema) -> Self {
        self.records.insert(record.name.clone(), Arc::new(record));
        self
    }

    pub fn record(&self, name: &str) -> Result<&Arc<RecordSchema>> {
        self.records
            .get(name)
            .ok_or_else(|| OrmError::Schema(format!("Record type '{name}' not found in schema")))
    }

    pub fn record_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.records.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Check that every foreign key targets a declared record type.
    pub fn validate(&self) -> Result<()> {
        for record in self.records.values() {
            for column in record.foreign_keys() {
                let target = column.foreign_type.as_deref().unwrap_or_default();
                if !self.records.contains_key(target) {
                    return Err(OrmError::Schema(format!(
                        "Foreign key '{}.{}' targets unknown record type '{}'",
                        record.name, column.name, target
                    )));
                }
            }
        }
        Ok(())
    }
}

// ── schema.yaml file format ─────────────────────────────────────

/// Top-level layout of schema.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub records: HashMap<String, RecordDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDefinition {
    /// A sequence, so declaration order survives parsing.
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
}

fn default_required() -> bool {
    true
}

impl ColumnDefinition {
    pub fn to_column(&self) -> Result<Column> {
        let mut column = match self.kind {
            ColumnKind::ForeignKey => {
                Column::foreign_key(&self.name, self.target.as_deref().unwrap_or_default())
            }
            ColumnKind::Date => Column::date(&self.name),
            ColumnKind::Time => Column::time(&self.name),
            ColumnKind::String => Column::string(&self.name),
            ColumnKind::Number => Column::number(&self.name),
            ColumnKind::Boolean => Column::boolean(&self.name),
        }
        .required(self.required);

        if self.kind == ColumnKind::ForeignKey && self.target.as_deref().unwrap_or("").is_empty() {
            return Err(OrmError::Schema(format!(
                "Foreign key column '{}' needs a target",
                self.name
            )));
        }
        if self.kind != ColumnKind::ForeignKey && self.target.is_some() {
            column.foreign_type = self.target.clone();
        }

        if let Some(default) = &self.default {
            let json = serde_json::to_value(default)?;
            column = column.with_default(Value::from_json(&json))?;
        }
        Ok(column)
    }
}

impl SchemaFile {
    pub fn into_definition(self) -> Result<SchemaDefinition> {
        let mut definition = SchemaDefinition::new().with_settings(self.settings);
        for (name, record) in &self.records {
            let columns = record
                .columns
                .iter()
                .map(ColumnDefinition::to_column)
                .collect::<Result<Vec<_>>>()?;
            definition = definition.with_record(RecordSchema::builder(name).columns(columns).build()?);
        }
        definition.validate()?;
        Ok(definition)
    }
}
