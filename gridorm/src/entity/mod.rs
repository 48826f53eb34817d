// Entities and the row <-> entity mapper

use crate::error::{OrmError, Result};
use crate::schema::{self, RecordSchema, IMPLICIT_COLUMNS};
use crate::sync::header_name;
use crate::tabular::Grid;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A live instance of a record type.
///
/// Column values are kept in schema order. `row_number` is the 1-based grid
/// row backing the entity, 0 while it is not stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
    row_number: usize,
    references: BTreeMap<String, Option<Entity>>,
}

/// Suffix appended to a foreign-key column name to name its resolved entity.
pub const REFERENCE_SUFFIX: &str = "Ref";

impl Entity {
    /// A blank entity: every column at its default, not backed by a row.
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = schema.columns().iter().map(|c| c.default.clone()).collect();
        Entity {
            schema,
            values,
            row_number: 0,
            references: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn record_type(&self) -> &str {
        self.schema.name()
    }

    /// Empty until the entity is first persisted.
    pub fn id(&self) -> &str {
        self.text(schema::ID).unwrap_or_default()
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn is_stored(&self) -> bool {
        self.row_number > 0
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.get(schema::CREATED).and_then(Value::as_date)
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.get(schema::MODIFIED).and_then(Value::as_date)
    }

    pub fn created_by(&self) -> Option<&str> {
        self.text(schema::CREATED_BY).filter(|s| !s.is_empty())
    }

    pub fn last_modified_by(&self) -> Option<&str> {
        self.text(schema::LAST_MODIFIED_BY).filter(|s| !s.is_empty())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.schema.column_index(column).map(|i| &self.values[i])
    }

    fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Assign a declared column. The value is checked against the column's
    /// kind; the implicit bookkeeping columns are not assignable.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> Result<()> {
        if IMPLICIT_COLUMNS.contains(&column) {
            return Err(OrmError::Schema(format!(
                "Column '{}.{column}' is maintained by the engine",
                self.record_type()
            )));
        }
        self.assign(column, value.into())
    }

    /// Builder form of [`Entity::set`].
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Result<Self> {
        self.set(column, value)?;
        Ok(self)
    }

    pub(crate) fn assign(&mut self, column: &str, value: Value) -> Result<()> {
        let index = self
            .schema
            .column_index(column)
            .ok_or_else(|| OrmError::UnknownColumn {
                record: self.schema.name().to_string(),
                column: column.to_string(),
            })?;
        self.values[index] = self.schema.columns()[index].coerce(value)?;
        Ok(())
    }

    pub(crate) fn set_row_number(&mut self, row_number: usize) {
        self.row_number = row_number;
    }

    /// The value a filter sees under `key`: a column value, the row number
    /// for `rowNumber`, and `Empty` for anything else.
    pub fn property(&self, key: &str) -> Value {
        if key == "rowNumber" {
            return Value::Number(self.row_number as f64);
        }
        self.get(key).cloned().unwrap_or_default()
    }

    /// `(column name, value)` pairs in schema order.
    pub fn column_values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .zip(self.values.iter())
    }

    /// Same record type and the same value in every column.
    pub fn same_columns(&self, other: &Entity) -> bool {
        self.schema.name() == other.schema.name() && self.values == other.values
    }

    /// The entity resolved for a foreign-key column by the last expansion.
    pub fn reference(&self, column: &str) -> Option<&Entity> {
        self.references
            .get(&reference_name(column))
            .and_then(Option::as_ref)
    }

    /// Resolved references keyed by derived name (`<column>Ref`).
    pub fn references(&self) -> &BTreeMap<String, Option<Entity>> {
        &self.references
    }

    pub(crate) fn references_mut(&mut self) -> &mut BTreeMap<String, Option<Entity>> {
        &mut self.references
    }
}

pub fn reference_name(column: &str) -> String {
    format!("{column}{REFERENCE_SUFFIX}")
}

/// One data row keyed by header name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// Grid row the record was read from (header is row 1).
    pub row_number: usize,
    pub fields: HashMap<String, Value>,
}

/// Turn a grid whose first row is the header row into keyed records.
///
/// Data row at zero-based index `i` gets row number `i + 2`. Cells are keyed
/// by position; a short row leaves trailing keys unset and blank header
/// cells key nothing.
pub fn grid_to_records(grid: &Grid) -> Vec<RawRecord> {
    let Some((header_row, rows)) = grid.split_first() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(header_name).collect();

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let mut fields = HashMap::new();
            for (header, cell) in headers.iter().zip(row.iter()) {
                if !header.is_empty() {
                    fields.entry(header.clone()).or_insert_with(|| cell.clone());
                }
            }
            RawRecord {
                row_number: i + 2,
                fields,
            }
        })
        .collect()
}

/// Hydrate a blank entity of `schema` from a record. Columns the record does
/// not carry keep their defaults.
///
/// A cell outside its column's domain (a hand edit, or a column whose kind
/// changed) reads as `Empty` and is logged; the row itself is never dropped.
pub fn record_to_entity(schema: &Arc<RecordSchema>, record: RawRecord) -> Result<Entity> {
    let mut entity = Entity::new(schema.clone());
    let mut fields = record.fields;
    for column in schema.columns() {
        let Some(value) = fields.remove(&column.name) else {
            continue;
        };
        if let Err(e) = entity.assign(&column.name, value) {
            log::warn!(
                "{} row {}: {e}; reading the cell as empty",
                schema.name(),
                record.row_number
            );
            entity.assign(&column.name, Value::Empty)?;
        }
    }
    entity.set_row_number(record.row_number);
    Ok(entity)
}

/// Flatten an entity into a row following `headers`. Headers that are not
/// columns of the entity contribute nothing.
pub fn entity_to_row(entity: &Entity, headers: &[String]) -> Vec<Value> {
    headers
        .iter()
        .filter_map(|header| entity.get(header).cloned())
        .collect()
}
