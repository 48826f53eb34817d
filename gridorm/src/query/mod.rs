// Query engine - whole-table reads, lookup by id, predicate filtering

use crate::entity::{grid_to_records, record_to_entity, Entity};
use crate::error::Result;
use crate::orm::Orm;
use crate::value::Value;
use std::fmt;

/// One filter condition on an entity property.
pub enum Condition {
    /// Invoked with the property's current value.
    Predicate(Box<dyn Fn(&Value) -> bool>),
    /// A plain value in place of a predicate. It is never compared and
    /// always holds, so it narrows nothing. Use `Predicate` to match a value.
    Unchecked(Value),
}

impl Condition {
    fn holds(&self, value: &Value) -> bool {
        match self {
            Condition::Predicate(predicate) => predicate(value),
            Condition::Unchecked(_) => true,
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
            Condition::Unchecked(v) => f.debug_tuple("Unchecked").field(v).finish(),
        }
    }
}

/// Conditions keyed by property name, all of which must hold.
#[derive(Debug, Default)]
pub struct Conditions {
    entries: Vec<(String, Condition)>,
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `predicate` to hold for the value under `key`.
    pub fn with(mut self, key: &str, predicate: impl Fn(&Value) -> bool + 'static) -> Self {
        self.entries
            .push((key.to_string(), Condition::Predicate(Box::new(predicate))));
        self
    }

    /// Require the value under `key` to equal `expected`.
    pub fn equals(self, key: &str, expected: impl Into<Value>) -> Self {
        let expected = expected.into();
        self.with(key, move |value| *value == expected)
    }

    /// Attach a non-predicate value. It is vacuously satisfied.
    pub fn unchecked(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.entries
            .push((key.to_string(), Condition::Unchecked(value.into())));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.entries
            .iter()
            .all(|(key, condition)| condition.holds(&entity.property(key)))
    }
}

impl Orm {
    /// Every entity of a record type, loading the whole table.
    ///
    /// Every data row maps to an entity. Cells that do not fit their column
    /// kind read as `Empty`.
    pub fn find_all(&self, record: &str) -> Result<Vec<Entity>> {
        let schema = self.record(record)?.clone();
        let resolved = self.sync(record)?;

        let last_row = self.store.last_row_index(&resolved.table)?;
        let last_col = self.store.last_column_index(&resolved.table)?;
        if last_row < 2 {
            return Ok(Vec::new());
        }

        let grid = self
            .store
            .read_range(&resolved.table, 1, 1, last_row, last_col)?;

        grid_to_records(&grid)
            .into_iter()
            .map(|raw| record_to_entity(&schema, raw))
            .collect()
    }

    /// The first entity whose id equals `id`. An empty id matches nothing.
    pub fn find_by_id(&self, record: &str, id: &str) -> Result<Option<Entity>> {
        if id.is_empty() {
            return Ok(None);
        }
        Ok(self
            .find_all(record)?
            .into_iter()
            .find(|entity| entity.id() == id))
    }

    /// Entities for which every condition holds. No conditions match
    /// nothing.
    pub fn filter_by_conditions(&self, record: &str, conditions: &Conditions) -> Result<Vec<Entity>> {
        if conditions.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .find_all(record)?
            .into_iter()
            .filter(|entity| conditions.matches(entity))
            .collect())
    }
}
