use crate::entity::Entity;
use crate::error::{OrmError, Result};
use crate::identity::{EnvIdentity, IdentityProvider, NoIdentity};
use crate::schema::{parse_schema, RecordSchema, SchemaDefinition, Settings};
use crate::sync::{resolve_table, ResolvedTable};
use crate::tabular::{FileStore, TabularStore};
use std::path::Path;
use std::sync::Arc;

pub const SCHEMA_FILE: &str = "schema.yaml";
pub const WORKBOOK_FILE: &str = "workbook.json";

/// The main entry point for GridORM.
///
/// Owns the tabular store, the identity provider and the record types, and
/// is passed explicitly to every query and write.
pub struct Orm {
    pub(crate) store: Box<dyn TabularStore>,
    pub(crate) identity: Box<dyn IdentityProvider>,
    pub(crate) schema: SchemaDefinition,
}

impl Orm {
    /// Bind a schema to a store. No acting user is configured.
    pub fn new(store: impl TabularStore + 'static, schema: SchemaDefinition) -> Result<Self> {
        schema.validate()?;
        Ok(Orm {
            store: Box::new(store),
            identity: Box::new(NoIdentity),
            schema,
        })
    }

    pub fn with_identity(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Open a data directory holding `schema.yaml` and `workbook.json`.
    /// The acting user is read from the `GRIDORM_ACTOR` environment variable.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(OrmError::Configuration(format!(
                "Data directory does not exist: {}",
                path.display()
            )));
        }

        let schema_path = path.join(SCHEMA_FILE);
        if !schema_path.exists() {
            return Err(OrmError::Schema(format!(
                "{SCHEMA_FILE} not found in {}",
                path.display()
            )));
        }

        let schema = parse_schema(&schema_path)?;
        let store = FileStore::open(&path.join(WORKBOOK_FILE))?;
        Ok(Orm::new(store, schema)?.with_identity(EnvIdentity::default()))
    }

    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    pub fn settings(&self) -> &Settings {
        &self.schema.settings
    }

    pub fn store(&self) -> &dyn TabularStore {
        self.store.as_ref()
    }

    pub fn record(&self, name: &str) -> Result<&Arc<RecordSchema>> {
        self.schema.record(name)
    }

    /// A blank, unstored entity of the named record type.
    pub fn new_entity(&self, record: &str) -> Result<Entity> {
        Ok(Entity::new(self.record(record)?.clone()))
    }

    /// Resolve (and if needed create or reshape) the table of a record type.
    pub fn sync(&self, record: &str) -> Result<ResolvedTable> {
        resolve_table(self.store(), self.record(record)?)
    }

    /// Synchronize every record type, in name order.
    pub fn sync_all(&self) -> Result<Vec<ResolvedTable>> {
        self.schema
            .record_names()
            .into_iter()
            .map(|name| self.sync(name))
            .collect()
    }

    /// Row counts per record type. Does not create or reshape tables.
    pub fn status(&self) -> Result<serde_json::Value> {
        let mut records = serde_json::Map::new();
        for name in self.schema.record_names() {
            let rows = match self.store.get_table(name)? {
                Some(table) => self.store.last_row_index(&table)?.saturating_sub(1),
                None => 0,
            };
            records.insert(
                name.to_string(),
                serde_json::json!({ "rows": rows, "columns": self.record(name)?.columns().len() }),
            );
        }

        Ok(serde_json::json!({
            "id_length": self.settings().id_length,
            "records": records,
        }))
    }
}
