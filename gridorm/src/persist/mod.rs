// Persistence - create-or-update dispatch, stamping, validation, removal

use crate::entity::{entity_to_row, Entity};
use crate::error::Result;
use crate::id::generate_id;
use crate::orm::Orm;
use crate::schema::{CREATED, CREATED_BY, ID, LAST_MODIFIED_BY, MODIFIED};
use crate::sync::resolve_table;
use crate::validation::validate_row;
use crate::value::Value;
use chrono::Utc;

impl Orm {
    /// Insert or overwrite the row backing `entity`.
    ///
    /// An entity that is not stored (no id yet, or removed) is appended as a
    /// new row; one that is stored is overwritten in place. A new id and the
    /// creation stamps are assigned only when the entity has no id.
    ///
    /// All stamping happens on a staged copy; if validation or the store
    /// fails, `entity` is left exactly as it was.
    pub fn persist(&self, entity: &mut Entity) -> Result<()> {
        let resolved = resolve_table(self.store(), entity.schema())?;

        let mut staged = entity.clone();
        let now = Value::Date(Utc::now());
        staged.assign(MODIFIED, now.clone())?;
        if let Some(actor) = self.identity.current_actor_email() {
            staged.assign(LAST_MODIFIED_BY, Value::Text(actor))?;
        }

        let inserting = staged.id().is_empty() || !staged.is_stored();
        if staged.id().is_empty() {
            let id = generate_id(self.settings().id_length)?;
            staged.assign(ID, Value::Text(id))?;
            staged.assign(CREATED, now)?;
            let created_by = staged.get(LAST_MODIFIED_BY).cloned().unwrap_or_default();
            staged.assign(CREATED_BY, created_by)?;
        }

        let row = entity_to_row(&staged, &resolved.headers);
        let column_headers: Vec<String> = resolved
            .headers
            .iter()
            .filter(|h| staged.schema().is_column(h))
            .cloned()
            .collect();
        validate_row(staged.schema(), &column_headers, &row)?;

        if inserting {
            self.store.append_row(&resolved.table, &row)?;
            let row_number = self.store.last_row_index(&resolved.table)?;
            staged.set_row_number(row_number);
            log::debug!(
                "Inserted {} '{}' at row {row_number}",
                staged.record_type(),
                staged.id()
            );
        } else {
            self.store
                .write_row(&resolved.table, staged.row_number(), &row)?;
            log::debug!(
                "Updated {} '{}' at row {}",
                staged.record_type(),
                staged.id(),
                staged.row_number()
            );
        }

        self.store.commit()?;
        *entity = staged;
        Ok(())
    }

    /// Delete the row backing `entity` and detach it (row number 0).
    ///
    /// The id is kept, so persisting the entity again appends a fresh row
    /// with the same id. Rows below the deleted one move up by one; other
    /// in-memory entities of the same table keep their old row numbers.
    pub fn remove(&self, entity: &mut Entity) -> Result<()> {
        if !entity.is_stored() {
            return Ok(());
        }

        let resolved = resolve_table(self.store(), entity.schema())?;
        self.store
            .delete_row(&resolved.table, entity.row_number())?;
        log::debug!(
            "Removed {} '{}' from row {}",
            entity.record_type(),
            entity.id(),
            entity.row_number()
        );
        entity.set_row_number(0);

        self.store.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::error::OrmError;
    use crate::identity::StaticIdentity;
    use crate::schema::{RecordSchema, SchemaDefinition, Settings};
    use crate::tabular::{MemoryStore, TabularStore};

    fn item_schema() -> SchemaDefinition {
        SchemaDefinition::new().with_record(
            RecordSchema::builder("Item")
                .column(Column::string("name"))
                .column(Column::number("qty"))
                .build()
                .unwrap(),
        )
    }

    fn setup() -> (MemoryStore, Orm) {
        let store = MemoryStore::new();
        let orm = Orm::new(store.clone(), item_schema()).unwrap();
        (store, orm)
    }

    fn item(orm: &Orm, name: &str, qty: i64) -> Entity {
        orm.new_entity("Item")
            .unwrap()
            .with("name", name)
            .unwrap()
            .with("qty", qty)
            .unwrap()
    }

    #[test]
    fn test_insert_assigns_id_and_row() {
        let (store, orm) = setup();
        let mut widget = item(&orm, "widget", 5);
        orm.persist(&mut widget).unwrap();

        assert_eq!(widget.id().len(), 8);
        assert!(widget.id().chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(widget.row_number(), 2);
        assert!(widget.created().is_some());
        assert_eq!(widget.created(), widget.modified());

        let table = store.get_table("Item").unwrap().unwrap();
        assert_eq!(store.last_row_index(&table).unwrap(), 2);
    }

    #[test]
    fn test_second_insert_takes_next_row() {
        let (_store, orm) = setup();
        let mut a = item(&orm, "a", 1);
        let mut b = item(&orm, "b", 2);
        orm.persist(&mut a).unwrap();
        orm.persist(&mut b).unwrap();
        assert_eq!(b.row_number(), 3);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_update_overwrites_in_place() {
        let (store, orm) = setup();
        let mut widget = item(&orm, "widget", 5);
        orm.persist(&mut widget).unwrap();
        let id = widget.id().to_string();
        let created = widget.created();

        widget.set("qty", 6).unwrap();
        orm.persist(&mut widget).unwrap();

        assert_eq!(widget.id(), id);
        assert_eq!(widget.row_number(), 2);
        assert_eq!(widget.created(), created);
        let table = store.get_table("Item").unwrap().unwrap();
        assert_eq!(store.last_row_index(&table).unwrap(), 2);
        let found = orm.find_by_id("Item", &id).unwrap().unwrap();
        assert_eq!(found.get("qty"), Some(&Value::Number(6.0)));
    }

    #[test]
    fn test_missing_required_column_rejected() {
        let (store, orm) = setup();
        let mut blank_name = item(&orm, "", 5);
        let before = blank_name.clone();

        let err = orm.persist(&mut blank_name).unwrap_err();
        assert_eq!(err.missing_columns().unwrap(), &["name".to_string()]);
        assert_eq!(blank_name, before);

        let table = store.get_table("Item").unwrap().unwrap();
        assert_eq!(store.last_row_index(&table).unwrap(), 1);
    }

    #[test]
    fn test_rejected_update_leaves_store_untouched() {
        let (store, orm) = setup();
        let mut widget = item(&orm, "widget", 5);
        orm.persist(&mut widget).unwrap();
        let snapshot = store.snapshot();

        widget.set("name", "").unwrap();
        assert!(matches!(
            orm.persist(&mut widget),
            Err(OrmError::Validation { .. })
        ));
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn test_actor_stamps() {
        let store = MemoryStore::new();
        let orm = Orm::new(store, item_schema())
            .unwrap()
            .with_identity(StaticIdentity("ann@example.com".into()));
        let mut widget = item(&orm, "widget", 1);
        orm.persist(&mut widget).unwrap();
        assert_eq!(widget.created_by(), Some("ann@example.com"));
        assert_eq!(widget.last_modified_by(), Some("ann@example.com"));
    }

    #[test]
    fn test_unknown_actor_leaves_stamps_unchanged() {
        let (_store, orm) = setup();
        let mut widget = item(&orm, "widget", 1);
        orm.persist(&mut widget).unwrap();
        assert_eq!(widget.created_by(), None);
        assert_eq!(widget.last_modified_by(), None);
    }

    #[test]
    fn test_bad_id_length_is_configuration_error() {
        let store = MemoryStore::new();
        let schema = item_schema().with_settings(Settings { id_length: 0 });
        let orm = Orm::new(store, schema).unwrap();
        let mut widget = item(&orm, "widget", 1);
        assert!(matches!(
            orm.persist(&mut widget),
            Err(OrmError::Configuration(_))
        ));
        assert_eq!(widget.id(), "");
    }

    #[test]
    fn test_remove_then_persist_reuses_id() {
        let (store, orm) = setup();
        let mut a = item(&orm, "a", 1);
        let mut b = item(&orm, "b", 2);
        orm.persist(&mut a).unwrap();
        orm.persist(&mut b).unwrap();
        let id = a.id().to_string();
        let commits = store.commit_count();

        orm.remove(&mut a).unwrap();
        assert_eq!(a.row_number(), 0);
        assert_eq!(a.id(), id);
        assert!(store.commit_count() > commits);
        assert!(orm.find_by_id("Item", &id).unwrap().is_none());
        // b moved up into the freed row
        assert_eq!(orm.find_by_id("Item", b.id()).unwrap().unwrap().row_number(), 2);

        orm.persist(&mut a).unwrap();
        assert_eq!(a.id(), id);
        assert_eq!(a.row_number(), 3);
    }

    #[test]
    fn test_remove_unstored_is_noop() {
        let (store, orm) = setup();
        let mut widget = item(&orm, "widget", 1);
        orm.remove(&mut widget).unwrap();
        assert_eq!(store.commit_count(), 0);
        assert!(store.get_table("Item").unwrap().is_none());
    }
}
