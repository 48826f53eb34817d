// Foreign key expansion

use crate::entity::{reference_name, Entity};
use crate::error::Result;
use crate::orm::Orm;
use crate::value::Value;

impl Orm {
    /// Resolve every foreign-key column of `entity` one hop deep.
    ///
    /// Each result is attached under `<column>Ref`; a value with no matching
    /// entity attaches `None`. Resolved entities are not expanded.
    pub fn expand(&self, entity: &mut Entity) -> Result<()> {
        self.expand_to_depth(entity, 1)
    }

    /// Like [`Orm::expand`], following references `depth` hops. Depth 0
    /// does nothing. Cycles are cut off by the depth bound.
    pub fn expand_to_depth(&self, entity: &mut Entity, depth: usize) -> Result<()> {
        if depth == 0 {
            return Ok(());
        }

        let schema = entity.schema().clone();
        for column in schema.foreign_keys() {
            let target = column.foreign_type.as_deref().unwrap_or_default();
            let id = entity
                .get(&column.name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let mut resolved = self.find_by_id(target, &id)?;
            if let Some(found) = resolved.as_mut() {
                self.expand_to_depth(found, depth - 1)?;
            }
            entity
                .references_mut()
                .insert(reference_name(&column.name), resolved);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::schema::{RecordSchema, SchemaDefinition};
    use crate::tabular::MemoryStore;

    fn orm() -> Orm {
        let schema = SchemaDefinition::new()
            .with_record(
                RecordSchema::builder("Team")
                    .column(Column::string("title"))
                    .build()
                    .unwrap(),
            )
            .with_record(
                RecordSchema::builder("User")
                    .column(Column::string("email"))
                    .column(Column::foreign_key("team", "Team").optional())
                    .build()
                    .unwrap(),
            )
            .with_record(
                RecordSchema::builder("Item")
                    .column(Column::string("name"))
                    .column(Column::foreign_key("owner", "User").optional())
                    .build()
                    .unwrap(),
            );
        Orm::new(MemoryStore::new(), schema).unwrap()
    }

    fn persisted(orm: &Orm, record: &str, values: &[(&str, &str)]) -> Entity {
        let mut entity = orm.new_entity(record).unwrap();
        for (column, value) in values {
            entity.set(column, *value).unwrap();
        }
        orm.persist(&mut entity).unwrap();
        entity
    }

    #[test]
    fn test_expand_single_hop() {
        let orm = orm();
        let team = persisted(&orm, "Team", &[("title", "core")]);
        let user = persisted(&orm, "User", &[("email", "ann@example.com"), ("team", team.id())]);
        let mut item = persisted(&orm, "Item", &[("name", "widget"), ("owner", user.id())]);

        orm.expand(&mut item).unwrap();

        let owner = item.reference("owner").unwrap();
        assert!(owner.same_columns(&user));
        assert!(item.references().contains_key("ownerRef"));
        // One hop only
        assert!(owner.references().is_empty());
    }

    #[test]
    fn test_expand_miss_attaches_none() {
        let orm = orm();
        let mut item = persisted(&orm, "Item", &[("name", "widget"), ("owner", "nobody00")]);
        orm.expand(&mut item).unwrap();
        assert!(item.reference("owner").is_none());
        assert_eq!(item.references().get("ownerRef"), Some(&None));
    }

    #[test]
    fn test_expand_empty_value() {
        let orm = orm();
        let mut item = persisted(&orm, "Item", &[("name", "widget")]);
        orm.expand(&mut item).unwrap();
        assert_eq!(item.references().get("ownerRef"), Some(&None));
    }

    #[test]
    fn test_expand_to_depth() {
        let orm = orm();
        let team = persisted(&orm, "Team", &[("title", "core")]);
        let user = persisted(&orm, "User", &[("email", "ann@example.com"), ("team", team.id())]);
        let mut item = persisted(&orm, "Item", &[("name", "widget"), ("owner", user.id())]);

        orm.expand_to_depth(&mut item, 2).unwrap();
        let resolved_team = item.reference("owner").unwrap().reference("team").unwrap();
        assert_eq!(resolved_team.id(), team.id());

        let mut untouched = item.clone();
        untouched.references_mut().clear();
        orm.expand_to_depth(&mut untouched, 0).unwrap();
        assert!(untouched.references().is_empty());
    }
}
