// Plain-object views of entities

use crate::entity::Entity;
use crate::error::Result;

pub type SimpleObject = serde_json::Map<String, serde_json::Value>;

/// Column values keyed by column name, plus every resolved reference
/// simplified recursively. Unresolved references and the row number are
/// left out.
pub fn to_simple_object(entity: &Entity) -> SimpleObject {
    to_simple_object_with(entity, |_, object| object)
}

/// [`to_simple_object`] followed by a hook that may add or rewrite fields.
pub fn to_simple_object_with<F>(entity: &Entity, extend: F) -> SimpleObject
where
    F: FnOnce(&Entity, SimpleObject) -> SimpleObject,
{
    let mut object = SimpleObject::new();
    for (name, value) in entity.column_values() {
        object.insert(name.to_string(), value.to_json());
    }
    for (name, reference) in entity.references() {
        if let Some(resolved) = reference {
            object.insert(
                name.clone(),
                serde_json::Value::Object(to_simple_object(resolved)),
            );
        }
    }
    extend(entity, object)
}

/// Compact JSON text of the simple object. Keys are sorted, so equal
/// entities stringify identically.
pub fn stringify(entity: &Entity) -> Result<String> {
    Ok(serde_json::to_string(&to_simple_object(entity))?)
}
