pub mod column;
pub mod entity;
pub mod error;
pub mod foreign;
pub mod id;
pub mod identity;
pub mod orm;
pub mod persist;
pub mod query;
pub mod schema;
pub mod serialize;
pub mod sync;
pub mod tabular;
pub mod validation;
pub mod value;

pub use column::{Column, ColumnKind};
pub use entity::Entity;
pub use error::{OrmError, Result};
pub use identity::{EnvIdentity, IdentityProvider, NoIdentity, StaticIdentity};
pub use orm::Orm;
pub use query::{Condition, Conditions};
pub use schema::{RecordSchema, SchemaDefinition, Settings};
pub use serialize::{stringify, to_simple_object, to_simple_object_with};
pub use tabular::{FileStore, MemoryStore, TableHandle, TabularStore};
pub use value::Value;
