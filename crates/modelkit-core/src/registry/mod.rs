//! Model and field metadata.
//!
//! The registry stores every model with its field descriptors. It is built
//! once at startup, validated, and read-only afterwards.

mod field;
mod model;
mod naming;
mod registry;
mod schema;
mod types;

pub use field::{ComputeFn, FieldDef, FieldInfo, FieldKind};
pub use model::{
    ModelDef, CREATE_DATE_FIELD, DEFAULT_PARENT_FIELD, ID_FIELD, ID_JSON, LAST_UPDATE_FIELD,
    NAME_FIELD, WRITE_DATE_FIELD,
};
pub use naming::snake_case;
pub use registry::{Registry, RegistryBuilder};
pub use schema::{value_from_json, FieldSchema, ModelSchema, SchemaFile};
pub use types::FieldType;
