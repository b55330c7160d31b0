//! Typed, schema-validated, CRC-protected key-value configuration store.

pub mod codec;
pub mod schema;
pub mod store;
pub mod value;

pub use schema::{EnumItem, Schema, SchemaEntry, ValueSpec, VarType};
pub use store::KvfStore;
pub use value::KvfValue;
