//! Schema catalog: configuration, validation, and type resolution.
//!
//! The catalog turns declarative content type configuration into immutable
//! [`Type`] value objects carrying ordered [`Property`] definitions and
//! resolved [`PropertyRelation`] wiring.

mod config;
mod property;
mod relation;
mod resolver;
mod ty;
mod validator;

pub use config::{PropertyConfig, RelationConfig, SchemaConfig, TypeConfig};
pub use property::{DefaultValue, Property, PropertyIndex, StorageType, UniqueConstraint};
pub use relation::{PropertyRelation, ReferentialAction};
pub use resolver::SchemaManager;
pub use ty::Type;
pub use validator::{ConfigValidator, ValidationMessage};
