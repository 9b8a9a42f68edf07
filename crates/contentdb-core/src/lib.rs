//! ContentDB Core - schema resolution, query compilation, and hydration.
//!
//! Declarative content type configuration resolves into an immutable type
//! graph; queries compile into parameterized SQL with recursive relation
//! joins; flat aliased result rows hydrate back into typed, possibly nested
//! content instances. The SQL execution engine itself stays behind the
//! [`Connection`] trait.

pub mod connection;
pub mod content;
pub mod error;
pub mod query;
pub mod repository;
pub mod schema;
pub mod value;

pub use connection::Connection;
pub use content::{Content, ContentValue};
pub use error::Error;
pub use query::{ContentQuery, OrderDirection, OrderSpec, Predicate, QueryCompiler, Statement};
pub use repository::{ContentRepository, Hydrated, HydratedRows};
pub use schema::{
    ConfigValidator, DefaultValue, Property, PropertyConfig, PropertyIndex, PropertyRelation,
    ReferentialAction, RelationConfig, SchemaConfig, SchemaManager, StorageType, Type, TypeConfig,
    UniqueConstraint, ValidationMessage,
};
pub use value::{Row, Value};
