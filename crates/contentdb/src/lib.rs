//! ContentDB - a schema-driven content repository.
//!
//! Content types are declared as configuration: tables, typed properties,
//! foreign-key style relations, and inheritance between types. The engine
//! resolves that declaration into an immutable type graph, compiles
//! [`ContentQuery`] values into parameterized SQL with recursive relation
//! joins, and hydrates the flat aliased rows coming back into typed, nested
//! [`Content`] instances.
//!
//! # Example
//!
//! ```
//! use contentdb::{ContentQuery, SchemaManager};
//!
//! let manager = SchemaManager::from_json(r#"{
//!     "types": {
//!         "app::author": {
//!             "properties": {
//!                 "id": {"type": "bigint", "autoincrement": true, "notnull": true},
//!                 "name": {"type": "string", "length": 255, "notnull": true}
//!             }
//!         },
//!         "app::article": {
//!             "properties": {
//!                 "id": {"type": "bigint", "autoincrement": true, "notnull": true},
//!                 "title": {"type": "string", "length": 255, "notnull": true},
//!                 "author": {
//!                     "type": "bigint",
//!                     "relation": {"schema": "app::author", "property": "id"}
//!                 }
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let article = manager.resolve("app::article").unwrap();
//! assert_eq!(article.table, "article");
//! assert!(article.property("author").unwrap().has_relation());
//!
//! let query = ContentQuery::new("app::article")
//!     .with("title", "Hello")
//!     .limit(10);
//! assert_eq!(query.predicates.len(), 1);
//! ```
//!
//! Executing queries additionally needs a datastore collaborator
//! implementing [`Connection`]; hand both to a [`ContentRepository`] for
//! create/get/filter/update/delete.

pub use contentdb_core::{
    ConfigValidator, Connection, Content, ContentQuery, ContentRepository, ContentValue,
    DefaultValue, Error, Hydrated, HydratedRows, OrderDirection, OrderSpec, Predicate, Property,
    PropertyConfig, PropertyIndex, PropertyRelation, QueryCompiler, ReferentialAction,
    RelationConfig, Row, SchemaConfig, SchemaManager, Statement, StorageType, Type, TypeConfig,
    UniqueConstraint, ValidationMessage, Value,
};

/// Direct access to the core crate.
pub use contentdb_core as core;
