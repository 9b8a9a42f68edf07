//! Content type resolution.
//!
//! `SchemaManager` turns declarative configuration into fully merged
//! [`Type`] value objects: inheritance is flattened, shared catalog entries
//! and overrides are merged field by field, relations are wired to resolved
//! target types, and the finished graph is memoized for the lifetime of the
//! manager. Relation cycles are rejected with an explicit error instead of
//! recursing forever.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::config::SchemaConfig;
use super::property::{Property, StorageType};
use super::relation::{PropertyRelation, ReferentialAction};
use super::ty::Type;
use super::validator::{ConfigValidator, ValidationMessage};
use crate::error::Error;

/// Resolves content type identifiers into immutable [`Type`] graphs.
///
/// One manager is constructed per configuration load and passed by
/// reference to every consumer; configuration is immutable afterwards, so
/// resolved types are cached for the manager's lifetime.
pub struct SchemaManager {
    config: SchemaConfig,
    resolved: DashMap<String, Arc<Type>>,
}

impl SchemaManager {
    /// Create a manager over the given configuration.
    pub fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            resolved: DashMap::new(),
        }
    }

    /// Create a manager from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(Self::new(SchemaConfig::from_json(json)?))
    }

    /// The underlying configuration.
    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Resolve a type identifier into its fully merged type.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<Type>, Error> {
        let mut in_progress = Vec::new();
        self.resolve_inner(identifier, &mut in_progress)
    }

    fn resolve_inner(
        &self,
        identifier: &str,
        in_progress: &mut Vec<String>,
    ) -> Result<Arc<Type>, Error> {
        if let Some(resolved) = self.resolved.get(identifier) {
            return Ok(Arc::clone(&resolved));
        }

        if in_progress.iter().any(|entry| entry == identifier) {
            let mut chain = in_progress.clone();
            chain.push(identifier.to_string());
            return Err(Error::CyclicRelation {
                identifier: identifier.to_string(),
                chain,
            });
        }

        let messages = ConfigValidator::new(&self.config).validate(identifier);
        if !messages.is_empty() {
            return Err(Error::InvalidConfig {
                identifier: identifier.to_string(),
                messages,
            });
        }

        in_progress.push(identifier.to_string());
        let built = self.build_type(identifier, in_progress);
        in_progress.pop();

        let ty = Arc::new(built?);
        self.resolved.insert(identifier.to_string(), ty.clone());
        debug!(identifier, properties = ty.properties.len(), "resolved content type");
        Ok(ty)
    }

    fn build_type(&self, identifier: &str, in_progress: &mut Vec<String>) -> Result<Type, Error> {
        // Presence and shape were just validated.
        let config = self
            .config
            .types
            .get(identifier)
            .ok_or_else(|| invalid(identifier, ValidationMessage::IdentifierNotFound(identifier.to_string())))?;
        let (database_part, table_part) = identifier
            .split_once("::")
            .ok_or_else(|| invalid(identifier, ValidationMessage::InvalidIdentifier(identifier.to_string())))?;

        let database = config.database.clone().unwrap_or_else(|| database_part.to_string());
        let table = config.table.clone().unwrap_or_else(|| table_part.to_string());

        let mut ty = Type::new(identifier, database, table);
        ty.description = config.description.clone();
        ty.validators = config.validators.clone();

        // Inherited properties, declared parent order; later parents win.
        for parent_identifier in &config.inherits {
            let parent = self.resolve_inner(parent_identifier, in_progress)?;
            for property in &parent.properties {
                if config.exclude_properties.contains(&property.identifier) {
                    continue;
                }
                ty.set_property(property.clone());
            }
        }

        // Own properties: overrides merge into the inherited definition and
        // move to the end of declaration order; fresh definitions merge over
        // their shared catalog base.
        for (property_identifier, definition) in &config.properties {
            // An inherited property merges the local definition only; a
            // fresh one starts from its shared catalog base when present.
            let (mut property, relation_config) = match ty.remove_property(property_identifier) {
                Some(inherited) => {
                    let mut property = inherited;
                    property
                        .apply_config(identifier, definition)
                        .map_err(|message| invalid(identifier, message))?;
                    (property, definition.relation.clone())
                }
                None => {
                    let effective = match self.config.properties.get(property_identifier) {
                        Some(base) => definition.merged_over(base),
                        None => definition.clone(),
                    };
                    let tag = effective.storage_type.as_deref().ok_or_else(|| {
                        invalid(
                            identifier,
                            ValidationMessage::MissingStorageType {
                                schema: identifier.to_string(),
                                property: property_identifier.clone(),
                            },
                        )
                    })?;
                    let storage_type = StorageType::parse(tag).ok_or_else(|| {
                        invalid(
                            identifier,
                            ValidationMessage::UnknownStorageType {
                                schema: identifier.to_string(),
                                property: property_identifier.clone(),
                                tag: tag.to_string(),
                            },
                        )
                    })?;
                    let mut property = Property::new(property_identifier.clone(), storage_type);
                    property
                        .apply_config(identifier, &effective)
                        .map_err(|message| invalid(identifier, message))?;
                    let relation = effective.relation;
                    (property, relation)
                }
            };

            // Relation wiring goes through this same resolver so targets are
            // merged types and cycles surface as errors.
            if let Some(relation) = relation_config {
                let target_identifier = relation.schema.as_deref().ok_or_else(|| {
                    invalid(
                        identifier,
                        ValidationMessage::RelationSchemaMissing {
                            schema: identifier.to_string(),
                            property: property_identifier.clone(),
                        },
                    )
                })?;
                let target_property = relation.property.as_deref().ok_or_else(|| {
                    invalid(
                        identifier,
                        ValidationMessage::RelationPropertyMissing {
                            schema: identifier.to_string(),
                            property: property_identifier.clone(),
                        },
                    )
                })?;

                let target = self.resolve_inner(target_identifier, in_progress)?;
                if !target.has_property(target_property) {
                    return Err(invalid(
                        identifier,
                        ValidationMessage::RelationTargetProperty {
                            schema: identifier.to_string(),
                            property: property_identifier.clone(),
                            target: target_identifier.to_string(),
                            target_property: target_property.to_string(),
                        },
                    ));
                }

                let mut wired = PropertyRelation::new(target, target_property);
                if let Some(alias) = &relation.alias {
                    wired.alias = alias.clone();
                }
                wired.on_update = ReferentialAction::parse(relation.on_update.as_deref());
                wired.on_delete = ReferentialAction::parse(relation.on_delete.as_deref());
                property.relation = Some(wired);
            }

            ty.set_property(property);
        }

        // Exclusions apply after inheritance and own-property processing.
        for excluded in &config.exclude_properties {
            ty.remove_property(excluded);
        }

        if ty.auto_increment_count() > 1 {
            return Err(invalid(
                identifier,
                ValidationMessage::DuplicateAutoIncrement(identifier.to_string()),
            ));
        }

        Ok(ty)
    }
}

fn invalid(identifier: &str, message: ValidationMessage) -> Error {
    Error::InvalidConfig {
        identifier: identifier.to_string(),
        messages: vec![message],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::property::DefaultValue;

    fn manager(json: serde_json::Value) -> SchemaManager {
        SchemaManager::new(SchemaConfig::from_value(json).unwrap())
    }

    fn blog_config() -> serde_json::Value {
        serde_json::json!({
            "properties": {
                "id": {"type": "bigint", "autoincrement": true, "notnull": true},
                "created_at": {
                    "type": "timestamp",
                    "notnull": true,
                    "index": true,
                    "default": "CURRENT_TIMESTAMP"
                }
            },
            "types": {
                "app::base": {
                    "properties": {
                        "id": {},
                        "name": {"type": "string", "length": 255, "notnull": true},
                        "created_at": {}
                    }
                },
                "app::author": {
                    "inherits": ["app::base"],
                    "properties": {
                        "email": {"type": "string", "length": 255}
                    }
                },
                "app::article": {
                    "inherits": ["app::base"],
                    "exclude_properties": ["created_at"],
                    "properties": {
                        "name": {"notnull": false},
                        "body": {"type": "text"},
                        "author": {
                            "type": "bigint",
                            "relation": {"schema": "app::author", "property": "id"}
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn test_resolve_with_catalog_base() {
        let manager = manager(blog_config());
        let base = manager.resolve("app::base").unwrap();

        assert_eq!(base.database, "app");
        assert_eq!(base.table, "base");

        let id = base.property("id").unwrap();
        assert!(id.auto_increment);
        assert_eq!(id.storage_type, StorageType::BigInt);

        let created = base.property("created_at").unwrap();
        assert_eq!(created.default, Some(DefaultValue::CurrentTimestamp));
        assert!(created.index.is_some());
    }

    #[test]
    fn test_unknown_identifier() {
        let manager = manager(blog_config());
        let err = manager.resolve("app::missing").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { identifier, messages }
            if identifier == "app::missing"
                && messages == vec![ValidationMessage::IdentifierNotFound("app::missing".into())]));
    }

    #[test]
    fn test_inheritance_copies_parent_properties() {
        let manager = manager(blog_config());
        let author = manager.resolve("app::author").unwrap();

        let identifiers: Vec<&str> = author
            .properties
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["id", "name", "created_at", "email"]);
    }

    #[test]
    fn test_child_override_wins() {
        let manager = manager(blog_config());
        let article = manager.resolve("app::article").unwrap();

        // Parent declares name notnull; the child relaxes it. The merged
        // override moves to the end of declaration order.
        let name = article.property("name").unwrap();
        assert!(!name.not_null);
        assert_eq!(name.length, Some(255));

        let identifiers: Vec<&str> = article
            .properties
            .iter()
            .map(|p| p.identifier.as_str())
            .collect();
        assert_eq!(identifiers, vec!["id", "name", "body", "author"]);
    }

    #[test]
    fn test_exclusion_removes_inherited_property() {
        let manager = manager(blog_config());
        let article = manager.resolve("app::article").unwrap();
        assert!(!article.has_property("created_at"));
    }

    #[test]
    fn test_relation_wiring() {
        let manager = manager(blog_config());
        let article = manager.resolve("app::article").unwrap();

        let relation = article.property("author").unwrap().relation.as_ref().unwrap();
        assert_eq!(relation.target.identifier, "app::author");
        assert_eq!(relation.property, "id");
        assert_eq!(relation.alias, "author");
        assert_eq!(relation.on_delete, ReferentialAction::Cascade);
        assert!(relation.target.has_property("email"));
    }

    #[test]
    fn test_resolution_is_memoized_and_idempotent() {
        let manager = manager(blog_config());
        let first = manager.resolve("app::article").unwrap();
        let second = manager.resolve("app::article").unwrap();

        assert!(Arc::ptr_eq(&first, &second));

        // Sibling resolution reuses the cached author subgraph.
        let author = manager.resolve("app::author").unwrap();
        let through_article = first.property("author").unwrap().relation.as_ref().unwrap();
        assert!(Arc::ptr_eq(&author, &through_article.target));
    }

    #[test]
    fn test_relation_cycle_is_rejected() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::a": {
                    "properties": {
                        "id": {"type": "bigint", "autoincrement": true},
                        "b": {"type": "bigint", "relation": {"schema": "app::b", "property": "id"}}
                    }
                },
                "app::b": {
                    "properties": {
                        "id": {"type": "bigint", "autoincrement": true},
                        "a": {"type": "bigint", "relation": {"schema": "app::a", "property": "id"}}
                    }
                }
            }
        }));

        let err = manager.resolve("app::a").unwrap_err();
        assert!(matches!(err, Error::CyclicRelation { identifier, chain }
            if identifier == "app::a" && chain == vec!["app::a", "app::b", "app::a"]));
    }

    #[test]
    fn test_self_inheritance_is_rejected() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::a": {
                    "inherits": ["app::a"],
                    "properties": {"id": {"type": "bigint"}}
                }
            }
        }));

        assert!(matches!(
            manager.resolve("app::a").unwrap_err(),
            Error::CyclicRelation { .. }
        ));
    }

    #[test]
    fn test_duplicate_auto_increment_is_rejected() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::broken": {
                    "properties": {
                        "id": {"type": "bigint", "autoincrement": true},
                        "other": {"type": "bigint", "autoincrement": true}
                    }
                }
            }
        }));

        let err = manager.resolve("app::broken").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { messages, .. }
            if messages == vec![ValidationMessage::DuplicateAutoIncrement("app::broken".into())]));
    }

    #[test]
    fn test_inherited_auto_increment_conflict_is_rejected() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::base": {
                    "properties": {"id": {"type": "bigint", "autoincrement": true}}
                },
                "app::child": {
                    "inherits": ["app::base"],
                    "properties": {"serial": {"type": "bigint", "autoincrement": true}}
                }
            }
        }));

        assert!(matches!(
            manager.resolve("app::child").unwrap_err(),
            Error::InvalidConfig { .. }
        ));
    }

    #[test]
    fn test_missing_storage_type_is_rejected() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::thing": {"properties": {"mystery": {}}}
            }
        }));

        let err = manager.resolve("app::thing").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { messages, .. }
            if matches!(messages.as_slice(), [ValidationMessage::MissingStorageType { .. }])));
    }

    #[test]
    fn test_relation_target_property_must_exist() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::author": {
                    "properties": {"id": {"type": "bigint", "autoincrement": true}}
                },
                "app::article": {
                    "properties": {
                        "author": {
                            "type": "bigint",
                            "relation": {"schema": "app::author", "property": "uuid"}
                        }
                    }
                }
            }
        }));

        let err = manager.resolve("app::article").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { messages, .. }
            if matches!(messages.as_slice(), [ValidationMessage::RelationTargetProperty { target_property, .. }]
                if target_property == "uuid")));
    }

    #[test]
    fn test_later_parent_overrides_earlier() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::first": {
                    "properties": {"label": {"type": "string", "length": 50}}
                },
                "app::second": {
                    "properties": {"label": {"type": "string", "length": 200}}
                },
                "app::both": {
                    "inherits": ["app::first", "app::second"],
                    "properties": {}
                }
            }
        }));

        let both = manager.resolve("app::both").unwrap();
        assert_eq!(both.property("label").unwrap().length, Some(200));
    }

    #[test]
    fn test_explicit_database_and_table() {
        let manager = manager(serde_json::json!({
            "types": {
                "app::product": {
                    "database": "shop",
                    "table": "products",
                    "properties": {"id": {"type": "bigint", "autoincrement": true}}
                }
            }
        }));

        let product = manager.resolve("app::product").unwrap();
        assert_eq!(product.database, "shop");
        assert_eq!(product.table, "products");
    }
}
