//! Structural validation of content type configuration.
//!
//! The validator reports every problem it can find for one type identifier
//! as a list of structured messages; resolution refuses to build a type
//! from a configuration with a non-empty message list.

use thiserror::Error;

use super::config::{PropertyConfig, SchemaConfig};
use super::property::{parse_index, parse_unique, DefaultValue, StorageType};

/// One structured validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationMessage {
    /// The identifier is absent from configuration.
    #[error("content identifier {0} not found in configuration")]
    IdentifierNotFound(String),

    /// The identifier does not use the `database::table` format.
    #[error("invalid content identifier {0}, must use the database::table format")]
    InvalidIdentifier(String),

    /// The type declares no properties and inherits none.
    #[error("content schema {0} has no properties configured")]
    NoProperties(String),

    /// A property identifier is not a bare identifier or contains the
    /// reserved `__` separator.
    #[error("invalid property name {property} on schema {schema}")]
    InvalidPropertyName {
        /// Owning type identifier.
        schema: String,
        /// Offending property identifier.
        property: String,
    },

    /// A column name override is not a bare identifier.
    #[error("invalid column name {column} for property {property} on schema {schema}")]
    InvalidColumnName {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
        /// Offending column name.
        column: String,
    },

    /// A storage type tag is unknown.
    #[error("unknown storage type {tag} for property {property} on schema {schema}")]
    UnknownStorageType {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
        /// Offending tag.
        tag: String,
    },

    /// A merged property definition ends up without a storage type.
    #[error("no storage type for property {property} on schema {schema}")]
    MissingStorageType {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// A default value is not a scalar or recognized generator.
    #[error("invalid default for property {property} on schema {schema}")]
    InvalidDefault {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// An index descriptor has an unsupported shape.
    #[error("invalid index configuration for property {property} on schema {schema}")]
    InvalidIndexConfig {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// A constraint descriptor has an unsupported shape.
    #[error("invalid constraint configuration for property {property} on schema {schema}")]
    InvalidConstraintConfig {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// A relation is missing its `schema` key.
    #[error("relation on property {property} of schema {schema} does not specify a schema key")]
    RelationSchemaMissing {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// A relation is missing its `property` key.
    #[error("relation on property {property} of schema {schema} does not specify a property key")]
    RelationPropertyMissing {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
    },

    /// A relation alias is not a bare identifier.
    #[error("invalid relation alias {alias} on property {property} of schema {schema}")]
    InvalidRelationAlias {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
        /// Offending alias.
        alias: String,
    },

    /// The relation target does not define the referenced property.
    #[error("relation target {target} of property {property} on schema {schema} does not define property {target_property}")]
    RelationTargetProperty {
        /// Owning type identifier.
        schema: String,
        /// Property identifier.
        property: String,
        /// Target type identifier.
        target: String,
        /// Missing target property identifier.
        target_property: String,
    },

    /// More than one property is marked autoincrement.
    #[error("schema {0} defines more than one autoincrement property")]
    DuplicateAutoIncrement(String),
}

/// Validates one type's configuration against the full schema config.
pub struct ConfigValidator<'a> {
    config: &'a SchemaConfig,
}

impl<'a> ConfigValidator<'a> {
    /// Create a validator over the given configuration.
    pub fn new(config: &'a SchemaConfig) -> Self {
        Self { config }
    }

    /// Validate the configuration of `identifier`, returning every finding.
    ///
    /// An empty list means the configuration is structurally sound; the
    /// resolver still enforces cross-type rules (relation targets,
    /// autoincrement uniqueness after inheritance).
    pub fn validate(&self, identifier: &str) -> Vec<ValidationMessage> {
        let mut messages = Vec::new();

        let Some(type_config) = self.config.types.get(identifier) else {
            return vec![ValidationMessage::IdentifierNotFound(identifier.to_string())];
        };

        if !is_type_identifier(identifier) {
            messages.push(ValidationMessage::InvalidIdentifier(identifier.to_string()));
        }
        if let Some(database) = &type_config.database {
            if !is_identifier(database) {
                messages.push(ValidationMessage::InvalidIdentifier(database.clone()));
            }
        }
        if let Some(table) = &type_config.table {
            if !is_identifier(table) {
                messages.push(ValidationMessage::InvalidIdentifier(table.clone()));
            }
        }

        if type_config.properties.is_empty() && type_config.inherits.is_empty() {
            messages.push(ValidationMessage::NoProperties(identifier.to_string()));
        }

        for (property, definition) in &type_config.properties {
            let effective = match self.config.properties.get(property) {
                Some(base) => definition.merged_over(base),
                None => definition.clone(),
            };
            self.validate_property(identifier, property, &effective, &mut messages);
        }

        messages
    }

    fn validate_property(
        &self,
        schema: &str,
        property: &str,
        config: &PropertyConfig,
        messages: &mut Vec<ValidationMessage>,
    ) {
        if !is_identifier(property) {
            messages.push(ValidationMessage::InvalidPropertyName {
                schema: schema.to_string(),
                property: property.to_string(),
            });
        }

        if let Some(column) = &config.name {
            if !is_identifier(column) {
                messages.push(ValidationMessage::InvalidColumnName {
                    schema: schema.to_string(),
                    property: property.to_string(),
                    column: column.clone(),
                });
            }
        }

        if let Some(tag) = &config.storage_type {
            if StorageType::parse(tag).is_none() {
                messages.push(ValidationMessage::UnknownStorageType {
                    schema: schema.to_string(),
                    property: property.to_string(),
                    tag: tag.clone(),
                });
            }
        }

        if let Some(default) = &config.default {
            if DefaultValue::from_config(default).is_none() {
                messages.push(ValidationMessage::InvalidDefault {
                    schema: schema.to_string(),
                    property: property.to_string(),
                });
            }
        }

        if let Some(index) = &config.index {
            if parse_index(index).is_err() {
                messages.push(ValidationMessage::InvalidIndexConfig {
                    schema: schema.to_string(),
                    property: property.to_string(),
                });
            }
        }

        if let Some(unique) = config.constraints.get("unique") {
            if parse_unique(unique).is_err() {
                messages.push(ValidationMessage::InvalidConstraintConfig {
                    schema: schema.to_string(),
                    property: property.to_string(),
                });
            }
        }

        if let Some(relation) = &config.relation {
            match &relation.schema {
                None => messages.push(ValidationMessage::RelationSchemaMissing {
                    schema: schema.to_string(),
                    property: property.to_string(),
                }),
                Some(target) if !is_type_identifier(target) => {
                    messages.push(ValidationMessage::InvalidIdentifier(target.clone()));
                }
                Some(_) => {}
            }
            if relation.property.is_none() {
                messages.push(ValidationMessage::RelationPropertyMissing {
                    schema: schema.to_string(),
                    property: property.to_string(),
                });
            }
            if let Some(alias) = &relation.alias {
                if !is_identifier(alias) {
                    messages.push(ValidationMessage::InvalidRelationAlias {
                        schema: schema.to_string(),
                        property: property.to_string(),
                        alias: alias.clone(),
                    });
                }
            }
        }
    }
}

/// A bare SQL identifier without the reserved `__` separator.
///
/// Keeping every identifier in this shape is what lets compiled SQL skip
/// quoting and the `alias__property` row convention stay unambiguous.
pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    let leading_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    leading_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !text.contains("__")
}

/// A `database::table` shaped identifier.
pub(crate) fn is_type_identifier(text: &str) -> bool {
    matches!(text.split_once("::"), Some((db, table)) if is_identifier(db) && is_identifier(table))
}
