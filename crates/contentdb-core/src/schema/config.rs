//! Declarative schema configuration.
//!
//! Configuration is plain data: it is deserialized once, validated by
//! [`ConfigValidator`](super::ConfigValidator), and turned into immutable
//! [`Type`](super::Type) value objects by the resolver. Nothing re-reads raw
//! configuration at query time.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::Error;

/// The full schema configuration: content types plus a shared property
/// catalog.
///
/// A type's property definition whose key also appears in [`properties`]
/// uses the catalog entry as its base and merges the local definition over
/// it field by field.
///
/// [`properties`]: SchemaConfig::properties
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Content type configurations keyed by `database::table` identifier.
    pub types: IndexMap<String, TypeConfig>,
    /// Shared property catalog keyed by property identifier.
    pub properties: IndexMap<String, PropertyConfig>,
}

impl SchemaConfig {
    /// Deserialize a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::MalformedConfig(e.to_string()))
    }

    /// Deserialize a configuration from an in-memory JSON value.
    pub fn from_value(value: JsonValue) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| Error::MalformedConfig(e.to_string()))
    }

    /// Get a type configuration by identifier.
    pub fn type_config(&self, identifier: &str) -> Option<&TypeConfig> {
        self.types.get(identifier)
    }

    /// Get a shared catalog property definition by identifier.
    pub fn catalog_property(&self, identifier: &str) -> Option<&PropertyConfig> {
        self.properties.get(identifier)
    }
}

/// Configuration for one content type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypeConfig {
    /// Database name; defaults to the first half of the identifier.
    pub database: Option<String>,
    /// Table name; defaults to the second half of the identifier.
    pub table: Option<String>,
    /// Human description, carried as metadata.
    pub description: Option<String>,
    /// Parent type identifiers, processed in declared order.
    pub inherits: Vec<String>,
    /// Property definitions in declared order.
    pub properties: IndexMap<String, PropertyConfig>,
    /// Inherited property identifiers to drop from the resolved type.
    pub exclude_properties: Vec<String>,
    /// Type-level validator configuration, opaque to this engine.
    pub validators: IndexMap<String, JsonValue>,
}

/// Configuration for one property.
///
/// Every field is optional so a definition can partially override an
/// inherited property or a shared catalog entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertyConfig {
    /// Storage type tag (`integer`, `string`, `timestamp`, ...).
    #[serde(rename = "type")]
    pub storage_type: Option<String>,
    /// Column name; defaults to the property identifier.
    pub name: Option<String>,
    /// Display label, carried as metadata.
    pub label: Option<String>,
    /// Human description, carried as metadata.
    pub description: Option<String>,
    /// Whether the column rejects nulls.
    pub notnull: Option<bool>,
    /// Whether this property is the autoincrementing primary key.
    pub autoincrement: Option<bool>,
    /// Default value: a JSON scalar, or the string `CURRENT_TIMESTAMP` for
    /// an insert-time generated timestamp.
    pub default: Option<JsonValue>,
    /// Column length.
    pub length: Option<u32>,
    /// Numeric precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether the numeric column is unsigned.
    pub unsigned: Option<bool>,
    /// Whether the column has a fixed length.
    pub fixed: Option<bool>,
    /// Index descriptor: `true`, `false`, or `{"name": ...}`.
    pub index: Option<JsonValue>,
    /// Constraint descriptors keyed by kind (`unique`).
    pub constraints: IndexMap<String, JsonValue>,
    /// Foreign-key style relation to another content type.
    pub relation: Option<RelationConfig>,
    /// Input-filter configuration, opaque to this engine.
    pub filters: IndexMap<String, JsonValue>,
    /// Property-level validator configuration, opaque to this engine.
    pub validators: IndexMap<String, JsonValue>,
    /// Whether hydration coerces raw values to the native representation.
    pub convert: Option<bool>,
}

impl PropertyConfig {
    /// Merge this definition over a base definition, field by field.
    ///
    /// Scalar fields present here win; map-shaped metadata merges per key
    /// with local entries winning.
    pub fn merged_over(&self, base: &PropertyConfig) -> PropertyConfig {
        let mut merged = base.clone();

        if self.storage_type.is_some() {
            merged.storage_type = self.storage_type.clone();
        }
        if self.name.is_some() {
            merged.name = self.name.clone();
        }
        if self.label.is_some() {
            merged.label = self.label.clone();
        }
        if self.description.is_some() {
            merged.description = self.description.clone();
        }
        if self.notnull.is_some() {
            merged.notnull = self.notnull;
        }
        if self.autoincrement.is_some() {
            merged.autoincrement = self.autoincrement;
        }
        if self.default.is_some() {
            merged.default = self.default.clone();
        }
        if self.length.is_some() {
            merged.length = self.length;
        }
        if self.precision.is_some() {
            merged.precision = self.precision;
        }
        if self.scale.is_some() {
            merged.scale = self.scale;
        }
        if self.unsigned.is_some() {
            merged.unsigned = self.unsigned;
        }
        if self.fixed.is_some() {
            merged.fixed = self.fixed;
        }
        if self.index.is_some() {
            merged.index = self.index.clone();
        }
        if self.relation.is_some() {
            merged.relation = self.relation.clone();
        }
        if self.convert.is_some() {
            merged.convert = self.convert;
        }
        for (key, value) in &self.constraints {
            merged.constraints.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.filters {
            merged.filters.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.validators {
            merged.validators.insert(key.clone(), value.clone());
        }

        merged
    }
}

/// Configuration for a property relation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelationConfig {
    /// Target type identifier (`database::table`).
    pub schema: Option<String>,
    /// Target property identifier the owning column must match.
    pub property: Option<String>,
    /// Join alias; defaults to the target table name.
    pub alias: Option<String>,
    /// On-update referential action (`CASCADE` or `SET NULL`).
    #[serde(rename = "onUpdate")]
    pub on_update: Option<String>,
    /// On-delete referential action (`CASCADE` or `SET NULL`).
    #[serde(rename = "onDelete")]
    pub on_delete: Option<String>,
}
