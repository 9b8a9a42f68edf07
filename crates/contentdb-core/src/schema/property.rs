//! Property definitions for content types.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::relation::PropertyRelation;
use super::validator::ValidationMessage;
use crate::schema::config::PropertyConfig;
use crate::value::{current_timestamp, format_timestamp, Value};

/// Storage types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// Boolean value.
    Boolean,
    /// 32-bit signed integer column.
    Integer,
    /// 64-bit signed integer column.
    BigInt,
    /// Floating point column.
    Float,
    /// Fixed-precision decimal, kept as text to preserve precision.
    Decimal,
    /// Bounded string column.
    String,
    /// Unbounded text column.
    Text,
    /// Timestamp column (microseconds since Unix epoch natively).
    Timestamp,
    /// Binary column.
    Blob,
    /// JSON document column, kept as text.
    Json,
}

impl StorageType {
    /// Parse a configuration type tag.
    pub fn parse(tag: &str) -> Option<StorageType> {
        match tag.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Some(StorageType::Boolean),
            "integer" | "int" | "smallint" => Some(StorageType::Integer),
            "bigint" => Some(StorageType::BigInt),
            "float" | "double" => Some(StorageType::Float),
            "decimal" => Some(StorageType::Decimal),
            "string" => Some(StorageType::String),
            "text" => Some(StorageType::Text),
            "timestamp" | "datetime" | "datetimetz" | "datetime_immutable"
            | "datetimetz_immutable" => Some(StorageType::Timestamp),
            "blob" | "binary" => Some(StorageType::Blob),
            "json" => Some(StorageType::Json),
            _ => None,
        }
    }

    /// The canonical configuration tag for this type.
    pub fn as_tag(&self) -> &'static str {
        match self {
            StorageType::Boolean => "boolean",
            StorageType::Integer => "integer",
            StorageType::BigInt => "bigint",
            StorageType::Float => "float",
            StorageType::Decimal => "decimal",
            StorageType::String => "string",
            StorageType::Text => "text",
            StorageType::Timestamp => "timestamp",
            StorageType::Blob => "blob",
            StorageType::Json => "json",
        }
    }

    /// Check if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            StorageType::Integer | StorageType::BigInt | StorageType::Float | StorageType::Decimal
        )
    }

    /// Check if this type is text-like.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            StorageType::String | StorageType::Text | StorageType::Json
        )
    }

    /// Coerce a raw value to this type's native representation.
    ///
    /// Used in both directions: raw column values during hydration and bind
    /// parameters during statement compilation. Null always passes. Returns
    /// `None` when the value has no sensible conversion.
    pub fn coerce(&self, raw: &Value) -> Option<Value> {
        if raw.is_null() {
            return Some(Value::Null);
        }

        match self {
            StorageType::Boolean => match raw {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::Int(0) => Some(Value::Bool(false)),
                Value::Int(1) => Some(Value::Bool(true)),
                Value::String(s) => match s.to_ascii_lowercase().as_str() {
                    "t" | "true" | "1" => Some(Value::Bool(true)),
                    "f" | "false" | "0" => Some(Value::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            StorageType::Integer | StorageType::BigInt => match raw {
                Value::Int(i) => Some(Value::Int(*i)),
                Value::Bool(b) => Some(Value::Int(i64::from(*b))),
                Value::Float(f) if f.fract() == 0.0 => Some(Value::Int(*f as i64)),
                Value::String(s) => s.trim().parse::<i64>().ok().map(Value::Int),
                _ => None,
            },
            StorageType::Float => match raw {
                Value::Float(f) => Some(Value::Float(*f)),
                Value::Int(i) => Some(Value::Float(*i as f64)),
                Value::String(s) => s.trim().parse::<f64>().ok().map(Value::Float),
                _ => None,
            },
            StorageType::Decimal => match raw {
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Int(i) => Some(Value::String(i.to_string())),
                Value::Float(f) => Some(Value::String(f.to_string())),
                _ => None,
            },
            StorageType::String | StorageType::Text => match raw {
                Value::String(s) => Some(Value::String(s.clone())),
                Value::Int(i) => Some(Value::String(i.to_string())),
                Value::Float(f) => Some(Value::String(f.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                Value::Timestamp(t) => Some(Value::String(format_timestamp(*t))),
                _ => None,
            },
            StorageType::Timestamp => match raw {
                Value::Timestamp(t) => Some(Value::Timestamp(*t)),
                Value::Int(i) => Some(Value::Timestamp(*i)),
                Value::String(s) => parse_timestamp(s).map(Value::Timestamp),
                _ => None,
            },
            StorageType::Blob => match raw {
                Value::Bytes(b) => Some(Value::Bytes(b.clone())),
                Value::String(s) => Some(Value::Bytes(s.clone().into_bytes())),
                _ => None,
            },
            StorageType::Json => match raw {
                Value::String(s) => Some(Value::String(s.clone())),
                _ => None,
            },
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_tag())
    }
}

/// Parse datetime text to microseconds since Unix epoch.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.ffffff]` (with `T` separator
/// too), and bare dates.
fn parse_timestamp(text: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_micros());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_micros());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_micros());
    }
    None
}

/// Default value for a property.
#[derive(Clone)]
pub enum DefaultValue {
    /// A literal value.
    Literal(Value),
    /// Current timestamp, evaluated at insert time.
    CurrentTimestamp,
    /// Custom generator, evaluated at insert time. Only attachable
    /// programmatically; data configuration cannot express closures.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Resolve the default at its point of use.
    pub fn resolve(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::CurrentTimestamp => Value::Timestamp(current_timestamp()),
            DefaultValue::Generator(generate) => generate(),
        }
    }

    /// The literal value, if this default is not deferred.
    pub fn literal(&self) -> Option<&Value> {
        match self {
            DefaultValue::Literal(value) => Some(value),
            _ => None,
        }
    }

    /// Parse a configuration default.
    ///
    /// A JSON scalar is a literal; the string `CURRENT_TIMESTAMP` is the
    /// deferred now() generator. Arrays and objects are rejected.
    pub fn from_config(value: &JsonValue) -> Option<DefaultValue> {
        if let JsonValue::String(s) = value {
            if s.eq_ignore_ascii_case("current_timestamp") {
                return Some(DefaultValue::CurrentTimestamp);
            }
        }
        Value::from_json(value).map(DefaultValue::Literal)
    }
}

impl std::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::CurrentTimestamp => write!(f, "CurrentTimestamp"),
            DefaultValue::Generator(_) => write!(f, "Generator(..)"),
        }
    }
}

impl PartialEq for DefaultValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DefaultValue::Literal(a), DefaultValue::Literal(b)) => a == b,
            (DefaultValue::CurrentTimestamp, DefaultValue::CurrentTimestamp) => true,
            (DefaultValue::Generator(a), DefaultValue::Generator(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Index descriptor for a property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyIndex {
    /// Optional explicit index name.
    pub name: Option<String>,
}

/// Unique constraint descriptor for a property.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniqueConstraint {
    /// Optional explicit constraint name.
    pub name: Option<String>,
}

/// A resolved property of a content type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property identifier, unique within the owning type.
    pub identifier: String,
    /// Column name; defaults to the identifier.
    pub column: String,
    /// Storage type.
    pub storage_type: StorageType,
    /// Whether the column rejects nulls.
    pub not_null: bool,
    /// Whether this property is the autoincrementing primary key.
    pub auto_increment: bool,
    /// Default value, if any.
    pub default: Option<DefaultValue>,
    /// Column length.
    pub length: Option<u32>,
    /// Numeric precision.
    pub precision: Option<u32>,
    /// Numeric scale.
    pub scale: Option<u32>,
    /// Whether the numeric column is unsigned.
    pub unsigned: bool,
    /// Whether the column has a fixed length.
    pub fixed: bool,
    /// Index descriptor.
    pub index: Option<PropertyIndex>,
    /// Unique constraint descriptor.
    pub unique: Option<UniqueConstraint>,
    /// Whether hydration coerces raw values to the native representation.
    pub convert: bool,
    /// Display label, carried as metadata.
    pub label: Option<String>,
    /// Human description, carried as metadata.
    pub description: Option<String>,
    /// Input-filter configuration, opaque to this engine.
    pub filters: IndexMap<String, JsonValue>,
    /// Property-level validator configuration, opaque to this engine.
    pub validators: IndexMap<String, JsonValue>,
    /// Relation to another content type, if any.
    pub relation: Option<PropertyRelation>,
}

impl Property {
    /// Create a new property with defaults.
    pub fn new(identifier: impl Into<String>, storage_type: StorageType) -> Self {
        let identifier = identifier.into();
        Self {
            column: identifier.clone(),
            identifier,
            storage_type,
            not_null: false,
            auto_increment: false,
            default: None,
            length: None,
            precision: None,
            scale: None,
            unsigned: false,
            fixed: false,
            index: None,
            unique: None,
            convert: true,
            label: None,
            description: None,
            filters: IndexMap::new(),
            validators: IndexMap::new(),
            relation: None,
        }
    }

    /// Mark as not-null.
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark as the autoincrementing primary key.
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self.not_null = true;
        self
    }

    /// Set the column name.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Attach a relation.
    pub fn with_relation(mut self, relation: PropertyRelation) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Check if this property carries a relation.
    pub fn has_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Check if this property has a default value.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Apply a configuration definition over this property, field by field.
    ///
    /// Relations are wired by the resolver, not here; `schema` is only used
    /// to contextualize validation messages.
    pub(crate) fn apply_config(
        &mut self,
        schema: &str,
        config: &PropertyConfig,
    ) -> Result<(), ValidationMessage> {
        if let Some(tag) = &config.storage_type {
            self.storage_type =
                StorageType::parse(tag).ok_or_else(|| ValidationMessage::UnknownStorageType {
                    schema: schema.to_string(),
                    property: self.identifier.clone(),
                    tag: tag.clone(),
                })?;
        }
        if let Some(name) = &config.name {
            self.column = name.clone();
        }
        if let Some(label) = &config.label {
            self.label = Some(label.clone());
        }
        if let Some(description) = &config.description {
            self.description = Some(description.clone());
        }
        if let Some(not_null) = config.notnull {
            self.not_null = not_null;
        }
        if let Some(auto) = config.autoincrement {
            self.auto_increment = auto;
        }
        if let Some(default) = &config.default {
            self.default = Some(DefaultValue::from_config(default).ok_or_else(|| {
                ValidationMessage::InvalidDefault {
                    schema: schema.to_string(),
                    property: self.identifier.clone(),
                }
            })?);
        }
        if let Some(length) = config.length {
            self.length = Some(length);
        }
        if let Some(precision) = config.precision {
            self.precision = Some(precision);
        }
        if let Some(scale) = config.scale {
            self.scale = Some(scale);
        }
        if let Some(unsigned) = config.unsigned {
            self.unsigned = unsigned;
        }
        if let Some(fixed) = config.fixed {
            self.fixed = fixed;
        }
        if let Some(index) = &config.index {
            self.index = parse_index(index).map_err(|()| ValidationMessage::InvalidIndexConfig {
                schema: schema.to_string(),
                property: self.identifier.clone(),
            })?;
        }
        if let Some(unique) = config.constraints.get("unique") {
            self.unique =
                parse_unique(unique).map_err(|()| ValidationMessage::InvalidConstraintConfig {
                    schema: schema.to_string(),
                    property: self.identifier.clone(),
                })?;
        }
        if let Some(convert) = config.convert {
            self.convert = convert;
        }
        for (key, value) in &config.filters {
            self.filters.insert(key.clone(), value.clone());
        }
        for (key, value) in &config.validators {
            self.validators.insert(key.clone(), value.clone());
        }

        Ok(())
    }
}

/// Parse an index descriptor: `true`, `false`, or `{"name": ...}`.
pub(crate) fn parse_index(value: &JsonValue) -> Result<Option<PropertyIndex>, ()> {
    match value {
        JsonValue::Bool(true) => Ok(Some(PropertyIndex::default())),
        JsonValue::Bool(false) => Ok(None),
        JsonValue::Object(map) => {
            let name = match map.get("name") {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(_) => return Err(()),
            };
            Ok(Some(PropertyIndex { name }))
        }
        _ => Err(()),
    }
}

/// Parse a unique constraint descriptor: `true`, `false`, or `{"name": ...}`.
pub(crate) fn parse_unique(value: &JsonValue) -> Result<Option<UniqueConstraint>, ()> {
    match value {
        JsonValue::Bool(true) => Ok(Some(UniqueConstraint::default())),
        JsonValue::Bool(false) => Ok(None),
        JsonValue::Object(map) => {
            let name = match map.get("name") {
                None | Some(JsonValue::Null) => None,
                Some(JsonValue::String(s)) => Some(s.clone()),
                Some(_) => return Err(()),
            };
            Ok(Some(UniqueConstraint { name }))
        }
        _ => Err(()),
    }
}
