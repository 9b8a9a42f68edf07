//! Runtime content instances and row hydration.

use std::sync::Arc;

use crate::error::Error;
use crate::schema::Type;
use crate::value::{Row, Value};

/// Current value of one property on a [`Content`] instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    /// A scalar value.
    Scalar(Value),
    /// A nested instance of a relation's target type.
    Nested(Box<Content>),
}

impl ContentValue {
    /// The scalar value, if this is not a nested instance.
    pub fn scalar(&self) -> Option<&Value> {
        match self {
            ContentValue::Scalar(value) => Some(value),
            ContentValue::Nested(_) => None,
        }
    }

    /// The nested content, if any.
    pub fn nested(&self) -> Option<&Content> {
        match self {
            ContentValue::Nested(content) => Some(content),
            ContentValue::Scalar(_) => None,
        }
    }
}

impl From<Value> for ContentValue {
    fn from(value: Value) -> Self {
        ContentValue::Scalar(value)
    }
}

impl From<Content> for ContentValue {
    fn from(content: Content) -> Self {
        ContentValue::Nested(Box::new(content))
    }
}

/// A runtime instance of a content type.
///
/// Holds one value per property, initialized from property defaults and
/// replaced by [`hydrate`](Content::hydrate). Instances are created per row
/// and never shared across rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    ty: Arc<Type>,
    values: Vec<ContentValue>,
    empty: bool,
}

impl Content {
    /// Create an instance with every property at its default value.
    ///
    /// Deferred defaults (generators) are left null here; they resolve at
    /// insert time.
    pub fn new(ty: Arc<Type>) -> Self {
        let values = ty
            .properties
            .iter()
            .map(|property| {
                let value = property
                    .default
                    .as_ref()
                    .and_then(|default| default.literal().cloned())
                    .unwrap_or(Value::Null);
                ContentValue::Scalar(value)
            })
            .collect();

        Self {
            ty,
            values,
            empty: true,
        }
    }

    /// The resolved type of this instance.
    pub fn ty(&self) -> &Arc<Type> {
        &self.ty
    }

    /// Whether the row supplied to the most recent hydration matched
    /// nothing (or no hydration happened yet).
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Get a property value by identifier.
    pub fn get(&self, property: &str) -> Option<&ContentValue> {
        self.ty
            .properties
            .iter()
            .position(|p| p.identifier == property)
            .map(|index| &self.values[index])
    }

    /// Get a property value, failing with `MissingProperty`.
    pub fn value(&self, property: &str) -> Result<&ContentValue, Error> {
        self.get(property).ok_or_else(|| Error::MissingProperty {
            property: property.to_string(),
            type_identifier: self.ty.identifier.clone(),
        })
    }

    /// Set a property value, failing with `MissingProperty`.
    pub fn set_value(
        &mut self,
        property: &str,
        value: impl Into<ContentValue>,
    ) -> Result<(), Error> {
        let index = self
            .ty
            .properties
            .iter()
            .position(|p| p.identifier == property)
            .ok_or_else(|| Error::MissingProperty {
                property: property.to_string(),
                type_identifier: self.ty.identifier.clone(),
            })?;
        self.values[index] = value.into();
        Ok(())
    }

    /// Current value of the autoincrement property.
    pub fn auto_id(&self) -> Result<Value, Error> {
        let auto = self.ty.auto_increment()?;
        match self.value(&auto.identifier)? {
            ContentValue::Scalar(value) => Ok(value.clone()),
            ContentValue::Nested(_) => Ok(Value::Null),
        }
    }

    /// Hydrate from a flat aliased row, scoped to this type's table name.
    pub fn hydrate(&mut self, row: &Row) -> Result<(), Error> {
        let alias = self.ty.table.clone();
        self.hydrate_as(row, &alias)
    }

    /// Hydrate from a flat aliased row, scoped to an explicit alias.
    ///
    /// Row keys follow the `alias__property` convention the select compiler
    /// emits. Scalar properties coerce to their native representation
    /// unless the property disables conversion; relation properties
    /// recursively hydrate a fresh instance of the target type from the
    /// same row under the relation's alias. A scalar under the owner's key
    /// stands for a bare foreign key: only the target's autoincrement value
    /// is known. Values already nested survive re-hydration untouched.
    pub fn hydrate_as(&mut self, row: &Row, alias: &str) -> Result<(), Error> {
        let ty = self.ty.clone();
        let mut matched = 0usize;

        for (index, property) in ty.properties.iter().enumerate() {
            let key = format!("{alias}__{}", property.identifier);

            match &property.relation {
                None => {
                    if let Some(raw) = row_value(row, &key) {
                        matched += 1;
                        let value = if property.convert {
                            property.storage_type.coerce(raw).ok_or_else(|| {
                                Error::Coercion {
                                    property: property.identifier.clone(),
                                    storage_type: property.storage_type.to_string(),
                                }
                            })?
                        } else {
                            raw.clone()
                        };
                        self.values[index] = ContentValue::Scalar(value);
                    }
                }
                Some(relation) => {
                    let prefix = format!("{}__", relation.alias);
                    if row.iter().any(|(k, _)| k.starts_with(&prefix)) {
                        matched += 1;
                        let mut nested = Content::new(relation.target.clone());
                        nested.hydrate_as(row, &relation.alias)?;
                        self.values[index] = ContentValue::Nested(Box::new(nested));
                    } else if let Some(raw) = row_value(row, &key) {
                        if raw.is_null() {
                            continue;
                        }
                        matched += 1;
                        let mut nested = Content::new(relation.target.clone());
                        let auto = nested.ty.auto_increment()?;
                        let value = auto.storage_type.coerce(raw).ok_or_else(|| {
                            Error::Coercion {
                                property: auto.identifier.clone(),
                                storage_type: auto.storage_type.to_string(),
                            }
                        })?;
                        let auto_identifier = auto.identifier.clone();
                        nested.set_value(&auto_identifier, value)?;
                        nested.empty = false;
                        self.values[index] = ContentValue::Nested(Box::new(nested));
                    }
                }
            }
        }

        self.empty = matched == 0;
        Ok(())
    }

    /// Serialize to a plain nested mapping keyed by property identifier.
    ///
    /// Structural inverse of hydration: scalar values render through their
    /// JSON form, nested relation values recurse.
    pub fn to_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (property, value) in self.ty.properties.iter().zip(&self.values) {
            let rendered = match value {
                ContentValue::Scalar(value) => value.to_json(),
                ContentValue::Nested(content) => serde_json::Value::Object(content.to_map()),
            };
            map.insert(property.identifier.clone(), rendered);
        }
        map
    }
}

fn row_value<'a>(row: &'a Row, key: &str) -> Option<&'a Value> {
    row.iter()
        .find(|(column, _)| column == key)
        .map(|(_, value)| value)
}
