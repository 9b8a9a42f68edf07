//! Resolved content type definitions.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use super::property::Property;
use crate::error::Error;

/// A resolved content type (one table).
///
/// Types are produced by the resolver and immutable afterwards. Property
/// order follows declaration order: inherited properties first, own
/// properties after, with merged overrides moved to the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    /// Globally unique `database::table` identifier.
    pub identifier: String,
    /// Database name.
    pub database: String,
    /// Table name.
    pub table: String,
    /// Human description, carried as metadata.
    pub description: Option<String>,
    /// Ordered property definitions.
    pub properties: Vec<Property>,
    /// Type-level validator configuration, opaque to this engine.
    pub validators: IndexMap<String, JsonValue>,
}

impl Type {
    /// Create an empty type.
    pub fn new(
        identifier: impl Into<String>,
        database: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            database: database.into(),
            table: table.into(),
            description: None,
            properties: Vec::new(),
            validators: IndexMap::new(),
        }
    }

    /// Add a property (builder form, for programmatic construction).
    pub fn with_property(mut self, property: Property) -> Self {
        self.set_property(property);
        self
    }

    /// Get a property by identifier.
    pub fn get_property(&self, identifier: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.identifier == identifier)
    }

    /// Get a property by identifier, failing with `MissingProperty`.
    pub fn property(&self, identifier: &str) -> Result<&Property, Error> {
        self.get_property(identifier)
            .ok_or_else(|| Error::MissingProperty {
                property: identifier.to_string(),
                type_identifier: self.identifier.clone(),
            })
    }

    /// Check if a property exists.
    pub fn has_property(&self, identifier: &str) -> bool {
        self.get_property(identifier).is_some()
    }

    /// Insert or replace a property, keeping its declaration position when
    /// it already exists.
    pub fn set_property(&mut self, property: Property) {
        match self
            .properties
            .iter()
            .position(|p| p.identifier == property.identifier)
        {
            Some(index) => self.properties[index] = property,
            None => self.properties.push(property),
        }
    }

    /// Remove a property, returning it if present.
    pub fn remove_property(&mut self, identifier: &str) -> Option<Property> {
        self.properties
            .iter()
            .position(|p| p.identifier == identifier)
            .map(|index| self.properties.remove(index))
    }

    /// The autoincrement property, failing when the type defines none.
    pub fn auto_increment(&self) -> Result<&Property, Error> {
        self.properties
            .iter()
            .find(|p| p.auto_increment)
            .ok_or_else(|| Error::NoAutoIncrementProperty {
                type_identifier: self.identifier.clone(),
            })
    }

    /// Number of properties marked autoincrement.
    pub(crate) fn auto_increment_count(&self) -> usize {
        self.properties.iter().filter(|p| p.auto_increment).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::property::StorageType;

    fn sample_type() -> Type {
        Type::new("app::article", "app", "article")
            .with_property(Property::new("id", StorageType::BigInt).auto_increment())
            .with_property(Property::new("title", StorageType::String).not_null())
            .with_property(Property::new("body", StorageType::Text))
    }

    #[test]
    fn test_property_lookup() {
        let ty = sample_type();

        assert!(ty.has_property("title"));
        assert!(!ty.has_property("missing"));
        assert_eq!(ty.property("id").unwrap().identifier, "id");

        let err = ty.property("missing").unwrap_err();
        assert!(matches!(err, Error::MissingProperty { property, type_identifier }
            if property == "missing" && type_identifier == "app::article"));
    }

    #[test]
    fn test_set_property_replaces_in_place() {
        let mut ty = sample_type();
        ty.set_property(Property::new("title", StorageType::Text));

        assert_eq!(ty.properties.len(), 3);
        assert_eq!(ty.properties[1].identifier, "title");
        assert_eq!(ty.properties[1].storage_type, StorageType::Text);
    }

    #[test]
    fn test_remove_property() {
        let mut ty = sample_type();
        let removed = ty.remove_property("body").unwrap();
        assert_eq!(removed.identifier, "body");
        assert!(!ty.has_property("body"));
        assert!(ty.remove_property("body").is_none());
    }

    #[test]
    fn test_auto_increment() {
        let ty = sample_type();
        assert_eq!(ty.auto_increment().unwrap().identifier, "id");

        let bare = Type::new("app::tag", "app", "tag")
            .with_property(Property::new("name", StorageType::String));
        let err = bare.auto_increment().unwrap_err();
        assert!(matches!(err, Error::NoAutoIncrementProperty { type_identifier }
            if type_identifier == "app::tag"));
    }
}
