//! Relation definitions between content types.

use std::sync::Arc;

use super::property::Property;
use super::ty::Type;

/// Referential action applied on update/delete of the target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    /// Propagate the change.
    #[default]
    Cascade,
    /// Set the referencing column to null.
    SetNull,
}

impl ReferentialAction {
    /// Parse a configuration value. Anything unrecognized falls back to
    /// `CASCADE`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()) {
            Some(ref v) if v == "SET NULL" => ReferentialAction::SetNull,
            _ => ReferentialAction::Cascade,
        }
    }

    /// SQL keyword form.
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
        }
    }
}

/// A foreign-key style relation owned by exactly one property.
///
/// The target type is held by value; cyclic configurations are rejected
/// during resolution, so the graph is always finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRelation {
    /// Resolved target type.
    pub target: Arc<Type>,
    /// Target property identifier the owning column must match.
    pub property: String,
    /// Join alias; defaults to the target table name. Must be unique per
    /// join level.
    pub alias: String,
    /// On-update referential action.
    pub on_update: ReferentialAction,
    /// On-delete referential action.
    pub on_delete: ReferentialAction,
}

impl PropertyRelation {
    /// Create a relation to `target` matched on `property`.
    pub fn new(target: Arc<Type>, property: impl Into<String>) -> Self {
        Self {
            alias: target.table.clone(),
            target,
            property: property.into(),
            on_update: ReferentialAction::Cascade,
            on_delete: ReferentialAction::Cascade,
        }
    }

    /// Override the join alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Set the on-delete action.
    pub fn with_on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    /// Set the on-update action.
    pub fn with_on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    /// The target property definition, if the target still defines it.
    pub fn target_property(&self) -> Option<&Property> {
        self.target.get_property(&self.property)
    }
}
