//! Core error types.

use thiserror::Error;

use crate::schema::ValidationMessage;

/// Engine errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration could not be deserialized at all.
    #[error("malformed schema configuration: {0}")]
    MalformedConfig(String),

    /// A content type's configuration failed validation.
    #[error("invalid configuration for {identifier}")]
    InvalidConfig {
        /// The offending type identifier.
        identifier: String,
        /// Structured validation messages.
        messages: Vec<ValidationMessage>,
    },

    /// Relation wiring loops back onto a type still being resolved.
    #[error("cyclic relation while resolving {identifier} ({})", chain.join(" -> "))]
    CyclicRelation {
        /// The identifier that closed the cycle.
        identifier: String,
        /// Resolution chain, outermost first.
        chain: Vec<String>,
    },

    /// Property access by unknown name.
    #[error("missing property {property} on type {type_identifier}")]
    MissingProperty {
        /// Requested property identifier.
        property: String,
        /// Owning type identifier.
        type_identifier: String,
    },

    /// The type defines no autoincrement property.
    #[error("no autoincrement property on type {type_identifier}")]
    NoAutoIncrementProperty {
        /// Owning type identifier.
        type_identifier: String,
    },

    /// Predicate suffix after `__` is not a known filter modifier.
    #[error("unknown filter modifier in predicate {predicate}")]
    UnknownModifier {
        /// The offending predicate key.
        predicate: String,
    },

    /// A raw expression predicate was given without bound parameters.
    #[error("raw expression {predicate} requires a map of bound parameters")]
    RawExpressionParams {
        /// The offending predicate key.
        predicate: String,
    },

    /// A filter modifier received an operand of the wrong shape.
    #[error("predicate {predicate} expects {expected}")]
    InvalidOperand {
        /// The offending predicate key.
        predicate: String,
        /// Human description of the expected operand.
        expected: &'static str,
    },

    /// Update was asked to write nothing.
    #[error("update requires at least one changed field")]
    EmptyChanges,

    /// The criteria cannot be compiled for this operation.
    #[error("criteria {predicate} is not supported for this operation")]
    UnsupportedCriteria {
        /// The offending predicate key.
        predicate: String,
    },

    /// A value could not be coerced to a property's storage type.
    #[error("cannot coerce value for property {property} to {storage_type}")]
    Coercion {
        /// Property identifier.
        property: String,
        /// Target storage type tag.
        storage_type: String,
    },

    /// Storage collaborator failure, propagated unmodified.
    #[error("connection error: {0}")]
    Connection(String),
}
