//! Parameterized SQL statements.

use crate::value::Value;

/// A compiled SQL statement with named bind parameters.
///
/// Placeholders use the `:name` convention; compiler-allocated parameters
/// are named `p0, p1, ...` while raw expressions keep their caller-chosen
/// names.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The SQL text.
    pub sql: String,
    /// Bind parameters in allocation order.
    pub params: Vec<(String, Value)>,
}

impl Statement {
    /// Create a statement.
    pub fn new(sql: impl Into<String>, params: Vec<(String, Value)>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Look up a bind parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }
}

/// Allocates uniquely named bind parameters during compilation.
#[derive(Debug, Default)]
pub(crate) struct Parameters {
    items: Vec<(String, Value)>,
}

impl Parameters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Bind a value under the next generated name, returning its
    /// placeholder.
    pub(crate) fn bind(&mut self, value: Value) -> String {
        let name = format!("p{}", self.items.len());
        let placeholder = format!(":{name}");
        self.items.push((name, value));
        placeholder
    }

    /// Bind a value under a caller-chosen name (raw expressions).
    pub(crate) fn bind_named(&mut self, name: impl Into<String>, value: Value) {
        self.items.push((name.into(), value));
    }

    pub(crate) fn into_params(self) -> Vec<(String, Value)> {
        self.items
    }
}
