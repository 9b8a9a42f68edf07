//! Criteria builder for content queries.

use crate::value::Value;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// SQL keyword form.
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Order specification for sorting results.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpec {
    /// Column expression to order by.
    pub field: String,
    /// Sort direction.
    pub direction: OrderDirection,
}

impl OrderSpec {
    /// Create an ascending order spec.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Create a descending order spec.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: OrderDirection::Desc,
        }
    }
}

/// One predicate payload.
///
/// The predicate key decides the interpretation: a direct property key takes
/// a [`Value`](Predicate::Value) for equality (or a [`List`](Predicate::List)
/// as `IN` sugar, or a [`Map`](Predicate::Map) scoped to its relation
/// target); a `column__modifier` key takes the modifier's operand; anything
/// else must carry [`Raw`](Predicate::Raw) bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// A scalar operand.
    Value(Value),
    /// A list operand for `in`/`notin`.
    List(Vec<Value>),
    /// Nested predicates scoped to a relation property's target type.
    Map(Vec<(String, Predicate)>),
    /// Named bind parameters for a raw expression key.
    Raw(Vec<(String, Value)>),
}

impl From<Value> for Predicate {
    fn from(value: Value) -> Self {
        Predicate::Value(value)
    }
}

impl From<bool> for Predicate {
    fn from(value: bool) -> Self {
        Predicate::Value(Value::Bool(value))
    }
}

impl From<i32> for Predicate {
    fn from(value: i32) -> Self {
        Predicate::Value(Value::Int(value as i64))
    }
}

impl From<i64> for Predicate {
    fn from(value: i64) -> Self {
        Predicate::Value(Value::Int(value))
    }
}

impl From<f64> for Predicate {
    fn from(value: f64) -> Self {
        Predicate::Value(Value::Float(value))
    }
}

impl From<&str> for Predicate {
    fn from(value: &str) -> Self {
        Predicate::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Predicate {
    fn from(value: String) -> Self {
        Predicate::Value(Value::String(value))
    }
}

impl From<Vec<Value>> for Predicate {
    fn from(values: Vec<Value>) -> Self {
        Predicate::List(values)
    }
}

impl From<Vec<(String, Predicate)>> for Predicate {
    fn from(entries: Vec<(String, Predicate)>) -> Self {
        Predicate::Map(entries)
    }
}

/// A declarative query against one content type.
///
/// Built fluently and compiled by the repository; carries no connection
/// state of its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    /// Target type identifier (`database::table`).
    pub schema: String,
    /// Predicates in declared order.
    pub predicates: Vec<(String, Predicate)>,
    /// Group-by expressions.
    pub group_by: Vec<String>,
    /// Order-by specifications.
    pub order_by: Vec<OrderSpec>,
    /// Maximum number of rows.
    pub limit: Option<u64>,
    /// Number of rows to skip.
    pub offset: u64,
    /// Whether results hydrate to plain mappings instead of typed content.
    pub as_map: bool,
}

impl ContentQuery {
    /// Create a query for a type identifier.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
            as_map: false,
        }
    }

    /// Add a predicate.
    pub fn with(mut self, name: impl Into<String>, predicate: impl Into<Predicate>) -> Self {
        self.predicates.push((name.into(), predicate.into()));
        self
    }

    /// Add a raw where expression with named bind parameters.
    pub fn raw(
        mut self,
        expression: impl Into<String>,
        params: Vec<(String, Value)>,
    ) -> Self {
        self.predicates
            .push((expression.into(), Predicate::Raw(params)));
        self
    }

    /// Add a group-by expression.
    pub fn group_by(mut self, expression: impl Into<String>) -> Self {
        self.group_by.push(expression.into());
        self
    }

    /// Add an order-by specification.
    pub fn order_by(mut self, order: OrderSpec) -> Self {
        self.order_by.push(order);
        self
    }

    /// Set the row limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the row offset.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Return plain nested mappings instead of typed content.
    pub fn as_map(mut self) -> Self {
        self.as_map = true;
        self
    }
}
