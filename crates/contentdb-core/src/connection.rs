//! Connection abstraction for the relational datastore.

use crate::error::Error;
use crate::query::Statement;
use crate::value::{Row, Value};

/// The query execution collaborator.
///
/// The engine never talks SQL dialects or drivers itself; it hands finished
/// parameterized statements to an implementation of this trait. Calls are
/// blocking with no implicit timeout; cancellation policy belongs to the
/// implementation's own contract. Connectivity failures surface as
/// [`Error::Connection`] and propagate unmodified.
pub trait Connection: Send + Sync {
    /// Execute a select and return its rows, each an ordered mapping of
    /// column alias to raw value.
    fn select(&self, statement: &Statement) -> Result<Vec<Row>, Error>;

    /// Execute a mutating statement and return the affected-row count.
    ///
    /// A zero count means "no row affected" and is not an error.
    fn execute(&self, statement: &Statement) -> Result<u64, Error>;

    /// The identifier assigned by the most recent insert, if the backend
    /// reports one.
    fn last_insert_id(&self) -> Result<Option<Value>, Error>;
}
