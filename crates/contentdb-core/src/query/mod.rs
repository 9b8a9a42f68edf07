//! Query building and statement compilation.

mod compiler;
mod content_query;
mod statement;

pub use compiler::QueryCompiler;
pub use content_query::{ContentQuery, OrderDirection, OrderSpec, Predicate};
pub use statement::Statement;
