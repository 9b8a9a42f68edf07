//! Content repository: CRUD over resolved content types.

use std::sync::Arc;

use tracing::debug;

use crate::connection::Connection;
use crate::content::Content;
use crate::error::Error;
use crate::query::{ContentQuery, Predicate, QueryCompiler};
use crate::schema::{SchemaManager, Type};
use crate::value::{Row, Value};

/// One hydrated result.
#[derive(Debug, Clone, PartialEq)]
pub enum Hydrated {
    /// A typed content instance.
    Content(Content),
    /// A plain nested mapping (as-map result mode).
    Map(serde_json::Map<String, serde_json::Value>),
}

/// Lazy, single-pass sequence of hydrated results.
///
/// The query executed exactly once; iterating consumes the fetched rows and
/// never re-executes. Not safe for concurrent consumption without external
/// synchronization.
#[derive(Debug)]
pub struct HydratedRows {
    ty: Arc<Type>,
    rows: std::vec::IntoIter<Row>,
    as_map: bool,
}

impl Iterator for HydratedRows {
    type Item = Result<Hydrated, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let mut content = Content::new(self.ty.clone());
        match content.hydrate(&row) {
            Err(error) => Some(Err(error)),
            Ok(()) => Some(Ok(if self.as_map {
                Hydrated::Map(content.to_map())
            } else {
                Hydrated::Content(content)
            })),
        }
    }
}

/// Repository compiling queries against resolved types and hydrating the
/// rows that come back.
///
/// Holds the resolver and the datastore collaborator by reference; all
/// compilation is pure, only [`Connection`] calls block.
pub struct ContentRepository {
    schemas: Arc<SchemaManager>,
    connection: Arc<dyn Connection>,
}

impl ContentRepository {
    /// Create a repository over a resolver and a datastore connection.
    pub fn new(schemas: Arc<SchemaManager>, connection: Arc<dyn Connection>) -> Self {
        Self {
            schemas,
            connection,
        }
    }

    /// The schema resolver.
    pub fn schemas(&self) -> &Arc<SchemaManager> {
        &self.schemas
    }

    /// A fresh content instance of a resolved type, at default values.
    pub fn content(&self, identifier: &str) -> Result<Content, Error> {
        Ok(Content::new(self.schemas.resolve(identifier)?))
    }

    /// Insert the content's current values.
    ///
    /// Returns the backend-assigned identifier, or `None` when no row was
    /// affected.
    pub fn create(&self, content: &Content) -> Result<Option<Value>, Error> {
        let statement = QueryCompiler::new(content.ty()).insert(content)?;
        let affected = self.connection.execute(&statement)?;
        if affected == 0 {
            debug!(ty = %content.ty().identifier, "insert affected no rows");
            return Ok(None);
        }
        self.connection.last_insert_id()
    }

    /// Fetch the first match as a typed content instance.
    ///
    /// An empty result yields an unhydrated instance: `is_empty()` reports
    /// true and every property sits at its default.
    pub fn get(&self, query: &ContentQuery) -> Result<Content, Error> {
        let ty = self.schemas.resolve(&query.schema)?;

        let mut limited = query.clone();
        limited.limit = Some(1);
        let statement = QueryCompiler::new(&ty).select(&limited)?;

        let rows = self.connection.select(&statement)?;
        let mut content = Content::new(ty);
        if let Some(row) = rows.first() {
            content.hydrate(row)?;
        }
        Ok(content)
    }

    /// Fetch all matches as a lazy, single-pass sequence.
    pub fn filter(&self, query: &ContentQuery) -> Result<HydratedRows, Error> {
        let ty = self.schemas.resolve(&query.schema)?;
        let statement = QueryCompiler::new(&ty).select(query)?;
        let rows = self.connection.select(&statement)?;
        debug!(ty = %ty.identifier, rows = rows.len(), "fetched content rows");

        Ok(HydratedRows {
            ty,
            rows: rows.into_iter(),
            as_map: query.as_map,
        })
    }

    /// Apply changes to the row matching the content's autoincrement value.
    ///
    /// Returns the affected-row count; zero means "no row affected".
    pub fn update(&self, content: &Content, changes: &[(String, Value)]) -> Result<u64, Error> {
        let statement = QueryCompiler::new(content.ty()).update(content, changes)?;
        self.connection.execute(&statement)
    }

    /// Delete rows.
    ///
    /// Without criteria the content's current autoincrement value is the
    /// match; otherwise criteria compile through the select predicate
    /// grammar. Returns the affected-row count.
    pub fn delete(&self, content: &Content, criteria: &[(String, Predicate)]) -> Result<u64, Error> {
        let statement = QueryCompiler::new(content.ty()).delete(content, criteria)?;
        self.connection.execute(&statement)
    }
}
