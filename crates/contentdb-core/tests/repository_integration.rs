//! Integration tests for the repository against a recording connection.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use contentdb_core::{
    Connection, ContentQuery, ContentRepository, Error, Hydrated, OrderSpec, Predicate, Row,
    SchemaManager, Statement, Value,
};

/// Connection double: records every statement and replays canned rows.
struct MockConnection {
    statements: Mutex<Vec<Statement>>,
    select_rows: Mutex<VecDeque<Vec<Row>>>,
    affected: u64,
    last_id: Option<Value>,
}

impl MockConnection {
    fn new() -> Self {
        Self {
            statements: Mutex::new(Vec::new()),
            select_rows: Mutex::new(VecDeque::new()),
            affected: 1,
            last_id: Some(Value::Int(1)),
        }
    }

    fn with_rows(self, rows: Vec<Row>) -> Self {
        self.select_rows.lock().unwrap().push_back(rows);
        self
    }

    fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    fn with_last_id(mut self, last_id: Option<Value>) -> Self {
        self.last_id = last_id;
        self
    }

    fn recorded(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }
}

impl Connection for MockConnection {
    fn select(&self, statement: &Statement) -> Result<Vec<Row>, Error> {
        self.statements.lock().unwrap().push(statement.clone());
        Ok(self
            .select_rows
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn execute(&self, statement: &Statement) -> Result<u64, Error> {
        self.statements.lock().unwrap().push(statement.clone());
        Ok(self.affected)
    }

    fn last_insert_id(&self) -> Result<Option<Value>, Error> {
        Ok(self.last_id.clone())
    }
}

struct TestContext {
    connection: Arc<MockConnection>,
    repository: ContentRepository,
}

impl TestContext {
    fn new(connection: MockConnection) -> Self {
        let manager = Arc::new(SchemaManager::from_json(BLOG_CONFIG).unwrap());
        let connection = Arc::new(connection);
        let repository = ContentRepository::new(manager, connection.clone());
        Self {
            connection,
            repository,
        }
    }
}

const BLOG_CONFIG: &str = r#"{
    "properties": {
        "id": {"type": "bigint", "autoincrement": true, "notnull": true},
        "created_at": {
            "type": "timestamp",
            "notnull": true,
            "index": true,
            "default": "CURRENT_TIMESTAMP"
        }
    },
    "types": {
        "app::base": {
            "properties": {"id": {}, "created_at": {}}
        },
        "app::author": {
            "inherits": ["app::base"],
            "exclude_properties": ["created_at"],
            "properties": {
                "name": {"type": "string", "length": 255, "notnull": true}
            }
        },
        "app::article": {
            "inherits": ["app::base"],
            "properties": {
                "title": {"type": "string", "length": 255, "notnull": true},
                "views": {"type": "integer", "default": 0},
                "author": {
                    "type": "bigint",
                    "relation": {"schema": "app::author", "property": "id"}
                }
            }
        }
    }
}"#;

const ARTICLE_SELECT: &str = "SELECT article.id AS article__id, \
    article.created_at AS article__created_at, article.title AS article__title, \
    article.views AS article__views, author.id AS author__id, \
    author.name AS author__name FROM article AS article \
    LEFT JOIN author AS author ON article.author = author.id";

fn row(entries: &[(&str, Value)]) -> Row {
    entries
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn article_row(id: i64, title: &str, author_id: i64, author_name: &str) -> Row {
    row(&[
        ("article__id", Value::Int(id)),
        ("article__created_at", Value::String("2024-01-01 00:00:00".into())),
        ("article__title", Value::String(title.into())),
        ("article__views", Value::String("2".into())),
        ("author__id", Value::Int(author_id)),
        ("author__name", Value::String(author_name.into())),
    ])
}

#[test]
fn test_filter_compiles_joined_select_and_hydrates() {
    let ctx = TestContext::new(
        MockConnection::new().with_rows(vec![
            article_row(1, "First", 7, "Ada"),
            article_row(2, "Second", 8, "Lin"),
        ]),
    );

    let query = ContentQuery::new("app::article");
    let results: Vec<Hydrated> = ctx
        .repository
        .filter(&query)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let recorded = ctx.connection.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].sql, ARTICLE_SELECT);
    assert!(recorded[0].params.is_empty());

    assert_eq!(results.len(), 2);
    let Hydrated::Content(first) = &results[0] else {
        panic!("expected typed content");
    };
    assert!(!first.is_empty());
    // Raw driver values coerce to the property's native representation.
    assert_eq!(first.get("views").unwrap().scalar(), Some(&Value::Int(2)));

    let author = first.get("author").unwrap().nested().unwrap();
    assert_eq!(author.get("id").unwrap().scalar(), Some(&Value::Int(7)));
    assert_eq!(
        author.get("name").unwrap().scalar(),
        Some(&Value::String("Ada".into()))
    );
}

#[test]
fn test_filter_as_map_returns_plain_mappings() {
    let ctx = TestContext::new(
        MockConnection::new().with_rows(vec![article_row(1, "First", 7, "Ada")]),
    );

    let query = ContentQuery::new("app::article").as_map();
    let results: Vec<Hydrated> = ctx
        .repository
        .filter(&query)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let Hydrated::Map(map) = &results[0] else {
        panic!("expected plain mapping");
    };
    assert_eq!(map["title"], serde_json::json!("First"));
    assert_eq!(map["views"], serde_json::json!(2));
    assert_eq!(map["author"]["name"], serde_json::json!("Ada"));
    assert_eq!(
        map["created_at"],
        serde_json::json!("2024-01-01T00:00:00.000000Z")
    );
}

#[test]
fn test_filter_is_single_pass() {
    let ctx = TestContext::new(
        MockConnection::new().with_rows(vec![article_row(1, "One", 7, "Ada")]),
    );

    let rows = ctx.repository.filter(&ContentQuery::new("app::article")).unwrap();
    // Consuming the iterator does not go back to the connection.
    assert_eq!(rows.count(), 1);
    assert_eq!(ctx.connection.recorded().len(), 1);
}

#[test]
fn test_get_forces_limit_and_hydrates_first_row() {
    let ctx = TestContext::new(
        MockConnection::new().with_rows(vec![article_row(3, "Found", 7, "Ada")]),
    );

    let content = ctx
        .repository
        .get(&ContentQuery::new("app::article").with("id", 3i64))
        .unwrap();

    let recorded = ctx.connection.recorded();
    assert_eq!(
        recorded[0].sql,
        format!("{ARTICLE_SELECT} WHERE article.id = :p0 LIMIT 1")
    );
    assert_eq!(recorded[0].param("p0"), Some(&Value::Int(3)));

    assert!(!content.is_empty());
    assert_eq!(content.auto_id().unwrap(), Value::Int(3));
}

#[test]
fn test_get_with_empty_result() {
    let ctx = TestContext::new(MockConnection::new().with_rows(vec![]));

    let content = ctx
        .repository
        .get(&ContentQuery::new("app::article").with("id", 99i64))
        .unwrap();

    assert!(content.is_empty());
    assert_eq!(content.get("views").unwrap().scalar(), Some(&Value::Int(0)));
}

#[test]
fn test_predicate_grammar_through_repository() {
    let ctx = TestContext::new(MockConnection::new().with_rows(vec![]));

    let query = ContentQuery::new("app::article")
        .with("views__gte", 21i64)
        .with("id__in", vec![Value::Int(1), Value::Int(2)])
        .with(
            "author",
            vec![("name".to_string(), Predicate::from("Ada"))],
        )
        .order_by(OrderSpec::desc("article.id"))
        .limit(10)
        .offset(5);

    ctx.repository.filter(&query).unwrap();

    let recorded = ctx.connection.recorded();
    assert_eq!(
        recorded[0].sql,
        format!(
            "{ARTICLE_SELECT} WHERE article.views >= :p0 AND article.id IN (:p1, :p2) \
             AND author.name = :p3 ORDER BY article.id DESC LIMIT 10 OFFSET 5"
        )
    );
    assert_eq!(recorded[0].param("p3"), Some(&Value::String("Ada".into())));
}

#[test]
fn test_create_returns_backend_identifier() {
    let ctx = TestContext::new(MockConnection::new().with_last_id(Some(Value::Int(42))));

    let mut article = ctx.repository.content("app::article").unwrap();
    article
        .set_value("title", Value::String("Fresh".into()))
        .unwrap();

    let id = ctx.repository.create(&article).unwrap();
    assert_eq!(id, Some(Value::Int(42)));

    let recorded = ctx.connection.recorded();
    assert_eq!(
        recorded[0].sql,
        "INSERT INTO article (created_at, title, views, author) \
         VALUES (:p0, :p1, :p2, :p3)"
    );
    // The deferred not-null default resolved at insert time.
    assert!(matches!(recorded[0].param("p0"), Some(Value::Timestamp(_))));
    assert_eq!(recorded[0].param("p1"), Some(&Value::String("Fresh".into())));
    assert_eq!(recorded[0].param("p2"), Some(&Value::Int(0)));
    assert_eq!(recorded[0].param("p3"), Some(&Value::Null));
}

#[test]
fn test_create_with_no_affected_rows() {
    let ctx = TestContext::new(MockConnection::new().with_affected(0));

    let mut article = ctx.repository.content("app::article").unwrap();
    article
        .set_value("title", Value::String("Lost".into()))
        .unwrap();

    assert_eq!(ctx.repository.create(&article).unwrap(), None);
}

#[test]
fn test_update_by_auto_increment() {
    let ctx = TestContext::new(MockConnection::new().with_affected(1));

    let mut article = ctx.repository.content("app::article").unwrap();
    article.set_value("id", Value::Int(11)).unwrap();

    let affected = ctx
        .repository
        .update(
            &article,
            &[("title".to_string(), Value::String("Renamed".into()))],
        )
        .unwrap();

    assert_eq!(affected, 1);
    let recorded = ctx.connection.recorded();
    assert_eq!(
        recorded[0].sql,
        "UPDATE article SET title = :p0 WHERE id = :p1"
    );
    assert_eq!(recorded[0].param("p1"), Some(&Value::Int(11)));
}

#[test]
fn test_delete_default_and_criteria() {
    let ctx = TestContext::new(MockConnection::new().with_affected(1));

    let mut article = ctx.repository.content("app::article").unwrap();
    article.set_value("id", Value::Int(4)).unwrap();

    ctx.repository.delete(&article, &[]).unwrap();
    ctx.repository
        .delete(
            &article,
            &[("views__lt".to_string(), Predicate::from(1i64))],
        )
        .unwrap();

    let recorded = ctx.connection.recorded();
    assert_eq!(recorded[0].sql, "DELETE FROM article WHERE article.id = :p0");
    assert_eq!(
        recorded[1].sql,
        "DELETE FROM article WHERE article.views < :p0"
    );
}

#[test]
fn test_unknown_schema_fails_resolution() {
    let ctx = TestContext::new(MockConnection::new());

    let err = ctx
        .repository
        .filter(&ContentQuery::new("app::missing"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { identifier, .. }
        if identifier == "app::missing"));
}

#[test]
fn test_exclusion_shapes_joined_columns() {
    // author inherits created_at from base but excludes it, so the join
    // selects only id and name.
    let ctx = TestContext::new(MockConnection::new().with_rows(vec![]));

    ctx.repository
        .filter(&ContentQuery::new("app::author"))
        .unwrap();

    let recorded = ctx.connection.recorded();
    assert_eq!(
        recorded[0].sql,
        "SELECT author.id AS author__id, author.name AS author__name \
         FROM author AS author"
    );
}
