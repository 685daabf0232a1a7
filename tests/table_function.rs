//! End-to-end pipeline tests: parsed call node in, table handle out,
//! with a mock metadata backend standing in for the remote server.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlparser::ast::{Expr, SelectItem, SetExpr, Statement};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use mysql_tablefunc::{
    extract_call_arguments, ConstantFolder, MetadataClient, RemoteColumn, ReplicaPool,
    TableFuncError, TableFuncResult, TableFuncSession, TableFuncSettings, TypeDescriptor,
};

/// Parses `mysql(<args>)` out of a SELECT projection, the way a host
/// engine would hand the call node in.
fn parse_args(args_sql: &str) -> Vec<Expr> {
    let sql = format!("SELECT mysql({args_sql})");
    let statements = Parser::parse_sql(&GenericDialect {}, &sql).expect("parse failed");
    let Statement::Query(query) = &statements[0] else {
        panic!("expected a query");
    };
    let SetExpr::Select(select) = query.body.as_ref() else {
        panic!("expected a select");
    };
    let SelectItem::UnnamedExpr(Expr::Function(func)) = &select.projection[0] else {
        panic!("expected a function call");
    };
    extract_call_arguments(func).expect("extract failed")
}

fn prepare(args_sql: &str) -> TableFuncSession {
    TableFuncSession::prepare(&parse_args(args_sql), &ConstantFolder, TableFuncSettings::default())
        .expect("prepare failed")
}

/// Metadata backend serving a fixed table.
struct Backend {
    table: String,
    columns: Vec<RemoteColumn>,
    calls: AtomicUsize,
}

impl Backend {
    fn with_table(table: &str, columns: &[(&str, &str)]) -> Self {
        Self {
            table: table.to_string(),
            columns: columns
                .iter()
                .map(|(name, column_type)| RemoteColumn {
                    name: name.to_string(),
                    column_type: column_type.to_string(),
                    nullable: false,
                })
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MetadataClient for Backend {
    async fn describe_table(
        &self,
        _pool: &ReplicaPool,
        _database: &str,
        table: &str,
    ) -> TableFuncResult<Vec<RemoteColumn>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if table == self.table {
            Ok(self.columns.clone())
        } else {
            Ok(Vec::new())
        }
    }
}

/// Backend whose first call fails with a connectivity error.
struct FlakyBackend {
    inner: Backend,
    failures_left: AtomicUsize,
}

#[async_trait]
impl MetadataClient for FlakyBackend {
    async fn describe_table(
        &self,
        pool: &ReplicaPool,
        database: &str,
        table: &str,
    ) -> TableFuncResult<Vec<RemoteColumn>> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(TableFuncError::connectivity("connection reset by peer"));
        }
        self.inner.describe_table(pool, database, table).await
    }
}

#[tokio::test]
async fn end_to_end_produces_a_table_handle() {
    let backend = Backend::with_table("tbl1", &[("id", "int"), ("name", "varchar(255)")]);
    let mut session = prepare("'127.0.0.1:3306', 'db1', 'tbl1', 'root', 'pw'");

    let structure = session.table_structure(&backend).await.unwrap();
    assert_eq!(structure.len(), 2);

    let handle = session.build_table(&backend).await.unwrap();
    assert_eq!(handle.database_name(), "db1");
    assert_eq!(handle.table_name(), "tbl1");
    assert!(!handle.replace_query());
    assert_eq!(handle.on_duplicate_clause(), "");
    assert_eq!(handle.schema().len(), 2);
    assert_eq!(handle.schema()[0].name, "id");
    assert_eq!(handle.schema()[0].host_type, TypeDescriptor::Int32);
    assert_eq!(handle.schema()[1].name, "name");
    assert_eq!(handle.schema()[1].host_type, TypeDescriptor::String);
    assert_eq!(handle.pool().replica_count(), 1);
}

#[tokio::test]
async fn structure_can_be_fetched_repeatedly_before_build() {
    let backend = Backend::with_table("tbl1", &[("id", "int")]);
    let session = prepare("'h1,h2', 'db1', 'tbl1', 'root', 'pw'");

    let first = session.table_structure(&backend).await.unwrap();
    let second = session.table_structure(&backend).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn build_invalidates_the_session_pool() {
    let backend = Backend::with_table("tbl1", &[("id", "int")]);
    let mut session = prepare("'h1', 'db1', 'tbl1', 'root', 'pw'");

    let handle = session.build_table(&backend).await.unwrap();
    assert!(!session.owns_pool());

    // Both entry points must now report the owner-invalidation violation.
    let err = session.table_structure(&backend).await.unwrap_err();
    assert!(matches!(err, TableFuncError::Internal { .. }));
    let err = session.build_table(&backend).await.unwrap_err();
    assert!(matches!(err, TableFuncError::Internal { .. }));

    // The handle keeps working; it owns the pool now.
    assert_eq!(handle.table_name(), "tbl1");
    assert_eq!(handle.pool().database(), "db1");
}

#[tokio::test]
async fn failed_fetch_leaves_the_pool_reusable() {
    let backend = FlakyBackend {
        inner: Backend::with_table("tbl1", &[("id", "int")]),
        failures_left: AtomicUsize::new(1),
    };
    let mut session = prepare("'h1', 'db1', 'tbl1', 'root', 'pw'");

    let err = session.build_table(&backend).await.unwrap_err();
    assert!(matches!(err, TableFuncError::Connectivity { .. }));
    assert!(session.owns_pool());

    // Caller-driven retry succeeds with the same session.
    let handle = session.build_table(&backend).await.unwrap();
    assert_eq!(handle.schema().len(), 1);
}

#[tokio::test]
async fn unknown_table_reports_the_qualified_name() {
    let backend = Backend::with_table("tbl1", &[("id", "int")]);
    let session = prepare("'h1', 'db1', 'missing', 'root', 'pw'");

    let err = session.table_structure(&backend).await.unwrap_err();
    assert!(matches!(err, TableFuncError::UnknownTable { .. }));
    assert!(err.to_string().contains("`db1`.`missing`"));
}

#[tokio::test]
async fn replace_and_on_duplicate_flow_into_the_handle() {
    let backend = Backend::with_table("tbl1", &[("id", "int")]);

    let mut session = prepare("'h1', 'db1', 'tbl1', 'root', 'pw', 1");
    let handle = session.build_table(&backend).await.unwrap();
    assert!(handle.replace_query());

    let mut session = prepare("'h1', 'db1', 'tbl1', 'root', 'pw', 0, 'c = c + 1'");
    let handle = session.build_table(&backend).await.unwrap();
    assert!(!handle.replace_query());
    assert_eq!(handle.on_duplicate_clause(), "c = c + 1");
}

#[tokio::test]
async fn replica_spec_expands_into_the_pool() {
    let backend = Backend::with_table("tbl1", &[("id", "int")]);
    let mut session = prepare("'shard{1..3}.db:3307', 'db1', 'tbl1', 'root', 'pw'");

    let handle = session.build_table(&backend).await.unwrap();
    let addresses: Vec<String> = handle
        .pool()
        .addresses()
        .iter()
        .map(|a| a.to_string())
        .collect();
    assert_eq!(
        addresses,
        vec!["shard1.db:3307", "shard2.db:3307", "shard3.db:3307"]
    );
}
