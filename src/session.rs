// SPDX-License-Identifier: Apache-2.0

//! The two-phase table function session.
//!
//! `prepare` runs binder, resolver, and pool factory without any I/O.
//! The host engine then calls `table_structure` during planning (possibly
//! more than once) and `build_table` at materialization time — the two
//! calls may be separated by arbitrary host-driven time, and the pool
//! stays valid across that gap. `build_table` consumes the pool; the
//! session is spent afterwards.

use serde::{Deserialize, Serialize};
use sqlparser::ast::Expr;
use tracing::instrument;
use uuid::Uuid;

use crate::address::resolve_replica_list;
use crate::args::{bind_args, LiteralEvaluator, TableFuncArgs};
use crate::error::{TableFuncError, TableFuncResult};
use crate::handle::MySqlTableHandle;
use crate::pool::ReplicaPool;
use crate::schema::{fetch_schema, MetadataClient, TranslatedColumn};
use crate::settings::TableFuncSettings;

/// Unique identifier for one table function invocation, used for log
/// correlation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(pub Uuid);

impl InvocationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-owned state of one mysql() invocation.
#[derive(Debug)]
pub struct TableFuncSession {
    id: InvocationId,
    args: TableFuncArgs,
    settings: TableFuncSettings,
    pool: Option<ReplicaPool>,
}

impl TableFuncSession {
    /// Validates the argument list, expands the replica set, and builds
    /// the (lazy) connection pool. No network I/O happens here.
    pub fn prepare(
        exprs: &[Expr],
        evaluator: &dyn LiteralEvaluator,
        settings: TableFuncSettings,
    ) -> TableFuncResult<Self> {
        let args = bind_args(exprs, evaluator)?;
        let addresses = resolve_replica_list(
            &args.host_spec,
            settings.max_replica_addresses,
            settings.default_port,
        )?;
        let pool = ReplicaPool::create(
            &args.database,
            &addresses,
            &args.user,
            &args.password,
            &settings,
        );

        Ok(Self {
            id: InvocationId::new(),
            args,
            settings,
            pool: Some(pool),
        })
    }

    pub fn id(&self) -> InvocationId {
        self.id
    }

    pub fn args(&self) -> &TableFuncArgs {
        &self.args
    }

    /// Whether the session still owns its pool. `false` once a handle has
    /// been built.
    pub fn owns_pool(&self) -> bool {
        self.pool.is_some()
    }

    /// Fetches the remote table structure, borrowing the pool.
    ///
    /// Callable repeatedly; a failure leaves the pool valid for a retry.
    #[instrument(
        skip(self, client),
        fields(
            invocation = %self.id.0,
            database = %self.args.database,
            table = %self.args.table
        )
    )]
    pub async fn table_structure(
        &self,
        client: &dyn MetadataClient,
    ) -> TableFuncResult<Vec<TranslatedColumn>> {
        let pool = self.pool.as_ref().ok_or_else(pool_handed_off)?;
        fetch_schema(
            pool,
            client,
            &self.args.database,
            &self.args.table,
            self.settings.type_support,
        )
        .await
    }

    /// Builds the table handle, transferring pool ownership into it.
    ///
    /// The schema is fetched first; if that fails the session stays
    /// reusable. On success the pool moves into the handle atomically,
    /// the handle's startup hook runs, and any further use of this
    /// session is an owner-invalidation error.
    #[instrument(
        skip(self, client),
        fields(
            invocation = %self.id.0,
            database = %self.args.database,
            table = %self.args.table
        )
    )]
    pub async fn build_table(
        &mut self,
        client: &dyn MetadataClient,
    ) -> TableFuncResult<MySqlTableHandle> {
        let schema = self.table_structure(client).await?;
        let pool = self.pool.take().ok_or_else(pool_handed_off)?;

        let handle = MySqlTableHandle::new(
            pool,
            self.args.database.clone(),
            self.args.table.clone(),
            self.args.replace_query,
            self.args.on_duplicate_clause.clone(),
            schema,
        );
        handle.startup();
        Ok(handle)
    }
}

fn pool_handed_off() -> TableFuncError {
    TableFuncError::internal("connection pool already handed off to a table handle")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ConstantFolder;
    use sqlparser::ast::{SelectItem, SetExpr, Statement};
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

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
        crate::args::extract_call_arguments(func).expect("extract failed")
    }

    #[tokio::test]
    async fn prepare_builds_session_without_io() {
        let exprs = parse_args("'h1:3306,h2', 'db1', 'tbl1', 'root', 'pw'");
        let session =
            TableFuncSession::prepare(&exprs, &ConstantFolder, TableFuncSettings::default())
                .unwrap();

        assert!(session.owns_pool());
        assert_eq!(session.args().database, "db1");
        assert_eq!(session.args().table, "tbl1");
    }

    #[test]
    fn prepare_propagates_address_errors() {
        let exprs = parse_args("'h1:bad', 'db1', 'tbl1', 'root', 'pw'");
        let err =
            TableFuncSession::prepare(&exprs, &ConstantFolder, TableFuncSettings::default())
                .unwrap_err();
        assert!(matches!(err, TableFuncError::InvalidAddressSyntax { .. }));
    }

    #[test]
    fn prepare_respects_address_cap() {
        let exprs = parse_args("'h{1..3}', 'db1', 'tbl1', 'root', 'pw'");
        let settings = TableFuncSettings {
            max_replica_addresses: 2,
            ..TableFuncSettings::default()
        };
        let err = TableFuncSession::prepare(&exprs, &ConstantFolder, settings).unwrap_err();
        assert!(matches!(err, TableFuncError::TooManyAddresses { limit: 2 }));
    }
}
