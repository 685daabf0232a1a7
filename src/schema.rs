// SPDX-License-Identifier: Apache-2.0

//! Remote schema introspection.
//!
//! Borrows the replica pool for one metadata round-trip, fetches the
//! column list of the target table, and translates each column into the
//! host type system. The pool is never consumed here: a failed fetch
//! leaves it valid for a retry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{TableFuncError, TableFuncResult};
use crate::pool::ReplicaPool;
use crate::typemap::{map_remote_type, TypeDescriptor, TypeSupportLevel};

/// One column as reported by the remote metadata catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteColumn {
    pub name: String,
    /// Raw COLUMN_TYPE string, e.g. `int(11) unsigned`.
    pub column_type: String,
    pub nullable: bool,
}

/// One column translated into the host type system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedColumn {
    pub name: String,
    pub host_type: TypeDescriptor,
}

/// Remote metadata collaborator.
///
/// Implementations report an absent table as an empty column list; the
/// fetcher owns the unknown-table error and its message. Driver-level
/// failures surface as the opaque `Connectivity` kind.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    async fn describe_table(
        &self,
        pool: &ReplicaPool,
        database: &str,
        table: &str,
    ) -> TableFuncResult<Vec<RemoteColumn>>;
}

/// Production metadata client backed by `information_schema.COLUMNS`.
pub struct InformationSchemaClient;

#[async_trait]
impl MetadataClient for InformationSchemaClient {
    async fn describe_table(
        &self,
        pool: &ReplicaPool,
        database: &str,
        table: &str,
    ) -> TableFuncResult<Vec<RemoteColumn>> {
        let mut conn = pool.acquire().await?;

        // Cast to CHAR to avoid BINARY type mismatch with Rust String.
        // An empty database argument resolves against the connection's
        // current schema.
        let query = if database.is_empty() {
            r#"
            SELECT
                CAST(c.COLUMN_NAME AS CHAR) AS column_name,
                CAST(c.COLUMN_TYPE AS CHAR) AS column_type,
                CAST(c.IS_NULLABLE AS CHAR) AS is_nullable
            FROM information_schema.COLUMNS c
            WHERE c.TABLE_SCHEMA = DATABASE() AND c.TABLE_NAME = ?
            ORDER BY c.ORDINAL_POSITION
            "#
        } else {
            r#"
            SELECT
                CAST(c.COLUMN_NAME AS CHAR) AS column_name,
                CAST(c.COLUMN_TYPE AS CHAR) AS column_type,
                CAST(c.IS_NULLABLE AS CHAR) AS is_nullable
            FROM information_schema.COLUMNS c
            WHERE c.TABLE_SCHEMA = ? AND c.TABLE_NAME = ?
            ORDER BY c.ORDINAL_POSITION
            "#
        };

        let mut q = sqlx::query_as::<_, (String, String, String)>(query);
        if !database.is_empty() {
            q = q.bind(database);
        }
        let rows = q
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| TableFuncError::connectivity(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(name, column_type, is_nullable)| RemoteColumn {
                name,
                column_type,
                nullable: is_nullable == "YES",
            })
            .collect())
    }
}

/// Fetches and translates the schema of the target table.
///
/// Column order follows the remote metadata's declared order; names are
/// assumed unique upstream.
pub async fn fetch_schema(
    pool: &ReplicaPool,
    client: &dyn MetadataClient,
    database: &str,
    table: &str,
    support: TypeSupportLevel,
) -> TableFuncResult<Vec<TranslatedColumn>> {
    let remote = client.describe_table(pool, database, table).await?;

    if remote.is_empty() {
        return Err(TableFuncError::unknown_table(qualified_name(
            database, table,
        )));
    }

    remote
        .into_iter()
        .map(|column| {
            let host_type =
                map_remote_type(&column.name, &column.column_type, column.nullable, support)?;
            Ok(TranslatedColumn {
                name: column.name,
                host_type,
            })
        })
        .collect()
}

/// Back-quoted qualified table name, omitting the database segment when
/// the database argument was empty.
pub fn qualified_name(database: &str, table: &str) -> String {
    if database.is_empty() {
        format!("`{table}`")
    } else {
        format!("`{database}`.`{table}`")
    }
}
