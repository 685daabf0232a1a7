// SPDX-License-Identifier: Apache-2.0

//! The constructed table handle.

use crate::pool::ReplicaPool;
use crate::schema::TranslatedColumn;

/// Queryable handle over one remote MySQL table.
///
/// Owns the replica pool outright; constructed only after a successful
/// schema fetch and immutable afterwards except for the pool's internal
/// connection state. The read/write execution API lives in the storage
/// layer, which reaches the pool through `pool()`.
#[derive(Debug)]
pub struct MySqlTableHandle {
    pool: ReplicaPool,
    remote_database: String,
    remote_table: String,
    replace_query: bool,
    on_duplicate_clause: String,
    schema: Vec<TranslatedColumn>,
}

impl MySqlTableHandle {
    pub(crate) fn new(
        pool: ReplicaPool,
        remote_database: String,
        remote_table: String,
        replace_query: bool,
        on_duplicate_clause: String,
        schema: Vec<TranslatedColumn>,
    ) -> Self {
        Self {
            pool,
            remote_database,
            remote_table,
            replace_query,
            on_duplicate_clause,
            schema,
        }
    }

    /// Startup hook, called once by the factory before the handle is
    /// returned. Lightweight by contract: no network round-trips.
    pub fn startup(&self) {
        tracing::info!(
            database = %self.remote_database,
            table = %self.remote_table,
            replicas = self.pool.replica_count(),
            columns = self.schema.len(),
            "remote table handle ready"
        );
    }

    pub fn database_name(&self) -> &str {
        &self.remote_database
    }

    pub fn table_name(&self) -> &str {
        &self.remote_table
    }

    pub fn replace_query(&self) -> bool {
        self.replace_query
    }

    pub fn on_duplicate_clause(&self) -> &str {
        &self.on_duplicate_clause
    }

    pub fn schema(&self) -> &[TranslatedColumn] {
        &self.schema
    }

    pub fn pool(&self) -> &ReplicaPool {
        &self.pool
    }
}
