// SPDX-License-Identifier: Apache-2.0

//! Replica-set connection pool.
//!
//! One `ReplicaPool` is created per table function invocation and scoped
//! to a single (database, user, password) triple. Construction never
//! performs I/O: each replica gets a lazily-connecting SQLx pool, so a
//! structure-only invocation does not require every replica to be
//! reachable, only one. The type is deliberately not `Clone` — the pool
//! has exactly one logical owner at any instant.

use std::time::Duration;

use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;

use crate::address::ReplicaAddress;
use crate::error::{TableFuncError, TableFuncResult};
use crate::settings::TableFuncSettings;

struct Replica {
    address: ReplicaAddress,
    pool: MySqlPool,
}

/// Owned pool over the replica set of one remote table.
pub struct ReplicaPool {
    database: String,
    user: String,
    replicas: Vec<Replica>,
}

impl ReplicaPool {
    /// Builds the pool without connecting. Connections are established on
    /// first acquire.
    pub fn create(
        database: &str,
        addresses: &[ReplicaAddress],
        user: &str,
        password: &str,
        settings: &TableFuncSettings,
    ) -> Self {
        let replicas = addresses
            .iter()
            .map(|address| {
                let mut options = MySqlConnectOptions::new()
                    .host(&address.host)
                    .port(address.port)
                    .username(user)
                    .password(password);
                if !database.is_empty() {
                    options = options.database(database);
                }

                let pool = MySqlPoolOptions::new()
                    .max_connections(settings.pool_max_connections)
                    .acquire_timeout(Duration::from_secs(settings.pool_acquire_timeout_secs))
                    .connect_lazy_with(options);

                Replica {
                    address: address.clone(),
                    pool,
                }
            })
            .collect();

        Self {
            database: database.to_string(),
            user: user.to_string(),
            replicas,
        }
    }

    /// Acquires a connection from the first reachable replica, in list
    /// order. Unreachable replicas are skipped with a warning; exhausting
    /// the list is a connectivity failure.
    pub async fn acquire(&self) -> TableFuncResult<PoolConnection<MySql>> {
        let mut last_error = None;
        for replica in &self.replicas {
            match replica.pool.acquire().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    tracing::warn!(
                        address = %replica.address,
                        error = %e,
                        "replica unreachable, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(TableFuncError::connectivity(match last_error {
            Some(e) => format!("no reachable replica: {e}"),
            None => "replica list is empty".to_string(),
        }))
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn addresses(&self) -> Vec<&ReplicaAddress> {
        self.replicas.iter().map(|r| &r.address).collect()
    }

    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }
}

impl std::fmt::Debug for ReplicaPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicaPool")
            .field("database", &self.database)
            .field("user", &self.user)
            .field("replicas", &self.addresses())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool(addresses: &[ReplicaAddress]) -> ReplicaPool {
        ReplicaPool::create("db1", addresses, "root", "pw", &TableFuncSettings::default())
    }

    #[tokio::test]
    async fn construction_is_lazy_and_keeps_order() {
        // Addresses that cannot possibly accept connections; construction
        // must still succeed because no I/O happens here.
        let addresses = vec![
            ReplicaAddress::new("host-a.invalid", 3306),
            ReplicaAddress::new("host-b.invalid", 3307),
        ];
        let pool = test_pool(&addresses);

        assert_eq!(pool.replica_count(), 2);
        assert_eq!(pool.database(), "db1");
        assert_eq!(pool.user(), "root");
        assert_eq!(
            pool.addresses()
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>(),
            vec!["host-a.invalid:3306", "host-b.invalid:3307"]
        );
    }

    #[tokio::test]
    async fn debug_output_omits_credentials() {
        let pool = test_pool(&[ReplicaAddress::new("h", 3306)]);
        let rendered = format!("{pool:?}");
        assert!(!rendered.contains("pw"), "password leaked: {rendered}");
    }
}
