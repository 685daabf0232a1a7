//! Configuration surface for the table function pipeline.

use serde::{Deserialize, Serialize};

use crate::typemap::TypeSupportLevel;

/// Default MySQL server port, applied to replica entries without an
/// explicit `:port` suffix.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Settings consulted across one table function invocation.
///
/// Pool-level knobs are connection-internal: callers of the pipeline never
/// observe them directly, they only bound how long an acquire may block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFuncSettings {
    /// Upper bound on the number of replica addresses a host spec may
    /// expand to.
    pub max_replica_addresses: usize,
    /// Port assigned to replica entries that do not carry one.
    pub default_port: u16,
    /// Type translation policy for schema introspection.
    pub type_support: TypeSupportLevel,
    /// Per-replica connection pool size.
    pub pool_max_connections: u32,
    /// Per-connection acquire timeout in seconds.
    pub pool_acquire_timeout_secs: u64,
}

impl Default for TableFuncSettings {
    fn default() -> Self {
        Self {
            max_replica_addresses: 1000,
            default_port: DEFAULT_MYSQL_PORT,
            type_support: TypeSupportLevel::default(),
            pool_max_connections: 16,
            pool_acquire_timeout_secs: 30,
        }
    }
}
