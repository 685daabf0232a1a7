// mysql() table function core
//
// Resolves a one-shot mysql(host_spec, database, table, user, password
// [, replace_query][, on_duplicate_clause]) call into a queryable table
// handle: argument binding, replica-list expansion, lazy pool
// construction, remote schema introspection, and the pool-ownership
// handoff into the handle.

pub mod address;
pub mod args;
pub mod error;
pub mod handle;
pub mod pool;
pub mod schema;
pub mod session;
pub mod settings;
pub mod typemap;

pub use address::{resolve_replica_list, ReplicaAddress};
pub use args::{
    bind_args, extract_call_arguments, ConstantFolder, Literal, LiteralEvaluator, TableFuncArgs,
};
pub use error::{TableFuncError, TableFuncResult};
pub use handle::MySqlTableHandle;
pub use pool::ReplicaPool;
pub use schema::{
    fetch_schema, InformationSchemaClient, MetadataClient, RemoteColumn, TranslatedColumn,
};
pub use session::{InvocationId, TableFuncSession};
pub use settings::{TableFuncSettings, DEFAULT_MYSQL_PORT};
pub use typemap::{map_remote_type, TypeDescriptor, TypeSupportLevel};
