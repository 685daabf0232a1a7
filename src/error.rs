// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for the mysql() table function core
//!
//! Every failure in the call-to-handle pipeline is mapped to one of these
//! kinds so the host engine receives a stable, structured failure instead
//! of a driver-specific error string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all table function operations
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum TableFuncError {
    #[error("table function 'mysql' requires 5-7 parameters: mysql('host:port', database, table, 'user', 'password'[, replace_query, 'on_duplicate_clause']), got {provided}")]
    Arity { provided: usize },

    #[error("argument {position} of table function 'mysql' is not a constant expression: {detail}")]
    ArgumentNotConstant { position: usize, detail: String },

    #[error("argument {position} of table function 'mysql' must be {expected}, got {found}")]
    InvalidArgument {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("only one of 'replace_query' and 'on_duplicate_clause' can be specified, or none of them")]
    ConflictingOptions,

    #[error("malformed replica address '{entry}': {reason}")]
    InvalidAddressSyntax { entry: String, reason: String },

    #[error("replica list expands to more than {limit} addresses")]
    TooManyAddresses { limit: usize },

    #[error("MySQL table {qualified_name} doesn't exist")]
    UnknownTable { qualified_name: String },

    #[error("MySQL type '{remote_type}' of column '{column}' is not supported")]
    UnsupportedType { column: String, remote_type: String },

    #[error("connectivity error: {message}")]
    Connectivity { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TableFuncError {
    pub fn arity(provided: usize) -> Self {
        Self::Arity { provided }
    }

    pub fn not_constant(position: usize, detail: impl Into<String>) -> Self {
        Self::ArgumentNotConstant {
            position,
            detail: detail.into(),
        }
    }

    pub fn invalid_argument(
        position: usize,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn invalid_address(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddressSyntax {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    pub fn too_many_addresses(limit: usize) -> Self {
        Self::TooManyAddresses { limit }
    }

    pub fn unknown_table(qualified_name: impl Into<String>) -> Self {
        Self::UnknownTable {
            qualified_name: qualified_name.into(),
        }
    }

    pub fn unsupported_type(column: impl Into<String>, remote_type: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            remote_type: remote_type.into(),
        }
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity {
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
        }
    }
}

/// Result type alias for table function operations
pub type TableFuncResult<T> = Result<T, TableFuncError>;
