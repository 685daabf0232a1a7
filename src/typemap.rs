// SPDX-License-Identifier: Apache-2.0

//! Translation of MySQL column types into the host engine's type system.
//!
//! The mapping is driven by a support-level policy: each axis controls how
//! aggressively a family of remote types degrades to simpler host types.
//! With every axis off, anything outside the integer/float/temporal core
//! is an unsupported-type failure.

use serde::{Deserialize, Serialize};

use crate::error::{TableFuncError, TableFuncResult};

/// Host engine type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Date,
    DateTime,
    DateTime64(u8),
    Decimal { precision: u8, scale: u8 },
    Nullable(Box<TypeDescriptor>),
}

impl std::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeDescriptor::Int8 => write!(f, "Int8"),
            TypeDescriptor::Int16 => write!(f, "Int16"),
            TypeDescriptor::Int32 => write!(f, "Int32"),
            TypeDescriptor::Int64 => write!(f, "Int64"),
            TypeDescriptor::UInt8 => write!(f, "UInt8"),
            TypeDescriptor::UInt16 => write!(f, "UInt16"),
            TypeDescriptor::UInt32 => write!(f, "UInt32"),
            TypeDescriptor::UInt64 => write!(f, "UInt64"),
            TypeDescriptor::Float32 => write!(f, "Float32"),
            TypeDescriptor::Float64 => write!(f, "Float64"),
            TypeDescriptor::String => write!(f, "String"),
            TypeDescriptor::Date => write!(f, "Date"),
            TypeDescriptor::DateTime => write!(f, "DateTime"),
            TypeDescriptor::DateTime64(precision) => write!(f, "DateTime64({precision})"),
            TypeDescriptor::Decimal { precision, scale } => {
                write!(f, "Decimal({precision}, {scale})")
            }
            TypeDescriptor::Nullable(inner) => write!(f, "Nullable({inner})"),
        }
    }
}

/// Maximum representable decimal precision on the host side.
const MAX_DECIMAL_PRECISION: u32 = 76;

/// Type translation policy.
///
/// Each axis is independent:
/// - `decimal`: keep DECIMAL/NUMERIC columns as fixed-point instead of
///   degrading them through the fallback path;
/// - `datetime64`: keep sub-second DATETIME/TIMESTAMP precision;
/// - `string_fallback`: degrade any otherwise unmapped type to String
///   instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TypeSupportLevel {
    pub decimal: bool,
    pub datetime64: bool,
    pub string_fallback: bool,
}

impl Default for TypeSupportLevel {
    fn default() -> Self {
        Self {
            decimal: false,
            datetime64: false,
            string_fallback: true,
        }
    }
}

/// Maps one raw `COLUMN_TYPE` string (e.g. `int(11) unsigned`,
/// `decimal(10,2)`, `datetime(3)`) to a host type, wrapping nullable
/// columns in `Nullable(...)`. `column` is only used in error messages.
pub fn map_remote_type(
    column: &str,
    column_type: &str,
    nullable: bool,
    support: TypeSupportLevel,
) -> TableFuncResult<TypeDescriptor> {
    let (base, params, unsigned) = parse_column_type(column_type);

    let mapped = match base.as_str() {
        "tinyint" => Some(signed_pair(unsigned, TypeDescriptor::Int8, TypeDescriptor::UInt8)),
        "smallint" => Some(signed_pair(unsigned, TypeDescriptor::Int16, TypeDescriptor::UInt16)),
        "mediumint" | "int" | "integer" => {
            Some(signed_pair(unsigned, TypeDescriptor::Int32, TypeDescriptor::UInt32))
        }
        "bigint" => Some(signed_pair(unsigned, TypeDescriptor::Int64, TypeDescriptor::UInt64)),
        "float" => Some(TypeDescriptor::Float32),
        "double" | "real" => Some(TypeDescriptor::Float64),
        "date" => Some(TypeDescriptor::Date),
        "datetime" | "timestamp" => {
            let precision = params.first().copied().unwrap_or(0);
            if support.datetime64 && precision > 0 {
                Some(TypeDescriptor::DateTime64(precision as u8))
            } else {
                Some(TypeDescriptor::DateTime)
            }
        }
        "decimal" | "numeric" if support.decimal => {
            let precision = params.first().copied().unwrap_or(10);
            let scale = params.get(1).copied().unwrap_or(0);
            if precision <= MAX_DECIMAL_PRECISION {
                Some(TypeDescriptor::Decimal {
                    precision: precision as u8,
                    scale: scale as u8,
                })
            } else {
                None
            }
        }
        _ => None,
    };

    let host_type = match mapped {
        Some(t) => t,
        None if support.string_fallback => TypeDescriptor::String,
        None => return Err(TableFuncError::unsupported_type(column, column_type)),
    };

    Ok(if nullable {
        TypeDescriptor::Nullable(Box::new(host_type))
    } else {
        host_type
    })
}

fn signed_pair(unsigned: bool, signed: TypeDescriptor, uns: TypeDescriptor) -> TypeDescriptor {
    if unsigned {
        uns
    } else {
        signed
    }
}

/// Splits a raw COLUMN_TYPE into (lowercased base name, numeric params,
/// unsigned flag). Non-numeric params (enum members, charset noise) are
/// ignored.
fn parse_column_type(raw: &str) -> (String, Vec<u32>, bool) {
    let lower = raw.trim().to_ascii_lowercase();

    let base_end = lower
        .find(|c| c == '(' || c == ' ')
        .unwrap_or(lower.len());
    let base = lower[..base_end].to_string();

    let mut params = Vec::new();
    if let Some(open) = lower.find('(') {
        if let Some(close) = lower[open..].find(')') {
            for part in lower[open + 1..open + close].split(',') {
                if let Ok(v) = part.trim().parse::<u32>() {
                    params.push(v);
                }
            }
        }
    }

    let unsigned = lower
        .rsplit(')')
        .next()
        .map(|tail| tail.split_whitespace().any(|tok| tok == "unsigned"))
        .unwrap_or(false);

    (base, params, unsigned)
}
