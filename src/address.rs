// SPDX-License-Identifier: Apache-2.0

//! Replica list resolution.
//!
//! A host spec names the replica set of one logical remote table:
//!
//! ```text
//! host_spec := entry ("," entry)*
//! entry     := pattern [":" port]
//! pattern   := (text | group)+
//! group     := "{" N ".." M "}"       numeric range, N <= M; leading
//!                                     zeros on N pad the expansion
//!            | "{" alt ("|" alt)* "}" alternation of host fragments
//! ```
//!
//! Groups expand cartesian-product style and must not nest or contain
//! `:` or `,`. IPv6 hosts must be bracketed (`[::1]:3307`). Expansion is
//! bounded by the configured maximum; the first resulting address is the
//! primary for downstream tie-breaks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TableFuncError, TableFuncResult};

/// One concrete remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplicaAddress {
    pub host: String,
    pub port: u16,
}

impl ReplicaAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ReplicaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Expands a host spec into a bounded, order-preserving replica list.
pub fn resolve_replica_list(
    host_spec: &str,
    max_addresses: usize,
    default_port: u16,
) -> TableFuncResult<Vec<ReplicaAddress>> {
    let mut addresses = Vec::new();

    for raw_entry in host_spec.split(',') {
        let entry = raw_entry.trim();
        if entry.is_empty() {
            return Err(TableFuncError::invalid_address(raw_entry, "empty entry"));
        }

        let (pattern, port) = split_port(entry, default_port)?;
        if pattern.is_empty() {
            return Err(TableFuncError::invalid_address(entry, "empty host"));
        }

        for host in expand_pattern(&pattern, entry, max_addresses)? {
            addresses.push(ReplicaAddress::new(host, port));
            if addresses.len() > max_addresses {
                return Err(TableFuncError::too_many_addresses(max_addresses));
            }
        }
    }

    if addresses.is_empty() {
        return Err(TableFuncError::invalid_address(
            host_spec,
            "no addresses in host spec",
        ));
    }

    Ok(addresses)
}

/// Splits the optional `:port` suffix off an entry. Bracketed IPv6 hosts
/// are unwrapped; unbracketed hosts with more than one colon are ambiguous.
fn split_port(entry: &str, default_port: u16) -> TableFuncResult<(String, u16)> {
    if let Some(rest) = entry.strip_prefix('[') {
        let Some(close) = rest.find(']') else {
            return Err(TableFuncError::invalid_address(entry, "unterminated '['"));
        };
        let host = &rest[..close];
        if host.is_empty() {
            return Err(TableFuncError::invalid_address(entry, "empty host"));
        }
        return match &rest[close + 1..] {
            "" => Ok((host.to_string(), default_port)),
            suffix => match suffix.strip_prefix(':') {
                Some(port_text) => Ok((host.to_string(), parse_port(port_text, entry)?)),
                None => Err(TableFuncError::invalid_address(
                    entry,
                    "unexpected text after ']'",
                )),
            },
        };
    }

    match entry.matches(':').count() {
        0 => Ok((entry.to_string(), default_port)),
        1 => {
            let (host, port_text) = entry.split_once(':').unwrap_or((entry, ""));
            Ok((host.to_string(), parse_port(port_text, entry)?))
        }
        _ => Err(TableFuncError::invalid_address(
            entry,
            "ambiguous address, bracket IPv6 hosts as [host]:port",
        )),
    }
}

fn parse_port(text: &str, entry: &str) -> TableFuncResult<u16> {
    text.parse::<u16>()
        .map_err(|_| TableFuncError::invalid_address(entry, format!("invalid port '{text}'")))
}

/// Expands the brace groups of one host pattern. Returns at least one host.
fn expand_pattern(
    pattern: &str,
    entry: &str,
    max_addresses: usize,
) -> TableFuncResult<Vec<String>> {
    let Some(open) = pattern.find('{') else {
        if pattern.contains('}') {
            return Err(TableFuncError::invalid_address(entry, "unmatched '}'"));
        }
        return Ok(vec![pattern.to_string()]);
    };

    let prefix = &pattern[..open];
    if prefix.contains('}') {
        return Err(TableFuncError::invalid_address(entry, "unmatched '}'"));
    }
    let rest = &pattern[open + 1..];
    let Some(close) = rest.find('}') else {
        return Err(TableFuncError::invalid_address(entry, "unterminated '{'"));
    };
    let group = &rest[..close];
    if group.contains('{') {
        return Err(TableFuncError::invalid_address(entry, "nested group"));
    }

    let variants = expand_group(group, entry, max_addresses)?;
    let tails = expand_pattern(&rest[close + 1..], entry, max_addresses)?;

    let mut out = Vec::with_capacity(variants.len() * tails.len().max(1));
    for variant in &variants {
        for tail in &tails {
            out.push(format!("{prefix}{variant}{tail}"));
            if out.len() > max_addresses {
                return Err(TableFuncError::too_many_addresses(max_addresses));
            }
        }
    }
    Ok(out)
}

/// Expands a single `{...}` group body into its variants.
fn expand_group(group: &str, entry: &str, max_addresses: usize) -> TableFuncResult<Vec<String>> {
    if let Some((start_text, end_text)) = group.split_once("..") {
        let start: u64 = start_text.parse().map_err(|_| {
            TableFuncError::invalid_address(entry, format!("non-numeric range bound '{start_text}'"))
        })?;
        let end: u64 = end_text.parse().map_err(|_| {
            TableFuncError::invalid_address(entry, format!("non-numeric range bound '{end_text}'"))
        })?;
        if start > end {
            return Err(TableFuncError::invalid_address(
                entry,
                format!("reversed range {start}..{end}"),
            ));
        }
        if end - start >= max_addresses as u64 {
            return Err(TableFuncError::too_many_addresses(max_addresses));
        }

        // {01..12} pads every expansion to the width of the start bound.
        let width = if start_text.starts_with('0') && start_text.len() > 1 {
            start_text.len()
        } else {
            0
        };
        return Ok((start..=end).map(|v| format!("{v:0width$}")).collect());
    }

    let arms: Vec<&str> = group.split('|').collect();
    if arms.iter().any(|arm| arm.is_empty()) {
        return Err(TableFuncError::invalid_address(entry, "empty alternation arm"));
    }
    Ok(arms.into_iter().map(str::to_string).collect())
}
