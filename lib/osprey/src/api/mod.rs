//! Endpoint bindings.
//!
//! Each endpoint is a descriptor struct holding its path parts, an optional
//! body and a parameter struct deriving [`Params`](crate::Params). Descriptors
//! are consumed by [`Client::send`](crate::Client::send) or, for existence
//! checks, [`Client::exists`](crate::Client::exists).
//!
//! | Module | Endpoints |
//! |--------|-----------|
//! | [`root`] | [`Info`](root::Info), [`Ping`](root::Ping) |
//! | [`indices`] | create, delete, exists, refresh |
//! | [`document`] | index, get, exists, delete |
//! | [`search`] | [`Search`](search::Search) |
//! | [`cat`] | health, indices |
//! | [`cluster`] | [`ClusterHealth`](cluster::ClusterHealth) |
//! | [`reindex`] | [`Reindex`](reindex::Reindex), [`ReindexRethrottle`](reindex::ReindexRethrottle) |

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub mod cat;
pub mod cluster;
pub mod document;
pub mod indices;
pub mod reindex;
pub mod root;
pub mod search;

/// Characters escaped in a path segment. Commas and `*` stay literal: they
/// carry meaning in index expressions.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Percent-encode one path segment, rejecting empty values.
pub(crate) fn segment(what: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::build(format!("{what} must not be empty")));
    }
    Ok(utf8_percent_encode(value, SEGMENT).to_string())
}

/// Encode a multi-index segment (`idx-a,idx-b`). `None` for an empty list.
pub(crate) fn indices_segment(indices: &[String]) -> Result<Option<String>> {
    if indices.is_empty() {
        return Ok(None);
    }
    let encoded = indices
        .iter()
        .map(|index| segment("index name", index))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(crate::join_segments(&encoded)))
}

/// Path of an action that may be scoped to indices: `/{indices}/{action}` or
/// `/{action}`.
pub(crate) fn scoped_path(indices: &[String], action: &str) -> Result<String> {
    Ok(match indices_segment(indices)? {
        Some(indices) => format!("/{indices}/{action}"),
        None => format!("/{action}"),
    })
}

/// Shard summary returned by most write and read operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShardStats {
    /// Shards the operation targeted.
    pub total: u32,
    /// Shards that succeeded.
    pub successful: u32,
    /// Shards skipped (search only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<u32>,
    /// Shards that failed.
    pub failed: u32,
    /// Per-shard failure details.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<serde_json::Value>,
}

/// `{"acknowledged": bool}` replies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledged {
    /// The cluster manager accepted the change.
    pub acknowledged: bool,
}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn segments_are_escaped() {
        check!(segment("id", "a b/c").ok().as_deref() == Some("a%20b%2Fc"));
        check!(segment("id", "100%").ok().as_deref() == Some("100%25"));
        check!(segment("id", "é").ok().as_deref() == Some("%C3%A9"));
        check!(segment("index name", "logs-*").ok().as_deref() == Some("logs-*"));
        check!(segment("id", "").is_err());
    }

    #[test]
    fn index_lists() {
        let indices = vec!["logs-2024".to_string(), "metrics-*".to_string()];
        check!(indices_segment(&indices).ok().flatten().as_deref() == Some("logs-2024,metrics-*"));
        check!(indices_segment(&[]).ok() == Some(None));
        check!(indices_segment(&[String::new()]).is_err());
    }

    #[test]
    fn scoped_paths() {
        let indices = vec!["books".to_string()];
        check!(scoped_path(&indices, "_search").ok().as_deref() == Some("/books/_search"));
        check!(scoped_path(&[], "_search").ok().as_deref() == Some("/_search"));
    }
}
