//! Compact cat APIs, always requested as JSON.
//!
//! Cat replies are tables whose columns vary by version and by the `h`
//! parameter, so every column is an optional string and unknown columns land
//! in `extra`.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::indices_segment;
use crate::{
    ByteUnit, CommonParams, Endpoint, ExpandWildcards, HealthStatus, Method, Params, Request,
    RequestBuilder, RequestDescriptor, Result, TimeUnit,
};

fn cat_request(
    base_url: &Url,
    path: String,
    params: &impl crate::EncodeParams,
) -> Result<Request> {
    RequestBuilder::new(Method::Get, base_url, path)
        .encode(params)
        .param("format", "json")
        .build()
}

// ============================================================================
// Health
// ============================================================================

/// Parameters of [`CatHealth`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct CatHealthParams {
    /// Columns to return.
    pub h: Vec<String>,
    /// Columns to sort by.
    pub s: Vec<String>,
    /// Unit for time columns.
    pub time: Option<TimeUnit>,
    /// Include the epoch and timestamp columns.
    pub ts: Option<bool>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `GET /_cat/health`.
#[derive(Debug, Clone, Default)]
pub struct CatHealth {
    /// Query parameters.
    pub params: CatHealthParams,
}

impl CatHealth {
    /// Creates the request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: CatHealthParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for CatHealth {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        cat_request(base_url, "/_cat/health".to_string(), &self.params)
    }
}

impl Endpoint for CatHealth {
    type Response = Vec<CatHealthRecord>;
}

/// One row of [`CatHealth`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CatHealthRecord {
    pub epoch: Option<String>,
    pub timestamp: Option<String>,
    pub cluster: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "node.total")]
    pub node_total: Option<String>,
    #[serde(rename = "node.data")]
    pub node_data: Option<String>,
    pub shards: Option<String>,
    pub pri: Option<String>,
    pub relo: Option<String>,
    pub init: Option<String>,
    pub unassign: Option<String>,
    pub pending_tasks: Option<String>,
    pub max_task_wait_time: Option<String>,
    pub active_shards_percent: Option<String>,
    /// Columns not listed above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// Indices
// ============================================================================

/// Parameters of [`CatIndices`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct CatIndicesParams {
    /// Unit for byte columns.
    pub bytes: Option<ByteUnit>,
    /// Only indices with this health.
    pub health: Option<HealthStatus>,
    /// Add primary-only columns.
    pub pri: bool,
    /// Columns to return.
    pub h: Vec<String>,
    /// Columns to sort by.
    pub s: Vec<String>,
    /// Which indices wildcards match.
    pub expand_wildcards: Option<ExpandWildcards>,
    /// Unit for time columns.
    pub time: Option<TimeUnit>,
    /// Answer from the local node's cluster state.
    pub local: Option<bool>,
    /// Time to wait for the cluster manager node.
    pub cluster_manager_timeout: Option<Duration>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `GET /_cat/indices/{indices}`, or every index when empty.
#[derive(Debug, Clone, Default)]
pub struct CatIndices {
    /// Indices to list; empty means all.
    pub indices: Vec<String>,
    /// Query parameters.
    pub params: CatIndicesParams,
}

impl CatIndices {
    /// List `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            params: CatIndicesParams::default(),
        }
    }

    /// List every index.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: CatIndicesParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for CatIndices {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = match indices_segment(&self.indices)? {
            Some(indices) => format!("/_cat/indices/{indices}"),
            None => "/_cat/indices".to_string(),
        };
        cat_request(base_url, path, &self.params)
    }
}

impl Endpoint for CatIndices {
    type Response = Vec<CatIndicesRecord>;
}

/// One row of [`CatIndices`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct CatIndicesRecord {
    pub health: Option<String>,
    pub status: Option<String>,
    pub index: Option<String>,
    pub uuid: Option<String>,
    pub pri: Option<String>,
    pub rep: Option<String>,
    #[serde(rename = "docs.count")]
    pub docs_count: Option<String>,
    #[serde(rename = "docs.deleted")]
    pub docs_deleted: Option<String>,
    #[serde(rename = "store.size")]
    pub store_size: Option<String>,
    #[serde(rename = "pri.store.size")]
    pub pri_store_size: Option<String>,
    /// Columns not listed above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use serde_json::json;

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:9200").expect("url")
    }

    #[test]
    fn health_forces_json() {
        let request = CatHealth::new().build_request(&base()).expect("request");
        check!(request.request_line() == "GET /_cat/health?format=json");
    }

    #[test]
    fn indices_with_filters() {
        let request = CatIndices::new(["logs-*"])
            .params(CatIndicesParams {
                bytes: Some(ByteUnit::Mb),
                health: Some(HealthStatus::Yellow),
                h: vec!["index".to_string(), "docs.count".to_string()],
                ..CatIndicesParams::default()
            })
            .build_request(&base())
            .expect("request");

        check!(
            request.request_line()
                == "GET /_cat/indices/logs-*?bytes=mb&format=json&h=index%2Cdocs.count&health=yellow"
        );
    }

    #[test]
    fn indices_all() {
        let request = CatIndices::all().build_request(&base()).expect("request");
        check!(request.path() == "/_cat/indices");
    }

    #[test]
    fn rows_keep_unknown_columns() {
        let rows: Vec<CatIndicesRecord> = serde_json::from_value(json!([{
            "health": "green",
            "status": "open",
            "index": "books",
            "docs.count": "1200",
            "creation.date": "1718000000000"
        }]))
        .expect("decode");

        check!(rows[0].docs_count.as_deref() == Some("1200"));
        check!(rows[0].extra.get("creation.date") == Some(&json!("1718000000000")));
    }
}
