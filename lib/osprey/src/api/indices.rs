//! Index management.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{Acknowledged, ShardStats, indices_segment, scoped_path, segment};
use crate::{
    Body, CommonParams, Endpoint, Error, ExpandWildcards, Method, Params, Probe, Request,
    RequestBuilder, RequestDescriptor, Result, WaitForActiveShards,
};

// ============================================================================
// Create
// ============================================================================

/// Parameters of [`IndicesCreate`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct IndicesCreateParams {
    /// Active shard copies required before returning.
    pub wait_for_active_shards: WaitForActiveShards,
    /// Time to wait for the cluster to acknowledge.
    pub timeout: Option<Duration>,
    /// Time to wait for the cluster manager node.
    pub cluster_manager_timeout: Option<Duration>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `PUT /{index}`: create an index, optionally with settings, mappings and
/// aliases.
#[derive(Debug, Clone, Default)]
pub struct IndicesCreate {
    /// Name of the new index.
    pub index: String,
    /// `{"settings": .., "mappings": .., "aliases": ..}`.
    pub body: Option<serde_json::Value>,
    /// Query parameters.
    pub params: IndicesCreateParams,
}

impl IndicesCreate {
    /// Create `index` with default settings.
    #[must_use]
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }

    /// Set the index definition.
    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: IndicesCreateParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for IndicesCreate {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = format!("/{}", segment("index name", &self.index)?);
        let body = match &self.body {
            Some(body) => Body::json(body)?,
            None => Body::empty(),
        };
        RequestBuilder::new(Method::Put, base_url, path)
            .encode(&self.params)
            .body(body)
            .build()
    }
}

impl Endpoint for IndicesCreate {
    type Response = IndicesCreateResponse;
}

/// Reply of [`IndicesCreate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicesCreateResponse {
    /// The cluster manager accepted the index.
    pub acknowledged: bool,
    /// The requested shard copies started before the timeout.
    pub shards_acknowledged: bool,
    /// Name of the created index.
    pub index: String,
}

// ============================================================================
// Delete
// ============================================================================

/// Parameters of [`IndicesDelete`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct IndicesDeleteParams {
    /// Time to wait for the cluster to acknowledge.
    pub timeout: Option<Duration>,
    /// Time to wait for the cluster manager node.
    pub cluster_manager_timeout: Option<Duration>,
    /// Ignore missing or closed indices.
    pub ignore_unavailable: Option<bool>,
    /// Succeed when a wildcard matches nothing.
    pub allow_no_indices: Option<bool>,
    /// Which indices wildcards match.
    pub expand_wildcards: Option<ExpandWildcards>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `DELETE /{indices}`.
#[derive(Debug, Clone, Default)]
pub struct IndicesDelete {
    /// Indices to delete; at least one.
    pub indices: Vec<String>,
    /// Query parameters.
    pub params: IndicesDeleteParams,
}

impl IndicesDelete {
    /// Delete `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            params: IndicesDeleteParams::default(),
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: IndicesDeleteParams) -> Self {
        self.params = params;
        self
    }
}

fn required_indices(indices: &[String]) -> Result<String> {
    indices_segment(indices)?.ok_or_else(|| Error::build("at least one index is required"))
}

impl RequestDescriptor for IndicesDelete {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = format!("/{}", required_indices(&self.indices)?);
        RequestBuilder::new(Method::Delete, base_url, path)
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for IndicesDelete {
    type Response = Acknowledged;
}

// ============================================================================
// Exists
// ============================================================================

/// Parameters of [`IndicesExists`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct IndicesExistsParams {
    /// Answer from the local node's cluster state.
    pub local: Option<bool>,
    /// Ignore missing or closed indices.
    pub ignore_unavailable: Option<bool>,
    /// Succeed when a wildcard matches nothing.
    pub allow_no_indices: Option<bool>,
    /// Which indices wildcards match.
    pub expand_wildcards: ExpandWildcards,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `HEAD /{indices}`.
#[derive(Debug, Clone, Default)]
pub struct IndicesExists {
    /// Indices to look for; all must exist.
    pub indices: Vec<String>,
    /// Query parameters.
    pub params: IndicesExistsParams,
}

impl IndicesExists {
    /// Probe `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            params: IndicesExistsParams::default(),
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: IndicesExistsParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for IndicesExists {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = format!("/{}", required_indices(&self.indices)?);
        RequestBuilder::new(Method::Head, base_url, path)
            .encode(&self.params)
            .build()
    }
}

impl Probe for IndicesExists {}

// ============================================================================
// Refresh
// ============================================================================

/// Parameters of [`IndicesRefresh`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct IndicesRefreshParams {
    /// Ignore missing or closed indices.
    pub ignore_unavailable: Option<bool>,
    /// Succeed when a wildcard matches nothing.
    pub allow_no_indices: Option<bool>,
    /// Which indices wildcards match.
    pub expand_wildcards: Option<ExpandWildcards>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `POST /{indices}/_refresh`, or `POST /_refresh` for every index.
#[derive(Debug, Clone, Default)]
pub struct IndicesRefresh {
    /// Indices to refresh; empty means all.
    pub indices: Vec<String>,
    /// Query parameters.
    pub params: IndicesRefreshParams,
}

impl IndicesRefresh {
    /// Refresh `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            params: IndicesRefreshParams::default(),
        }
    }

    /// Refresh every index.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

impl RequestDescriptor for IndicesRefresh {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Post, base_url, scoped_path(&self.indices, "_refresh")?)
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for IndicesRefresh {
    type Response = RefreshResponse;
}

/// Reply of [`IndicesRefresh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// Shard summary.
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:9200").expect("url")
    }

    #[test]
    fn create_with_body() {
        let request = IndicesCreate::new("books")
            .body(serde_json::json!({"settings": {"number_of_shards": 1}}))
            .params(IndicesCreateParams {
                wait_for_active_shards: WaitForActiveShards::All,
                ..IndicesCreateParams::default()
            })
            .build_request(&base())
            .expect("request");

        check!(request.request_line() == "PUT /books?wait_for_active_shards=all");
        check!(request.header("content-type") == Some("application/json"));
        check!(request.body().as_bytes() == Some(br#"{"settings":{"number_of_shards":1}}"#.as_slice()));
    }

    #[test]
    fn create_without_body_sends_nothing() {
        let request = IndicesCreate::new("books").build_request(&base()).expect("request");
        check!(request.body().is_empty());
        check!(request.header("content-type").is_none());
    }

    #[test]
    fn delete_joins_indices() {
        let request = IndicesDelete::new(["logs-1", "logs-2"])
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "DELETE /logs-1,logs-2");
    }

    #[test]
    fn delete_requires_an_index() {
        let_assert!(Err(err) = IndicesDelete::new(Vec::<String>::new()).build_request(&base()));
        check!(err.transport_kind() == Some(crate::TransportErrorKind::Build));
    }

    #[test]
    fn exists_is_a_head() {
        let request = IndicesExists::new(["books"])
            .params(IndicesExistsParams {
                expand_wildcards: ExpandWildcards::ALL,
                ..IndicesExistsParams::default()
            })
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "HEAD /books?expand_wildcards=all");
    }

    #[test]
    fn refresh_all_or_some() {
        let all = IndicesRefresh::all().build_request(&base()).expect("request");
        check!(all.request_line() == "POST /_refresh");

        let some = IndicesRefresh::new(["books"]).build_request(&base()).expect("request");
        check!(some.request_line() == "POST /books/_refresh");
    }
}
