//! Cluster health.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::indices_segment;
use crate::{
    CommonParams, Endpoint, ExpandWildcards, HealthLevel, HealthStatus, Method, Params, Request,
    RequestBuilder, RequestDescriptor, Result, WaitForActiveShards,
};

/// Parameters of [`ClusterHealth`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct ClusterHealthParams {
    /// Detail level of the reply.
    pub level: HealthLevel,
    /// Answer from the local node's cluster state.
    pub local: Option<bool>,
    /// How long to wait for the `wait_for_*` conditions.
    pub timeout: Option<Duration>,
    /// Time to wait for the cluster manager node.
    pub cluster_manager_timeout: Option<Duration>,
    /// Pre-2.0 name of `cluster_manager_timeout`.
    pub master_timeout: Option<Duration>,
    /// Wait until this many shard copies are active.
    pub wait_for_active_shards: Option<WaitForActiveShards>,
    /// Wait for a node count, e.g. `>=3`.
    pub wait_for_nodes: Option<String>,
    /// Wait until no shard is relocating.
    pub wait_for_no_relocating_shards: Option<bool>,
    /// Wait until no shard is initializing.
    pub wait_for_no_initializing_shards: Option<bool>,
    /// Wait until the cluster reaches this status or better.
    pub wait_for_status: Option<HealthStatus>,
    /// Which indices wildcards match.
    pub expand_wildcards: Option<ExpandWildcards>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `GET /_cluster/health/{indices}`, or the whole cluster when empty.
///
/// When a `wait_for_*` condition is not met before `timeout` the server
/// answers 408 with a full health body; that reply surfaces as an error
/// whose [`Inspect`](crate::Inspect) body still holds the report.
#[derive(Debug, Clone, Default)]
pub struct ClusterHealth {
    /// Indices to report on; empty means the whole cluster.
    pub indices: Vec<String>,
    /// Query parameters.
    pub params: ClusterHealthParams,
}

impl ClusterHealth {
    /// Health of the whole cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Health of `indices` only.
    #[must_use]
    pub fn indices<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            params: ClusterHealthParams::default(),
        }
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: ClusterHealthParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for ClusterHealth {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = match indices_segment(&self.indices)? {
            Some(indices) => format!("/_cluster/health/{indices}"),
            None => "/_cluster/health".to_string(),
        };
        RequestBuilder::new(Method::Get, base_url, path)
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for ClusterHealth {
    type Response = ClusterHealthResponse;
}

/// Reply of [`ClusterHealth`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterHealthResponse {
    /// Cluster name.
    pub cluster_name: String,
    /// Overall health.
    pub status: HealthStatus,
    /// A `wait_for_*` condition timed out.
    pub timed_out: bool,
    /// Nodes in the cluster.
    pub number_of_nodes: u32,
    /// Data nodes in the cluster.
    pub number_of_data_nodes: u32,
    /// Started primary shards.
    pub active_primary_shards: u32,
    /// Started shards, replicas included.
    pub active_shards: u32,
    /// Shards moving between nodes.
    pub relocating_shards: u32,
    /// Shards being allocated.
    pub initializing_shards: u32,
    /// Shards without a node.
    pub unassigned_shards: u32,
    /// Shards whose allocation is postponed.
    #[serde(default)]
    pub delayed_unassigned_shards: u32,
    /// Queued cluster-state updates.
    #[serde(default)]
    pub number_of_pending_tasks: u32,
    /// Ongoing shard fetches.
    #[serde(default)]
    pub number_of_in_flight_fetch: u32,
    /// Age of the oldest pending task, in milliseconds.
    #[serde(default)]
    pub task_max_waiting_in_queue_millis: u64,
    /// Share of active shards.
    #[serde(default)]
    pub active_shards_percent_as_number: f64,
    /// Per-index health with `level=indices` or `level=shards`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub indices: BTreeMap<String, serde_json::Value>,
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
    fn cluster_wide_defaults() {
        let request = ClusterHealth::new().build_request(&base()).expect("request");
        check!(request.request_line() == "GET /_cluster/health");
    }

    #[test]
    fn scoped_wait() {
        let request = ClusterHealth::indices(["books"])
            .params(ClusterHealthParams {
                level: HealthLevel::Indices,
                wait_for_status: Some(HealthStatus::Green),
                timeout: Some(Duration::from_secs(30)),
                ..ClusterHealthParams::default()
            })
            .build_request(&base())
            .expect("request");

        check!(
            request.request_line()
                == "GET /_cluster/health/books?level=indices&timeout=30s&wait_for_status=green"
        );
    }

    #[test]
    fn response_decodes_status() {
        let body = json!({
            "cluster_name": "search",
            "status": "yellow",
            "timed_out": false,
            "number_of_nodes": 1,
            "number_of_data_nodes": 1,
            "active_primary_shards": 5,
            "active_shards": 5,
            "relocating_shards": 0,
            "initializing_shards": 0,
            "unassigned_shards": 5,
            "active_shards_percent_as_number": 50.0
        });
        let response: ClusterHealthResponse = serde_json::from_value(body).expect("decode");
        check!(response.status == HealthStatus::Yellow);
        check!(response.unassigned_shards == 5);
        check!(response.indices.is_empty());
    }
}
