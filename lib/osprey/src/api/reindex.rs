//! Reindex and rethrottle.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::segment;
use crate::{
    Body, CommonParams, Endpoint, Method, Params, Request, RequestBuilder, RequestDescriptor,
    Result, WaitForActiveShards,
};

/// Parameters of [`Reindex`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct ReindexParams {
    /// Refresh the destination shards once done.
    pub refresh: bool,
    /// Time each bulk write waits for unavailable shards.
    pub timeout: Option<Duration>,
    /// Active shard copies required before each bulk write.
    pub wait_for_active_shards: WaitForActiveShards,
    /// `false` starts a task and returns its id immediately.
    pub wait_for_completion: Option<bool>,
    /// Throttle in sub-requests per second; `-1` disables it. Values that
    /// are not finite are left out of the query.
    pub requests_per_second: Option<f64>,
    /// Keep the source scroll context alive for this long.
    pub scroll: Option<Duration>,
    /// Parallel slices: a count or `auto`.
    pub slices: Option<String>,
    /// Stop after this many documents.
    pub max_docs: Option<u64>,
    /// The destination must be an alias.
    pub require_alias: bool,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `POST /_reindex`: copy documents from one index to another.
#[derive(Debug, Clone)]
pub struct Reindex {
    /// `{"source": {..}, "dest": {..}, ..}`.
    pub body: serde_json::Value,
    /// Query parameters.
    pub params: ReindexParams,
}

impl Reindex {
    /// Reindex with the given definition.
    #[must_use]
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            body,
            params: ReindexParams::default(),
        }
    }

    /// Copy every document of `source` into `dest`.
    #[must_use]
    pub fn copy(source: &str, dest: &str) -> Self {
        Self::new(serde_json::json!({
            "source": {"index": source},
            "dest": {"index": dest},
        }))
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: ReindexParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for Reindex {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Post, base_url, "/_reindex")
            .encode(&self.params)
            .body(Body::json(&self.body)?)
            .build()
    }
}

impl Endpoint for Reindex {
    type Response = ReindexResponse;
}

/// Reply of [`Reindex`]: a summary, or a task id with
/// `wait_for_completion=false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReindexResponse {
    /// The reindex runs in the background.
    Task(TaskStarted),
    /// The reindex finished.
    Completed(ReindexSummary),
}

/// A background task handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStarted {
    /// `node_id:task_number`.
    pub task: String,
}

/// Summary of a finished reindex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexSummary {
    /// Wall-clock duration in milliseconds.
    pub took: u64,
    /// Some batch ran out of time.
    pub timed_out: bool,
    /// Documents processed.
    pub total: u64,
    /// Documents created in the destination.
    pub created: u64,
    /// Documents replaced in the destination.
    pub updated: u64,
    /// Documents deleted by a script.
    #[serde(default)]
    pub deleted: u64,
    /// Scroll batches pulled from the source.
    pub batches: u64,
    /// Version conflicts met.
    pub version_conflicts: u64,
    /// Documents skipped by a `noop` script.
    pub noops: u64,
    /// Retry counts.
    #[serde(default)]
    pub retries: Retries,
    /// Time spent throttled, in milliseconds.
    #[serde(default)]
    pub throttled_millis: u64,
    /// Effective throttle; `-1` means unthrottled.
    #[serde(default)]
    pub requests_per_second: f64,
    /// Per-document failures.
    #[serde(default)]
    pub failures: Vec<serde_json::Value>,
}

/// Retry counts of a by-query operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retries {
    /// Retried bulk writes.
    pub bulk: u64,
    /// Retried searches.
    pub search: u64,
}

// ============================================================================
// Rethrottle
// ============================================================================

/// Parameters of [`ReindexRethrottle`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct RethrottleParams {
    /// New throttle; `-1` disables it. Values that are not finite are left
    /// out of the query.
    pub requests_per_second: Option<f64>,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `POST /_reindex/{task_id}/_rethrottle`: change the throttle of a running
/// reindex.
#[derive(Debug, Clone)]
pub struct ReindexRethrottle {
    /// Task id returned by a background [`Reindex`].
    pub task_id: String,
    /// Query parameters.
    pub params: RethrottleParams,
}

impl ReindexRethrottle {
    /// Set the throttle of `task_id` to `requests_per_second`.
    #[must_use]
    pub fn new(task_id: impl Into<String>, requests_per_second: f64) -> Self {
        Self {
            task_id: task_id.into(),
            params: RethrottleParams {
                requests_per_second: Some(requests_per_second),
                common: CommonParams::default(),
            },
        }
    }

    /// Lift the throttle of `task_id`.
    #[must_use]
    pub fn unthrottled(task_id: impl Into<String>) -> Self {
        Self::new(task_id, -1.0)
    }
}

impl RequestDescriptor for ReindexRethrottle {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let path = format!("/_reindex/{}/_rethrottle", segment("task id", &self.task_id)?);
        RequestBuilder::new(Method::Post, base_url, path)
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for ReindexRethrottle {
    type Response = RethrottleResponse;
}

/// Reply of [`ReindexRethrottle`]: the affected tasks grouped by node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RethrottleResponse {
    /// Node id to node details, including its tasks.
    #[serde(default)]
    pub nodes: BTreeMap<String, serde_json::Value>,
    /// Task failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_failures: Vec<serde_json::Value>,
    /// Node failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_failures: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:9200").expect("url")
    }

    #[test]
    fn reindex_request() {
        let request = Reindex::copy("books-v1", "books-v2")
            .params(ReindexParams {
                wait_for_completion: Some(false),
                slices: Some("auto".to_string()),
                ..ReindexParams::default()
            })
            .build_request(&base())
            .expect("request");

        check!(request.request_line() == "POST /_reindex?slices=auto&wait_for_completion=false");
        let_assert!(Some(body) = request.body().as_bytes());
        let body: serde_json::Value = serde_json::from_slice(body).expect("json");
        check!(body == json!({"source": {"index": "books-v1"}, "dest": {"index": "books-v2"}}));
    }

    #[test]
    fn rethrottle_request() {
        let request = ReindexRethrottle::new("node-1:42", -1.0)
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "POST /_reindex/node-1:42/_rethrottle?requests_per_second=-1");
    }

    #[test]
    fn rethrottle_drops_non_finite_rate() {
        let request = ReindexRethrottle::new("node-1:42", f64::NAN)
            .build_request(&base())
            .expect("request");
        check!(request.request_line() == "POST /_reindex/node-1:42/_rethrottle");

        let request = ReindexRethrottle::unthrottled("node-1:42")
            .build_request(&base())
            .expect("request");
        check!(request.params().get("requests_per_second") == Some("-1"));
    }

    #[test]
    fn background_reply_is_a_task() {
        let reply: ReindexResponse =
            serde_json::from_value(json!({"task": "node-1:42"})).expect("decode");
        check!(reply == ReindexResponse::Task(TaskStarted { task: "node-1:42".to_string() }));
    }

    #[test]
    fn finished_reply_is_a_summary() {
        let reply: ReindexResponse = serde_json::from_value(json!({
            "took": 120,
            "timed_out": false,
            "total": 10,
            "created": 10,
            "updated": 0,
            "deleted": 0,
            "batches": 1,
            "version_conflicts": 0,
            "noops": 0,
            "retries": {"bulk": 0, "search": 0},
            "throttled_millis": 0,
            "requests_per_second": -1.0,
            "failures": []
        }))
        .expect("decode");

        let_assert!(ReindexResponse::Completed(summary) = reply);
        check!(summary.created == 10);
        check!(summary.failures.is_empty());
    }
}
