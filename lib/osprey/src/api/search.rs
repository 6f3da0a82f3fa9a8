//! Search.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{ShardStats, scoped_path};
use crate::{
    Body, CommonParams, DefaultOperator, Endpoint, ExpandWildcards, Method, Params, Request,
    RequestBuilder, RequestDescriptor, Result, SearchType,
};

/// Parameters of [`Search`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct SearchParams {
    /// Query in Lucene query-string syntax.
    pub q: Option<String>,
    /// Default field for `q`.
    pub df: Option<String>,
    /// Operator between `q` terms.
    pub default_operator: DefaultOperator,
    /// Analyzer for `q`.
    pub analyzer: Option<String>,
    /// Offset of the first hit.
    pub from: Option<u64>,
    /// Number of hits to return.
    pub size: Option<u64>,
    /// `field:direction` sort pairs.
    pub sort: Vec<String>,
    /// Custom shard routing values.
    pub routing: Option<String>,
    /// Shard copy preference, e.g. `_local`.
    pub preference: Option<String>,
    /// Scoring strategy.
    pub search_type: SearchType,
    /// Keep a scroll context alive for this long.
    pub scroll: Option<Duration>,
    /// Per-shard time budget.
    pub timeout: Option<Duration>,
    /// `true`, `false` or a count threshold.
    pub track_total_hits: Option<String>,
    /// Stop after this many documents per shard.
    pub terminate_after: Option<u64>,
    /// Use the shard request cache.
    pub request_cache: Option<bool>,
    /// Return partial results when some shards fail.
    pub allow_partial_search_results: Option<bool>,
    /// Ignore missing or closed indices.
    pub ignore_unavailable: Option<bool>,
    /// Succeed when a wildcard matches nothing.
    pub allow_no_indices: Option<bool>,
    /// Which indices wildcards match.
    pub expand_wildcards: Option<ExpandWildcards>,
    /// Prefix aggregation names with their type.
    pub typed_keys: bool,
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `POST /{indices}/_search`, or `POST /_search` across every index.
///
/// Hits decode their `_source` into `T`; use `serde_json::Value` when the
/// documents have no fixed shape.
pub struct Search<T> {
    /// Indices to search; empty means all.
    pub indices: Vec<String>,
    /// Query DSL body.
    pub body: Option<serde_json::Value>,
    /// Query parameters.
    pub params: SearchParams,
    hit: PhantomData<fn() -> T>,
}

impl<T> Search<T> {
    /// Search `indices`.
    #[must_use]
    pub fn new<I, S>(indices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indices: indices.into_iter().map(Into::into).collect(),
            body: None,
            params: SearchParams::default(),
            hit: PhantomData,
        }
    }

    /// Search every index.
    #[must_use]
    pub fn all() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Set the query DSL body.
    #[must_use]
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: SearchParams) -> Self {
        self.params = params;
        self
    }
}

impl<T> fmt::Debug for Search<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("indices", &self.indices)
            .field("body", &self.body)
            .field("params", &self.params)
            .finish()
    }
}

impl<T> Clone for Search<T> {
    fn clone(&self) -> Self {
        Self {
            indices: self.indices.clone(),
            body: self.body.clone(),
            params: self.params.clone(),
            hit: PhantomData,
        }
    }
}

impl<T> RequestDescriptor for Search<T> {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        let body = match &self.body {
            Some(body) => Body::json(body)?,
            None => Body::empty(),
        };
        RequestBuilder::new(Method::Post, base_url, scoped_path(&self.indices, "_search")?)
            .encode(&self.params)
            .body(body)
            .build()
    }
}

impl<T: DeserializeOwned + Send> Endpoint for Search<T> {
    type Response = SearchResponse<T>;
}

/// Reply of [`Search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    /// Server-side duration in milliseconds.
    pub took: u64,
    /// Some shard ran out of time.
    pub timed_out: bool,
    /// Shard summary.
    #[serde(rename = "_shards")]
    pub shards: ShardStats,
    /// Matching documents.
    pub hits: Hits<T>,
    /// Aggregation results, keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<serde_json::Value>,
    /// Scroll cursor, when `scroll` was set.
    #[serde(rename = "_scroll_id", default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,
}

/// Hit list of a [`SearchResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hits<T> {
    /// Total match count; absent with `track_total_hits=false`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<TotalHits>,
    /// Best score, `null` when sorting by field.
    #[serde(default)]
    pub max_score: Option<f64>,
    /// The page of hits.
    pub hits: Vec<Hit<T>>,
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit<T> {
    /// Index the document lives in.
    #[serde(rename = "_index")]
    pub index: String,
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Relevance score.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// The document, unless source was disabled or filtered out.
    #[serde(rename = "_source", default = "Option::default")]
    pub source: Option<T>,
    /// Sort values, when sorting.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<serde_json::Value>,
}

/// Total hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalHits {
    /// Count, exact or a lower bound.
    pub value: u64,
    /// Whether `value` is exact.
    pub relation: TotalRelation,
}

/// Precision of [`TotalHits::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    /// Exact count.
    Eq,
    /// Lower bound.
    Gte,
}
