//! Cluster root: `GET /` and `HEAD /`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    CommonParams, Endpoint, Method, Params, Probe, Request, RequestBuilder, RequestDescriptor,
    Result,
};

/// Parameters of [`Info`] and [`Ping`].
#[derive(Debug, Clone, Default, PartialEq, Params)]
pub struct RootParams {
    /// Flags accepted by every endpoint.
    #[param(flatten)]
    pub common: CommonParams,
}

/// `GET /`: cluster name and version.
#[derive(Debug, Clone, Default)]
pub struct Info {
    /// Query parameters.
    pub params: RootParams,
}

impl Info {
    /// Creates the request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query parameters.
    #[must_use]
    pub fn params(mut self, params: RootParams) -> Self {
        self.params = params;
        self
    }
}

impl RequestDescriptor for Info {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Get, base_url, "/")
            .encode(&self.params)
            .build()
    }
}

impl Endpoint for Info {
    type Response = InfoResponse;
}

/// Reply of [`Info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Name of the node that answered.
    pub name: String,
    /// Cluster name.
    pub cluster_name: String,
    /// Cluster UUID.
    pub cluster_uuid: String,
    /// Version details.
    pub version: VersionInfo,
    /// Fixed project tagline.
    pub tagline: String,
}

/// Version block of [`InfoResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    /// `opensearch`; absent on Elasticsearch-compatible mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    /// Release, e.g. `2.13.0`.
    pub number: String,
    /// Packaging, e.g. `tar`.
    pub build_type: String,
    /// Commit hash.
    pub build_hash: String,
    /// Build timestamp.
    pub build_date: String,
    /// Snapshot build.
    pub build_snapshot: bool,
    /// Embedded Lucene release.
    pub lucene_version: String,
    /// Oldest version this node talks to.
    pub minimum_wire_compatibility_version: String,
    /// Oldest index version this node reads.
    pub minimum_index_compatibility_version: String,
}

/// `HEAD /`: is the cluster reachable.
#[derive(Debug, Clone, Default)]
pub struct Ping {
    /// Query parameters.
    pub params: RootParams,
}

impl Ping {
    /// Creates the probe.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestDescriptor for Ping {
    fn build_request(self, base_url: &Url) -> Result<Request> {
        RequestBuilder::new(Method::Head, base_url, "/")
            .encode(&self.params)
            .build()
    }
}

impl Probe for Ping {}

#[cfg(test)]
mod tests {
    use assert2::check;

    use super::*;

    #[test]
    fn info_request() {
        let base = Url::parse("http://localhost:9200").expect("url");
        let request = Info::new()
            .params(RootParams {
                common: CommonParams {
                    pretty: true,
                    ..CommonParams::default()
                },
            })
            .build_request(&base)
            .expect("request");

        check!(request.request_line() == "GET /?pretty=true");
        check!(request.body().is_empty());
    }

    #[test]
    fn ping_is_a_head() {
        let base = Url::parse("http://localhost:9200").expect("url");
        let request = Ping::new().build_request(&base).expect("request");
        check!(request.request_line() == "HEAD /");
    }
}
