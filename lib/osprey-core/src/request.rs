//! HTTP request building.
//!
//! Use [`RequestBuilder`] to turn a method, a path, encoded parameters and a
//! body into a [`Request`] ready for a [`Transport`](crate::Transport).
//!
//! # Example
//!
//! ```
//! use osprey_core::{Method, ParamMap, RequestBuilder};
//!
//! let base_url = "http://localhost:9200".parse().expect("valid URL");
//! let mut params = ParamMap::new();
//! params.insert("refresh", "true");
//!
//! let request = RequestBuilder::new(Method::Put, &base_url, "/my-idx/_doc/1")
//!     .params(params)
//!     .body(r#"{"foo":"bar"}"#)
//!     .build()
//!     .expect("valid request");
//!
//! assert_eq!(request.url().as_str(), "http://localhost:9200/my-idx/_doc/1?refresh=true");
//! assert_eq!(request.header("content-type"), Some("application/json"));
//! ```

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{Body, EncodeParams, Error, Method, ParamMap, ParamValue, Result};

/// Library part of the `User-Agent` header: `osprey/<version> (<os>; <arch>)`.
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "osprey/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// An HTTP request with method, URL, headers and body.
#[derive(Debug, Clone)]
pub struct Request<B = Body> {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: B,
}

impl<B> Request<B> {
    /// Assemble a request from its parts, without any defaulting.
    #[must_use]
    pub const fn from_parts(method: Method, url: Url, headers: HeaderMap, body: B) -> Self {
        Self {
            method,
            url,
            headers,
            body,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Full request URL, query string included.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Query parameters, parsed back from the URL.
    #[must_use]
    pub fn params(&self) -> ParamMap {
        self.url.query().map(ParamMap::parse_query).unwrap_or_default()
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    pub const fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }

    /// The request line, e.g. `GET /my-idx/_doc/1?routing=a`.
    #[must_use]
    pub fn request_line(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{} {}?{query}", self.method, self.url.path()),
            None => format!("{} {}", self.method, self.url.path()),
        }
    }

    /// Add every default header the request does not already carry.
    pub fn merge_default_headers(&mut self, defaults: &HeaderMap) {
        for name in defaults.keys() {
            if !self.headers.contains_key(name) {
                for value in defaults.get_all(name) {
                    self.headers.append(name.clone(), value.clone());
                }
            }
        }
    }

    /// Prepend `prefix` to the `User-Agent` header.
    ///
    /// # Errors
    ///
    /// Returns a build error if the result is not a valid header value.
    pub fn prefix_user_agent(&mut self, prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            return Ok(());
        }
        let agent = match self.header(USER_AGENT.as_str()) {
            Some(current) => format!("{prefix} {current}"),
            None => format!("{prefix} {}", default_user_agent()),
        };
        self.headers.insert(USER_AGENT, header_value(&agent)?);
        Ok(())
    }

    /// Consume into (method, url, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, HeaderMap, B) {
        (self.method, self.url, self.headers, self.body)
    }

    /// Transform the body with a function.
    pub fn map_body<F, B2>(self, f: F) -> Request<B2>
    where
        F: FnOnce(B) -> B2,
    {
        Request {
            method: self.method,
            url: self.url,
            headers: self.headers,
            body: f(self.body),
        }
    }
}

impl Request<Body> {
    /// Read the body into memory.
    ///
    /// The caller's body is consumed here, exactly once. Transports replay the
    /// returned bytes if they retry.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by a streamed body.
    pub async fn buffer(self) -> Result<Request<Bytes>> {
        let (method, url, headers, body) = self.into_parts();
        let bytes = body.into_bytes().await?;
        Ok(Request::from_parts(method, url, headers, bytes))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Request`].
///
/// Caller headers win over library defaults, except `User-Agent`: a caller
/// agent is prepended to the library one.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    base_url: Url,
    path: String,
    params: ParamMap,
    headers: HeaderMap,
    raw_headers: Vec<(String, String)>,
    user_agent_prefix: Option<String>,
    body: Body,
}

impl RequestBuilder {
    /// Start a request for `path` relative to `base_url`.
    ///
    /// The path is used as is, with no interpolation or re-encoding, and must
    /// begin with `/`.
    #[must_use]
    pub fn new(method: Method, base_url: &Url, path: impl Into<String>) -> Self {
        Self {
            method,
            base_url: base_url.clone(),
            path: path.into(),
            params: ParamMap::new(),
            headers: HeaderMap::new(),
            raw_headers: Vec::new(),
            user_agent_prefix: None,
            body: Body::empty(),
        }
    }

    /// Merge encoded parameters; later values replace earlier ones.
    #[must_use]
    pub fn params(mut self, params: ParamMap) -> Self {
        self.params.extend(params);
        self
    }

    /// Encode a parameter struct into the query string.
    #[must_use]
    pub fn encode(mut self, params: &impl EncodeParams) -> Self {
        params.encode_into(&mut self.params);
        self
    }

    /// Set a single query parameter, following the usual omission rules.
    #[must_use]
    pub fn param<V: ParamValue + ?Sized>(mut self, key: &str, value: &V) -> Self {
        self.params.push(key, value);
        self
    }

    /// Set a header. Invalid names or values fail at [`build`](Self::build).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.raw_headers.push((name.into(), value.into()));
        self
    }

    /// Merge already-validated headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Prepend an application identifier to the library `User-Agent`.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns a build error if the path does not start with `/`, or if the
    /// URL or a header is syntactically invalid.
    pub fn build(self) -> Result<Request> {
        let Self {
            method,
            base_url,
            path,
            params,
            headers: mut caller_headers,
            raw_headers,
            user_agent_prefix,
            body,
        } = self;

        if !path.starts_with('/') {
            return Err(Error::build(format!("path must start with '/': {path:?}")));
        }

        let base = base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}{path}"))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter());
        }

        for (name, value) in raw_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::build(format!("invalid header name {name:?}: {e}")))?;
            caller_headers.insert(name, header_value(&value)?);
        }

        let mut agent = default_user_agent();
        if let Some(caller) = caller_headers.remove(USER_AGENT) {
            let caller = caller
                .to_str()
                .map_err(|e| Error::build(format!("invalid User-Agent: {e}")))?;
            agent = format!("{caller} {agent}");
        }
        if let Some(prefix) = user_agent_prefix.filter(|p| !p.is_empty()) {
            agent = format!("{prefix} {agent}");
        }

        let mut headers = HeaderMap::new();
        if !body.is_empty() {
            headers.insert(
                CONTENT_TYPE,
                HeaderValue::from_static(body.content_type().as_str()),
            );
        }
        headers.extend(caller_headers);
        headers.insert(USER_AGENT, header_value(&agent)?);

        Ok(Request::from_parts(method, url, headers, body))
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::build(format!("invalid header value: {e}")))
}
