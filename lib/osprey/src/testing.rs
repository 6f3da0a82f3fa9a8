//! A scripted [`Transport`] for tests.
//!
//! [`MockTransport`] answers from a queue of scripted outcomes and records
//! every request it receives, so the pipeline's failure paths can be driven
//! without a cluster.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use osprey::testing::MockTransport;
//! use osprey::{Client, Scope};
//! use osprey::api::root::Ping;
//!
//! let transport = MockTransport::new().reply(404, "");
//! let client = Client::with_transport(transport.clone());
//!
//! let exists = client.exists(&Scope::new(), Ping::new()).await.expect("probe");
//! assert!(!*exists);
//! assert_eq!(transport.requests()[0].method, osprey::Method::Head);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use url::Url;

use crate::{
    Error, Method, ParamMap, RawResponse, Request, Result, Transport, TransportErrorKind,
};

#[derive(Debug)]
enum Scripted {
    Reply {
        status: u16,
        headers: HeaderMap,
        body: Bytes,
    },
    Fail {
        kind: TransportErrorKind,
        message: String,
    },
}

#[derive(Debug, Default)]
struct State {
    script: VecDeque<Scripted>,
    delay: Option<Duration>,
    requests: Vec<RecordedRequest>,
}

/// A request as the transport received it, body buffered.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body.
    pub body: Bytes,
}

impl RecordedRequest {
    /// URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded query parameters.
    #[must_use]
    pub fn params(&self) -> ParamMap {
        ParamMap::parse_query(self.url.query().unwrap_or_default())
    }

    /// First value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Transport that plays back scripted outcomes in order.
///
/// Clones share the script and the recorded requests. Once the script is
/// exhausted every call fails with a connection error.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// An empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(self, scripted: Scripted) -> Self {
        self.lock().script.push_back(scripted);
        self
    }

    /// Queue a reply.
    #[must_use]
    pub fn reply(self, status: u16, body: impl Into<Bytes>) -> Self {
        self.reply_with_headers(status, HeaderMap::new(), body)
    }

    /// Queue a JSON reply.
    #[must_use]
    pub fn reply_json(self, status: u16, body: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.reply_with_headers(status, headers, body.to_string())
    }

    /// Queue a reply with headers.
    #[must_use]
    pub fn reply_with_headers(
        self,
        status: u16,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Self {
        self.push(Scripted::Reply {
            status,
            headers,
            body: body.into(),
        })
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(self, kind: TransportErrorKind, message: impl Into<String>) -> Self {
        self.push(Scripted::Fail {
            kind,
            message: message.into(),
        })
    }

    /// Wait `delay` before answering each request.
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = Some(delay);
        self
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<RawResponse> {
        let (method, url, headers, body) = request.buffer().await?.into_parts();

        let (next, delay) = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                method,
                url,
                headers,
                body,
            });
            (state.script.pop_front(), state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match next {
            Some(Scripted::Reply {
                status,
                headers,
                body,
            }) => Ok(RawResponse::from_bytes(status, headers, body)),
            Some(Scripted::Fail { kind, message }) => Err(Error::transport(kind, message)),
            None => Err(Error::connection("mock transport: no scripted reply left")),
        }
    }
}
