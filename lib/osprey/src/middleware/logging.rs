//! Exchange logging for OpenSearch traffic.
//!
//! Every exchange runs inside an `opensearch.exchange` span that carries the
//! request line and the caller's `X-Opaque-Id`, so server-side slow logs and
//! task listings can be matched to client logs. Deprecation notices the
//! cluster returns in `Warning` headers are logged as warnings.
//!
//! Only status and headers are visible at this layer: the pipeline reads the
//! body afterwards.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use bytes::Bytes;
use http::HeaderMap;
use http::header::WARNING;
use tower::{Layer, Service};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::{Error, Method, RawResponse, Request, Result};

/// Header OpenSearch echoes into task listings and slow logs.
const OPAQUE_ID: &str = "x-opaque-id";

/// Layer that adds exchange logging.
///
/// # Example
///
/// ```ignore
/// use osprey::HyperTransport;
/// use osprey::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Verbosity of [`LoggingLayer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Also log request headers and body size, at debug level.
    Debug,
    /// One line per exchange.
    #[default]
    Info,
}

impl LoggingLayer {
    /// Logging with one line per exchange.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logging that also records request headers.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service produced by [`LoggingLayer`].
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

/// How the cluster answered, as far as headers tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    /// 404 to a `HEAD`: an existence check answered "no".
    Absent,
    Rejected,
    ServerFailure,
}

impl Outcome {
    fn of(method: Method, status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            404 if method == Method::Head => Self::Absent,
            500..=599 => Self::ServerFailure,
            _ => Self::Rejected,
        }
    }
}

impl<S> Service<Request<Bytes>> for Logging<S>
where
    S: Service<Request<Bytes>, Response = RawResponse, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = RawResponse;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let method = request.method();
        let request_line = request.request_line();
        let opaque_id = request.header(OPAQUE_ID).unwrap_or_default().to_string();
        let level = self.level;

        let span = info_span!(
            "opensearch.exchange",
            request = %request_line,
            opaque_id = %opaque_id,
        );

        // The ready service is the one polled above
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(
            async move {
                let start = Instant::now();
                if level == LogLevel::Debug {
                    debug!(
                        headers = ?request.headers(),
                        body_len = request.body().len(),
                        "sending request"
                    );
                }

                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(reply) => {
                        let status = reply.status();
                        match Outcome::of(method, status) {
                            Outcome::Success => info!(status, elapsed_ms, "exchange completed"),
                            Outcome::Absent => info!(status, elapsed_ms, "resource absent"),
                            Outcome::Rejected => warn!(status, elapsed_ms, "request rejected"),
                            Outcome::ServerFailure => {
                                error!(status, elapsed_ms, "cluster failed the request");
                            }
                        }
                        for notice in deprecation_notices(reply.headers()) {
                            warn!(notice = %notice, "cluster reported deprecated usage");
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, elapsed_ms, "exchange failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// Texts of the `Warning` headers of a reply.
///
/// OpenSearch sends `299 <agent> "<text>"`, optionally followed by a quoted
/// date; only the first quoted string is kept. A value without quotes is
/// returned trimmed.
#[must_use]
pub fn deprecation_notices(headers: &HeaderMap) -> Vec<String> {
    let mut notices: Vec<String> = headers
        .get_all(WARNING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(warning_text)
        .filter(|text| !text.is_empty())
        .collect();
    notices.dedup();
    notices
}

fn warning_text(value: &str) -> String {
    let Some((_, quoted)) = value.split_once('"') else {
        return value.trim().to_string();
    };
    let mut text = String::new();
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => text.extend(chars.next()),
            '"' => break,
            c => text.push(c),
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use http::HeaderValue;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn layer_levels() {
        check!(LoggingLayer::new().level == LogLevel::Info);
        check!(LoggingLayer::debug().level == LogLevel::Debug);
    }

    #[test]
    fn outcome_by_status() {
        check!(Outcome::of(Method::Get, 201) == Outcome::Success);
        check!(Outcome::of(Method::Head, 404) == Outcome::Absent);
        check!(Outcome::of(Method::Get, 404) == Outcome::Rejected);
        check!(Outcome::of(Method::Put, 409) == Outcome::Rejected);
        check!(Outcome::of(Method::Post, 503) == Outcome::ServerFailure);
    }

    #[test]
    fn warning_header_text() {
        check!(
            warning_text(r#"299 OpenSearch-2.11.0-4dcad6d "[index.merge.policy] is deprecated""#)
                == "[index.merge.policy] is deprecated"
        );
        check!(
            warning_text(r#"299 OpenSearch-1.3.0 "a \"quoted\" word" "Tue, 15 Nov 1994 08:12:31 GMT""#)
                == r#"a "quoted" word"#
        );
        check!(warning_text(" legacy notice ") == "legacy notice");
    }

    #[test]
    fn notices_from_every_warning_header() {
        let mut headers = HeaderMap::new();
        headers.append(WARNING, HeaderValue::from_static(r#"299 OpenSearch-2.11.0 "first""#));
        headers.append(WARNING, HeaderValue::from_static(r#"299 OpenSearch-2.11.0 "first""#));
        headers.append(WARNING, HeaderValue::from_static(r#"299 OpenSearch-2.11.0 "second""#));

        check!(deprecation_notices(&headers) == vec!["first", "second"]);
        check!(deprecation_notices(&HeaderMap::new()).is_empty());
    }

    #[tokio::test]
    async fn reply_passes_through_unchanged() {
        let inner = tower::service_fn(|request: Request<Bytes>| async move {
            let mut headers = HeaderMap::new();
            headers.insert(
                WARNING,
                HeaderValue::from_static(r#"299 OpenSearch-2.11.0 "[_type] is deprecated""#),
            );
            let status = if request.method() == Method::Head { 404 } else { 200 };
            Ok::<_, Error>(RawResponse::from_bytes(status, headers, Bytes::new()))
        });
        let service = LoggingLayer::debug().layer(inner);

        let base = "http://localhost:9200".parse().expect("url");
        let request = crate::RequestBuilder::new(Method::Head, &base, "/books")
            .header(OPAQUE_ID, "job-7")
            .build()
            .expect("request")
            .map_body(|_| Bytes::new());

        let_assert!(Ok(reply) = service.oneshot(request).await);
        check!(reply.status() == 404);
        check!(deprecation_notices(reply.headers()) == vec!["[_type] is deprecated"]);
    }
}
