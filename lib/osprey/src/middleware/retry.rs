//! Retry policy for the hyper transport.
//!
//! The pipeline hands the transport a buffered request, so a retry replays the
//! same bytes. Only failures where the cluster most likely did not act on the
//! request are retried.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tower::retry::Policy;

use crate::{Error, RawResponse, Request, TransportErrorKind};

/// Retry policy for OpenSearch exchanges.
///
/// Retries:
/// - connection errors
/// - transport timeouts
/// - 502 Bad Gateway, 503 Service Unavailable, 504 Gateway Timeout
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use osprey::HyperTransport;
/// use osprey::middleware::RetryPolicy;
///
/// let transport = HyperTransport::builder()
///     .with_retry_policy(RetryPolicy::new(3).with_backoff(Duration::from_millis(200)))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    remaining: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Create a new retry policy with the given maximum number of retries.
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            remaining: max_retries,
            backoff: Duration::ZERO,
        }
    }

    /// Wait `backoff` before each retry.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns `true` if a reply with this status should be retried.
    fn should_retry_status(status: u16) -> bool {
        matches!(status, 502..=504)
    }

    /// Returns `true` if the error should be retried.
    fn should_retry_error(error: &Error) -> bool {
        error.is_connection() || error.transport_kind() == Some(TransportErrorKind::Timeout)
    }
}

impl Policy<Request<Bytes>, RawResponse, Error> for RetryPolicy {
    type Future = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn retry(
        &mut self,
        _req: &mut Request<Bytes>,
        result: &mut Result<RawResponse, Error>,
    ) -> Option<Self::Future> {
        if self.remaining == 0 {
            return None;
        }

        let should_retry = match result {
            Ok(response) => Self::should_retry_status(response.status()),
            Err(error) => Self::should_retry_error(error),
        };
        if !should_retry {
            return None;
        }

        self.remaining -= 1;
        let backoff = self.backoff;
        tracing::debug!(remaining = self.remaining, ?backoff, "retrying request");
        Some(Box::pin(async move {
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }
        }))
    }

    fn clone_request(&mut self, req: &Request<Bytes>) -> Option<Request<Bytes>> {
        Some(req.clone())
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;

    use super::*;
    use crate::{Method, Result as OspreyResult};

    fn request() -> Request<Bytes> {
        let url = "http://localhost:9200/_cluster/health".parse().expect("url");
        Request::from_parts(Method::Get, url, HeaderMap::new(), Bytes::new())
    }

    fn reply(status: u16) -> OspreyResult<RawResponse> {
        Ok(RawResponse::from_bytes(status, HeaderMap::new(), Bytes::new()))
    }

    #[test]
    fn retries_gateway_statuses() {
        for status in [502, 503, 504] {
            assert!(RetryPolicy::should_retry_status(status), "{status}");
        }
        for status in [200, 400, 404, 409, 429, 500] {
            assert!(!RetryPolicy::should_retry_status(status), "{status}");
        }
    }

    #[test]
    fn retries_connection_and_timeout_errors() {
        assert!(RetryPolicy::should_retry_error(&Error::connection("refused")));
        assert!(RetryPolicy::should_retry_error(&Error::timeout("30s")));
        assert!(!RetryPolicy::should_retry_error(&Error::tls("bad certificate")));
        assert!(!RetryPolicy::should_retry_error(&Error::cancelled()));
        assert!(!RetryPolicy::should_retry_error(&Error::io("reset mid-body")));
    }

    #[test]
    fn budget_is_consumed() {
        let mut policy = RetryPolicy::new(2);
        let mut req = request();

        assert!(policy.retry(&mut req, &mut reply(503)).is_some());
        assert!(policy.retry(&mut req, &mut reply(503)).is_some());
        assert!(policy.retry(&mut req, &mut reply(503)).is_none());
    }

    #[test]
    fn success_is_final() {
        let mut policy = RetryPolicy::new(3);
        let mut req = request();
        assert!(policy.retry(&mut req, &mut reply(200)).is_none());
        assert!(policy.clone_request(&req).is_some());
    }
}
