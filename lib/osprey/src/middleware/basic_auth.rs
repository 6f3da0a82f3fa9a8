//! Basic authentication middleware.
//!
//! Adds `Authorization: Basic <base64(user:pass)>` to every request that does
//! not already carry an `Authorization` header.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use base64::Engine;
use bytes::Bytes;
use http::HeaderValue;
use http::header::AUTHORIZATION;
use tower::{Layer, Service};

use crate::{Error, RawResponse, Request, Result};

fn encode_credentials(username: &str, password: &str) -> Arc<str> {
    let credentials = format!("{username}:{password}");
    Arc::from(base64::engine::general_purpose::STANDARD.encode(credentials))
}

/// Layer that adds basic authentication to requests.
///
/// # Example
///
/// ```ignore
/// use osprey::HyperTransport;
/// use osprey::middleware::BasicAuthLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(BasicAuthLayer::new("admin", "admin"))
///     .build();
/// ```
#[derive(Clone)]
pub struct BasicAuthLayer {
    /// Base64-encoded "username:password".
    encoded_credentials: Arc<str>,
}

impl std::fmt::Debug for BasicAuthLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthLayer").finish_non_exhaustive()
    }
}

impl BasicAuthLayer {
    /// Create a new basic auth layer with the given username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        Self {
            encoded_credentials: encode_credentials(username.as_ref(), password.as_ref()),
        }
    }
}

impl<S> Layer<S> for BasicAuthLayer {
    type Service = BasicAuth<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BasicAuth {
            inner,
            encoded_credentials: Arc::clone(&self.encoded_credentials),
        }
    }
}

/// Service that adds basic authentication to requests.
#[derive(Clone)]
pub struct BasicAuth<S> {
    inner: S,
    encoded_credentials: Arc<str>,
}

impl<S> std::fmt::Debug for BasicAuth<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth").finish_non_exhaustive()
    }
}

impl<S> BasicAuth<S> {
    /// Create a new basic auth service wrapping the given service.
    pub fn new(inner: S, username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        Self {
            inner,
            encoded_credentials: encode_credentials(username.as_ref(), password.as_ref()),
        }
    }

    fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::try_from(format!("Basic {}", self.encoded_credentials))
            .map_err(|e| Error::build(format!("invalid basic credentials: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl<S> Service<Request<Bytes>> for BasicAuth<S>
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

    fn call(&mut self, mut request: Request<Bytes>) -> Self::Future {
        if !request.headers().contains_key(AUTHORIZATION) {
            match self.header_value() {
                Ok(value) => {
                    request.headers_mut().insert(AUTHORIZATION, value);
                }
                Err(err) => return Box::pin(async move { Err(err) }),
            }
        }

        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}
