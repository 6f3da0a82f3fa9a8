//! Replies and decoded responses.
//!
//! A transport hands back a [`RawResponse`] whose body is still a stream. The
//! pipeline drains it once into a [`Reply`], and every outcome that follows
//! owns that reply: a [`Response<T>`] on success, an [`Error`](crate::Error)
//! on failure. Callers read it through [`Inspect`].

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use http::HeaderMap;
use http::header::CONTENT_LENGTH;

use crate::{ByteStream, Error, Method, Result};

// ============================================================================
// Raw (streaming) response
// ============================================================================

/// Transport output: status and headers, body not yet read.
pub struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: ByteStream,
}

impl RawResponse {
    /// Creates a raw response over a body stream.
    #[must_use]
    pub fn new(status: u16, headers: HeaderMap, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// A raw response over an already buffered body.
    #[must_use]
    pub fn from_bytes(status: u16, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self::new(
            status,
            headers,
            Box::pin(futures_util::stream::once(async move { Ok::<_, Error>(body) })),
        )
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consume into the body stream.
    #[must_use]
    pub fn into_body(self) -> ByteStream {
        self.body
    }

    /// Drain the body into a [`Reply`], reading at most `limit` bytes.
    ///
    /// A reply to `HEAD` carries the `Content-Length` of the matching `GET`
    /// but no body, so only bytes actually read count against `limit` there.
    /// The stream is dropped on every exit, which releases the connection.
    ///
    /// # Errors
    ///
    /// Returns an oversize error past `limit`, or the first error yielded by
    /// the body stream.
    pub async fn collect(
        self,
        method: Method,
        limit: usize,
        request_line: impl Into<String>,
    ) -> Result<Reply> {
        let Self {
            status,
            headers,
            mut body,
        } = self;

        let announced = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|_| method != Method::Head);
        if announced.is_some_and(|len| len > limit) {
            return Err(Error::oversize(limit));
        }

        let mut buf = BytesMut::with_capacity(announced.unwrap_or_default());
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if buf.len() + chunk.len() > limit {
                return Err(Error::oversize(limit));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(Reply::new(status, headers, buf.freeze(), request_line))
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Buffered reply
// ============================================================================

/// A completed HTTP exchange with its body fully in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    status: u16,
    headers: HeaderMap,
    body: Bytes,
    request_line: String,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    pub fn new(
        status: u16,
        headers: HeaderMap,
        body: Bytes,
        request_line: impl Into<String>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            request_line: request_line.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Request line that produced this reply.
    #[must_use]
    pub fn request_line(&self) -> &str {
        &self.request_line
    }

    /// Read-only view for callers.
    #[must_use]
    pub const fn inspect(&self) -> Inspect<'_> {
        Inspect { reply: self }
    }

    /// Consume into the body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }
}

// ============================================================================
// Inspect
// ============================================================================

/// Read-only view over a [`Reply`].
///
/// Available on every decoded response and on every error that carries a
/// reply. The body has already been drained, so only bytes are exposed.
#[derive(Debug, Clone, Copy)]
pub struct Inspect<'a> {
    reply: &'a Reply,
}

impl<'a> Inspect<'a> {
    /// Final HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.reply.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &'a HeaderMap {
        &self.reply.headers
    }

    /// First value of a header, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.reply.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Every value of a header, in the order received.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&'a str> {
        self.reply
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    /// Headers as a name to values map.
    #[must_use]
    pub fn header_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::<String, Vec<String>>::new();
        for (name, value) in &self.reply.headers {
            if let Ok(value) = value.to_str() {
                map.entry(name.as_str().to_string())
                    .or_default()
                    .push(value.to_string());
            }
        }
        map
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        &self.reply.body
    }

    /// Body as text, invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(&self.reply.body)
    }

    /// The request line, e.g. `GET /my-idx/_doc/1`.
    #[must_use]
    pub fn request_line(&self) -> &'a str {
        &self.reply.request_line
    }

    /// Re-parse the body as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the body is not JSON.
    pub fn json_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.reply.body)
    }
}

// ============================================================================
// Decoded response
// ============================================================================

/// A decoded value together with the reply it came from.
#[derive(Debug, Clone)]
pub struct Response<T> {
    value: T,
    reply: Reply,
}

impl<T> Response<T> {
    /// Creates a response.
    #[must_use]
    pub const fn new(value: T, reply: Reply) -> Self {
        Self { value, reply }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.reply.status
    }

    /// Read-only view over the raw reply.
    #[must_use]
    pub const fn inspect(&self) -> Inspect<'_> {
        self.reply.inspect()
    }

    /// The decoded value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// Consume into the decoded value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Consume into (value, reply).
    #[must_use]
    pub fn into_parts(self) -> (T, Reply) {
        (self.value, self.reply)
    }

    /// Transform the decoded value, keeping the reply.
    pub fn map<F, U>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            value: f(self.value),
            reply: self.reply,
        }
    }
}

impl<T> Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}
