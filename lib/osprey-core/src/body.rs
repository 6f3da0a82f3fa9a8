//! Request bodies and JSON helpers.
//!
//! A [`Body`] is moved into the request, so it is read at most once. Streamed
//! bodies are drained by the transport, which keeps the buffered bytes for any
//! replay it performs.

use std::fmt;
use std::pin::Pin;

use bytes::{Bytes, BytesMut};
use futures_core::Stream;
use futures_util::StreamExt;

use crate::Result;

/// A stream of byte chunks, used for streamed request bodies and reply bodies.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Newline-delimited JSON (`application/x-ndjson`), used by bulk-style endpoints.
    NdJson,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::NdJson => "application/x-ndjson",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

enum Inner {
    Empty,
    Full(Bytes),
    Stream(ByteStream),
}

/// Request body: empty, buffered, or a lazy byte stream.
pub struct Body {
    inner: Inner,
    content_type: ContentType,
}

impl Body {
    /// An empty body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            inner: Inner::Empty,
            content_type: ContentType::Json,
        }
    }

    /// A body serialized from `value` as JSON.
    ///
    /// # Errors
    ///
    /// Returns a build error if serialization fails.
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self> {
        Ok(Self::from(to_json(value)?))
    }

    /// A newline-delimited JSON body, one line per item.
    ///
    /// # Errors
    ///
    /// Returns a build error if any item fails to serialize.
    pub fn ndjson<I, T>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: serde::Serialize,
    {
        let mut buf = Vec::new();
        for item in items {
            serde_json::to_writer(&mut buf, &item)?;
            buf.push(b'\n');
        }
        Ok(Self {
            inner: Inner::Full(Bytes::from(buf)),
            content_type: ContentType::NdJson,
        })
    }

    /// A body read lazily from `stream`.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Inner::Stream(Box::pin(stream)),
            content_type: ContentType::Json,
        }
    }

    /// Override the content type sent with this body.
    #[must_use]
    pub const fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Content type of this body.
    #[must_use]
    pub const fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Returns `true` if the body is known to be empty.
    ///
    /// A stream is never considered empty before it is read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.inner {
            Inner::Empty => true,
            Inner::Full(bytes) => bytes.is_empty(),
            Inner::Stream(_) => false,
        }
    }

    /// The buffered bytes, if this body is not a stream.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.inner {
            Inner::Empty => Some(&[][..]),
            Inner::Full(bytes) => Some(bytes.as_ref()),
            Inner::Stream(_) => None,
        }
    }

    /// Read the whole body, consuming it.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by a streamed body.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self.inner {
            Inner::Empty => Ok(Bytes::new()),
            Inner::Full(bytes) => Ok(bytes),
            Inner::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Body");
        match &self.inner {
            Inner::Empty => out.field("kind", &"empty"),
            Inner::Full(bytes) => out.field("len", &bytes.len()),
            Inner::Stream(_) => out.field("kind", &"stream"),
        };
        out.field("content_type", &self.content_type).finish()
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            inner: Inner::Full(bytes),
            content_type: ContentType::Json,
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns a build error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use osprey_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Doc { foo: String }
///
/// let bytes = to_json(&Doc { foo: "bar".to_string() }).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"foo":"bar"}"#);
/// ```
pub fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Deserialize JSON bytes with path-aware diagnostics.
///
/// On failure returns the JSON path of the offending field (empty for syntax
/// errors) and the decoder's message.
///
/// # Errors
///
/// Returns `(path, message)` if the bytes do not decode into `T`.
pub fn from_json<T: serde::de::DeserializeOwned>(
    bytes: &[u8],
) -> std::result::Result<T, (String, String)> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value: T = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| (e.path().to_string(), e.inner().to_string()))?;
    deserializer
        .end()
        .map_err(|e| (String::new(), e.to_string()))?;
    Ok(value)
}
