//! Error types for osprey.
//!
//! Every call ends in exactly one outcome. The failure branch is an [`Error`]
//! of one of five kinds (see [`ErrorKind`]):
//!
//! - transport failure: no HTTP exchange completed,
//! - structured server error: non-2xx with the documented `error` object,
//! - opaque server error: non-2xx with a string `error` or an unparseable body,
//! - decode failure: 2xx whose body does not fit the decode target,
//! - cancellation: a transport failure caused by the caller's scope.
//!
//! Errors that carry a server reply keep it, so [`Error::inspect`] still
//! exposes status, headers and body.

use std::fmt;

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::{Inspect, Reply};

// ============================================================================
// Kinds
// ============================================================================

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    /// No HTTP exchange completed.
    #[display("transport error")]
    Transport,
    /// The server rejected the request with a structured error object.
    #[display("server error")]
    Server,
    /// The server rejected the request with a body that is not a structured error.
    #[display("opaque server error")]
    Opaque,
    /// The server accepted the request but its reply did not decode.
    #[display("decode error")]
    Decode,
    /// The caller's scope was cancelled or its deadline elapsed.
    #[display("cancelled")]
    Cancelled,
}

/// Cause of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, reset before a reply.
    #[display("connect")]
    Connect,
    /// TLS handshake or certificate failure.
    #[display("tls")]
    Tls,
    /// The transport's own timeout elapsed.
    #[display("timeout")]
    Timeout,
    /// Read or write aborted mid-exchange.
    #[display("io")]
    Io,
    /// The request could not be assembled (invalid URL or header).
    #[display("build")]
    Build,
    /// The reply body exceeded the configured maximum size.
    #[display("oversize response")]
    Oversize,
    /// The caller cancelled the scope.
    #[display("cancelled")]
    Cancelled,
    /// The scope's deadline elapsed.
    #[display("deadline exceeded")]
    DeadlineExceeded,
}

impl TransportErrorKind {
    /// Returns `true` for the two scope-driven kinds.
    #[must_use]
    pub const fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }
}

// ============================================================================
// Structured server error
// ============================================================================

/// One node of the server's error tree.
///
/// Mirrors the documented shape
/// `{"type": .., "reason": .., "root_cause": [..], "caused_by": {..}}`.
/// Fields the server adds for specific exceptions (`index`, `index_uuid`,
/// `shard`, ...) are kept in [`ErrorCause::metadata`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorCause {
    /// Exception type, e.g. `version_conflict_engine_exception`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable reason. Some exceptions omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Root causes reported by the node that handled the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_cause: Vec<ErrorCause>,
    /// Next link of the causal chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caused_by: Option<Box<ErrorCause>>,
    /// Java stack trace, present when `error_trace=true` was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
    /// Remaining exception-specific fields.
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ErrorCause {
    /// Iterate over this cause and its `caused_by` chain.
    pub fn chain(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |cause| cause.caused_by.as_deref())
    }
}

impl fmt::Display for ErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.kind),
            None => f.write_str(&self.kind),
        }
    }
}

/// Structured error returned by the server together with the HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerError {
    status: u16,
    cause: ErrorCause,
}

impl ServerError {
    /// Creates a server error from a status and the decoded `error` object.
    #[must_use]
    pub const fn new(status: u16, cause: ErrorCause) -> Self {
        Self { status, cause }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Exception type of the top-level error.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.cause.kind
    }

    /// Reason of the top-level error.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.cause.reason.as_deref()
    }

    /// Root causes.
    #[must_use]
    pub fn root_causes(&self) -> &[ErrorCause] {
        &self.cause.root_cause
    }

    /// First link of the `caused_by` chain.
    #[must_use]
    pub fn caused_by(&self) -> Option<&ErrorCause> {
        self.cause.caused_by.as_deref()
    }

    /// The full top-level error object.
    #[must_use]
    pub const fn cause(&self) -> &ErrorCause {
        &self.cause
    }

    /// Returns `true` if any node of the error tree has the given type.
    #[must_use]
    pub fn has_cause(&self, kind: &str) -> bool {
        self.cause.chain().any(|c| c.kind == kind)
            || self
                .cause
                .root_cause
                .iter()
                .flat_map(ErrorCause::chain)
                .any(|c| c.kind == kind)
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.cause, f)
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for osprey operations.
#[derive(Debug, Display, Error)]
pub enum Error {
    /// No HTTP exchange completed.
    #[display("transport error: {kind}: {message}")]
    Transport {
        /// What went wrong.
        kind: TransportErrorKind,
        /// Underlying cause, rendered.
        message: String,
    },

    /// Non-2xx reply carrying a structured error object.
    #[display("server error: {}: {error}", error.status())]
    Server {
        /// The decoded error object.
        #[error(not(source))]
        error: ServerError,
        /// The raw reply.
        #[error(not(source))]
        reply: Box<Reply>,
    },

    /// Non-2xx reply whose body is not a structured error.
    #[display("opaque server error: {status}: {message}")]
    Opaque {
        /// HTTP status code.
        status: u16,
        /// The string `error` field, or the raw body.
        message: String,
        /// The raw reply.
        #[error(not(source))]
        reply: Box<Reply>,
    },

    /// 2xx reply whose body does not decode into the requested type.
    #[display("decode error: {}: {}", reply.status(), decode_message(path, message))]
    Decode {
        /// JSON path to the failing field (empty for syntax errors).
        path: String,
        /// Decoder diagnostic.
        message: String,
        /// The raw reply.
        #[error(not(source))]
        reply: Box<Reply>,
    },
}

fn decode_message(path: &str, message: &str) -> String {
    if path.is_empty() || path == "." {
        message.to_string()
    } else {
        format!("at '{path}': {message}")
    }
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a transport error of the given kind.
    #[must_use]
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Connect, message)
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Tls, message)
    }

    /// Create a transport timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Timeout, message)
    }

    /// Create an I/O error.
    #[must_use]
    pub fn io(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Io, message)
    }

    /// Create a request build error.
    #[must_use]
    pub fn build(message: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Build, message)
    }

    /// Create an oversize response error.
    #[must_use]
    pub fn oversize(limit: usize) -> Self {
        Self::transport(
            TransportErrorKind::Oversize,
            format!("response body exceeds {limit} bytes"),
        )
    }

    /// Create a cancellation error.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::transport(TransportErrorKind::Cancelled, "request cancelled")
    }

    /// Create a deadline-exceeded error.
    #[must_use]
    pub fn deadline_exceeded() -> Self {
        Self::transport(
            TransportErrorKind::DeadlineExceeded,
            "request deadline exceeded",
        )
    }

    /// Create a decode error with path context.
    #[must_use]
    pub fn decode(path: impl Into<String>, message: impl Into<String>, reply: Reply) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.into(),
            reply: Box::new(reply),
        }
    }

    /// Coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { kind, .. } if kind.is_cancellation() => ErrorKind::Cancelled,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Server { .. } => ErrorKind::Server,
            Self::Opaque { .. } => ErrorKind::Opaque,
            Self::Decode { .. } => ErrorKind::Decode,
        }
    }

    /// Transport failure cause, if this is a transport error.
    #[must_use]
    pub const fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Returns `true` if the caller's scope ended the call.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind(), ErrorKind::Cancelled)
    }

    /// Returns `true` for transport timeouts and elapsed scope deadlines.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self.transport_kind(),
            Some(TransportErrorKind::Timeout | TransportErrorKind::DeadlineExceeded)
        )
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self.transport_kind(), Some(TransportErrorKind::Connect))
    }

    /// The HTTP status code, when a reply was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.reply().map(Reply::status)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }

    /// Returns `true` if the server answered 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// The structured server error, if any.
    #[must_use]
    pub const fn server_error(&self) -> Option<&ServerError> {
        match self {
            Self::Server { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Returns `true` if this is a structured server error whose top-level
    /// type is `kind`.
    #[must_use]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.server_error().is_some_and(|e| e.kind() == kind)
    }

    /// Returns `true` if any node of the server's error tree has type `kind`.
    #[must_use]
    pub fn has_cause(&self, kind: &str) -> bool {
        self.server_error().is_some_and(|e| e.has_cause(kind))
    }

    /// The raw reply, when the exchange completed.
    #[must_use]
    pub fn reply(&self) -> Option<&Reply> {
        match self {
            Self::Transport { .. } => None,
            Self::Server { reply, .. } | Self::Opaque { reply, .. } | Self::Decode { reply, .. } => {
                Some(&**reply)
            }
        }
    }

    /// Read-only view over the raw reply, when the exchange completed.
    #[must_use]
    pub fn inspect(&self) -> Option<Inspect<'_>> {
        self.reply().map(Reply::inspect)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::build(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::build(format!("JSON serialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use bytes::Bytes;

    use super::*;

    fn reply(status: u16, body: &'static str) -> Reply {
        Reply::new(
            status,
            http::HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
            "PUT /my-idx/_doc/1",
        )
    }

    fn conflict() -> ErrorCause {
        serde_json::from_str(
            r#"{
                "type": "version_conflict_engine_exception",
                "reason": "[1]: version conflict, document already exists",
                "index": "my-idx",
                "shard": "0",
                "root_cause": [{
                    "type": "version_conflict_engine_exception",
                    "reason": "[1]: version conflict, document already exists"
                }]
            }"#,
        )
        .expect("error cause")
    }

    #[test]
    fn error_display() {
        insta::assert_snapshot!(
            Error::cancelled().to_string(),
            @"transport error: cancelled: request cancelled"
        );
        insta::assert_snapshot!(
            Error::connection("connection refused").to_string(),
            @"transport error: connect: connection refused"
        );

        let err = Error::Server {
            error: ServerError::new(409, conflict()),
            reply: Box::new(reply(409, "{}")),
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"server error: 409: version_conflict_engine_exception: [1]: version conflict, document already exists"
        );

        let err = Error::Opaque {
            status: 502,
            message: "Bad Gateway".to_string(),
            reply: Box::new(reply(502, "Bad Gateway")),
        };
        insta::assert_snapshot!(err.to_string(), @"opaque server error: 502: Bad Gateway");

        let err = Error::decode("hits.total", "invalid type: string", reply(200, "{}"));
        insta::assert_snapshot!(
            err.to_string(),
            @"decode error: 200: at 'hits.total': invalid type: string"
        );
    }

    #[test]
    fn error_kinds() {
        check!(Error::cancelled().kind() == ErrorKind::Cancelled);
        check!(Error::deadline_exceeded().kind() == ErrorKind::Cancelled);
        check!(Error::oversize(10).kind() == ErrorKind::Transport);
        check!(Error::build("bad").kind() == ErrorKind::Transport);
        check!(Error::decode("", "eof", reply(200, "")).kind() == ErrorKind::Decode);
    }

    #[test]
    fn cancellation_is_identifiable() {
        check!(Error::cancelled().is_cancelled());
        check!(Error::deadline_exceeded().is_cancelled());
        check!(Error::deadline_exceeded().is_timeout());
        check!(!Error::connection("refused").is_cancelled());
        check!(!Error::cancelled().is_timeout());
    }

    #[test]
    fn server_error_matching() {
        let err = Error::Server {
            error: ServerError::new(409, conflict()),
            reply: Box::new(reply(409, "{}")),
        };

        check!(err.status() == Some(409));
        check!(err.is_client_error());
        check!(err.is_kind("version_conflict_engine_exception"));
        check!(!err.is_kind("index_not_found_exception"));
        check!(err.has_cause("version_conflict_engine_exception"));

        let_assert!(Some(server) = err.server_error());
        check!(server.root_causes().len() == 1);
        check!(server.cause().metadata.get("index") == Some(&serde_json::json!("my-idx")));
    }

    #[test]
    fn caused_by_chain_is_searched() {
        let cause: ErrorCause = serde_json::from_str(
            r#"{
                "type": "search_phase_execution_exception",
                "reason": "all shards failed",
                "caused_by": {
                    "type": "query_shard_exception",
                    "reason": "failed to create query",
                    "caused_by": {"type": "number_format_exception", "reason": "For input string"}
                }
            }"#,
        )
        .expect("error cause");

        let server = ServerError::new(400, cause);
        check!(server.has_cause("number_format_exception"));
        check!(server.cause().chain().count() == 3);
        check!(!server.has_cause("version_conflict_engine_exception"));
    }

    #[test]
    fn transport_errors_have_no_reply() {
        let err = Error::connection("refused");
        check!(err.status().is_none());
        check!(err.inspect().is_none());
        check!(!err.is_not_found());
    }

    #[test]
    fn reply_is_attached_to_failures() {
        let err = Error::decode("", "expected value", reply(200, "not json"));
        let_assert!(Some(inspect) = err.inspect());
        check!(inspect.status() == 200);
        check!(inspect.body() == b"not json");
    }
}
