//! Reply classification.
//!
//! | Status | Body | Verdict |
//! |--------|------|---------|
//! | 2xx | any | success (probe: exists) |
//! | 404, probe | any | does not exist |
//! | other | `{"error": {..}}` | structured server error |
//! | other | `{"error": ".."}` | opaque, with that string |
//! | other | anything else | opaque, with the raw body |

use serde_json::Value;

use crate::{Error, ErrorCause, Reply, ServerError};

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// 2xx reply for a regular endpoint.
    Success,
    /// Answer of an existence probe.
    Exists(bool),
    /// The server refused the request.
    Failure(Failure),
}

/// Server-side failure, before the reply is attached.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// Documented error object.
    Server(ServerError),
    /// String `error` field or unparseable body.
    Opaque(String),
}

impl Failure {
    /// Attach the reply and turn into an [`Error`].
    #[must_use]
    pub fn into_error(self, reply: Reply) -> Error {
        match self {
            Self::Server(error) => Error::Server {
                error,
                reply: Box::new(reply),
            },
            Self::Opaque(message) => Error::Opaque {
                status: reply.status(),
                message,
                reply: Box::new(reply),
            },
        }
    }
}

/// Classify a completed reply.
///
/// `probe` marks existence checks, for which 404 is an answer and not an
/// error.
#[must_use]
pub fn classify(reply: &Reply, probe: bool) -> Verdict {
    let status = reply.status();
    if reply.is_success() {
        return if probe {
            Verdict::Exists(true)
        } else {
            Verdict::Success
        };
    }
    if probe && status == 404 {
        return Verdict::Exists(false);
    }
    Verdict::Failure(failure(status, reply.body()))
}

fn failure(status: u16, body: &[u8]) -> Failure {
    if let Ok(Value::Object(mut envelope)) = serde_json::from_slice::<Value>(body) {
        match envelope.remove("error") {
            Some(error @ Value::Object(_)) => {
                if let Ok(cause) = serde_json::from_value::<ErrorCause>(error) {
                    return Failure::Server(ServerError::new(status, cause));
                }
            }
            Some(Value::String(message)) => return Failure::Opaque(message),
            _ => {}
        }
    }

    let raw = String::from_utf8_lossy(body);
    let raw = raw.trim();
    if raw.is_empty() {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("unknown status");
        Failure::Opaque(reason.to_string())
    } else {
        Failure::Opaque(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use bytes::Bytes;
    use http::HeaderMap;

    use super::*;
    use crate::ErrorKind;

    fn reply(status: u16, body: &'static str) -> Reply {
        Reply::new(
            status,
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
            "GET /my-idx/_doc/1",
        )
    }

    #[test]
    fn success_statuses() {
        check!(classify(&reply(200, "{}"), false) == Verdict::Success);
        check!(classify(&reply(201, ""), false) == Verdict::Success);
        check!(classify(&reply(200, ""), true) == Verdict::Exists(true));
    }

    #[test]
    fn probe_not_found_is_an_answer() {
        check!(classify(&reply(404, ""), true) == Verdict::Exists(false));
    }

    #[test]
    fn not_found_on_regular_endpoint_is_structured() {
        let body = r#"{
            "error": {
                "root_cause": [{"type": "index_not_found_exception", "reason": "no such index [missing]", "index": "missing"}],
                "type": "index_not_found_exception",
                "reason": "no such index [missing]",
                "index": "missing",
                "index_uuid": "_na_"
            },
            "status": 404
        }"#;
        let_assert!(Verdict::Failure(Failure::Server(error)) = classify(&reply(404, body), false));
        check!(error.status() == 404);
        check!(error.kind() == "index_not_found_exception");
        check!(error.reason() == Some("no such index [missing]"));
        check!(error.root_causes().len() == 1);
        check!(error.cause().metadata.get("index_uuid") == Some(&serde_json::json!("_na_")));
    }

    #[test]
    fn probe_server_error_is_still_a_failure() {
        let_assert!(Verdict::Failure(failure) = classify(&reply(500, ""), true));
        check!(failure == Failure::Opaque("Internal Server Error".to_string()));
    }

    #[test]
    fn string_error_is_opaque() {
        let body = r#"{"error":"alias [logs] missing","status":404}"#;
        let verdict = classify(&reply(404, body), false);
        check!(verdict == Verdict::Failure(Failure::Opaque("alias [logs] missing".to_string())));
    }

    #[test]
    fn unparseable_body_is_opaque() {
        let verdict = classify(&reply(502, "<html>Bad Gateway</html>\n"), false);
        check!(
            verdict == Verdict::Failure(Failure::Opaque("<html>Bad Gateway</html>".to_string()))
        );

        let verdict = classify(&reply(400, r#"{"error":{"reason":"no type"}}"#), false);
        check!(
            verdict
                == Verdict::Failure(Failure::Opaque(r#"{"error":{"reason":"no type"}}"#.to_string()))
        );

        let verdict = classify(&reply(429, r#"{"message":"slow down"}"#), false);
        check!(verdict == Verdict::Failure(Failure::Opaque(r#"{"message":"slow down"}"#.to_string())));
    }

    #[test]
    fn into_error_attaches_reply() {
        let original = reply(409, r#"{"error":{"type":"version_conflict_engine_exception","reason":"[1]: version conflict"},"status":409}"#);
        let_assert!(Verdict::Failure(failure) = classify(&original, false));

        let err = failure.into_error(original.clone());
        check!(err.kind() == ErrorKind::Server);
        check!(err.is_kind("version_conflict_engine_exception"));
        check!(err.reply() == Some(&original));
        insta::assert_snapshot!(
            err.to_string(),
            @"server error: 409: version_conflict_engine_exception: [1]: version conflict"
        );

        let_assert!(Verdict::Failure(failure) = classify(&reply(503, ""), false));
        let err = failure.into_error(reply(503, ""));
        check!(err.kind() == ErrorKind::Opaque);
        insta::assert_snapshot!(err.to_string(), @"opaque server error: 503: Service Unavailable");
    }
}
