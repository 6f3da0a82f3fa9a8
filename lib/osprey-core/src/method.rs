//! HTTP verbs used by the OpenSearch REST API.

use derive_more::Display;

/// HTTP request method.
///
/// OpenSearch only speaks a handful of verbs; `PATCH` and `OPTIONS` have no
/// endpoint behind them and are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Method {
    /// GET: read a resource or run a read-only query.
    #[display("GET")]
    Get,
    /// POST: run an action (search, refresh, reindex) or create with a generated id.
    #[display("POST")]
    Post,
    /// PUT: create or replace a named resource.
    #[display("PUT")]
    Put,
    /// DELETE: remove a resource.
    #[display("DELETE")]
    Delete,
    /// HEAD: existence probe, the reply carries no body.
    #[display("HEAD")]
    Head,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    /// Returns `true` if the server replies with a body for this verb.
    #[must_use]
    pub const fn has_reply_body(&self) -> bool {
        !matches!(self, Self::Head)
    }

    /// Returns `true` if the method is idempotent.
    #[must_use]
    pub const fn is_idempotent(&self) -> bool {
        !matches!(self, Self::Post)
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Post => Self::POST,
            Method::Put => Self::PUT,
            Method::Delete => Self::DELETE,
            Method::Head => Self::HEAD,
        }
    }
}

impl TryFrom<http::Method> for Method {
    type Error = crate::Error;

    fn try_from(method: http::Method) -> Result<Self, Self::Error> {
        match method {
            http::Method::GET => Ok(Self::Get),
            http::Method::POST => Ok(Self::Post),
            http::Method::PUT => Ok(Self::Put),
            http::Method::DELETE => Ok(Self::Delete),
            http::Method::HEAD => Ok(Self::Head),
            other => Err(crate::Error::build(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display_matches_wire_form() {
        for method in [
            Method::Get,
            Method::Post,
            Method::Put,
            Method::Delete,
            Method::Head,
        ] {
            assert_eq!(method.to_string(), method.as_str());
        }
    }

    #[test]
    fn only_head_has_no_reply_body() {
        assert!(!Method::Head.has_reply_body());
        assert!(Method::Get.has_reply_body());
        assert!(Method::Delete.has_reply_body());
    }

    #[test]
    fn post_is_not_idempotent() {
        assert!(!Method::Post.is_idempotent());
        assert!(Method::Put.is_idempotent());
        assert!(Method::Head.is_idempotent());
    }

    #[test]
    fn method_http_conversions() {
        assert_eq!(http::Method::from(Method::Head), http::Method::HEAD);
        assert_eq!(
            Method::try_from(http::Method::PUT).expect("PUT"),
            Method::Put
        );
        assert!(Method::try_from(http::Method::PATCH).is_err());
    }
}
