//! Client and transport configuration types.

use std::time::Duration;

use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::{Error, Result};

/// Environment variable read by [`ClientConfig::from_env`].
pub const URL_ENV_VAR: &str = "OPENSEARCH_URL";

/// Default cluster address.
pub const DEFAULT_URL: &str = "http://localhost:9200";

/// Default cap on a buffered reply body (100 MiB).
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 100 * 1024 * 1024;

// ============================================================================
// Pipeline configuration
// ============================================================================

/// Configuration of the request pipeline.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Cluster address every endpoint path is joined to.
    pub base_url: Url,
    /// Largest reply body the pipeline buffers.
    pub max_response_size: usize,
    /// Prepended to the library `User-Agent`.
    pub user_agent_prefix: Option<String>,
    /// Headers added to every request unless the endpoint sets them.
    pub default_headers: HeaderMap,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_url(),
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
            user_agent_prefix: None,
            default_headers: HeaderMap::new(),
        }
    }
}

fn default_url() -> Url {
    Url::parse(DEFAULT_URL).unwrap_or_else(|_| unreachable!("default URL is valid"))
}

impl ClientConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults, with the base URL taken from `OPENSEARCH_URL` when set.
    ///
    /// # Errors
    ///
    /// Returns a build error if the variable holds an invalid URL.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(URL_ENV_VAR) {
            builder = builder.base_url(&url);
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    max_response_size: Option<usize>,
    user_agent_prefix: Option<String>,
    default_headers: Vec<(String, String)>,
}

impl ClientConfigBuilder {
    /// Set the cluster address.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the largest reply body the pipeline buffers.
    #[must_use]
    pub const fn max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = Some(bytes);
        self
    }

    /// Set the `User-Agent` prefix.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Add a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns a build error for an invalid URL or header.
    pub fn build(self) -> Result<ClientConfig> {
        let defaults = ClientConfig::default();

        let base_url = match self.base_url {
            Some(url) => Url::parse(&url)?,
            None => defaults.base_url,
        };
        if base_url.cannot_be_a_base() {
            return Err(Error::build(format!("not a base URL: {base_url}")));
        }

        let mut default_headers = HeaderMap::new();
        for (name, value) in self.default_headers {
            let name = HeaderName::try_from(name.as_str())
                .map_err(|e| Error::build(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::try_from(value.as_str())
                .map_err(|e| Error::build(format!("invalid value for header {name}: {e}")))?;
            default_headers.append(name, value);
        }

        Ok(ClientConfig {
            base_url,
            max_response_size: self
                .max_response_size
                .unwrap_or(defaults.max_response_size),
            user_agent_prefix: self.user_agent_prefix,
            default_headers,
        })
    }
}

// ============================================================================
// Transport configuration
// ============================================================================

/// Configuration for the hyper transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Time allowed for one exchange, up to the reply headers.
    pub timeout: Duration,
    /// Connection timeout duration.
    pub connect_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_idle_per_host: usize,
    /// Idle connection timeout.
    pub pool_idle_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
        }
    }
}

impl TransportConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TransportConfigBuilder {
        TransportConfigBuilder::default()
    }
}

/// Builder for [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct TransportConfigBuilder {
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    pool_idle_per_host: Option<usize>,
    pool_idle_timeout: Option<Duration>,
}

impl TransportConfigBuilder {
    /// Set the exchange timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    #[must_use]
    pub const fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.pool_idle_per_host = Some(count);
        self
    }

    /// Set the idle connection timeout.
    #[must_use]
    pub const fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TransportConfig {
        let defaults = TransportConfig::default();
        TransportConfig {
            timeout: self.timeout.unwrap_or(defaults.timeout),
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            pool_idle_per_host: self
                .pool_idle_per_host
                .unwrap_or(defaults.pool_idle_per_host),
            pool_idle_timeout: self.pool_idle_timeout.unwrap_or(defaults.pool_idle_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[test]
    fn default_client_config() {
        let config = ClientConfig::default();
        check!(config.base_url.as_str() == "http://localhost:9200/");
        check!(config.max_response_size == 100 * 1024 * 1024);
        check!(config.user_agent_prefix.is_none());
        check!(config.default_headers.is_empty());
    }

    #[test]
    fn client_builder_overrides() {
        let config = ClientConfig::builder()
            .base_url("https://search.internal:9200/prefix")
            .max_response_size(1024)
            .user_agent_prefix("ingest-worker/2.1")
            .default_header("x-opaque-id", "job-42")
            .build()
            .expect("config");

        check!(config.base_url.path() == "/prefix");
        check!(config.max_response_size == 1024);
        check!(config.user_agent_prefix.as_deref() == Some("ingest-worker/2.1"));
        let opaque_id = config.default_headers.get("x-opaque-id");
        check!(opaque_id.and_then(|v| v.to_str().ok()) == Some("job-42"));
    }

    #[test]
    fn client_builder_rejects_invalid_input() {
        let_assert!(Err(err) = ClientConfig::builder().base_url("not a url").build());
        check!(err.transport_kind() == Some(crate::TransportErrorKind::Build));

        check!(ClientConfig::builder().base_url("mailto:ops@example.com").build().is_err());
        check!(
            ClientConfig::builder()
                .default_header("bad header", "x")
                .build()
                .is_err()
        );
    }

    #[test]
    fn default_transport_config() {
        let config = TransportConfig::default();
        check!(config.timeout == Duration::from_secs(30));
        check!(config.connect_timeout == Duration::from_secs(10));
        check!(config.pool_idle_per_host == 32);
    }

    #[test]
    fn transport_builder_overrides() {
        let config = TransportConfig::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .pool_idle_per_host(16)
            .build();

        check!(config.timeout == Duration::from_secs(60));
        check!(config.connect_timeout == Duration::from_secs(5));
        check!(config.pool_idle_per_host == 16);
    }
}
