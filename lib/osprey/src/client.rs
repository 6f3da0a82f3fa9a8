//! The request pipeline.
//!
//! Every endpoint call goes through the same steps:
//!
//! 1. fail fast if the scope has already ended,
//! 2. build the request from the descriptor,
//! 3. send it through the transport, racing the scope,
//! 4. drain the reply body (bounded by `max_response_size`), racing the scope,
//! 5. classify the reply,
//! 6. decode the body, with the JSON path of any mismatch.
//!
//! The pipeline never retries and keeps no per-call state, so one [`Client`]
//! serves any number of concurrent calls.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, debug, info_span, warn};

use crate::{
    ClientConfig, Endpoint, Error, HyperTransport, Probe, Reply, RequestDescriptor, Response,
    Result, Scope, Transport, Verdict, classify, from_json,
};

/// Typed OpenSearch client over a [`Transport`].
///
/// # Example
///
/// ```ignore
/// use osprey::{Client, Scope};
/// use osprey::api::root::Info;
///
/// let client = Client::from_url("https://search.internal:9200")?;
/// let info = client.send(&Scope::new(), Info::new()).await?;
/// println!("{}", info.version.number);
/// ```
#[derive(Debug, Clone)]
pub struct Client<T = HyperTransport> {
    transport: T,
    config: Arc<ClientConfig>,
}

impl Client<HyperTransport> {
    /// A client for `url` over a default [`HyperTransport`].
    ///
    /// # Errors
    ///
    /// Returns a build error if `url` is not a valid base URL.
    pub fn from_url(url: &str) -> Result<Self> {
        let config = ClientConfig::builder().base_url(url).build()?;
        Ok(Self::new(HyperTransport::new(), config))
    }
}

impl Default for Client<HyperTransport> {
    fn default() -> Self {
        Self::new(HyperTransport::new(), ClientConfig::default())
    }
}

impl<T: Transport> Client<T> {
    /// Create a client over `transport`.
    #[must_use]
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Create a client over `transport` with the default configuration.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self::new(transport, ClientConfig::default())
    }

    /// The client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Run a request and return the raw reply of a successful call.
    ///
    /// Nothing is decoded; use this for endpoints without a typed binding.
    ///
    /// # Errors
    ///
    /// Returns a transport error (cancellation included) when no reply was
    /// received, or a server or opaque error for a non-2xx reply.
    pub async fn execute<D: RequestDescriptor>(&self, scope: &Scope, descriptor: D) -> Result<Reply> {
        let reply = self.roundtrip(scope, descriptor).await?;
        match classify(&reply, false) {
            Verdict::Failure(failure) => Err(rejected(failure.into_error(reply))),
            Verdict::Success | Verdict::Exists(_) => Ok(reply),
        }
    }

    /// Call an endpoint and decode its reply.
    ///
    /// # Errors
    ///
    /// As [`Client::execute`], plus a decode error when a 2xx body does not
    /// fit `E::Response`.
    pub async fn send<E: Endpoint>(
        &self,
        scope: &Scope,
        endpoint: E,
    ) -> Result<Response<E::Response>> {
        let reply = self.execute(scope, endpoint).await?;
        match from_json::<E::Response>(reply.body()) {
            Ok(value) => {
                scope.check()?;
                Ok(Response::new(value, reply))
            }
            Err((path, message)) => Err(rejected(Error::decode(path, message, reply))),
        }
    }

    /// Run an existence probe: 2xx is `true`, 404 is `false`.
    ///
    /// # Errors
    ///
    /// As [`Client::execute`] for any other outcome.
    pub async fn exists<P: Probe>(&self, scope: &Scope, probe: P) -> Result<Response<bool>> {
        let reply = self.roundtrip(scope, probe).await?;
        match classify(&reply, true) {
            Verdict::Exists(found) => Ok(Response::new(found, reply)),
            Verdict::Success => Ok(Response::new(true, reply)),
            Verdict::Failure(failure) => Err(rejected(failure.into_error(reply))),
        }
    }

    /// Steps 1 to 4: build, send, drain.
    async fn roundtrip<D: RequestDescriptor>(&self, scope: &Scope, descriptor: D) -> Result<Reply> {
        scope.check()?;

        let mut request = descriptor.build_request(&self.config.base_url)?;
        request.merge_default_headers(&self.config.default_headers);
        if let Some(prefix) = &self.config.user_agent_prefix {
            request.prefix_user_agent(prefix)?;
        }

        let method = request.method();
        let path = request.path().to_string();
        let request_line = request.request_line();
        let limit = self.config.max_response_size;

        let span = info_span!("opensearch.request", %method, %path);
        async move {
            let start = Instant::now();
            debug!(request = %request_line, "sending request");

            let result = async {
                let raw = scope.run(self.transport.send(request)).await?;
                let reply = scope.run(raw.collect(method, limit, request_line)).await?;
                scope.check()?;
                Ok::<_, Error>(reply)
            }
            .await;

            // Saturating conversion to u64 (truncates after ~584 million years)
            let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            match &result {
                Ok(reply) => {
                    debug!(status = reply.status(), elapsed_ms, "reply received");
                }
                Err(err) => {
                    warn!(error = %err, elapsed_ms, "request failed");
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}

fn rejected(err: Error) -> Error {
    warn!(error = %err, "request rejected");
    err
}
