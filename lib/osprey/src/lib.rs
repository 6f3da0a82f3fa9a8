//! Typed OpenSearch REST client.
//!
//! Endpoints are plain descriptor structs; a [`Client`] builds each one into
//! an HTTP request, sends it through a [`Transport`], classifies the reply
//! and decodes the body into the endpoint's typed response. Every call takes
//! a [`Scope`] that can cancel it or bound it with a deadline.
//!
//! # Example
//!
//! ```ignore
//! use osprey::prelude::*;
//! use osprey::api::document::DocumentGet;
//!
//! #[derive(Debug, Deserialize)]
//! struct Book {
//!     title: String,
//! }
//!
//! let client = Client::from_url("http://localhost:9200")?;
//! let scope = Scope::with_timeout(Duration::from_secs(5));
//!
//! let book = client.send(&scope, DocumentGet::<Book>::new("books", "1")).await?;
//! println!("{} (seq_no {:?})", book.source.as_ref().map_or("-", |b| &b.title), book.seq_no);
//! println!("{}", book.inspect().request_line());
//! ```
//!
//! # Crates
//!
//! - `osprey-core`: request and reply types, parameter encoding, errors and
//!   reply classification, all runtime-free
//! - `osprey-macro`: `#[derive(Params)]`
//! - `osprey` (this crate): the pipeline, the hyper transport, middleware and
//!   endpoint bindings

extern crate self as osprey;

pub mod api;
mod client;
pub mod config;
mod connector;
pub mod middleware;
pub mod prelude;
mod scope;
pub mod testing;
mod transport;

pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, TransportConfig, TransportConfigBuilder};
pub use scope::Scope;
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export core types
pub use osprey_core::{
    Body, ByteStream, ContentType, EncodeParams, Endpoint, Error, ErrorCause, ErrorKind, Failure,
    Inspect, Method, ParamMap, ParamValue, Probe, RawResponse, Reply, Request, RequestBuilder,
    RequestDescriptor, Response, Result, ServerError, Transport, TransportErrorKind, Verdict,
    classify, default_user_agent, format_duration, from_json, join_segments, to_json,
};

// Query parameter types
pub use osprey_core::{
    ByteUnit, CommonParams, Conflicts, DefaultOperator, ExpandWildcards, HealthLevel, HealthStatus,
    OpType, Refresh, SearchType, TimeUnit, VersionType, WaitForActiveShards,
};

// Re-export http types for status codes and headers
pub use osprey_core::{HeaderMap, StatusCode, header};

// Re-export crates callers need to compose with
pub use tokio_util::sync::CancellationToken;
pub use tower;
pub use url;

// Re-export macros
pub use osprey_macro::Params;
