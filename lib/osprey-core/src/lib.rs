//! Core types and traits for the osprey OpenSearch client.
//!
//! This crate is transport-agnostic and runtime-free:
//! - [`Method`], [`Request`] and [`RequestBuilder`] - request building
//! - [`Body`] - request bodies (empty, buffered or streamed)
//! - [`RawResponse`], [`Reply`], [`Inspect`] and [`Response`] - replies
//! - [`Error`], [`ErrorKind`] and [`Result`] - error handling
//! - [`classify`] - maps a reply to success or a structured error
//! - [`ParamMap`], [`ParamValue`] and [`EncodeParams`] - query parameters
//! - [`RequestDescriptor`], [`Endpoint`] and [`Probe`] - endpoint descriptors
//! - [`Transport`] - the injected HTTP executor
//! - [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod classify;
mod endpoint;
mod error;
mod method;
mod params;
pub mod prelude;
mod request;
mod response;
mod selectors;
mod transport;

pub use body::{Body, ByteStream, ContentType, from_json, to_json};
pub use classify::{Failure, Verdict, classify};
pub use endpoint::{Endpoint, Probe, RequestDescriptor};
pub use error::{Error, ErrorCause, ErrorKind, Result, ServerError, TransportErrorKind};
pub use method::Method;
pub use params::{CommonParams, EncodeParams, ParamMap, ParamValue, format_duration, join_segments};
pub use request::{Request, RequestBuilder, default_user_agent};
pub use response::{Inspect, RawResponse, Reply, Response};
pub use selectors::{
    ByteUnit, Conflicts, DefaultOperator, ExpandWildcards, HealthLevel, HealthStatus, OpType,
    Refresh, SearchType, TimeUnit, VersionType, WaitForActiveShards,
};
pub use transport::Transport;

// Re-export http crate types for status codes and headers
pub use http::{HeaderMap, StatusCode, header};
