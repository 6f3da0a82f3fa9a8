//! Tower middleware layers for the hyper transport.
//!
//! Layers wrap the transport's [`BoxedService`](crate::BoxedService):
//! they see each request after its body has been buffered and each reply
//! before its body is read. The request pipeline itself never retries; retry
//! belongs here.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `middleware-retry` | `.with_retry()` helper |
//! | `middleware-logging` | `.with_logging()` helper |
//! | `middleware-basic-auth` | `.with_basic_auth()` helper and [`BasicAuthLayer`] |
//! | `middleware-concurrency` | `.with_concurrency_limit()` helper |
//! | `middleware-core` | All of the above (default) |
//!
//! # Example
//!
//! ```ignore
//! use osprey::HyperTransport;
//!
//! let transport = HyperTransport::builder()
//!     .with_logging()
//!     .with_basic_auth("admin", "admin")
//!     .with_retry(3)
//!     .build();
//! ```

#[cfg(feature = "middleware-basic-auth")]
mod basic_auth;
mod logging;
mod retry;

#[cfg(feature = "middleware-basic-auth")]
pub use basic_auth::{BasicAuth, BasicAuthLayer};
pub use logging::{LogLevel, Logging, LoggingLayer, deprecation_notices};
pub use retry::RetryPolicy;

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::retry::RetryLayer;
