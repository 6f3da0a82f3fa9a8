//! Transport abstraction.
//!
//! A [`Transport`] performs one HTTP exchange and returns the reply with its
//! body still streaming. Connection pooling, TLS and retry are its concern;
//! the pipeline never retries.

use std::future::Future;
use std::sync::Arc;

use crate::{RawResponse, Request, Result};

/// Executes HTTP requests.
///
/// Implementations must be safe to share between concurrent calls. Dropping
/// the returned future aborts the exchange.
pub trait Transport: Send + Sync {
    /// Send `request` and return the final reply.
    ///
    /// # Errors
    ///
    /// Returns a transport error if no HTTP exchange completed:
    /// - connection refused or reset
    /// - TLS failure
    /// - transport timeout
    /// - body read or write aborted
    fn send(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<RawResponse>> + Send {
        (**self).send(request)
    }
}
