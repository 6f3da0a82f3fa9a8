//! Request descriptors.
//!
//! The pipeline only ever sees a [`RequestDescriptor`]: a value that knows how
//! to turn itself into a [`Request`]. [`Endpoint`] adds the type the reply body
//! decodes into, and [`Probe`] marks existence checks whose answer is the
//! status code.

use serde::de::DeserializeOwned;
use url::Url;

use crate::{Request, Result};

/// A value that materializes one HTTP request.
pub trait RequestDescriptor: Send {
    /// Build the request against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns a build error if the URL, a header or the body is invalid.
    fn build_request(self, base_url: &Url) -> Result<Request>;
}

/// A descriptor whose 2xx reply decodes into [`Endpoint::Response`].
pub trait Endpoint: RequestDescriptor {
    /// Decode target of a successful reply.
    type Response: DeserializeOwned + Send;
}

/// An existence probe: 2xx means present, 404 means absent.
pub trait Probe: RequestDescriptor {}

impl RequestDescriptor for Request {
    fn build_request(self, _base_url: &Url) -> Result<Request> {
        Ok(self)
    }
}
