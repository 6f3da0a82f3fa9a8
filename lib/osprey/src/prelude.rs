//! Prelude module for convenient imports.
//!
//! ```ignore
//! use osprey::prelude::*;
//! ```

pub use crate::{
    Body, Client, ClientConfig, CommonParams, Endpoint, Error, ErrorKind, HyperTransport, Inspect,
    Method, Params, Probe, Reply, Request, RequestBuilder, RequestDescriptor, Response, Result,
    Scope, StatusCode, Transport,
};
pub use serde::{Deserialize, Serialize};
pub use std::time::Duration;
