//! Prelude module for convenient imports.
//!
//! ```ignore
//! use osprey_core::prelude::*;
//! ```

pub use crate::{
    Body, CommonParams, EncodeParams, Endpoint, Error, ErrorKind, Inspect, Method, ParamMap,
    Probe, Reply, Request, RequestBuilder, RequestDescriptor, Response, Result, Transport,
};
