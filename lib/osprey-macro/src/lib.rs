//! Procedural macros for the osprey OpenSearch client.
//!
//! - `#[derive(Params)]` - derive a query-parameter encoder for a struct
//!
//! # Example
//!
//! ```ignore
//! use osprey::{CommonParams, Params, Refresh};
//!
//! #[derive(Debug, Default, Params)]
//! pub struct IndexParams {
//!     pub refresh: Refresh,
//!     pub routing: Option<String>,
//!     #[param(rename = "if_seq_no")]
//!     pub seq_no: Option<u64>,
//!     #[param(flatten)]
//!     pub common: CommonParams,
//! }
//! ```

mod params_derive;

use proc_macro::TokenStream;

/// Derive the `EncodeParams` trait for a struct with named fields.
///
/// Every field type must implement `ParamValue`, which decides whether the
/// value is emitted and how it is rendered: unset options, `false`, empty
/// strings and lists, zero durations and selectors left at their default are
/// all omitted.
///
/// # Struct Attributes
///
/// - `#[param(rename_all = "camelCase")]` - rename every field using a case
///   convention (`lowercase`, `camelCase`, `snake_case`, `kebab-case`)
///
/// # Field Attributes
///
/// - `#[param(rename = "name")]` - use a different key (overrides `rename_all`)
/// - `#[param(flatten)]` - merge a nested `EncodeParams` struct
/// - `#[param(skip)]` - never encode the field
#[proc_macro_derive(Params, attributes(param))]
pub fn derive_params(input: TokenStream) -> TokenStream {
    params_derive::expand_params_derive(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
