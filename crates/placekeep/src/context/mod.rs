//! Request-scoped context module.
//!
//! Provides the `RequestContext` extractor that bundles request-scoped state
//! (request id, unit of work) to complement application-scoped `AppState`.

mod extractor;
mod types;

pub use types::{RequestContext, RequestId};
