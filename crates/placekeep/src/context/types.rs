//! Types for request-scoped context.

use placekeep_core::storage::Result;
use uuid::Uuid;

use placekeep::data::{GenericPlaceholderRepository, UnitOfWork};

/// Unique identifier for a request, used for tracing and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request-scoped context available to all handlers.
///
/// The unit of work lives as long as the handler; dropping the context
/// disposes it.
pub struct RequestContext {
    /// Unique request identifier for tracing.
    pub request_id: RequestId,
    pub unit_of_work: UnitOfWork,
}

impl RequestContext {
    /// Placeholder operations bound to this request's unit of work.
    pub fn placeholders(&self) -> Result<GenericPlaceholderRepository> {
        GenericPlaceholderRepository::new(&self.unit_of_work)
    }
}
