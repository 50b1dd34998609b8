use thiserror::Error;

/// Errors that can occur during repository and unit-of-work operations.
///
/// A missing row is not an error: lookups return `None` and removals `false`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Expected at most one {entity_type} but the filter matched several")]
    MultipleMatches { entity_type: &'static str },
    #[error("Entity set is not registered in the model: {0}")]
    UnknownEntitySet(String),
    #[error("{entity_type} has no relation named {relation}")]
    UnknownRelation {
        entity_type: &'static str,
        relation: String,
    },
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Unit of work has been disposed")]
    Disposed,
    #[error("Storage call timed out after {0}ms")]
    Timeout(u64),
    #[error("Distributed commit aborted after {committed} of {participants} participants committed: {reason}")]
    DistributedCommit {
        committed: usize,
        participants: usize,
        reason: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
