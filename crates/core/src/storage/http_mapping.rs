//! Pure functions for mapping repository errors to HTTP status codes.
//!
//! This module provides HTTP status code mappings for [`RepositoryError`] variants,
//! following the Functional Core pattern - pure functions with no side effects.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `AlreadyExists` -> 409 (Conflict)
/// - `MultipleMatches` -> 409 (Conflict)
/// - `InvalidData` -> 400 (Bad Request)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `Timeout` -> 504 (Gateway Timeout)
/// - everything else -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use placekeep_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::AlreadyExists {
///     entity_type: "Placeholder",
///     id: "7".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 409);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::MultipleMatches { .. } => 409,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::Timeout(_) => 504,
        RepositoryError::UnknownEntitySet(_)
        | RepositoryError::UnknownRelation { .. }
        | RepositoryError::InvalidFilter(_)
        | RepositoryError::Disposed
        | RepositoryError::DistributedCommit { .. }
        | RepositoryError::QueryFailed(_)
        | RepositoryError::Serialization(_) => 500,
    }
}
