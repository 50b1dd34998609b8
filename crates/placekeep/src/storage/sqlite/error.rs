//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError`.
//! Constraint violations on the key column become `AlreadyExists`.

use placekeep_core::storage::RepositoryError;

/// Maps a rusqlite error to a RepositoryError.
///
/// # Error Mapping
///
/// - `SQLITE_CONSTRAINT_PRIMARYKEY` / `SQLITE_CONSTRAINT_UNIQUE` → `RepositoryError::AlreadyExists`
/// - Open failures → `RepositoryError::ConnectionFailed`
/// - Undecodable stored documents → `RepositoryError::Serialization`
/// - All other errors → `RepositoryError::QueryFailed`
pub fn map_rusqlite_error(err: &rusqlite::Error, entity_type: &'static str) -> RepositoryError {
    map_rusqlite_error_with_id(err, entity_type, "unknown")
}

/// Maps a rusqlite error with a known key to a RepositoryError.
pub fn map_rusqlite_error_with_id(
    err: &rusqlite::Error,
    entity_type: &'static str,
    id: &str,
) -> RepositoryError {
    match err {
        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || sqlite_err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepositoryError::AlreadyExists {
                entity_type,
                id: id.to_string(),
            }
        }

        rusqlite::Error::SqliteFailure(sqlite_err, _)
            if sqlite_err.code == rusqlite::ErrorCode::CannotOpen =>
        {
            RepositoryError::ConnectionFailed(format!("Cannot open database: {err}"))
        }

        rusqlite::Error::FromSqlConversionFailure(_, _, cause) => {
            RepositoryError::Serialization(format!("{entity_type} {id}: {cause}"))
        }

        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error to a RepositoryError.
///
/// Unwraps the inner `rusqlite::Error` when there is one. A closed connection
/// becomes `ConnectionFailed`.
pub fn map_tokio_rusqlite_error(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type)
        }
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    fn constraint(extended_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(
            ffi::Error {
                code: rusqlite::ErrorCode::ConstraintViolation,
                extended_code,
            },
            None,
        )
    }

    #[test]
    fn test_primary_key_violation_maps_to_already_exists() {
        let result =
            map_rusqlite_error_with_id(&constraint(ffi::SQLITE_CONSTRAINT_PRIMARYKEY), "Placeholder", "7");

        assert_eq!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Placeholder",
                id: "7".to_string()
            }
        );
    }

    #[test]
    fn test_unique_violation_without_id() {
        let result = map_rusqlite_error(&constraint(ffi::SQLITE_CONSTRAINT_UNIQUE), "Placeholder");

        assert!(matches!(
            result,
            RepositoryError::AlreadyExists { id, .. } if id == "unknown"
        ));
    }

    #[test]
    fn test_cannot_open_maps_to_connection_failed() {
        let err = rusqlite::Error::SqliteFailure(
            ffi::Error {
                code: rusqlite::ErrorCode::CannotOpen,
                extended_code: ffi::SQLITE_CANTOPEN,
            },
            None,
        );

        assert!(matches!(
            map_rusqlite_error(&err, "Placeholder"),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_tokio_rusqlite_error_unwraps_rusqlite() {
        let err = tokio_rusqlite::Error::Rusqlite(constraint(ffi::SQLITE_CONSTRAINT_PRIMARYKEY));

        assert!(matches!(
            map_tokio_rusqlite_error(err, "Placeholder"),
            RepositoryError::AlreadyExists {
                entity_type: "Placeholder",
                ..
            }
        ));
    }

    #[test]
    fn test_closed_connection_maps_to_connection_failed() {
        let result = map_tokio_rusqlite_error(tokio_rusqlite::Error::ConnectionClosed, "schema");
        assert!(matches!(result, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_other_errors_map_to_query_failed() {
        let result = map_rusqlite_error(&rusqlite::Error::InvalidQuery, "Placeholder");
        assert!(matches!(result, RepositoryError::QueryFailed(_)));
    }
}
