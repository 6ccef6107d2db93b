//! Typed failures surfaced by the storage core.
//!
//! The core never recovers from a failed lookup or a violated invariant;
//! every failure is raised outward as a [`StoreError`]. The route layer owns
//! the mapping to HTTP status codes and reads [`StoreError::kind`] for it.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Postgres SQLSTATE for a unique-constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("Duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hash error: {0}")]
    Hash(String),
}

/// Stable tag for each error condition.
///
/// Consumed by callers that translate failures into transport-level codes;
/// the core itself never encodes HTTP semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    InvalidUpdate,
    Unauthorized,
    Forbidden,
    Internal,
}

impl StoreError {
    /// Stable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Duplicate { .. } => ErrorKind::Duplicate,
            StoreError::InvalidUpdate(_) => ErrorKind::InvalidUpdate,
            StoreError::Unauthorized(_) => ErrorKind::Unauthorized,
            StoreError::Forbidden(_) => ErrorKind::Forbidden,
            StoreError::Database(_) | StoreError::Hash(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.to_string(),
        }
    }
}

/// True when the error is a Postgres unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// Translate an insert failure, turning a unique-constraint violation into
/// [`StoreError::Duplicate`].
///
/// The uniqueness constraint in the store is the source of truth for
/// duplicate detection; existence pre-checks only produce friendlier
/// messages and lose races.
pub(crate) fn map_insert_err(err: sqlx::Error, entity: &'static str, key: impl ToString) -> StoreError {
    if is_unique_violation(&err) {
        StoreError::duplicate(entity, key)
    } else {
        StoreError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_are_stable() {
        assert_eq!(
            StoreError::not_found("user", "u1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::duplicate("cart", "u1").kind(),
            ErrorKind::Duplicate
        );
        assert_eq!(
            StoreError::InvalidUpdate("empty".into()).kind(),
            ErrorKind::InvalidUpdate
        );
        assert_eq!(
            StoreError::Unauthorized("bad password".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            StoreError::Forbidden("admin only".into()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            StoreError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_carry_entity_and_key() {
        let err = StoreError::not_found("product", 42);
        assert_eq!(err.to_string(), "product not found: 42");

        let err = StoreError::duplicate("user", "u1");
        assert_eq!(err.to_string(), "Duplicate user: u1");
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn test_map_insert_err_passes_through_other_errors() {
        let mapped = map_insert_err(sqlx::Error::RowNotFound, "user", "u1");
        assert!(matches!(mapped, StoreError::Database(_)));
    }
}
