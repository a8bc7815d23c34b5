//! Error types for threadline.

use thiserror::Error;

use crate::models::{NodeId, PrincipalId};

/// Result type alias using threadline's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for threadline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Referenced parent does not exist, or the node would be its own parent
    #[error("Invalid parent: {0}")]
    InvalidParent(NodeId),

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Principal referenced as owner does not exist
    #[error("Principal not found: {0}")]
    PrincipalNotFound(PrincipalId),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Forbidden (authenticated but not the owner)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Principal still owns nodes and cannot be removed
    #[error("Principal {0} still owns nodes")]
    OwnerHasNodes(PrincipalId),

    /// Unique constraint collision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error is caused by the caller rather than the store.
    ///
    /// The routing layer maps these to 4xx responses; everything else is a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidParent(_)
                | Error::NodeNotFound(_)
                | Error::PrincipalNotFound(_)
                | Error::NotFound(_)
                | Error::Forbidden(_)
                | Error::OwnerHasNodes(_)
                | Error::Conflict(_)
                | Error::InvalidInput(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_parent() {
        let err = Error::InvalidParent(42);
        assert_eq!(err.to_string(), "Invalid parent: 42");
    }

    #[test]
    fn test_error_display_node_not_found() {
        let err = Error::NodeNotFound(7);
        assert_eq!(err.to_string(), "Node not found: 7");
    }

    #[test]
    fn test_error_display_principal_not_found() {
        let err = Error::PrincipalNotFound(3);
        assert_eq!(err.to_string(), "Principal not found: 3");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("only the owner may update node 5".to_string());
        assert_eq!(err.to_string(), "Forbidden: only the owner may update node 5");
    }

    #[test]
    fn test_error_display_owner_has_nodes() {
        let err = Error::OwnerHasNodes(9);
        assert_eq!(err.to_string(), "Principal 9 still owns nodes");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("limit must be at least 1".to_string());
        assert_eq!(err.to_string(), "Invalid input: limit must be at least 1");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("DATABASE_URL is not set".to_string());
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL is not set");
    }

    #[test]
    fn test_client_errors_are_distinguished_from_store_failures() {
        assert!(Error::InvalidParent(1).is_client_error());
        assert!(Error::NodeNotFound(1).is_client_error());
        assert!(Error::Forbidden("x".into()).is_client_error());
        assert!(Error::Conflict("x".into()).is_client_error());
        assert!(!Error::Internal("x".into()).is_client_error());
        assert!(!Error::Config("x".into()).is_client_error());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_client_error());
    }

    #[test]
    fn test_not_found_and_forbidden_are_distinct() {
        let missing = Error::NodeNotFound(1);
        let forbidden = Error::Forbidden("not owner".into());
        assert!(matches!(missing, Error::NodeNotFound(1)));
        assert!(!matches!(forbidden, Error::NodeNotFound(_)));
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::NodeNotFound(11);
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("NodeNotFound"));
    }
}
