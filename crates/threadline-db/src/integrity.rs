//! Translation of PostgreSQL integrity violations into domain errors.
//!
//! The schema names every constraint, so a violation is identified by its
//! SQLSTATE class plus the constraint name rather than by message text.

use sqlx::error::DatabaseError;

use threadline_core::{Error, NodeId, PrincipalId};

pub const SQLSTATE_FOREIGN_KEY_VIOLATION: &str = "23503";
pub const SQLSTATE_CHECK_VIOLATION: &str = "23514";
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

pub const NODE_PARENT_FKEY: &str = "node_parent_id_fkey";
pub const NODE_OWNER_FKEY: &str = "node_owner_id_fkey";
pub const NODE_PARENT_NOT_SELF: &str = "ck_node_parent_not_self";
pub const PRINCIPAL_USERNAME_KEY: &str = "principal_username_key";

/// A recognised constraint violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `node.parent_id` does not reference an existing node.
    ParentReference,
    /// `node.owner_id` does not reference, or still references, a principal.
    OwnerReference,
    /// A node declared itself as its parent.
    SelfParent,
    /// Username already taken.
    DuplicateUsername,
}

/// Classify a SQLSTATE and constraint name pair.
pub fn classify(code: &str, constraint: Option<&str>) -> Option<Violation> {
    match (code, constraint?) {
        (SQLSTATE_FOREIGN_KEY_VIOLATION, NODE_PARENT_FKEY) => Some(Violation::ParentReference),
        (SQLSTATE_FOREIGN_KEY_VIOLATION, NODE_OWNER_FKEY) => Some(Violation::OwnerReference),
        (SQLSTATE_CHECK_VIOLATION, NODE_PARENT_NOT_SELF) => Some(Violation::SelfParent),
        (SQLSTATE_UNIQUE_VIOLATION, PRINCIPAL_USERNAME_KEY) => Some(Violation::DuplicateUsername),
        _ => None,
    }
}

/// Classify a driver error, if it is a recognised violation.
pub fn violation(err: &sqlx::Error) -> Option<Violation> {
    match err {
        sqlx::Error::Database(db_err) => classify_database_error(&**db_err),
        _ => None,
    }
}

fn classify_database_error(db_err: &dyn DatabaseError) -> Option<Violation> {
    let code = db_err.code()?;
    classify(&code, db_err.constraint())
}

/// Map an error raised while inserting a node.
pub fn node_insert_error(
    err: sqlx::Error,
    owner_id: PrincipalId,
    parent_id: Option<NodeId>,
) -> Error {
    match (violation(&err), parent_id) {
        (Some(Violation::ParentReference | Violation::SelfParent), Some(parent)) => {
            Error::InvalidParent(parent)
        }
        (Some(Violation::OwnerReference), _) => Error::PrincipalNotFound(owner_id),
        _ => Error::Database(err),
    }
}

/// Map an error raised while inserting a principal.
pub fn principal_insert_error(err: sqlx::Error, username: &str) -> Error {
    match violation(&err) {
        Some(Violation::DuplicateUsername) => {
            Error::Conflict(format!("username '{}' is already taken", username))
        }
        _ => Error::Database(err),
    }
}

/// Map an error raised while deleting a principal.
pub fn principal_delete_error(err: sqlx::Error, id: PrincipalId) -> Error {
    match violation(&err) {
        Some(Violation::OwnerReference) => Error::OwnerHasNodes(id),
        _ => Error::Database(err),
    }
}
