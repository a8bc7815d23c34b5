//! Ownership and cycle guards.
//!
//! Both guards are pure checks over data the store has already returned.
//! Every store implementation calls them at the same points, so the rules
//! are identical whether the backing store is PostgreSQL or in memory.

use crate::error::{Error, Result};
use crate::models::{Node, NodeId, Principal};

/// Mutation being authorized, used in the `Forbidden` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    fn as_str(self) -> &'static str {
        match self {
            Mutation::Update => "update",
            Mutation::Delete => "delete",
        }
    }
}

/// Authorize `principal` to mutate the node fetched for `id`.
///
/// The node must be fetched first: a filtered `UPDATE ... WHERE owner_id = ?`
/// that touches zero rows cannot tell a missing node from a foreign one,
/// and callers must answer those two cases differently.
pub fn authorize_mutation(
    principal: &Principal,
    id: NodeId,
    node: Option<Node>,
    mutation: Mutation,
) -> Result<Node> {
    let node = node.ok_or(Error::NodeNotFound(id))?;
    if !node.is_owned_by(principal) {
        return Err(Error::Forbidden(format!(
            "only the owner may {} node {}",
            mutation.as_str(),
            id
        )));
    }
    Ok(node)
}

/// Reject a freshly assigned id that equals the declared parent.
///
/// The surrogate id is only known once the row is inserted, so this runs
/// after the insert and inside the same transaction; on error the store
/// removes the row before anything becomes visible.
pub fn ensure_not_self_parent(id: NodeId, parent_id: Option<NodeId>) -> Result<()> {
    match parent_id {
        Some(parent) if parent == id => Err(Error::InvalidParent(parent)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn node_owned_by(owner_id: i64) -> Node {
        let now = Utc::now();
        Node {
            id: 10,
            owner_id,
            text: "text".to_string(),
            parent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_missing_node_is_not_found() {
        let err = authorize_mutation(&Principal::new(1), 10, None, Mutation::Update).unwrap_err();
        assert!(matches!(err, Error::NodeNotFound(10)));
    }

    #[test]
    fn test_foreign_node_is_forbidden() {
        let err = authorize_mutation(
            &Principal::new(2),
            10,
            Some(node_owned_by(1)),
            Mutation::Delete,
        )
        .unwrap_err();
        match err {
            Error::Forbidden(msg) => assert_eq!(msg, "only the owner may delete node 10"),
            other => panic!("Expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_owner_is_allowed() {
        let node = authorize_mutation(
            &Principal::new(1),
            10,
            Some(node_owned_by(1)),
            Mutation::Update,
        )
        .unwrap();
        assert_eq!(node.id, 10);
    }

    #[test]
    fn test_self_parent_is_rejected() {
        assert!(matches!(
            ensure_not_self_parent(5, Some(5)),
            Err(Error::InvalidParent(5))
        ));
    }

    #[test]
    fn test_other_parent_or_root_is_accepted() {
        assert!(ensure_not_self_parent(5, Some(4)).is_ok());
        assert!(ensure_not_self_parent(5, None).is_ok());
    }
}
