//! Core data models for threadline.
//!
//! A single persisted entity, [`Node`], represents both posts and comments.
//! Everything else in this module is either the caller identity
//! ([`Principal`], [`User`]) or a derived read view built from nodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate node identifier (`BIGSERIAL`).
pub type NodeId = i64;

/// Surrogate principal identifier (`BIGSERIAL`).
pub type PrincipalId = i64;

// =============================================================================
// NODE TYPES
// =============================================================================

/// A persisted node: a post when `parent_id` is `None`, a comment otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub owner_id: PrincipalId,
    pub text: String,
    /// Parent node (None = root)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Whether this node is a post or a comment, derived from `parent_id`.
    pub fn kind(&self) -> NodeKind {
        match self.parent_id {
            None => NodeKind::Root,
            Some(_) => NodeKind::Descendant,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_owned_by(&self, principal: &Principal) -> bool {
        self.owner_id == principal.id
    }
}

/// Role of a node in its hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level node ("post").
    #[serde(rename = "post")]
    Root,
    /// Node attached under another node ("comment").
    #[serde(rename = "comment")]
    Descendant,
}

// =============================================================================
// PRINCIPAL TYPES
// =============================================================================

/// The authenticated caller, as resolved by the external auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
}

impl Principal {
    pub fn new(id: PrincipalId) -> Self {
        Self { id }
    }
}

/// A registered principal. Credentials are held by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PrincipalId,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id)
    }
}

/// Author reference embedded in read views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: PrincipalId,
    pub username: String,
}

// =============================================================================
// READ VIEWS
// =============================================================================

/// Root listing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner: Owner,
    /// All transitive descendants, not only direct children
    pub comments_count: i64,
}

/// One row of a subtree closure, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeRow {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub text: String,
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
}

/// A descendant with its own nested descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTree {
    pub id: NodeId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner: Owner,
    /// Newest first
    pub comments: Vec<CommentTree>,
}

impl CommentTree {
    /// Number of nodes below this one.
    pub fn descendant_count(&self) -> usize {
        self.comments
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// A node together with its reconstructed descendant tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeWithDescendants {
    pub id: NodeId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub owner: Owner,
    /// All transitive descendants, matching [`NodeSummary::comments_count`]
    pub comments_count: i64,
    /// Newest first
    pub comments: Vec<CommentTree>,
}
