//! Core traits for threadline storage.
//!
//! These traits define the interfaces that concrete stores must satisfy,
//! enabling the PostgreSQL store and the in-memory test store to share the
//! service layer.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Node, NodeId, NodeSummary, PrincipalId, SubtreeRow, User};
use crate::pagination::{Page, PageRequest};

// =============================================================================
// NODE REPOSITORY
// =============================================================================

/// Repository for node storage and hierarchical reads.
#[async_trait]
pub trait NodeRepository: Send + Sync {
    /// Insert a node as one unit of work.
    ///
    /// Fails with `InvalidParent` when `parent_id` does not resolve or would
    /// make the node its own parent, and with `PrincipalNotFound` when the
    /// owner is unknown. Nothing is persisted on failure.
    async fn create(&self, owner_id: PrincipalId, text: &str, parent_id: Option<NodeId>)
        -> Result<Node>;

    /// Fetch a single node (root or descendant).
    async fn get(&self, id: NodeId) -> Result<Option<Node>>;

    /// List roots newest-first with transitive descendant counts.
    ///
    /// `total` and `items` must come from the same snapshot.
    async fn list_roots(&self, page: PageRequest) -> Result<Page<NodeSummary>>;

    /// Fetch `root_id` and every transitive descendant as flat rows.
    ///
    /// Empty when the node does not exist.
    async fn subtree(&self, root_id: NodeId) -> Result<Vec<SubtreeRow>>;

    /// Replace the text of a node owned by `owner_id`.
    ///
    /// `None` when no node matches both id and owner.
    async fn update_text(&self, id: NodeId, owner_id: PrincipalId, text: &str)
        -> Result<Option<Node>>;

    /// Delete a node and, by cascade, its whole subtree.
    ///
    /// Returns the number of nodes removed; 0 when the node did not exist.
    async fn delete(&self, id: NodeId) -> Result<u64>;
}

// =============================================================================
// PRINCIPAL REPOSITORY
// =============================================================================

/// Repository for principals referenced as node owners.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Register a principal. Duplicate usernames fail with `Conflict`.
    async fn create_principal(&self, username: &str) -> Result<User>;

    /// Fetch a principal by id.
    async fn get_principal(&self, id: PrincipalId) -> Result<Option<User>>;

    /// Remove a principal.
    ///
    /// Fails with `OwnerHasNodes` while the principal owns any node and with
    /// `NotFound` when it does not exist.
    async fn delete_principal(&self, id: PrincipalId) -> Result<()>;
}
