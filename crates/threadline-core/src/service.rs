//! Node service: the operations exposed to the routing layer.
//!
//! The service is generic over the store and takes the authenticated
//! [`Principal`] as an explicit argument on every call; there is no ambient
//! session or "current user" state.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::guard::{authorize_mutation, Mutation};
use crate::models::{Node, NodeId, NodeSummary, NodeWithDescendants, Principal};
use crate::pagination::{Page, PageRequest};
use crate::traits::NodeRepository;
use crate::tree::build_tree;

/// Posts, comments and threads on top of a [`NodeRepository`].
#[derive(Clone)]
pub struct NodeService<R> {
    repo: R,
}

impl<R: NodeRepository> NodeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Access the underlying store.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Create a top-level node.
    pub async fn create_root(&self, principal: &Principal, text: &str) -> Result<Node> {
        let node = self.repo.create(principal.id, text, None).await?;
        info!(
            subsystem = "core",
            component = "node_service",
            op = "create_root",
            node_id = node.id,
            principal_id = principal.id,
            "Root created"
        );
        Ok(node)
    }

    /// Create a node under `parent_id`.
    pub async fn create_descendant(
        &self,
        principal: &Principal,
        text: &str,
        parent_id: NodeId,
    ) -> Result<Node> {
        let node = self.repo.create(principal.id, text, Some(parent_id)).await?;
        info!(
            subsystem = "core",
            component = "node_service",
            op = "create_descendant",
            node_id = node.id,
            parent_id,
            principal_id = principal.id,
            "Descendant created"
        );
        Ok(node)
    }

    /// One page of roots with the total root count from the same snapshot.
    pub async fn list_roots(&self, page: PageRequest) -> Result<Page<NodeSummary>> {
        let listing = self.repo.list_roots(page).await?;
        debug!(
            subsystem = "core",
            component = "node_service",
            op = "list_roots",
            limit = listing.limit,
            offset = listing.offset,
            total = listing.total,
            result_count = listing.items.len(),
            "Roots listed"
        );
        Ok(listing)
    }

    /// A node with all of its descendants, nested newest-first.
    pub async fn get_tree(&self, root_id: NodeId) -> Result<NodeWithDescendants> {
        let rows = self.repo.subtree(root_id).await?;
        let row_count = rows.len();
        let tree = build_tree(root_id, rows).ok_or(Error::NodeNotFound(root_id))?;
        debug!(
            subsystem = "core",
            component = "node_service",
            op = "get_tree",
            node_id = root_id,
            result_count = row_count,
            "Tree rebuilt"
        );
        Ok(tree)
    }

    /// Replace the text of a node the principal owns.
    pub async fn update_node(
        &self,
        principal: &Principal,
        id: NodeId,
        text: &str,
    ) -> Result<Node> {
        let current = self.repo.get(id).await?;
        authorize_mutation(principal, id, current, Mutation::Update)?;

        // A concurrent delete between the guard and the write also lands here.
        let node = self
            .repo
            .update_text(id, principal.id, text)
            .await?
            .ok_or(Error::NodeNotFound(id))?;
        info!(
            subsystem = "core",
            component = "node_service",
            op = "update_node",
            node_id = id,
            principal_id = principal.id,
            "Node updated"
        );
        Ok(node)
    }

    /// Delete a node the principal owns, together with its descendants.
    pub async fn delete_node(&self, principal: &Principal, id: NodeId) -> Result<()> {
        let current = self.repo.get(id).await?;
        authorize_mutation(principal, id, current, Mutation::Delete)?;

        let removed = self.repo.delete(id).await?;
        if removed == 0 {
            return Err(Error::NodeNotFound(id));
        }
        info!(
            subsystem = "core",
            component = "node_service",
            op = "delete_node",
            node_id = id,
            principal_id = principal.id,
            removed,
            "Node deleted"
        );
        Ok(())
    }
}
