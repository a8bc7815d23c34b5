//! In-memory store for deterministic testing.
//!
//! Implements [`NodeRepository`] and [`PrincipalRepository`] with the same
//! observable rules as the PostgreSQL store: referential checks on parent and
//! owner, the self-parent guard with compensation, cascade delete, restricted
//! principal delete, and newest-first ordering. A single mutex around the
//! whole state gives every call a consistent snapshot.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use threadline_core::mock::MemoryStore;
//! use threadline_core::{NodeService, PrincipalRepository};
//!
//! # async fn demo() -> threadline_core::Result<()> {
//! let store = MemoryStore::new();
//! let alice = store.create_principal("alice").await?.principal();
//! let service = NodeService::new(store);
//! let post = service.create_root(&alice, "hello").await?;
//! assert!(post.is_root());
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::error::{Error, Result};
use crate::guard::ensure_not_self_parent;
use crate::models::{Node, NodeId, NodeSummary, Owner, PrincipalId, SubtreeRow, User};
use crate::pagination::{Page, PageRequest};
use crate::traits::{NodeRepository, PrincipalRepository};

#[derive(Debug, Default)]
struct State {
    next_node_id: NodeId,
    next_principal_id: PrincipalId,
    nodes: BTreeMap<NodeId, Node>,
    users: BTreeMap<PrincipalId, User>,
    last_tick: Option<DateTime<Utc>>,
}

impl State {
    /// Strictly increasing clock so ordering and `updated_at` checks are stable.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let now = match self.last_tick {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(now);
        now
    }

    fn owner(&self, id: PrincipalId) -> Owner {
        Owner {
            id,
            username: self
                .users
                .get(&id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }

    /// Ids of `root` and all transitive descendants, parents before children.
    fn closure(&self, root: NodeId) -> Vec<NodeId> {
        if !self.nodes.contains_key(&root) {
            return Vec::new();
        }
        let mut members = vec![root];
        let mut frontier: HashSet<NodeId> = HashSet::from([root]);
        while !frontier.is_empty() {
            let next: Vec<NodeId> = self
                .nodes
                .values()
                .filter(|n| n.parent_id.is_some_and(|p| frontier.contains(&p)))
                .map(|n| n.id)
                .collect();
            members.extend(&next);
            frontier = next.into_iter().collect();
        }
        members
    }
}

/// Shared in-memory store; clones observe the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                next_node_id: 1,
                next_principal_id: 1,
                ..State::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock only happens inside a failing test.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of stored nodes.
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    /// The id the next successful or failed insert will consume.
    pub fn peek_next_node_id(&self) -> NodeId {
        self.lock().next_node_id
    }
}

#[async_trait]
impl NodeRepository for MemoryStore {
    async fn create(
        &self,
        owner_id: PrincipalId,
        text: &str,
        parent_id: Option<NodeId>,
    ) -> Result<Node> {
        let mut state = self.lock();
        if !state.users.contains_key(&owner_id) {
            return Err(Error::PrincipalNotFound(owner_id));
        }

        // Ids are consumed even by failed inserts, like a sequence.
        let id = state.next_node_id;
        state.next_node_id += 1;

        // A row may reference itself and still satisfy the foreign key.
        if let Some(parent) = parent_id {
            if parent != id && !state.nodes.contains_key(&parent) {
                return Err(Error::InvalidParent(parent));
            }
        }

        let now = state.tick();
        let node = Node {
            id,
            owner_id,
            text: text.to_string(),
            parent_id,
            created_at: now,
            updated_at: now,
        };
        state.nodes.insert(id, node.clone());

        if let Err(e) = ensure_not_self_parent(id, parent_id) {
            state.nodes.remove(&id);
            warn!(
                subsystem = "core",
                component = "memory_store",
                op = "create",
                node_id = id,
                "Removed self-parented node"
            );
            return Err(e);
        }
        Ok(node)
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        Ok(self.lock().nodes.get(&id).cloned())
    }

    async fn list_roots(&self, page: PageRequest) -> Result<Page<NodeSummary>> {
        let state = self.lock();
        let mut roots: Vec<&Node> = state.nodes.values().filter(|n| n.is_root()).collect();
        roots.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let total = roots.len() as i64;

        let items = roots
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|n| NodeSummary {
                id: n.id,
                text: n.text.clone(),
                created_at: n.created_at,
                owner: state.owner(n.owner_id),
                comments_count: state.closure(n.id).len() as i64 - 1,
            })
            .collect();
        Ok(page.paginate(items, total))
    }

    async fn subtree(&self, root_id: NodeId) -> Result<Vec<SubtreeRow>> {
        let state = self.lock();
        Ok(state
            .closure(root_id)
            .into_iter()
            .filter_map(|id| state.nodes.get(&id))
            .map(|n| SubtreeRow {
                id: n.id,
                parent_id: n.parent_id,
                text: n.text.clone(),
                owner: state.owner(n.owner_id),
                created_at: n.created_at,
            })
            .collect())
    }

    async fn update_text(
        &self,
        id: NodeId,
        owner_id: PrincipalId,
        text: &str,
    ) -> Result<Option<Node>> {
        let mut state = self.lock();
        let now = state.tick();
        Ok(state
            .nodes
            .get_mut(&id)
            .filter(|n| n.owner_id == owner_id)
            .map(|n| {
                n.text = text.to_string();
                n.updated_at = now;
                n.clone()
            }))
    }

    async fn delete(&self, id: NodeId) -> Result<u64> {
        let mut state = self.lock();
        let doomed = state.closure(id);
        for node_id in &doomed {
            state.nodes.remove(node_id);
        }
        Ok(doomed.len() as u64)
    }
}

#[async_trait]
impl PrincipalRepository for MemoryStore {
    async fn create_principal(&self, username: &str) -> Result<User> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username == username) {
            return Err(Error::Conflict(format!(
                "username '{}' is already taken",
                username
            )));
        }
        let id = state.next_principal_id;
        state.next_principal_id += 1;
        let now = state.tick();
        let user = User {
            id,
            username: username.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_principal(&self, id: PrincipalId) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn delete_principal(&self, id: PrincipalId) -> Result<()> {
        let mut state = self.lock();
        if !state.users.contains_key(&id) {
            return Err(Error::NotFound(format!("Principal {} not found", id)));
        }
        if state.nodes.values().any(|n| n.owner_id == id) {
            return Err(Error::OwnerHasNodes(id));
        }
        state.users.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();
        let user = store.create_principal("alice").await.unwrap();
        assert!(other.get_principal(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let store = MemoryStore::new();
        store.create_principal("alice").await.unwrap();
        let err = store.create_principal("alice").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_principal_with_nodes_cannot_be_deleted() {
        let store = MemoryStore::new();
        let user = store.create_principal("alice").await.unwrap();
        let node = store.create(user.id, "post", None).await.unwrap();

        let err = store.delete_principal(user.id).await.unwrap_err();
        assert!(matches!(err, Error::OwnerHasNodes(id) if id == user.id));

        store.delete(node.id).await.unwrap();
        store.delete_principal(user.id).await.unwrap();
        assert!(store.get_principal(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_principal() {
        let store = MemoryStore::new();
        let err = store.delete_principal(5).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_insert_consumes_id() {
        let store = MemoryStore::new();
        let user = store.create_principal("alice").await.unwrap();
        let _ = store.create(user.id, "bad", Some(42)).await;
        let node = store.create(user.id, "good", None).await.unwrap();
        assert_eq!(node.id, 2);
    }

    #[tokio::test]
    async fn test_update_with_wrong_owner_returns_none() {
        let store = MemoryStore::new();
        let alice = store.create_principal("alice").await.unwrap();
        let bob = store.create_principal("bob").await.unwrap();
        let node = store.create(alice.id, "text", None).await.unwrap();

        assert!(store.update_text(node.id, bob.id, "x").await.unwrap().is_none());
        assert!(store.update_text(999, alice.id, "x").await.unwrap().is_none());
        assert!(store.update_text(node.id, alice.id, "x").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_reports_removed_count() {
        let store = MemoryStore::new();
        let user = store.create_principal("alice").await.unwrap();
        let root = store.create(user.id, "root", None).await.unwrap();
        let child = store.create(user.id, "child", Some(root.id)).await.unwrap();
        store.create(user.id, "grandchild", Some(child.id)).await.unwrap();

        assert_eq!(store.delete(root.id).await.unwrap(), 3);
        assert_eq!(store.delete(root.id).await.unwrap(), 0);
        assert_eq!(store.node_count(), 0);
    }
}
