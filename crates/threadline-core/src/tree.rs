//! Reconstruction of a nested thread from a flat subtree closure.
//!
//! The store returns a node and all of its transitive descendants as flat
//! rows. [`build_tree`] turns those rows into an immutable nested view. It
//! never touches storage, so the persisted representation stays a flat
//! arena keyed by id and no in-memory parent/child pointer cycles can form.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::models::{CommentTree, NodeId, NodeWithDescendants, SubtreeRow};

/// Newest first; id breaks ties between rows created in the same instant.
fn newest_first(a: &SubtreeRow, b: &SubtreeRow) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Build the nested tree rooted at `root_id`.
///
/// Every row other than the root must have a `parent_id` pointing at the root
/// or at another row in `rows`. Rows are grouped by parent once, so the
/// build is `O(n log n)` (sorting dominates). Each parent bucket is consumed
/// when it is attached, so a row can never appear twice in the output even
/// if the input contains duplicate edges. Rows sharing an id are collapsed
/// to the first occurrence.
///
/// Returns `None` when no row carries `root_id`; the caller turns that into
/// a not-found response.
pub fn build_tree(root_id: NodeId, rows: Vec<SubtreeRow>) -> Option<NodeWithDescendants> {
    let mut seen = HashSet::with_capacity(rows.len());
    let rows: Vec<SubtreeRow> = rows.into_iter().filter(|r| seen.insert(r.id)).collect();
    let comments_count = rows.len().saturating_sub(1) as i64;

    let mut root = None;
    let mut children: HashMap<NodeId, Vec<SubtreeRow>> = HashMap::new();
    for row in rows {
        if row.id == root_id {
            root = Some(row);
        } else if let Some(parent_id) = row.parent_id {
            children.entry(parent_id).or_default().push(row);
        }
    }
    let root = root?;

    for bucket in children.values_mut() {
        bucket.sort_by(newest_first);
    }

    // Breadth-first walk from the root. Each visited row records the ids of
    // its (already ordered) children so the tree can be assembled bottom-up
    // without recursion; deep threads cannot exhaust the stack.
    let root_children = children.remove(&root.id).unwrap_or_default();
    let root_child_ids: Vec<NodeId> = root_children.iter().map(|r| r.id).collect();

    let mut queue: VecDeque<SubtreeRow> = root_children.into();
    let mut visited: Vec<(SubtreeRow, Vec<NodeId>)> = Vec::new();
    while let Some(row) = queue.pop_front() {
        let kids = children.remove(&row.id).unwrap_or_default();
        let kid_ids = kids.iter().map(|k| k.id).collect();
        queue.extend(kids);
        visited.push((row, kid_ids));
    }

    if !children.is_empty() {
        debug!(
            subsystem = "core",
            component = "tree_builder",
            root_id,
            unattached = children.values().map(Vec::len).sum::<usize>(),
            "Rows not reachable from root were skipped"
        );
    }

    // Reverse BFS order guarantees every child is built before its parent.
    let mut built: HashMap<NodeId, CommentTree> = HashMap::with_capacity(visited.len());
    for (row, kid_ids) in visited.into_iter().rev() {
        let comments = kid_ids
            .iter()
            .filter_map(|id| built.remove(id))
            .collect();
        built.insert(
            row.id,
            CommentTree {
                id: row.id,
                text: row.text,
                created_at: row.created_at,
                owner: row.owner,
                comments,
            },
        );
    }

    let comments = root_child_ids
        .iter()
        .filter_map(|id| built.remove(id))
        .collect();

    Some(NodeWithDescendants {
        id: root.id,
        text: root.text,
        created_at: root.created_at,
        owner: root.owner,
        comments_count,
        comments,
    })
}
