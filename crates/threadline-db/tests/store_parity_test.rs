//! The in-memory store and the PostgreSQL store answer the same thread the
//! same way: ordering, transitive counts, guards and cascade delete.

use threadline_core::mock::MemoryStore;
use threadline_db::test_fixtures::TestDatabase;
use threadline_db::{
    CommentTree, Error, NodeRepository, NodeService, PageRequest, Principal, PrincipalRepository,
};

#[derive(Debug, PartialEq, Eq)]
struct Outcome {
    errors: Vec<&'static str>,
    outline: Vec<String>,
    comments_count: i64,
    listing: Vec<(String, i64)>,
    total: i64,
}

fn kind(err: &Error) -> &'static str {
    match err {
        Error::InvalidParent(_) => "invalid_parent",
        Error::NodeNotFound(_) => "node_not_found",
        Error::Forbidden(_) => "forbidden",
        _ => "other",
    }
}

fn outline(comments: &[CommentTree], depth: usize, out: &mut Vec<String>) {
    for c in comments {
        out.push(format!("{}{} ({})", "  ".repeat(depth), c.text, c.owner.username));
        outline(&c.comments, depth + 1, out);
    }
}

async fn run_thread<R: NodeRepository>(
    service: &NodeService<R>,
    alice: &Principal,
    bob: &Principal,
) -> Outcome {
    let root = service.create_root(alice, "root").await.unwrap();
    let a = service.create_descendant(bob, "a", root.id).await.unwrap();
    let b = service.create_descendant(alice, "b", root.id).await.unwrap();
    service.create_descendant(alice, "a1", a.id).await.unwrap();
    service.create_descendant(bob, "a2", a.id).await.unwrap();
    service.create_descendant(bob, "b1", b.id).await.unwrap();
    let quiet = service.create_root(bob, "quiet").await.unwrap();

    let mut errors = Vec::new();
    let err = service
        .create_descendant(alice, "orphan", quiet.id + 1_000)
        .await
        .unwrap_err();
    errors.push(kind(&err));
    let err = service.update_node(bob, root.id, "taken").await.unwrap_err();
    errors.push(kind(&err));
    let err = service.delete_node(bob, b.id).await.unwrap_err();
    errors.push(kind(&err));

    service.delete_node(alice, b.id).await.unwrap();
    let err = service.get_tree(b.id).await.unwrap_err();
    errors.push(kind(&err));

    let tree = service.get_tree(root.id).await.unwrap();
    let mut lines = Vec::new();
    outline(&tree.comments, 0, &mut lines);

    let page = service.list_roots(PageRequest::default()).await.unwrap();

    Outcome {
        errors,
        outline: lines,
        comments_count: tree.comments_count,
        listing: page
            .items
            .into_iter()
            .map(|n| (n.text, n.comments_count))
            .collect(),
        total: page.total,
    }
}

async fn memory_outcome() -> Outcome {
    let store = MemoryStore::new();
    let alice = store.create_principal("alice").await.unwrap().principal();
    let bob = store.create_principal("bob").await.unwrap().principal();
    run_thread(&NodeService::new(store), &alice, &bob).await
}

#[tokio::test]
async fn test_memory_store_thread_outcome() {
    let outcome = memory_outcome().await;

    assert_eq!(
        outcome.errors,
        vec!["invalid_parent", "forbidden", "forbidden", "node_not_found"]
    );
    assert_eq!(outcome.outline, vec!["a (bob)", "  a2 (bob)", "  a1 (alice)"]);
    assert_eq!(outcome.comments_count, 3);
    assert_eq!(
        outcome.listing,
        vec![("quiet".to_string(), 0), ("root".to_string(), 3)]
    );
    assert_eq!(outcome.total, 2);
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_postgres_matches_memory_store() {
    let db = TestDatabase::new().await;
    let alice = db.principal("alice").await;
    let bob = db.principal("bob").await;

    let postgres = run_thread(&db.store.node_service(), &alice, &bob).await;

    assert_eq!(postgres, memory_outcome().await);

    db.cleanup().await;
}
