//! Principal registry and fixture seeding against PostgreSQL.

use rand::rngs::StdRng;
use rand::SeedableRng;

use threadline_db::seed::{seed, SeedPlan};
use threadline_db::test_fixtures::TestDatabase;
use threadline_db::{Error, NodeRepository, PageRequest, PrincipalRepository};

#[tokio::test]
#[ignore] // Requires database connection
async fn test_duplicate_username_is_conflict() {
    let db = TestDatabase::new().await;
    let principals = &db.store.principals;

    let alice = principals.create_principal("alice").await.unwrap();
    assert_eq!(alice.created_at, alice.updated_at);

    let err = principals.create_principal("alice").await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let fetched = principals.get_principal(alice.id).await.unwrap().unwrap();
    assert_eq!(fetched, alice);

    db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_principal_owning_nodes_cannot_be_deleted() {
    let db = TestDatabase::new().await;
    let alice = db.principal("alice").await;
    let post = db.store.nodes.create(alice.id, "mine", None).await.unwrap();

    let err = db.store.principals.delete_principal(alice.id).await.unwrap_err();
    assert!(matches!(err, Error::OwnerHasNodes(id) if id == alice.id));
    assert_eq!(db.node_count().await, 1);

    db.store.nodes.delete(post.id).await.unwrap();
    db.store.principals.delete_principal(alice.id).await.unwrap();
    assert!(db
        .store
        .principals
        .get_principal(alice.id)
        .await
        .unwrap()
        .is_none());

    let err = db.store.principals.delete_principal(alice.id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_seed_builds_levelled_threads() {
    let db = TestDatabase::new().await;
    let plan = SeedPlan {
        users: 3,
        roots: 2,
        levels: 2,
        comments_per_level: 4,
    };
    let mut rng = StdRng::seed_from_u64(42);

    let report = seed(&db.store, &plan, "user", &mut rng).await.unwrap();

    assert_eq!(report.principals.len(), 3);
    assert_eq!(report.node_count(), plan.node_count());
    assert_eq!(db.node_count().await, 10);

    for id in &report.levels[1] {
        let node = db.store.nodes.get(*id).await.unwrap().unwrap();
        let parent = node.parent_id.unwrap();
        assert!(report.levels[0].contains(&parent));
    }

    let page = db
        .store
        .node_service()
        .list_roots(PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    let counted: i64 = page.items.iter().map(|n| n.comments_count).sum();
    assert_eq!(counted, 8);

    db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires database connection
async fn test_failed_seed_writes_nothing() {
    let db = TestDatabase::new().await;
    db.principal("user_1").await;
    let mut rng = StdRng::seed_from_u64(1);

    let err = seed(&db.store, &SeedPlan::default(), "user", &mut rng)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(db.node_count().await, 0);

    db.cleanup().await;
}
