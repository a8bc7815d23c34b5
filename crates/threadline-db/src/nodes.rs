//! Node repository implementation.
//!
//! Posts and comments share the `node` table; a comment is any node with a
//! `parent_id`. Hierarchical reads use recursive CTEs so that a whole subtree
//! or a whole page of descendant counts comes back from one statement.

use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::{debug, warn};

use threadline_core::{
    ensure_not_self_parent, Error, Node, NodeId, NodeRepository, NodeSummary, Owner, Page,
    PageRequest, PrincipalId, Result, SubtreeRow,
};

use crate::integrity;
use crate::listing::RootListing;

const NODE_COLUMNS: &str = "id, owner_id, text, parent_id, created_at, updated_at";

/// Roots of one page, each with its transitive descendant count.
const LIST_ROOTS_SQL: &str = r#"
    WITH RECURSIVE page AS (
        SELECT id, text, created_at, owner_id
        FROM node
        WHERE parent_id IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
    ),
    descendants AS (
        SELECT c.id, p.id AS root_id
        FROM node c
        JOIN page p ON c.parent_id = p.id
        UNION ALL
        SELECT c.id, d.root_id
        FROM node c
        JOIN descendants d ON c.parent_id = d.id
    ),
    counts AS (
        SELECT root_id, COUNT(*) AS n
        FROM descendants
        GROUP BY root_id
    )
    SELECT p.id, p.text, p.created_at, p.owner_id, u.username,
           COALESCE(counts.n, 0) AS comments_count
    FROM page p
    JOIN principal u ON u.id = p.owner_id
    LEFT JOIN counts ON counts.root_id = p.id
    ORDER BY p.created_at DESC, p.id DESC
"#;

/// A node and all of its transitive descendants, flat.
const SUBTREE_SQL: &str = r#"
    WITH RECURSIVE subtree AS (
        SELECT id FROM node WHERE id = $1
        UNION ALL
        SELECT c.id
        FROM node c
        JOIN subtree s ON c.parent_id = s.id
    )
    SELECT n.id, n.parent_id, n.text, n.created_at, n.owner_id, u.username
    FROM subtree s
    JOIN node n ON n.id = s.id
    JOIN principal u ON u.id = n.owner_id
"#;

/// Delete a node together with its subtree; one row affected per node.
const DELETE_SUBTREE_SQL: &str = r#"
    WITH RECURSIVE subtree AS (
        SELECT id FROM node WHERE id = $1
        UNION ALL
        SELECT c.id
        FROM node c
        JOIN subtree s ON c.parent_id = s.id
    )
    DELETE FROM node
    WHERE id IN (SELECT id FROM subtree)
"#;

fn node_from_row(r: &PgRow) -> Node {
    Node {
        id: r.get("id"),
        owner_id: r.get("owner_id"),
        text: r.get("text"),
        parent_id: r.get("parent_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// PostgreSQL implementation of NodeRepository.
#[derive(Clone)]
pub struct PgNodeRepository {
    pool: Pool<Postgres>,
}

impl PgNodeRepository {
    /// Create a new PgNodeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NodeRepository for PgNodeRepository {
    async fn create(
        &self,
        owner_id: PrincipalId,
        text: &str,
        parent_id: Option<NodeId>,
    ) -> Result<Node> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let node = self.create_tx(&mut tx, owner_id, text, parent_id).await?;
        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "nodes",
            op = "create",
            node_id = node.id,
            parent_id = ?node.parent_id,
            principal_id = owner_id,
            "Node created"
        );
        Ok(node)
    }

    async fn get(&self, id: NodeId) -> Result<Option<Node>> {
        let row = sqlx::query(&format!("SELECT {} FROM node WHERE id = $1", NODE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(node_from_row))
    }

    async fn list_roots(&self, page: PageRequest) -> Result<Page<NodeSummary>> {
        RootListing::new(self.pool.clone()).paginate(page).await
    }

    async fn subtree(&self, root_id: NodeId) -> Result<Vec<SubtreeRow>> {
        // One statement, so the closure is read from a single snapshot.
        let mut conn = self.pool.acquire().await.map_err(Error::Database)?;
        subtree_on(&mut conn, root_id).await
    }

    async fn update_text(
        &self,
        id: NodeId,
        owner_id: PrincipalId,
        text: &str,
    ) -> Result<Option<Node>> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "UPDATE node SET text = $1, updated_at = $2
             WHERE id = $3 AND owner_id = $4
             RETURNING {}",
            NODE_COLUMNS
        ))
        .bind(text)
        .bind(now)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "nodes",
            op = "update_text",
            node_id = id,
            principal_id = owner_id,
            updated = row.is_some(),
            "Node text update"
        );
        Ok(row.as_ref().map(node_from_row))
    }

    async fn delete(&self, id: NodeId) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let removed = self.delete_tx(&mut tx, id).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(removed)
    }
}

async fn subtree_on(conn: &mut sqlx::PgConnection, root_id: NodeId) -> Result<Vec<SubtreeRow>> {
    let start = Instant::now();
    let rows = sqlx::query(SUBTREE_SQL)
        .bind(root_id)
        .fetch_all(conn)
        .await
        .map_err(Error::Database)?;

    debug!(
        subsystem = "database",
        component = "nodes",
        op = "subtree",
        node_id = root_id,
        result_count = rows.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Subtree fetched"
    );

    Ok(rows
        .into_iter()
        .map(|r| SubtreeRow {
            id: r.get("id"),
            parent_id: r.get("parent_id"),
            text: r.get("text"),
            owner: Owner {
                id: r.get("owner_id"),
                username: r.get("username"),
            },
            created_at: r.get("created_at"),
        })
        .collect())
}

/// Transaction-aware variants for composing several calls into one unit of work.
impl PgNodeRepository {
    /// Insert a node within an existing transaction.
    ///
    /// On a self-parent the inserted row is removed again before returning
    /// `InvalidParent`; the caller should then drop the transaction.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: PrincipalId,
        text: &str,
        parent_id: Option<NodeId>,
    ) -> Result<Node> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO node (owner_id, text, parent_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING {}",
            NODE_COLUMNS
        ))
        .bind(owner_id)
        .bind(text)
        .bind(parent_id)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| integrity::node_insert_error(e, owner_id, parent_id))?;

        let node = node_from_row(&row);

        if let Err(e) = ensure_not_self_parent(node.id, node.parent_id) {
            sqlx::query("DELETE FROM node WHERE id = $1")
                .bind(node.id)
                .execute(&mut **tx)
                .await
                .map_err(Error::Database)?;
            warn!(
                subsystem = "database",
                component = "nodes",
                op = "create",
                node_id = node.id,
                "Removed self-parented node"
            );
            return Err(e);
        }

        Ok(node)
    }

    /// Get a node by ID within an existing transaction.
    pub async fn get_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: NodeId,
    ) -> Result<Option<Node>> {
        let row = sqlx::query(&format!("SELECT {} FROM node WHERE id = $1", NODE_COLUMNS))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(node_from_row))
    }

    /// Fetch a subtree within an existing transaction.
    pub async fn subtree_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        root_id: NodeId,
    ) -> Result<Vec<SubtreeRow>> {
        subtree_on(&mut **tx, root_id).await
    }

    /// Count root nodes within an existing transaction.
    pub async fn count_roots_tx(&self, tx: &mut Transaction<'_, Postgres>) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM node WHERE parent_id IS NULL")
            .fetch_one(&mut **tx)
            .await
            .map_err(Error::Database)
    }

    /// List one page of roots within an existing transaction.
    pub async fn list_roots_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        page: &PageRequest,
    ) -> Result<Vec<NodeSummary>> {
        let rows = sqlx::query(LIST_ROOTS_SQL)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut **tx)
            .await
            .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|r| NodeSummary {
                id: r.get("id"),
                text: r.get("text"),
                created_at: r.get("created_at"),
                owner: Owner {
                    id: r.get("owner_id"),
                    username: r.get("username"),
                },
                comments_count: r.get("comments_count"),
            })
            .collect())
    }

    /// Delete a node and its subtree within an existing transaction.
    ///
    /// Returns the number of nodes removed.
    pub async fn delete_tx(&self, tx: &mut Transaction<'_, Postgres>, id: NodeId) -> Result<u64> {
        let result = sqlx::query(DELETE_SUBTREE_SQL)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        let removed = result.rows_affected();
        debug!(
            subsystem = "database",
            component = "nodes",
            op = "delete",
            node_id = id,
            result_count = removed,
            "Subtree deleted"
        );
        Ok(removed)
    }
}
