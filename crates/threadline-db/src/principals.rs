//! Principal repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::info;

use threadline_core::{Error, PrincipalId, PrincipalRepository, Result, User};

use crate::integrity;

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        username: r.get("username"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

/// PostgreSQL implementation of PrincipalRepository.
#[derive(Clone)]
pub struct PgPrincipalRepository {
    pool: Pool<Postgres>,
}

impl PgPrincipalRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Register a principal within an existing transaction.
    pub async fn create_principal_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        username: &str,
    ) -> Result<User> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO principal (username, created_at, updated_at)
             VALUES ($1, $2, $2)
             RETURNING id, username, created_at, updated_at",
        )
        .bind(username)
        .bind(now)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| integrity::principal_insert_error(e, username))?;

        Ok(user_from_row(&row))
    }
}

#[async_trait]
impl PrincipalRepository for PgPrincipalRepository {
    async fn create_principal(&self, username: &str) -> Result<User> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let user = self.create_principal_tx(&mut tx, username).await?;
        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "principals",
            op = "create",
            principal_id = user.id,
            "Principal registered"
        );
        Ok(user)
    }

    async fn get_principal(&self, id: PrincipalId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, created_at, updated_at FROM principal WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn delete_principal(&self, id: PrincipalId) -> Result<()> {
        let result = sqlx::query("DELETE FROM principal WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| integrity::principal_delete_error(e, id))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Principal {} not found", id)));
        }

        info!(
            subsystem = "database",
            component = "principals",
            op = "delete",
            principal_id = id,
            "Principal removed"
        );
        Ok(())
    }
}
