//! Transactions with an explicit isolation level and access mode.
//!
//! Every store operation runs inside one transaction acquired here. Writes
//! use the server default (`READ COMMITTED, READ WRITE`); multi-statement
//! reads that must agree with each other use [`UnitOfWork::begin_snapshot`].
//!
//! # Examples
//!
//! ```rust,ignore
//! let uow = UnitOfWork::new(pool.clone());
//! let mut tx = uow.begin_snapshot().await?;
//! let total = nodes.count_roots_tx(&mut tx).await?;
//! let items = nodes.list_roots_tx(&mut tx, &page).await?;
//! tx.commit().await.map_err(Error::Database)?;
//! ```

use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use threadline_core::{Error, Result};

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    #[default]
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    pub fn as_sql(self) -> &'static str {
        match self {
            AccessMode::ReadWrite => "READ WRITE",
            AccessMode::ReadOnly => "READ ONLY",
        }
    }
}

/// `SET TRANSACTION` statement for the given characteristics.
///
/// Must be the first statement of the transaction.
pub fn set_transaction_sql(isolation: IsolationLevel, access: AccessMode) -> String {
    format!(
        "SET TRANSACTION ISOLATION LEVEL {}, {}",
        isolation.as_sql(),
        access.as_sql()
    )
}

/// Source of transactions for one pool.
#[derive(Clone)]
pub struct UnitOfWork {
    pool: PgPool,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction with the server defaults.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(Error::Database)
    }

    /// Begin a transaction with explicit characteristics.
    ///
    /// Dropping the returned transaction without committing rolls it back.
    pub async fn begin_with(
        &self,
        isolation: IsolationLevel,
        access: AccessMode,
    ) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // SET cannot take bind parameters; both parts come from fixed enums.
        sqlx::query(&set_transaction_sql(isolation, access))
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "unit_of_work",
            op = "begin",
            isolation = isolation.as_sql(),
            access = access.as_sql(),
            "Transaction started"
        );
        Ok(tx)
    }

    /// Read-only transaction whose statements all see one snapshot.
    pub async fn begin_snapshot(&self) -> Result<Transaction<'static, Postgres>> {
        self.begin_with(IsolationLevel::RepeatableRead, AccessMode::ReadOnly)
            .await
    }
}
