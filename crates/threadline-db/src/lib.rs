//! # threadline-db
//!
//! PostgreSQL storage layer for threadline.
//!
//! This crate provides:
//! - Connection pool management and environment configuration
//! - The node store with recursive subtree and descendant-count queries
//! - Snapshot-consistent root pagination
//! - The principal registry referenced by node owners
//! - Translation of integrity violations into domain errors
//! - Demo data seeding and the `threadline-fixtures` binary
//!
//! ## Example
//!
//! ```rust,ignore
//! use threadline_db::{PageRequest, PrincipalRepository, Store, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::from_config(&StoreConfig::from_env()?).await?;
//!     store.migrate().await?;
//!
//!     let alice = store.principals.create_principal("alice").await?.principal();
//!     let service = store.node_service();
//!     let post = service.create_root(&alice, "Hello").await?;
//!     service.create_descendant(&alice, "First!", post.id).await?;
//!
//!     let tree = service.get_tree(post.id).await?;
//!     println!("{} comments", tree.comments_count);
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod integrity;
pub mod listing;
pub mod logging;
pub mod nodes;
pub mod pool;
pub mod principals;
pub mod seed;
pub mod unit_of_work;

// Test fixtures for integration tests
#[cfg(feature = "migrations")]
pub mod test_fixtures;

// Re-export core types
pub use threadline_core::*;

pub use config::StoreConfig;
pub use listing::RootListing;
pub use nodes::PgNodeRepository;
pub use pool::{
    create_pool, create_pool_with_config, create_pool_with_connect_options, log_pool_metrics,
    PoolConfig,
};
pub use principals::PgPrincipalRepository;
pub use seed::{SeedPlan, SeedReport};
pub use unit_of_work::{AccessMode, IsolationLevel, UnitOfWork};

/// Combined store context with all repositories.
#[derive(Clone)]
pub struct Store {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Node repository (posts and comments).
    pub nodes: PgNodeRepository,
    /// Principal registry.
    pub principals: PgPrincipalRepository,
    /// Root listing coordinator.
    pub listing: RootListing,
}

impl Store {
    /// Create a new Store from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            nodes: PgNodeRepository::new(pool.clone()),
            principals: PgPrincipalRepository::new(pool.clone()),
            listing: RootListing::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Store by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Connect using a loaded [`StoreConfig`].
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        Self::connect_with_config(&config.database_url, config.pool.clone()).await
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Transaction source for composing `_tx` calls.
    pub fn unit_of_work(&self) -> UnitOfWork {
        UnitOfWork::new(self.pool.clone())
    }

    /// Service facade over the node store.
    pub fn node_service(&self) -> NodeService<PgNodeRepository> {
        NodeService::new(self.nodes.clone())
    }
}
