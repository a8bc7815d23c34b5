//! Snapshot-consistent pagination of root nodes.
//!
//! The total count and the page of items are two statements. Running them in
//! one `REPEATABLE READ, READ ONLY` transaction makes both observe the same
//! snapshot, so a page can never disagree with its own `total` even while
//! roots are being created or deleted concurrently.

use std::time::Instant;

use sqlx::PgPool;
use tracing::debug;

use threadline_core::{Error, NodeSummary, Page, PageRequest, Result};

use crate::nodes::PgNodeRepository;
use crate::unit_of_work::UnitOfWork;

/// Paginates roots newest-first with transitive descendant counts.
#[derive(Clone)]
pub struct RootListing {
    uow: UnitOfWork,
    nodes: PgNodeRepository,
}

impl RootListing {
    pub fn new(pool: PgPool) -> Self {
        Self {
            uow: UnitOfWork::new(pool.clone()),
            nodes: PgNodeRepository::new(pool),
        }
    }

    pub async fn paginate(&self, page: PageRequest) -> Result<Page<NodeSummary>> {
        let start = Instant::now();
        let mut tx = self.uow.begin_snapshot().await?;

        let total = self.nodes.count_roots_tx(&mut tx).await?;
        let items = self.nodes.list_roots_tx(&mut tx, &page).await?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "listing",
            op = "paginate",
            limit = page.limit(),
            offset = page.offset(),
            total = total,
            result_count = items.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Root page listed"
        );
        Ok(page.paginate(items, total))
    }
}
