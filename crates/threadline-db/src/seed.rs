//! Demo data seeding.
//!
//! Creates principals, then roots, then a fixed number of comment levels.
//! Every node gets a random owner, and every comment a random parent from the
//! level directly above it. Everything is inserted in one transaction, so a
//! failure leaves the store untouched.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use threadline_core::defaults;
use threadline_core::{Error, NodeId, PrincipalId, Result};

use crate::Store;

/// Shape of the generated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub users: usize,
    pub roots: usize,
    pub levels: usize,
    pub comments_per_level: usize,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            users: defaults::FIXTURE_USERS,
            roots: defaults::FIXTURE_ROOTS,
            levels: defaults::FIXTURE_LEVELS,
            comments_per_level: defaults::FIXTURE_COMMENTS_PER_LEVEL,
        }
    }
}

impl SeedPlan {
    /// Number of nodes the plan creates.
    pub fn node_count(&self) -> usize {
        self.roots + self.levels * self.comments_per_level
    }

    /// Every node needs an owner and every comment level needs a parent level.
    pub fn validate(&self) -> Result<()> {
        if self.node_count() > 0 && self.users == 0 {
            return Err(Error::InvalidInput(
                "at least one user is required to own nodes".to_string(),
            ));
        }
        if self.levels > 0 && self.comments_per_level > 0 && self.roots == 0 {
            return Err(Error::InvalidInput(
                "comments need at least one root".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ids created by a seeding run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub principals: Vec<PrincipalId>,
    pub roots: Vec<NodeId>,
    /// Comment ids per level, top level first.
    pub levels: Vec<Vec<NodeId>>,
}

impl SeedReport {
    pub fn node_count(&self) -> usize {
        self.roots.len() + self.levels.iter().map(Vec::len).sum::<usize>()
    }
}

fn pick<T: Copy, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Result<T> {
    items
        .choose(rng)
        .copied()
        .ok_or_else(|| Error::Internal("cannot pick from an empty set".to_string()))
}

/// Insert the planned data in one transaction.
///
/// Usernames are `{prefix}_{n}`; a prefix already in use fails with
/// `Conflict` and nothing is written.
pub async fn seed<R: Rng + ?Sized>(
    store: &Store,
    plan: &SeedPlan,
    username_prefix: &str,
    rng: &mut R,
) -> Result<SeedReport> {
    plan.validate()?;
    let start = Instant::now();
    let mut report = SeedReport::default();
    let mut tx = store.unit_of_work().begin().await?;

    for i in 0..plan.users {
        let user = store
            .principals
            .create_principal_tx(&mut tx, &format!("{}_{}", username_prefix, i))
            .await?;
        report.principals.push(user.id);
    }

    for i in 0..plan.roots {
        let owner = pick(&report.principals, rng)?;
        let node = store
            .nodes
            .create_tx(&mut tx, owner, &format!("post_{}", i), None)
            .await?;
        report.roots.push(node.id);
    }

    for level in 1..=plan.levels {
        let mut created = Vec::with_capacity(plan.comments_per_level);
        for i in 0..plan.comments_per_level {
            let parents = report.levels.last().unwrap_or(&report.roots);
            let parent = pick(parents, rng)?;
            let owner = pick(&report.principals, rng)?;
            let node = store
                .nodes
                .create_tx(&mut tx, owner, &format!("comment_{}_{}", level, i), Some(parent))
                .await?;
            created.push(node.id);
        }
        report.levels.push(created);
    }

    tx.commit().await.map_err(Error::Database)?;

    info!(
        subsystem = "database",
        component = "seed",
        op = "seed",
        principals = report.principals.len(),
        nodes = report.node_count(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Fixtures loaded"
    );
    Ok(report)
}
