//! Centralized default constants for threadline.
//!
//! Shared by the core, the database layer, and the fixture loader so that
//! no crate defines its own magic numbers.

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for the root listing.
pub const PAGE_LIMIT: i64 = 10;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Default maximum number of connections in the pool.
pub const POOL_MAX_CONNECTIONS: u32 = 10;

/// Default minimum number of idle connections kept open.
pub const POOL_MIN_CONNECTIONS: u32 = 1;

/// Default acquire timeout in seconds.
pub const POOL_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout in seconds.
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default maximum connection lifetime in seconds (30 minutes).
pub const POOL_MAX_LIFETIME_SECS: u64 = 1800;

// =============================================================================
// FIXTURES
// =============================================================================

/// Principals created by the fixture loader.
pub const FIXTURE_USERS: usize = 10;

/// Root nodes created by the fixture loader.
pub const FIXTURE_ROOTS: usize = 15;

/// Comment levels below the roots.
pub const FIXTURE_LEVELS: usize = 3;

/// Comments created per level.
pub const FIXTURE_COMMENTS_PER_LEVEL: usize = 20;
