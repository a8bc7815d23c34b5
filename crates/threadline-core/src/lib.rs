//! # threadline-core
//!
//! Core types, traits, and algorithms for threadline.
//!
//! This crate provides the storage-independent half of the system: the node
//! and principal models, the error taxonomy, the repository traits, the tree
//! builder that turns a flat subtree into a nested thread, the ownership and
//! cycle guards, and the [`NodeService`] facade used by the routing layer.

pub mod defaults;
pub mod error;
pub mod guard;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod models;
pub mod pagination;
pub mod service;
pub mod traits;
pub mod tree;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use guard::{authorize_mutation, ensure_not_self_parent, Mutation};
pub use models::*;
pub use pagination::{Page, PageRequest};
pub use service::NodeService;
pub use traits::*;
pub use tree::build_tree;
