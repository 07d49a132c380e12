//! trellis-core: the hierarchical navigation-menu engine.
//!
//! A menu is a workspace-scoped container owning a forest of items. The
//! engine guarantees, after every committed operation:
//!
//! - sibling orders within each `(menu, parent)` scope are exactly `0..n`
//! - no item is ever its own ancestor
//! - a subtree never straddles two menus
//!
//! Operations load a snapshot through a [`store::MenuStore`], compute the
//! whole mutation batch in memory, and commit it atomically; a rejected
//! request has no side effects.
//!
//! # Conventions
//!
//! - **Errors**: typed [`error::TreeError`] at the public surface,
//!   `anyhow::Result` with context inside the SQLite adapter.
//! - **Logging**: `tracing` macros with structured fields at mutation
//!   points. The crate never installs a subscriber.

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod service;
pub mod store;
pub mod tree;
pub mod verify;

pub use error::{ErrorCode, TreeError};
pub use service::MenuTreeService;
pub use store::{AuditStamp, MenuStore, Mutation, StoreError};
