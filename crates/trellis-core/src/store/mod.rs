//! The persistence boundary for menu trees.
//!
//! The engine computes every operation as a batch of [`Mutation`]s over an
//! in-memory snapshot, then hands the whole batch to [`MenuStore::commit`],
//! which must apply it all-or-nothing. Adapters are expected to run the
//! batch inside a single serializable transaction (or an equivalent
//! optimistic check per touched sibling scope) so that concurrent writers
//! cannot silently break the order-contiguity invariant.
//!
//! Loads never block on other loads; correctness under concurrency lives
//! entirely at the commit boundary.

#![allow(clippy::module_name_repetitions)]

pub mod memory;

use crate::model::{ItemId, ItemKind, Menu, MenuId, MenuItem, SiblingScope, now_us};

/// One row-level change inside an atomic commit.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert a new item row.
    CreateItem(Box<MenuItem>),
    /// Assign a new sibling order to an existing item.
    UpdateOrder { item_id: ItemId, order: u32 },
    /// Re-point an item's parent link (`None` makes it a root).
    UpdateParent {
        item_id: ItemId,
        parent_id: Option<ItemId>,
    },
    /// Move an item to another menu container.
    UpdateMenu { item_id: ItemId, menu_id: MenuId },
    /// Replace the non-structural content of an item.
    UpdatePayload {
        item_id: ItemId,
        kind: ItemKind,
        payload: serde_json::Value,
    },
    /// Remove an item row. Children must have been re-pointed earlier in
    /// the same batch.
    DeleteItem { item_id: ItemId },
}

/// Audit information applied to every row a commit touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditStamp {
    /// Microseconds since the Unix epoch.
    pub at_us: i64,
    /// Opaque actor identifier; the engine never interprets it.
    pub actor: Option<String>,
}

impl AuditStamp {
    /// Stamp for the current wall-clock time.
    #[must_use]
    pub fn new(actor: Option<String>) -> Self {
        Self {
            at_us: now_us(),
            actor,
        }
    }

    /// Stamp for an explicit instant, for deterministic tests.
    #[must_use]
    pub const fn at(at_us: i64, actor: Option<String>) -> Self {
        Self { at_us, actor }
    }
}

/// Errors from a store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A concurrent writer held the transaction; the request is fatal here
    /// and retry policy belongs to the caller.
    #[error("store transaction conflict: {0}")]
    Conflict(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// The persistence contract the tree engine is written against.
///
/// Implementations must return sibling scopes sorted by `order` and subtrees
/// with the root item first. `commit` must be all-or-nothing.
pub trait MenuStore {
    /// Load a menu container by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn load_menu(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError>;

    /// Load a single item by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn load_item(&self, item_id: ItemId) -> Result<Option<MenuItem>, StoreError>;

    /// Load the members of one sibling scope, sorted by `order`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn load_sibling_scope(&self, scope: &SiblingScope) -> Result<Vec<MenuItem>, StoreError>;

    /// Load an item and all of its descendants, root first, breadth-first.
    ///
    /// Returns an empty vec when the item does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn load_subtree(&self, item_id: ItemId) -> Result<Vec<MenuItem>, StoreError>;

    /// Load every item of a menu, in unspecified order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on backend failure.
    fn load_menu_items(&self, menu_id: MenuId) -> Result<Vec<MenuItem>, StoreError>;

    /// Apply a batch of mutations atomically, stamping audit columns on
    /// every touched row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a concurrent transaction held
    /// the batch off, or [`StoreError::Backend`] for any other failure. On
    /// error nothing from the batch is visible.
    fn commit(&mut self, mutations: &[Mutation], stamp: &AuditStamp) -> Result<(), StoreError>;
}
