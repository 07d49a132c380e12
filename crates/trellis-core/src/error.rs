//! Error taxonomy for the menu tree engine.
//!
//! Two layers:
//! - [`TreeError`] is the typed domain error returned by every public
//!   operation. All validation variants are detected before any mutation is
//!   computed, so a failed operation never leaves a partial commit behind.
//! - [`ErrorCode`] is the stable machine-readable code (`E####`) a transport
//!   layer can put on the wire without string-matching error messages.

#![allow(clippy::module_name_repetitions)]

use std::fmt;

use crate::model::{ItemId, MenuId};
use crate::store::StoreError;
use crate::tree::ordering::SiblingSetMismatch;

/// Machine-readable error codes for API clients and operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    MenuNotFound,
    ItemNotFound,
    ParentNotFound,
    SiblingSetMismatch,
    CycleDetected,
    InvalidMove,
    StoreConflict,
    StoreBackend,
    CorruptOrdering,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MenuNotFound => "E2001",
            Self::ItemNotFound => "E2002",
            Self::ParentNotFound => "E2003",
            Self::SiblingSetMismatch => "E2004",
            Self::CycleDetected => "E2005",
            Self::InvalidMove => "E2006",
            Self::StoreConflict => "E5001",
            Self::StoreBackend => "E5002",
            Self::CorruptOrdering => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::MenuNotFound => "Menu not found",
            Self::ItemNotFound => "Menu item not found",
            Self::ParentNotFound => "Parent item not found in target menu",
            Self::SiblingSetMismatch => "Reorder list does not match sibling set",
            Self::CycleDetected => "Move would make an item its own ancestor",
            Self::InvalidMove => "Move names neither a new parent nor a new menu",
            Self::StoreConflict => "Store transaction conflict",
            Self::StoreBackend => "Store backend failure",
            Self::CorruptOrdering => "Stored sibling ordering violates invariants",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::MenuNotFound | Self::ItemNotFound => None,
            Self::ParentNotFound => {
                Some("Parents must exist in the same menu as the child; cross-menu nesting is not allowed.")
            }
            Self::SiblingSetMismatch => {
                Some("Send exactly the current children of the scope, each id once.")
            }
            Self::CycleDetected => Some("Pick a new parent outside the item's own subtree."),
            Self::InvalidMove => Some("Provide a new parent id, a new menu id, or both."),
            Self::StoreConflict => Some("Retry the request; a concurrent writer held the scope."),
            Self::StoreBackend => Some("Check store connectivity and logs."),
            Self::CorruptOrdering => Some("Run the verifier and renumber the reported scopes."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors returned by the public tree operations.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The referenced menu does not exist (or is outside the caller's
    /// tenant, which the authorization layer reports identically).
    #[error("menu not found: '{0}'")]
    MenuNotFound(MenuId),

    /// The referenced item does not exist.
    #[error("menu item not found: '{0}'")]
    ItemNotFound(ItemId),

    /// The supplied parent does not exist, or lives in a different menu
    /// than the operation requires.
    #[error("parent item '{parent_id}' not found in menu '{menu_id}'")]
    ParentNotFound { parent_id: ItemId, menu_id: MenuId },

    /// The id list supplied to a reorder does not exactly equal the scope.
    #[error(transparent)]
    SiblingSetMismatch(#[from] SiblingSetMismatch),

    /// The requested reparenting would make the item its own ancestor.
    #[error("moving '{item_id}' under '{proposed_parent}' would create a cycle")]
    CycleDetected {
        item_id: ItemId,
        proposed_parent: ItemId,
    },

    /// A move request that names neither a new parent nor a new menu.
    #[error("move request for '{0}' names neither a new parent nor a new menu")]
    InvalidMove(ItemId),

    /// The persistence layer failed; fatal for the current request.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TreeError {
    /// The stable machine code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MenuNotFound(_) => ErrorCode::MenuNotFound,
            Self::ItemNotFound(_) => ErrorCode::ItemNotFound,
            Self::ParentNotFound { .. } => ErrorCode::ParentNotFound,
            Self::SiblingSetMismatch(_) => ErrorCode::SiblingSetMismatch,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::InvalidMove(_) => ErrorCode::InvalidMove,
            Self::Store(StoreError::Conflict(_)) => ErrorCode::StoreConflict,
            Self::Store(StoreError::Backend(_)) => ErrorCode::StoreBackend,
        }
    }
}
