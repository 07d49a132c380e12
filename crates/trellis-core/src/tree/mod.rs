//! The ordering and reparenting core.
//!
//! - [`ordering`] keeps sibling orders dense and contiguous within one
//!   scope. Pure functions over a loaded snapshot.
//! - [`cycle`] decides whether a reparenting would make an item its own
//!   ancestor.
//! - [`policy`] composes the two into the create/delete/move/reorder
//!   operations, each ending in exactly one atomic store commit.

pub mod cycle;
pub mod ordering;
pub mod policy;
