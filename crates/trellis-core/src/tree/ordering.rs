//! Dense sibling ordering within one scope.
//!
//! Every function here is a pure computation over an in-memory snapshot of
//! one sibling scope, loaded sorted by `order`. The result is a list of
//! [`OrderAssignment`]s to persist atomically; only items whose order
//! actually changes are emitted, so an identity reorder produces an empty
//! change set and commits stay minimal.
//!
//! After applying the emitted assignments, the scope's orders are exactly
//! `0..n` with no duplicates and no gaps, even if the input snapshot was
//! not dense (a renumber quietly repairs it).

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::model::{ItemId, MenuItem, SiblingScope};

/// A `(item, order)` pair: both the loaded form of a sibling scope and the
/// unit of persisted ordering change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAssignment {
    pub item_id: ItemId,
    pub order: u32,
}

/// Result of planning an insertion into a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertPlan {
    /// The final index assigned to the new item, after clamping.
    pub index: u32,
    /// Assignments to persist: the new item plus any shifted siblings.
    pub changes: Vec<OrderAssignment>,
}

/// The id list supplied to a reorder does not exactly equal the current
/// members of the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingSetMismatch {
    pub scope: SiblingScope,
    /// Scope members absent from the request.
    pub missing: Vec<ItemId>,
    /// Requested ids that are not members of the scope.
    pub unexpected: Vec<ItemId>,
    /// Ids repeated in the request.
    pub duplicates: Vec<ItemId>,
}

impl fmt::Display for SiblingSetMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reorder list does not match scope {} ({} missing, {} unexpected, {} duplicated)",
            self.scope,
            self.missing.len(),
            self.unexpected.len(),
            self.duplicates.len()
        )
    }
}

impl std::error::Error for SiblingSetMismatch {}

/// Project loaded items down to their `(id, order)` pairs.
///
/// The slice must already be sorted by `order`, which is how
/// [`crate::store::MenuStore::load_sibling_scope`] returns it.
#[must_use]
pub fn snapshot(items: &[MenuItem]) -> Vec<OrderAssignment> {
    items
        .iter()
        .map(|item| OrderAssignment {
            item_id: item.id,
            order: item.order,
        })
        .collect()
}

/// Plan inserting `new_item` into a scope at `desired`.
///
/// `desired` is clamped to `[0, n]`; `None` appends. Out-of-range positions
/// are clamped rather than rejected: "append if beyond the end" is the
/// caller-facing contract.
#[must_use]
pub fn insert_at(
    current: &[OrderAssignment],
    new_item: ItemId,
    desired: Option<u32>,
) -> InsertPlan {
    debug_assert!(is_sorted(current), "scope snapshot must be sorted by order");

    let len = scope_len(current);
    let index = desired.map_or(len, |d| d.min(len));

    let mut changes = Vec::with_capacity(current.len() + 1);
    let mut next = 0u32;
    for existing in current {
        if next == index {
            // Leave the hole the new item will occupy.
            next += 1;
        }
        if existing.order != next {
            changes.push(OrderAssignment {
                item_id: existing.item_id,
                order: next,
            });
        }
        next += 1;
    }
    changes.push(OrderAssignment {
        item_id: new_item,
        order: index,
    });

    InsertPlan { index, changes }
}

/// Plan applying a caller-supplied total ordering of a scope.
///
/// `requested` must be exactly the current members of the scope: no missing
/// ids, no foreign ids, no duplicates. On success each id is assigned its
/// index in `requested`.
///
/// # Errors
///
/// Returns [`SiblingSetMismatch`] describing every discrepancy; nothing is
/// partially applied.
pub fn reorder_exact(
    scope: SiblingScope,
    current: &[OrderAssignment],
    requested: &[ItemId],
) -> Result<Vec<OrderAssignment>, SiblingSetMismatch> {
    debug_assert!(is_sorted(current), "scope snapshot must be sorted by order");

    let mut seen: HashSet<ItemId> = HashSet::with_capacity(requested.len());
    let mut duplicates = Vec::new();
    for id in requested {
        if !seen.insert(*id) {
            duplicates.push(*id);
        }
    }

    let members: HashSet<ItemId> = current.iter().map(|a| a.item_id).collect();
    let missing: Vec<ItemId> = current
        .iter()
        .map(|a| a.item_id)
        .filter(|id| !seen.contains(id))
        .collect();
    let unexpected: Vec<ItemId> = requested
        .iter()
        .copied()
        .filter(|id| !members.contains(id))
        .collect();

    if !missing.is_empty() || !unexpected.is_empty() || !duplicates.is_empty() {
        return Err(SiblingSetMismatch {
            scope,
            missing,
            unexpected,
            duplicates,
        });
    }

    let current_orders: HashMap<ItemId, u32> =
        current.iter().map(|a| (a.item_id, a.order)).collect();

    Ok((0u32..)
        .zip(requested.iter())
        .filter(|(order, id)| current_orders.get(*id) != Some(order))
        .map(|(order, id)| OrderAssignment {
            item_id: *id,
            order,
        })
        .collect())
}

/// Plan renumbering a scope to `0..n` preserving the slice's relative order.
#[must_use]
pub fn renumber(current: &[OrderAssignment]) -> Vec<OrderAssignment> {
    (0u32..)
        .zip(current.iter())
        .filter(|(order, a)| a.order != *order)
        .map(|(order, a)| OrderAssignment {
            item_id: a.item_id,
            order,
        })
        .collect()
}

/// Plan renumbering a scope after `removed` leaves it.
#[must_use]
pub fn renumber_after_removal(
    current: &[OrderAssignment],
    removed: ItemId,
) -> Vec<OrderAssignment> {
    debug_assert!(is_sorted(current), "scope snapshot must be sorted by order");

    let survivors: Vec<OrderAssignment> = current
        .iter()
        .copied()
        .filter(|a| a.item_id != removed)
        .collect();
    renumber(&survivors)
}

/// The final state of a scope after `changes` are applied over `current`.
///
/// Used for reporting the renumbered sibling list back to callers; sorted
/// by final order.
#[must_use]
pub fn apply(current: &[OrderAssignment], changes: &[OrderAssignment]) -> Vec<OrderAssignment> {
    let mut by_id: HashMap<ItemId, u32> = current.iter().map(|a| (a.item_id, a.order)).collect();
    for change in changes {
        by_id.insert(change.item_id, change.order);
    }
    let mut result: Vec<OrderAssignment> = by_id
        .into_iter()
        .map(|(item_id, order)| OrderAssignment { item_id, order })
        .collect();
    result.sort_by_key(|a| (a.order, a.item_id));
    result
}

fn scope_len(current: &[OrderAssignment]) -> u32 {
    u32::try_from(current.len()).unwrap_or(u32::MAX)
}

fn is_sorted(current: &[OrderAssignment]) -> bool {
    current.windows(2).all(|w| w[0].order <= w[1].order)
}
