//! Cycle prevention for reparenting.
//!
//! Menu items form a forest over `parent_id` links. Accepting a parent that
//! sits inside the moving item's own subtree would close a loop and make the
//! item its own ancestor. Detection is an iterative walk from the candidate
//! parent up through successive parent links: reaching the candidate child
//! means cycle, reaching a root (or leaving the index) means no cycle.
//!
//! The walk is O(depth). It is additionally capped at the index size so a
//! corrupted store (one that already contains a loop) cannot hang the check.

use std::collections::HashMap;

use crate::model::{ItemId, MenuItem};

/// Flat parent-link index over all items of a menu.
pub type ParentLinks = HashMap<ItemId, Option<ItemId>>;

/// Build the parent-link index for a loaded set of items.
#[must_use]
pub fn parent_links(items: &[MenuItem]) -> ParentLinks {
    items.iter().map(|item| (item.id, item.parent_id)).collect()
}

/// Would parenting `candidate_child` under `candidate_parent` create a cycle?
///
/// True iff the two ids are equal, or `candidate_parent` is a (possibly
/// indirect) descendant of `candidate_child`.
#[must_use]
pub fn would_create_cycle(
    candidate_child: ItemId,
    candidate_parent: ItemId,
    links: &ParentLinks,
) -> bool {
    if candidate_child == candidate_parent {
        return true;
    }

    let mut current = candidate_parent;
    for _ in 0..links.len() {
        match links.get(&current) {
            Some(Some(parent)) => {
                if *parent == candidate_child {
                    return true;
                }
                current = *parent;
            }
            // A root, or a dangling link out of the index: no path back.
            Some(None) | None => return false,
        }
    }

    // Iteration cap hit: the existing chain loops without passing through
    // the candidate child. The new edge does not close a cycle of its own.
    false
}
