//! Invariant verification for menu forests.
//!
//! The engine maintains three invariants across every commit; this module
//! is the runnable form of them, usable against any loaded item set:
//!
//! - every sibling scope's orders are exactly `0..n`, no gaps, no
//!   duplicates
//! - following `parent_id` links always terminates at a root
//! - a parent link never crosses a menu boundary and never dangles
//!
//! Verification reads; it never repairs. Operators decide what to do with
//! a failing report.

use std::collections::HashMap;
use std::fmt;

use crate::model::{ItemId, MenuId, MenuItem, SiblingScope};
use crate::store::{MenuStore, StoreError};

/// One detected invariant violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A scope whose sorted orders are not exactly `0..n`.
    NonDenseOrder {
        scope: SiblingScope,
        orders: Vec<u32>,
    },
    /// An item whose parent id resolves to no stored item.
    DanglingParent { item_id: ItemId, parent_id: ItemId },
    /// An item whose parent lives in a different menu.
    CrossMenuParent { item_id: ItemId, parent_id: ItemId },
    /// An item that is its own ancestor.
    Cycle { item_id: ItemId },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonDenseOrder { scope, orders } => {
                write!(f, "scope {scope} has non-dense orders {orders:?}")
            }
            Self::DanglingParent { item_id, parent_id } => {
                write!(f, "item '{item_id}' points at missing parent '{parent_id}'")
            }
            Self::CrossMenuParent { item_id, parent_id } => {
                write!(
                    f,
                    "item '{item_id}' points at parent '{parent_id}' in another menu"
                )
            }
            Self::Cycle { item_id } => write!(f, "item '{item_id}' is its own ancestor"),
        }
    }
}

/// Aggregate verification result for one menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub menu_id: MenuId,
    pub items_checked: usize,
    pub violations: Vec<Violation>,
}

impl VerifyReport {
    /// Return `true` when all checks passed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check one loaded item set against all invariants.
#[must_use]
pub fn check_items(items: &[MenuItem]) -> Vec<Violation> {
    let mut violations = Vec::new();
    let by_id: HashMap<ItemId, &MenuItem> = items.iter().map(|item| (item.id, item)).collect();

    // Parent links: existence and menu consistency.
    for item in items {
        if let Some(parent_id) = item.parent_id {
            match by_id.get(&parent_id) {
                None => violations.push(Violation::DanglingParent {
                    item_id: item.id,
                    parent_id,
                }),
                Some(parent) if parent.menu_id != item.menu_id => {
                    violations.push(Violation::CrossMenuParent {
                        item_id: item.id,
                        parent_id,
                    });
                }
                Some(_) => {}
            }
        }
    }

    // Cycles: walk each item's ancestor chain, capped at the item count.
    for item in items {
        let mut current = item.parent_id;
        let mut steps = 0;
        while let Some(parent_id) = current {
            if parent_id == item.id {
                violations.push(Violation::Cycle { item_id: item.id });
                break;
            }
            steps += 1;
            if steps > items.len() {
                break;
            }
            current = by_id.get(&parent_id).and_then(|parent| parent.parent_id);
        }
    }

    // Scope density.
    let mut scopes: HashMap<SiblingScope, Vec<u32>> = HashMap::new();
    for item in items {
        scopes.entry(item.scope()).or_default().push(item.order);
    }
    for (scope, mut orders) in scopes {
        orders.sort_unstable();
        let dense = (0u32..).zip(orders.iter()).all(|(want, got)| *got == want);
        if !dense {
            violations.push(Violation::NonDenseOrder { scope, orders });
        }
    }

    violations
}

/// Load a menu's items and check them.
///
/// # Errors
///
/// Returns [`StoreError`] when the load fails.
pub fn verify_menu<S: MenuStore>(store: &S, menu_id: MenuId) -> Result<VerifyReport, StoreError> {
    let items = store.load_menu_items(menu_id)?;
    Ok(VerifyReport {
        menu_id,
        items_checked: items.len(),
        violations: check_items(&items),
    })
}
