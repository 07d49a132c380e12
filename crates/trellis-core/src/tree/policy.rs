//! Composite tree mutations: create, delete, move, and reorder.
//!
//! Each operation loads the scopes it needs, computes its entire mutation
//! batch in memory, and ends in exactly one [`MenuStore::commit`]. All
//! validation happens before the first mutation exists, so a rejected
//! request has no side effects at all.
//!
//! Scope discipline:
//! - create and reorder touch one sibling scope
//! - delete touches one scope (the promoted children join the same scope
//!   the deleted item leaves)
//! - move touches up to two scopes plus a menu cascade over the moved
//!   item's subtree

use serde_json::Value;

use crate::error::TreeError;
use crate::model::{ItemId, ItemKind, MenuId, MenuItem, SiblingScope};
use crate::store::{AuditStamp, MenuStore, Mutation};
use crate::tree::cycle;
use crate::tree::ordering::{self, OrderAssignment};

/// Caller-facing description of an item to create.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub menu_id: MenuId,
    pub parent_id: Option<ItemId>,
    /// Desired position among siblings; clamped to `[0, n]`, `None` appends.
    pub order: Option<u32>,
    pub kind: ItemKind,
    pub payload: Value,
    pub actor: Option<String>,
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedItem {
    pub item: MenuItem,
    /// The final, renumbered sibling scope including the new item.
    pub sibling_order: Vec<OrderAssignment>,
}

/// Result of a successful delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedItem {
    pub item_id: ItemId,
    /// Direct children promoted into the deleted item's old scope.
    pub promoted: Vec<ItemId>,
    /// The final state of that scope: surviving siblings first, promoted
    /// children appended, renumbered `0..n`.
    pub sibling_order: Vec<OrderAssignment>,
}

/// Caller-facing description of a move.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub item_id: ItemId,
    /// New parent; resolves the destination menu to the parent's menu.
    pub new_parent_id: Option<ItemId>,
    /// Without a parent: move to the root scope of this menu.
    pub new_menu_id: Option<MenuId>,
    pub actor: Option<String>,
}

/// Result of a successful move.
#[derive(Debug, Clone, PartialEq)]
pub struct MovedItem {
    pub item: MenuItem,
    /// Number of descendants whose `menu_id` was cascaded.
    pub cascaded: usize,
    /// Final state of the scope the item left. For a same-scope move this
    /// equals `destination_order`.
    pub origin_order: Vec<OrderAssignment>,
    /// Final state of the scope the item joined.
    pub destination_order: Vec<OrderAssignment>,
}

/// Create an item at a caller-chosen position.
///
/// No cycle check is needed: a newly created item cannot be the ancestor of
/// anything yet.
///
/// # Errors
///
/// [`TreeError::ParentNotFound`] when the named parent is missing or lives
/// in a different menu; [`TreeError::Store`] on persistence failure.
pub fn create_item<S: MenuStore>(store: &mut S, req: NewItem) -> Result<CreatedItem, TreeError> {
    if let Some(parent_id) = req.parent_id {
        let parent = store
            .load_item(parent_id)?
            .ok_or_else(|| TreeError::ParentNotFound {
                parent_id,
                menu_id: req.menu_id,
            })?;
        if parent.menu_id != req.menu_id {
            return Err(TreeError::ParentNotFound {
                parent_id,
                menu_id: req.menu_id,
            });
        }
    }

    let scope = SiblingScope::new(req.menu_id, req.parent_id);
    let siblings = ordering::snapshot(&store.load_sibling_scope(&scope)?);

    let item_id = ItemId::random();
    let plan = ordering::insert_at(&siblings, item_id, req.order);
    let stamp = AuditStamp::new(req.actor);

    let item = MenuItem {
        id: item_id,
        menu_id: req.menu_id,
        parent_id: req.parent_id,
        order: plan.index,
        kind: req.kind,
        payload: req.payload,
        created_at_us: stamp.at_us,
        updated_at_us: stamp.at_us,
        created_by: stamp.actor.clone(),
        updated_by: stamp.actor.clone(),
    };

    let mut mutations = vec![Mutation::CreateItem(Box::new(item.clone()))];
    mutations.extend(
        plan.changes
            .iter()
            .filter(|change| change.item_id != item_id)
            .map(|change| Mutation::UpdateOrder {
                item_id: change.item_id,
                order: change.order,
            }),
    );
    store.commit(&mutations, &stamp)?;

    tracing::info!(
        item_id = %item.id,
        scope = %scope,
        order = item.order,
        kind = %item.kind,
        "menu item created"
    );

    let sibling_order = ordering::apply(&siblings, &plan.changes);
    Ok(CreatedItem {
        item,
        sibling_order,
    })
}

/// Delete an item, promoting its direct children one level up.
///
/// Only direct children move: grandchildren keep their own parent links,
/// which now transitively pass through the promoted parent, so the overall
/// tree shape is preserved. Promoted children are appended after the
/// surviving siblings and the whole scope is renumbered in the same commit.
///
/// # Errors
///
/// [`TreeError::ItemNotFound`] when the item does not exist;
/// [`TreeError::Store`] on persistence failure.
pub fn delete_item<S: MenuStore>(
    store: &mut S,
    item_id: ItemId,
    actor: Option<String>,
) -> Result<DeletedItem, TreeError> {
    let item = store
        .load_item(item_id)?
        .ok_or_else(|| TreeError::ItemNotFound(item_id))?;

    let children = store.load_sibling_scope(&item.child_scope())?;
    let scope = item.scope();
    let siblings = store.load_sibling_scope(&scope)?;

    // Destination layout: surviving siblings in their order, promoted
    // children appended in theirs.
    let mut combined: Vec<OrderAssignment> = ordering::snapshot(&siblings)
        .into_iter()
        .filter(|a| a.item_id != item_id)
        .collect();
    combined.extend(ordering::snapshot(&children));
    let order_changes = ordering::renumber(&combined);

    let mut mutations: Vec<Mutation> = children
        .iter()
        .map(|child| Mutation::UpdateParent {
            item_id: child.id,
            parent_id: item.parent_id,
        })
        .collect();
    mutations.extend(order_changes.iter().map(|change| Mutation::UpdateOrder {
        item_id: change.item_id,
        order: change.order,
    }));
    mutations.push(Mutation::DeleteItem { item_id });

    let stamp = AuditStamp::new(actor);
    store.commit(&mutations, &stamp)?;

    tracing::info!(
        item_id = %item_id,
        scope = %scope,
        promoted = children.len(),
        "menu item deleted"
    );

    Ok(DeletedItem {
        item_id,
        promoted: children.iter().map(|child| child.id).collect(),
        sibling_order: ordering::apply(&combined, &order_changes),
    })
}

/// Move an item under a new parent and/or into another menu.
///
/// With a parent the item appends to the end of the parent's children and
/// the destination menu is the parent's menu. With only a menu the item
/// becomes the first root of that menu; pre-existing roots shift up by one
/// so orders stay contiguous. A menu change cascades over the entire
/// subtree: a subtree never straddles two menus.
///
/// # Errors
///
/// [`TreeError::InvalidMove`] when neither target is given;
/// [`TreeError::ItemNotFound`] / [`TreeError::ParentNotFound`] /
/// [`TreeError::MenuNotFound`] when a referenced row is missing;
/// [`TreeError::CycleDetected`] when the new parent sits inside the item's
/// own subtree; [`TreeError::Store`] on persistence failure.
pub fn move_item<S: MenuStore>(store: &mut S, req: MoveRequest) -> Result<MovedItem, TreeError> {
    let item = store
        .load_item(req.item_id)?
        .ok_or_else(|| TreeError::ItemNotFound(req.item_id))?;

    let (dest_menu, dest_parent, desired) = match (req.new_parent_id, req.new_menu_id) {
        (None, None) => return Err(TreeError::InvalidMove(req.item_id)),
        (Some(parent_id), menu_hint) => {
            let parent = store
                .load_item(parent_id)?
                .ok_or_else(|| TreeError::ParentNotFound {
                    parent_id,
                    menu_id: menu_hint.unwrap_or(item.menu_id),
                })?;
            if let Some(menu_id) = menu_hint {
                if menu_id != parent.menu_id {
                    return Err(TreeError::ParentNotFound { parent_id, menu_id });
                }
            }
            let links = cycle::parent_links(&store.load_menu_items(parent.menu_id)?);
            if cycle::would_create_cycle(req.item_id, parent_id, &links) {
                tracing::warn!(
                    item_id = %req.item_id,
                    proposed_parent = %parent_id,
                    "move rejected: would create a cycle"
                );
                return Err(TreeError::CycleDetected {
                    item_id: req.item_id,
                    proposed_parent: parent_id,
                });
            }
            // Append to the end of the new parent's children.
            (parent.menu_id, Some(parent_id), None)
        }
        (None, Some(menu_id)) => {
            let menu = store
                .load_menu(menu_id)?
                .ok_or_else(|| TreeError::MenuNotFound(menu_id))?;
            // Move to the front of the destination root scope.
            (menu.id, None, Some(0))
        }
    };

    let origin = item.scope();
    let dest_scope = SiblingScope::new(dest_menu, dest_parent);
    let same_scope = dest_scope == origin;

    let dest_base: Vec<OrderAssignment> =
        ordering::snapshot(&store.load_sibling_scope(&dest_scope)?)
            .into_iter()
            .filter(|a| a.item_id != item.id)
            .collect();
    let plan = ordering::insert_at(&dest_base, item.id, desired);

    let mut mutations = Vec::new();
    if dest_parent != item.parent_id {
        mutations.push(Mutation::UpdateParent {
            item_id: item.id,
            parent_id: dest_parent,
        });
    }

    let origin_order = if same_scope {
        Vec::new()
    } else {
        let origin_survivors: Vec<OrderAssignment> =
            ordering::snapshot(&store.load_sibling_scope(&origin)?)
                .into_iter()
                .filter(|a| a.item_id != item.id)
                .collect();
        let origin_changes = ordering::renumber(&origin_survivors);
        mutations.extend(origin_changes.iter().map(|change| Mutation::UpdateOrder {
            item_id: change.item_id,
            order: change.order,
        }));
        ordering::apply(&origin_survivors, &origin_changes)
    };

    mutations.extend(plan.changes.iter().map(|change| Mutation::UpdateOrder {
        item_id: change.item_id,
        order: change.order,
    }));

    let cascaded = if dest_menu == item.menu_id {
        0
    } else {
        let subtree = store.load_subtree(item.id)?;
        for node in &subtree {
            mutations.push(Mutation::UpdateMenu {
                item_id: node.id,
                menu_id: dest_menu,
            });
        }
        subtree.len().saturating_sub(1)
    };

    let stamp = AuditStamp::new(req.actor);
    store.commit(&mutations, &stamp)?;

    tracing::info!(
        item_id = %item.id,
        origin = %origin,
        destination = %dest_scope,
        order = plan.index,
        cascaded,
        "menu item moved"
    );

    let destination_order = ordering::apply(&dest_base, &plan.changes);
    let moved = MenuItem {
        menu_id: dest_menu,
        parent_id: dest_parent,
        order: plan.index,
        updated_at_us: stamp.at_us,
        updated_by: stamp.actor,
        ..item
    };
    let origin_order = if same_scope {
        destination_order.clone()
    } else {
        origin_order
    };

    Ok(MovedItem {
        item: moved,
        cascaded,
        origin_order,
        destination_order,
    })
}

/// Apply a caller-supplied total ordering of one sibling scope.
///
/// The menu itself is validated by the service layer; this function
/// validates the parent and the id set.
///
/// # Errors
///
/// [`TreeError::ParentNotFound`] when the named parent is missing or in a
/// different menu; [`TreeError::SiblingSetMismatch`] when the id list does
/// not exactly equal the scope; [`TreeError::Store`] on persistence
/// failure.
pub fn reorder_siblings<S: MenuStore>(
    store: &mut S,
    menu_id: MenuId,
    parent_id: Option<ItemId>,
    ordered_ids: &[ItemId],
    actor: Option<String>,
) -> Result<Vec<OrderAssignment>, TreeError> {
    if let Some(parent_id) = parent_id {
        let parent = store
            .load_item(parent_id)?
            .ok_or_else(|| TreeError::ParentNotFound { parent_id, menu_id })?;
        if parent.menu_id != menu_id {
            return Err(TreeError::ParentNotFound { parent_id, menu_id });
        }
    }

    let scope = SiblingScope::new(menu_id, parent_id);
    let siblings = ordering::snapshot(&store.load_sibling_scope(&scope)?);
    let changes = ordering::reorder_exact(scope, &siblings, ordered_ids)?;

    if changes.is_empty() {
        tracing::debug!(scope = %scope, "reorder is a no-op");
    } else {
        let mutations: Vec<Mutation> = changes
            .iter()
            .map(|change| Mutation::UpdateOrder {
                item_id: change.item_id,
                order: change.order,
            })
            .collect();
        store.commit(&mutations, &AuditStamp::new(actor))?;
        tracing::info!(scope = %scope, moved = changes.len(), "siblings reordered");
    }

    Ok(ordering::apply(&siblings, &changes))
}
