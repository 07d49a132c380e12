//! In-memory store adapter.
//!
//! Backs unit and property tests, and works as an embedded store for
//! callers that keep menus entirely in process. Commits stage their changes
//! on a copy of the item table and swap it in only when the whole batch
//! applied, so a failing mutation leaves nothing behind.

use std::collections::HashMap;

use anyhow::anyhow;

use crate::model::{ItemId, Menu, MenuId, MenuItem, SiblingScope};

use super::{AuditStamp, MenuStore, Mutation, StoreError};

/// A [`MenuStore`] over plain hash maps.
#[derive(Debug, Default)]
pub struct MemoryMenuStore {
    menus: HashMap<MenuId, Menu>,
    items: HashMap<ItemId, MenuItem>,
}

impl MemoryMenuStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a menu container.
    pub fn insert_menu(&mut self, menu: Menu) {
        self.menus.insert(menu.id, menu);
    }

    /// All items currently stored, in unspecified order. For verification
    /// and tests.
    #[must_use]
    pub fn items(&self) -> Vec<MenuItem> {
        self.items.values().cloned().collect()
    }
}

fn apply_mutation(
    items: &mut HashMap<ItemId, MenuItem>,
    mutation: &Mutation,
    stamp: &AuditStamp,
) -> Result<(), StoreError> {
    match mutation {
        Mutation::CreateItem(item) => {
            if items.contains_key(&item.id) {
                return Err(StoreError::Backend(anyhow!(
                    "create for existing item '{}'",
                    item.id
                )));
            }
            items.insert(item.id, (**item).clone());
        }
        Mutation::UpdateOrder { item_id, order } => {
            let item = touch(items, *item_id, stamp)?;
            item.order = *order;
        }
        Mutation::UpdateParent { item_id, parent_id } => {
            let item = touch(items, *item_id, stamp)?;
            item.parent_id = *parent_id;
        }
        Mutation::UpdateMenu { item_id, menu_id } => {
            let item = touch(items, *item_id, stamp)?;
            item.menu_id = *menu_id;
        }
        Mutation::UpdatePayload {
            item_id,
            kind,
            payload,
        } => {
            let item = touch(items, *item_id, stamp)?;
            item.kind = *kind;
            item.payload = payload.clone();
        }
        Mutation::DeleteItem { item_id } => {
            if items.remove(item_id).is_none() {
                return Err(StoreError::Backend(anyhow!(
                    "delete for unknown item '{item_id}'"
                )));
            }
        }
    }
    Ok(())
}

fn touch<'a>(
    items: &'a mut HashMap<ItemId, MenuItem>,
    item_id: ItemId,
    stamp: &AuditStamp,
) -> Result<&'a mut MenuItem, StoreError> {
    let item = items
        .get_mut(&item_id)
        .ok_or_else(|| StoreError::Backend(anyhow!("update for unknown item '{item_id}'")))?;
    item.updated_at_us = stamp.at_us;
    item.updated_by.clone_from(&stamp.actor);
    Ok(item)
}

impl MenuStore for MemoryMenuStore {
    fn load_menu(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError> {
        Ok(self.menus.get(&menu_id).cloned())
    }

    fn load_item(&self, item_id: ItemId) -> Result<Option<MenuItem>, StoreError> {
        Ok(self.items.get(&item_id).cloned())
    }

    fn load_sibling_scope(&self, scope: &SiblingScope) -> Result<Vec<MenuItem>, StoreError> {
        let mut members: Vec<MenuItem> = self
            .items
            .values()
            .filter(|item| item.scope() == *scope)
            .cloned()
            .collect();
        members.sort_by_key(|item| (item.order, item.id));
        Ok(members)
    }

    fn load_subtree(&self, item_id: ItemId) -> Result<Vec<MenuItem>, StoreError> {
        let Some(root) = self.items.get(&item_id) else {
            return Ok(Vec::new());
        };

        let mut result = vec![root.clone()];
        let mut cursor = 0;
        while cursor < result.len() {
            let current = result[cursor].id;
            let mut children: Vec<MenuItem> = self
                .items
                .values()
                .filter(|item| item.parent_id == Some(current))
                .cloned()
                .collect();
            children.sort_by_key(|item| (item.order, item.id));
            result.extend(children);
            cursor += 1;
        }
        Ok(result)
    }

    fn load_menu_items(&self, menu_id: MenuId) -> Result<Vec<MenuItem>, StoreError> {
        Ok(self
            .items
            .values()
            .filter(|item| item.menu_id == menu_id)
            .cloned()
            .collect())
    }

    fn commit(&mut self, mutations: &[Mutation], stamp: &AuditStamp) -> Result<(), StoreError> {
        let mut staged = self.items.clone();
        for mutation in mutations {
            apply_mutation(&mut staged, mutation, stamp)?;
        }
        self.items = staged;
        Ok(())
    }
}
