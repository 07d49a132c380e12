//! The public contract of the menu tree engine.
//!
//! [`MenuTreeService`] is what the transport layer talks to: it validates
//! the request's menu scope, delegates the structural work to
//! [`crate::tree::policy`], and returns typed results and
//! [`TreeError`]s. Workspace authorization happens before a request
//! reaches this service; everything here is already tenant-scoped.

use serde_json::Value;

use crate::error::TreeError;
use crate::model::{ItemId, ItemKind, Menu, MenuId, MenuItem};
use crate::store::{AuditStamp, MenuStore, Mutation};
use crate::tree::ordering::OrderAssignment;
use crate::tree::policy::{
    self, CreatedItem, DeletedItem, MoveRequest, MovedItem, NewItem,
};

/// Non-structural changes to an item. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct ItemPatch {
    pub kind: Option<ItemKind>,
    pub payload: Option<Value>,
    pub actor: Option<String>,
}

/// Facade over one [`MenuStore`].
#[derive(Debug)]
pub struct MenuTreeService<S> {
    store: S,
}

impl<S: MenuStore> MenuTreeService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the underlying store (verification, read paths).
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consume the service and hand the store back.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Create an item in a menu at a caller-chosen position.
    ///
    /// # Errors
    ///
    /// [`TreeError::MenuNotFound`] when the menu does not exist;
    /// [`TreeError::ParentNotFound`] when the named parent is missing or in
    /// another menu; [`TreeError::Store`] on persistence failure.
    pub fn create_item(&mut self, req: NewItem) -> Result<CreatedItem, TreeError> {
        self.require_menu(req.menu_id)?;
        policy::create_item(&mut self.store, req)
    }

    /// Replace an item's non-structural content (kind and/or payload).
    ///
    /// Structure (`order`, `parent_id`, `menu_id`) never changes here; use
    /// [`Self::move_item`] and [`Self::reorder_siblings`] for that.
    ///
    /// # Errors
    ///
    /// [`TreeError::ItemNotFound`] when the item does not exist;
    /// [`TreeError::Store`] on persistence failure.
    pub fn update_item(&mut self, item_id: ItemId, patch: ItemPatch) -> Result<MenuItem, TreeError> {
        let item = self
            .store
            .load_item(item_id)?
            .ok_or_else(|| TreeError::ItemNotFound(item_id))?;

        let kind = patch.kind.unwrap_or(item.kind);
        let payload = patch.payload.unwrap_or_else(|| item.payload.clone());
        let stamp = AuditStamp::new(patch.actor);

        self.store.commit(
            &[Mutation::UpdatePayload {
                item_id,
                kind,
                payload: payload.clone(),
            }],
            &stamp,
        )?;

        tracing::info!(item_id = %item_id, kind = %kind, "menu item updated");

        Ok(MenuItem {
            kind,
            payload,
            updated_at_us: stamp.at_us,
            updated_by: stamp.actor,
            ..item
        })
    }

    /// Delete an item, promoting its direct children one level up.
    ///
    /// # Errors
    ///
    /// [`TreeError::ItemNotFound`] when the item does not exist;
    /// [`TreeError::Store`] on persistence failure.
    pub fn delete_item(
        &mut self,
        item_id: ItemId,
        actor: Option<String>,
    ) -> Result<DeletedItem, TreeError> {
        policy::delete_item(&mut self.store, item_id, actor)
    }

    /// Apply a caller-supplied total ordering of one sibling scope.
    ///
    /// # Errors
    ///
    /// [`TreeError::MenuNotFound`] when the menu does not exist;
    /// [`TreeError::ParentNotFound`] when the named parent is missing or in
    /// another menu; [`TreeError::SiblingSetMismatch`] when the id list
    /// does not exactly equal the scope; [`TreeError::Store`] on
    /// persistence failure.
    pub fn reorder_siblings(
        &mut self,
        menu_id: MenuId,
        parent_id: Option<ItemId>,
        ordered_ids: &[ItemId],
        actor: Option<String>,
    ) -> Result<Vec<OrderAssignment>, TreeError> {
        self.require_menu(menu_id)?;
        policy::reorder_siblings(&mut self.store, menu_id, parent_id, ordered_ids, actor)
    }

    /// Move an item under a new parent and/or into another menu.
    ///
    /// # Errors
    ///
    /// See [`policy::move_item`].
    pub fn move_item(&mut self, req: MoveRequest) -> Result<MovedItem, TreeError> {
        policy::move_item(&mut self.store, req)
    }

    fn require_menu(&self, menu_id: MenuId) -> Result<Menu, TreeError> {
        self.store
            .load_menu(menu_id)?
            .ok_or_else(|| TreeError::MenuNotFound(menu_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemPatch, MenuTreeService};
    use crate::error::{ErrorCode, TreeError};
    use crate::model::{ItemId, ItemKind, Menu, MenuId, MenuItem, WorkspaceId};
    use crate::store::memory::MemoryMenuStore;
    use crate::store::{AuditStamp, MenuStore, Mutation};
    use crate::tree::policy::NewItem;

    fn service_with_menu() -> (MenuTreeService<MemoryMenuStore>, MenuId) {
        let mut store = MemoryMenuStore::new();
        let menu = Menu {
            id: MenuId::random(),
            workspace_id: WorkspaceId::random(),
            name: "main".to_string(),
            location: None,
            created_at_us: 0,
            updated_at_us: 0,
        };
        let menu_id = menu.id;
        store.insert_menu(menu);
        (MenuTreeService::new(store), menu_id)
    }

    fn new_item(menu_id: MenuId) -> NewItem {
        NewItem {
            menu_id,
            parent_id: None,
            order: None,
            kind: ItemKind::Link,
            payload: serde_json::json!({ "label": "About" }),
            actor: Some("editor".to_string()),
        }
    }

    #[test]
    fn create_in_unknown_menu_is_rejected() {
        let (mut service, _menu_id) = service_with_menu();

        let err = service.create_item(new_item(MenuId::random())).unwrap_err();
        assert!(matches!(err, TreeError::MenuNotFound(_)));
        assert_eq!(err.code(), ErrorCode::MenuNotFound);
    }

    #[test]
    fn create_then_update_payload() {
        let (mut service, menu_id) = service_with_menu();

        let created = service.create_item(new_item(menu_id)).unwrap();
        let updated = service
            .update_item(
                created.item.id,
                ItemPatch {
                    kind: Some(ItemKind::External),
                    payload: Some(serde_json::json!({ "url": "https://example.org" })),
                    actor: Some("reviewer".to_string()),
                },
            )
            .unwrap();

        assert_eq!(updated.kind, ItemKind::External);
        assert_eq!(updated.payload["url"], "https://example.org");
        assert_eq!(updated.updated_by.as_deref(), Some("reviewer"));

        // Structure is untouched.
        assert_eq!(updated.order, created.item.order);
        assert_eq!(updated.parent_id, created.item.parent_id);

        let stored = service
            .store()
            .load_item(created.item.id)
            .unwrap()
            .expect("item");
        assert_eq!(stored.kind, ItemKind::External);
    }

    #[test]
    fn update_with_empty_patch_keeps_content() {
        let (mut service, menu_id) = service_with_menu();

        let created = service.create_item(new_item(menu_id)).unwrap();
        let updated = service
            .update_item(created.item.id, ItemPatch::default())
            .unwrap();

        assert_eq!(updated.kind, created.item.kind);
        assert_eq!(updated.payload, created.item.payload);
    }

    #[test]
    fn update_of_missing_item_is_rejected() {
        let (mut service, _menu_id) = service_with_menu();

        let err = service
            .update_item(ItemId::random(), ItemPatch::default())
            .unwrap_err();
        assert!(matches!(err, TreeError::ItemNotFound(_)));
        assert_eq!(err.code(), ErrorCode::ItemNotFound);
    }

    #[test]
    fn reorder_in_unknown_menu_is_rejected() {
        let (mut service, _menu_id) = service_with_menu();

        let err = service
            .reorder_siblings(MenuId::random(), None, &[], None)
            .unwrap_err();
        assert!(matches!(err, TreeError::MenuNotFound(_)));
    }

    #[test]
    fn sibling_mismatch_surfaces_its_code() {
        let (mut service, menu_id) = service_with_menu();
        let created = service.create_item(new_item(menu_id)).unwrap();

        let err = service
            .reorder_siblings(menu_id, None, &[created.item.id, ItemId::random()], None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SiblingSetMismatch);
    }

    #[test]
    fn delete_returns_renumbered_scope() {
        let (mut service, menu_id) = service_with_menu();
        let first = service.create_item(new_item(menu_id)).unwrap();
        let second = service.create_item(new_item(menu_id)).unwrap();

        let deleted = service.delete_item(first.item.id, None).unwrap();
        assert_eq!(deleted.item_id, first.item.id);
        assert_eq!(deleted.sibling_order.len(), 1);
        assert_eq!(deleted.sibling_order[0].item_id, second.item.id);
        assert_eq!(deleted.sibling_order[0].order, 0);
    }

    #[test]
    fn into_store_hands_back_the_adapter() {
        let (mut service, menu_id) = service_with_menu();
        service.create_item(new_item(menu_id)).unwrap();

        let store = service.into_store();
        assert_eq!(store.items().len(), 1);
    }

    #[test]
    fn service_works_against_a_preseeded_store() {
        // The service accepts any MenuStore; seed one directly.
        let (mut service, menu_id) = service_with_menu();
        let item = MenuItem {
            id: ItemId::random(),
            menu_id,
            parent_id: None,
            order: 0,
            kind: ItemKind::Link,
            payload: serde_json::Value::Null,
            created_at_us: 0,
            updated_at_us: 0,
            created_by: None,
            updated_by: None,
        };
        // Seed the store directly, then reorder via the API.
        let ids = vec![item.id];
        let mut inner = service.into_store();
        inner
            .commit(
                &[Mutation::CreateItem(Box::new(item))],
                &AuditStamp::at(0, None),
            )
            .unwrap();
        let mut service = MenuTreeService::new(inner);

        let final_order = service.reorder_siblings(menu_id, None, &ids, None).unwrap();
        assert_eq!(final_order.len(), 1);
    }
}
