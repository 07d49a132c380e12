//! End-to-end tree operations against the SQLite store.
//!
//! These walk the public service surface the way a transport layer would:
//! open a store, register menus, then create/reorder/move/delete and check
//! both the returned results and the persisted state.

use trellis_core::model::{ItemId, ItemKind, Menu, MenuId, MenuLocation, WorkspaceId, now_us};
use trellis_core::service::{ItemPatch, MenuTreeService};
use trellis_core::tree::policy::{MoveRequest, NewItem};
use trellis_core::verify;
use trellis_core::{ErrorCode, MenuStore, TreeError};

use trellis_core::db::SqliteMenuStore;
use trellis_core::model::SiblingScope;

fn new_menu(store: &mut SqliteMenuStore, workspace_id: WorkspaceId, name: &str) -> MenuId {
    let now = now_us();
    let menu = Menu {
        id: MenuId::random(),
        workspace_id,
        name: name.to_string(),
        location: Some(MenuLocation::Header),
        created_at_us: now,
        updated_at_us: now,
    };
    let id = menu.id;
    store.create_menu(&menu).expect("create menu");
    id
}

fn service_with_menus(names: &[&str]) -> (MenuTreeService<SqliteMenuStore>, Vec<MenuId>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let mut store = SqliteMenuStore::open_in_memory().expect("open store");
    let workspace_id = WorkspaceId::random();
    let menu_ids = names
        .iter()
        .map(|name| new_menu(&mut store, workspace_id, name))
        .collect();
    (MenuTreeService::new(store), menu_ids)
}

fn link(menu_id: MenuId, parent_id: Option<ItemId>, order: Option<u32>, label: &str) -> NewItem {
    NewItem {
        menu_id,
        parent_id,
        order,
        kind: ItemKind::Link,
        payload: serde_json::json!({ "label": label }),
        actor: Some("editor".to_string()),
    }
}

fn scope_ids(service: &MenuTreeService<SqliteMenuStore>, menu_id: MenuId, parent_id: Option<ItemId>) -> Vec<ItemId> {
    service
        .store()
        .load_sibling_scope(&SiblingScope::new(menu_id, parent_id))
        .expect("load scope")
        .iter()
        .map(|item| item.id)
        .collect()
}

fn assert_menu_clean(service: &MenuTreeService<SqliteMenuStore>, menu_id: MenuId) {
    let report = verify::verify_menu(service.store(), menu_id).expect("verify");
    assert!(report.is_ok(), "violations: {:?}", report.violations);
}

#[test]
fn create_at_front_shifts_existing_roots() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let a = service.create_item(link(menu_id, None, None, "A")).unwrap();
    let b = service.create_item(link(menu_id, None, None, "B")).unwrap();
    let c = service
        .create_item(link(menu_id, None, Some(0), "C"))
        .unwrap();

    assert_eq!(c.item.order, 0);
    assert_eq!(
        scope_ids(&service, menu_id, None),
        vec![c.item.id, a.item.id, b.item.id]
    );
    assert_menu_clean(&service, menu_id);
}

#[test]
fn deleting_a_root_promotes_its_children_to_roots() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let existing = service.create_item(link(menu_id, None, None, "E")).unwrap();
    let r = service.create_item(link(menu_id, None, None, "R")).unwrap();
    let x = service
        .create_item(link(menu_id, Some(r.item.id), None, "X"))
        .unwrap();
    let y = service
        .create_item(link(menu_id, Some(r.item.id), None, "Y"))
        .unwrap();

    let deleted = service.delete_item(r.item.id, None).unwrap();
    assert_eq!(deleted.promoted, vec![x.item.id, y.item.id]);

    // X and Y are roots now, renumbered after the pre-existing root.
    assert_eq!(
        scope_ids(&service, menu_id, None),
        vec![existing.item.id, x.item.id, y.item.id]
    );
    let x_reloaded = service
        .store()
        .load_item(x.item.id)
        .unwrap()
        .expect("x still exists");
    assert_eq!(x_reloaded.parent_id, None);
    assert_menu_clean(&service, menu_id);
}

#[test]
fn reorder_applies_exactly_and_rejects_partial_lists() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let a = service.create_item(link(menu_id, None, None, "A")).unwrap();
    let b = service.create_item(link(menu_id, None, None, "B")).unwrap();
    let c = service.create_item(link(menu_id, None, None, "C")).unwrap();

    let final_order = service
        .reorder_siblings(menu_id, None, &[b.item.id, a.item.id, c.item.id], None)
        .unwrap();
    let ids: Vec<ItemId> = final_order.iter().map(|x| x.item_id).collect();
    assert_eq!(ids, vec![b.item.id, a.item.id, c.item.id]);

    // A partial list must change nothing.
    let err = service
        .reorder_siblings(menu_id, None, &[b.item.id, a.item.id], None)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::SiblingSetMismatch);
    assert_eq!(
        scope_ids(&service, menu_id, None),
        vec![b.item.id, a.item.id, c.item.id]
    );
    assert_menu_clean(&service, menu_id);
}

#[test]
fn identity_reorder_is_idempotent() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let a = service.create_item(link(menu_id, None, None, "A")).unwrap();
    let b = service.create_item(link(menu_id, None, None, "B")).unwrap();

    let before = service
        .store()
        .load_item(a.item.id)
        .unwrap()
        .expect("a")
        .updated_at_us;

    let final_order = service
        .reorder_siblings(menu_id, None, &[a.item.id, b.item.id], None)
        .unwrap();
    assert_eq!(final_order.len(), 2);

    let after = service
        .store()
        .load_item(a.item.id)
        .unwrap()
        .expect("a")
        .updated_at_us;
    assert_eq!(before, after, "identity reorder must not write");
}

#[test]
fn moving_a_subtree_across_menus_cascades_menu_ids() {
    let (mut service, menus) = service_with_menus(&["main", "footer"]);
    let (menu_1, menu_2) = (menus[0], menus[1]);

    let x = service.create_item(link(menu_1, None, None, "X")).unwrap();
    let d1 = service
        .create_item(link(menu_1, Some(x.item.id), None, "D1"))
        .unwrap();
    let d2 = service
        .create_item(link(menu_1, Some(d1.item.id), None, "D2"))
        .unwrap();
    let stays = service.create_item(link(menu_1, None, None, "S")).unwrap();

    let moved = service
        .move_item(MoveRequest {
            item_id: x.item.id,
            new_parent_id: None,
            new_menu_id: Some(menu_2),
            actor: None,
        })
        .unwrap();

    assert_eq!(moved.cascaded, 2);
    assert_eq!(moved.item.parent_id, None);
    assert_eq!(moved.item.menu_id, menu_2);

    for id in [x.item.id, d1.item.id, d2.item.id] {
        let node = service.store().load_item(id).unwrap().expect("node");
        assert_eq!(node.menu_id, menu_2);
    }

    // The origin root scope renumbered without X.
    assert_eq!(scope_ids(&service, menu_1, None), vec![stays.item.id]);
    assert_menu_clean(&service, menu_1);
    assert_menu_clean(&service, menu_2);
}

#[test]
fn moving_under_a_descendant_is_rejected_without_changes() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let a = service.create_item(link(menu_id, None, None, "A")).unwrap();
    let b = service
        .create_item(link(menu_id, Some(a.item.id), None, "B"))
        .unwrap();
    let c = service
        .create_item(link(menu_id, Some(b.item.id), None, "C"))
        .unwrap();

    let err = service
        .move_item(MoveRequest {
            item_id: a.item.id,
            new_parent_id: Some(c.item.id),
            new_menu_id: None,
            actor: None,
        })
        .unwrap_err();
    assert!(matches!(err, TreeError::CycleDetected { .. }));
    assert_eq!(err.code(), ErrorCode::CycleDetected);

    // Tree is unchanged.
    let a_reloaded = service.store().load_item(a.item.id).unwrap().expect("a");
    assert_eq!(a_reloaded.parent_id, None);
    let c_reloaded = service.store().load_item(c.item.id).unwrap().expect("c");
    assert_eq!(c_reloaded.parent_id, Some(b.item.id));
    assert_menu_clean(&service, menu_id);
}

#[test]
fn moving_under_a_parent_appends_and_renumbers_the_origin() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let parent = service.create_item(link(menu_id, None, None, "P")).unwrap();
    let first_child = service
        .create_item(link(menu_id, Some(parent.item.id), None, "C1"))
        .unwrap();
    let loose_a = service.create_item(link(menu_id, None, None, "LA")).unwrap();
    let loose_b = service.create_item(link(menu_id, None, None, "LB")).unwrap();

    let moved = service
        .move_item(MoveRequest {
            item_id: loose_a.item.id,
            new_parent_id: Some(parent.item.id),
            new_menu_id: None,
            actor: None,
        })
        .unwrap();

    assert_eq!(moved.item.order, 1, "appended after the existing child");
    assert_eq!(
        scope_ids(&service, menu_id, Some(parent.item.id)),
        vec![first_child.item.id, loose_a.item.id]
    );
    assert_eq!(
        scope_ids(&service, menu_id, None),
        vec![parent.item.id, loose_b.item.id]
    );
    assert_menu_clean(&service, menu_id);
}

#[test]
fn update_item_changes_content_but_not_structure() {
    let (mut service, menus) = service_with_menus(&["main"]);
    let menu_id = menus[0];

    let a = service.create_item(link(menu_id, None, None, "A")).unwrap();
    let b = service.create_item(link(menu_id, None, None, "B")).unwrap();

    let updated = service
        .update_item(
            b.item.id,
            ItemPatch {
                kind: Some(ItemKind::External),
                payload: Some(serde_json::json!({ "url": "https://example.com" })),
                actor: Some("reviewer".to_string()),
            },
        )
        .unwrap();

    assert_eq!(updated.kind, ItemKind::External);
    assert_eq!(updated.order, 1);
    assert_eq!(scope_ids(&service, menu_id, None), vec![a.item.id, b.item.id]);
    assert_menu_clean(&service, menu_id);
}

#[test]
fn a_long_operation_sequence_keeps_every_invariant() {
    let (mut service, menus) = service_with_menus(&["main", "footer"]);
    let (menu_1, menu_2) = (menus[0], menus[1]);

    let mut roots = Vec::new();
    for label in ["A", "B", "C", "D"] {
        roots.push(
            service
                .create_item(link(menu_1, None, Some(0), label))
                .unwrap()
                .item
                .id,
        );
    }
    let nested = service
        .create_item(link(menu_1, Some(roots[0]), None, "N"))
        .unwrap();

    service
        .move_item(MoveRequest {
            item_id: roots[1],
            new_parent_id: Some(roots[0]),
            new_menu_id: None,
            actor: None,
        })
        .unwrap();
    service.delete_item(roots[2], None).unwrap();
    service
        .move_item(MoveRequest {
            item_id: roots[0],
            new_parent_id: None,
            new_menu_id: Some(menu_2),
            actor: None,
        })
        .unwrap();
    service.delete_item(nested.item.id, None).unwrap();

    assert_menu_clean(&service, menu_1);
    assert_menu_clean(&service, menu_2);
}
