//! [`MenuStore`] implementation over rusqlite.
//!
//! All reads return typed structs, never raw rows. `commit` applies the
//! whole batch inside one `BEGIN IMMEDIATE` transaction: the write lock is
//! taken up front, so two writers racing for the same sibling scope
//! serialize at the store instead of corrupting the ordering invariant.
//! Busy/locked failures surface as [`StoreError::Conflict`]; retrying is
//! the caller's decision.

#![allow(clippy::redundant_closure_for_method_calls)]

use anyhow::{Context, anyhow};
use rusqlite::{
    Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params, types::Type,
};
use std::str::FromStr;

use crate::db::migrations;
use crate::model::{ItemId, Menu, MenuId, MenuItem, SiblingScope};
use crate::store::{AuditStamp, MenuStore, Mutation, StoreError};

/// A [`MenuStore`] backed by a SQLite database.
#[derive(Debug)]
pub struct SqliteMenuStore {
    conn: Connection,
}

impl SqliteMenuStore {
    /// Wrap an already-configured connection (see [`super::open_store`]).
    #[must_use]
    pub const fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open a fresh in-memory store with the latest schema. For tests and
    /// short-lived tooling.
    ///
    /// # Errors
    ///
    /// Returns an error if opening or migrating the database fails.
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let mut conn = Connection::open_in_memory().context("open in-memory store")?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .context("enable foreign keys")?;
        migrations::migrate(&mut conn).context("apply store migrations")?;
        Ok(Self::from_connection(conn))
    }

    /// Borrow the underlying connection (for pragma checks and tooling).
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Register a menu container.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails (duplicate id, backend
    /// failure).
    pub fn create_menu(&mut self, menu: &Menu) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO menus \
                 (menu_id, workspace_id, name, location, created_at_us, updated_at_us) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    menu.id.to_string(),
                    menu.workspace_id.to_string(),
                    menu.name,
                    menu.location.map(|location| location.to_string()),
                    menu.created_at_us,
                    menu.updated_at_us,
                ],
            )
            .map_err(|e| classify(e, "insert menu"))?;
        Ok(())
    }
}

const ITEM_SELECT: &str = "SELECT item_id, menu_id, parent_id, sort_order, kind, payload, \
     created_at_us, updated_at_us, created_by, updated_by \
     FROM menu_items";

fn parse_text<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_menu(row: &Row<'_>) -> rusqlite::Result<Menu> {
    let raw_id: String = row.get(0)?;
    let raw_workspace: String = row.get(1)?;
    let raw_location: Option<String> = row.get(3)?;

    let location = raw_location
        .as_deref()
        .map(|raw| parse_text(3, raw))
        .transpose()?;

    Ok(Menu {
        id: parse_text(0, &raw_id)?,
        workspace_id: parse_text(1, &raw_workspace)?,
        name: row.get(2)?,
        location,
        created_at_us: row.get(4)?,
        updated_at_us: row.get(5)?,
    })
}

fn row_to_item(row: &Row<'_>) -> rusqlite::Result<MenuItem> {
    let raw_id: String = row.get(0)?;
    let raw_menu: String = row.get(1)?;
    let raw_parent: Option<String> = row.get(2)?;
    let raw_kind: String = row.get(4)?;
    let raw_payload: String = row.get(5)?;

    let parent_id = raw_parent
        .as_deref()
        .map(|raw| parse_text(2, raw))
        .transpose()?;
    let payload = serde_json::from_str(&raw_payload)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(MenuItem {
        id: parse_text(0, &raw_id)?,
        menu_id: parse_text(1, &raw_menu)?,
        parent_id,
        order: row.get(3)?,
        kind: parse_text(4, &raw_kind)?,
        payload,
        created_at_us: row.get(6)?,
        updated_at_us: row.get(7)?,
        created_by: row.get(8)?,
        updated_by: row.get(9)?,
    })
}

fn classify(e: rusqlite::Error, what: &'static str) -> StoreError {
    if matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    ) {
        StoreError::Conflict(e.to_string())
    } else {
        StoreError::Backend(anyhow::Error::new(e).context(what))
    }
}

fn expect_one_row(rows: usize, item_id: ItemId) -> Result<(), StoreError> {
    if rows == 1 {
        Ok(())
    } else {
        Err(StoreError::Backend(anyhow!(
            "mutation touched {rows} rows for item '{item_id}'"
        )))
    }
}

fn apply_mutation(
    tx: &Transaction<'_>,
    mutation: &Mutation,
    stamp: &AuditStamp,
) -> Result<(), StoreError> {
    match mutation {
        Mutation::CreateItem(item) => {
            let payload = serde_json::to_string(&item.payload)
                .map_err(|e| StoreError::Backend(anyhow::Error::new(e).context("encode payload")))?;
            tx.execute(
                "INSERT INTO menu_items \
                 (item_id, menu_id, parent_id, sort_order, kind, payload, \
                  created_at_us, updated_at_us, created_by, updated_by) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    item.id.to_string(),
                    item.menu_id.to_string(),
                    item.parent_id.map(|id| id.to_string()),
                    item.order,
                    item.kind.to_string(),
                    payload,
                    item.created_at_us,
                    item.updated_at_us,
                    item.created_by,
                    item.updated_by,
                ],
            )
            .map_err(|e| classify(e, "insert menu item"))?;
            Ok(())
        }
        Mutation::UpdateOrder { item_id, order } => {
            let rows = tx
                .execute(
                    "UPDATE menu_items \
                     SET sort_order = ?2, updated_at_us = ?3, updated_by = ?4 \
                     WHERE item_id = ?1",
                    params![item_id.to_string(), order, stamp.at_us, stamp.actor],
                )
                .map_err(|e| classify(e, "update sort order"))?;
            expect_one_row(rows, *item_id)
        }
        Mutation::UpdateParent { item_id, parent_id } => {
            let rows = tx
                .execute(
                    "UPDATE menu_items \
                     SET parent_id = ?2, updated_at_us = ?3, updated_by = ?4 \
                     WHERE item_id = ?1",
                    params![
                        item_id.to_string(),
                        parent_id.map(|id| id.to_string()),
                        stamp.at_us,
                        stamp.actor,
                    ],
                )
                .map_err(|e| classify(e, "update parent"))?;
            expect_one_row(rows, *item_id)
        }
        Mutation::UpdateMenu { item_id, menu_id } => {
            let rows = tx
                .execute(
                    "UPDATE menu_items \
                     SET menu_id = ?2, updated_at_us = ?3, updated_by = ?4 \
                     WHERE item_id = ?1",
                    params![
                        item_id.to_string(),
                        menu_id.to_string(),
                        stamp.at_us,
                        stamp.actor,
                    ],
                )
                .map_err(|e| classify(e, "update menu"))?;
            expect_one_row(rows, *item_id)
        }
        Mutation::UpdatePayload {
            item_id,
            kind,
            payload,
        } => {
            let encoded = serde_json::to_string(payload)
                .map_err(|e| StoreError::Backend(anyhow::Error::new(e).context("encode payload")))?;
            let rows = tx
                .execute(
                    "UPDATE menu_items \
                     SET kind = ?2, payload = ?3, updated_at_us = ?4, updated_by = ?5 \
                     WHERE item_id = ?1",
                    params![
                        item_id.to_string(),
                        kind.to_string(),
                        encoded,
                        stamp.at_us,
                        stamp.actor,
                    ],
                )
                .map_err(|e| classify(e, "update payload"))?;
            expect_one_row(rows, *item_id)
        }
        Mutation::DeleteItem { item_id } => {
            let rows = tx
                .execute(
                    "DELETE FROM menu_items WHERE item_id = ?1",
                    params![item_id.to_string()],
                )
                .map_err(|e| classify(e, "delete menu item"))?;
            expect_one_row(rows, *item_id)
        }
    }
}

impl MenuStore for SqliteMenuStore {
    fn load_menu(&self, menu_id: MenuId) -> Result<Option<Menu>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT menu_id, workspace_id, name, location, created_at_us, updated_at_us \
                 FROM menus WHERE menu_id = ?1",
            )
            .context("prepare load_menu")?;

        let menu = stmt
            .query_row(params![menu_id.to_string()], row_to_menu)
            .optional()
            .with_context(|| format!("load_menu '{menu_id}'"))?;
        Ok(menu)
    }

    fn load_item(&self, item_id: ItemId) -> Result<Option<MenuItem>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT} WHERE item_id = ?1"))
            .context("prepare load_item")?;

        let item = stmt
            .query_row(params![item_id.to_string()], row_to_item)
            .optional()
            .with_context(|| format!("load_item '{item_id}'"))?;
        Ok(item)
    }

    fn load_sibling_scope(&self, scope: &SiblingScope) -> Result<Vec<MenuItem>, StoreError> {
        let mut items = Vec::new();
        match scope.parent_id {
            Some(parent_id) => {
                let mut stmt = self
                    .conn
                    .prepare(&format!(
                        "{ITEM_SELECT} WHERE menu_id = ?1 AND parent_id = ?2 \
                         ORDER BY sort_order ASC, item_id ASC"
                    ))
                    .context("prepare load_sibling_scope")?;
                let rows = stmt
                    .query_map(
                        params![scope.menu_id.to_string(), parent_id.to_string()],
                        row_to_item,
                    )
                    .context("execute load_sibling_scope")?;
                for row in rows {
                    items.push(row.context("read sibling row")?);
                }
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare(&format!(
                        "{ITEM_SELECT} WHERE menu_id = ?1 AND parent_id IS NULL \
                         ORDER BY sort_order ASC, item_id ASC"
                    ))
                    .context("prepare load_sibling_scope (roots)")?;
                let rows = stmt
                    .query_map(params![scope.menu_id.to_string()], row_to_item)
                    .context("execute load_sibling_scope (roots)")?;
                for row in rows {
                    items.push(row.context("read sibling row")?);
                }
            }
        }
        Ok(items)
    }

    fn load_subtree(&self, item_id: ItemId) -> Result<Vec<MenuItem>, StoreError> {
        let Some(root) = self.load_item(item_id)? else {
            return Ok(Vec::new());
        };

        let mut stmt = self
            .conn
            .prepare(&format!(
                "{ITEM_SELECT} WHERE parent_id = ?1 \
                 ORDER BY sort_order ASC, item_id ASC"
            ))
            .context("prepare load_subtree children query")?;

        // Iterative breadth-first expansion over the parent index.
        let mut result = vec![root];
        let mut cursor = 0;
        while cursor < result.len() {
            let current = result[cursor].id;
            let rows = stmt
                .query_map(params![current.to_string()], row_to_item)
                .with_context(|| format!("load children of '{current}'"))?;
            for row in rows {
                result.push(row.context("read subtree row")?);
            }
            cursor += 1;
        }
        Ok(result)
    }

    fn load_menu_items(&self, menu_id: MenuId) -> Result<Vec<MenuItem>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT} WHERE menu_id = ?1"))
            .context("prepare load_menu_items")?;

        let rows = stmt
            .query_map(params![menu_id.to_string()], row_to_item)
            .context("execute load_menu_items")?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.context("read menu item row")?);
        }
        Ok(items)
    }

    fn commit(&mut self, mutations: &[Mutation], stamp: &AuditStamp) -> Result<(), StoreError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| classify(e, "begin commit transaction"))?;

        for mutation in mutations {
            apply_mutation(&tx, mutation, stamp)?;
        }

        tx.commit().map_err(|e| classify(e, "commit mutation batch"))
    }
}
