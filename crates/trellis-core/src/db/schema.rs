//! Canonical SQLite schema for the menu store.
//!
//! Two tables:
//! - `menus` holds the containers, scoped to a workspace
//! - `menu_items` holds the forest; `sort_order` is dense and zero-based
//!   within each `(menu_id, parent_id)` scope
//!
//! The engine, not the schema, owns the ordering and acyclicity invariants:
//! SQL CHECKs guard the value domains, while scope density and cycle
//! freedom are maintained by computing every batch in memory and applying
//! it in one transaction.

/// Migration v1: containers and items.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS menus (
    menu_id TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    location TEXT CHECK (location IS NULL OR location IN ('header', 'footer', 'sidebar')),
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS menu_items (
    item_id TEXT PRIMARY KEY,
    menu_id TEXT NOT NULL REFERENCES menus(menu_id) ON DELETE CASCADE,
    parent_id TEXT REFERENCES menu_items(item_id),
    sort_order INTEGER NOT NULL CHECK (sort_order >= 0),
    kind TEXT NOT NULL CHECK (kind IN ('resource', 'external', 'link')),
    payload TEXT NOT NULL DEFAULT '{}',
    created_at_us INTEGER NOT NULL,
    updated_at_us INTEGER NOT NULL,
    created_by TEXT,
    updated_by TEXT,
    CHECK (item_id <> parent_id)
);
";

/// Migration v2: read-path indexes.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_menu_items_scope
    ON menu_items(menu_id, parent_id, sort_order);

CREATE INDEX IF NOT EXISTS idx_menu_items_parent
    ON menu_items(parent_id);

CREATE INDEX IF NOT EXISTS idx_menus_workspace
    ON menus(workspace_id);
";

/// Index names migrations must leave behind, for verification in tests.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_menu_items_scope",
    "idx_menu_items_parent",
    "idx_menus_workspace",
];
