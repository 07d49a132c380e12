use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use super::{MenuId, ParseEnumError};

/// Identifier of a menu item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The three kinds of menu item.
///
/// The kind is an opaque discriminator to the tree engine: it is stored and
/// returned, never branched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Link to a content resource owned by the workspace.
    Resource,
    /// Link to an external URL.
    External,
    /// Free-form link.
    Link,
}

impl ItemKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::External => "external",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resource" => Ok(Self::Resource),
            "external" => Ok(Self::External),
            "link" => Ok(Self::Link),
            _ => Err(ParseEnumError {
                expected: "kind",
                got: s.to_string(),
            }),
        }
    }
}

/// One node in a menu's forest.
///
/// `order` is zero-based and dense among the item's siblings. `payload`
/// carries the content references (label translations, attachments, link
/// target) and is never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: ItemId,
    pub menu_id: MenuId,
    /// `None` means the item is a root of its menu.
    pub parent_id: Option<ItemId>,
    pub order: u32,
    pub kind: ItemKind,
    pub payload: serde_json::Value,
    pub created_at_us: i64,
    pub updated_at_us: i64,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}

impl MenuItem {
    /// The sibling scope this item belongs to.
    #[must_use]
    pub const fn scope(&self) -> SiblingScope {
        SiblingScope {
            menu_id: self.menu_id,
            parent_id: self.parent_id,
        }
    }

    /// The sibling scope of this item's direct children.
    #[must_use]
    pub const fn child_scope(&self) -> SiblingScope {
        SiblingScope {
            menu_id: self.menu_id,
            parent_id: Some(self.id),
        }
    }
}

/// The set of items sharing one `(menu, parent)` pair.
///
/// This is the unit over which sibling ordering is kept dense and
/// contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiblingScope {
    pub menu_id: MenuId,
    pub parent_id: Option<ItemId>,
}

impl SiblingScope {
    #[must_use]
    pub const fn new(menu_id: MenuId, parent_id: Option<ItemId>) -> Self {
        Self { menu_id, parent_id }
    }
}

impl fmt::Display for SiblingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.parent_id {
            Some(parent_id) => write!(f, "{}/{parent_id}", self.menu_id),
            None => write!(f, "{}/root", self.menu_id),
        }
    }
}

/// Current wall-clock time in microseconds since the Unix epoch.
#[must_use]
pub fn now_us() -> i64 {
    Utc::now().timestamp_micros()
}
