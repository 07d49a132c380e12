//! Domain model: menus, menu items, and identifier newtypes.

pub mod item;
pub mod menu;

pub use item::{ItemId, ItemKind, MenuItem, SiblingScope, now_us};
pub use menu::{Menu, MenuId, MenuLocation, WorkspaceId};

use std::fmt;

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}
