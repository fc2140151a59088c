//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. The map lives
//! in Rust so the browser bridge and native hosts share one table, and
//! `SHORTCUTS` publishes the same bindings for help surfaces.
//!
//! `Mod` is ⌘ on macOS and Ctrl elsewhere.

use serde::Serialize;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutAction {
    // ── Edit ──
    Undo,
    Redo,
    Copy,
    Cut,
    Paste,
    Duplicate,
    Delete,

    // ── Selection ──
    SelectAll,
    Deselect,

    // ── Arrange ──
    Group,
    Ungroup,
    ToggleLock,
    BringForward,
    SendBackward,
    BringToFront,
    SendToBack,

    /// Move the selection one step in a direction. `large` selects the
    /// larger step.
    Nudge { dx: i8, dy: i8, large: bool },
}

/// One row of the shortcut reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShortcutBinding {
    pub chord: &'static str,
    pub action: ShortcutAction,
    pub label: &'static str,
}

const fn bind(chord: &'static str, action: ShortcutAction, label: &'static str) -> ShortcutBinding {
    ShortcutBinding {
        chord,
        action,
        label,
    }
}

/// Every binding `ShortcutMap::resolve` knows, in display order.
pub const SHORTCUTS: &[ShortcutBinding] = &[
    bind("Mod+Z", ShortcutAction::Undo, "Undo"),
    bind("Mod+Shift+Z", ShortcutAction::Redo, "Redo"),
    bind("Mod+Y", ShortcutAction::Redo, "Redo"),
    bind("Mod+C", ShortcutAction::Copy, "Copy"),
    bind("Mod+X", ShortcutAction::Cut, "Cut"),
    bind("Mod+V", ShortcutAction::Paste, "Paste"),
    bind("Mod+D", ShortcutAction::Duplicate, "Duplicate"),
    bind("Delete", ShortcutAction::Delete, "Delete"),
    bind("Backspace", ShortcutAction::Delete, "Delete"),
    bind("Mod+A", ShortcutAction::SelectAll, "Select all"),
    bind("Escape", ShortcutAction::Deselect, "Deselect"),
    bind("Mod+G", ShortcutAction::Group, "Group"),
    bind("Mod+Shift+G", ShortcutAction::Ungroup, "Ungroup"),
    bind("Mod+L", ShortcutAction::ToggleLock, "Lock / unlock"),
    bind("Mod+]", ShortcutAction::BringForward, "Bring forward"),
    bind("Mod+[", ShortcutAction::SendBackward, "Send backward"),
    bind("Mod+Shift+]", ShortcutAction::BringToFront, "Bring to front"),
    bind("Mod+Shift+[", ShortcutAction::SendToBack, "Send to back"),
    bind(
        "ArrowLeft",
        ShortcutAction::Nudge {
            dx: -1,
            dy: 0,
            large: false,
        },
        "Nudge left",
    ),
    bind(
        "ArrowRight",
        ShortcutAction::Nudge {
            dx: 1,
            dy: 0,
            large: false,
        },
        "Nudge right",
    ),
    bind(
        "ArrowUp",
        ShortcutAction::Nudge {
            dx: 0,
            dy: -1,
            large: false,
        },
        "Nudge up",
    ),
    bind(
        "ArrowDown",
        ShortcutAction::Nudge {
            dx: 0,
            dy: 1,
            large: false,
        },
        "Nudge down",
    ),
    bind(
        "Shift+ArrowLeft",
        ShortcutAction::Nudge {
            dx: -1,
            dy: 0,
            large: true,
        },
        "Nudge left (large)",
    ),
    bind(
        "Shift+ArrowRight",
        ShortcutAction::Nudge {
            dx: 1,
            dy: 0,
            large: true,
        },
        "Nudge right (large)",
    ),
    bind(
        "Shift+ArrowUp",
        ShortcutAction::Nudge {
            dx: 0,
            dy: -1,
            large: true,
        },
        "Nudge up (large)",
    ),
    bind(
        "Shift+ArrowDown",
        ShortcutAction::Nudge {
            dx: 0,
            dy: 1,
            large: true,
        },
        "Nudge down (large)",
    ),
];

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        // ── Modifier combos first (most specific) ──
        if cmd && shift {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Redo),
                "g" | "G" => Some(ShortcutAction::Ungroup),
                // Shift turns the bracket keys into braces on US layouts
                "[" | "{" => Some(ShortcutAction::SendToBack),
                "]" | "}" => Some(ShortcutAction::BringToFront),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "z" | "Z" => Some(ShortcutAction::Undo),
                "y" | "Y" => Some(ShortcutAction::Redo),
                "a" | "A" => Some(ShortcutAction::SelectAll),
                "d" | "D" => Some(ShortcutAction::Duplicate),
                "c" | "C" => Some(ShortcutAction::Copy),
                "x" | "X" => Some(ShortcutAction::Cut),
                "v" | "V" => Some(ShortcutAction::Paste),
                "g" | "G" => Some(ShortcutAction::Group),
                "l" | "L" => Some(ShortcutAction::ToggleLock),
                "[" => Some(ShortcutAction::SendBackward),
                "]" => Some(ShortcutAction::BringForward),
                _ => None,
            };
        }

        if let Some((dx, dy)) = arrow(key) {
            return Some(ShortcutAction::Nudge {
                dx,
                dy,
                large: shift,
            });
        }

        if shift {
            return None;
        }

        // ── Single keys (no modifiers) ──
        match key {
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            "Escape" => Some(ShortcutAction::Deselect),
            _ => None,
        }
    }
}

fn arrow(key: &str) -> Option<(i8, i8)> {
    match key {
        "ArrowLeft" => Some((-1, 0)),
        "ArrowRight" => Some((1, 0)),
        "ArrowUp" => Some((0, -1)),
        "ArrowDown" => Some((0, 1)),
        _ => None,
    }
}
