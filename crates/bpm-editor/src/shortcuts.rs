//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. While a text
//! input has focus, plain keys belong to the input: typing `v` or pressing
//! Backspace in a label field never reaches the canvas.

use crate::input::Modifiers;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    // ── Tool switching ──
    ToolSelect,
    ToolConnect,

    // ── Edge mode ──
    EdgeSequence,
    EdgeMessage,
    EdgeAssociation,

    // ── Edit ──
    Undo,
    Redo,
    Delete,
    Save,

    // ── UI ──
    Deselect,
}

/// Resolves key events into shortcut actions.
///
/// `meta` is ⌘ on macOS, `ctrl` plays the same role elsewhere.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"z"`, `"Delete"`).
    pub fn resolve(
        key: &str,
        modifiers: Modifiers,
        text_focused: bool,
    ) -> Option<ShortcutAction> {
        let cmd = modifiers.command();

        if cmd && modifiers.shift {
            return match key {
                "z" | "Z" if !text_focused => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                _ => None,
            };
        }

        if cmd {
            return match key {
                // Text fields keep their native undo.
                "z" | "Z" if !text_focused => Some(ShortcutAction::Undo),
                "y" | "Y" if !text_focused => Some(ShortcutAction::Redo),
                "s" | "S" => Some(ShortcutAction::Save),
                _ => None,
            };
        }

        if key == "Escape" {
            return Some(ShortcutAction::Deselect);
        }
        if text_focused || modifiers.alt {
            return None;
        }

        match key {
            "v" | "V" => Some(ShortcutAction::ToolSelect),
            "c" | "C" => Some(ShortcutAction::ToolConnect),
            "1" => Some(ShortcutAction::EdgeSequence),
            "2" => Some(ShortcutAction::EdgeMessage),
            "3" => Some(ShortcutAction::EdgeAssociation),
            "Delete" | "Backspace" => Some(ShortcutAction::Delete),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: Modifiers = Modifiers::NONE;

    fn cmd() -> Modifiers {
        Modifiers {
            meta: true,
            ..NONE
        }
    }

    fn ctrl() -> Modifiers {
        Modifiers {
            ctrl: true,
            ..NONE
        }
    }

    #[test]
    fn resolve_tool_shortcuts() {
        assert_eq!(
            ShortcutMap::resolve("v", NONE, false),
            Some(ShortcutAction::ToolSelect)
        );
        assert_eq!(
            ShortcutMap::resolve("c", NONE, false),
            Some(ShortcutAction::ToolConnect)
        );
    }

    #[test]
    fn resolve_edge_modes() {
        assert_eq!(
            ShortcutMap::resolve("1", NONE, false),
            Some(ShortcutAction::EdgeSequence)
        );
        assert_eq!(
            ShortcutMap::resolve("2", NONE, false),
            Some(ShortcutAction::EdgeMessage)
        );
        assert_eq!(
            ShortcutMap::resolve("3", NONE, false),
            Some(ShortcutAction::EdgeAssociation)
        );
    }

    #[test]
    fn resolve_undo_redo() {
        // Cmd+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", cmd(), false),
            Some(ShortcutAction::Undo)
        );
        // Ctrl+Z → Undo
        assert_eq!(
            ShortcutMap::resolve("z", ctrl(), false),
            Some(ShortcutAction::Undo)
        );
        // Cmd+Shift+Z → Redo
        assert_eq!(
            ShortcutMap::resolve("Z", Modifiers { shift: true, ..cmd() }, false),
            Some(ShortcutAction::Redo)
        );
        // Ctrl+Y → Redo
        assert_eq!(
            ShortcutMap::resolve("y", ctrl(), false),
            Some(ShortcutAction::Redo)
        );
    }

    #[test]
    fn resolve_save() {
        assert_eq!(
            ShortcutMap::resolve("s", cmd(), false),
            Some(ShortcutAction::Save)
        );
        // Saving works from inside a field too.
        assert_eq!(
            ShortcutMap::resolve("s", ctrl(), true),
            Some(ShortcutAction::Save)
        );
    }

    #[test]
    fn resolve_delete() {
        assert_eq!(
            ShortcutMap::resolve("Delete", NONE, false),
            Some(ShortcutAction::Delete)
        );
        assert_eq!(
            ShortcutMap::resolve("Backspace", NONE, false),
            Some(ShortcutAction::Delete)
        );
    }

    #[test]
    fn text_focus_guards_plain_keys() {
        assert_eq!(ShortcutMap::resolve("Backspace", NONE, true), None);
        assert_eq!(ShortcutMap::resolve("Delete", NONE, true), None);
        assert_eq!(ShortcutMap::resolve("v", NONE, true), None);
        assert_eq!(ShortcutMap::resolve("z", cmd(), true), None);
    }

    #[test]
    fn escape_always_deselects() {
        assert_eq!(
            ShortcutMap::resolve("Escape", NONE, false),
            Some(ShortcutAction::Deselect)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", NONE, true),
            Some(ShortcutAction::Deselect)
        );
    }

    #[test]
    fn unbound_keys() {
        assert_eq!(ShortcutMap::resolve("q", NONE, false), None);
        assert_eq!(ShortcutMap::resolve("x", cmd(), false), None);
    }
}
