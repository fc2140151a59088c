//! Command dispatcher: keyboard chords onto the editor's mutation entry
//! points.
//!
//! Shortcuts run through the same `Editor` methods the panels and pointer
//! handlers call, so a shortcut and a button can never disagree. While focus
//! is in a native text input, including the text-edit overlay, every
//! shortcut is suppressed and the key belongs to the input.

use crate::editor::Editor;
use crate::input::{InputEvent, Modifiers};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::text_edit::{KeyOutcome, OverlayKey};
use card_core::ZOrder;
use card_core::kurbo::Point;

/// Where a key event ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRoute {
    /// The text-edit overlay consumed it.
    Overlay(KeyOutcome),
    /// A shortcut ran. `changed` is false when it was a no-op.
    Shortcut { action: ShortcutAction, changed: bool },
    /// Suppressed or unbound; the host should handle it normally.
    Ignored,
}

impl Editor {
    /// Run a shortcut action. Returns true if the document or selection
    /// changed.
    pub fn apply_action(&mut self, action: ShortcutAction) -> bool {
        log::debug!("shortcut {action:?}");
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Copy => {
                self.copy_selection();
                false
            }
            ShortcutAction::Cut => self.cut_selection().is_some(),
            ShortcutAction::Paste => !self.paste(None).is_empty(),
            ShortcutAction::Duplicate => !self.duplicate_selection().is_empty(),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => {
                self.select_all();
                true
            }
            ShortcutAction::Deselect => {
                let had = !self.selection().is_empty();
                self.deselect();
                had
            }
            ShortcutAction::Group => self.group_selection().is_some(),
            ShortcutAction::Ungroup => self.ungroup_selection(),
            ShortcutAction::ToggleLock => self.toggle_lock(),
            ShortcutAction::BringForward => self.reorder_selection(ZOrder::Forward),
            ShortcutAction::SendBackward => self.reorder_selection(ZOrder::Backward),
            ShortcutAction::BringToFront => self.reorder_selection(ZOrder::Front),
            ShortcutAction::SendToBack => self.reorder_selection(ZOrder::Back),
            ShortcutAction::Nudge { dx, dy, large } => {
                let step = if large {
                    self.config.nudge_step_large
                } else {
                    self.config.nudge_step
                };
                self.nudge_selection(dx as f32 * step, dy as f32 * step)
            }
        }
    }

    /// Resolve and run a keyboard shortcut. `None` when suppressed (focus in
    /// a text input or the overlay) or unbound.
    pub fn dispatch_key(
        &mut self,
        key: &str,
        modifiers: Modifiers,
        focus_in_text_input: bool,
    ) -> Option<(ShortcutAction, bool)> {
        if focus_in_text_input || self.is_editing() {
            return None;
        }
        let action = ShortcutMap::resolve(
            key,
            modifiers.ctrl,
            modifiers.shift,
            modifiers.alt,
            modifiers.meta,
        )?;
        let changed = self.apply_action(action);
        Some((action, changed))
    }

    /// Route one input event. Returns true if the host should redraw.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        let revision = self.revision();
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                self.pointer_down(Point::new(*x as f64, *y as f64), *modifiers);
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                self.pointer_move(Point::new(*x as f64, *y as f64), *modifiers);
            }
            InputEvent::PointerUp { x, y, modifiers } => {
                self.pointer_up(Point::new(*x as f64, *y as f64), *modifiers);
            }
            InputEvent::Key { key, modifiers } => {
                self.handle_key(key, *modifiers, false);
            }
        }
        self.revision() != revision
    }

    /// Full key routing: the overlay gets the key while a text edit is
    /// active, otherwise it is tried as a shortcut.
    pub fn handle_key(&mut self, key: &str, modifiers: Modifiers, focus_in_text_input: bool) -> KeyRoute {
        if self.is_editing() {
            if modifiers.command() {
                return KeyRoute::Ignored;
            }
            return match OverlayKey::from_key(key, modifiers.shift)
                .and_then(|k| self.text_edit_key(&k))
            {
                Some(outcome) => KeyRoute::Overlay(outcome),
                None => KeyRoute::Ignored,
            };
        }
        match self.dispatch_key(key, modifiers, focus_in_text_input) {
            Some((action, changed)) => KeyRoute::Shortcut { action, changed },
            None => KeyRoute::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    const CMD: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    #[test]
    fn events_route_to_gestures_and_shortcuts() {
        let mut editor = Editor::default();
        let id = editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        editor.deselect();

        assert!(editor.handle_event(&InputEvent::from_pointer_down(10.0, 10.0, Modifiers::NONE)));
        assert!(editor.handle_event(&InputEvent::from_pointer_move(30.0, 10.0, Modifiers::NONE)));
        assert!(editor.handle_event(&InputEvent::from_pointer_up(30.0, 10.0, Modifiers::NONE)));
        assert_eq!(editor.node(id).unwrap().geometry.x, 20.0);

        let undo = InputEvent::Key {
            key: "z".into(),
            modifiers: CMD,
        };
        assert!(editor.handle_event(&undo));
        assert_eq!(editor.node(id).unwrap().geometry.x, 0.0);
    }

    #[test]
    fn arrows_nudge_by_configured_steps() {
        let mut editor = Editor::default();
        let id = editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        editor.dispatch_key("ArrowRight", Modifiers::NONE, false);
        editor.dispatch_key("ArrowDown", Modifiers::SHIFT, false);
        let g = editor.node(id).unwrap().geometry;
        assert_eq!((g.x, g.y), (1.0, 10.0));
    }

    #[test]
    fn shortcuts_are_suppressed_in_text_inputs() {
        let mut editor = Editor::default();
        editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        assert_eq!(editor.dispatch_key("Delete", Modifiers::NONE, true), None);
        assert_eq!(editor.document().len(), 1);
        assert_eq!(
            editor.dispatch_key("Delete", Modifiers::NONE, false),
            Some((ShortcutAction::Delete, true))
        );
        assert!(editor.document().is_empty());
    }

    #[test]
    fn undo_redo_chords() {
        let mut editor = Editor::default();
        editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        editor.dispatch_key("z", CMD, false);
        assert!(editor.document().is_empty());
        editor.dispatch_key("Z", Modifiers { shift: true, ..CMD }, false);
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn overlay_owns_keys_while_editing() {
        let mut editor = Editor::default();
        let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "A"}));
        editor.enter_text_edit(id);

        assert_eq!(
            editor.handle_key("Backspace", Modifiers::NONE, true),
            KeyRoute::Overlay(KeyOutcome::Continue)
        );
        assert_eq!(editor.document().len(), 1);
        assert_eq!(editor.handle_key("z", CMD, true), KeyRoute::Ignored);
        assert_eq!(
            editor.handle_key("B", Modifiers::SHIFT, true),
            KeyRoute::Overlay(KeyOutcome::Continue)
        );
        assert_eq!(
            editor.handle_key("Enter", Modifiers::NONE, true),
            KeyRoute::Overlay(KeyOutcome::Commit)
        );
        assert_eq!(editor.node(id).unwrap().props.as_text().unwrap().text, "B");
    }

    #[test]
    fn grouping_and_z_order_chords() {
        let mut editor = Editor::default();
        let a = editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        let b = editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        editor.select_all();
        assert_eq!(
            editor.dispatch_key("g", CMD, false),
            Some((ShortcutAction::Group, true))
        );
        assert!(editor.node(a).unwrap().group.is_some());

        editor.deselect();
        editor.dispatch_key("Escape", Modifiers::NONE, false);
        editor.select(a, false);
        editor.dispatch_key("G", Modifiers { shift: true, ..CMD }, false);
        assert!(editor.node(b).unwrap().group.is_none());

        editor.select(a, false);
        editor.dispatch_key("]", Modifiers { shift: true, ..CMD }, false);
        assert_eq!(editor.document().nodes.last().map(|n| n.id), Some(a));
    }
}
