//! In-place text editing.
//!
//! Two states: idle (`Editor::session` is `None`) and editing (one
//! `TextEditSession`). While editing, keystrokes only touch the session's
//! buffer; the document keeps the old text until commit, and the canvas
//! glyph of the edited node is suppressed by the render plan so exactly one
//! copy of the text is ever visible.
//!
//! The overlay is placed with `node_host_rect`: the un-rotated text box in
//! host pixels, rotated by the node's angle about its own top-left corner.
//! That keeps it on top of the canvas glyph at any rotation or zoom.

use crate::editor::Editor;
use card_core::{DrawableNode, HostRect, HostViewport, NodeId, NodeProps, TextProps, node_host_rect};
use card_render::{ApproxMetrics, TextMeasure, layout_text};
use serde::Serialize;

/// CSS-ready style of the overlay, copied from the node so the overlay
/// looks exactly like the glyph it replaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStyle {
    pub font_family: String,
    /// Host pixels (node font size × stage scale).
    pub font_size: f64,
    pub font_weight: &'static str,
    pub font_style: &'static str,
    pub color: String,
    /// Unitless multiplier, same as the node's.
    pub line_height: f32,
    pub text_align: &'static str,
    pub text_decoration: &'static str,
    /// Host pixels.
    pub letter_spacing: f64,
    pub opacity: f32,
}

impl OverlayStyle {
    pub fn from_props(props: &TextProps, opacity: f32, viewport: &HostViewport) -> Self {
        let scale = viewport.stage_scale;
        Self {
            font_family: props.font_family.clone(),
            font_size: props.font_size as f64 * scale,
            font_weight: if props.font_style.bold { "bold" } else { "normal" },
            font_style: if props.font_style.italic { "italic" } else { "normal" },
            color: props.fill.to_hex(),
            line_height: props.line_height,
            text_align: props.align.as_css(),
            text_decoration: props.decoration.as_css(),
            letter_spacing: props.letter_spacing as f64 * scale,
            opacity,
        }
    }
}

/// What a key did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keep editing.
    Continue,
    /// Accept the buffer.
    Commit,
    /// Abandon the buffer.
    Cancel,
}

/// Keys the overlay understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKey {
    Text(String),
    /// Enter; with `line_break` it inserts a newline instead of committing.
    Enter { line_break: bool },
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    Escape,
}

impl OverlayKey {
    /// Map a `KeyboardEvent.key` value. `None` for keys the overlay leaves
    /// to the host (Tab, function keys, ...).
    pub fn from_key(key: &str, shift: bool) -> Option<Self> {
        Some(match key {
            "Enter" => Self::Enter { line_break: shift },
            "Backspace" => Self::Backspace,
            "Delete" => Self::Delete,
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            "Home" => Self::Home,
            "End" => Self::End,
            "Escape" => Self::Escape,
            k if k.chars().count() == 1 => Self::Text(k.to_string()),
            _ => return None,
        })
    }
}

/// Remove every trailing line break. Other trailing whitespace is content.
pub fn committed_text(buffer: &str) -> &str {
    buffer.trim_end_matches(['\n', '\r'])
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextEditSession {
    pub node: NodeId,
    pub rect: HostRect,
    pub style: OverlayStyle,
    buffer: String,
    /// Byte offset, always on a char boundary.
    caret: usize,
    original: String,
}

impl TextEditSession {
    fn open(node: &DrawableNode, props: &TextProps, viewport: &HostViewport) -> Self {
        Self {
            node: node.id,
            rect: node_host_rect(&node.geometry, viewport),
            style: OverlayStyle::from_props(props, node.geometry.opacity, viewport),
            buffer: props.text.clone(),
            caret: props.text.len(),
            original: props.text.clone(),
        }
    }

    /// Follow the node after the viewport or its geometry changed.
    pub fn reposition(&mut self, node: &DrawableNode, viewport: &HostViewport) {
        self.rect = node_host_rect(&node.geometry, viewport);
        if let NodeProps::Text(props) = &node.props {
            self.style = OverlayStyle::from_props(props, node.geometry.opacity, viewport);
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_dirty(&self) -> bool {
        committed_text(&self.buffer) != self.original
    }

    /// Replace the whole buffer (host-managed input surfaces). The caret
    /// moves to the end.
    pub fn set_buffer(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.caret = self.buffer.len();
    }

    pub fn insert(&mut self, text: &str) {
        self.buffer.insert_str(self.caret, text);
        self.caret += text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.buffer[..self.caret].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.buffer[self.caret..]
            .chars()
            .next()
            .map(|c| self.caret + c.len_utf8())
    }

    /// Apply one key. Only `Enter` without line break, and `Escape`, end
    /// the session.
    pub fn handle_key(&mut self, key: &OverlayKey) -> KeyOutcome {
        match key {
            OverlayKey::Text(text) => self.insert(text),
            OverlayKey::Enter { line_break: true } => self.insert("\n"),
            OverlayKey::Enter { line_break: false } => return KeyOutcome::Commit,
            OverlayKey::Escape => return KeyOutcome::Cancel,
            OverlayKey::Backspace => {
                if let Some(at) = self.prev_boundary() {
                    self.buffer.replace_range(at..self.caret, "");
                    self.caret = at;
                }
            }
            OverlayKey::Delete => {
                if let Some(end) = self.next_boundary() {
                    self.buffer.replace_range(self.caret..end, "");
                }
            }
            OverlayKey::Left => {
                if let Some(at) = self.prev_boundary() {
                    self.caret = at;
                }
            }
            OverlayKey::Right => {
                if let Some(at) = self.next_boundary() {
                    self.caret = at;
                }
            }
            OverlayKey::Home => self.caret = self.line_start(),
            OverlayKey::End => self.caret = self.line_end(),
        }
        KeyOutcome::Continue
    }

    fn line_start(&self) -> usize {
        self.buffer[..self.caret].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self) -> usize {
        self.buffer[self.caret..]
            .find('\n')
            .map_or(self.buffer.len(), |i| self.caret + i)
    }
}

/// Everything a host needs to mount and size the overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub node: NodeId,
    pub rect: HostRect,
    pub style: OverlayStyle,
    pub text: String,
    /// Caret position in chars.
    pub caret: usize,
    /// Host-pixel height the overlay needs for the current buffer. Never
    /// smaller than the node box.
    pub height: f64,
}

impl Editor {
    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// Text node currently under the overlay.
    pub fn editing_node(&self) -> Option<NodeId> {
        self.session.as_ref().map(|s| s.node)
    }

    pub fn text_session(&self) -> Option<&TextEditSession> {
        self.session.as_ref()
    }

    /// Start editing `id`. Refused for non-text, locked or read-only nodes
    /// and while layout is disabled. Any other open session is committed
    /// first.
    pub fn enter_text_edit(&mut self, id: NodeId) -> bool {
        if self.session.as_ref().is_some_and(|s| s.node == id) {
            return true;
        }
        if !self.can_transform(id) {
            return false;
        }
        let Some(node) = self.doc.get(id) else {
            return false;
        };
        let NodeProps::Text(props) = &node.props else {
            log::debug!("rejected text edit of {id}: not a text node");
            return false;
        };
        let session = TextEditSession::open(node, props, &self.viewport);

        self.commit_text_edit();
        self.cancel_gesture();
        self.selection.clear();
        self.session = Some(session);
        self.touch();
        log::debug!("text edit: enter {id}");
        true
    }

    /// Feed a key to the active session, committing or cancelling when the
    /// key says so. `None` when no session is active.
    pub fn text_edit_key(&mut self, key: &OverlayKey) -> Option<KeyOutcome> {
        let outcome = self.session.as_mut()?.handle_key(key);
        match outcome {
            KeyOutcome::Continue => self.touch(),
            KeyOutcome::Commit => {
                self.commit_text_edit();
            }
            KeyOutcome::Cancel => self.cancel_text_edit(),
        }
        Some(outcome)
    }

    /// Replace the session buffer. Returns false when idle.
    pub fn set_text_buffer(&mut self, text: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.set_buffer(text);
        self.touch();
        true
    }

    /// Insert at the caret. Returns false when idle.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.insert(text);
        self.touch();
        true
    }

    /// Write the buffer into the node and close the session. Records one
    /// step if the text changed; returns whether it did.
    pub fn commit_text_edit(&mut self) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let text = committed_text(&session.buffer).to_string();
        let id = session.node;
        let changed = self.commit("edit text", |doc| {
            match doc.get_mut(id).map(|n| &mut n.props) {
                Some(NodeProps::Text(props)) if props.text != text => {
                    props.text = text;
                    true
                }
                _ => false,
            }
        });
        self.touch();
        log::debug!("text edit: commit {id} (changed: {changed})");
        changed
    }

    /// Close the session without touching the node.
    pub fn cancel_text_edit(&mut self) {
        if let Some(session) = self.session.take() {
            self.touch();
            log::debug!("text edit: cancel {}", session.node);
        }
    }

    /// The overlay lost focus.
    pub fn blur_text_edit(&mut self) -> bool {
        self.commit_text_edit()
    }

    /// Overlay placement, style and size, measured with approximate
    /// metrics.
    pub fn overlay(&self) -> Option<OverlayView> {
        self.overlay_with(&ApproxMetrics)
    }

    pub fn overlay_with(&self, measure: &dyn TextMeasure) -> Option<OverlayView> {
        let session = self.session.as_ref()?;
        let node = self.doc.get(session.node)?;
        let NodeProps::Text(props) = &node.props else {
            return None;
        };
        let live = TextProps {
            text: session.buffer.clone(),
            ..props.clone()
        };
        let layout = layout_text(&live, node.geometry.width as f64, measure);
        let height = (layout.height * self.viewport.stage_scale).max(session.rect.height);
        Some(OverlayView {
            node: session.node,
            rect: session.rect,
            style: session.style.clone(),
            text: session.buffer.clone(),
            caret: session.buffer[..session.caret].chars().count(),
            height,
        })
    }
}
