//! Pointer gestures: click-select, drag-move and marquee selection.
//!
//! ## Modifier behaviors
//!
//! | Modifier | On a node | On empty canvas |
//! |----------|-----------|-----------------|
//! | **Shift** | Toggle in/out of selection; axis-constrain drag | Add marquee hits to selection |
//!
//! A drag moves the selected nodes live and records one history step on
//! release. Locked and read-only nodes stay selected but never move.

use crate::editor::Editor;
use crate::input::Modifiers;
use card_core::kurbo::{Point, Rect, Vec2};
use card_core::{Document, NodeId, NodeKind};
use card_render::{hit_test, hit_test_rect};

/// Marquee drags smaller than this (canvas units) count as a click.
const MARQUEE_MIN: f64 = 2.0;

#[derive(Debug, Clone)]
struct Drag {
    last: Point,
    targets: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy)]
struct Marquee {
    start: Point,
    current: Point,
    additive: bool,
}

/// In-flight pointer state. `before` holds the document as it was when the
/// first live change of the gesture happened.
#[derive(Debug, Clone, Default)]
pub struct PointerGesture {
    pub(crate) before: Option<Document>,
    drag: Option<Drag>,
    marquee: Option<Marquee>,
}

impl PointerGesture {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Normalized marquee rectangle in canvas space.
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.marquee
            .map(|m| Rect::from_points(m.start, m.current).abs())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

impl Editor {
    pub fn gesture(&self) -> &PointerGesture {
        &self.gesture
    }

    fn canvas_point(&self, host: Point) -> Point {
        self.viewport.host_to_canvas_point(host)
    }

    /// Topmost node under a host-space point.
    pub fn node_at(&self, host: Point) -> Option<NodeId> {
        hit_test(&self.doc, self.canvas_point(host))
    }

    /// Pointer pressed at a host-space position. Returns the node hit.
    pub fn pointer_down(&mut self, host: Point, modifiers: Modifiers) -> Option<NodeId> {
        // Clicking anywhere outside the overlay ends the edit
        self.commit_text_edit();
        self.cancel_gesture();

        let p = self.canvas_point(host);
        let hit = hit_test(&self.doc, p);
        match hit {
            Some(id) => {
                if modifiers.shift {
                    self.selection.select(&self.doc, id, true);
                } else if !self.selection.contains(id) {
                    self.selection.select(&self.doc, id, false);
                }
                if self.selection.contains(id) {
                    let targets: Vec<NodeId> = self
                        .selection
                        .ids()
                        .iter()
                        .copied()
                        .filter(|id| self.can_transform(*id))
                        .collect();
                    if !targets.is_empty() {
                        self.gesture.drag = Some(Drag { last: p, targets });
                    }
                }
            }
            None => {
                if !modifiers.shift {
                    self.selection.clear();
                }
                self.gesture.marquee = Some(Marquee {
                    start: p,
                    current: p,
                    additive: modifiers.shift,
                });
            }
        }
        log::trace!("pointer down at {p:?} hit {hit:?}");
        self.touch();
        hit
    }

    /// Pointer moved. Returns true if anything needs a redraw.
    pub fn pointer_move(&mut self, host: Point, modifiers: Modifiers) -> bool {
        let p = self.canvas_point(host);
        if let Some(marquee) = self.gesture.marquee.as_mut() {
            marquee.current = p;
            self.touch();
            return true;
        }
        let Some(drag) = self.gesture.drag.as_mut() else {
            return false;
        };
        let mut delta: Vec2 = p - drag.last;
        drag.last = p;
        // Shift: constrain to dominant axis
        if modifiers.shift {
            if delta.x.abs() > delta.y.abs() {
                delta.y = 0.0;
            } else {
                delta.x = 0.0;
            }
        }
        if delta == Vec2::ZERO {
            return false;
        }
        let targets = drag.targets.clone();
        self.begin_live();
        for id in targets {
            if let Some(node) = self.doc.get_mut(id) {
                node.geometry.x += delta.x as f32;
                node.geometry.y += delta.y as f32;
            }
        }
        self.touch();
        true
    }

    /// Pointer released. Commits a drag or resolves a marquee. Returns true
    /// if the document or selection changed.
    pub fn pointer_up(&mut self, host: Point, modifiers: Modifiers) -> bool {
        let changed = self.pointer_move(host, modifiers);
        let gesture = std::mem::take(&mut self.gesture);

        if let Some(marquee) = gesture.marquee {
            let rect = Rect::from_points(marquee.start, marquee.current).abs();
            if rect.width() > MARQUEE_MIN || rect.height() > MARQUEE_MIN {
                let hits = hit_test_rect(&self.doc, rect);
                if !marquee.additive {
                    self.selection.clear();
                }
                self.selection.extend(&self.doc, hits);
            }
            self.touch();
            return true;
        }

        if gesture.drag.is_some() {
            // finish_live takes the snapshot back out of the gesture slot
            self.gesture.before = gesture.before;
            return self.finish_live("move", |_| {});
        }
        changed
    }

    /// Double click: enter text editing on a text node under the pointer.
    pub fn double_click(&mut self, host: Point) -> bool {
        match self.node_at(host) {
            Some(id) if self.doc.get(id).is_some_and(|n| n.kind() == NodeKind::Text) => {
                self.enter_text_edit(id)
            }
            _ => false,
        }
    }
}
