//! Transform controller: drag, resize and rotate commits.
//!
//! During a gesture the host (or the pointer handler in `gesture`) moves
//! the node live; nothing reaches history until release. On release the
//! live position becomes `x`/`y`, and any live scale is folded into
//! `width`/`height` so committed nodes always carry a scale of 1.
//!
//! Gestures on locked or read-only nodes, or while layout is disabled, are
//! dropped without a trace.

use crate::editor::Editor;
use card_core::kurbo::Point;
use card_core::{Document, DrawableNode, Geometry, NodeId, NodeProps};
use serde::{Deserialize, Serialize};

/// Live on-screen state of a node at some point of a transform gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveTransform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for LiveTransform {
    fn default() -> Self {
        Self::from_geometry(&Geometry::default())
    }
}

impl LiveTransform {
    pub fn from_geometry(g: &Geometry) -> Self {
        Self {
            x: g.x,
            y: g.y,
            rotation: g.rotation,
            scale_x: g.scale_x,
            scale_y: g.scale_y,
        }
    }

    fn is_finite(&self) -> bool {
        [self.x, self.y, self.rotation, self.scale_x, self.scale_y]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Set the committed position of a dragged node.
pub fn apply_drag(geometry: &mut Geometry, position: Point) -> bool {
    let (x, y) = (position.x as f32, position.y as f32);
    if !x.is_finite() || !y.is_finite() || (geometry.x == x && geometry.y == y) {
        return false;
    }
    geometry.x = x;
    geometry.y = y;
    true
}

/// Show `live` on the node without committing it.
pub fn apply_live(geometry: &mut Geometry, live: &LiveTransform) {
    if !live.is_finite() {
        return;
    }
    geometry.x = live.x;
    geometry.y = live.y;
    geometry.rotation = live.rotation;
    geometry.scale_x = live.scale_x;
    geometry.scale_y = live.scale_y;
}

/// Fold `live` into the node: position and rotation are taken as-is, the
/// scale is multiplied into the size (floored at `min_dimension`) and reset
/// to 1. Line points are scaled along with the box.
pub fn apply_transform(node: &mut DrawableNode, live: &LiveTransform, min_dimension: f32) {
    let live = if live.is_finite() {
        *live
    } else {
        LiveTransform::from_geometry(&node.geometry)
    };
    let (sx, sy) = (live.scale_x.abs(), live.scale_y.abs());
    let g = &mut node.geometry;
    g.x = live.x;
    g.y = live.y;
    g.rotation = live.rotation;
    g.width = (g.width * sx).max(min_dimension);
    g.height = (g.height * sy).max(min_dimension);
    g.scale_x = 1.0;
    g.scale_y = 1.0;

    if let NodeProps::Line(l) | NodeProps::Arrow(l) = &mut node.props
        && (sx != 1.0 || sy != 1.0)
    {
        for pair in l.points.chunks_exact_mut(2) {
            pair[0] *= sx;
            pair[1] *= sy;
        }
    }
}

impl Editor {
    /// Snapshot the document the first time a live gesture touches it.
    pub(crate) fn begin_live(&mut self) {
        if self.gesture.before.is_none() {
            self.gesture.before = Some(self.doc.clone());
        }
    }

    /// Close a live gesture: apply `f`, then record one step against the
    /// document as it was when the gesture started, if anything differs.
    pub(crate) fn finish_live(&mut self, label: &str, f: impl FnOnce(&mut Document)) -> bool {
        let before = self.gesture.before.take().unwrap_or_else(|| self.doc.clone());
        f(&mut self.doc);
        if self.doc == before {
            return false;
        }
        self.record(label, before);
        true
    }

    /// Abandon a live gesture and put everything back.
    pub fn cancel_gesture(&mut self) {
        if let Some(before) = self.gesture.before.take() {
            self.doc = before;
            self.touch();
            log::debug!("gesture cancelled");
        }
        self.gesture.reset();
    }

    /// Whether a gesture has moved nodes that are not yet committed.
    pub fn gesture_active(&self) -> bool {
        self.gesture.before.is_some()
    }

    /// Commit a finished drag of one node.
    pub fn drag_end(&mut self, id: NodeId, position: Point) -> bool {
        self.drag_end_many(&[(id, position)])
    }

    /// Commit a finished drag of several nodes as one step.
    pub fn drag_end_many(&mut self, moves: &[(NodeId, Point)]) -> bool {
        let moves: Vec<(NodeId, Point)> = moves
            .iter()
            .copied()
            .filter(|(id, _)| self.can_transform(*id))
            .collect();
        if moves.is_empty() {
            self.cancel_gesture();
            return false;
        }
        self.finish_live("move", |doc| {
            for (id, position) in moves {
                if let Some(node) = doc.get_mut(id) {
                    apply_drag(&mut node.geometry, position);
                }
            }
        })
    }

    /// Show an in-flight resize/rotate. Nothing is recorded until
    /// `transform_end`.
    pub fn preview_transform(&mut self, id: NodeId, live: &LiveTransform) -> bool {
        if !self.can_transform(id) {
            return false;
        }
        self.begin_live();
        if let Some(node) = self.doc.get_mut(id) {
            apply_live(&mut node.geometry, live);
        }
        self.touch();
        true
    }

    /// Commit a finished resize/rotate.
    pub fn transform_end(&mut self, id: NodeId, live: &LiveTransform) -> bool {
        if !self.can_transform(id) {
            self.cancel_gesture();
            return false;
        }
        let min = self.config.min_dimension;
        let committed = self.finish_live("transform", |doc| {
            if let Some(node) = doc.get_mut(id) {
                apply_transform(node, live, min);
            }
        });
        if committed
            && let Some(session) = self.session.as_mut()
            && let Some(node) = self.doc.get(session.node)
        {
            session.reposition(node, &self.viewport);
        }
        committed
    }
}
