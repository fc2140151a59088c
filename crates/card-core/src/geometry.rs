//! Canvas space ↔ host-surface space.
//!
//! The canvas draws nodes in document units inside a container element that
//! the host positions on screen, zooms (`stage_scale`) and pans
//! (`stage_position`). Anything the host overlays on top of the canvas, such
//! as the text-edit surface, must be placed in host space. All of that
//! translation goes through this module.

use crate::model::Geometry;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// How the canvas is mounted on the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostViewport {
    /// On-screen offset of the canvas container's top-left corner.
    pub container_offset: Vec2,
    /// Pan of the stage inside its container, in host pixels.
    pub stage_position: Vec2,
    /// Uniform zoom from document units to host pixels.
    pub stage_scale: f64,
}

impl Default for HostViewport {
    fn default() -> Self {
        Self {
            container_offset: Vec2::ZERO,
            stage_position: Vec2::ZERO,
            stage_scale: 1.0,
        }
    }
}

impl HostViewport {
    /// Canvas → host transform.
    pub fn canvas_to_host(&self) -> Affine {
        Affine::translate(self.container_offset + self.stage_position)
            * Affine::scale(self.stage_scale)
    }

    /// Map a host-space pointer position into canvas space.
    pub fn host_to_canvas_point(&self, p: Point) -> Point {
        self.canvas_to_host().inverse() * p
    }
}

/// A rectangle on the host surface, rotated by `rotation` degrees about its
/// own top-left corner (CSS `transform-origin: top left`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HostRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

impl HostRect {
    /// Corners clockwise from the anchor (top-left) corner.
    pub fn corners(&self) -> [Point; 4] {
        let t = Affine::translate((self.left, self.top)) * Affine::rotate(self.rotation.to_radians());
        [
            t * Point::new(0.0, 0.0),
            t * Point::new(self.width, 0.0),
            t * Point::new(self.width, self.height),
            t * Point::new(0.0, self.height),
        ]
    }
}

/// Place an un-rotated canvas-space box, rotated by `rotation_deg` about its
/// top-left corner, onto the host surface.
///
/// The result is axis-aligned to the un-rotated box and carries the rotation
/// separately, anchored at its own top-left, so applying that rotation on the
/// host reproduces the canvas node exactly at any angle.
pub fn to_host_space(rect: Rect, rotation_deg: f64, viewport: &HostViewport) -> HostRect {
    let anchor = viewport.canvas_to_host() * rect.origin();
    HostRect {
        left: anchor.x,
        top: anchor.y,
        width: rect.width() * viewport.stage_scale,
        height: rect.height() * viewport.stage_scale,
        rotation: rotation_deg,
    }
}

/// Host rectangle of a node's rendered box, including any live scale.
pub fn node_host_rect(geometry: &Geometry, viewport: &HostViewport) -> HostRect {
    let rect = Rect::new(
        geometry.x as f64,
        geometry.y as f64,
        (geometry.x + geometry.width * geometry.scale_x) as f64,
        (geometry.y + geometry.height * geometry.scale_y) as f64,
    );
    to_host_space(rect, geometry.rotation as f64, viewport)
}
