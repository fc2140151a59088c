//! Typed property edits.
//!
//! A `NodePatch` names only the fields it changes. Fields that do not apply
//! to the node's type are ignored, and the node's type itself can never be
//! changed through a patch.

use crate::model::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    // Geometry
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
    pub opacity: Option<f32>,
    pub visible: Option<bool>,

    // Paint
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
    pub remove_stroke: bool,
    pub corner_radius: Option<f32>,

    // Text
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub align: Option<TextAlign>,
    pub line_height: Option<f32>,
    pub letter_spacing: Option<f32>,
    pub decoration: Option<TextDecoration>,
    pub shadow: Option<Shadow>,
    pub remove_shadow: bool,

    // Image
    pub source: Option<String>,
    pub crop: Option<Crop>,
    pub filters: Option<ImageFilters>,
    pub flip_horizontal: Option<bool>,
    pub flip_vertical: Option<bool>,

    // Icon / shapes / paths / lines
    pub icon_name: Option<String>,
    pub num_points: Option<u32>,
    pub inner_ratio: Option<f32>,
    pub sides: Option<u32>,
    pub subpaths: Option<Vec<SubPath>>,
    pub points: Option<Vec<f32>>,
}

/// Assign `value` if it differs; report whether anything changed.
fn set<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

fn set_finite(slot: &mut f32, value: Option<f32>) -> bool {
    set(slot, value.filter(|v| v.is_finite()))
}

impl NodePatch {
    /// Apply to `node`. Width and height are floored at `min_dimension`.
    /// Returns true if the node changed.
    pub fn apply(&self, node: &mut DrawableNode, min_dimension: f32) -> bool {
        let mut changed = self.apply_geometry(&mut node.geometry, min_dimension);
        changed |= self.apply_props(&mut node.props);
        changed
    }

    fn apply_geometry(&self, g: &mut Geometry, min_dimension: f32) -> bool {
        let mut changed = false;
        changed |= set_finite(&mut g.x, self.x);
        changed |= set_finite(&mut g.y, self.y);
        changed |= set_finite(&mut g.width, self.width.map(|w| w.max(min_dimension)));
        changed |= set_finite(&mut g.height, self.height.map(|h| h.max(min_dimension)));
        changed |= set_finite(&mut g.rotation, self.rotation);
        changed |= set_finite(&mut g.opacity, self.opacity.map(|o| o.clamp(0.0, 1.0)));
        changed |= set(&mut g.visible, self.visible);
        changed
    }

    fn apply_stroke(&self, stroke: &mut Option<Stroke>) -> bool {
        if self.remove_stroke {
            return stroke.take().is_some();
        }
        set(stroke, self.stroke.map(Some))
    }

    fn apply_props(&self, props: &mut NodeProps) -> bool {
        let mut changed = false;
        match props {
            NodeProps::Text(t) => {
                changed |= set(&mut t.text, self.text.clone());
                changed |= set(&mut t.font_family, self.font_family.clone());
                changed |= set_finite(&mut t.font_size, self.font_size.map(|s| s.max(1.0)));
                changed |= set(&mut t.font_style.bold, self.bold);
                changed |= set(&mut t.font_style.italic, self.italic);
                changed |= set(&mut t.align, self.align);
                changed |= set_finite(&mut t.line_height, self.line_height);
                changed |= set_finite(&mut t.letter_spacing, self.letter_spacing);
                changed |= set(&mut t.decoration, self.decoration);
                changed |= set(&mut t.fill, self.fill);
                if self.remove_shadow {
                    changed |= t.shadow.take().is_some();
                } else {
                    changed |= set(&mut t.shadow, self.shadow.map(Some));
                }
            }
            NodeProps::Image(img) => {
                changed |= set(&mut img.source, self.source.clone());
                changed |= set(&mut img.crop, self.crop);
                changed |= set(&mut img.filters, self.filters);
                changed |= set(&mut img.flip.horizontal, self.flip_horizontal);
                changed |= set(&mut img.flip.vertical, self.flip_vertical);
                changed |= set_finite(&mut img.corner_radius, self.corner_radius);
                changed |= self.apply_stroke(&mut img.stroke);
            }
            NodeProps::Icon(icon) => {
                changed |= set(&mut icon.name, self.icon_name.clone());
                changed |= set(&mut icon.fill, self.fill);
                changed |= self.apply_stroke(&mut icon.stroke);
            }
            NodeProps::Rect(s) | NodeProps::Circle(s) | NodeProps::Ellipse(s) => {
                changed |= set(&mut s.fill, self.fill.map(Some));
                changed |= self.apply_stroke(&mut s.stroke);
                changed |= set_finite(&mut s.corner_radius, self.corner_radius);
            }
            NodeProps::Star(s) => {
                changed |= set(&mut s.fill, self.fill.map(Some));
                changed |= self.apply_stroke(&mut s.stroke);
                changed |= set(&mut s.num_points, self.num_points.map(|n| n.max(2)));
                changed |= set_finite(&mut s.inner_ratio, self.inner_ratio);
            }
            NodeProps::RegularPolygon(p) => {
                changed |= set(&mut p.fill, self.fill.map(Some));
                changed |= self.apply_stroke(&mut p.stroke);
                changed |= set(&mut p.sides, self.sides.map(|n| n.max(3)));
            }
            NodeProps::Path(p) => {
                changed |= set(&mut p.fill, self.fill.map(Some));
                changed |= self.apply_stroke(&mut p.stroke);
                changed |= set(
                    &mut p.subpaths,
                    self.subpaths.clone().map(|v| v.into_iter().collect()),
                );
            }
            NodeProps::Line(l) | NodeProps::Arrow(l) => {
                // Lines always have a stroke; removing it is not meaningful.
                changed |= set(&mut l.stroke, self.stroke);
                changed |= set(&mut l.points, self.points.clone());
            }
        }
        changed
    }
}
