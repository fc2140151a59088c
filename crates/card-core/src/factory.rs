//! Node factory: new drawable nodes with type-correct defaults.
//!
//! Overrides arrive as loosely-typed JSON from UI panels and asset pickers.
//! Each key is merged over the defaults on its own; a value that does not
//! fit its slot is dropped with a warning and the default stays. The
//! factory therefore never fails.

use crate::assets::ShapeDefinition;
use crate::id::NodeId;
use crate::model::*;
use crate::path::subpaths_bounds;
use kurbo::{Point, Vec2};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const SHAPE_SIZE: f32 = 100.0;
const ICON_SIZE: f32 = 60.0;
const IMAGE_SIZE: f32 = 200.0;
const TEXT_WIDTH: f32 = 200.0;

/// Create a node of `kind` whose top-left sits at `origin`.
pub fn create_node(kind: NodeKind, origin: Point, overrides: &Value) -> DrawableNode {
    let empty = Map::new();
    let overrides = match overrides {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            log::warn!("ignoring non-object overrides for {}: {other}", kind.as_str());
            &empty
        }
    };

    let props = merged_props(kind, overrides);
    let (width, height) = default_size(&props, overrides);
    let defaults = Geometry {
        x: origin.x as f32,
        y: origin.y as f32,
        width,
        height,
        ..Geometry::default()
    };
    let mut geometry = merge_over(defaults, overrides);
    sanitize_geometry(&mut geometry, &defaults);

    let mut node = DrawableNode::new(NodeId::fresh(kind.id_prefix()), props, geometry);
    if let Some(Value::Bool(editable)) = overrides.get("editable") {
        node.editable = *editable;
    }
    if let Some(Value::Bool(locked)) = overrides.get("locked") {
        node.locked = *locked;
    }
    log::debug!("created {} {}", kind.as_str(), node.id);
    node
}

/// Create a path node from a shape-catalog entry.
pub fn create_catalog_shape(shape: &ShapeDefinition, origin: Point, fill: Color) -> DrawableNode {
    let overrides = serde_json::json!({
        "subpaths": shape.subpaths,
        "fill": fill,
        "scale": shape.scale,
    });
    create_node(NodeKind::Path, origin, &overrides)
}

/// Copy of `node` under a fresh ID, shifted by `offset`. Group tags are
/// dropped so the copy never silently joins the original's group.
pub fn duplicate_node(node: &DrawableNode, offset: Vec2) -> DrawableNode {
    let mut copy = node.clone();
    copy.id = NodeId::fresh(node.kind().id_prefix());
    copy.geometry.x += offset.x as f32;
    copy.geometry.y += offset.y as f32;
    copy.group = None;
    copy
}

fn merged_props(kind: NodeKind, overrides: &Map<String, Value>) -> NodeProps {
    match NodeProps::default_for(kind) {
        NodeProps::Text(p) => NodeProps::Text(merge_over(p, overrides)),
        NodeProps::Image(p) => NodeProps::Image(merge_over(p, overrides)),
        NodeProps::Icon(p) => NodeProps::Icon(merge_over(p, overrides)),
        NodeProps::Rect(p) => NodeProps::Rect(merge_over(p, overrides)),
        NodeProps::Circle(p) => NodeProps::Circle(merge_over(p, overrides)),
        NodeProps::Ellipse(p) => NodeProps::Ellipse(merge_over(p, overrides)),
        NodeProps::Star(p) => NodeProps::Star(merge_over(p, overrides)),
        NodeProps::RegularPolygon(p) => NodeProps::RegularPolygon(merge_over(p, overrides)),
        NodeProps::Path(p) => NodeProps::Path(merge_over(p, overrides)),
        NodeProps::Line(p) => NodeProps::Line(merge_over(p, overrides)),
        NodeProps::Arrow(p) => NodeProps::Arrow(merge_over(p, overrides)),
    }
}

fn default_size(props: &NodeProps, overrides: &Map<String, Value>) -> (f32, f32) {
    match props {
        NodeProps::Text(t) => (TEXT_WIDTH, t.font_size * t.line_height),
        NodeProps::Image(_) => (IMAGE_SIZE, IMAGE_SIZE),
        NodeProps::Icon(_) => (ICON_SIZE, ICON_SIZE),
        NodeProps::Path(p) => {
            let scale = overrides
                .get("scale")
                .and_then(Value::as_f64)
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(1.0);
            match subpaths_bounds(&p.subpaths) {
                Some(bounds) => (
                    (bounds.width() * scale) as f32,
                    (bounds.height() * scale) as f32,
                ),
                None => (SHAPE_SIZE, SHAPE_SIZE),
            }
        }
        NodeProps::Line(l) | NodeProps::Arrow(l) => {
            let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
            let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
            for pair in l.points.chunks_exact(2) {
                min_x = min_x.min(pair[0]);
                max_x = max_x.max(pair[0]);
                min_y = min_y.min(pair[1]);
                max_y = max_y.max(pair[1]);
            }
            if min_x > max_x {
                (SHAPE_SIZE, l.stroke.width)
            } else {
                (max_x - min_x, (max_y - min_y).max(l.stroke.width))
            }
        }
        NodeProps::Rect(_)
        | NodeProps::Circle(_)
        | NodeProps::Ellipse(_)
        | NodeProps::Star(_)
        | NodeProps::RegularPolygon(_) => (SHAPE_SIZE, SHAPE_SIZE),
    }
}

/// Merge JSON `overrides` over `defaults` one key at a time, keeping only the
/// keys that still deserialize. Keys unknown to `T` are ignored by serde.
fn merge_over<T: Serialize + DeserializeOwned>(defaults: T, overrides: &Map<String, Value>) -> T {
    let mut base = match serde_json::to_value(&defaults) {
        Ok(Value::Object(map)) => map,
        _ => return defaults,
    };
    for (key, value) in overrides {
        let previous = base.insert(key.clone(), value.clone());
        if serde_json::from_value::<T>(Value::Object(base.clone())).is_err() {
            log::warn!("override `{key}` = {value} does not fit; keeping default");
            match previous {
                Some(p) => base.insert(key.clone(), p),
                None => base.remove(key),
            };
        }
    }
    serde_json::from_value(Value::Object(base)).unwrap_or(defaults)
}

fn sanitize_geometry(g: &mut Geometry, defaults: &Geometry) {
    let finite_or = |v: f32, d: f32| if v.is_finite() { v } else { d };
    g.x = finite_or(g.x, defaults.x);
    g.y = finite_or(g.y, defaults.y);
    g.rotation = finite_or(g.rotation, 0.0);
    g.width = finite_or(g.width, defaults.width).max(MIN_DIMENSION);
    g.height = finite_or(g.height, defaults.height).max(MIN_DIMENSION);
    g.opacity = finite_or(g.opacity, 1.0).clamp(0.0, 1.0);
    g.scale_x = 1.0;
    g.scale_y = 1.0;
}
