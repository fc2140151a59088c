//! Hit testing: point → node lookup.
//!
//! Walks the node list back to front (last painted = topmost). Points are
//! mapped into each node's local space through the inverse of its
//! transform, so rotated and live-scaled nodes hit exactly where they paint.

use card_core::{Document, DrawableNode, NodeId, NodeProps};
use kurbo::{Line, ParamCurveNearest, Point, Rect};

/// Minimum pick distance around lines, in canvas units.
const LINE_TOLERANCE: f64 = 4.0;

/// Find the topmost visible node at `p` (canvas space).
/// Returns `None` if no node is hit (background).
pub fn hit_test(doc: &Document, p: Point) -> Option<NodeId> {
    let hit = doc
        .nodes
        .iter()
        .rev()
        .find(|n| n.geometry.visible && node_contains(n, p))
        .map(|n| n.id);
    log::trace!("hit test ({:.1}, {:.1}) → {hit:?}", p.x, p.y);
    hit
}

/// Whether `p` (canvas space) falls on `node`.
pub fn node_contains(node: &DrawableNode, p: Point) -> bool {
    let g = &node.geometry;
    let transform = g.transform();
    if transform.determinant().abs() < f64::EPSILON {
        return false;
    }
    let local = transform.inverse() * p;
    match &node.props {
        NodeProps::Line(l) | NodeProps::Arrow(l) => {
            let tolerance = (l.stroke.width as f64 / 2.0).max(LINE_TOLERANCE);
            l.points
                .chunks_exact(2)
                .map(|c| Point::new(c[0] as f64, c[1] as f64))
                .collect::<Vec<_>>()
                .windows(2)
                .any(|seg| {
                    let line = Line::new(seg[0], seg[1]);
                    line.nearest(local, 1e-6).distance_sq <= tolerance * tolerance
                })
        }
        _ => {
            let r = g.local_rect();
            local.x >= r.x0 && local.x <= r.x1 && local.y >= r.y0 && local.y <= r.y1
        }
    }
}

/// Every visible node whose rotated bounds intersect `rect` (canvas space),
/// in paint order. Used for marquee (box) selection.
pub fn hit_test_rect(doc: &Document, rect: Rect) -> Vec<NodeId> {
    let rect = rect.abs();
    doc.nodes
        .iter()
        .filter(|n| n.geometry.visible)
        .filter(|n| {
            let b = n.geometry.bounding_box();
            b.x0 <= rect.x1 && b.x1 >= rect.x0 && b.y0 <= rect.y1 && b.y1 >= rect.y0
        })
        .map(|n| n.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::factory::create_node;
    use card_core::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn doc_with(nodes: Vec<DrawableNode>) -> Document {
        let mut doc = Document::default();
        for n in nodes {
            doc.push(n);
        }
        doc
    }

    #[test]
    fn topmost_node_wins() {
        let a = create_node(NodeKind::Rect, Point::new(10.0, 10.0), &Value::Null);
        let b = create_node(NodeKind::Rect, Point::new(50.0, 50.0), &Value::Null);
        let (a_id, b_id) = (a.id, b.id);
        let doc = doc_with(vec![a, b]);

        assert_eq!(hit_test(&doc, Point::new(15.0, 15.0)), Some(a_id));
        assert_eq!(hit_test(&doc, Point::new(80.0, 80.0)), Some(b_id));
        assert_eq!(hit_test(&doc, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn rotation_is_honored() {
        let node = create_node(
            NodeKind::Rect,
            Point::new(100.0, 100.0),
            &json!({"width": 100.0, "height": 20.0, "rotation": 90.0}),
        );
        let id = node.id;
        let doc = doc_with(vec![node]);
        // Rotated 90° clockwise about (100, 100): occupies x 80..100, y 100..200.
        assert_eq!(hit_test(&doc, Point::new(90.0, 150.0)), Some(id));
        assert_eq!(hit_test(&doc, Point::new(150.0, 110.0)), None);
    }

    #[test]
    fn invisible_nodes_are_not_hit() {
        let node = create_node(NodeKind::Rect, Point::ZERO, &json!({"visible": false}));
        let doc = doc_with(vec![node]);
        assert_eq!(hit_test(&doc, Point::new(5.0, 5.0)), None);
        assert!(hit_test_rect(&doc, Rect::new(0.0, 0.0, 50.0, 50.0)).is_empty());
    }

    #[test]
    fn lines_hit_near_their_segments() {
        let node = create_node(NodeKind::Line, Point::new(0.0, 100.0), &Value::Null);
        let id = node.id;
        let doc = doc_with(vec![node]);
        assert_eq!(hit_test(&doc, Point::new(50.0, 103.0)), Some(id));
        assert_eq!(hit_test(&doc, Point::new(50.0, 120.0)), None);
    }

    #[test]
    fn marquee_collects_intersecting_nodes() {
        let a = create_node(NodeKind::Rect, Point::new(0.0, 0.0), &Value::Null);
        let b = create_node(NodeKind::Rect, Point::new(300.0, 300.0), &Value::Null);
        let a_id = a.id;
        let doc = doc_with(vec![a, b]);
        // Dragged from bottom-right to top-left.
        assert_eq!(hit_test_rect(&doc, Rect::new(150.0, 150.0, 50.0, 50.0)), vec![a_id]);
    }
}
