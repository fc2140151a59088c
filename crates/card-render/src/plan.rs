//! Document → display list.
//!
//! Planning is the deterministic half of rendering: every visible node maps
//! to one `RenderItem` carrying its canvas transform, opacity, cache policy
//! and type-specific content in node-local coordinates. The painter turns
//! items into vello commands; tests inspect items directly.
//!
//! Sizes are baked into geometry (a 300×80 rect is a 300×80 rect, not a unit
//! rect scaled by 300×80), so resizes never compound with stroke width.

use crate::icons::IconLibrary;
use crate::image_cache::{ImageCache, ImageFetcher, Raster};
use crate::filters::{FilterOp, filter_ops};
use crate::text::{TextLayout, TextMeasure, layout_text};
use card_core::path::{fit_to_box, parse_path_data, subpaths_bounds};
use card_core::*;
use kurbo::{Affine, BezPath, Circle, Ellipse, Point, Rect, RoundedRect, Shape, Vec2};
use std::f64::consts::PI;

/// Whether an item is drawn directly or through the per-node bitmap cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Direct,
    Bitmap,
}

/// One filled and/or stroked outline in node-local space.
#[derive(Debug, Clone)]
pub struct PaintPath {
    pub path: BezPath,
    pub fill_rule: FillRule,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone)]
pub struct ImageContent {
    pub source: String,
    /// `None` until the source has loaded, or if it failed.
    pub raster: Option<Raster>,
    /// Source-space crop, `None` for the full image.
    pub crop: Option<Rect>,
    pub filters: Vec<FilterOp>,
    /// Applied inside the node box before drawing.
    pub flip: Affine,
    pub size: Vec2,
    pub corner_radius: f64,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone)]
pub struct TextContent {
    pub layout: TextLayout,
    pub fill: Color,
    pub font_family: String,
    pub font_size: f64,
    pub font_style: FontStyle,
    pub letter_spacing: f64,
}

#[derive(Debug, Clone)]
pub enum RenderContent {
    Text(TextContent),
    Image(ImageContent),
    Vector(Vec<PaintPath>),
}

#[derive(Debug, Clone)]
pub struct RenderItem {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Node-local → canvas.
    pub transform: Affine,
    pub opacity: f32,
    pub cache: CachePolicy,
    /// Node-local box, used for clipping and bitmap bounds.
    pub bounds: Rect,
    pub content: RenderContent,
}

/// What planning needs beyond the document.
pub struct RenderContext<'a> {
    /// Text node whose glyphs are hidden behind the edit overlay.
    pub editing: Option<NodeId>,
    pub images: &'a mut ImageCache,
    pub fetcher: &'a mut dyn ImageFetcher,
    pub icons: IconLibrary<'a>,
    pub measure: &'a dyn TextMeasure,
}

/// Plan every visible node in paint order.
pub fn plan_document(doc: &Document, ctx: &mut RenderContext<'_>) -> Vec<RenderItem> {
    let items: Vec<RenderItem> = doc.nodes.iter().filter_map(|n| plan_node(n, ctx)).collect();
    ctx.images.retain_live(|source| {
        doc.nodes
            .iter()
            .any(|n| n.props.as_image().is_some_and(|img| img.source == source))
    });
    log::trace!("planned {} of {} nodes", items.len(), doc.len());
    items
}

/// Plan one node. `None` for invisible nodes and for the text node under an
/// active edit session.
pub fn plan_node(node: &DrawableNode, ctx: &mut RenderContext<'_>) -> Option<RenderItem> {
    let g = &node.geometry;
    if !g.visible {
        return None;
    }
    if ctx.editing == Some(node.id) && node.kind() == NodeKind::Text {
        return None;
    }

    let (w, h) = (g.width as f64, g.height as f64);
    let mut cache = CachePolicy::Direct;
    let content = match &node.props {
        NodeProps::Text(t) => RenderContent::Text(TextContent {
            layout: layout_text(t, w, ctx.measure),
            fill: t.fill,
            font_family: t.font_family.clone(),
            font_size: t.font_size as f64,
            font_style: t.font_style,
            letter_spacing: t.letter_spacing as f64,
        }),
        NodeProps::Image(img) => {
            if image_needs_bitmap(img) {
                cache = CachePolicy::Bitmap;
            }
            RenderContent::Image(plan_image(img, w, h, ctx))
        }
        NodeProps::Icon(icon) => {
            let resolved = ctx.icons.resolve(icon);
            let stroke = icon.stroke.filter(Stroke::is_visible);
            RenderContent::Vector(
                resolved
                    .paths(w, h)
                    .into_iter()
                    .map(|path| PaintPath {
                        path,
                        fill_rule: FillRule::NonZero,
                        fill: Some(icon.fill),
                        stroke,
                    })
                    .collect(),
            )
        }
        NodeProps::Rect(s) => {
            let radius = (s.corner_radius as f64).clamp(0.0, w.min(h) / 2.0);
            let path = RoundedRect::new(0.0, 0.0, w, h, radius).to_path(0.1);
            RenderContent::Vector(vec![solid(path, s.fill, s.stroke)])
        }
        NodeProps::Circle(s) => {
            let path = Circle::new((w / 2.0, h / 2.0), w.min(h) / 2.0).to_path(0.1);
            RenderContent::Vector(vec![solid(path, s.fill, s.stroke)])
        }
        NodeProps::Ellipse(s) => {
            let path = Ellipse::new((w / 2.0, h / 2.0), (w / 2.0, h / 2.0), 0.0).to_path(0.1);
            RenderContent::Vector(vec![solid(path, s.fill, s.stroke)])
        }
        NodeProps::Star(s) => RenderContent::Vector(vec![solid(
            star_path(w, h, s.num_points, s.inner_ratio as f64),
            s.fill,
            s.stroke,
        )]),
        NodeProps::RegularPolygon(p) => {
            RenderContent::Vector(vec![solid(polygon_path(w, h, p.sides), p.fill, p.stroke)])
        }
        NodeProps::Path(p) => RenderContent::Vector(plan_subpaths(p, w, h)),
        NodeProps::Line(l) => RenderContent::Vector(vec![PaintPath {
            path: polyline(&l.points),
            fill_rule: FillRule::NonZero,
            fill: None,
            stroke: Some(l.stroke),
        }]),
        NodeProps::Arrow(l) => {
            let mut parts = vec![PaintPath {
                path: polyline(&l.points),
                fill_rule: FillRule::NonZero,
                fill: None,
                stroke: Some(l.stroke),
            }];
            if let Some(head) = arrow_head(&l.points, l.pointer_length as f64, l.pointer_width as f64) {
                parts.push(PaintPath {
                    path: head,
                    fill_rule: FillRule::NonZero,
                    fill: Some(l.stroke.color),
                    stroke: Some(l.stroke),
                });
            }
            RenderContent::Vector(parts)
        }
    };

    Some(RenderItem {
        id: node.id,
        kind: node.kind(),
        transform: g.transform(),
        opacity: g.opacity.clamp(0.0, 1.0),
        cache,
        bounds: g.local_rect(),
        content,
    })
}

/// Images are rasterized through the bitmap cache only when something
/// beyond a plain blit is needed.
pub fn image_needs_bitmap(img: &ImageProps) -> bool {
    img.filters.any_active() || img.corner_radius > 0.0 || img.stroke.is_some()
}

/// Flip inside a `width × height` box as a negative scale plus an equal
/// offset, so the flipped image covers the same box.
pub fn flip_transform(flip: Flip, width: f64, height: f64) -> Affine {
    let (sx, dx) = if flip.horizontal { (-1.0, width) } else { (1.0, 0.0) };
    let (sy, dy) = if flip.vertical { (-1.0, height) } else { (1.0, 0.0) };
    Affine::translate((dx, dy)) * Affine::scale_non_uniform(sx, sy)
}

fn plan_image(img: &ImageProps, w: f64, h: f64, ctx: &mut RenderContext<'_>) -> ImageContent {
    let raster = if img.source.is_empty() {
        None
    } else {
        let handle = ctx.images.get_or_fetch(&img.source, &mut *ctx.fetcher);
        ctx.images.raster(handle.source()).cloned()
    };
    let crop = (!img.crop.is_empty()).then(|| {
        Rect::new(
            img.crop.x as f64,
            img.crop.y as f64,
            (img.crop.x + img.crop.width) as f64,
            (img.crop.y + img.crop.height) as f64,
        )
    });
    ImageContent {
        source: img.source.clone(),
        raster,
        crop,
        filters: filter_ops(&img.filters),
        flip: flip_transform(img.flip, w, h),
        size: Vec2::new(w, h),
        corner_radius: (img.corner_radius as f64).clamp(0.0, w.min(h) / 2.0),
        stroke: img.stroke.filter(Stroke::is_visible),
    }
}

fn solid(path: BezPath, fill: Option<Color>, stroke: Option<Stroke>) -> PaintPath {
    PaintPath {
        path,
        fill_rule: FillRule::NonZero,
        fill,
        stroke: stroke.filter(Stroke::is_visible),
    }
}

fn plan_subpaths(p: &PathProps, w: f64, h: f64) -> Vec<PaintPath> {
    let Some(source) = subpaths_bounds(&p.subpaths) else {
        return Vec::new();
    };
    p.subpaths
        .iter()
        .filter_map(|sp| {
            let path = parse_path_data(&sp.data).ok()?;
            Some(PaintPath {
                path: fit_to_box(&path, source, w, h),
                fill_rule: sp.fill_rule,
                fill: p.fill,
                stroke: p.stroke.filter(Stroke::is_visible),
            })
        })
        .collect()
}

/// Star inscribed in the box, first point straight up.
pub fn star_path(w: f64, h: f64, num_points: u32, inner_ratio: f64) -> BezPath {
    let n = num_points.max(2) as usize;
    let center = Point::new(w / 2.0, h / 2.0);
    let outer = Vec2::new(w / 2.0, h / 2.0);
    let inner = outer * inner_ratio.clamp(0.0, 1.0);
    let mut path = BezPath::new();
    for i in 0..n * 2 {
        let r = if i % 2 == 0 { outer } else { inner };
        let angle = -PI / 2.0 + i as f64 * PI / n as f64;
        let p = center + Vec2::new(r.x * angle.cos(), r.y * angle.sin());
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

/// Regular polygon inscribed in the box, first vertex straight up.
pub fn polygon_path(w: f64, h: f64, sides: u32) -> BezPath {
    let n = sides.max(3) as usize;
    let center = Point::new(w / 2.0, h / 2.0);
    let mut path = BezPath::new();
    for i in 0..n {
        let angle = -PI / 2.0 + i as f64 * 2.0 * PI / n as f64;
        let p = center + Vec2::new(w / 2.0 * angle.cos(), h / 2.0 * angle.sin());
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

fn points_of(flat: &[f32]) -> impl Iterator<Item = Point> + '_ {
    flat.chunks_exact(2)
        .map(|c| Point::new(c[0] as f64, c[1] as f64))
}

fn polyline(flat: &[f32]) -> BezPath {
    let mut path = BezPath::new();
    for (i, p) in points_of(flat).enumerate() {
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path
}

/// Triangle at the last point, pointing along the final segment.
fn arrow_head(flat: &[f32], length: f64, width: f64) -> Option<BezPath> {
    let pts: Vec<Point> = points_of(flat).collect();
    let [.., from, tip] = pts.as_slice() else {
        return None;
    };
    let dir = *tip - *from;
    if dir.hypot() < f64::EPSILON || length <= 0.0 {
        return None;
    }
    let dir = dir.normalize();
    let normal = Vec2::new(-dir.y, dir.x) * (width / 2.0);
    let base = *tip - dir * length;
    let mut path = BezPath::new();
    path.move_to(*tip);
    path.line_to(base + normal);
    path.line_to(base - normal);
    path.close_path();
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ApproxMetrics;
    use card_core::factory::create_node;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn plan_one(node: &DrawableNode, editing: Option<NodeId>) -> Option<RenderItem> {
        let assets = StaticAssets::default();
        let mut images = ImageCache::new();
        let mut fetcher = |_: &str| {};
        let mut ctx = RenderContext {
            editing,
            images: &mut images,
            fetcher: &mut fetcher,
            icons: IconLibrary::new(&assets, "mdi"),
            measure: &ApproxMetrics,
        };
        plan_node(node, &mut ctx)
    }

    #[test]
    fn editing_text_node_is_suppressed() {
        let node = create_node(NodeKind::Text, Point::ZERO, &json!({"text": "Hi"}));
        assert!(plan_one(&node, None).is_some());
        assert!(plan_one(&node, Some(node.id)).is_none());
    }

    #[test]
    fn invisible_nodes_are_skipped() {
        let mut node = create_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        node.geometry.visible = false;
        assert!(plan_one(&node, None).is_none());
    }

    #[test]
    fn shape_geometry_uses_width_and_height() {
        let node = create_node(
            NodeKind::Rect,
            Point::new(5.0, 5.0),
            &json!({"width": 300.0, "height": 80.0}),
        );
        let item = plan_one(&node, None).unwrap();
        let RenderContent::Vector(paths) = &item.content else {
            panic!("expected vector content");
        };
        let b = paths[0].path.bounding_box();
        assert_eq!((b.width(), b.height()), (300.0, 80.0));
        assert_eq!(item.transform, Affine::translate((5.0, 5.0)));
    }

    #[test]
    fn image_bitmap_policy() {
        let mut img = ImageProps::default();
        assert!(!image_needs_bitmap(&img));
        img.corner_radius = 4.0;
        assert!(image_needs_bitmap(&img));
        img.corner_radius = 0.0;
        img.filters.sepia = true;
        assert!(image_needs_bitmap(&img));
        img.filters.sepia = false;
        img.stroke = Some(Stroke::default());
        assert!(image_needs_bitmap(&img));
    }

    #[test]
    fn flipped_image_stays_in_its_box() {
        let flip = Flip {
            horizontal: true,
            vertical: true,
        };
        let t = flip_transform(flip, 200.0, 100.0);
        let b = t.transform_rect_bbox(Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(b, Rect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(t * Point::new(0.0, 0.0), Point::new(200.0, 100.0));
    }

    #[test]
    fn multi_subpath_keeps_fill_rules() {
        let node = create_node(
            NodeKind::Path,
            Point::ZERO,
            &json!({
                "subpaths": [
                    {"data": "M0 0 L10 0 L10 10 Z", "fillRule": "nonzero"},
                    {"data": "M2 2 L8 2 L8 8 Z", "fillRule": "evenodd"},
                    {"data": "garbage", "fillRule": "evenodd"}
                ]
            }),
        );
        let item = plan_one(&node, None).unwrap();
        let RenderContent::Vector(paths) = &item.content else {
            panic!("expected vector content");
        };
        let rules: Vec<_> = paths.iter().map(|p| p.fill_rule).collect();
        assert_eq!(rules, vec![FillRule::NonZero, FillRule::EvenOdd]);
    }

    #[test]
    fn arrow_has_a_head() {
        let node = create_node(NodeKind::Arrow, Point::ZERO, &Value::Null);
        let item = plan_one(&node, None).unwrap();
        let RenderContent::Vector(paths) = &item.content else {
            panic!("expected vector content");
        };
        assert_eq!(paths.len(), 2);
        assert!(paths[0].fill.is_none());
        assert!(paths[1].fill.is_some());
    }

    #[test]
    fn star_alternates_radii() {
        let path = star_path(100.0, 100.0, 5, 0.5);
        assert_eq!(path.elements().len(), 11);
        let b = path.bounding_box();
        assert!((b.min_y() - 0.0).abs() < 1e-9);
    }
}
