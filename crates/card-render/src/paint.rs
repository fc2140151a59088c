//! Display list → Vello drawing commands.
//!
//! Walks the planned `RenderItem`s in paint order and emits fills, strokes
//! and image draws. Glyph runs need a font context, which the host owns;
//! text items paint their decoration lines here and leave glyphs to the
//! host surface.

use crate::filters::BitmapCache;
use crate::image_cache::Raster;
use crate::plan::{CachePolicy, ImageContent, PaintPath, RenderContent, RenderItem, TextContent};
use card_core::{Color as CardColor, FillRule, Stroke};
use kurbo::{Affine, Cap, Join, Rect, RoundedRect, Stroke as KurboStroke};
use peniko::{Blob, BlendMode, Color, Fill, Image, ImageFormat};
use vello::Scene;

/// Vello painter. Keeps the per-node bitmap cache between frames.
#[derive(Debug, Default)]
pub struct Painter {
    bitmaps: BitmapCache,
}

impl Painter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bitmaps(&self) -> &BitmapCache {
        &self.bitmaps
    }

    /// Paint a full frame: background, then every item in order.
    ///
    /// Call once per frame with a freshly-cleared `Scene`.
    pub fn paint(&mut self, scene: &mut Scene, page: Rect, background: CardColor, items: &[RenderItem]) {
        scene.fill(Fill::NonZero, Affine::IDENTITY, to_color(background, 1.0), None, &page);
        for item in items {
            self.paint_item(scene, item);
        }
        self.bitmaps.retain(|id| items.iter().any(|i| i.id == id));
    }

    fn paint_item(&mut self, scene: &mut Scene, item: &RenderItem) {
        let layered = item.opacity < 1.0;
        if layered {
            scene.push_layer(BlendMode::default(), item.opacity, item.transform, &item.bounds);
        }

        match &item.content {
            RenderContent::Vector(paths) => {
                for p in paths {
                    paint_path(scene, item.transform, p);
                }
            }
            RenderContent::Text(text) => paint_text(scene, item, text),
            RenderContent::Image(image) => self.paint_image(scene, item, image),
        }

        if layered {
            scene.pop_layer();
        }
    }

    fn paint_image(&mut self, scene: &mut Scene, item: &RenderItem, image: &ImageContent) {
        let Some(raster) = &image.raster else {
            log::trace!("image {} not loaded yet", item.id);
            return;
        };
        let raster = match item.cache {
            CachePolicy::Bitmap => self
                .bitmaps
                .get_or_render(item.id, &image.source, raster, &image.filters),
            CachePolicy::Direct => raster.clone(),
        };

        let source = image
            .crop
            .unwrap_or_else(|| Rect::new(0.0, 0.0, raster.width as f64, raster.height as f64));
        if source.width() <= 0.0 || source.height() <= 0.0 {
            return;
        }
        let fit = Affine::scale_non_uniform(
            image.size.x / source.width(),
            image.size.y / source.height(),
        ) * Affine::translate(-source.origin().to_vec2());
        let frame = RoundedRect::from_rect(item.bounds, image.corner_radius);

        scene.push_layer(BlendMode::default(), 1.0, item.transform, &frame);
        scene.draw_image(&to_image(&raster), item.transform * image.flip * fit);
        scene.pop_layer();

        if let Some(stroke) = image.stroke {
            scene.stroke(
                &kurbo_stroke(&stroke),
                item.transform,
                to_color(stroke.color, 1.0),
                None,
                &frame,
            );
        }
    }
}

// ─── Item painters ───────────────────────────────────────────────────────

fn paint_path(scene: &mut Scene, transform: Affine, p: &PaintPath) {
    if let Some(fill) = p.fill {
        let rule = match p.fill_rule {
            FillRule::NonZero => Fill::NonZero,
            FillRule::EvenOdd => Fill::EvenOdd,
        };
        scene.fill(rule, transform, to_color(fill, 1.0), None, &p.path);
    }
    if let Some(stroke) = &p.stroke {
        scene.stroke(&kurbo_stroke(stroke), transform, to_color(stroke.color, 1.0), None, &p.path);
    }
}

fn paint_text(scene: &mut Scene, item: &RenderItem, text: &TextContent) {
    log::trace!(
        "TEXT {} {} line(s), {}px {}",
        item.id,
        text.layout.line_count(),
        text.font_size,
        text.font_family
    );
    let stroke = KurboStroke::new(text.layout.decoration_thickness);

    if let Some(shadow) = text.layout.shadow {
        let offset = Affine::translate((shadow.offset_x as f64, shadow.offset_y as f64));
        let color = to_color(shadow.color, shadow.opacity);
        for line in &text.layout.decorations {
            scene.stroke(&stroke, item.transform * offset, color, None, line);
        }
    }
    for line in &text.layout.decorations {
        scene.stroke(&stroke, item.transform, to_color(text.fill, 1.0), None, line);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn kurbo_stroke(stroke: &Stroke) -> KurboStroke {
    KurboStroke {
        width: stroke.width as f64,
        join: Join::Miter,
        start_cap: Cap::Butt,
        end_cap: Cap::Butt,
        ..Default::default()
    }
}

fn to_color(c: CardColor, alpha: f32) -> Color {
    Color::new([c.r, c.g, c.b, c.a * alpha.clamp(0.0, 1.0)])
}

fn to_image(raster: &Raster) -> Image {
    Image::new(
        Blob::from((*raster.pixels).clone()),
        ImageFormat::Rgba8,
        raster.width,
        raster.height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icons::IconLibrary;
    use crate::image_cache::ImageCache;
    use crate::plan::{RenderContext, plan_document};
    use crate::text::ApproxMetrics;
    use card_core::factory::create_node;
    use card_core::{Document, NodeKind, StaticAssets};
    use kurbo::Point;
    use serde_json::json;

    #[test]
    fn paints_filtered_images_through_bitmap_cache() {
        let mut doc = Document::default();
        doc.push(create_node(
            NodeKind::Image,
            Point::ZERO,
            &json!({"source": "a.png", "filters": {"grayscale": true}}),
        ));
        doc.push(create_node(NodeKind::Star, Point::new(50.0, 50.0), &json!({"opacity": 0.5})));

        let assets = StaticAssets::default();
        let mut images = ImageCache::new();
        let mut fetcher = |_: &str| {};
        images.complete("a.png", Ok(Raster::new(1, 1, vec![9, 9, 9, 255])));
        let mut ctx = RenderContext {
            editing: None,
            images: &mut images,
            fetcher: &mut fetcher,
            icons: IconLibrary::new(&assets, "mdi"),
            measure: &ApproxMetrics,
        };
        let items = plan_document(&doc, &mut ctx);

        let mut painter = Painter::new();
        let mut scene = Scene::new();
        let page = Rect::new(0.0, 0.0, doc.width as f64, doc.height as f64);
        painter.paint(&mut scene, page, doc.background, &items);
        painter.paint(&mut scene, page, doc.background, &items);
        assert_eq!(painter.bitmaps().rebuilds(), 1);
        assert_eq!(painter.bitmaps().len(), 1);
    }
}
