//! Canvas2D renderer for the planned display list.
//!
//! Draws `RenderItem`s directly using the browser's Canvas2D API, so the
//! webview needs no WebGPU. Images go through one scratch canvas per source
//! (or per node for filtered images) because `putImageData` ignores the
//! context transform.

use card_core::kurbo::{Affine, BezPath, PathEl, Rect};
use card_core::{Color, FillRule, NodeId, Shadow, Stroke, TextProps};
use card_render::plan::{ImageContent, PaintPath, TextContent};
use card_render::{
    ApproxMetrics, BitmapCache, CachePolicy, Raster, RenderContent, RenderItem, TextMeasure,
};
use std::collections::HashMap;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement, ImageData};

const SELECTION: &str = "#4FC3F7";

/// Frame-level inputs that are not part of the display list.
pub struct FrameChrome<'a> {
    pub width: f64,
    pub height: f64,
    pub page: Rect,
    pub background: Color,
    /// Canvas → host pixels.
    pub view: Affine,
    pub selected: &'a [NodeId],
    /// Canvas-space rubber band.
    pub marquee: Option<Rect>,
}

/// Text metrics taken from the live context, falling back to the
/// approximate table when the browser refuses.
pub struct CanvasMeasure<'a> {
    pub ctx: &'a CanvasRenderingContext2d,
}

impl TextMeasure for CanvasMeasure<'_> {
    fn advance(&self, ch: char, props: &TextProps) -> f64 {
        self.ctx.set_font(&css_font(
            props.font_style.as_css(),
            props.font_size as f64,
            &props.font_family,
        ));
        let mut buf = [0u8; 4];
        match self.ctx.measure_text(ch.encode_utf8(&mut buf)) {
            Ok(metrics) => metrics.width(),
            Err(_) => ApproxMetrics.advance(ch, props),
        }
    }
}

/// Canvas2D painter. Keeps decoded images and filtered bitmaps between
/// frames.
#[derive(Default)]
pub struct Canvas2dPainter {
    surfaces: HashMap<String, HtmlCanvasElement>,
    bitmaps: BitmapCache,
}

impl Canvas2dPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the decoded surface for a source, e.g. after a reload.
    pub fn forget(&mut self, source: &str) {
        self.surfaces.retain(|key, _| key != source && !key.ends_with(&format!("#{source}")));
    }

    pub fn paint(&mut self, ctx: &CanvasRenderingContext2d, chrome: &FrameChrome<'_>, items: &[RenderItem]) {
        let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        ctx.set_fill_style_str("#E5E7EB");
        ctx.fill_rect(0.0, 0.0, chrome.width, chrome.height);

        set_transform(ctx, chrome.view);
        ctx.set_fill_style_str(&chrome.background.to_hex());
        ctx.fill_rect(chrome.page.x0, chrome.page.y0, chrome.page.width(), chrome.page.height());

        for item in items {
            self.paint_item(ctx, chrome.view, item);
        }
        self.bitmaps.retain(|id| items.iter().any(|i| i.id == id));

        for item in items.iter().filter(|i| chrome.selected.contains(&i.id)) {
            draw_selection_frame(ctx, chrome.view * item.transform, item.bounds);
        }
        if let Some(rect) = chrome.marquee {
            set_transform(ctx, chrome.view);
            draw_marquee_rect(ctx, rect);
        }
    }

    fn paint_item(&mut self, ctx: &CanvasRenderingContext2d, view: Affine, item: &RenderItem) {
        ctx.save();
        set_transform(ctx, view * item.transform);
        ctx.set_global_alpha(item.opacity as f64);
        match &item.content {
            RenderContent::Vector(paths) => {
                for p in paths {
                    draw_paint_path(ctx, p);
                }
            }
            RenderContent::Text(text) => draw_text(ctx, text),
            RenderContent::Image(image) => self.draw_image(ctx, item, image),
        }
        ctx.restore();
    }

    fn draw_image(&mut self, ctx: &CanvasRenderingContext2d, item: &RenderItem, image: &ImageContent) {
        let Some(raster) = &image.raster else {
            // Placeholder until the fetch resolves
            ctx.set_fill_style_str("#F3F4F6");
            ctx.fill_rect(0.0, 0.0, image.size.x, image.size.y);
            return;
        };
        let (key, raster) = match item.cache {
            CachePolicy::Bitmap => (
                format!("{}#{}", item.id, image.source),
                self.bitmaps
                    .get_or_render(item.id, &image.source, raster, &image.filters),
            ),
            CachePolicy::Direct => (image.source.clone(), raster.clone()),
        };
        let Some(surface) = self.surface(&key, &raster) else {
            return;
        };

        let source = image
            .crop
            .unwrap_or_else(|| Rect::new(0.0, 0.0, raster.width as f64, raster.height as f64));
        if source.width() <= 0.0 || source.height() <= 0.0 {
            return;
        }

        ctx.save();
        rounded_rect_path(ctx, item.bounds, image.corner_radius);
        ctx.clip();
        let [a, b, c, d, e, f] = image.flip.as_coeffs();
        let _ = ctx.transform(a, b, c, d, e, f);
        let _ = ctx
            .draw_image_with_html_canvas_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                &surface,
                source.x0,
                source.y0,
                source.width(),
                source.height(),
                0.0,
                0.0,
                image.size.x,
                image.size.y,
            );
        ctx.restore();

        if let Some(stroke) = image.stroke {
            apply_stroke(ctx, &stroke);
            rounded_rect_path(ctx, item.bounds, image.corner_radius);
            ctx.stroke();
        }
    }

    /// Scratch canvas holding `raster`, created on first use.
    fn surface(&mut self, key: &str, raster: &Raster) -> Option<HtmlCanvasElement> {
        if let Some(canvas) = self.surfaces.get(key)
            && canvas.width() == raster.width
            && canvas.height() == raster.height
        {
            return Some(canvas.clone());
        }
        match upload(raster) {
            Ok(canvas) => {
                self.surfaces.insert(key.to_string(), canvas.clone());
                Some(canvas)
            }
            Err(err) => {
                log::warn!("could not upload image {key}: {err:?}");
                None
            }
        }
    }
}

fn upload(raster: &Raster) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(raster.width);
    canvas.set_height(raster.height);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;
    let data = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(raster.pixels.as_slice()),
        raster.width,
        raster.height,
    )?;
    ctx.put_image_data(&data, 0.0, 0.0)?;
    Ok(canvas)
}

// ─── Drawing primitives ─────────────────────────────────────────────────

fn draw_paint_path(ctx: &CanvasRenderingContext2d, p: &PaintPath) {
    trace_path(ctx, &p.path);
    if let Some(fill) = p.fill {
        ctx.set_fill_style_str(&fill.to_hex());
        match p.fill_rule {
            FillRule::NonZero => ctx.fill(),
            FillRule::EvenOdd => ctx.fill_with_canvas_winding_rule(CanvasWindingRule::Evenodd),
        }
    }
    if let Some(stroke) = &p.stroke {
        apply_stroke(ctx, stroke);
        ctx.stroke();
    }
}

fn draw_text(ctx: &CanvasRenderingContext2d, text: &TextContent) {
    ctx.set_font(&css_font(
        text.font_style.as_css(),
        text.font_size,
        &text.font_family,
    ));
    ctx.set_text_baseline("alphabetic");
    if let Some(shadow) = text.layout.shadow {
        apply_shadow(ctx, &shadow);
    }
    ctx.set_fill_style_str(&text.fill.to_hex());
    for line in &text.layout.lines {
        if line.word_gap > 0.0 || text.letter_spacing != 0.0 {
            // Justified or tracked: place each word ourselves
            let mut x = line.x;
            for (i, word) in line.text.split(' ').enumerate() {
                if i > 0 {
                    x += space_width(ctx, text) + line.word_gap;
                }
                let _ = ctx.fill_text(word, x, line.baseline);
                x += measure(ctx, word) + text.letter_spacing * word.chars().count() as f64;
            }
        } else {
            let _ = ctx.fill_text(&line.text, line.x, line.baseline);
        }
    }
    clear_shadow(ctx);

    if !text.layout.decorations.is_empty() {
        ctx.set_stroke_style_str(&text.fill.to_hex());
        ctx.set_line_width(text.layout.decoration_thickness);
        for line in &text.layout.decorations {
            ctx.begin_path();
            ctx.move_to(line.p0.x, line.p0.y);
            ctx.line_to(line.p1.x, line.p1.y);
            ctx.stroke();
        }
    }
}

fn draw_selection_frame(ctx: &CanvasRenderingContext2d, transform: Affine, bounds: Rect) {
    ctx.save();
    set_transform(ctx, transform);
    // Keep the outline one host pixel wide whatever the node scale
    let scale = transform.determinant().abs().sqrt().max(1e-6);
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_line_width(1.5 / scale);
    ctx.stroke_rect(bounds.x0, bounds.y0, bounds.width(), bounds.height());

    let size = 6.0 / scale;
    let half = size / 2.0;
    ctx.set_fill_style_str("#FFFFFF");
    for (hx, hy) in [
        (bounds.x0, bounds.y0),
        (bounds.x1, bounds.y0),
        (bounds.x0, bounds.y1),
        (bounds.x1, bounds.y1),
    ] {
        ctx.fill_rect(hx - half, hy - half, size, size);
        ctx.stroke_rect(hx - half, hy - half, size, size);
    }
    ctx.restore();
}

fn draw_marquee_rect(ctx: &CanvasRenderingContext2d, rect: Rect) {
    if rect.width() < 1.0 && rect.height() < 1.0 {
        return;
    }
    ctx.save();
    ctx.set_fill_style_str("rgba(79, 195, 247, 0.08)");
    ctx.fill_rect(rect.x0, rect.y0, rect.width(), rect.height());
    ctx.set_stroke_style_str(SELECTION);
    ctx.set_line_width(1.0);
    let _ = ctx.set_line_dash(&js_sys::Array::of2(
        &JsValue::from_f64(4.0),
        &JsValue::from_f64(4.0),
    ));
    ctx.stroke_rect(rect.x0, rect.y0, rect.width(), rect.height());
    ctx.restore();
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn set_transform(ctx: &CanvasRenderingContext2d, t: Affine) {
    let [a, b, c, d, e, f] = t.as_coeffs();
    let _ = ctx.set_transform(a, b, c, d, e, f);
}

fn trace_path(ctx: &CanvasRenderingContext2d, path: &BezPath) {
    ctx.begin_path();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => ctx.move_to(p.x, p.y),
            PathEl::LineTo(p) => ctx.line_to(p.x, p.y),
            PathEl::QuadTo(c, p) => ctx.quadratic_curve_to(c.x, c.y, p.x, p.y),
            PathEl::CurveTo(c1, c2, p) => ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathEl::ClosePath => ctx.close_path(),
        }
    }
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, r: Rect, radius: f64) {
    let radius = radius.min(r.width() / 2.0).min(r.height() / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(r.x0 + radius, r.y0);
    ctx.line_to(r.x1 - radius, r.y0);
    ctx.quadratic_curve_to(r.x1, r.y0, r.x1, r.y0 + radius);
    ctx.line_to(r.x1, r.y1 - radius);
    ctx.quadratic_curve_to(r.x1, r.y1, r.x1 - radius, r.y1);
    ctx.line_to(r.x0 + radius, r.y1);
    ctx.quadratic_curve_to(r.x0, r.y1, r.x0, r.y1 - radius);
    ctx.line_to(r.x0, r.y0 + radius);
    ctx.quadratic_curve_to(r.x0, r.y0, r.x0 + radius, r.y0);
    ctx.close_path();
}

fn apply_stroke(ctx: &CanvasRenderingContext2d, stroke: &Stroke) {
    ctx.set_stroke_style_str(&stroke.color.to_hex());
    ctx.set_line_width(stroke.width as f64);
}

fn apply_shadow(ctx: &CanvasRenderingContext2d, shadow: &Shadow) {
    ctx.set_shadow_blur(shadow.blur as f64);
    ctx.set_shadow_offset_x(shadow.offset_x as f64);
    ctx.set_shadow_offset_y(shadow.offset_y as f64);
    ctx.set_shadow_color(&shadow.color.with_alpha_factor(shadow.opacity).to_hex());
}

fn clear_shadow(ctx: &CanvasRenderingContext2d) {
    ctx.set_shadow_blur(0.0);
    ctx.set_shadow_offset_x(0.0);
    ctx.set_shadow_offset_y(0.0);
    ctx.set_shadow_color("transparent");
}

fn measure(ctx: &CanvasRenderingContext2d, run: &str) -> f64 {
    ctx.measure_text(run).map(|m| m.width()).unwrap_or(0.0)
}

fn space_width(ctx: &CanvasRenderingContext2d, text: &TextContent) -> f64 {
    measure(ctx, " ") + text.letter_spacing
}

pub(crate) fn css_font(style: &str, size: f64, family: &str) -> String {
    format!("{style} {size}px {family}")
}
