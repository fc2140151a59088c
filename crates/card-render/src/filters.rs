//! CPU image filters and the per-node bitmap cache.
//!
//! Image nodes with an active filter, a corner radius or a stroke are
//! rasterized once and the result reused until the node's inputs change.
//! Filters run on straight-alpha RGBA8 pixels in a fixed order: blur,
//! brightness, contrast, grayscale, sepia.

use crate::image_cache::Raster;
use card_core::{ImageFilters, NodeId};
use std::collections::HashMap;

/// One filter step in renderer units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Box-blur radius in pixels.
    Blur(f32),
    /// -1.0 ..= 1.0, added to every channel as a fraction of full scale.
    Brightness(f32),
    /// -100.0 ..= 100.0.
    Contrast(f32),
    Grayscale,
    Sepia,
}

/// Map filter settings to the active filter steps. Brightness and contrast
/// are stored as 0–200 percentages with 100 neutral.
pub fn filter_ops(filters: &ImageFilters) -> Vec<FilterOp> {
    let mut ops = Vec::new();
    if filters.blur_active() {
        ops.push(FilterOp::Blur(filters.blur));
    }
    if filters.brightness_active() {
        ops.push(FilterOp::Brightness(
            ((filters.brightness - 100.0) / 100.0).clamp(-1.0, 1.0),
        ));
    }
    if filters.contrast_active() {
        ops.push(FilterOp::Contrast((filters.contrast - 100.0).clamp(-100.0, 100.0)));
    }
    if filters.grayscale {
        ops.push(FilterOp::Grayscale);
    }
    if filters.sepia {
        ops.push(FilterOp::Sepia);
    }
    ops
}

/// Apply `ops` to a copy of `src`.
pub fn apply_filters(src: &Raster, ops: &[FilterOp]) -> Raster {
    let mut px = (*src.pixels).clone();
    for op in ops {
        match *op {
            FilterOp::Blur(radius) => box_blur(&mut px, src.width, src.height, radius.round() as usize),
            FilterOp::Brightness(amount) => {
                let delta = amount * 255.0;
                map_rgb(&mut px, |c| c + delta);
            }
            FilterOp::Contrast(amount) => {
                let adjust = ((amount + 100.0) / 100.0).powi(2);
                map_rgb(&mut px, |c| ((c / 255.0 - 0.5) * adjust + 0.5) * 255.0);
            }
            FilterOp::Grayscale => {
                for p in px.chunks_exact_mut(4) {
                    let l = 0.34 * p[0] as f32 + 0.5 * p[1] as f32 + 0.16 * p[2] as f32;
                    let l = to_u8(l);
                    p[0] = l;
                    p[1] = l;
                    p[2] = l;
                }
            }
            FilterOp::Sepia => {
                for p in px.chunks_exact_mut(4) {
                    let (r, g, b) = (p[0] as f32, p[1] as f32, p[2] as f32);
                    p[0] = to_u8(0.393 * r + 0.769 * g + 0.189 * b);
                    p[1] = to_u8(0.349 * r + 0.686 * g + 0.168 * b);
                    p[2] = to_u8(0.272 * r + 0.534 * g + 0.131 * b);
                }
            }
        }
    }
    Raster::new(src.width, src.height, px)
}

fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_rgb(px: &mut [u8], f: impl Fn(f32) -> f32) {
    for p in px.chunks_exact_mut(4) {
        for c in &mut p[..3] {
            *c = to_u8(f(*c as f32));
        }
    }
}

/// Separable box blur, horizontal then vertical, clamped at the edges.
fn box_blur(px: &mut [u8], width: u32, height: u32, radius: usize) {
    let (w, h) = (width as usize, height as usize);
    if radius == 0 || w == 0 || h == 0 {
        return;
    }
    let mut tmp = vec![0u8; px.len()];
    blur_pass(px, &mut tmp, w, h, radius, true);
    blur_pass(&tmp, px, w, h, radius, false);
}

fn blur_pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, radius: usize, horizontal: bool) {
    let (outer, inner) = if horizontal { (h, w) } else { (w, h) };
    let index = |o: usize, i: usize| if horizontal { (o * w + i) * 4 } else { (i * w + o) * 4 };
    for o in 0..outer {
        for i in 0..inner {
            let lo = i.saturating_sub(radius);
            let hi = (i + radius).min(inner - 1);
            let mut sum = [0u32; 4];
            for k in lo..=hi {
                let at = index(o, k);
                for c in 0..4 {
                    sum[c] += src[at + c] as u32;
                }
            }
            let n = (hi - lo + 1) as u32;
            let at = index(o, i);
            for c in 0..4 {
                dst[at + c] = ((sum[c] + n / 2) / n) as u8;
            }
        }
    }
}

// ─── Bitmap cache ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct BitmapKey {
    source: String,
    ops: Vec<FilterOp>,
}

/// Filtered rasters per image node, rebuilt when the source or the filter
/// steps change.
#[derive(Debug, Default)]
pub struct BitmapCache {
    entries: HashMap<NodeId, (BitmapKey, Raster)>,
    rebuilds: u64,
}

impl BitmapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_render(&mut self, id: NodeId, source: &str, raster: &Raster, ops: &[FilterOp]) -> Raster {
        let key = BitmapKey {
            source: source.to_string(),
            ops: ops.to_vec(),
        };
        if let Some((cached_key, cached)) = self.entries.get(&id)
            && *cached_key == key
        {
            return cached.clone();
        }
        log::trace!("rasterizing {id} with {} filter(s)", ops.len());
        let filtered = apply_filters(raster, ops);
        self.rebuilds += 1;
        self.entries.insert(id, (key, filtered.clone()));
        filtered
    }

    /// Drop entries for nodes not in `live`.
    pub fn retain(&mut self, live: impl Fn(NodeId) -> bool) {
        self.entries.retain(|id, _| live(*id));
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
