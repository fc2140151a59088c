//! WASM bridge for Card Draft: exposes the editor session to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and loaded by the browser
//! host. Every mutation goes through `Editor`, so the host never touches
//! the document directly; reads come back as JSON strings.

mod console;
mod render2d;

use card_core::assets::{LogoDefinition, ShapeDefinition};
use card_core::kurbo::{Point, Rect, Vec2};
use card_core::{Color, Document, HostViewport, NodeId, NodeKind, NodePatch, StaticAssets, ZOrder};
use card_editor::{
    Editor, EditorConfig, FrameResources, KeyOutcome, KeyRoute, LiveTransform, Modifiers,
    SHORTCUTS,
};
use card_render::{ImageCache, ImageLoadError, Raster};
use render2d::{Canvas2dPainter, CanvasMeasure, FrameChrome};
use serde_json::{Value, json};
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The main WASM-facing canvas controller.
///
/// Owns the editor session, the shared image cache and the asset catalog.
/// All interaction from the host goes through this struct.
#[wasm_bindgen]
pub struct CardCanvas {
    editor: Editor,
    assets: StaticAssets,
    images: ImageCache,
    painter: Canvas2dPainter,
    /// Sources the last frame asked for, not yet handed to the host.
    image_requests: Vec<String>,
    on_image_request: Option<js_sys::Function>,
    width: f64,
    height: f64,
}

#[wasm_bindgen]
impl CardCanvas {
    /// Create a controller for a host surface of the given size.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console::init();
        Self::with_editor(Editor::default(), width, height)
    }

    /// Like `new`, with an `EditorConfig` JSON object. Unknown or missing
    /// fields keep their defaults; malformed JSON falls back entirely.
    pub fn with_config(width: f64, height: f64, config_json: &str) -> Self {
        console::init();
        let config = EditorConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("ignoring editor config: {e}");
            EditorConfig::default()
        });
        Self::with_editor(Editor::new(config), width, height)
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Replace the document from its JSON form. Returns false on a parse
    /// error, leaving the current document untouched.
    pub fn load_document(&mut self, json: &str) -> bool {
        match serde_json::from_str::<Document>(json) {
            Ok(doc) => {
                self.editor.load(doc);
                true
            }
            Err(e) => {
                log::warn!("rejected document: {e}");
                false
            }
        }
    }

    /// The document as JSON. Flushes an open text edit first, so what the
    /// host saves is what the user sees.
    pub fn save_document(&mut self) -> String {
        self.editor.commit_text_edit();
        self.get_document()
    }

    pub fn get_document(&self) -> String {
        to_json(self.editor.document())
    }

    pub fn reset_to_original(&mut self) -> bool {
        self.editor.reset_to_original()
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    /// Position of the stage inside the host page and its zoom.
    pub fn set_viewport(
        &mut self,
        container_x: f64,
        container_y: f64,
        stage_x: f64,
        stage_y: f64,
        stage_scale: f64,
    ) {
        self.editor.set_viewport(HostViewport {
            container_offset: Vec2::new(container_x, container_y),
            stage_position: Vec2::new(stage_x, stage_y),
            stage_scale: if stage_scale > 0.0 { stage_scale } else { 1.0 },
        });
    }

    pub fn set_layout_enabled(&mut self, enabled: bool) {
        self.editor.set_layout_enabled(enabled);
    }

    // ─── Mutation API ────────────────────────────────────────────────────

    /// Add a node of kind `kind` (e.g. `"text"`, `"star"`) at canvas
    /// position (x, y). `overrides_json` may be empty. Returns the new id,
    /// or an empty string for an unknown kind.
    pub fn add_node(&mut self, kind: &str, x: f64, y: f64, overrides_json: &str) -> String {
        let Some(kind) = NodeKind::from_name(kind) else {
            log::warn!("unknown node kind {kind:?}");
            return String::new();
        };
        let overrides = parse_or_null(overrides_json);
        self.editor
            .add_node(kind, Point::new(x, y), &overrides)
            .as_str()
            .to_string()
    }

    /// Add a catalog shape by name. Empty string if the catalog lacks it.
    pub fn add_shape(&mut self, name: &str, x: f64, y: f64, fill: &str) -> String {
        let fill = Color::from_hex(fill).unwrap_or(Color::BLACK);
        self.editor
            .add_catalog_shape(&self.assets, name, Point::new(x, y), fill)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn add_logo(&mut self, name: &str, x: f64, y: f64) -> String {
        self.editor
            .add_logo(&self.assets, name, Point::new(x, y))
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Apply a camelCase `NodePatch` JSON object to one node.
    pub fn update_node(&mut self, node_id: &str, patch_json: &str) -> bool {
        let patch: NodePatch = match serde_json::from_str(patch_json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("rejected patch for {node_id}: {e}");
                return false;
            }
        };
        match self.lookup(node_id) {
            Some(id) => self.editor.update_node(id, &patch),
            None => false,
        }
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        self.lookup(node_id)
            .is_some_and(|id| self.editor.delete_node(id))
    }

    /// `to` is one of `forward`, `backward`, `front`, `back`.
    pub fn reorder_node(&mut self, node_id: &str, to: &str) -> bool {
        let Some(to) = parse_z_order(to) else {
            log::warn!("unknown z-order move {to:?}");
            return false;
        };
        self.lookup(node_id)
            .is_some_and(|id| self.editor.reorder_node(id, to))
    }

    pub fn delete_selected(&mut self) -> bool {
        self.editor.delete_selection()
    }

    pub fn duplicate_selected(&mut self) -> String {
        to_json(&self.editor.duplicate_selection())
    }

    pub fn group_selected(&mut self) -> String {
        self.editor
            .group_selection()
            .map(|tag| tag.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn ungroup_selected(&mut self) -> bool {
        self.editor.ungroup_selection()
    }

    pub fn toggle_lock(&mut self) -> bool {
        self.editor.toggle_lock()
    }

    /// Commit a finished drag: the node's top-left lands at (x, y).
    pub fn drag_end(&mut self, node_id: &str, x: f64, y: f64) -> bool {
        self.lookup(node_id)
            .is_some_and(|id| self.editor.drag_end(id, Point::new(x, y)))
    }

    /// Live transformer state as a `LiveTransform` JSON object. With
    /// `finished` false the change is a preview; the gesture's single
    /// history step is recorded once `finished` is true.
    pub fn transform_node(&mut self, node_id: &str, live_json: &str, finished: bool) -> bool {
        let live: LiveTransform = match serde_json::from_str(live_json) {
            Ok(l) => l,
            Err(e) => {
                log::warn!("rejected transform for {node_id}: {e}");
                return false;
            }
        };
        let Some(id) = self.lookup(node_id) else {
            return false;
        };
        if finished {
            self.editor.transform_end(id, &live)
        } else {
            self.editor.preview_transform(id, &live)
        }
    }

    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.editor.history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.editor.history().can_redo()
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_by_id(&mut self, node_id: &str, additive: bool) -> bool {
        match self.lookup(node_id) {
            Some(id) => {
                self.editor.select(id, additive);
                true
            }
            None => false,
        }
    }

    pub fn deselect(&mut self) {
        self.editor.deselect();
    }

    /// `{"ids": [...], "active": id | null}`
    pub fn get_selection(&self) -> String {
        to_json(self.editor.selection())
    }

    /// Capability set for one node, or `null` if it does not exist.
    pub fn get_capabilities(&self, node_id: &str) -> String {
        let caps = self.lookup(node_id).and_then(|id| self.editor.capabilities(id));
        to_json(&caps)
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Copy the selection. The payload stays in the session clipboard.
    pub fn copy_selected(&mut self) -> bool {
        self.editor.copy_selection().is_some()
    }

    pub fn cut_selected(&mut self) -> bool {
        self.editor.cut_selection().is_some()
    }

    /// Paste the session clipboard. Returns the new ids as JSON.
    pub fn paste(&mut self) -> String {
        to_json(&self.editor.paste(None))
    }

    // ─── Text editing ────────────────────────────────────────────────────

    pub fn enter_text_edit(&mut self, node_id: &str) -> bool {
        self.lookup(node_id)
            .is_some_and(|id| self.editor.enter_text_edit(id))
    }

    /// Replace the overlay buffer with the native input's value.
    pub fn set_text_buffer(&mut self, text: &str) -> bool {
        self.editor.set_text_buffer(text)
    }

    pub fn commit_text_edit(&mut self) -> bool {
        self.editor.commit_text_edit()
    }

    /// Abandon the overlay buffer; the node keeps its text.
    pub fn cancel_text_edit(&mut self) -> bool {
        let open = self.editor.is_editing();
        self.editor.cancel_text_edit();
        open
    }

    /// The overlay lost focus.
    pub fn blur_text_edit(&mut self) -> bool {
        self.editor.blur_text_edit()
    }

    /// Where and how to mount the overlay, or `null` when no edit is open.
    pub fn get_overlay(&self) -> String {
        to_json(&self.editor.overlay())
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    /// Handle pointer down in host pixels. Returns true if a redraw is needed.
    pub fn handle_pointer_down(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let revision = self.editor.revision();
        self.editor
            .pointer_down(Point::new(x, y), modifiers(shift, ctrl, alt, meta));
        self.editor.revision() != revision || self.editor.gesture().marquee_rect().is_some()
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.editor
            .pointer_move(Point::new(x, y), modifiers(shift, ctrl, alt, meta))
            || self.editor.gesture().marquee_rect().is_some()
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        let revision = self.editor.revision();
        // The marquee disappears on release
        let had_marquee = self.editor.gesture().marquee_rect().is_some();
        self.editor
            .pointer_up(Point::new(x, y), modifiers(shift, ctrl, alt, meta));
        had_marquee || self.editor.revision() != revision
    }

    pub fn handle_double_click(&mut self, x: f64, y: f64) -> bool {
        self.editor.double_click(Point::new(x, y))
    }

    /// Topmost node id under a host point, or empty.
    pub fn hit_test(&self, x: f64, y: f64) -> String {
        self.editor
            .node_at(Point::new(x, y))
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Handle a keyboard event. Returns JSON:
    /// `{"route":"overlay","outcome":"commit"}`,
    /// `{"route":"shortcut","action":...,"changed":bool}` or
    /// `{"route":"ignored"}`.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
        focus_in_text_input: bool,
    ) -> String {
        let route = self
            .editor
            .handle_key(key, modifiers(shift, ctrl, alt, meta), focus_in_text_input);
        key_route_json(route).to_string()
    }

    /// The shortcut reference table for a help panel.
    pub fn get_shortcuts(&self) -> String {
        to_json(SHORTCUTS)
    }

    // ─── Assets ──────────────────────────────────────────────────────────

    /// Register an icon body (SVG inner markup or path data) under a
    /// prefixed name such as `mdi:star`.
    pub fn register_icon(&mut self, name: &str, body: &str, width: f64, height: f64) {
        let assets = std::mem::take(&mut self.assets);
        self.assets = assets.with_icon(name, body, width, height);
    }

    /// Register a catalog shape from its JSON definition.
    pub fn register_shape(&mut self, json: &str) -> bool {
        match serde_json::from_str::<ShapeDefinition>(json) {
            Ok(shape) => {
                let assets = std::mem::take(&mut self.assets);
                self.assets = assets.with_shape(shape);
                true
            }
            Err(e) => {
                log::warn!("rejected shape definition: {e}");
                false
            }
        }
    }

    pub fn register_logo(&mut self, name: &str, source: &str) {
        let assets = std::mem::take(&mut self.assets);
        self.assets = assets.with_logo(LogoDefinition {
            name: name.to_string(),
            source: source.to_string(),
        });
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Called with each image source the renderer needs. The host loads it
    /// and answers with `image_loaded` or `image_failed`.
    pub fn set_image_request_handler(&mut self, handler: js_sys::Function) {
        self.on_image_request = Some(handler);
        self.flush_image_requests();
    }

    /// Sources requested since the last call, as a JSON array. For hosts
    /// that poll instead of registering a handler.
    pub fn take_image_requests(&mut self) -> String {
        to_json(&std::mem::take(&mut self.image_requests))
    }

    /// Decoded RGBA8 pixels for `source`. Returns true (redraw needed)
    /// unless the pixel buffer does not match the dimensions.
    pub fn image_loaded(&mut self, source: &str, width: u32, height: u32, pixels: Vec<u8>) -> bool {
        if pixels.len() != Raster::byte_len(width, height) {
            log::warn!("image {source}: {} bytes for {width}x{height}", pixels.len());
            self.images.complete(
                source,
                Err(ImageLoadError::Decode("pixel buffer size mismatch".into())),
            );
            return false;
        }
        self.painter.forget(source);
        self.images
            .complete(source, Ok(Raster::new(width, height, pixels)));
        true
    }

    pub fn image_failed(&mut self, source: &str, message: &str) {
        self.images
            .complete(source, Err(ImageLoadError::Fetch(message.to_string())));
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Render the current frame to a Canvas2D context.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d) {
        let mut requested: Vec<String> = Vec::new();
        let mut fetch = |source: &str| requested.push(source.to_string());
        let measure = CanvasMeasure { ctx };
        let items = self.editor.plan_frame(FrameResources {
            images: &mut self.images,
            fetcher: &mut fetch,
            icons: &self.assets,
            measure: &measure,
        });

        let doc = self.editor.document();
        let chrome = FrameChrome {
            width: self.width,
            height: self.height,
            page: Rect::new(0.0, 0.0, doc.width as f64, doc.height as f64),
            background: doc.background,
            view: self.editor.viewport().canvas_to_host(),
            selected: self.editor.selection().ids(),
            marquee: self.editor.gesture().marquee_rect(),
        };
        self.painter.paint(ctx, &chrome, &items);

        self.image_requests.extend(requested);
        self.flush_image_requests();
    }
}

impl CardCanvas {
    fn with_editor(editor: Editor, width: f64, height: f64) -> Self {
        Self {
            editor,
            assets: StaticAssets::default(),
            images: ImageCache::new(),
            painter: Canvas2dPainter::new(),
            image_requests: Vec::new(),
            on_image_request: None,
            width,
            height,
        }
    }

    /// Resolve a host-supplied id against the document. Interning only
    /// happens for ids that exist.
    fn lookup(&self, node_id: &str) -> Option<NodeId> {
        let found = self
            .editor
            .document()
            .nodes
            .iter()
            .map(|n| n.id)
            .find(|id| id.as_str() == node_id);
        if found.is_none() {
            log::debug!("no node {node_id:?}");
        }
        found
    }

    fn flush_image_requests(&mut self) {
        let Some(handler) = &self.on_image_request else {
            return;
        };
        for source in self.image_requests.drain(..) {
            if let Err(e) = handler.call1(&JsValue::NULL, &JsValue::from_str(&source)) {
                log::warn!("image request handler threw for {source}: {e:?}");
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn parse_or_null(json: &str) -> Value {
    if json.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(json).unwrap_or_else(|e| {
        log::warn!("ignoring overrides: {e}");
        Value::Null
    })
}

fn parse_z_order(name: &str) -> Option<ZOrder> {
    match name {
        "forward" => Some(ZOrder::Forward),
        "backward" => Some(ZOrder::Backward),
        "front" => Some(ZOrder::Front),
        "back" => Some(ZOrder::Back),
        _ => None,
    }
}

fn key_route_json(route: KeyRoute) -> Value {
    match route {
        KeyRoute::Overlay(outcome) => json!({
            "route": "overlay",
            "outcome": match outcome {
                KeyOutcome::Continue => "continue",
                KeyOutcome::Commit => "commit",
                KeyOutcome::Cancel => "cancel",
            },
        }),
        KeyRoute::Shortcut { action, changed } => json!({
            "route": "shortcut",
            "action": action,
            "changed": changed,
        }),
        KeyRoute::Ignored => json!({ "route": "ignored" }),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::warn!("serialization failed: {e}");
        "null".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn add_update_and_undo_through_the_bridge() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        let id = canvas.add_node("text", 10.0, 20.0, r#"{"text": "Hi"}"#);
        assert!(!id.is_empty());

        assert!(canvas.update_node(&id, r##"{"fill": "#FF0000"}"##));
        let doc = parse(&canvas.get_document());
        assert_eq!(doc["nodes"][0]["id"], json!(id));

        assert!(canvas.undo());
        assert!(canvas.undo());
        assert_eq!(parse(&canvas.get_document())["nodes"], json!([]));
        assert!(canvas.can_redo());
    }

    #[test]
    fn unknown_inputs_are_rejected_quietly() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        assert_eq!(canvas.add_node("hexagon-ish", 0.0, 0.0, ""), "");
        assert!(!canvas.update_node("nope", "{}"));
        assert!(!canvas.reorder_node("nope", "front"));
        let id = canvas.add_node("rect", 0.0, 0.0, "");
        assert!(!canvas.reorder_node(&id, "sideways"));
        assert!(!canvas.update_node(&id, "not json"));
        assert_eq!(canvas.get_capabilities("nope"), "null");
    }

    #[test]
    fn capabilities_and_selection_are_json() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        let id = canvas.add_node("image", 0.0, 0.0, r#"{"source": "a.png"}"#);
        let caps = parse(&canvas.get_capabilities(&id));
        assert_eq!(caps["hasCrop"], json!(true));

        let selection = parse(&canvas.get_selection());
        assert_eq!(selection["ids"], json!([id]));
    }

    #[test]
    fn overlay_round_trip_through_keys() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        let id = canvas.add_node("text", 0.0, 0.0, r#"{"text": "A"}"#);
        assert_eq!(canvas.get_overlay(), "null");
        assert!(canvas.enter_text_edit(&id));

        let overlay = parse(&canvas.get_overlay());
        assert_eq!(overlay["text"], json!("A"));

        let route = parse(&canvas.handle_key("Enter", false, false, false, false, true));
        assert_eq!(route, json!({"route": "overlay", "outcome": "commit"}));
        assert_eq!(canvas.get_overlay(), "null");
    }

    #[test]
    fn shortcuts_route_through_the_editor() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        canvas.add_node("rect", 0.0, 0.0, "");
        let route = parse(&canvas.handle_key("Delete", false, false, false, false, false));
        assert_eq!(
            route,
            json!({"route": "shortcut", "action": "delete", "changed": true})
        );
        let route = parse(&canvas.handle_key("q", false, false, false, false, false));
        assert_eq!(route, json!({"route": "ignored"}));
    }

    #[test]
    fn load_rejects_malformed_documents() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        canvas.add_node("rect", 0.0, 0.0, "");
        assert!(!canvas.load_document("{"));
        assert_eq!(parse(&canvas.get_document())["nodes"].as_array().map(Vec::len), Some(1));

        let saved = canvas.save_document();
        let mut other = CardCanvas::new(800.0, 600.0);
        assert!(other.load_document(&saved));
        assert_eq!(other.get_document(), saved);
    }

    #[test]
    fn image_loads_validate_buffer_size() {
        let mut canvas = CardCanvas::new(800.0, 600.0);
        assert!(!canvas.image_loaded("a.png", 2, 2, vec![0; 3]));
        assert!(canvas.image_loaded("b.png", 1, 1, vec![1, 2, 3, 4]));
        assert!(canvas.images.raster("b.png").is_some());
    }

    #[test]
    fn z_order_names() {
        assert_eq!(parse_z_order("front"), Some(ZOrder::Front));
        assert_eq!(parse_z_order("back"), Some(ZOrder::Back));
        assert_eq!(parse_z_order("Front"), None);
    }
}
