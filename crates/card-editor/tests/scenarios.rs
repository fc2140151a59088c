//! Integration tests: end-to-end editing scenarios (card-editor).
//!
//! Each test drives the editor through its public entry points the way a
//! host would, then checks the document, history and render plan.

use card_core::assets::LogoDefinition;
use card_core::kurbo::{Point, Vec2};
use card_core::*;
use card_editor::{Editor, EditorConfig, LiveTransform, Modifiers, OverlayKey};
use card_render::{ImageCache, Raster, RenderContent};
use pretty_assertions::assert_eq;
use serde_json::json;

const EPS: f64 = 0.01;

fn assert_close(a: Point, b: Point) {
    assert!(
        (a.x - b.x).abs() < EPS && (a.y - b.y).abs() < EPS,
        "{a:?} != {b:?}"
    );
}

// ─── Scenario A: add, drag, undo twice ──────────────────────────────────

#[test]
fn add_drag_then_undo_twice_empties_the_document() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::new(10.0, 10.0), &json!({}));
    assert!(editor.drag_end(id, Point::new(50.0, 80.0)));

    let g = editor.node(id).unwrap().geometry;
    assert_eq!((g.x, g.y), (50.0, 80.0));

    assert!(editor.undo());
    assert_eq!(editor.node(id).unwrap().geometry.x, 10.0);
    assert!(editor.undo());
    assert!(editor.document().is_empty());
    assert!(!editor.undo());
}

#[test]
fn pointer_drag_matches_programmatic_drag() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Rect, Point::new(10.0, 10.0), &json!({}));
    editor.pointer_down(Point::new(20.0, 20.0), Modifiers::NONE);
    editor.pointer_move(Point::new(40.0, 60.0), Modifiers::NONE);
    editor.pointer_up(Point::new(60.0, 90.0), Modifiers::NONE);

    let g = editor.node(id).unwrap().geometry;
    assert_eq!((g.x, g.y), (50.0, 80.0));
    assert_eq!(editor.history().past_len(), 2);
}

// ─── Scenario B: text edit committed by blur ────────────────────────────

#[test]
fn typing_then_blur_commits_once() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "Hello"}));
    let steps = editor.history().past_len();

    assert!(editor.enter_text_edit(id));
    for ch in " World".chars() {
        editor.text_edit_key(&OverlayKey::Text(ch.to_string()));
    }
    // Nothing reaches the document while typing
    assert_eq!(editor.node(id).unwrap().props.as_text().unwrap().text, "Hello");

    assert!(editor.blur_text_edit());
    assert_eq!(
        editor.node(id).unwrap().props.as_text().unwrap().text,
        "Hello World"
    );
    assert_eq!(editor.history().past_len(), steps + 1);
    assert!(editor.overlay().is_none());
    assert!(!editor.is_editing());

    assert!(editor.undo());
    assert_eq!(editor.node(id).unwrap().props.as_text().unwrap().text, "Hello");
}

#[test]
fn undo_during_edit_commits_first() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "a"}));
    editor.enter_text_edit(id);
    editor.set_text_buffer("b\n\n");

    assert!(editor.undo());
    assert!(!editor.is_editing());
    assert_eq!(editor.node(id).unwrap().props.as_text().unwrap().text, "a");
    assert!(editor.redo());
    assert_eq!(editor.node(id).unwrap().props.as_text().unwrap().text, "b");
}

#[test]
fn save_during_edit_flushes_buffer() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "draft"}));
    editor.enter_text_edit(id);
    editor.set_text_buffer("final");

    let mut store = MemoryStore::new();
    editor.save_to(&mut store, "card-1").unwrap();
    assert!(!editor.is_editing());

    let mut other = Editor::default();
    other.load_from(&store, "card-1").unwrap();
    assert_eq!(other.node(id).unwrap().props.as_text().unwrap().text, "final");
    assert!(!other.history().can_undo());
}

#[test]
fn load_discards_an_open_edit() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"text": "old"}));
    editor.enter_text_edit(id);
    editor.set_text_buffer("never saved");
    editor.load(Document::default());
    assert!(!editor.is_editing());
    assert!(editor.document().is_empty());
    assert!(!editor.history().can_undo());
}

// ─── Scenario C: shared image source ────────────────────────────────────

#[test]
fn two_nodes_share_one_fetch() {
    let mut editor = Editor::default();
    let a = editor.add_node(NodeKind::Image, Point::ZERO, &json!({"source": "A"}));
    let b = editor.add_node(NodeKind::Image, Point::new(300.0, 0.0), &json!({"source": "A"}));

    let assets = StaticAssets::default();
    let mut images = ImageCache::new();
    let mut fetched: Vec<String> = Vec::new();

    {
        let mut fetch = |s: &str| fetched.push(s.to_string());
        let items = editor.plan_with(&mut images, &mut fetch, &assets);
        assert_eq!(items.len(), 2);
        for item in &items {
            match &item.content {
                RenderContent::Image(img) => assert!(img.raster.is_none()),
                other => panic!("expected image, got {other:?}"),
            }
        }
        // A redraw before the load resolves must not fetch again
        editor.plan_with(&mut images, &mut fetch, &assets);
    }
    assert_eq!(fetched, vec!["A".to_string()]);

    images.complete("A", Ok(Raster::new(2, 2, vec![255; 16])));

    let mut refetches = 0;
    let mut fetch = |_: &str| refetches += 1;
    let items = editor.plan_with(&mut images, &mut fetch, &assets);
    assert_eq!(refetches, 0);
    let ids: Vec<NodeId> = items.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![a, b]);
    for item in &items {
        match &item.content {
            RenderContent::Image(img) => {
                let raster = img.raster.as_ref().unwrap();
                assert_eq!((raster.width, raster.height), (2, 2));
            }
            other => panic!("expected image, got {other:?}"),
        }
    }
}

// ─── Scenario D: logo capabilities ──────────────────────────────────────

#[test]
fn logo_image_reports_logo_editing_without_crop() {
    let assets = StaticAssets::default().with_logo(LogoDefinition {
        name: "acme".into(),
        source: "logos/acme.png".into(),
    });
    let mut editor = Editor::default();
    let logo = editor.add_logo(&assets, "acme", Point::ZERO).unwrap();
    let photo = editor.add_node(NodeKind::Image, Point::ZERO, &json!({"source": "p.png"}));

    let caps = editor.capabilities(logo).unwrap();
    assert!(!caps.has_crop);
    assert!(caps.can_edit_logo);
    assert!(!caps.can_edit_qr_code);

    assert!(editor.capabilities(photo).unwrap().has_crop);
    assert!(editor.add_logo(&assets, "missing", Point::ZERO).is_none());
}

// ─── Scenario E: overlay on rotated text ────────────────────────────────

#[test]
fn overlay_coincides_with_rotated_glyph() {
    let viewport = HostViewport {
        container_offset: Vec2::new(120.0, 64.0),
        stage_position: Vec2::new(-15.0, 8.0),
        stage_scale: 0.75,
    };

    for angle in [0.0, 45.0, 90.0, 180.0, 270.0] {
        let mut editor = Editor::new(EditorConfig::default());
        editor.set_viewport(viewport);
        let id = editor.add_node(
            NodeKind::Text,
            Point::new(200.0, 150.0),
            &json!({"text": "Rotated", "width": 240.0, "height": 60.0}),
        );
        let live = LiveTransform {
            rotation: angle,
            ..LiveTransform::from_geometry(&editor.node(id).unwrap().geometry)
        };
        editor.transform_end(id, &live);
        assert!(editor.enter_text_edit(id), "angle {angle}");

        let overlay = editor.overlay().unwrap();
        assert_eq!(overlay.rect.rotation, angle as f64);

        let node = editor.node(id).unwrap();
        let to_host = viewport.canvas_to_host();
        let glyph = node.geometry.corners().map(|c| to_host * c);
        for (host, canvas) in overlay.rect.corners().into_iter().zip(glyph) {
            assert_close(host, canvas);
        }
    }
}

#[test]
fn overlay_follows_viewport_changes() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::new(10.0, 10.0), &json!({}));
    editor.enter_text_edit(id);
    editor.set_viewport(HostViewport {
        container_offset: Vec2::new(100.0, 0.0),
        ..HostViewport::default()
    });
    let overlay = editor.overlay().unwrap();
    assert_eq!((overlay.rect.left, overlay.rect.top), (110.0, 10.0));
}
