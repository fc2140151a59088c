//! Integration tests: history properties (card-editor).
//!
//! Every mutation entry point goes through one funnel, so these check the
//! history contract once per entry point rather than per module.

use card_core::kurbo::Point;
use card_core::*;
use card_editor::{Editor, EditorConfig, LiveTransform, Modifiers};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn seeded() -> (Editor, Vec<NodeId>) {
    let mut editor = Editor::default();
    let ids = vec![
        editor.add_node(NodeKind::Rect, Point::new(0.0, 0.0), &Value::Null),
        editor.add_node(NodeKind::Text, Point::new(0.0, 150.0), &json!({"text": "Name"})),
        editor.add_node(NodeKind::Star, Point::new(200.0, 0.0), &Value::Null),
    ];
    (editor, ids)
}

/// Run `op`, then check that undo restores the exact prior document and
/// redo reproduces the post-op document.
fn check_round_trip(editor: &mut Editor, op: impl FnOnce(&mut Editor) -> bool) {
    let before = editor.document().clone();
    let steps = editor.history().past_len();
    assert!(op(editor), "operation reported no change");
    let after = editor.document().clone();
    assert_eq!(editor.history().past_len(), steps + 1);

    assert!(editor.undo());
    assert_eq!(editor.document(), &before);
    assert!(editor.redo());
    assert_eq!(editor.document(), &after);
}

// ─── Round trips per entry point ─────────────────────────────────────────

#[test]
fn add_round_trips() {
    let (mut editor, _) = seeded();
    check_round_trip(&mut editor, |e| {
        e.add_node(NodeKind::Arrow, Point::new(5.0, 5.0), &Value::Null);
        true
    });
}

#[test]
fn delete_round_trips() {
    let (mut editor, ids) = seeded();
    check_round_trip(&mut editor, |e| e.delete_node(ids[1]));
}

#[test]
fn property_edit_round_trips() {
    let (mut editor, ids) = seeded();
    let patch: NodePatch =
        serde_json::from_value(json!({"fill": "#FF0000", "opacity": 0.5, "bold": true})).unwrap();
    check_round_trip(&mut editor, |e| e.update_node(ids[1], &patch));
}

#[test]
fn transform_round_trips() {
    let (mut editor, ids) = seeded();
    let live = LiveTransform {
        x: 20.0,
        y: 30.0,
        rotation: 15.0,
        scale_x: 1.5,
        scale_y: 0.5,
    };
    check_round_trip(&mut editor, |e| e.transform_end(ids[2], &live));
}

#[test]
fn reorder_group_lock_round_trip() {
    let (mut editor, ids) = seeded();
    check_round_trip(&mut editor, |e| e.reorder_node(ids[0], ZOrder::Front));

    editor.select_all();
    check_round_trip(&mut editor, |e| e.group_selection().is_some());
    check_round_trip(&mut editor, |e| e.toggle_lock());
}

#[test]
fn text_commit_round_trips() {
    let (mut editor, ids) = seeded();
    check_round_trip(&mut editor, |e| {
        e.enter_text_edit(ids[1]);
        e.set_text_buffer("Ada Lovelace");
        e.commit_text_edit()
    });
}

#[test]
fn undo_of_add_restores_exact_sequence() {
    let (mut editor, _) = seeded();
    let before = editor.document().nodes.clone();
    editor.add_node(NodeKind::Circle, Point::ZERO, &Value::Null);
    editor.undo();
    assert_eq!(editor.document().nodes, before);
}

// ─── History shape ───────────────────────────────────────────────────────

#[test]
fn new_mutation_after_undo_clears_redo() {
    let (mut editor, ids) = seeded();
    editor.undo();
    assert!(editor.history().can_redo());
    editor.drag_end(ids[0], Point::new(9.0, 9.0));
    assert!(!editor.history().can_redo());
    assert!(!editor.redo());
}

#[test]
fn depth_limit_drops_oldest_steps() {
    let config = EditorConfig {
        history_depth: 3,
        ..EditorConfig::default()
    };
    let mut editor = Editor::new(config);
    for i in 0..5 {
        editor.add_node(NodeKind::Rect, Point::new(i as f64, 0.0), &Value::Null);
    }
    let mut undone = 0;
    while editor.undo() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(editor.document().len(), 2);
}

#[test]
fn reset_to_original_is_one_more_step() {
    let mut doc = Document::new(600.0, 400.0);
    doc.push(factory::create_node(NodeKind::Rect, Point::ZERO, &Value::Null));
    let mut editor = Editor::with_document(doc.clone(), EditorConfig::default());

    editor.add_node(NodeKind::Icon, Point::ZERO, &Value::Null);
    editor.add_node(NodeKind::Icon, Point::ZERO, &Value::Null);
    assert!(editor.reset_to_original());
    assert_eq!(editor.document(), &doc);
    assert_eq!(editor.history().past_len(), 3);
    assert_eq!(editor.history().undo_label(), Some("reset to original"));

    assert!(editor.undo());
    assert_eq!(editor.document().len(), 3);
    assert!(editor.reset_to_original());
    assert_eq!(editor.document(), &doc);
    assert!(!editor.history().can_redo());
}

// ─── Gestures interleaved with history ──────────────────────────────────

#[test]
fn undo_during_transform_preview_abandons_the_gesture() {
    init_logging();
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Rect, Point::ZERO, &Value::Null);
    let added = editor.node(id).unwrap().clone();
    let live = LiveTransform {
        scale_x: 2.0,
        ..LiveTransform::from_geometry(&added.geometry)
    };
    assert!(editor.preview_transform(id, &live));
    assert!(editor.gesture_active());

    assert!(editor.undo());
    assert!(!editor.gesture_active());
    assert!(editor.document().is_empty());
    assert_eq!(editor.history().past_len(), 0);
    assert_eq!(editor.history().future_len(), 1);

    // The release arriving after the undo must not bring the node back
    assert!(!editor.transform_end(id, &live));
    assert!(editor.document().is_empty());
    assert_eq!(editor.history().past_len(), 0);
    assert_eq!(editor.history().future_len(), 1);

    assert!(editor.redo());
    assert_eq!(editor.node(id), Some(&added));
    assert_eq!(editor.node(id).unwrap().geometry.scale_x, 1.0);
}

#[test]
fn shortcut_undo_mid_drag_leaves_no_stray_step() {
    init_logging();
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Rect, Point::new(10.0, 10.0), &Value::Null);
    let added = editor.document().clone();

    editor.pointer_down(Point::new(20.0, 20.0), Modifiers::NONE);
    assert!(editor.pointer_move(Point::new(40.0, 60.0), Modifiers::NONE));
    assert!(editor.gesture_active());

    let ctrl = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };
    let routed = editor.dispatch_key("z", ctrl, false);
    assert!(matches!(routed, Some((_, true))));
    assert!(editor.document().is_empty());

    assert!(!editor.pointer_move(Point::new(80.0, 90.0), Modifiers::NONE));
    assert!(!editor.pointer_up(Point::new(80.0, 90.0), Modifiers::NONE));
    assert!(editor.document().is_empty());
    assert_eq!(editor.history().past_len(), 0);

    assert!(editor.redo());
    assert_eq!(editor.document(), &added);
    let g = editor.node(id).unwrap().geometry;
    assert_eq!((g.x, g.y), (10.0, 10.0));
}

#[test]
fn redo_and_reset_during_preview_start_from_committed_state() {
    init_logging();
    let (mut editor, ids) = seeded();
    let loaded = editor.document().clone();
    editor.load(loaded.clone());
    assert!(editor.delete_node(ids[0]));
    assert!(editor.undo());
    let committed = editor.document().clone();

    let live = LiveTransform {
        x: 300.0,
        ..LiveTransform::from_geometry(&editor.node(ids[2]).unwrap().geometry)
    };
    assert!(editor.preview_transform(ids[2], &live));
    assert!(editor.redo());
    assert!(!editor.gesture_active());
    assert_eq!(editor.node(ids[0]), None);
    assert_eq!(editor.node(ids[2]), committed.get(ids[2]));

    assert!(editor.preview_transform(ids[2], &live));
    assert!(editor.reset_to_original());
    assert!(!editor.gesture_active());
    assert_eq!(editor.document(), &loaded);
    assert!(editor.undo());
    assert_eq!(editor.node(ids[0]), None);
    assert_eq!(editor.node(ids[2]), committed.get(ids[2]));
}

// ─── Locked nodes ────────────────────────────────────────────────────────

#[test]
fn locked_node_survives_every_gesture_without_history() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Rect, Point::ZERO, &json!({"locked": true}));
    let before = editor.document().clone();
    let steps = editor.history().past_len();

    assert!(!editor.drag_end(id, Point::new(100.0, 100.0)));
    assert!(!editor.transform_end(
        id,
        &LiveTransform {
            scale_x: 3.0,
            ..LiveTransform::default()
        }
    ));
    assert!(!editor.preview_transform(id, &LiveTransform::default()));
    assert!(!editor.delete_node(id));
    assert!(!editor.enter_text_edit(id));
    editor.select(id, false);
    assert!(!editor.nudge_selection(10.0, 0.0));
    assert!(!editor.delete_selection());

    assert_eq!(editor.document(), &before);
    assert_eq!(editor.history().past_len(), steps);
}

#[test]
fn read_only_node_is_immutable_but_selectable() {
    let mut editor = Editor::default();
    let id = editor.add_node(NodeKind::Text, Point::ZERO, &json!({"editable": false}));
    editor.deselect();
    editor.select(id, false);
    assert_eq!(editor.selection().ids(), &[id]);
    assert!(!editor.toggle_lock());
    assert!(!editor.update_node(
        id,
        &NodePatch {
            text: Some("changed".into()),
            ..NodePatch::default()
        }
    ));
}

// ─── Transform floor ─────────────────────────────────────────────────────

#[test]
fn transform_end_always_leaves_unit_scale_and_minimum_size() {
    let mut editor = Editor::default();
    let kinds = [
        NodeKind::Rect,
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::Icon,
        NodeKind::Path,
        NodeKind::Line,
    ];
    for kind in kinds {
        let id = editor.add_node(kind, Point::ZERO, &Value::Null);
        for (sx, sy) in [(0.0, 0.0), (0.01, 50.0), (-2.0, -0.001), (1.0, 1.0)] {
            editor.transform_end(
                id,
                &LiveTransform {
                    scale_x: sx,
                    scale_y: sy,
                    ..LiveTransform::default()
                },
            );
            let g = editor.node(id).unwrap().geometry;
            assert_eq!((g.scale_x, g.scale_y), (1.0, 1.0), "{kind:?}");
            assert!(g.width >= 5.0 && g.height >= 5.0, "{kind:?} {g:?}");
        }
    }
}
