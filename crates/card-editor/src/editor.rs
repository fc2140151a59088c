//! Editing session: the single mutation funnel.
//!
//! Every write to the document, whether it comes from a panel, a pointer
//! gesture, a keyboard shortcut or the text-edit overlay, goes through
//! `Editor::commit`, which snapshots the document, applies the change and
//! records exactly one history step if (and only if) something changed.
//! Rejected operations (locked or non-editable targets, layout disabled) are
//! silent no-ops that leave no history behind.
//!
//! Transform gestures live in `transform`, the text-edit state machine in
//! `text_edit`, pointer handling in `gesture` and clipboard transfer in
//! `clipboard`. Each of those adds its own `impl Editor` block.

use crate::clipboard;
use crate::config::EditorConfig;
use crate::gesture::PointerGesture;
use crate::history::History;
use crate::selection::Selection;
use crate::text_edit::TextEditSession;
use card_core::factory::{create_catalog_shape, create_node, duplicate_node};
use card_core::kurbo::{Point, Vec2};
use card_core::*;

pub struct Editor {
    pub(crate) doc: Document,
    pub(crate) history: History,
    pub(crate) selection: Selection,
    pub(crate) session: Option<TextEditSession>,
    pub(crate) gesture: PointerGesture,
    pub(crate) clipboard: Option<Vec<u8>>,
    pub(crate) config: EditorConfig,
    pub(crate) viewport: HostViewport,
    layout_enabled: bool,
    revision: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::default(), config)
    }

    pub fn with_document(doc: Document, config: EditorConfig) -> Self {
        let mut history = History::new(config.history_depth);
        history.reset(&doc);
        Self {
            doc,
            history,
            selection: Selection::new(),
            session: None,
            gesture: PointerGesture::default(),
            clipboard: None,
            layout_enabled: config.layout_enabled,
            config,
            viewport: HostViewport::default(),
            revision: 0,
        }
    }

    // ─── Read queries ────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn node(&self, id: NodeId) -> Option<&DrawableNode> {
        self.doc.get(id)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Capabilities of a node, `None` if it does not exist.
    pub fn capabilities(&self, id: NodeId) -> Option<Capabilities> {
        self.doc.get(id).map(capabilities)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn viewport(&self) -> &HostViewport {
        &self.viewport
    }

    /// Tell the editor where the canvas sits on the host surface.
    pub fn set_viewport(&mut self, viewport: HostViewport) {
        self.viewport = viewport;
        if let Some(session) = self.session.as_mut()
            && let Some(node) = self.doc.get(session.node)
        {
            session.reposition(node, &viewport);
        }
    }

    pub fn layout_enabled(&self) -> bool {
        self.layout_enabled
    }

    pub fn set_layout_enabled(&mut self, enabled: bool) {
        self.layout_enabled = enabled;
    }

    /// Bumped on every visible change; hosts redraw when it moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    // ─── Mutation funnel ─────────────────────────────────────────────────

    /// Apply `f` to the document and record one history step if it reports
    /// a change.
    pub(crate) fn commit(&mut self, label: &str, f: impl FnOnce(&mut Document) -> bool) -> bool {
        let before = self.doc.clone();
        if !f(&mut self.doc) {
            return false;
        }
        self.record(label, before);
        true
    }

    /// Record a step whose mutation was applied already (gestures).
    pub(crate) fn record(&mut self, label: &str, before: Document) {
        self.history.push(label, before);
        self.selection.retain_existing(&self.doc);
        self.touch();
        log::debug!("commit {label}");
    }

    /// Whether `id` may be changed by gestures and property edits.
    pub(crate) fn can_mutate(&self, id: NodeId) -> bool {
        match self.doc.get(id) {
            Some(node) if node.is_mutable() => true,
            Some(_) => {
                log::debug!("rejected edit of locked/read-only {id}");
                false
            }
            None => false,
        }
    }

    /// Whether geometry of `id` may change right now.
    pub(crate) fn can_transform(&self, id: NodeId) -> bool {
        if !self.layout_enabled {
            log::debug!("rejected transform of {id}: layout disabled");
            return false;
        }
        self.can_mutate(id)
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Replace the document wholesale. Any text edit is discarded, history
    /// starts over and `doc` becomes the reset baseline.
    pub fn load(&mut self, doc: Document) {
        if self.session.take().is_some() {
            log::debug!("text edit discarded by load");
        }
        self.gesture = PointerGesture::default();
        self.doc = doc;
        self.history.reset(&self.doc);
        self.selection.clear();
        self.touch();
        log::debug!("loaded document with {} nodes", self.doc.len());
    }

    pub fn load_from(&mut self, store: &dyn DocumentStore, id: &str) -> Result<(), StoreError> {
        let doc = store.load(id)?;
        self.load(doc);
        Ok(())
    }

    /// Save to `store`. An active text edit is committed first so the
    /// saved document matches what is on screen.
    pub fn save_to(&mut self, store: &mut dyn DocumentStore, id: &str) -> Result<(), StoreError> {
        self.commit_text_edit();
        store.save(id, &self.doc)
    }

    /// Restore the document as loaded. Undoable like any other step.
    pub fn reset_to_original(&mut self) -> bool {
        self.commit_text_edit();
        self.cancel_gesture();
        let Some(baseline) = self.history.baseline().cloned() else {
            return false;
        };
        self.commit("reset to original", |doc| {
            if *doc == baseline {
                return false;
            }
            *doc = baseline;
            true
        })
    }

    // ─── History ─────────────────────────────────────────────────────────

    // A gesture in flight is abandoned before moving through history.
    pub fn undo(&mut self) -> bool {
        self.commit_text_edit();
        self.cancel_gesture();
        let undone = self.history.undo(&mut self.doc).is_some();
        if undone {
            self.selection.retain_existing(&self.doc);
            self.touch();
        }
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.commit_text_edit();
        self.cancel_gesture();
        let redone = self.history.redo(&mut self.doc).is_some();
        if redone {
            self.selection.retain_existing(&self.doc);
            self.touch();
        }
        redone
    }

    // ─── Node operations ─────────────────────────────────────────────────

    /// Create a node of `kind` at `origin` on top of the paint order and
    /// select it.
    pub fn add_node(&mut self, kind: NodeKind, origin: Point, overrides: &serde_json::Value) -> NodeId {
        self.insert_node(create_node(kind, origin, overrides))
    }

    /// Append a prepared node (catalog shapes, logos) and select it.
    pub fn insert_node(&mut self, node: DrawableNode) -> NodeId {
        let id = node.id;
        let label = format!("add {}", node.kind().as_str());
        self.commit(&label, |doc| {
            doc.push(node);
            true
        });
        self.selection.set([id]);
        id
    }

    /// Add a catalog shape as a path node. `None` if the catalog has no
    /// shape by that name.
    pub fn add_catalog_shape(
        &mut self,
        catalog: &dyn ShapeCatalog,
        name: &str,
        origin: Point,
        fill: Color,
    ) -> Option<NodeId> {
        let Some(shape) = catalog.shape(name) else {
            log::warn!("shape `{name}` not in catalog");
            return None;
        };
        Some(self.insert_node(create_catalog_shape(&shape, origin, fill)))
    }

    /// Add a logo asset as an image node flagged as a logo.
    pub fn add_logo(&mut self, catalog: &dyn LogoCatalog, name: &str, origin: Point) -> Option<NodeId> {
        let Some(logo) = catalog.logo(name) else {
            log::warn!("logo `{name}` not in catalog");
            return None;
        };
        let overrides = serde_json::json!({ "source": logo.source, "role": "logo" });
        Some(self.add_node(NodeKind::Image, origin, &overrides))
    }

    /// Apply a typed property edit.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> bool {
        if !self.can_mutate(id) {
            return false;
        }
        if self.session.as_ref().is_some_and(|s| s.node == id) {
            self.commit_text_edit();
        }
        let min = self.config.min_dimension;
        self.commit("edit properties", |doc| {
            doc.get_mut(id).is_some_and(|node| patch.apply(node, min))
        })
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        self.delete_nodes(&[id])
    }

    /// Delete every mutable node in `ids` as one step.
    pub fn delete_nodes(&mut self, ids: &[NodeId]) -> bool {
        let targets: Vec<NodeId> = ids.iter().copied().filter(|id| self.can_mutate(*id)).collect();
        if targets.is_empty() {
            return false;
        }
        if self.session.as_ref().is_some_and(|s| targets.contains(&s.node)) {
            self.session = None;
        }
        self.commit("delete", |doc| {
            let before = doc.len();
            doc.nodes.retain(|n| !targets.contains(&n.id));
            doc.len() != before
        })
    }

    pub fn delete_selection(&mut self) -> bool {
        let ids = self.selection.ids().to_vec();
        self.delete_nodes(&ids)
    }

    /// Duplicate the selection, offset by `duplicate_offset`, and select the
    /// copies.
    pub fn duplicate_selection(&mut self) -> Vec<NodeId> {
        let offset = Vec2::splat(self.config.duplicate_offset as f64);
        let copies: Vec<DrawableNode> = self
            .doc
            .nodes
            .iter()
            .filter(|n| self.selection.contains(n.id))
            .map(|n| duplicate_node(n, offset))
            .collect();
        if copies.is_empty() {
            return Vec::new();
        }
        let ids: Vec<NodeId> = copies.iter().map(|n| n.id).collect();
        self.commit("duplicate", |doc| {
            for copy in copies {
                doc.push(copy);
            }
            true
        });
        self.selection.set(ids.iter().copied());
        ids
    }

    pub fn reorder_node(&mut self, id: NodeId, to: ZOrder) -> bool {
        if !self.can_mutate(id) {
            return false;
        }
        self.commit("reorder", |doc| doc.reorder(id, to))
    }

    /// Apply a z-order move to every selected node. Forward moves visit the
    /// topmost node first, and a single step never swaps two selected
    /// neighbours, so the selection keeps its relative order.
    pub fn reorder_selection(&mut self, to: ZOrder) -> bool {
        let mut ids: Vec<NodeId> = self
            .doc
            .nodes
            .iter()
            .filter(|n| self.selection.contains(n.id) && n.is_mutable())
            .map(|n| n.id)
            .collect();
        if matches!(to, ZOrder::Forward | ZOrder::Back) {
            ids.reverse();
        }
        if ids.is_empty() {
            return false;
        }
        let selected = ids.clone();
        self.commit("reorder", |doc| {
            let mut changed = false;
            for id in ids {
                if blocked_by_selected(doc, id, to, &selected) {
                    continue;
                }
                changed |= doc.reorder(id, to);
            }
            changed
        })
    }

    /// Flip the lock of the selected nodes: if any is unlocked, lock all;
    /// otherwise unlock all. Read-only nodes are skipped.
    pub fn toggle_lock(&mut self) -> bool {
        let ids: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.doc.get(*id).is_some_and(|n| n.editable))
            .collect();
        if ids.is_empty() {
            return false;
        }
        let lock = ids
            .iter()
            .any(|id| self.doc.get(*id).is_some_and(|n| !n.locked));
        self.commit(if lock { "lock" } else { "unlock" }, |doc| {
            let mut changed = false;
            for id in &ids {
                if let Some(node) = doc.get_mut(*id)
                    && node.locked != lock
                {
                    node.locked = lock;
                    changed = true;
                }
            }
            changed
        })
    }

    /// Tag the selected nodes with a shared group. Needs at least two
    /// mutable nodes. Returns the group tag.
    pub fn group_selection(&mut self) -> Option<NodeId> {
        let ids: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.can_mutate(*id))
            .collect();
        if ids.len() < 2 {
            return None;
        }
        let group = NodeId::fresh("group");
        self.commit("group", |doc| {
            for id in &ids {
                if let Some(node) = doc.get_mut(*id) {
                    node.group = Some(group);
                }
            }
            true
        });
        Some(group)
    }

    /// Clear group tags on the selected nodes.
    pub fn ungroup_selection(&mut self) -> bool {
        let ids: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.can_mutate(*id))
            .collect();
        self.commit("ungroup", |doc| {
            let mut changed = false;
            for id in &ids {
                if let Some(node) = doc.get_mut(*id) {
                    changed |= node.group.take().is_some();
                }
            }
            changed
        })
    }

    /// Move the selection by `(dx, dy)` as one step.
    pub fn nudge_selection(&mut self, dx: f32, dy: f32) -> bool {
        let ids: Vec<NodeId> = self
            .selection
            .ids()
            .iter()
            .copied()
            .filter(|id| self.can_transform(*id))
            .collect();
        if ids.is_empty() || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.commit("nudge", |doc| {
            for id in &ids {
                if let Some(node) = doc.get_mut(*id) {
                    node.geometry.x += dx;
                    node.geometry.y += dy;
                }
            }
            true
        })
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: NodeId, additive: bool) {
        if self.doc.contains(id) {
            self.selection.select(&self.doc, id, additive);
            self.touch();
        }
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&self.doc);
        self.touch();
    }

    pub fn deselect(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.touch();
        }
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    /// Serialize the selection into the editor clipboard. Returns the
    /// payload so hosts can mirror it to the system clipboard.
    pub fn copy_selection(&mut self) -> Option<Vec<u8>> {
        let nodes: Vec<&DrawableNode> = self
            .doc
            .nodes
            .iter()
            .filter(|n| self.selection.contains(n.id))
            .collect();
        if nodes.is_empty() {
            return None;
        }
        match clipboard::encode(&nodes) {
            Ok(bytes) => {
                self.clipboard = Some(bytes.clone());
                Some(bytes)
            }
            Err(e) => {
                log::warn!("copy failed: {e}");
                None
            }
        }
    }

    pub fn cut_selection(&mut self) -> Option<Vec<u8>> {
        let bytes = self.copy_selection()?;
        self.delete_selection();
        Some(bytes)
    }

    /// Paste `payload`, or the editor clipboard when `None`. Pasted nodes
    /// get fresh IDs, are offset by `duplicate_offset` and become the
    /// selection.
    pub fn paste(&mut self, payload: Option<&[u8]>) -> Vec<NodeId> {
        let Some(bytes) = payload.map(<[u8]>::to_vec).or_else(|| self.clipboard.clone()) else {
            return Vec::new();
        };
        let offset = Vec2::splat(self.config.duplicate_offset as f64);
        let nodes = match clipboard::decode(&bytes) {
            Ok(nodes) => clipboard::rehome(nodes, offset),
            Err(e) => {
                log::warn!("paste ignored: {e}");
                return Vec::new();
            }
        };
        if nodes.is_empty() {
            return Vec::new();
        }
        let ids: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
        self.commit("paste", |doc| {
            for node in nodes {
                doc.push(node);
            }
            true
        });
        self.selection.set(ids.iter().copied());
        ids
    }
}

/// Whether a one-step move of `id` would swap it with another selected node.
fn blocked_by_selected(doc: &Document, id: NodeId, to: ZOrder, selected: &[NodeId]) -> bool {
    let Some(pos) = doc.index_of(id) else {
        return true;
    };
    let neighbour = match to {
        ZOrder::Forward => doc.nodes.get(pos + 1),
        ZOrder::Backward => pos.checked_sub(1).and_then(|i| doc.nodes.get(i)),
        ZOrder::Front | ZOrder::Back => None,
    };
    neighbour.is_some_and(|n| selected.contains(&n.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn rect(editor: &mut Editor, x: f64) -> NodeId {
        editor.add_node(NodeKind::Rect, Point::new(x, 0.0), &Value::Null)
    }

    #[test]
    fn add_selects_and_records_one_step() {
        let mut editor = Editor::default();
        let id = rect(&mut editor, 0.0);
        assert_eq!(editor.selection().ids(), &[id]);
        assert_eq!(editor.history().past_len(), 1);
        assert!(editor.undo());
        assert!(editor.document().is_empty());
    }

    #[test]
    fn no_op_patch_records_nothing() {
        let mut editor = Editor::default();
        let id = rect(&mut editor, 10.0);
        let patch = NodePatch {
            x: Some(10.0),
            ..NodePatch::default()
        };
        assert!(!editor.update_node(id, &patch));
        assert_eq!(editor.history().past_len(), 1);
    }

    #[test]
    fn locked_nodes_refuse_edits_and_deletes() {
        let mut editor = Editor::default();
        let id = editor.add_node(NodeKind::Rect, Point::ZERO, &json!({"locked": true}));
        let before = editor.document().clone();
        let steps = editor.history().past_len();

        let patch = NodePatch {
            width: Some(300.0),
            ..NodePatch::default()
        };
        assert!(!editor.update_node(id, &patch));
        assert!(!editor.delete_node(id));
        assert!(!editor.reorder_node(id, ZOrder::Back));
        assert_eq!(editor.document(), &before);
        assert_eq!(editor.history().past_len(), steps);
    }

    #[test]
    fn lock_toggle_flips_selection() {
        let mut editor = Editor::default();
        let id = rect(&mut editor, 0.0);
        assert!(editor.toggle_lock());
        assert!(editor.node(id).unwrap().locked);
        assert!(editor.toggle_lock());
        assert!(!editor.node(id).unwrap().locked);
    }

    #[test]
    fn group_then_ungroup() {
        let mut editor = Editor::default();
        let a = rect(&mut editor, 0.0);
        let b = rect(&mut editor, 200.0);
        editor.select(a, false);
        editor.select(b, true);
        let group = editor.group_selection().unwrap();
        assert_eq!(editor.document().group_members(group), vec![a, b]);

        editor.deselect();
        editor.select(b, false);
        assert_eq!(editor.selection().ids(), &[a, b]);

        assert!(editor.ungroup_selection());
        assert!(editor.document().group_members(group).is_empty());
    }

    #[test]
    fn duplicate_offsets_copies() {
        let mut editor = Editor::default();
        let id = rect(&mut editor, 10.0);
        let copies = editor.duplicate_selection();
        assert_eq!(copies.len(), 1);
        assert_ne!(copies[0], id);
        let copy = editor.node(copies[0]).unwrap();
        assert_eq!((copy.geometry.x, copy.geometry.y), (30.0, 20.0));
        assert_eq!(editor.selection().ids(), copies.as_slice());
    }

    #[test]
    fn copy_paste_round_trip() {
        let mut editor = Editor::default();
        let id = editor.add_node(NodeKind::Text, Point::new(5.0, 5.0), &json!({"text": "Ada"}));
        assert!(editor.copy_selection().is_some());
        let pasted = editor.paste(None);
        assert_eq!(pasted.len(), 1);
        assert_ne!(pasted[0], id);
        let node = editor.node(pasted[0]).unwrap();
        assert_eq!(node.props.as_text().unwrap().text, "Ada");
        assert_eq!(node.geometry.x, 25.0);

        assert!(editor.paste(Some(b"not msgpack")).is_empty());
    }

    #[test]
    fn reset_to_original_is_undoable() {
        let mut doc = Document::default();
        doc.push(create_node(NodeKind::Rect, Point::ZERO, &Value::Null));
        let mut editor = Editor::with_document(doc.clone(), EditorConfig::default());
        rect(&mut editor, 50.0);
        assert!(editor.reset_to_original());
        assert_eq!(editor.document(), &doc);
        assert!(editor.undo());
        assert_eq!(editor.document().len(), 2);
        assert!(editor.redo());
        assert_eq!(editor.document(), &doc);
    }

    #[test]
    fn nudge_respects_layout_flag() {
        let mut editor = Editor::default();
        let id = rect(&mut editor, 0.0);
        assert!(editor.nudge_selection(1.0, 0.0));
        assert_eq!(editor.node(id).unwrap().geometry.x, 1.0);
        editor.set_layout_enabled(false);
        assert!(!editor.nudge_selection(1.0, 0.0));
    }

    #[test]
    fn reorder_selection_moves_to_front() {
        let mut editor = Editor::default();
        let a = rect(&mut editor, 0.0);
        let b = rect(&mut editor, 0.0);
        let c = rect(&mut editor, 0.0);
        editor.select(a, false);
        editor.select(b, true);
        assert!(editor.reorder_selection(ZOrder::Front));
        let order: Vec<NodeId> = editor.document().nodes.iter().map(|n| n.id).collect();
        assert_eq!(order, vec![c, a, b]);

        assert!(!editor.reorder_selection(ZOrder::Forward));
        assert!(editor.reorder_selection(ZOrder::Backward));
        let order: Vec<NodeId> = editor.document().nodes.iter().map(|n| n.id).collect();
        assert_eq!(order, vec![a, b, c]);
    }
}
