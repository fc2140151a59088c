//! Selection state.
//!
//! A set of selected node IDs in selection order plus an optional "active"
//! node for single-target operations. Groups are flat tags, so selecting one
//! member of a group selects every member.

use card_core::{Document, NodeId};
use serde::Serialize;
use smallvec::SmallVec;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    ids: SmallVec<[NodeId; 4]>,
    active: Option<NodeId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn active(&self) -> Option<NodeId> {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.active = None;
    }

    /// Replace the selection. The first ID becomes active.
    pub fn set(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.ids.clear();
        for id in ids {
            if !self.ids.contains(&id) {
                self.ids.push(id);
            }
        }
        self.active = self.ids.first().copied();
    }

    fn add(&mut self, id: NodeId) {
        if !self.ids.contains(&id) {
            self.ids.push(id);
        }
    }

    /// Click-select `id` (with its group). With `additive`, toggle it in or
    /// out of the current selection instead of replacing it.
    pub fn select(&mut self, doc: &Document, id: NodeId, additive: bool) {
        let members = with_group(doc, id);
        if additive {
            if self.contains(id) {
                self.ids.retain(|i| !members.contains(i));
                if self.active.is_some_and(|a| members.contains(&a)) {
                    self.active = self.ids.first().copied();
                }
            } else {
                for m in members {
                    self.add(m);
                }
                self.active = Some(id);
            }
        } else {
            self.set(members);
            self.active = Some(id);
        }
    }

    /// Add every node in `ids` (expanding groups).
    pub fn extend(&mut self, doc: &Document, ids: impl IntoIterator<Item = NodeId>) {
        for id in ids {
            for m in with_group(doc, id) {
                self.add(m);
            }
        }
        if self.active.is_none() {
            self.active = self.ids.first().copied();
        }
    }

    /// Select every visible node.
    pub fn select_all(&mut self, doc: &Document) {
        self.set(doc.nodes.iter().filter(|n| n.geometry.visible).map(|n| n.id));
    }

    /// Drop IDs that no longer exist in `doc` (after undo, delete, load).
    pub fn retain_existing(&mut self, doc: &Document) {
        self.ids.retain(|id| doc.contains(*id));
        if self.active.is_some_and(|a| !doc.contains(a)) {
            self.active = self.ids.first().copied();
        }
    }
}

/// `id` plus every node sharing its group tag, in paint order.
fn with_group(doc: &Document, id: NodeId) -> SmallVec<[NodeId; 4]> {
    match doc.get(id).and_then(|n| n.group) {
        Some(group) => doc.group_members(group).into_iter().collect(),
        None => SmallVec::from_elem(id, 1),
    }
}
