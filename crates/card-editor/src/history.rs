//! Snapshot-based undo/redo.
//!
//! Every committed mutation pushes the document as it was *before* the
//! mutation onto the past stack and clears the future stack, so history
//! never branches. Undo swaps the current document with the newest past
//! snapshot; redo is the mirror.
//!
//! Gestures are recorded the same way: the document is captured when the
//! gesture starts and pushed once when it ends, so a drag is one step no
//! matter how many pointer moves it took.

use card_core::Document;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
struct Snapshot {
    label: String,
    doc: Document,
}

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    max_depth: usize,
    /// Document as loaded, for "reset to original".
    baseline: Option<Document>,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(max_depth.min(64)),
            future: Vec::new(),
            max_depth: max_depth.max(1),
            baseline: None,
        }
    }

    /// Record `before` as the state preceding a committed mutation.
    pub fn push(&mut self, label: &str, before: Document) {
        self.past.push_back(Snapshot {
            label: label.to_string(),
            doc: before,
        });
        if self.past.len() > self.max_depth {
            self.past.pop_front();
        }
        self.future.clear();
        log::debug!("history: +{label} ({} past)", self.past.len());
    }

    /// Restore the newest past snapshot into `current`. Returns its label.
    pub fn undo(&mut self, current: &mut Document) -> Option<String> {
        let Snapshot { label, doc } = self.past.pop_back()?;
        let after = std::mem::replace(current, doc);
        self.future.push(Snapshot {
            label: label.clone(),
            doc: after,
        });
        log::debug!("history: undo {label}");
        Some(label)
    }

    /// Re-apply the newest undone mutation. Returns its label.
    pub fn redo(&mut self, current: &mut Document) -> Option<String> {
        let Snapshot { label, doc } = self.future.pop()?;
        let before = std::mem::replace(current, doc);
        self.past.push_back(Snapshot {
            label: label.clone(),
            doc: before,
        });
        log::debug!("history: redo {label}");
        Some(label)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|s| s.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|s| s.label.as_str())
    }

    /// Forget all steps and make `doc` the new baseline.
    pub fn reset(&mut self, doc: &Document) {
        self.past.clear();
        self.future.clear();
        self.baseline = Some(doc.clone());
    }

    pub fn baseline(&self) -> Option<&Document> {
        self.baseline.as_ref()
    }
}
