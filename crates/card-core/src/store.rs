//! Document persistence contract.
//!
//! Storage lives outside the engine; this is the seam it is reached through.
//! `MemoryStore` keeps serialized JSON in memory so the full
//! serialize → store → deserialize path is exercised without a backend.

use crate::model::Document;
use std::collections::HashMap;

/// Errors that can occur loading or saving a document.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document stored under this ID.
    #[error("Document not found: {0}")]
    NotFound(String),
    /// The stored payload could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// An I/O error occurred in the backend.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other backend failure.
    #[error("Backend error: {0}")]
    Backend(String),
}

pub trait DocumentStore {
    fn load(&self, id: &str) -> Result<Document, StoreError>;
    fn save(&mut self, id: &str, doc: &Document) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, if any.
    pub fn raw(&self, id: &str) -> Option<&str> {
        self.docs.get(id).map(String::as_str)
    }

    /// Store raw JSON as-is (for seeding fixtures).
    pub fn insert_raw(&mut self, id: &str, json: impl Into<String>) {
        self.docs.insert(id.to_string(), json.into());
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Document, StoreError> {
        let raw = self
            .docs
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(serde_json::from_str(raw)?)
    }

    fn save(&mut self, id: &str, doc: &Document) -> Result<(), StoreError> {
        let raw = serde_json::to_string(doc)?;
        self.docs.insert(id.to_string(), raw);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::create_node;
    use crate::model::NodeKind;
    use kurbo::Point;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    #[test]
    fn save_then_load_preserves_document() {
        let mut doc = Document::new(600.0, 350.0);
        doc.push(create_node(NodeKind::Text, Point::new(10.0, 10.0), &json!({"text": "Ada"})));
        doc.push(create_node(NodeKind::Image, Point::ZERO, &json!({"source": "a.png"})));
        doc.push(create_node(NodeKind::Arrow, Point::ZERO, &Value::Null));

        let mut store = MemoryStore::new();
        store.save("card-1", &doc).unwrap();
        let loaded = store.load("card-1").unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn stored_nodes_have_id_type_props() {
        let mut doc = Document::default();
        doc.push(create_node(NodeKind::Rect, Point::ZERO, &Value::Null));
        let mut store = MemoryStore::new();
        store.save("c", &doc).unwrap();

        let raw: Value = serde_json::from_str(store.raw("c").unwrap()).unwrap();
        let node = &raw["nodes"][0];
        assert!(node["id"].is_string());
        assert_eq!(node["type"], "Rect");
        assert!(node["props"].is_object());
        assert_eq!(node["editable"], true);
    }

    #[test]
    fn missing_document_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.load("nope"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn corrupt_payload_is_serialization_error() {
        let mut store = MemoryStore::new();
        store.insert_raw("bad", "{ not json");
        assert!(matches!(store.load("bad"), Err(StoreError::Serialization(_))));
    }
}
