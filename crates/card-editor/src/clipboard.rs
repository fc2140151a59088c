//! Clipboard payloads.
//!
//! Copied nodes travel as MessagePack (`rmp-serde`, named fields) so a
//! payload survives a round trip through the system clipboard as bytes.
//! Pasting never trusts the payload's IDs: every node gets a fresh one and
//! group tags are remapped so a pasted group stays together without joining
//! the original.

use card_core::kurbo::Vec2;
use card_core::{DrawableNode, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const PAYLOAD_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard encode failed: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("clipboard payload is not a node list: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("unsupported clipboard payload version {0}")]
    Version(u32),
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    version: u32,
    nodes: &'a [&'a DrawableNode],
}

#[derive(Deserialize)]
struct Payload {
    version: u32,
    nodes: Vec<DrawableNode>,
}

pub fn encode(nodes: &[&DrawableNode]) -> Result<Vec<u8>, ClipboardError> {
    let payload = PayloadRef {
        version: PAYLOAD_VERSION,
        nodes,
    };
    Ok(rmp_serde::to_vec_named(&payload)?)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<DrawableNode>, ClipboardError> {
    let payload: Payload = rmp_serde::from_slice(bytes)?;
    if payload.version != PAYLOAD_VERSION {
        return Err(ClipboardError::Version(payload.version));
    }
    Ok(payload.nodes)
}

/// Give decoded nodes fresh IDs and group tags and shift them by `offset`.
pub fn rehome(nodes: Vec<DrawableNode>, offset: Vec2) -> Vec<DrawableNode> {
    let mut groups: HashMap<NodeId, NodeId> = HashMap::new();
    nodes
        .into_iter()
        .map(|mut node| {
            node.id = NodeId::fresh(node.kind().id_prefix());
            node.geometry.x += offset.x as f32;
            node.geometry.y += offset.y as f32;
            node.group = node
                .group
                .map(|g| *groups.entry(g).or_insert_with(|| NodeId::fresh("group")));
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use card_core::factory::create_node;
    use card_core::kurbo::Point;
    use card_core::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    #[test]
    fn payload_round_trips_nodes() {
        let a = create_node(NodeKind::Star, Point::new(1.0, 2.0), &Value::Null);
        let b = create_node(NodeKind::Line, Point::ZERO, &Value::Null);
        let bytes = encode(&[&a, &b]).unwrap();
        assert_eq!(decode(&bytes).unwrap(), vec![a, b]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode(&[0xc1]), Err(ClipboardError::Decode(_))));
    }

    #[test]
    fn rehome_keeps_groups_together_under_new_tag() {
        let group = NodeId::fresh("group");
        let mut a = create_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        let mut b = create_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        let c = create_node(NodeKind::Rect, Point::ZERO, &Value::Null);
        a.group = Some(group);
        b.group = Some(group);
        let ids = [a.id, b.id, c.id];

        let pasted = rehome(vec![a, b, c], Vec2::new(20.0, 20.0));
        assert!(pasted.iter().zip(ids).all(|(n, old)| n.id != old));
        assert_eq!(pasted[0].group, pasted[1].group);
        assert_ne!(pasted[0].group, Some(group));
        assert_eq!(pasted[2].group, None);
        assert_eq!(pasted[0].geometry.x, 20.0);
    }
}
