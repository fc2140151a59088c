//! Capability resolver: node → set of applicable editing affordances.
//!
//! Pure and total. The render pipeline and UI gating both call it per frame,
//! so it must never allocate, panic, or depend on anything beyond its input.

use crate::model::{DrawableNode, ImageRole, NodeKind, NodeProps};
use serde::Serialize;

/// Editing affordances applicable to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub is_selectable: bool,
    pub has_crop: bool,
    pub has_fill: bool,
    pub has_stroke: bool,
    pub can_edit_points: bool,
    pub can_edit_text: bool,
    pub can_enter_isolation_mode: bool,
    pub has_filters: bool,
    pub can_edit_qr_code: bool,
    pub can_edit_logo: bool,
}

impl Capabilities {
    /// Used for anything the table does not know: selectable, fill and
    /// stroke, nothing advanced.
    pub const FALLBACK: Capabilities = Capabilities {
        is_selectable: true,
        has_crop: false,
        has_fill: true,
        has_stroke: true,
        can_edit_points: false,
        can_edit_text: false,
        can_enter_isolation_mode: false,
        has_filters: false,
        can_edit_qr_code: false,
        can_edit_logo: false,
    };
}

/// Flags embedded in props that alter a type's base capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilityFlags {
    pub generated_code: bool,
    pub logo: bool,
}

impl CapabilityFlags {
    pub fn of(props: &NodeProps) -> Self {
        match props {
            NodeProps::Image(img) => Self {
                generated_code: img.role == ImageRole::QrCode,
                logo: img.role == ImageRole::Logo,
            },
            _ => Self::default(),
        }
    }
}

/// Capabilities of a node.
pub fn capabilities(node: &DrawableNode) -> Capabilities {
    capabilities_for(node.kind(), CapabilityFlags::of(&node.props))
}

/// Capabilities of a `(type, flags)` pair.
pub fn capabilities_for(kind: NodeKind, flags: CapabilityFlags) -> Capabilities {
    let base = Capabilities {
        is_selectable: true,
        ..Capabilities::default()
    };
    match kind {
        NodeKind::Text => Capabilities {
            has_fill: true,
            can_edit_text: true,
            ..base
        },
        NodeKind::Image => {
            let special = flags.generated_code || flags.logo;
            Capabilities {
                has_crop: !special,
                has_stroke: true,
                has_filters: true,
                can_edit_qr_code: flags.generated_code,
                can_edit_logo: flags.logo,
                ..base
            }
        }
        NodeKind::Icon
        | NodeKind::Rect
        | NodeKind::Circle
        | NodeKind::Ellipse
        | NodeKind::Star
        | NodeKind::RegularPolygon => Capabilities {
            has_fill: true,
            has_stroke: true,
            ..base
        },
        NodeKind::Path => Capabilities {
            has_fill: true,
            has_stroke: true,
            can_edit_points: true,
            can_enter_isolation_mode: true,
            ..base
        },
        NodeKind::Line | NodeKind::Arrow => Capabilities {
            has_stroke: true,
            can_edit_points: true,
            ..base
        },
    }
}

/// Capabilities for a type given by name, as received from a host.
/// Names outside the known set get [`Capabilities::FALLBACK`].
pub fn capabilities_for_name(name: &str, flags: CapabilityFlags) -> Capabilities {
    match NodeKind::from_name(name) {
        Some(kind) => capabilities_for(kind, flags),
        None => Capabilities::FALLBACK,
    }
}
