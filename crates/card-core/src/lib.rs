pub mod assets;
pub mod capability;
pub mod factory;
pub mod geometry;
pub mod id;
pub mod model;
pub mod patch;
pub mod path;
pub mod store;

pub use assets::{IconBody, IconResolver, LogoCatalog, ShapeCatalog, StaticAssets};
pub use capability::{Capabilities, CapabilityFlags, capabilities, capabilities_for};
pub use factory::{create_node, duplicate_node};
pub use geometry::{HostRect, HostViewport, node_host_rect, to_host_space};
pub use id::NodeId;
pub use model::*;
pub use patch::NodePatch;
pub use store::{DocumentStore, MemoryStore, StoreError};

// Re-export kurbo so downstream crates agree on one geometry version
pub use kurbo;
