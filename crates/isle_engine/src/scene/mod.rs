//! Scene management
//!
//! The renderable world lives here: an arena-backed transform hierarchy,
//! per-node waypoint movement, the per-frame visibility/classification
//! walk with its three draw buckets, and the scene selector that swaps
//! whole subtrees under the global root.
//!
//! ## Per-frame flow
//!
//! ```text
//! SceneGraph::update(dt)      world transforms + movement + node ticks
//!        |
//! DrawBuckets::build(..)      classify into animated/transparent/opaque
//!        |
//! DrawBuckets::sort(..)       distance ordering per bucket
//!        |
//! FramePipeline::render(..)   consumes the buckets, then clears them
//! ```

mod buckets;
mod frustum;
mod graph;
mod movement;
mod node;
mod selector;

pub use buckets::{DrawBuckets, compare_by_camera_distance};
pub use frustum::{Frustum, Plane};
pub use graph::SceneGraph;
pub use movement::MovementState;
pub use node::{AnimationState, EmitterState, NodeKey, NodeKind, SceneNode};
pub use selector::{SceneDefinition, SceneId, SceneSelector};

use thiserror::Error;

/// Scene graph structural errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// Attach of a node that already has a parent (detach first)
    #[error("node '{0}' already has a parent")]
    AlreadyParented(String),

    /// Detach of a node that is not a child of the given parent
    #[error("node '{0}' is not a child of '{1}'")]
    NotAChild(String, String),

    /// A key did not resolve to a live node
    #[error("unknown scene node")]
    UnknownNode,

    /// Selection of a scene id that was never registered
    #[error("unknown scene id {0}")]
    UnknownScene(usize),
}
