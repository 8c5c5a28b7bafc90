//! Network data structures and operations.
//!
//! This module provides the core network structure using petgraph's StableGraph
//! for the undirected topology, with Structure of Arrays (SoA) layout for
//! positions and displacements to enable cache-friendly simulation passes and
//! zero-copy upload to the renderer.

mod edge;
mod model;
mod node;

pub use edge::{Edge, EdgeId, EdgeKey};
pub use model::{DEFAULT_REST_LENGTH, GraphModel};
pub use node::{DEFAULT_NODE_COLOR, NodeId, NodeState};
