//! Spatial indexing.
//!
//! Two indexes live here:
//! - [`SpatialIndex`]: the Barnes-Hut quadtree/octree the force simulator
//!   rebuilds every step to approximate repulsion in O(n log n)
//! - [`HitIndex`]: an R-tree used for pointer picking during drags

mod barnes_hut;
mod rtree;

pub use barnes_hut::{Body, Dimension, MAX_DEPTH, SpatialIndex, distance};
pub use rtree::{HitIndex, NodePoint};
