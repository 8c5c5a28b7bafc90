//! Layout algorithms for network visualization.
//!
//! The force-directed simulator moves nodes in place: repulsion between every
//! pair (Barnes-Hut approximated) and springs along edges, stepped by the
//! scene's periodic tick until the layout settles.

mod force;

pub use force::{Falloff, ForceSimulator, SimulationConfig, SimulationState};
