//! Node type and related structures.
//!
//! Nodes are the vertices of the network. Each node has:
//! - A dense tag assigned at creation (also its index into the SoA buffers)
//! - Position (x, y, z) in layout space, z held at 0 in 2D mode
//! - A pending displacement accumulated during a simulation step
//! - Pinned state (excluded from force integration while dragged)
//! - Display attributes owned by the presentation layer

use std::fmt;

use serde::{Deserialize, Serialize};

/// Node tag.
///
/// Tags are assigned monotonically starting at zero and are only reused
/// after the whole graph has been cleared. A tag is also the node's index
/// into every per-node buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Index into per-node buffers.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Node state flags packed into a single byte.
///
/// Only `PINNED` is read by the core. The remaining flags belong to the
/// presentation layer and are stored verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeState {
    flags: u8,
}

impl NodeState {
    const PINNED: u8 = 0b0000_0001;
    const HIGHLIGHTED: u8 = 0b0000_0010;
    const SELECTED: u8 = 0b0000_0100;
    const HOVERED: u8 = 0b0000_1000;

    /// Create a new default node state.
    #[inline]
    pub fn new() -> Self {
        Self { flags: 0 }
    }

    #[inline]
    fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }

    /// Check if the node is pinned (excluded from force integration).
    #[inline]
    pub fn is_pinned(self) -> bool {
        self.flags & Self::PINNED != 0
    }

    /// Set the pinned state.
    #[inline]
    pub fn set_pinned(&mut self, pinned: bool) {
        self.set(Self::PINNED, pinned);
    }

    /// Check if the node is highlighted.
    #[inline]
    pub fn is_highlighted(self) -> bool {
        self.flags & Self::HIGHLIGHTED != 0
    }

    /// Set the highlighted state.
    #[inline]
    pub fn set_highlighted(&mut self, highlighted: bool) {
        self.set(Self::HIGHLIGHTED, highlighted);
    }

    /// Check if the node is selected.
    #[inline]
    pub fn is_selected(self) -> bool {
        self.flags & Self::SELECTED != 0
    }

    /// Set the selected state.
    #[inline]
    pub fn set_selected(&mut self, selected: bool) {
        self.set(Self::SELECTED, selected);
    }

    /// Check if the node is hovered.
    #[inline]
    pub fn is_hovered(self) -> bool {
        self.flags & Self::HOVERED != 0
    }

    /// Set the hovered state.
    #[inline]
    pub fn set_hovered(&mut self, hovered: bool) {
        self.set(Self::HOVERED, hovered);
    }
}

/// Default node colour (opaque blue, 0xRRGGBBAA).
pub const DEFAULT_NODE_COLOR: u32 = 0x3366_ccff;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "Node(42)");
    }

    #[test]
    fn test_node_id_conversion() {
        let id: NodeId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_node_state_default() {
        let state = NodeState::new();
        assert!(!state.is_pinned());
        assert!(!state.is_highlighted());
        assert!(!state.is_selected());
        assert!(!state.is_hovered());
    }

    #[test]
    fn test_node_state_flags_are_independent() {
        let mut state = NodeState::new();
        state.set_pinned(true);
        state.set_highlighted(true);
        assert!(state.is_pinned());
        assert!(state.is_highlighted());
        assert!(!state.is_selected());

        state.set_pinned(false);
        assert!(!state.is_pinned());
        assert!(state.is_highlighted());
    }
}
