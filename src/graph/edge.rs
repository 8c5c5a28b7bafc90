//! Edge type and related structures.
//!
//! Edges are undirected connections between two distinct nodes. Each edge has:
//! - A stable identifier (creation order)
//! - Its two endpoint tags
//! - A constant rest length used by the spring force

use std::fmt;

use serde::Serialize;

use super::node::NodeId;

/// Stable edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Normalized unordered endpoint pair, smaller tag first.
///
/// This is the key of the adjacency index, so `{a, b}` and `{b, a}` hash
/// to the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey(u32, u32);

impl EdgeKey {
    /// Build the key for an unordered pair.
    #[inline]
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a.0 <= b.0 {
            Self(a.0, b.0)
        } else {
            Self(b.0, a.0)
        }
    }

    /// Lower endpoint.
    #[inline]
    pub fn low(self) -> NodeId {
        NodeId(self.0)
    }

    /// Higher endpoint.
    #[inline]
    pub fn high(self) -> NodeId {
        NodeId(self.1)
    }
}

/// Read-only view of one edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub rest_length: f32,
}

impl Edge {
    /// The endpoint opposite `node`, or None if `node` is not an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id() {
        let id = EdgeId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Edge(42)");
    }

    #[test]
    fn test_edge_key_is_unordered() {
        let ab = EdgeKey::new(NodeId(3), NodeId(7));
        let ba = EdgeKey::new(NodeId(7), NodeId(3));
        assert_eq!(ab, ba);
        assert_eq!(ab.low(), NodeId(3));
        assert_eq!(ab.high(), NodeId(7));
    }

    #[test]
    fn test_edge_other_endpoint() {
        let edge = Edge {
            id: EdgeId(0),
            source: NodeId(1),
            target: NodeId(2),
            rest_length: 50.0,
        };
        assert_eq!(edge.other(NodeId(1)), Some(NodeId(2)));
        assert_eq!(edge.other(NodeId(2)), Some(NodeId(1)));
        assert_eq!(edge.other(NodeId(9)), None);
    }
}
