//! Local clustering coefficients.

use std::collections::HashSet;

use crate::graph::NodeId;

/// `2t / (k(k-1))` where `t` counts edges among the `k` neighbours of `node`.
/// Nodes with fewer than two neighbours score 0.
pub(crate) fn local_coefficient(adjacency: &[Vec<NodeId>], node: NodeId) -> f64 {
    let Some(neighbors) = adjacency.get(node.index()) else {
        return 0.0;
    };
    let k = neighbors.len();
    if k < 2 {
        return 0.0;
    }

    let members: HashSet<NodeId> = neighbors.iter().copied().collect();
    // Each edge among neighbours is seen from both of its endpoints.
    let seen: usize = neighbors
        .iter()
        .map(|n| adjacency[n.index()].iter().filter(|m| members.contains(m)).count())
        .sum();
    let triangles = seen / 2;

    2.0 * triangles as f64 / (k * (k - 1)) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjacency(n: usize, edges: &[(u32, u32)]) -> Vec<Vec<NodeId>> {
        let mut adjacency = vec![Vec::new(); n];
        for &(a, b) in edges {
            adjacency[a as usize].push(NodeId(b));
            adjacency[b as usize].push(NodeId(a));
        }
        adjacency
    }

    #[test]
    fn test_triangle() {
        let adj = adjacency(3, &[(0, 1), (1, 2), (2, 0)]);
        for i in 0..3 {
            assert_eq!(local_coefficient(&adj, NodeId(i)), 1.0);
        }
    }

    #[test]
    fn test_star_centre_and_leaves() {
        let adj = adjacency(4, &[(0, 1), (0, 2), (0, 3)]);
        assert_eq!(local_coefficient(&adj, NodeId(0)), 0.0);
        assert_eq!(local_coefficient(&adj, NodeId(1)), 0.0);
    }

    #[test]
    fn test_partial_neighbourhood() {
        // Node 0 has neighbours 1, 2, 3 with one edge among them
        let adj = adjacency(4, &[(0, 1), (0, 2), (0, 3), (1, 2)]);
        assert!((local_coefficient(&adj, NodeId(0)) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(local_coefficient(&adj, NodeId(9)), 0.0);
    }
}
