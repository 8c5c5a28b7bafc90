//! R-tree based hit index using the rstar crate.
//!
//! Answers "which node is under this point" for the drag contract. Queries
//! run in the layout's x/y plane; in 3D mode the presentation layer projects
//! the pointer into that plane before asking.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::{GraphModel, NodeId};

/// A point in the hit index with associated node tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePoint {
    /// The node tag.
    pub id: NodeId,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl NodePoint {
    /// Create a new NodePoint.
    pub fn new(id: NodeId, x: f32, y: f32) -> Self {
        Self { id, x, y }
    }
}

impl RTreeObject for NodePoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for NodePoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        (self.x - point[0]).abs() < f32::EPSILON && (self.y - point[1]).abs() < f32::EPSILON
    }
}

/// Hit index over node positions.
///
/// Uses an R*-tree bulk loaded from the model. The owner tracks staleness
/// and calls [`HitIndex::rebuild_from`] after positions move.
pub struct HitIndex {
    tree: RTree<NodePoint>,
}

impl HitIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Insert a node into the index.
    pub fn insert(&mut self, id: NodeId, x: f32, y: f32) {
        self.tree.insert(NodePoint::new(id, x, y));
    }

    /// Find the nearest node to a point.
    pub fn nearest(&self, x: f32, y: f32) -> Option<NodeId> {
        self.tree.nearest_neighbor(&[x, y]).map(|point| point.id)
    }

    /// Find the nearest node within a maximum distance.
    pub fn nearest_within(&self, x: f32, y: f32, max_distance: f32) -> Option<NodeId> {
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&[x, y])
            .filter(|point| point.distance_2(&[x, y]) <= max_distance_sq)
            .map(|point| point.id)
    }

    /// Find all nodes within a rectangle.
    pub fn in_rect(&self, min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Vec<NodeId> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|point| point.id)
            .collect()
    }

    /// Find all nodes within a radius of a point.
    pub fn in_radius(&self, x: f32, y: f32, radius: f32) -> Vec<NodeId> {
        let radius_sq = radius * radius;
        self.tree
            .locate_within_distance([x, y], radius_sq)
            .map(|point| point.id)
            .collect()
    }

    /// Rebuild the index from the model's current positions.
    pub fn rebuild_from(&mut self, model: &GraphModel) {
        let xs = model.positions_x();
        let ys = model.positions_y();
        let points: Vec<_> = model
            .node_ids()
            .map(|id| NodePoint::new(id, xs[id.index()], ys[id.index()]))
            .collect();

        self.tree = RTree::bulk_load(points);
    }

    /// Clear all nodes from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }

    /// Get the number of nodes in the index.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for HitIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_nearest() {
        let mut index = HitIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 10.0, 10.0);
        index.insert(NodeId(2), 5.0, 5.0);

        assert_eq!(index.nearest(0.0, 0.0), Some(NodeId(0)));
        assert_eq!(index.nearest(6.0, 6.0), Some(NodeId(2)));
        assert_eq!(index.nearest(11.0, 11.0), Some(NodeId(1)));
    }

    #[test]
    fn test_nearest_within() {
        let mut index = HitIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 10.0, 10.0);

        assert_eq!(index.nearest_within(0.0, 0.0, 5.0), Some(NodeId(0)));
        assert_eq!(index.nearest_within(5.0, 5.0, 1.0), None);
        // Node 0 is ~7.07 from (5, 5)
        assert_eq!(index.nearest_within(5.0, 5.0, 8.0), Some(NodeId(0)));
    }

    #[test]
    fn test_in_rect_and_radius() {
        let mut index = HitIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 3.0, 0.0);
        index.insert(NodeId(2), 10.0, 10.0);

        let in_rect = index.in_rect(-1.0, -1.0, 6.0, 6.0);
        assert_eq!(in_rect.len(), 2);
        assert!(in_rect.contains(&NodeId(0)));
        assert!(in_rect.contains(&NodeId(1)));

        let in_radius = index.in_radius(0.0, 0.0, 5.0);
        assert_eq!(in_radius.len(), 2);
        assert!(!in_radius.contains(&NodeId(2)));
    }

    #[test]
    fn test_rebuild_from_model() {
        let mut model = GraphModel::new();
        model.new_node_at([1.0, 1.0, 0.0]);
        model.new_node_at([2.0, 2.0, 0.0]);
        model.new_node_at([3.0, 3.0, 40.0]);

        let mut index = HitIndex::new();
        index.insert(NodeId(9), -50.0, -50.0);
        index.rebuild_from(&model);

        assert_eq!(index.len(), 3);
        assert_eq!(index.nearest(0.0, 0.0), Some(NodeId(0)));
        // z is ignored for picking
        assert_eq!(index.nearest(3.1, 3.1), Some(NodeId(2)));
    }

    #[test]
    fn test_clear() {
        let mut index = HitIndex::new();
        index.insert(NodeId(0), 0.0, 0.0);
        index.insert(NodeId(1), 1.0, 1.0);

        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.nearest(0.0, 0.0), None);
    }
}
