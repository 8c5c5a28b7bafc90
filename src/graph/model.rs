//! GraphModel - Core network data structure.
//!
//! The GraphModel stores the network topology using petgraph's StableGraph
//! and maintains SoA (Structure of Arrays) buffers for positions, pending
//! displacements and node state so the renderer can upload them without
//! copying. A set of normalized endpoint pairs gives O(1) edge lookups.

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Undirected;
use std::collections::HashSet;

use super::edge::{Edge, EdgeId, EdgeKey};
use super::node::{DEFAULT_NODE_COLOR, NodeId, NodeState};

/// Rest length given to new edges unless overridden.
pub const DEFAULT_REST_LENGTH: f32 = 50.0;

/// The network owned by a scene.
///
/// This struct manages:
/// - Undirected topology via petgraph (node weight = tag, edge weight = rest length)
/// - The adjacency index used for duplicate detection
/// - Position/displacement buffers in SoA layout
/// - Node state (pinned, highlighted, ...) and display colours
///
/// Tags are dense: node `n` always lives at petgraph index `n` because nodes
/// are never removed individually, only all at once by [`GraphModel::clear`].
pub struct GraphModel {
    /// The underlying graph structure.
    graph: StableGraph<NodeId, f32, Undirected>,

    /// Normalized endpoint pairs of every edge.
    adjacency: HashSet<EdgeKey>,

    /// Next node tag to assign
    next_node_id: u32,

    /// Rest length assigned to edges created from now on
    rest_length: f32,

    /// Positions (SoA layout)
    pos_x: Vec<f32>,
    pos_y: Vec<f32>,
    pos_z: Vec<f32>,

    /// Pending displacement for the step in flight (SoA layout)
    disp_x: Vec<f32>,
    disp_y: Vec<f32>,
    disp_z: Vec<f32>,

    /// Node states (pinned, highlighted, etc.)
    states: Vec<NodeState>,

    /// Display colours, 0xRRGGBBAA
    colors: Vec<u32>,
}

impl GraphModel {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create a model with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, edge_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, edge_capacity),
            adjacency: HashSet::with_capacity(edge_capacity),
            next_node_id: 0,
            rest_length: DEFAULT_REST_LENGTH,
            pos_x: Vec::with_capacity(node_capacity),
            pos_y: Vec::with_capacity(node_capacity),
            pos_z: Vec::with_capacity(node_capacity),
            disp_x: Vec::with_capacity(node_capacity),
            disp_y: Vec::with_capacity(node_capacity),
            disp_z: Vec::with_capacity(node_capacity),
            states: Vec::with_capacity(node_capacity),
            colors: Vec::with_capacity(node_capacity),
        }
    }

    #[inline]
    fn index_of(id: NodeId) -> NodeIndex {
        NodeIndex::new(id.index())
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Append a node at the origin with the next unused tag.
    pub fn new_node(&mut self) -> NodeId {
        self.new_node_at([0.0, 0.0, 0.0])
    }

    /// Append a node at the given position.
    pub fn new_node_at(&mut self, position: [f32; 3]) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;

        let index = self.graph.add_node(id);
        debug_assert_eq!(index.index(), id.index());

        self.pos_x.push(position[0]);
        self.pos_y.push(position[1]);
        self.pos_z.push(position[2]);
        self.disp_x.push(0.0);
        self.disp_y.push(0.0);
        self.disp_z.push(0.0);
        self.states.push(NodeState::new());
        self.colors.push(DEFAULT_NODE_COLOR);

        id
    }

    /// Whether `id` names a live node.
    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.next_node_id
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Iterate over all node tags in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.next_node_id).map(NodeId)
    }

    /// Number of edges incident to a node (0 for unknown tags).
    pub fn degree(&self, id: NodeId) -> usize {
        if !self.contains(id) {
            return 0;
        }
        self.graph.edges(Self::index_of(id)).count()
    }

    /// Degrees of every node, indexed by tag.
    pub fn degrees(&self) -> Vec<usize> {
        let mut degrees = vec![0usize; self.next_node_id as usize];
        for key in &self.adjacency {
            degrees[key.low().index()] += 1;
            degrees[key.high().index()] += 1;
        }
        degrees
    }

    /// Get the neighbours of a node.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.graph
            .neighbors(Self::index_of(id))
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    /// Edges incident to a node, in creation order.
    pub fn incident_edges(&self, id: NodeId) -> Vec<EdgeId> {
        if !self.contains(id) {
            return Vec::new();
        }
        let mut edges: Vec<EdgeId> = self
            .graph
            .edges(Self::index_of(id))
            .map(|e| EdgeId(e.id().index() as u32))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Get a node's position.
    pub fn position(&self, id: NodeId) -> Option<[f32; 3]> {
        self.contains(id).then(|| {
            let i = id.index();
            [self.pos_x[i], self.pos_y[i], self.pos_z[i]]
        })
    }

    /// Set a node's position. Returns false for unknown tags.
    pub fn set_position(&mut self, id: NodeId, position: [f32; 3]) -> bool {
        if !self.contains(id) {
            return false;
        }
        let i = id.index();
        self.pos_x[i] = position[0];
        self.pos_y[i] = position[1];
        self.pos_z[i] = position[2];
        true
    }

    /// Pin a node (exclude from force integration).
    pub fn pin_node(&mut self, id: NodeId) {
        if self.contains(id) {
            self.states[id.index()].set_pinned(true);
        }
    }

    /// Unpin a node.
    pub fn unpin_node(&mut self, id: NodeId) {
        if self.contains(id) {
            self.states[id.index()].set_pinned(false);
        }
    }

    /// Check if a node is pinned.
    pub fn is_node_pinned(&self, id: NodeId) -> bool {
        self.contains(id) && self.states[id.index()].is_pinned()
    }

    /// Get a node's state flags.
    pub fn node_state(&self, id: NodeId) -> Option<NodeState> {
        self.states.get(id.index()).copied()
    }

    /// Mutable access to a node's state flags.
    pub fn node_state_mut(&mut self, id: NodeId) -> Option<&mut NodeState> {
        self.states.get_mut(id.index())
    }

    /// Get a node's display colour.
    pub fn node_color(&self, id: NodeId) -> Option<u32> {
        self.colors.get(id.index()).copied()
    }

    /// Set a node's display colour.
    pub fn set_node_color(&mut self, id: NodeId, rgba: u32) {
        if let Some(slot) = self.colors.get_mut(id.index()) {
            *slot = rgba;
        }
    }

    /// Paint every node with the same colour.
    pub fn set_all_node_colors(&mut self, rgba: u32) {
        self.colors.fill(rgba);
    }

    // =========================================================================
    // Edge Operations
    // =========================================================================

    /// Create an undirected edge.
    ///
    /// Returns None for self-loops, unknown endpoints and pairs that are
    /// already connected in either direction.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        if a == b || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let key = EdgeKey::new(a, b);
        if !self.adjacency.insert(key) {
            return None;
        }
        let index = self
            .graph
            .add_edge(Self::index_of(key.low()), Self::index_of(key.high()), self.rest_length);
        Some(EdgeId(index.index() as u32))
    }

    /// Create an undirected edge, reporting success as a boolean.
    pub fn new_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        self.add_edge(a, b).is_some()
    }

    /// Symmetric O(1) existence check.
    pub fn does_edge_exist(&self, a: NodeId, b: NodeId) -> bool {
        self.adjacency.contains(&EdgeKey::new(a, b))
    }

    /// Get the number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up one edge.
    pub fn edge(&self, id: EdgeId) -> Option<Edge> {
        let index = EdgeIndex::new(id.0 as usize);
        let (a, b) = self.graph.edge_endpoints(index)?;
        Some(Edge {
            id,
            source: self.graph[a],
            target: self.graph[b],
            rest_length: *self.graph.edge_weight(index)?,
        })
    }

    /// Iterate over every edge.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edge_references().map(|e| Edge {
            id: EdgeId(e.id().index() as u32),
            source: self.graph[e.source()],
            target: self.graph[e.target()],
            rest_length: *e.weight(),
        })
    }

    /// Rest length assigned to edges created after this call.
    pub fn set_default_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length;
    }

    /// Get the rest length assigned to new edges.
    pub fn default_rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Get the edge list as flat endpoint pairs [a0, b0, a1, b1, ...].
    ///
    /// Ordered by edge id, ready for line-buffer upload.
    pub fn edge_pairs(&self) -> Vec<u32> {
        let mut edges: Vec<Edge> = self.edges().collect();
        edges.sort_unstable_by_key(|e| e.id);
        let mut pairs = Vec::with_capacity(edges.len() * 2);
        for edge in edges {
            pairs.push(edge.source.0);
            pairs.push(edge.target.0);
        }
        pairs
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Get X positions slice.
    pub fn positions_x(&self) -> &[f32] {
        &self.pos_x
    }

    /// Get Y positions slice.
    pub fn positions_y(&self) -> &[f32] {
        &self.pos_y
    }

    /// Get Z positions slice.
    pub fn positions_z(&self) -> &[f32] {
        &self.pos_z
    }

    /// Add to a node's pending displacement.
    pub(crate) fn accumulate_displacement(&mut self, id: NodeId, delta: [f32; 3]) {
        let i = id.index();
        self.disp_x[i] += delta[0];
        self.disp_y[i] += delta[1];
        self.disp_z[i] += delta[2];
    }

    /// Apply every pending displacement to its position and zero the
    /// accumulators. Pinned nodes keep their position.
    pub(crate) fn commit_displacements(&mut self) {
        for i in 0..self.pos_x.len() {
            if !self.states[i].is_pinned() {
                self.pos_x[i] += self.disp_x[i];
                self.pos_y[i] += self.disp_y[i];
                self.pos_z[i] += self.disp_z[i];
            }
        }
        self.disp_x.fill(0.0);
        self.disp_y.fill(0.0);
        self.disp_z.fill(0.0);
    }

    // =========================================================================
    // Utilities
    // =========================================================================

    /// Get the bounding box of all nodes as (min, max).
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        if self.pos_x.is_empty() {
            return None;
        }

        let mut min = [f32::INFINITY; 3];
        let mut max = [f32::NEG_INFINITY; 3];
        for i in 0..self.pos_x.len() {
            let p = [self.pos_x[i], self.pos_y[i], self.pos_z[i]];
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        Some((min, max))
    }

    /// Remove all nodes and edges and restart tag numbering at zero.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.adjacency.clear();
        self.next_node_id = 0;
        self.pos_x.clear();
        self.pos_y.clear();
        self.pos_z.clear();
        self.disp_x.clear();
        self.disp_y.clear();
        self.disp_z.clear();
        self.states.clear();
        self.colors.clear();
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}
