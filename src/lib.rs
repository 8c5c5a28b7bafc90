//! Smallworld Graph - WASM Module
//!
//! This module provides the network engine behind the Smallworld Graph
//! viewer: small-world and scale-free network generation, a Barnes-Hut
//! force-directed layout and network statistics. It is compiled to
//! WebAssembly and exposes a JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Undirected network using petgraph's StableGraph, SoA positions
//! - `generators`: Preferential attachment, uniform random and imported networks
//! - `spatial`: Barnes-Hut tree for the layout, R-tree for hit testing
//! - `layout`: Force-directed simulator stepped by the host's periodic tick
//! - `stats`: Degree, path length, clustering and power-law statistics
//! - `scene`: Owner of one network and everything that acts on it

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

pub mod generators;
pub mod graph;
pub mod layout;
pub mod logging;
pub mod scene;
pub mod spatial;
pub mod stats;

use graph::NodeId;
use layout::SimulationConfig;
use scene::{Scene, SceneConfig};
use spatial::Dimension;
use stats::StatisticsConfig;

pub use scene::TICK_INTERVAL_MS;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
}

/// Interval the host should drive `tick()` at, in milliseconds.
#[wasm_bindgen(js_name = tickIntervalMs)]
pub fn tick_interval_ms() -> u32 {
    TICK_INTERVAL_MS
}

fn js_error(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

/// Main entry point for the network engine.
///
/// This struct wraps the internal Scene and provides the public API
/// exposed to JavaScript.
#[wasm_bindgen]
pub struct SmallWorldWasm {
    scene: Scene,
}

#[wasm_bindgen]
impl SmallWorldWasm {
    /// Create an empty scene with default configuration.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            scene: Scene::default(),
        }
    }

    /// Create an empty scene with a fixed RNG seed.
    #[wasm_bindgen(js_name = withSeed)]
    pub fn with_seed(seed: u32) -> Self {
        Self {
            scene: Scene::new(SceneConfig {
                seed: u64::from(seed),
                ..SceneConfig::default()
            }),
        }
    }

    /// Create an empty scene from a `SceneConfig` object.
    ///
    /// Missing fields take their defaults.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<SmallWorldWasm, JsError> {
        let config: SceneConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
        Ok(Self {
            scene: Scene::new(config),
        })
    }

    // =========================================================================
    // Network Operations
    // =========================================================================

    /// Append a node at a random position. Returns its tag.
    #[wasm_bindgen(js_name = newNode)]
    pub fn new_node(&mut self) -> u32 {
        self.scene.new_node().0
    }

    /// Create an undirected edge.
    ///
    /// Returns false for self-loops, unknown tags and existing pairs.
    #[wasm_bindgen(js_name = newEdge)]
    pub fn new_edge(&mut self, a: u32, b: u32) -> bool {
        self.scene.new_edge(NodeId(a), NodeId(b))
    }

    #[wasm_bindgen(js_name = doesEdgeExist)]
    pub fn does_edge_exist(&self, a: u32, b: u32) -> bool {
        self.scene.does_edge_exist(NodeId(a), NodeId(b))
    }

    /// Remove all nodes and edges. Tags restart at 0.
    pub fn clear(&mut self) {
        self.scene.clear();
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> u32 {
        self.scene.model().node_count() as u32
    }

    #[wasm_bindgen(js_name = edgeCount)]
    pub fn edge_count(&self) -> u32 {
        self.scene.model().edge_count() as u32
    }

    pub fn degree(&self, node: u32) -> u32 {
        self.scene.model().degree(NodeId(node)) as u32
    }

    #[wasm_bindgen(js_name = getNeighbors)]
    pub fn get_neighbors(&self, node: u32) -> Vec<u32> {
        self.scene
            .model()
            .neighbors(NodeId(node))
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Get all edges as flat endpoint pairs [a0, b0, a1, b1, ...].
    #[wasm_bindgen(js_name = getEdgePairs)]
    pub fn get_edge_pairs(&self) -> Vec<u32> {
        self.scene.model().edge_pairs()
    }

    // =========================================================================
    // Generators
    // =========================================================================

    /// Names accepted by `chooseGenerator`.
    #[wasm_bindgen(js_name = generatorNames)]
    pub fn generator_names() -> Vec<String> {
        generators::Generator::NAMES.iter().map(|s| s.to_string()).collect()
    }

    #[wasm_bindgen(js_name = generatorName)]
    pub fn generator_name(&self) -> String {
        self.scene.generator().name().to_string()
    }

    /// Select the active generator. Takes effect on the next `reset()`.
    #[wasm_bindgen(js_name = chooseGenerator)]
    pub fn choose_generator(&mut self, name: &str) -> Result<(), JsError> {
        self.scene.choose_generator(name).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setTargetSize)]
    pub fn set_target_size(&mut self, size: i32) -> Result<(), JsError> {
        self.scene.generator_mut().set_target_size(size).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setAttachmentDegree)]
    pub fn set_attachment_degree(&mut self, degree: i32) -> Result<(), JsError> {
        self.scene
            .generator_mut()
            .set_attachment_degree(degree)
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = setImportRoot)]
    pub fn set_import_root(&mut self, root: &str) -> Result<(), JsError> {
        self.scene.generator_mut().set_import_root(root).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setImportLimit)]
    pub fn set_import_limit(&mut self, limit: i32) -> Result<(), JsError> {
        self.scene.generator_mut().set_import_limit(limit).map_err(js_error)
    }

    /// Deliver one `(id, [neighbourIds])` record to the imported generator.
    #[wasm_bindgen(js_name = feedNeighbors)]
    pub fn feed_neighbors(&mut self, id: &str, neighbors: Vec<String>) -> Result<(), JsError> {
        self.scene.feed_neighbors(id, neighbors).map_err(js_error)
    }

    /// Regenerate the network with the active generator.
    pub fn reset(&mut self) {
        self.scene.reset();
    }

    #[wasm_bindgen(js_name = canAddVertex)]
    pub fn can_add_vertex(&self) -> bool {
        self.scene.can_add_vertex()
    }

    /// One growth step. Returns whether the network changed.
    #[wasm_bindgen(js_name = addVertex)]
    pub fn add_vertex(&mut self) -> bool {
        self.scene.add_vertex()
    }

    /// Attachment preference of a node in percent (preferential attachment only).
    pub fn preference(&self, node: u32) -> Option<f64> {
        self.scene.generator().preference(NodeId(node))
    }

    #[wasm_bindgen(js_name = abandonedSlots)]
    pub fn abandoned_slots(&self) -> u32 {
        u32::try_from(self.scene.generator().abandoned_slots()).unwrap_or(u32::MAX)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Periodic tick. Returns true while the layout is still moving.
    pub fn tick(&mut self) -> bool {
        self.scene.tick()
    }

    /// Run one layout step regardless of the tick state.
    pub fn step(&mut self) -> bool {
        self.scene.step()
    }

    #[wasm_bindgen(js_name = isStepping)]
    pub fn is_stepping(&self) -> bool {
        self.scene.is_stepping()
    }

    #[wasm_bindgen(js_name = randomizePlacement)]
    pub fn randomize_placement(&mut self) {
        self.scene.randomize_placement();
    }

    #[wasm_bindgen(js_name = set3DMode)]
    pub fn set_3d_mode(&mut self, enabled: bool) {
        let dimension = if enabled {
            Dimension::Three
        } else {
            Dimension::Two
        };
        self.scene.set_dimension(dimension);
    }

    #[wasm_bindgen(js_name = is3DMode)]
    pub fn is_3d_mode(&self) -> bool {
        self.scene.config().dimension == Dimension::Three
    }

    /// Replace the simulation parameters from a `SimulationConfig` object.
    #[wasm_bindgen(js_name = setSimulationConfig)]
    pub fn set_simulation_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let config: SimulationConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
        self.scene.set_simulation_config(config);
        Ok(())
    }

    #[wasm_bindgen(js_name = getSimulationConfig)]
    pub fn get_simulation_config(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(self.scene.simulator().config()).map_err(js_error)
    }

    /// Set a node's position. Returns false for unknown tags.
    #[wasm_bindgen(js_name = setNodePosition)]
    pub fn set_node_position(&mut self, node: u32, x: f32, y: f32, z: f32) -> bool {
        self.scene.set_position(NodeId(node), [x, y, z])
    }

    /// Get a node's position as [x, y, z].
    #[wasm_bindgen(js_name = getNodePosition)]
    pub fn get_node_position(&self, node: u32) -> Option<Vec<f32>> {
        self.scene.model().position(NodeId(node)).map(|p| p.to_vec())
    }

    // =========================================================================
    // Dragging
    // =========================================================================

    /// Grab a node. It stays pinned until `endDrag()`.
    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&mut self, node: u32) -> bool {
        self.scene.begin_drag(NodeId(node))
    }

    #[wasm_bindgen(js_name = dragTo)]
    pub fn drag_to(&mut self, x: f32, y: f32) -> bool {
        self.scene.drag_to(x, y)
    }

    /// Release the held node. Returns its tag.
    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self) -> Option<u32> {
        self.scene.end_drag().map(u32::from)
    }

    // =========================================================================
    // Position Buffer Access (Zero-Copy)
    // =========================================================================

    /// Get a zero-copy view of X positions.
    ///
    /// # Safety
    ///
    /// The returned view is invalidated if any Rust allocation occurs.
    /// Use immediately for upload, do not store.
    #[wasm_bindgen(js_name = getPositionsXView)]
    pub fn get_positions_x_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.model().positions_x()) }
    }

    /// Get a zero-copy view of Y positions. Same caveats as X.
    #[wasm_bindgen(js_name = getPositionsYView)]
    pub fn get_positions_y_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.model().positions_y()) }
    }

    /// Get a zero-copy view of Z positions (all 0 in 2D). Same caveats as X.
    #[wasm_bindgen(js_name = getPositionsZView)]
    pub fn get_positions_z_view(&self) -> Float32Array {
        unsafe { Float32Array::view(self.scene.model().positions_z()) }
    }

    #[wasm_bindgen(js_name = positionsLen)]
    pub fn positions_len(&self) -> usize {
        self.scene.model().positions_x().len()
    }

    /// Get the bounding box as [min_x, min_y, min_z, max_x, max_y, max_z].
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f32>> {
        self.scene.model().bounds().map(|(min, max)| {
            let mut bounds = min.to_vec();
            bounds.extend_from_slice(&max);
            bounds
        })
    }

    // =========================================================================
    // Picking and Display Attributes
    // =========================================================================

    /// Find the nearest node to a point in the x/y plane.
    #[wasm_bindgen(js_name = findNearestNode)]
    pub fn find_nearest_node(&mut self, x: f32, y: f32) -> Option<u32> {
        self.scene.nearest_node(x, y, None).map(u32::from)
    }

    /// Find the nearest node within a maximum distance.
    #[wasm_bindgen(js_name = findNearestNodeWithin)]
    pub fn find_nearest_node_within(&mut self, x: f32, y: f32, max_distance: f32) -> Option<u32> {
        self.scene
            .nearest_node(x, y, Some(max_distance))
            .map(u32::from)
    }

    /// Find all nodes inside a rectangle (box selection).
    #[wasm_bindgen(js_name = findNodesInRect)]
    pub fn find_nodes_in_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<u32> {
        self.scene
            .nodes_in_rect(x0, y0, x1, y1)
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Find all nodes within a radius of a point.
    #[wasm_bindgen(js_name = findNodesInRadius)]
    pub fn find_nodes_in_radius(&mut self, x: f32, y: f32, radius: f32) -> Vec<u32> {
        self.scene
            .nodes_in_radius(x, y, radius)
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Set a node's colour as 0xRRGGBBAA.
    #[wasm_bindgen(js_name = setNodeColor)]
    pub fn set_node_color(&mut self, node: u32, rgba: u32) {
        self.scene.model_mut().set_node_color(NodeId(node), rgba);
    }

    #[wasm_bindgen(js_name = getNodeColor)]
    pub fn get_node_color(&self, node: u32) -> Option<u32> {
        self.scene.model().node_color(NodeId(node))
    }

    #[wasm_bindgen(js_name = setNodeHighlighted)]
    pub fn set_node_highlighted(&mut self, node: u32, highlighted: bool) {
        if let Some(state) = self.scene.model_mut().node_state_mut(NodeId(node)) {
            state.set_highlighted(highlighted);
        }
    }

    #[wasm_bindgen(js_name = isNodeHighlighted)]
    pub fn is_node_highlighted(&self, node: u32) -> bool {
        self.scene
            .model()
            .node_state(NodeId(node))
            .is_some_and(|s| s.is_highlighted())
    }

    #[wasm_bindgen(js_name = setNodeSelected)]
    pub fn set_node_selected(&mut self, node: u32, selected: bool) {
        if let Some(state) = self.scene.model_mut().node_state_mut(NodeId(node)) {
            state.set_selected(selected);
        }
    }

    #[wasm_bindgen(js_name = setNodeHovered)]
    pub fn set_node_hovered(&mut self, node: u32, hovered: bool) {
        if let Some(state) = self.scene.model_mut().node_state_mut(NodeId(node)) {
            state.set_hovered(hovered);
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Compute every headline metric as a `MetricsSnapshot` object.
    #[wasm_bindgen(js_name = getStatistics)]
    pub fn get_statistics(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(&self.scene.statistics()).map_err(js_error)
    }

    /// Replace the statistics options from a `StatisticsConfig` object.
    #[wasm_bindgen(js_name = setStatisticsConfig)]
    pub fn set_statistics_config(&mut self, config: JsValue) -> Result<(), JsError> {
        let config: StatisticsConfig = serde_wasm_bindgen::from_value(config).map_err(js_error)?;
        self.scene.set_statistics_config(config);
        Ok(())
    }

    #[wasm_bindgen(js_name = clusteringCoefficient)]
    pub fn clustering_coefficient(&self, node: u32) -> f64 {
        self.scene.stats().clustering_coefficient(NodeId(node))
    }

    #[wasm_bindgen(js_name = clusteringForDegree)]
    pub fn clustering_for_degree(&self, degree: u32) -> f64 {
        self.scene.stats().clustering_for_degree(degree as usize)
    }

    /// Tags of all nodes with exactly `degree` edges.
    #[wasm_bindgen(js_name = degreeBucket)]
    pub fn degree_bucket(&self, degree: u32) -> Vec<u32> {
        self.scene
            .stats()
            .degree_bucket(degree as usize)
            .into_iter()
            .map(u32::from)
            .collect()
    }

    /// Node count per degree, indexed by degree.
    #[wasm_bindgen(js_name = degreeHistogram)]
    pub fn degree_histogram(&self) -> Vec<u32> {
        self.scene
            .stats()
            .degree_histogram()
            .into_iter()
            .map(|count| count as u32)
            .collect()
    }

    /// Hop count between two nodes, undefined when unreachable.
    #[wasm_bindgen(js_name = shortestPath)]
    pub fn shortest_path(&self, source: u32, target: u32) -> Option<u32> {
        self.scene.stats().shortest_path(NodeId(source), NodeId(target))
    }
}

impl Default for SmallWorldWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Build a network through the facade the way the viewer does.
    fn facade(seed: u32) -> SmallWorldWasm {
        SmallWorldWasm::with_seed(seed)
    }

    #[test]
    fn test_triangle_statistics() {
        let mut net = facade(1);
        let a = net.new_node();
        let b = net.new_node();
        let c = net.new_node();
        assert!(net.new_edge(a, b));
        assert!(net.new_edge(b, c));
        assert!(net.new_edge(c, a));

        for node in [a, b, c] {
            assert_eq!(net.clustering_coefficient(node), 1.0);
        }
        assert_eq!(net.degree_histogram(), vec![0, 0, 3]);
        assert_eq!(net.shortest_path(a, c), Some(1));
    }

    #[test]
    fn test_path_centre_has_no_clustering() {
        let mut net = facade(1);
        let a = net.new_node();
        let b = net.new_node();
        let c = net.new_node();
        net.new_edge(a, b);
        net.new_edge(b, c);

        assert_eq!(net.clustering_coefficient(b), 0.0);
        assert_eq!(net.shortest_path(a, c), Some(2));
        assert_eq!(net.degree_bucket(1), vec![a, c]);
    }

    #[test]
    fn test_edge_rules() {
        let mut net = facade(1);
        let a = net.new_node();
        let b = net.new_node();

        assert!(!net.new_edge(a, a));
        assert!(net.new_edge(a, b));
        assert!(!net.new_edge(b, a));
        assert!(net.does_edge_exist(b, a));
        assert!(!net.new_edge(a, 99));
        assert_eq!(net.edge_count(), 1);
    }

    #[test]
    fn test_complete_graph_average_degree() {
        let mut net = facade(1);
        let n = 7;
        for _ in 0..n {
            net.new_node();
        }
        for a in 0..n {
            for b in (a + 1)..n {
                assert!(net.new_edge(a, b));
            }
        }

        let snapshot = net.scene.statistics();
        assert_eq!(snapshot.average_degree, (n - 1) as f64);
        assert_eq!(snapshot.average_path_length, Some(1.0));
        assert_eq!(snapshot.average_clustering, 1.0);
    }

    #[test]
    fn test_default_generator_pipeline() {
        let mut net = facade(2024);
        net.reset();
        assert_eq!(net.generator_name(), "preferential-attachment");
        assert_eq!(net.node_count(), 300);
        // 1 + 2 + 3 * 297
        assert_eq!(net.edge_count(), 894);
        assert_eq!(net.abandoned_slots(), 0);
        assert!(net.is_stepping());
        assert!(net.scene.statistics().power_law_exponent.is_some());

        net.set_target_size(30).unwrap_or_else(|_| panic!("valid size"));
        net.reset();
        let mut ticks = 0;
        while net.tick() {
            ticks += 1;
            assert!(ticks < 5000, "layout never settled");
        }
        println!("settled after {ticks} ticks");
        assert!(!net.is_stepping());

        // Steady state: a further step changes nothing
        let before = net.scene.model().positions_x().to_vec();
        assert!(!net.step());
        assert_eq!(net.scene.model().positions_x(), &before[..]);
    }

    #[test]
    fn test_two_node_seed_growth() {
        let mut net = facade(8);
        net.set_target_size(2).unwrap_or_else(|_| panic!("valid size"));
        net.set_attachment_degree(1).unwrap_or_else(|_| panic!("valid degree"));
        net.reset();
        assert_eq!((net.node_count(), net.edge_count()), (2, 1));

        assert!(net.add_vertex());
        assert_eq!((net.node_count(), net.edge_count()), (3, 2));
        for node in 0..3 {
            assert!(net.degree(node) > 0);
        }
        let preferences: f64 = (0..3).filter_map(|n| net.preference(n)).sum();
        assert!((preferences - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_round_trip() {
        let mut net = facade(3);
        net.set_target_size(5).unwrap_or_else(|_| panic!("valid size"));
        net.reset();

        let picked = net.find_nearest_node(0.0, 0.0).unwrap();
        assert!(net.begin_drag(picked));
        assert!(net.drag_to(-50.0, -50.0));
        assert_eq!(net.find_nearest_node_within(-49.0, -49.0, 5.0), Some(picked));
        net.tick();
        assert_eq!(net.get_node_position(picked), Some(vec![-50.0, -50.0, 0.0]));
        assert_eq!(net.find_nodes_in_radius(-50.0, -50.0, 1.0), vec![picked]);
        assert_eq!(net.find_nodes_in_rect(-60.0, -60.0, -40.0, -40.0), vec![picked]);
        assert_eq!(net.find_nodes_in_rect(-1000.0, -1000.0, 3000.0, 3000.0).len(), 5);
        assert_eq!(net.end_drag(), Some(picked));
        assert_eq!(net.end_drag(), None);
    }

    #[test]
    fn test_display_attributes_are_stored_verbatim() {
        let mut net = facade(3);
        let a = net.new_node();
        net.set_node_color(a, 0xff88_00ff);
        net.set_node_highlighted(a, true);

        assert_eq!(net.get_node_color(a), Some(0xff88_00ff));
        assert!(net.is_node_highlighted(a));
        assert_eq!(net.get_node_color(42), None);
        assert!(!net.is_node_highlighted(42));
    }

    #[test]
    fn test_three_dimensional_mode() {
        let mut net = facade(6);
        net.set_target_size(20).unwrap_or_else(|_| panic!("valid size"));
        net.reset();
        net.set_3d_mode(true);
        assert!(net.is_3d_mode());

        for _ in 0..50 {
            net.tick();
        }
        let bounds = net.get_bounds().unwrap();
        assert_eq!(bounds.len(), 6);
        assert!(bounds[5] > bounds[2]);

        net.set_3d_mode(false);
        let bounds = net.get_bounds().unwrap();
        assert_eq!((bounds[2], bounds[5]), (0.0, 0.0));
    }

    /// Clear then new_node restarts tag numbering. The viewer reloads
    /// networks this way; stale tags would make every edge insertion fail.
    #[test]
    fn test_clear_and_reload_preserves_edges() {
        let mut net = facade(1);
        for _ in 0..100 {
            net.new_node();
        }
        for i in 1..100u32 {
            assert!(net.new_edge((i - 1) / 3, i));
        }
        assert_eq!(net.edge_count(), 99);

        net.clear();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert_eq!(net.new_node(), 0);

        for _ in 1..500 {
            net.new_node();
        }
        let added = (1..500u32).filter(|&i| net.new_edge((i - 1) / 4, i)).count();
        println!("reload: {} nodes, {} edges added", net.node_count(), added);
        assert_eq!(added, 499, "all edges should be added after clear()");
        assert_eq!(net.get_edge_pairs().len(), 998);
    }
}
