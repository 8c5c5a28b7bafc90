//! Scene - owns one network and everything that acts on it.
//!
//! The scene ties together the model, the active generator, the force
//! simulator, the injected RNG and the hit index. It is the single owner of
//! the [`GraphModel`]: generators and the simulator borrow it mutably only for
//! the duration of one call, statistics borrow it read-only between steps.
//!
//! Every structural or positional change (growth, reset, manual moves, drags)
//! re-arms the simulator so the periodic tick resumes stepping.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::generators::{Generator, GeneratorError, GeneratorResult};
use crate::graph::{GraphModel, NodeId};
use crate::layout::{ForceSimulator, SimulationConfig};
use crate::spatial::{Dimension, HitIndex};
use crate::stats::{MetricsSnapshot, StatisticsConfig, StatisticsEngine};

/// Interval of the host's periodic tick, in milliseconds.
pub const TICK_INTERVAL_MS: u32 = 40;

/// Configuration for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    /// RNG seed (default: 0).
    pub seed: u64,
    /// Layout dimensionality (default: 2D).
    pub dimension: Dimension,
    /// Width of the random placement area (default: 1000.0).
    pub width: f32,
    /// Height of the random placement area (default: 600.0).
    pub height: f32,
    /// Depth of the random placement area in 3D (default: 600.0).
    pub depth: f32,
    /// Offset of the placement area from the origin (default: 10.0).
    pub margin: f32,
    pub simulation: SimulationConfig,
    pub statistics: StatisticsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            dimension: Dimension::Two,
            width: 1000.0,
            height: 600.0,
            depth: 600.0,
            margin: 10.0,
            simulation: SimulationConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

/// One network with its generator, layout and statistics.
pub struct Scene {
    config: SceneConfig,
    model: GraphModel,
    generator: Generator,
    simulator: ForceSimulator,
    rng: StdRng,

    /// Picking index and whether positions moved since it was built
    hits: HitIndex,
    hits_dirty: bool,

    /// Node currently held by a drag
    dragging: Option<NodeId>,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            model: GraphModel::new(),
            generator: Generator::default(),
            simulator: ForceSimulator::new(config.simulation, config.dimension),
            rng: StdRng::seed_from_u64(config.seed),
            hits: HitIndex::new(),
            hits_dirty: true,
            dragging: None,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Mutable model access for display attributes (colour, highlight).
    pub fn model_mut(&mut self) -> &mut GraphModel {
        &mut self.model
    }

    pub fn generator(&self) -> &Generator {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut Generator {
        &mut self.generator
    }

    pub fn simulator(&self) -> &ForceSimulator {
        &self.simulator
    }

    /// Reseed the RNG; later draws repeat for the same seed.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn touched(&mut self) {
        self.hits_dirty = true;
        self.simulator.arm();
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Append a node at a random position.
    pub fn new_node(&mut self) -> NodeId {
        let position = self.random_position();
        let id = self.model.new_node_at(position);
        self.touched();
        id
    }

    /// Create an edge. Returns false for self-loops, unknown endpoints and
    /// duplicates.
    pub fn new_edge(&mut self, a: NodeId, b: NodeId) -> bool {
        let created = self.model.new_edge(a, b);
        if created {
            self.simulator.arm();
        }
        created
    }

    pub fn does_edge_exist(&self, a: NodeId, b: NodeId) -> bool {
        self.model.does_edge_exist(a, b)
    }

    /// Remove every node and edge. Tags restart at zero.
    pub fn clear(&mut self) {
        self.model.clear();
        self.generator.clear_state();
        self.hits.clear();
        self.hits_dirty = false;
        self.dragging = None;
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Switch the active generator. The live network is kept until the next
    /// reset.
    pub fn choose_generator(&mut self, name: &str) -> GeneratorResult<()> {
        self.generator = Generator::from_name(name)?;
        tracing::info!(generator = name, "generator selected");
        Ok(())
    }

    /// Regenerate the network from scratch with the active generator.
    pub fn reset(&mut self) {
        self.dragging = None;
        self.generator.reset(&mut self.model, &mut self.rng);
        self.place_from(0);
        self.touched();
        tracing::info!(
            generator = self.generator.name(),
            nodes = self.model.node_count(),
            edges = self.model.edge_count(),
            "network reset"
        );
    }

    pub fn can_add_vertex(&self) -> bool {
        self.generator.can_add_vertex()
    }

    /// Run one growth step of the active generator. New nodes are placed at
    /// random. Returns whether the network changed.
    pub fn add_vertex(&mut self) -> bool {
        let before = self.model.node_count();
        let changed = self.generator.add_vertex(&mut self.model, &mut self.rng);
        if changed {
            self.place_from(before);
            self.touched();
        }
        changed
    }

    /// Hand a neighbour record to the imported generator.
    pub fn feed_neighbors(&mut self, id: &str, neighbors: Vec<String>) -> GeneratorResult<()> {
        let generator = self.generator.name();
        let imported = self.generator.as_imported_mut().ok_or(GeneratorError::Unsupported {
            operation: "feedNeighbors",
            generator,
        })?;
        imported.source_mut().push(id, neighbors);
        Ok(())
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Periodic tick. Steps the layout while armed; returns whether anything
    /// moved.
    pub fn tick(&mut self) -> bool {
        let moved = self.simulator.tick(&mut self.model, &mut self.rng);
        if moved {
            self.hits_dirty = true;
        }
        moved
    }

    /// Run one layout step regardless of the tick state.
    pub fn step(&mut self) -> bool {
        let moved = self.simulator.step(&mut self.model, &mut self.rng);
        if moved {
            self.hits_dirty = true;
        }
        moved
    }

    pub fn is_stepping(&self) -> bool {
        self.simulator.is_stepping()
    }

    pub fn set_simulation_config(&mut self, config: SimulationConfig) {
        self.config.simulation = config;
        self.simulator.set_config(config);
    }

    /// Switch between planar and spatial layout.
    ///
    /// Going planar flattens z to 0; going spatial scatters z across the
    /// placement depth so the layout can unfold.
    pub fn set_dimension(&mut self, dimension: Dimension) {
        if dimension == self.config.dimension {
            return;
        }
        self.config.dimension = dimension;
        self.simulator.set_dimension(dimension);

        for id in self.model.node_ids() {
            let Some([x, y, _]) = self.model.position(id) else {
                continue;
            };
            let z = match dimension {
                Dimension::Two => 0.0,
                Dimension::Three => self.random_depth(),
            };
            self.model.set_position(id, [x, y, z]);
        }
        self.touched();
    }

    /// Scatter every node across the placement area.
    pub fn randomize_placement(&mut self) {
        self.place_from(0);
        self.touched();
    }

    /// Move one node. Returns false for unknown tags.
    pub fn set_position(&mut self, id: NodeId, position: [f32; 3]) -> bool {
        let moved = self.model.set_position(id, position);
        if moved {
            self.touched();
        }
        moved
    }

    fn random_depth(&mut self) -> f32 {
        let half = self.config.depth * 0.5;
        if half > 0.0 {
            self.rng.gen_range(-half..half)
        } else {
            0.0
        }
    }

    fn random_position(&mut self) -> [f32; 3] {
        let SceneConfig {
            width,
            height,
            margin,
            dimension,
            ..
        } = self.config;
        let x = margin + self.rng.gen_range(0.0..width.max(1.0));
        let y = margin + self.rng.gen_range(0.0..height.max(1.0));
        let z = match dimension {
            Dimension::Two => 0.0,
            Dimension::Three => self.random_depth(),
        };
        [x, y, z]
    }

    fn place_from(&mut self, first: usize) {
        for id in self.model.node_ids().skip(first) {
            let position = self.random_position();
            self.model.set_position(id, position);
        }
    }

    // =========================================================================
    // Dragging
    // =========================================================================

    /// Grab a node: it is pinned until [`Scene::end_drag`].
    pub fn begin_drag(&mut self, id: NodeId) -> bool {
        if !self.model.contains(id) {
            return false;
        }
        if let Some(previous) = self.dragging.replace(id) {
            self.model.unpin_node(previous);
        }
        self.model.pin_node(id);
        self.simulator.arm();
        true
    }

    /// Move the held node in the x/y plane.
    pub fn drag_to(&mut self, x: f32, y: f32) -> bool {
        let Some(id) = self.dragging else {
            return false;
        };
        let z = self.model.position(id).map_or(0.0, |p| p[2]);
        self.set_position(id, [x, y, z])
    }

    /// Release the held node and let the layout take it back.
    pub fn end_drag(&mut self) -> Option<NodeId> {
        let id = self.dragging.take()?;
        self.model.unpin_node(id);
        self.simulator.arm();
        Some(id)
    }

    pub fn dragging(&self) -> Option<NodeId> {
        self.dragging
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn refresh_hits(&mut self) -> &HitIndex {
        if self.hits_dirty {
            self.hits.rebuild_from(&self.model);
            self.hits_dirty = false;
        }
        &self.hits
    }

    /// Node closest to a point in the x/y plane, optionally within a radius.
    pub fn nearest_node(&mut self, x: f32, y: f32, max_distance: Option<f32>) -> Option<NodeId> {
        let hits = self.refresh_hits();
        match max_distance {
            Some(limit) => hits.nearest_within(x, y, limit),
            None => hits.nearest(x, y),
        }
    }

    /// Nodes inside an x/y rectangle, in tag order. Corners may be given in
    /// any order.
    pub fn nodes_in_rect(&mut self, x0: f32, y0: f32, x1: f32, y1: f32) -> Vec<NodeId> {
        let mut found = self
            .refresh_hits()
            .in_rect(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1));
        found.sort_unstable();
        found
    }

    /// Nodes within `radius` of a point in the x/y plane, in tag order.
    pub fn nodes_in_radius(&mut self, x: f32, y: f32, radius: f32) -> Vec<NodeId> {
        let mut found = self.refresh_hits().in_radius(x, y, radius);
        found.sort_unstable();
        found
    }

    pub fn set_statistics_config(&mut self, config: StatisticsConfig) {
        self.config.statistics = config;
    }

    /// Statistics over the current network.
    pub fn stats(&self) -> StatisticsEngine<'_> {
        StatisticsEngine::new(&self.model, self.config.statistics)
    }

    pub fn statistics(&self) -> MetricsSnapshot {
        self.stats().snapshot()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
