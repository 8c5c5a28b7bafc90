//! Barnes-Hut force-directed layout.
//!
//! Every node repels every other node with a force that decays with distance,
//! and every edge acts as a Hooke spring toward its rest length. Repulsion is
//! approximated through a [`SpatialIndex`] rebuilt at the start of each step.
//!
//! # Step
//!
//! 1. Build the tree over current positions.
//! 2. For each node, walk the tree and sum repulsion from the reported bodies.
//! 3. Add spring forces over every edge.
//! 4. Integrate: displacement = force * gain, clamped to `max_displacement`.
//!    Displacements no longer than `epsilon` are dropped, pinned nodes are skipped.
//! 5. Commit every displacement at once, after all of them are computed.
//!
//! A step that commits nothing leaves positions untouched, so once the layout
//! settles, further steps are no-ops.

use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::graph::GraphModel;
use crate::spatial::{Dimension, SpatialIndex};

/// How repulsion decays with distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Falloff {
    /// `repulsion * mass / d^2`
    #[default]
    InverseSquare,
    /// `repulsion * mass / d`
    InverseLinear,
}

/// Configuration for the force simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Repulsion strength between any two nodes (default: 400.0).
    pub repulsion: f32,
    /// Distance decay of the repulsion (default: inverse square).
    pub falloff: Falloff,
    /// Hooke constant of edge springs (default: 0.05).
    pub spring_stiffness: f32,
    /// Force-to-displacement factor (default: 0.5).
    pub gain: f32,
    /// Upper bound on one node's displacement per step (default: 20.0).
    pub max_displacement: f32,
    /// Displacements no longer than this are dropped (default: 0.1).
    pub epsilon: f32,
    /// Barnes-Hut opening threshold (default: 0.7).
    /// 0 disables approximation; larger values approximate more aggressively.
    pub theta: f32,
    /// Distances are clamped to at least this value (default: 1.0).
    pub min_distance: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            repulsion: 400.0,
            falloff: Falloff::InverseSquare,
            spring_stiffness: 0.05,
            gain: 0.5,
            max_displacement: 20.0,
            epsilon: 0.1,
            theta: 0.7,
            min_distance: 1.0,
        }
    }
}

/// Whether the periodic tick should run a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SimulationState {
    /// Settled; ticks do nothing until re-armed.
    Idle,
    /// Ticks run steps until one of them moves nothing.
    Stepping,
}

/// Force-directed layout driver.
#[derive(Debug, Clone)]
pub struct ForceSimulator {
    config: SimulationConfig,
    dimension: Dimension,
    state: SimulationState,

    // Per-step force scratch, indexed by tag
    force_x: Vec<f32>,
    force_y: Vec<f32>,
    force_z: Vec<f32>,
}

impl ForceSimulator {
    /// Create an idle simulator.
    pub fn new(config: SimulationConfig, dimension: Dimension) -> Self {
        Self {
            config,
            dimension,
            state: SimulationState::Idle,
            force_x: Vec::new(),
            force_y: Vec::new(),
            force_z: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Replace the configuration and re-arm.
    pub fn set_config(&mut self, config: SimulationConfig) {
        self.config = config;
        self.arm();
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Switch between planar and spatial layout and re-arm.
    pub fn set_dimension(&mut self, dimension: Dimension) {
        self.dimension = dimension;
        self.arm();
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Whether ticks currently run steps.
    pub fn is_stepping(&self) -> bool {
        self.state == SimulationState::Stepping
    }

    /// Resume ticking after a structural or positional change.
    pub fn arm(&mut self) {
        if self.state == SimulationState::Idle {
            tracing::trace!("layout armed");
        }
        self.state = SimulationState::Stepping;
    }

    /// Drive one periodic tick.
    ///
    /// Runs a step while armed and goes idle once a step moves nothing.
    /// Returns whether anything moved.
    pub fn tick<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> bool {
        if self.state == SimulationState::Idle {
            return false;
        }
        let moved = self.step(model, rng);
        if !moved {
            tracing::debug!(nodes = model.node_count(), "layout settled");
            self.state = SimulationState::Idle;
        }
        moved
    }

    /// Run one simulation step regardless of state.
    ///
    /// Returns true if any displacement was committed.
    pub fn step<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> bool {
        let n = model.node_count();
        if n == 0 {
            return false;
        }

        self.force_x.clear();
        self.force_x.resize(n, 0.0);
        self.force_y.clear();
        self.force_y.resize(n, 0.0);
        self.force_z.clear();
        self.force_z.resize(n, 0.0);

        self.apply_repulsion(model, rng);
        self.apply_springs(model);
        self.integrate(model)
    }

    // =========================================================================
    // Forces
    // =========================================================================

    fn apply_repulsion<R: Rng + ?Sized>(&mut self, model: &GraphModel, rng: &mut R) {
        let tree = SpatialIndex::build(model, self.dimension);
        let planar = self.dimension == Dimension::Two;
        let config = self.config;

        let xs = model.positions_x();
        let ys = model.positions_y();
        let zs = model.positions_z();

        for id in model.node_ids() {
            let i = id.index();
            let p = [xs[i], ys[i], if planar { 0.0 } else { zs[i] }];
            let mut force = [0.0f32; 3];

            tree.visit_bodies(id, p, config.theta, |body| {
                let delta = [
                    p[0] - body.position[0],
                    p[1] - body.position[1],
                    p[2] - body.position[2],
                ];
                let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
                let direction = if length > f32::EPSILON {
                    [delta[0] / length, delta[1] / length, delta[2] / length]
                } else {
                    random_direction(&mut *rng, planar)
                };

                let d = length.max(config.min_distance);
                let magnitude = match config.falloff {
                    Falloff::InverseSquare => config.repulsion * body.mass / (d * d),
                    Falloff::InverseLinear => config.repulsion * body.mass / d,
                };
                for axis in 0..3 {
                    force[axis] += direction[axis] * magnitude;
                }
            });

            self.force_x[i] += force[0];
            self.force_y[i] += force[1];
            self.force_z[i] += force[2];
        }
    }

    fn apply_springs(&mut self, model: &GraphModel) {
        let planar = self.dimension == Dimension::Two;
        let stiffness = self.config.spring_stiffness;

        for edge in model.edges() {
            let (Some(a), Some(b)) = (model.position(edge.source), model.position(edge.target))
            else {
                continue;
            };
            let delta = [b[0] - a[0], b[1] - a[1], if planar { 0.0 } else { b[2] - a[2] }];
            let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
            if length <= f32::EPSILON {
                // Coincident endpoints have no spring axis; repulsion separates them.
                continue;
            }

            let magnitude = stiffness * (length - edge.rest_length) / length;
            let (s, t) = (edge.source.index(), edge.target.index());
            self.force_x[s] += delta[0] * magnitude;
            self.force_y[s] += delta[1] * magnitude;
            self.force_z[s] += delta[2] * magnitude;
            self.force_x[t] -= delta[0] * magnitude;
            self.force_y[t] -= delta[1] * magnitude;
            self.force_z[t] -= delta[2] * magnitude;
        }
    }

    // =========================================================================
    // Integration
    // =========================================================================

    fn integrate(&self, model: &mut GraphModel) -> bool {
        let SimulationConfig {
            gain,
            max_displacement,
            epsilon,
            ..
        } = self.config;
        let planar = self.dimension == Dimension::Two;
        let mut moved = false;

        for id in model.node_ids() {
            if model.is_node_pinned(id) {
                continue;
            }
            let i = id.index();
            let mut delta = [
                self.force_x[i] * gain,
                self.force_y[i] * gain,
                if planar { 0.0 } else { self.force_z[i] * gain },
            ];
            let length = (delta[0] * delta[0] + delta[1] * delta[1] + delta[2] * delta[2]).sqrt();
            if !length.is_finite() || length <= epsilon {
                continue;
            }
            if length > max_displacement {
                let scale = max_displacement / length;
                for d in &mut delta {
                    *d *= scale;
                }
            }

            model.accumulate_displacement(id, delta);
            moved = true;
        }

        model.commit_displacements();
        moved
    }
}

impl Default for ForceSimulator {
    fn default() -> Self {
        Self::new(SimulationConfig::default(), Dimension::default())
    }
}

/// Unit vector in a random direction, in the x/y plane when `planar`.
fn random_direction<R: Rng + ?Sized>(rng: &mut R, planar: bool) -> [f32; 3] {
    let angle = rng.gen_range(0.0..TAU);
    if planar {
        [angle.cos(), angle.sin(), 0.0]
    } else {
        let z: f32 = rng.gen_range(-1.0..=1.0);
        let r = (1.0 - z * z).max(0.0).sqrt();
        [r * angle.cos(), r * angle.sin(), z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn settle(sim: &mut ForceSimulator, model: &mut GraphModel, rng: &mut StdRng) -> usize {
        sim.arm();
        for steps in 0..5000 {
            if !sim.tick(model, rng) {
                return steps;
            }
        }
        panic!("layout did not settle");
    }

    fn distance(model: &GraphModel, a: NodeId, b: NodeId) -> f32 {
        crate::spatial::distance(model.position(a).unwrap(), model.position(b).unwrap())
    }

    #[test]
    fn test_empty_graph_does_not_step() {
        let mut model = GraphModel::new();
        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!sim.step(&mut model, &mut rng));
        sim.arm();
        assert!(!sim.tick(&mut model, &mut rng));
        assert_eq!(sim.state(), SimulationState::Idle);
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut model = GraphModel::new();
        model.new_node_at([0.0, 0.0, 0.0]);
        model.new_node_at([2.0, 0.0, 0.0]);
        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!sim.is_stepping());
        assert!(!sim.tick(&mut model, &mut rng));
        assert_eq!(model.position(NodeId(1)), Some([2.0, 0.0, 0.0]));
    }

    #[test]
    fn test_unconnected_nodes_repel() {
        let mut model = GraphModel::new();
        let a = model.new_node_at([0.0, 0.0, 0.0]);
        let b = model.new_node_at([5.0, 0.0, 0.0]);
        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(7);

        assert!(sim.step(&mut model, &mut rng));
        assert!(distance(&model, a, b) > 5.0);
        // Symmetric push along x only
        assert_eq!(model.position(a).unwrap()[1], 0.0);
    }

    #[test]
    fn test_spring_pulls_toward_rest_length() {
        let mut model = GraphModel::new();
        let a = model.new_node_at([0.0, 0.0, 0.0]);
        let b = model.new_node_at([300.0, 0.0, 0.0]);
        model.new_edge(a, b);
        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(7);

        settle(&mut sim, &mut model, &mut rng);
        let d = distance(&model, a, b);
        assert!(d < 300.0);
        assert!(d > 40.0 && d < 80.0, "settled at {d}");
    }

    #[test]
    fn test_steady_state_is_idempotent() {
        let mut model = GraphModel::new();
        let positions = [[0.0, 0.0], [120.0, 10.0], [40.0, 90.0], [-60.0, 30.0]];
        for [x, y] in positions {
            model.new_node_at([x, y, 0.0]);
        }
        model.new_edge(NodeId(0), NodeId(1));
        model.new_edge(NodeId(1), NodeId(2));
        model.new_edge(NodeId(2), NodeId(0));
        model.new_edge(NodeId(3), NodeId(0));

        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(3);
        settle(&mut sim, &mut model, &mut rng);

        let before: Vec<_> = model.node_ids().map(|id| model.position(id)).collect();
        assert!(!sim.step(&mut model, &mut rng));
        let after: Vec<_> = model.node_ids().map(|id| model.position(id)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_pinned_node_stays_put() {
        let mut model = GraphModel::new();
        let a = model.new_node_at([0.0, 0.0, 0.0]);
        let b = model.new_node_at([200.0, 0.0, 0.0]);
        model.new_edge(a, b);
        model.pin_node(a);

        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(3);
        settle(&mut sim, &mut model, &mut rng);

        assert_eq!(model.position(a), Some([0.0, 0.0, 0.0]));
        assert!(model.position(b).unwrap()[0] < 200.0);
    }

    #[test]
    fn test_displacement_is_clamped() {
        let mut model = GraphModel::new();
        let a = model.new_node_at([0.0, 0.0, 0.0]);
        model.new_node_at([0.5, 0.0, 0.0]);
        let config = SimulationConfig {
            repulsion: 1.0e6,
            ..SimulationConfig::default()
        };
        let mut sim = ForceSimulator::new(config, Dimension::Two);
        let mut rng = StdRng::seed_from_u64(3);

        sim.step(&mut model, &mut rng);
        let moved = crate::spatial::distance(model.position(a).unwrap(), [0.0; 3]);
        assert!((moved - config.max_displacement).abs() < 1e-3);
    }

    #[test]
    fn test_coincident_nodes_separate() {
        let mut model = GraphModel::new();
        let a = model.new_node_at([10.0, 10.0, 0.0]);
        let b = model.new_node_at([10.0, 10.0, 0.0]);
        let mut sim = ForceSimulator::default();
        let mut rng = StdRng::seed_from_u64(11);

        assert!(sim.step(&mut model, &mut rng));
        assert!(distance(&model, a, b) > 0.0);
    }

    #[test]
    fn test_planar_mode_keeps_z() {
        let mut model = GraphModel::new();
        model.new_node_at([0.0, 0.0, 0.0]);
        model.new_node_at([3.0, 4.0, 0.0]);
        model.new_node_at([3.0, 4.0, 0.0]);
        let mut sim = ForceSimulator::new(SimulationConfig::default(), Dimension::Two);
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..20 {
            sim.step(&mut model, &mut rng);
        }
        assert!(model.positions_z().iter().all(|&z| z == 0.0));
    }

    #[test]
    fn test_spatial_mode_spreads_depth() {
        let mut model = GraphModel::new();
        model.new_node_at([0.0, 0.0, 0.0]);
        model.new_node_at([0.0, 0.0, 2.0]);
        let mut sim = ForceSimulator::new(SimulationConfig::default(), Dimension::Three);
        let mut rng = StdRng::seed_from_u64(5);

        assert!(sim.step(&mut model, &mut rng));
        let z = model.positions_z();
        assert!(z[1] - z[0] > 2.0);
    }

    #[test]
    fn test_displacement_at_epsilon_is_dropped() {
        let mut model = GraphModel::new();
        model.set_default_rest_length(48.0);
        let a = model.new_node_at([0.0, 0.0, 0.0]);
        let b = model.new_node_at([64.0, 0.0, 0.0]);
        model.new_edge(a, b);
        // Spring force 0.125 * 16 = 2.0, times gain 0.25 is exactly 0.5
        let config = SimulationConfig {
            repulsion: 0.0,
            spring_stiffness: 0.125,
            gain: 0.25,
            epsilon: 0.5,
            ..SimulationConfig::default()
        };
        let mut sim = ForceSimulator::new(config, Dimension::Two);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!sim.step(&mut model, &mut rng));
        assert_eq!(model.position(a), Some([0.0, 0.0, 0.0]));
        assert_eq!(model.position(b), Some([64.0, 0.0, 0.0]));

        // Just above the threshold the same pull is committed
        sim.set_config(SimulationConfig {
            epsilon: 0.49,
            ..config
        });
        assert!(sim.step(&mut model, &mut rng));
        assert!(distance(&model, a, b) < 64.0);
    }

    #[test]
    fn test_inverse_linear_falloff_reaches_further() {
        let separation = |falloff| {
            let mut model = GraphModel::new();
            let a = model.new_node_at([0.0, 0.0, 0.0]);
            let b = model.new_node_at([40.0, 0.0, 0.0]);
            let config = SimulationConfig {
                falloff,
                ..SimulationConfig::default()
            };
            let mut sim = ForceSimulator::new(config, Dimension::Two);
            let mut rng = StdRng::seed_from_u64(2);
            sim.step(&mut model, &mut rng);
            distance(&model, a, b)
        };

        // 400 / 40^2 and 400 / 40, halved by the gain, on each node
        let square = separation(Falloff::InverseSquare);
        let linear = separation(Falloff::InverseLinear);
        assert!((square - 40.25).abs() < 1e-3, "square={square}");
        assert!((linear - 50.0).abs() < 1e-3, "linear={linear}");
    }

    #[test]
    fn test_inverse_linear_layout_settles() {
        let mut model = GraphModel::new();
        let mut rng = StdRng::seed_from_u64(21);
        let mut generator = crate::generators::PreferentialAttachment::new(40, 2).unwrap();
        generator.reset(&mut model, &mut rng);
        for id in model.node_ids() {
            let position = [rng.gen_range(0.0..600.0), rng.gen_range(0.0..400.0), 0.0];
            model.set_position(id, position);
        }

        let config = SimulationConfig {
            falloff: Falloff::InverseLinear,
            ..SimulationConfig::default()
        };
        let mut sim = ForceSimulator::new(config, Dimension::Two);
        let steps = settle(&mut sim, &mut model, &mut rng);
        println!("inverse-linear layout settled after {steps} steps");

        let before = model.positions_x().to_vec();
        assert!(!sim.step(&mut model, &mut rng));
        assert_eq!(model.positions_x(), &before[..]);
        for edge in model.edges() {
            assert!(distance(&model, edge.source, edge.target) > 0.0);
        }
    }

    #[test]
    fn test_config_deserializes_partial_camel_case() {
        let json = r#"{"springStiffness": 0.2, "falloff": "InverseLinear"}"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.spring_stiffness, 0.2);
        assert_eq!(config.falloff, Falloff::InverseLinear);
        assert_eq!(config.repulsion, 400.0);
    }
}
