#![cfg(not(target_arch = "wasm32"))]

use std::collections::BTreeSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use smallworld_graph_wasm::generators::Generator;
use smallworld_graph_wasm::graph::{GraphModel, NodeId};
use smallworld_graph_wasm::layout::{ForceSimulator, SimulationConfig};
use smallworld_graph_wasm::spatial::{Dimension, SpatialIndex};

fn check_topology(model: &GraphModel) {
    let mut pairs = BTreeSet::new();
    for edge in model.edges() {
        assert_ne!(edge.source, edge.target, "self-loop on {}", edge.source);
        let key = (edge.source.min(edge.target), edge.source.max(edge.target));
        assert!(pairs.insert(key), "duplicate edge {key:?}");
        assert!(model.does_edge_exist(edge.source, edge.target));
        assert!(model.does_edge_exist(edge.target, edge.source));
    }
    assert_eq!(pairs.len(), model.edge_count());

    let degree_sum: usize = model.degrees().iter().sum();
    assert_eq!(degree_sum, 2 * model.edge_count());
}

fn generated(name: &str, seed: u64, size: i32, degree: i32) -> GraphModel {
    let mut generator = Generator::from_name(name).unwrap();
    generator.set_target_size(size).unwrap();
    generator.set_attachment_degree(degree).unwrap();

    let mut model = GraphModel::new();
    let mut rng = StdRng::seed_from_u64(seed);
    generator.reset(&mut model, &mut rng);
    for _ in 0..5 {
        generator.add_vertex(&mut model, &mut rng);
    }
    model
}

proptest! {
    #[test]
    fn generators_keep_simple_undirected_topology(
        seed in any::<u64>(),
        size in 0i32..60,
        degree in 1i32..6,
        uniform in any::<bool>(),
    ) {
        let name = if uniform { "uniform-random" } else { "preferential-attachment" };
        let model = generated(name, seed, size, degree);
        check_topology(&model);
        prop_assert_eq!(model.node_count(), size as usize + 5);
    }

    #[test]
    fn manual_edges_never_duplicate(
        n in 1u32..20,
        attempts in prop::collection::vec((0u32..25, 0u32..25), 0..80),
    ) {
        let mut model = GraphModel::new();
        for _ in 0..n {
            model.new_node();
        }
        for (a, b) in attempts {
            let existed = model.does_edge_exist(NodeId(a), NodeId(b));
            let created = model.new_edge(NodeId(a), NodeId(b));
            if created {
                prop_assert!(!existed && a != b && a < n && b < n);
            }
        }
        check_topology(&model);
    }

    #[test]
    fn barnes_hut_conserves_mass(
        seed in any::<u64>(),
        size in 2i32..80,
        theta in 0.0f32..1.5,
        spatial in any::<bool>(),
    ) {
        let dimension = if spatial { Dimension::Three } else { Dimension::Two };
        let mut model = generated("preferential-attachment", seed, size, 2);
        let mut simulator = ForceSimulator::new(SimulationConfig::default(), dimension);
        let mut rng = StdRng::seed_from_u64(seed);
        // Scatter the nodes so the tree has depth
        for (i, id) in model.node_ids().collect::<Vec<_>>().into_iter().enumerate() {
            let f = i as f32;
            model.set_position(id, [f * 37.0 % 500.0, f * 91.0 % 300.0, f * 13.0 % 200.0]);
        }
        simulator.step(&mut model, &mut rng);

        let index = SpatialIndex::build(&model, dimension);
        let n = model.node_count() as f32;
        prop_assert_eq!(index.total_mass(), n);
        for id in model.node_ids() {
            let p = model.position(id).unwrap();
            let mut mass = 0.0f32;
            index.visit_bodies(id, p, theta, |body| mass += body.mass);
            prop_assert!((mass - (n - 1.0)).abs() < 1e-3, "mass={} n={}", mass, n);
        }
    }
}
