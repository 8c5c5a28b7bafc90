//! Network statistics.
//!
//! [`StatisticsEngine`] borrows a [`GraphModel`] read-only and derives the
//! standard small-world and scale-free measures from its topology:
//! average degree, average shortest-path length, clustering and the
//! power-law exponent of the degree distribution.
//!
//! Degenerate inputs (no nodes, no edges, no reachable pairs) yield 0 or
//! None, never a panic or a NaN.

mod clustering;
mod paths;
mod power_law;

use serde::{Deserialize, Serialize};

use crate::graph::{GraphModel, NodeId};

use self::paths::Bfs;

pub use power_law::PowerLawMethod;

/// Which ordered node pairs the average path length is taken over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathLengthPolicy {
    /// Pairs connected by some path. None when no pair is reachable.
    #[default]
    ReachablePairs,
    /// All `n(n-1)` ordered pairs; unreachable pairs contribute 0.
    AllOrderedPairs,
}

/// Configuration for statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatisticsConfig {
    /// Denominator of the average path length (default: reachable pairs).
    pub path_length_policy: PathLengthPolicy,
    /// Power-law estimator (default: maximum likelihood).
    pub power_law_method: PowerLawMethod,
}

/// All headline metrics at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub average_degree: f64,
    pub average_path_length: Option<f64>,
    pub average_clustering: f64,
    pub power_law_exponent: Option<f64>,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Read-only statistics over one model.
pub struct StatisticsEngine<'a> {
    model: &'a GraphModel,
    config: StatisticsConfig,
    /// Neighbour lists indexed by tag
    adjacency: Vec<Vec<NodeId>>,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(model: &'a GraphModel, config: StatisticsConfig) -> Self {
        let adjacency = model.node_ids().map(|id| model.neighbors(id)).collect();
        Self {
            model,
            config,
            adjacency,
        }
    }

    /// `2|E| / |V|`, 0 for an empty model.
    pub fn average_degree(&self) -> f64 {
        let n = self.model.node_count();
        if n == 0 {
            return 0.0;
        }
        2.0 * self.model.edge_count() as f64 / n as f64
    }

    /// Mean hop distance over ordered pairs, per the configured policy.
    ///
    /// None with fewer than two nodes, or when the policy only counts
    /// reachable pairs and there are none.
    pub fn average_path_length(&self) -> Option<f64> {
        let n = self.adjacency.len();
        if n < 2 {
            return None;
        }

        let mut bfs = Bfs::new(&self.adjacency);
        let (mut total, mut reachable) = (0u64, 0u64);
        for id in self.model.node_ids() {
            let (sum, count) = bfs.distance_sum(id);
            total += sum;
            reachable += count;
        }

        let pairs = match self.config.path_length_policy {
            PathLengthPolicy::ReachablePairs => reachable,
            PathLengthPolicy::AllOrderedPairs => (n * (n - 1)) as u64,
        };
        (pairs > 0).then(|| total as f64 / pairs as f64)
    }

    /// Hop count between two nodes, None when unreachable or unknown.
    pub fn shortest_path(&self, source: NodeId, target: NodeId) -> Option<u32> {
        if !self.model.contains(source) || !self.model.contains(target) {
            return None;
        }
        Bfs::new(&self.adjacency).hops(source, target)
    }

    /// Local clustering coefficient of one node, 0 for unknown tags.
    pub fn clustering_coefficient(&self, node: NodeId) -> f64 {
        clustering::local_coefficient(&self.adjacency, node)
    }

    /// Mean local clustering over all nodes, 0 for an empty model.
    pub fn average_clustering(&self) -> f64 {
        let n = self.adjacency.len();
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self
            .model
            .node_ids()
            .map(|id| self.clustering_coefficient(id))
            .sum();
        sum / n as f64
    }

    /// Mean local clustering over the nodes of degree `degree`, 0 if none.
    pub fn clustering_for_degree(&self, degree: usize) -> f64 {
        let bucket = self.degree_bucket(degree);
        if bucket.is_empty() {
            return 0.0;
        }
        let sum: f64 = bucket.iter().map(|&id| self.clustering_coefficient(id)).sum();
        sum / bucket.len() as f64
    }

    /// All nodes with exactly `degree` incident edges, in tag order.
    pub fn degree_bucket(&self, degree: usize) -> Vec<NodeId> {
        self.model
            .node_ids()
            .filter(|id| self.adjacency[id.index()].len() == degree)
            .collect()
    }

    /// `histogram[d]` = number of nodes of degree `d`.
    pub fn degree_histogram(&self) -> Vec<usize> {
        let Some(max) = self.adjacency.iter().map(Vec::len).max() else {
            return Vec::new();
        };
        let mut histogram = vec![0usize; max + 1];
        for neighbors in &self.adjacency {
            histogram[neighbors.len()] += 1;
        }
        histogram
    }

    /// Fitted exponent of `P(k) ~ k^-gamma` over nodes with degree >= 1.
    pub fn power_law_exponent(&self) -> Option<f64> {
        let degrees: Vec<usize> = self.adjacency.iter().map(Vec::len).collect();
        power_law::fit(&degrees, self.config.power_law_method)
    }

    /// Compute every headline metric.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            average_degree: self.average_degree(),
            average_path_length: self.average_path_length(),
            average_clustering: self.average_clustering(),
            power_law_exponent: self.power_law_exponent(),
            node_count: self.model.node_count(),
            edge_count: self.model.edge_count(),
        }
    }
}
