//! Barabási–Albert preferential attachment.
//!
//! Each new vertex links to up to `m` existing nodes, choosing each target
//! with probability proportional to its current degree. Preferences are kept
//! as percentages with a cumulative array over node order; a uniform draw in
//! `[0, 100)` is located in that array with a power-of-two stepping search.
//!
//! # References
//!
//! - Barabási & Albert, "Emergence of scaling in random networks" (1999)

use rand::Rng;

use super::{GeneratorResult, non_negative, positive};
use crate::graph::{GraphModel, NodeId};

/// Node count grown by a reset with default parameters.
pub const DEFAULT_TARGET_SIZE: usize = 300;

/// Edges each new vertex tries to create by default.
pub const DEFAULT_ATTACHMENT_DEGREE: usize = 3;

/// Draws per attachment slot before the slot is abandoned.
pub const MAX_ATTEMPTS: usize = 100;

/// Rounding tolerance of the cumulative search.
pub const SEARCH_EPSILON: f64 = 1e-4;

/// Preferential-attachment generator.
#[derive(Debug, Clone)]
pub struct PreferentialAttachment {
    target_size: usize,
    degree: usize,
    /// Per-node preference in percent, indexed by tag
    preferences: Vec<f64>,
    abandoned: u64,
}

impl PreferentialAttachment {
    /// Create a generator. Fails on a negative size or non-positive degree.
    pub fn new(target_size: i32, degree: i32) -> GeneratorResult<Self> {
        Ok(Self {
            target_size: non_negative("target size", target_size)?,
            degree: positive("attachment degree", degree)?,
            preferences: Vec::new(),
            abandoned: 0,
        })
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn set_target_size(&mut self, size: i32) -> GeneratorResult<()> {
        self.target_size = non_negative("target size", size)?;
        Ok(())
    }

    pub fn attachment_degree(&self) -> usize {
        self.degree
    }

    pub fn set_attachment_degree(&mut self, degree: i32) -> GeneratorResult<()> {
        self.degree = positive("attachment degree", degree)?;
        Ok(())
    }

    pub fn abandoned_slots(&self) -> u64 {
        self.abandoned
    }

    /// Preference of a node in percent, as of the last growth step.
    pub fn preference(&self, tag: NodeId) -> Option<f64> {
        self.preferences.get(tag.index()).copied()
    }

    /// Growth is always possible.
    pub fn can_add_vertex(&self) -> bool {
        true
    }

    /// Forget per-node state after the model was cleared elsewhere.
    pub fn clear_state(&mut self) {
        self.preferences.clear();
        self.abandoned = 0;
    }

    /// Clear the model and grow `target_size` vertices from nothing.
    pub fn reset<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) {
        model.clear();
        self.preferences.clear();
        self.abandoned = 0;
        for _ in 0..self.target_size {
            self.grow(model, rng);
        }
        tracing::debug!(
            nodes = model.node_count(),
            edges = model.edge_count(),
            abandoned = self.abandoned,
            "preferential attachment grown"
        );
    }

    /// Add one vertex. The target size grows with it so a later reset keeps
    /// manually added vertices.
    pub fn add_vertex<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> NodeId {
        let vertex = self.grow(model, rng);
        self.target_size += 1;
        vertex
    }

    fn grow<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> NodeId {
        // The new vertex is not part of the candidate sequence.
        let existing: Vec<NodeId> = model.node_ids().collect();
        let degrees = model.degrees();
        let total: usize = degrees.iter().sum();
        let cumulative = cumulative_preferences(&preferences_of(&degrees, total));

        let vertex = model.new_node();
        self.abandoned += attach(model, vertex, &existing, self.degree, rng, |rng| {
            existing[search_cumulative(&cumulative, rng.gen_range(0.0..100.0))]
        });

        let degrees = model.degrees();
        self.preferences = preferences_of(&degrees, 2 * model.edge_count());
        vertex
    }
}

impl Default for PreferentialAttachment {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            degree: DEFAULT_ATTACHMENT_DEGREE,
            preferences: Vec::new(),
            abandoned: 0,
        }
    }
}

/// Per-node preference in percent given the degrees and their sum.
///
/// A lone node gets 100. With no edges at all the weights are uniform.
pub(crate) fn preferences_of(degrees: &[usize], total_degree: usize) -> Vec<f64> {
    let n = degrees.len();
    match (n, total_degree) {
        (0, _) => Vec::new(),
        (1, _) => vec![100.0],
        (_, 0) => vec![100.0 / n as f64; n],
        _ => degrees
            .iter()
            .map(|&d| d as f64 / total_degree as f64 * 100.0)
            .collect(),
    }
}

/// Running sum of preferences, last entry clamped to exactly 100.
pub(crate) fn cumulative_preferences(preferences: &[f64]) -> Vec<f64> {
    let mut sum = 0.0;
    let mut cumulative: Vec<f64> = preferences
        .iter()
        .map(|p| {
            sum += p;
            sum
        })
        .collect();
    if let Some(last) = cumulative.last_mut() {
        *last = 100.0;
    }
    cumulative
}

/// Index of the first cumulative entry >= `value - SEARCH_EPSILON`, clamped
/// to the last entry. `cumulative` must be non-empty and non-decreasing.
pub(crate) fn search_cumulative(cumulative: &[f64], value: f64) -> usize {
    let target = value - SEARCH_EPSILON;
    let n = cumulative.len();

    // `index` counts entries known to be below the target.
    let mut index = 0;
    let mut step = n.next_power_of_two();
    while step > 0 {
        if index + step <= n && cumulative[index + step - 1] < target {
            index += step;
        }
        step >>= 1;
    }
    index.min(n.saturating_sub(1))
}

/// Link `vertex` to up to `degree` of the `existing` nodes drawn by `pick`.
///
/// Each slot gets [`MAX_ATTEMPTS`] draws; a draw fails when it hits a node
/// already linked to `vertex`. Slots are capped at the number of existing
/// nodes so the loop ends once every one of them is linked. Returns the
/// number of abandoned slots.
pub(crate) fn attach<R, F>(
    model: &mut GraphModel,
    vertex: NodeId,
    existing: &[NodeId],
    degree: usize,
    rng: &mut R,
    mut pick: F,
) -> u64
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> NodeId,
{
    let slots = degree.min(existing.len());
    let mut abandoned = 0;

    for slot in 0..slots {
        let linked = (0..MAX_ATTEMPTS).any(|_| {
            let target = pick(&mut *rng);
            model.new_edge(vertex, target)
        });
        if !linked {
            tracing::debug!(%vertex, slot, "attachment slot abandoned after {MAX_ATTEMPTS} attempts");
            abandoned += 1;
        }
    }

    abandoned
}
