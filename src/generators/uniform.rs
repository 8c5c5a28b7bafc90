//! Uniform random attachment.
//!
//! Same growth contract as preferential attachment but every existing node is
//! equally likely to be picked. Used as a baseline: its degree distribution is
//! exponential rather than scale-free.

use rand::Rng;

use super::attachment::{DEFAULT_ATTACHMENT_DEGREE, DEFAULT_TARGET_SIZE, attach};
use super::{GeneratorResult, non_negative, positive};
use crate::graph::{GraphModel, NodeId};

/// Uniform random attachment generator.
#[derive(Debug, Clone)]
pub struct UniformRandom {
    target_size: usize,
    degree: usize,
    abandoned: u64,
}

impl UniformRandom {
    pub fn new(target_size: i32, degree: i32) -> GeneratorResult<Self> {
        Ok(Self {
            target_size: non_negative("target size", target_size)?,
            degree: positive("attachment degree", degree)?,
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

    pub fn can_add_vertex(&self) -> bool {
        true
    }

    pub fn clear_state(&mut self) {
        self.abandoned = 0;
    }

    pub fn reset<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) {
        model.clear();
        self.abandoned = 0;
        for _ in 0..self.target_size {
            self.grow(model, rng);
        }
        tracing::debug!(
            nodes = model.node_count(),
            edges = model.edge_count(),
            "uniform random grown"
        );
    }

    pub fn add_vertex<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> NodeId {
        let vertex = self.grow(model, rng);
        self.target_size += 1;
        vertex
    }

    fn grow<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> NodeId {
        let existing: Vec<NodeId> = model.node_ids().collect();
        let vertex = model.new_node();
        self.abandoned += attach(model, vertex, &existing, self.degree, rng, |rng| {
            existing[rng.gen_range(0..existing.len())]
        });
        vertex
    }
}

impl Default for UniformRandom {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            degree: DEFAULT_ATTACHMENT_DEGREE,
            abandoned: 0,
        }
    }
}
