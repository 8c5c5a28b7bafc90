//! Networks imported from an external neighbour feed.
//!
//! External identifiers (for example account names of a social service) are
//! mapped to dense node tags. Expansion is breadth-first: a FIFO frontier holds
//! identifiers whose neighbour list has not been fetched yet, and each growth
//! step expands the oldest one.
//!
//! Records arrive asynchronously through a [`NeighborSource`]. When the record
//! for the identifier at the head of the frontier is not available yet, the
//! step is a no-op and the identifier stays at the head.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;

use super::{GeneratorError, GeneratorResult, positive};
use crate::graph::{GraphModel, NodeId};

/// Node count at which a reset stops expanding.
pub const DEFAULT_IMPORT_LIMIT: usize = 300;

/// Errors reported by a neighbour source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The record for this identifier has not arrived yet
    #[error("no neighbour record for {0} yet")]
    Unavailable(String),
}

/// Supplies the neighbour list of an external identifier.
pub trait NeighborSource {
    /// Neighbour identifiers of `id`, in feed order.
    fn neighbors(&mut self, id: &str) -> Result<Vec<String>, ImportError>;
}

/// Neighbour records pushed by the host as they arrive.
#[derive(Debug, Clone, Default)]
pub struct RecordFeed {
    records: HashMap<String, Vec<String>>,
}

impl RecordFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the neighbour list of `id`, replacing any earlier record.
    pub fn push(&mut self, id: impl Into<String>, neighbors: Vec<String>) {
        self.records.insert(id.into(), neighbors);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl NeighborSource for RecordFeed {
    fn neighbors(&mut self, id: &str) -> Result<Vec<String>, ImportError> {
        self.records
            .get(id)
            .cloned()
            .ok_or_else(|| ImportError::Unavailable(id.to_string()))
    }
}

/// Breadth-first importer over a neighbour source.
#[derive(Debug, Clone)]
pub struct Imported<S = RecordFeed> {
    root: String,
    limit: usize,
    source: S,
    tags: HashMap<String, NodeId>,
    frontier: VecDeque<String>,
}

impl<S: NeighborSource> Imported<S> {
    /// Create an importer rooted at `root`.
    pub fn new(root: &str, limit: i32, source: S) -> GeneratorResult<Self> {
        let mut imported = Self {
            root: String::new(),
            limit: positive("import limit", limit)?,
            source,
            tags: HashMap::new(),
            frontier: VecDeque::new(),
        };
        imported.set_root(root)?;
        Ok(imported)
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Set the identifier the next reset starts from.
    pub fn set_root(&mut self, root: &str) -> GeneratorResult<()> {
        let root = root.trim();
        if root.is_empty() {
            return Err(GeneratorError::InvalidParameter {
                name: "import root",
                reason: "must not be empty".to_string(),
            });
        }
        self.root = root.to_string();
        Ok(())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn set_limit(&mut self, limit: i32) -> GeneratorResult<()> {
        self.limit = positive("import limit", limit)?;
        Ok(())
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Tag of an already imported identifier.
    pub fn tag_of(&self, id: &str) -> Option<NodeId> {
        self.tags.get(id).copied()
    }

    /// Identifiers waiting to be expanded, oldest first.
    pub fn frontier(&self) -> impl Iterator<Item = &str> {
        self.frontier.iter().map(String::as_str)
    }

    pub fn can_add_vertex(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// Drop the identifier map and the frontier. Records already received
    /// from the source are kept for the next reset.
    pub fn clear_state(&mut self) {
        self.tags.clear();
        self.frontier.clear();
    }

    /// Clear the model, create the root node and expand breadth-first while
    /// records are available and the node count is below the limit.
    pub fn reset(&mut self, model: &mut GraphModel) {
        model.clear();
        self.clear_state();

        if !self.root.is_empty() {
            let root = self.root.clone();
            self.intern(model, &root);
        }

        while model.node_count() < self.limit && self.add_vertex(model) {}

        tracing::debug!(
            root = %self.root,
            nodes = model.node_count(),
            pending = self.frontier.len(),
            "import expanded"
        );
    }

    /// Expand the oldest frontier identifier. Returns whether it was expanded.
    pub fn add_vertex(&mut self, model: &mut GraphModel) -> bool {
        let Some(id) = self.frontier.pop_front() else {
            return false;
        };

        let neighbors = match self.source.neighbors(&id) {
            Ok(neighbors) => neighbors,
            Err(err) => {
                tracing::debug!(%err, "expansion deferred");
                self.frontier.push_front(id);
                return false;
            }
        };

        let Some(tag) = self.tag_of(&id) else {
            return false;
        };
        for neighbor in &neighbors {
            let other = self.intern(model, neighbor);
            model.new_edge(tag, other);
        }
        true
    }

    /// Tag of `id`, creating a node and queueing it on first sight.
    fn intern(&mut self, model: &mut GraphModel, id: &str) -> NodeId {
        if let Some(&tag) = self.tags.get(id) {
            return tag;
        }
        let tag = model.new_node();
        self.tags.insert(id.to_string(), tag);
        self.frontier.push_back(id.to_string());
        tag
    }
}

impl Default for Imported<RecordFeed> {
    fn default() -> Self {
        Self {
            root: String::new(),
            limit: DEFAULT_IMPORT_LIMIT,
            source: RecordFeed::new(),
            tags: HashMap::new(),
            frontier: VecDeque::new(),
        }
    }
}
