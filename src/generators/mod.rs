//! Network-formation strategies.
//!
//! A generator populates a [`GraphModel`] under one growth policy. All of them
//! share the same operation set:
//! - `reset`: clear the model and regenerate from scratch with the current
//!   parameters
//! - `can_add_vertex`: whether another growth step is possible
//! - `add_vertex`: one incremental growth step
//!
//! Parameter setters never touch the live model; the next `reset` applies them.

mod attachment;
mod imported;
mod uniform;

use rand::Rng;
use thiserror::Error;

use crate::graph::GraphModel;

pub use attachment::{
    DEFAULT_ATTACHMENT_DEGREE, DEFAULT_TARGET_SIZE, MAX_ATTEMPTS, PreferentialAttachment,
    SEARCH_EPSILON,
};
pub use imported::{DEFAULT_IMPORT_LIMIT, ImportError, Imported, NeighborSource, RecordFeed};
pub use uniform::UniformRandom;

/// Errors raised while configuring a generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// A parameter is outside its valid range
    #[error("invalid {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// No generator is registered under this name
    #[error("unknown generator: {0}")]
    UnknownGenerator(String),

    /// The operation does not apply to the active generator
    #[error("{operation} is not supported by the {generator} generator")]
    Unsupported {
        operation: &'static str,
        generator: &'static str,
    },
}

/// Result type for generator configuration.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Validate a node count coming from the JS boundary. Zero is allowed.
pub(crate) fn non_negative(name: &'static str, value: i32) -> GeneratorResult<usize> {
    usize::try_from(value).map_err(|_| GeneratorError::InvalidParameter {
        name,
        reason: format!("must be non-negative, got {value}"),
    })
}

/// Validate a strictly positive count coming from the JS boundary.
pub(crate) fn positive(name: &'static str, value: i32) -> GeneratorResult<usize> {
    match usize::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(GeneratorError::InvalidParameter {
            name,
            reason: format!("must be positive, got {value}"),
        }),
    }
}

/// The fixed set of growth policies.
#[derive(Debug, Clone)]
pub enum Generator {
    PreferentialAttachment(PreferentialAttachment),
    UniformRandom(UniformRandom),
    Imported(Imported),
}

impl Generator {
    /// Registered names, in menu order.
    pub const NAMES: [&'static str; 3] = ["preferential-attachment", "uniform-random", "imported"];

    /// Create a generator with default parameters from its registered name.
    pub fn from_name(name: &str) -> GeneratorResult<Self> {
        match name {
            "preferential-attachment" => Ok(Self::PreferentialAttachment(PreferentialAttachment::default())),
            "uniform-random" => Ok(Self::UniformRandom(UniformRandom::default())),
            "imported" => Ok(Self::Imported(Imported::default())),
            other => Err(GeneratorError::UnknownGenerator(other.to_string())),
        }
    }

    /// Registered name of this generator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PreferentialAttachment(_) => Self::NAMES[0],
            Self::UniformRandom(_) => Self::NAMES[1],
            Self::Imported(_) => Self::NAMES[2],
        }
    }

    /// Clear the model and regenerate it from the current parameters.
    pub fn reset<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) {
        tracing::debug!(generator = self.name(), "resetting network");
        match self {
            Self::PreferentialAttachment(g) => g.reset(model, rng),
            Self::UniformRandom(g) => g.reset(model, rng),
            Self::Imported(g) => g.reset(model),
        }
    }

    /// Drop every tag-indexed record. Called when the model is cleared
    /// without a reset, since the old tags are reused by new nodes.
    pub fn clear_state(&mut self) {
        match self {
            Self::PreferentialAttachment(g) => g.clear_state(),
            Self::UniformRandom(g) => g.clear_state(),
            Self::Imported(g) => g.clear_state(),
        }
    }

    pub fn can_add_vertex(&self) -> bool {
        match self {
            Self::PreferentialAttachment(g) => g.can_add_vertex(),
            Self::UniformRandom(g) => g.can_add_vertex(),
            Self::Imported(g) => g.can_add_vertex(),
        }
    }

    /// Run one growth step. Returns whether the model changed.
    pub fn add_vertex<R: Rng + ?Sized>(&mut self, model: &mut GraphModel, rng: &mut R) -> bool {
        match self {
            Self::PreferentialAttachment(g) => {
                g.add_vertex(model, rng);
                true
            }
            Self::UniformRandom(g) => {
                g.add_vertex(model, rng);
                true
            }
            Self::Imported(g) => g.add_vertex(model),
        }
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Set the node count the next reset grows to.
    pub fn set_target_size(&mut self, size: i32) -> GeneratorResult<()> {
        match self {
            Self::PreferentialAttachment(g) => g.set_target_size(size),
            Self::UniformRandom(g) => g.set_target_size(size),
            Self::Imported(_) => Err(self.unsupported("setTargetSize")),
        }
    }

    /// Set the number of edges each new vertex tries to create.
    pub fn set_attachment_degree(&mut self, degree: i32) -> GeneratorResult<()> {
        match self {
            Self::PreferentialAttachment(g) => g.set_attachment_degree(degree),
            Self::UniformRandom(g) => g.set_attachment_degree(degree),
            Self::Imported(_) => Err(self.unsupported("setAttachmentDegree")),
        }
    }

    pub fn set_import_root(&mut self, root: &str) -> GeneratorResult<()> {
        match self {
            Self::Imported(g) => g.set_root(root),
            _ => Err(self.unsupported("setImportRoot")),
        }
    }

    pub fn set_import_limit(&mut self, limit: i32) -> GeneratorResult<()> {
        match self {
            Self::Imported(g) => g.set_limit(limit),
            _ => Err(self.unsupported("setImportLimit")),
        }
    }

    /// Attachment slots given up after exhausting their retries since the
    /// last reset.
    pub fn abandoned_slots(&self) -> u64 {
        match self {
            Self::PreferentialAttachment(g) => g.abandoned_slots(),
            Self::UniformRandom(g) => g.abandoned_slots(),
            Self::Imported(_) => 0,
        }
    }

    /// Displayed attachment preference of a node, in percent.
    pub fn preference(&self, tag: crate::graph::NodeId) -> Option<f64> {
        match self {
            Self::PreferentialAttachment(g) => g.preference(tag),
            _ => None,
        }
    }

    pub fn as_imported_mut(&mut self) -> Option<&mut Imported> {
        match self {
            Self::Imported(g) => Some(g),
            _ => None,
        }
    }

    fn unsupported(&self, operation: &'static str) -> GeneratorError {
        GeneratorError::Unsupported {
            operation,
            generator: self.name(),
        }
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::PreferentialAttachment(PreferentialAttachment::default())
    }
}
