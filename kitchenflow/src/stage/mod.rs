//! Stage composition: the pipeline tree.
//!
//! A pipeline is a finite tree of stages. Leaves wrap a work unit; composites
//! sequence, fan out, or retry their children. Trees are acyclic by
//! construction since every node owns its children.

mod validators;

pub use validators::{
    feedback_validator, inventory_validator, loyalty_validator, refinement_validator,
    KeyPresenceValidator, NonNegativeNumbersValidator, RequiredFieldsValidator, Validator,
};

use crate::work::WorkUnit;
use std::sync::Arc;

/// Default bound on loop iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

/// A node in the pipeline tree.
pub enum Stage {
    /// An atomic work unit.
    Leaf(WorkUnit),
    /// Children run in order; the first fatal failure halts the rest.
    Sequential {
        /// The stage name.
        name: String,
        /// Children, executed in order.
        children: Vec<Stage>,
    },
    /// Children run concurrently; a failure never cancels siblings.
    Parallel {
        /// The stage name.
        name: String,
        /// Children, executed concurrently.
        children: Vec<Stage>,
    },
    /// Body retried until the validator accepts the state or iterations run
    /// out.
    Loop {
        /// The stage name.
        name: String,
        /// The body run each iteration.
        body: Box<Stage>,
        /// Accepts or rejects the state after each iteration.
        validator: Arc<dyn Validator>,
        /// Iteration bound, at least 1.
        max_iterations: u32,
    },
}

impl Stage {
    /// Wraps a work unit in a leaf stage.
    #[must_use]
    pub fn leaf(unit: WorkUnit) -> Self {
        Self::Leaf(unit)
    }

    /// Builds a sequential stage.
    #[must_use]
    pub fn sequential(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Sequential {
            name: name.into(),
            children,
        }
    }

    /// Builds a parallel stage.
    #[must_use]
    pub fn parallel(name: impl Into<String>, children: Vec<Self>) -> Self {
        Self::Parallel {
            name: name.into(),
            children,
        }
    }

    /// Builds a validation-gated loop with the default iteration bound.
    #[must_use]
    pub fn retry_until_valid(
        name: impl Into<String>,
        body: Self,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self::retry_until_valid_bounded(name, body, validator, DEFAULT_MAX_ITERATIONS)
    }

    /// Builds a validation-gated loop with an explicit iteration bound.
    /// A bound of zero is clamped to 1 so the body always runs at least once.
    #[must_use]
    pub fn retry_until_valid_bounded(
        name: impl Into<String>,
        body: Self,
        validator: Arc<dyn Validator>,
        max_iterations: u32,
    ) -> Self {
        Self::Loop {
            name: name.into(),
            body: Box::new(body),
            validator,
            max_iterations: max_iterations.max(1),
        }
    }

    /// Returns the stage name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Leaf(unit) => &unit.name,
            Self::Sequential { name, .. }
            | Self::Parallel { name, .. }
            | Self::Loop { name, .. } => name,
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Leaf(unit) => f.debug_tuple("Leaf").field(&unit.name).finish(),
            Self::Sequential { name, children } => f
                .debug_struct("Sequential")
                .field("name", name)
                .field("children", &children.len())
                .finish(),
            Self::Parallel { name, children } => f
                .debug_struct("Parallel")
                .field("name", name)
                .field("children", &children.len())
                .finish(),
            Self::Loop {
                name,
                max_iterations,
                ..
            } => f
                .debug_struct("Loop")
                .field("name", name)
                .field("max_iterations", max_iterations)
                .finish_non_exhaustive(),
        }
    }
}
