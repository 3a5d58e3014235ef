//! Interface to reactive synthesis engines
//!
//! A synthesis engine takes a [`GR1Specification`] and either returns a
//! controller realizing it or reports that the specification is unrealizable.
//! Unrealizability is a regular outcome and not an error, errors are reserved
//! for failures of the engine itself (e.g. it could not be started).

use std::{error, fmt};

use crate::specification::GR1Specification;

/// Outcome of a synthesis run
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome<C> {
    /// The specification is realizable and the engine produced a controller
    Realizable(C),
    /// No controller can satisfy the specification
    Unrealizable,
}

impl<C> SynthesisOutcome<C> {
    /// Check whether the specification was realizable
    pub fn is_realizable(&self) -> bool {
        matches!(self, SynthesisOutcome::Realizable(_))
    }

    /// Get the controller if the specification was realizable
    pub fn controller(&self) -> Option<&C> {
        match self {
            SynthesisOutcome::Realizable(c) => Some(c),
            SynthesisOutcome::Unrealizable => None,
        }
    }

    /// Consume the outcome and return the controller, if any
    pub fn into_controller(self) -> Option<C> {
        match self {
            SynthesisOutcome::Realizable(c) => Some(c),
            SynthesisOutcome::Unrealizable => None,
        }
    }
}

impl<C> fmt::Display for SynthesisOutcome<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthesisOutcome::Realizable(_) => write!(f, "realizable"),
            SynthesisOutcome::Unrealizable => write!(f, "unrealizable"),
        }
    }
}

/// Reactive synthesis engine consuming GR(1) specifications
pub trait SynthesisEngine {
    /// Controller produced for realizable specifications
    type Controller;

    /// Error type for failures of the engine
    type Error: error::Error;

    /// Synthesize a controller for `spec`
    fn synthesize(
        &self,
        spec: &GR1Specification,
    ) -> Result<SynthesisOutcome<Self::Controller>, Self::Error>;
}
