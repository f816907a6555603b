// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

/// Index of a neuron in the connectivity matrix.
pub type NeuronId = usize;

/// Index of a core (a leaf of the interconnect tree).
pub type CoreId = usize;

// Evaluation errors

#[macro_export]
/// Build an `Err(SpurError::Kind(..))` from a format string.
///
/// Only usable with the variants that carry a message.
///
/// ```rust
/// use spur_engine::spur_error;
/// use spur_engine::types::{SpurError, SpurResult};
///
/// fn check(core_count: usize) -> SpurResult {
///     if core_count == 0 {
///         return spur_error!(ConstructionPrecondition, "core count must be > 0");
///     }
///     Ok(())
/// }
/// assert!(matches!(check(0), Err(SpurError::ConstructionPrecondition(_))));
/// ```
macro_rules! spur_error {
    ($kind:ident, $($arg:tt)+) => {
        Err($crate::types::SpurError::$kind(format!($($arg)+)))
    };
}

/// The `SpurError` is what should be returned in the case of an error
#[derive(Clone, Debug, PartialEq)]
pub enum SpurError {
    /// Invalid construction parameters (core count, group size, ...).
    ///
    /// Fatal: nothing is built.
    ConstructionPrecondition(String),

    /// The tree relations are inconsistent.
    ///
    /// Fatal when building or importing a tree, isolated to one source neuron
    /// when met while routing.
    MalformedTree(String),

    /// A neuron has no core assigned.
    UnmappedNeuron(NeuronId),

    /// The neuron has no target core. This is a terminal state rather than a
    /// failure.
    EmptyTargetSet(NeuronId),

    /// Unreadable or invalid input data.
    Input(String),
}

impl fmt::Display for SpurError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpurError::ConstructionPrecondition(msg) => {
                write!(f, "Error: construction precondition failed: {msg}")
            }
            SpurError::MalformedTree(msg) => write!(f, "Error: malformed tree: {msg}"),
            SpurError::UnmappedNeuron(neuron) => {
                write!(f, "Error: neuron {neuron} is not mapped to a core")
            }
            SpurError::EmptyTargetSet(neuron) => {
                write!(f, "Error: neuron {neuron} has no target cores")
            }
            SpurError::Input(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl Error for SpurError {}

impl SpurError {
    /// Errors that only affect the neuron being routed.
    #[must_use]
    pub fn is_per_neuron(&self) -> bool {
        matches!(
            self,
            SpurError::MalformedTree(_)
                | SpurError::UnmappedNeuron(_)
                | SpurError::EmptyTargetSet(_)
        )
    }
}

/// The SpurResult is the return type for most functions
pub type SpurResult<T = ()> = Result<T, SpurError>;
