//! Error types for multigrid transfer operations.
//!
//! Every error raised here is structural: it points at a hierarchy that was
//! assembled with the wrong level, map or mode. None of them are retryable,
//! and the surrounding solver is expected to abort the cycle on any of them.

use crate::transfer::{Level, TransferMode};
use thiserror::Error;

/// Errors that can occur while building or applying transfer operators.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Input vector length does not match the mode's size contract.
    #[error("input length {actual} does not match expected length {expected} for mode {mode}")]
    SizeMismatch {
        /// Length of the supplied vector
        actual: usize,
        /// Length required by the mode and level sizes
        expected: usize,
        /// Mode the transfer was requested with
        mode: TransferMode,
    },

    /// Mode tag is not one of the known transfer modes.
    #[error("unsupported transfer mode: {tag}")]
    UnsupportedMode {
        /// The unrecognized tag, as supplied
        tag: String,
    },

    /// A projector-bearing mode was requested but the projector is not attached.
    #[error("mode {mode} requires a {level} projector, but none is attached")]
    MissingProjector {
        /// Mode the transfer was requested with
        mode: TransferMode,
        /// Level whose projector is missing
        level: Level,
    },

    /// An edge-constraint mode was requested but no edge map is attached.
    #[error("mode {mode} requires an edge-constraint transfer map, but none is attached")]
    MissingEdgeTransfer {
        /// Mode the transfer was requested with
        mode: TransferMode,
    },

    /// A projector works on vectors of a different length than the plan uses.
    ///
    /// Raised before the transfer if the projector's declared `dim()` is wrong,
    /// and after a projection call if the returned vector has the wrong length.
    #[error("{level} projector works on length {actual}, but the transfer needs length {expected}")]
    ProjectorSize {
        /// Level of the mismatching projector
        level: Level,
        /// Length required by the plan
        expected: usize,
        /// Length the projector declared or returned
        actual: usize,
    },

    /// A transfer map does not have the `upper × lower` shape of the level pair.
    #[error("{map} map has shape {actual:?}, expected {expected:?} (fine × coarse)")]
    MapShape {
        /// Which map is malformed
        map: &'static str,
        /// Required (fine, coarse) shape
        expected: (usize, usize),
        /// Actual (fine, coarse) shape
        actual: (usize, usize),
    },

    /// A coarse column of the map is empty, so `PᵀP` is singular.
    #[error("transfer map has no entries in coarse column {column}; its normal matrix is singular")]
    SingularNormalMatrix {
        /// First empty coarse column
        column: usize,
    },

    /// The iterative solve behind pseudo-inverse restriction stalled.
    #[error(
        "pseudo-inverse restriction did not converge after {iterations} iterations \
         (relative residual {residual:.3e})"
    )]
    PseudoInverseNotConverged {
        /// Iterations performed
        iterations: usize,
        /// Final relative residual of the normal equations
        residual: f64,
    },

    /// Configuration could not be parsed.
    #[error("invalid transfer configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// A specialized `Result` type for transfer operations.
pub type Result<T> = std::result::Result<T, TransferError>;

impl TransferError {
    /// Returns `true` if this is a vector-length contract violation.
    pub fn is_size_error(&self) -> bool {
        matches!(
            self,
            TransferError::SizeMismatch { .. } | TransferError::ProjectorSize { .. }
        )
    }

    /// Returns `true` if this error was raised for an unknown mode tag.
    pub fn is_mode_error(&self) -> bool {
        matches!(self, TransferError::UnsupportedMode { .. })
    }

    /// Returns `true` if a collaborator required by the mode is absent.
    pub fn is_missing_collaborator(&self) -> bool {
        matches!(
            self,
            TransferError::MissingProjector { .. } | TransferError::MissingEdgeTransfer { .. }
        )
    }

    /// Returns `true` if the error comes from building a transfer operator.
    pub fn is_construction_error(&self) -> bool {
        matches!(self, TransferError::MapShape { .. })
    }

    /// Returns `true` if pseudo-inverse restriction could not be computed.
    pub fn is_pseudo_inverse_error(&self) -> bool {
        matches!(
            self,
            TransferError::SingularNormalMatrix { .. }
                | TransferError::PseudoInverseNotConverged { .. }
        )
    }
}
