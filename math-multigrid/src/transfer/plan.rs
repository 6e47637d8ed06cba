//! Size contract of a single transfer
//!
//! A [`TransferPlan`] resolves `(mode, direction, lower, upper)` into concrete
//! vertex counts, vector lengths and block ranges for the input and output
//! sides. It is the only place where the direction swaps the level sizes.

use super::mode::{BlockLayout, Direction, Level, Step, TransferMode};
use crate::error::{Result, TransferError};
use crate::traits::Scalar;
use ndarray::Array1;
use std::ops::Range;

/// Resolved size contract for one `(mode, direction)` transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPlan {
    /// Mode the transfer runs in
    pub mode: TransferMode,
    /// Direction the transfer runs in
    pub direction: Direction,
    /// Vertex count of the input level
    pub input_verts: usize,
    /// Vertex count of the output level
    pub output_verts: usize,
    layout: BlockLayout,
}

impl TransferPlan {
    /// Resolve the plan for an operator between `lower` and `upper` vertices.
    pub fn new(mode: TransferMode, direction: Direction, lower: usize, upper: usize) -> Self {
        let (input_verts, output_verts) = match direction.input_level() {
            Level::Lower => (lower, upper),
            Level::Upper => (upper, lower),
        };

        Self {
            mode,
            direction,
            input_verts,
            output_verts,
            layout: mode.layout(),
        }
    }

    /// Ordered primitives of the mode.
    pub fn steps(&self) -> &'static [Step] {
        self.mode.steps()
    }

    /// Required input length
    pub fn input_len(&self) -> usize {
        self.layout.len(self.input_verts)
    }

    /// Produced output length
    pub fn output_len(&self) -> usize {
        self.layout.len(self.output_verts)
    }

    /// Reject an input vector whose length breaks the contract.
    pub fn check_input(&self, actual: usize) -> Result<()> {
        let expected = self.input_len();
        if actual != expected {
            return Err(TransferError::SizeMismatch {
                actual,
                expected,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Zero-filled output vector of the contracted length.
    pub fn allocate_output<T: Scalar>(&self) -> Array1<T> {
        Array1::zeros(self.output_len())
    }

    /// Level whose projector a projection step uses, if `step` is one.
    pub fn projector_level(&self, step: Step) -> Option<Level> {
        match step {
            Step::ProjectInput => Some(self.direction.input_level()),
            Step::ProjectOutput => Some(self.direction.output_level()),
            _ => None,
        }
    }

    /// Input and output ranges of the barycenter block.
    pub fn barycenter_ranges(&self) -> (Range<usize>, Range<usize>) {
        (
            self.layout.barycenter_range(self.input_verts),
            self.layout.barycenter_range(self.output_verts),
        )
    }

    /// Input and output ranges of the edge-constraint block.
    pub fn edge_ranges(&self) -> (Range<usize>, Range<usize>) {
        (
            self.layout.edge_range(self.input_verts),
            self.layout.edge_range(self.output_verts),
        )
    }
}
