//! Core traits for multigrid transfer
//!
//! This module defines the abstractions the transfer operator is generic over:
//! - [`Scalar`]: real floating-point types the vectors are built from
//! - [`Projector`]: projection onto a level's constrained subspace
//! - [`TransferMap`]: a linear map between a coarse and a fine level

use crate::error::Result;
use crate::transfer::Direction;
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use num_traits::{Float, FromPrimitive, NumAssign};
use std::fmt::Debug;

/// Real scalar type usable in transfer vectors.
///
/// Implemented for every `Float` that is also thread-safe, so `f64` and `f32`
/// both qualify.
pub trait Scalar: Float + NumAssign + FromPrimitive + Send + Sync + Debug + 'static {}

impl<T> Scalar for T where T: Float + NumAssign + FromPrimitive + Send + Sync + Debug + 'static {}

/// Projection onto the allowed constraint subspace of one level.
///
/// Implementations must be pure: same length in and out, deterministic,
/// no side effects observable by the transfer operator.
///
/// The transfer operator checks lengths on both sides of the call. A declared
/// [`dim`](Projector::dim) is compared with the plan before any work starts,
/// and every returned vector is compared with the plan afterwards. A mismatch
/// in either place is reported as
/// [`TransferError::ProjectorSize`](crate::TransferError::ProjectorSize), so a
/// projector that returns `None` from `dim` is still length-checked.
pub trait Projector<T: Scalar>: Send + Sync {
    /// Project `v` onto the constraint subspace.
    fn project_to_constraint_subspace(&self, v: &Array1<T>) -> Array1<T>;

    /// Length of the vectors this projector accepts, if fixed.
    ///
    /// `None` skips the up-front check; the result length is still verified.
    fn dim(&self) -> Option<usize> {
        None
    }
}

/// A linear map between a coarse level (columns) and a fine level (rows).
///
/// All `*_into` methods accumulate into `output` (`output += M * input`), so a
/// map only ever touches the sub-range of the caller's vector it was handed.
/// Callers guarantee that `input` and `output` have the lengths implied by the
/// direction. Only the pseudo-inverse can fail, since it may need a solve.
pub trait TransferMap<T: Scalar>: Send + Sync {
    /// Number of fine-level entries (rows of the forward map)
    fn fine_len(&self) -> usize;

    /// Number of coarse-level entries (columns of the forward map)
    fn coarse_len(&self) -> usize;

    /// Forward map: fine += P * coarse
    fn prolong_into(&self, coarse: ArrayView1<T>, fine: ArrayViewMut1<T>);

    /// Adjoint map: coarse += Pᵀ * fine
    fn restrict_transpose_into(&self, fine: ArrayView1<T>, coarse: ArrayViewMut1<T>);

    /// Least-squares inverse: coarse += P⁺ * fine
    fn restrict_pinv_into(&self, fine: ArrayView1<T>, coarse: ArrayViewMut1<T>) -> Result<()>;

    /// Apply the variant of the map selected by `direction`.
    fn apply_into(
        &self,
        direction: Direction,
        input: ArrayView1<T>,
        output: ArrayViewMut1<T>,
    ) -> Result<()> {
        match direction {
            Direction::Prolong => self.prolong_into(input, output),
            Direction::RestrictTranspose => self.restrict_transpose_into(input, output),
            Direction::RestrictPseudoInverse => self.restrict_pinv_into(input, output)?,
        }
        Ok(())
    }

    /// (fine, coarse) shape of the forward map
    fn shape(&self) -> (usize, usize) {
        (self.fine_len(), self.coarse_len())
    }
}

/// Identity projector (no constraints)
#[derive(Clone, Debug, Default)]
pub struct IdentityProjector;

impl<T: Scalar> Projector<T> for IdentityProjector {
    fn project_to_constraint_subspace(&self, v: &Array1<T>) -> Array1<T> {
        v.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_projector() {
        let v = array![1.0_f64, -2.0, 3.5];
        let projected = IdentityProjector.project_to_constraint_subspace(&v);
        assert_eq!(v, projected);
        assert_eq!(Projector::<f64>::dim(&IdentityProjector), None);
    }
}
