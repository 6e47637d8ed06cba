//! Constraint-subspace projectors
//!
//! A [`ConstraintProjector`] removes every component of a vector that lies in
//! the row space of a constraint matrix `C`. With `Q` an orthonormal basis of
//! that row space, the projection is `x - Qᵀ(Q x)`: idempotent, symmetric, and
//! its image is exactly the nullspace of `C`.

use crate::config::TransferConfig;
use crate::traits::{Projector, Scalar};
use ndarray::{Array1, Array2};

/// Orthogonal projector onto the nullspace of a set of constraint rows
#[derive(Debug, Clone)]
pub struct ConstraintProjector<T: Scalar> {
    /// Orthonormal basis of the constraint row space (rank × dim)
    basis: Array2<T>,
}

impl<T: Scalar> ConstraintProjector<T> {
    /// Build from constraint rows `C` (k × dim) with the default drop tolerance.
    pub fn new(constraints: &Array2<T>) -> Self {
        Self::with_config(constraints, &TransferConfig::default())
    }

    /// Build from constraint rows `C` with the configured drop tolerance.
    pub fn with_config(constraints: &Array2<T>, config: &TransferConfig) -> Self {
        let tolerance = T::from_f64(config.projector_tolerance).unwrap_or_else(T::epsilon);
        Self::with_tolerance(constraints, tolerance)
    }

    /// Build from constraint rows `C`, discarding rows whose residual after
    /// orthogonalization is below `tolerance` relative to their own norm.
    pub fn with_tolerance(constraints: &Array2<T>, tolerance: T) -> Self {
        let dim = constraints.ncols();
        let mut rows: Vec<Array1<T>> = Vec::with_capacity(constraints.nrows());

        // Modified Gram-Schmidt
        for (k, row) in constraints.rows().into_iter().enumerate() {
            let mut w = row.to_owned();
            let original = w.dot(&w).sqrt();

            for q in &rows {
                let coeff = q.dot(&w);
                w.scaled_add(-coeff, q);
            }

            let norm = w.dot(&w).sqrt();
            if norm <= tolerance * original.max(T::one()) {
                log::warn!("constraint row {k} is linearly dependent and was dropped");
                continue;
            }
            w.mapv_inplace(|x| x / norm);
            rows.push(w);
        }

        let mut basis = Array2::zeros((rows.len(), dim));
        for (mut target, q) in basis.rows_mut().into_iter().zip(&rows) {
            target.assign(q);
        }

        Self { basis }
    }

    /// Projector removing the mean of a 1-wide vertex vector.
    pub fn constant(verts: usize) -> Self {
        Self::new(&Array2::ones((1, verts)))
    }

    /// Projector removing rigid x/y/z translations from a 3-wide interleaved
    /// vertex vector of `verts` vertices.
    pub fn translations(verts: usize) -> Self {
        let mut constraints = Array2::zeros((3, 3 * verts));
        for i in 0..verts {
            for k in 0..3 {
                constraints[[k, 3 * i + k]] = T::one();
            }
        }
        Self::new(&constraints)
    }

    /// Dimension of the removed subspace
    pub fn rank(&self) -> usize {
        self.basis.nrows()
    }
}

impl<T: Scalar> Projector<T> for ConstraintProjector<T> {
    fn project_to_constraint_subspace(&self, v: &Array1<T>) -> Array1<T> {
        let coeffs = self.basis.dot(v);
        v - &self.basis.t().dot(&coeffs)
    }

    fn dim(&self) -> Option<usize> {
        Some(self.basis.ncols())
    }
}
