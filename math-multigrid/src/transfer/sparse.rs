//! Sparse transfer maps
//!
//! [`SparseTransfer`] stores the forward (coarse → fine) matrix in CSR form and
//! provides all three transfer variants from it:
//!
//! - prolongation: `P x`
//! - transpose restriction: `Pᵀ y`
//! - pseudo-inverse restriction: the least-squares solution of `P x ≈ y`,
//!   found by Jacobi-preconditioned CG on `PᵀP x = Pᵀ y` using only sparse
//!   matvecs. For a full-column-rank `P` this is the left inverse `(PᵀP)⁻¹Pᵀ`.
//!
//! The preconditioner is built on the first pseudo-inverse call, so maps used
//! only for prolongation and transpose restriction never pay for it.

use crate::config::TransferConfig;
use crate::error::{Result, TransferError};
use crate::iterative::{CgConfig, pcg};
use crate::sparse::CsrMatrix;
use crate::traits::{Scalar, TransferMap};
use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use num_traits::ToPrimitive;
use std::sync::OnceLock;

/// CSR-backed transfer map with a matrix-free pseudo-inverse
#[derive(Debug, Clone)]
pub struct SparseTransfer<T: Scalar> {
    matrix: CsrMatrix<T>,
    /// `1 / diag(PᵀP)`, or the first empty coarse column
    normal_inv_diag: OnceLock<std::result::Result<Array1<T>, usize>>,
    solver: CgConfig<T>,
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel_threshold: usize,
}

impl<T: Scalar> SparseTransfer<T> {
    /// Wrap a `fine × coarse` prolongation matrix using the default configuration.
    pub fn new(matrix: CsrMatrix<T>) -> Self {
        Self::with_config(matrix, &TransferConfig::default())
    }

    /// Wrap a `fine × coarse` prolongation matrix.
    pub fn with_config(matrix: CsrMatrix<T>, config: &TransferConfig) -> Self {
        log::debug!(
            "built sparse transfer map: {} fine x {} coarse, nnz = {}",
            matrix.num_rows,
            matrix.num_cols,
            matrix.nnz()
        );

        Self {
            matrix,
            normal_inv_diag: OnceLock::new(),
            solver: CgConfig {
                max_iterations: config.pinv_max_iterations,
                tolerance: T::from_f64(config.pinv_tolerance).unwrap_or_else(T::epsilon),
            },
            parallel_threshold: config.parallel_threshold,
        }
    }

    /// Build from (fine, coarse, weight) triplets.
    pub fn from_triplets(fine: usize, coarse: usize, triplets: Vec<(usize, usize, T)>) -> Self {
        Self::new(CsrMatrix::from_triplets(fine, coarse, triplets))
    }

    /// Midpoint subdivision of a polyline with `coarse` vertices.
    ///
    /// Coarse vertex `i` lands on fine vertex `2i`; fine vertex `2i + 1` is the
    /// average of coarse vertices `i` and `i + 1`. A closed curve wraps around and
    /// has `2 * coarse` fine vertices, an open one has `2 * coarse - 1`.
    pub fn curve_subdivision(coarse: usize, closed: bool) -> Self {
        let half = T::from_f64(0.5).unwrap_or_else(T::zero);
        let fine = match (coarse, closed) {
            (0, _) => 0,
            (_, true) => 2 * coarse,
            (_, false) => 2 * coarse - 1,
        };

        let mut triplets = Vec::with_capacity(3 * coarse);
        for i in 0..coarse {
            triplets.push((2 * i, i, T::one()));
            let next = if closed {
                (i + 1) % coarse
            } else if i + 1 < coarse {
                i + 1
            } else {
                continue;
            };
            triplets.push((2 * i + 1, i, half));
            triplets.push((2 * i + 1, next, half));
        }

        Self::from_triplets(fine, coarse, triplets)
    }

    /// Edge map of a closed curve refined by [`curve_subdivision`](Self::curve_subdivision).
    ///
    /// Coarse edge `i` splits into fine edges `2i` and `2i + 1`, both of which
    /// inherit its value.
    pub fn edge_split(coarse_edges: usize) -> Self {
        let triplets = (0..coarse_edges)
            .flat_map(|i| [(2 * i, i, T::one()), (2 * i + 1, i, T::one())])
            .collect();
        Self::from_triplets(2 * coarse_edges, coarse_edges, triplets)
    }

    /// Forward matrix
    pub fn matrix(&self) -> &CsrMatrix<T> {
        &self.matrix
    }

    fn forward(&self, coarse: ArrayView1<T>, fine: ArrayViewMut1<T>) {
        #[cfg(feature = "rayon")]
        {
            if self.matrix.num_rows >= self.parallel_threshold {
                return self.matrix.matvec_add_parallel(coarse, fine);
            }
        }
        self.matrix.matvec_add(coarse, fine);
    }

    /// `PᵀP p` without forming `PᵀP`
    fn apply_normal(&self, p: &Array1<T>) -> Array1<T> {
        let mut fine = Array1::zeros(self.matrix.num_rows);
        self.forward(p.view(), fine.view_mut());

        let mut out = Array1::zeros(self.matrix.num_cols);
        self.matrix.matvec_transpose_add(fine.view(), out.view_mut());
        out
    }

    fn jacobi_preconditioner(&self) -> std::result::Result<Array1<T>, usize> {
        let diag = self.matrix.column_norms_squared();
        if let Some(column) = diag.iter().position(|&d| d <= T::zero()) {
            log::warn!("coarse column {column} of the transfer map is empty; no pseudo-inverse");
            return Err(column);
        }

        log::debug!(
            "prepared pseudo-inverse preconditioner for {} coarse columns",
            diag.len()
        );
        Ok(diag.mapv(|d| T::one() / d))
    }
}

impl<T: Scalar> TransferMap<T> for SparseTransfer<T> {
    fn fine_len(&self) -> usize {
        self.matrix.num_rows
    }

    fn coarse_len(&self) -> usize {
        self.matrix.num_cols
    }

    fn prolong_into(&self, coarse: ArrayView1<T>, fine: ArrayViewMut1<T>) {
        self.forward(coarse, fine);
    }

    fn restrict_transpose_into(&self, fine: ArrayView1<T>, coarse: ArrayViewMut1<T>) {
        self.matrix.matvec_transpose_add(fine, coarse);
    }

    fn restrict_pinv_into(&self, fine: ArrayView1<T>, coarse: ArrayViewMut1<T>) -> Result<()> {
        let inv_diag = self
            .normal_inv_diag
            .get_or_init(|| self.jacobi_preconditioner())
            .as_ref()
            .map_err(|&column| TransferError::SingularNormalMatrix { column })?;

        let mut rhs = Array1::zeros(self.matrix.num_cols);
        self.matrix.matvec_transpose_add(fine, rhs.view_mut());

        let solution = pcg(|p| self.apply_normal(p), &rhs, inv_diag, &self.solver);
        if !solution.converged {
            return Err(TransferError::PseudoInverseNotConverged {
                iterations: solution.iterations,
                residual: solution.residual.to_f64().unwrap_or(f64::NAN),
            });
        }
        log::trace!("pseudo-inverse restriction took {} iterations", solution.iterations);

        Zip::from(coarse).and(&solution.x).for_each(|c, &xi| *c += xi);
        Ok(())
    }
}
