//! Compressed Sparse Row (CSR) storage for transfer matrices
//!
//! CSR format stores:
//! - `values`: Non-zero entries in row-major order
//! - `col_indices`: Column index for each value
//! - `row_ptrs`: Index into values/col_indices where each row starts
//!
//! Transfer matrices are rectangular (fine rows × coarse columns), so every
//! product here works on views and accumulates into the caller's output.

use crate::traits::Scalar;
use ndarray::{Array1, Array2, ArrayView1, ArrayViewMut1};
use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Compressed Sparse Row matrix
#[derive(Debug, Clone)]
pub struct CsrMatrix<T: Scalar> {
    /// Number of rows
    pub num_rows: usize,
    /// Number of columns
    pub num_cols: usize,
    /// Non-zero values in row-major order
    pub values: Vec<T>,
    /// Column indices for each value
    pub col_indices: Vec<usize>,
    /// Row pointers: row_ptrs[i] is the start index in values/col_indices for row i
    pub row_ptrs: Vec<usize>,
}

impl<T: Scalar> CsrMatrix<T> {
    /// Create an empty matrix (all zeros)
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            num_rows,
            num_cols,
            values: Vec::new(),
            col_indices: Vec::new(),
            row_ptrs: vec![0; num_rows + 1],
        }
    }

    /// Build from (row, col, value) triplets. Duplicates are summed.
    ///
    /// Triplets pointing outside `num_rows × num_cols` are dropped with a warning.
    pub fn from_triplets(
        num_rows: usize,
        num_cols: usize,
        mut triplets: Vec<(usize, usize, T)>,
    ) -> Self {
        let before = triplets.len();
        triplets.retain(|&(i, j, _)| i < num_rows && j < num_cols);
        if triplets.len() != before {
            log::warn!(
                "dropped {} out-of-range triplets for a {}x{} matrix",
                before - triplets.len(),
                num_rows,
                num_cols
            );
        }

        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut values: Vec<T> = Vec::with_capacity(triplets.len());
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut row_counts = vec![0usize; num_rows];
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            if last == Some((row, col)) {
                if let Some(v) = values.last_mut() {
                    *v += val;
                }
                continue;
            }
            values.push(val);
            col_indices.push(col);
            row_counts[row] += 1;
            last = Some((row, col));
        }

        let mut row_ptrs = Vec::with_capacity(num_rows + 1);
        row_ptrs.push(0);
        for count in row_counts {
            let next = row_ptrs[row_ptrs.len() - 1] + count;
            row_ptrs.push(next);
        }

        Self {
            num_rows,
            num_cols,
            values,
            col_indices,
            row_ptrs,
        }
    }

    /// Identity matrix
    pub fn identity(n: usize) -> Self {
        Self {
            num_rows: n,
            num_cols: n,
            values: vec![T::one(); n],
            col_indices: (0..n).collect(),
            row_ptrs: (0..=n).collect(),
        }
    }

    /// Number of non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Range of indices in values/col_indices for a given row
    pub fn row_range(&self, row: usize) -> Range<usize> {
        self.row_ptrs[row]..self.row_ptrs[row + 1]
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &ArrayView1<T>) -> T {
        self.row_range(row)
            .fold(T::zero(), |acc, idx| acc + self.values[idx] * x[self.col_indices[idx]])
    }

    /// Accumulating product: y += A * x
    pub fn matvec_add(&self, x: ArrayView1<T>, mut y: ArrayViewMut1<T>) {
        debug_assert_eq!(x.len(), self.num_cols);
        debug_assert_eq!(y.len(), self.num_rows);

        for i in 0..self.num_rows {
            y[i] += self.row_dot(i, &x);
        }
    }

    /// Accumulating product computed row-parallel: y += A * x
    #[cfg(feature = "rayon")]
    pub fn matvec_add_parallel(&self, x: ArrayView1<T>, mut y: ArrayViewMut1<T>) {
        debug_assert_eq!(x.len(), self.num_cols);
        debug_assert_eq!(y.len(), self.num_rows);

        let sums: Vec<T> = (0..self.num_rows)
            .into_par_iter()
            .map(|i| self.row_dot(i, &x))
            .collect();

        for (yi, si) in y.iter_mut().zip(sums) {
            *yi += si;
        }
    }

    /// Accumulating transpose product: y += Aᵀ * x
    pub fn matvec_transpose_add(&self, x: ArrayView1<T>, mut y: ArrayViewMut1<T>) {
        debug_assert_eq!(x.len(), self.num_rows);
        debug_assert_eq!(y.len(), self.num_cols);

        for i in 0..self.num_rows {
            let xi = x[i];
            for idx in self.row_range(i) {
                y[self.col_indices[idx]] += self.values[idx] * xi;
            }
        }
    }

    /// Squared Euclidean norm of every column, i.e. the diagonal of AᵀA
    pub fn column_norms_squared(&self) -> Array1<T> {
        let mut norms = Array1::zeros(self.num_cols);
        for (&col, &v) in self.col_indices.iter().zip(&self.values) {
            norms[col] += v * v;
        }
        norms
    }

    /// Convert to dense matrix (for debugging/small matrices)
    pub fn to_dense(&self) -> Array2<T> {
        let mut dense = Array2::from_elem((self.num_rows, self.num_cols), T::zero());

        for i in 0..self.num_rows {
            for idx in self.row_range(i) {
                dense[[i, self.col_indices[idx]]] += self.values[idx];
            }
        }

        dense
    }
}
