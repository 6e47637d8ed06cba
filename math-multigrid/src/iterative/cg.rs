//! Preconditioned Conjugate Gradient
//!
//! CG for symmetric positive semi-definite operators given as a matvec
//! closure, with a Jacobi (diagonal) preconditioner. Used matrix-free on the
//! normal equations `PᵀP x = Pᵀ y` behind pseudo-inverse restriction, so the
//! normal matrix is never formed.

use crate::traits::Scalar;
use ndarray::{Array1, Zip};
use num_traits::ToPrimitive;

/// CG solver configuration
#[derive(Debug, Clone)]
pub struct CgConfig<T> {
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Relative residual tolerance for convergence
    pub tolerance: T,
}

/// CG solver result
#[derive(Debug)]
pub struct CgSolution<T: Scalar> {
    /// Solution vector
    pub x: Array1<T>,
    /// Number of iterations
    pub iterations: usize,
    /// Final relative residual
    pub residual: T,
    /// Whether convergence was achieved
    pub converged: bool,
}

/// Solve `A x = b` with Jacobi-preconditioned CG, starting from `x = 0`.
///
/// `apply` computes `A p`; `inv_diag` holds `1 / A[i][i]`. `A` must be
/// symmetric positive semi-definite and `b` in its range.
pub fn pcg<T, F>(
    apply: F,
    b: &Array1<T>,
    inv_diag: &Array1<T>,
    config: &CgConfig<T>,
) -> CgSolution<T>
where
    T: Scalar,
    F: Fn(&Array1<T>) -> Array1<T>,
{
    let n = b.len();
    let mut x = Array1::zeros(n);

    let b_norm = b.dot(b).sqrt();
    if b_norm <= T::min_positive_value() {
        return CgSolution {
            x,
            iterations: 0,
            residual: T::zero(),
            converged: true,
        };
    }

    let mut r = b.clone();
    let mut z = &r * inv_diag;
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..config.max_iterations {
        let q = apply(&p);

        let pq = p.dot(&q);
        if pq <= T::zero() {
            // Search direction fell into the nullspace of A
            let residual = r.dot(&r).sqrt() / b_norm;
            return CgSolution {
                x,
                iterations: iter,
                residual,
                converged: residual < config.tolerance,
            };
        }

        let alpha = rz / pq;
        x.scaled_add(alpha, &p);
        r.scaled_add(-alpha, &q);

        let rel_residual = r.dot(&r).sqrt() / b_norm;
        log::trace!(
            "pcg iteration {}: relative residual = {:.6e}",
            iter + 1,
            rel_residual.to_f64().unwrap_or(f64::NAN)
        );

        if rel_residual < config.tolerance {
            return CgSolution {
                x,
                iterations: iter + 1,
                residual: rel_residual,
                converged: true,
            };
        }

        z = &r * inv_diag;
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        rz = rz_new;

        // p = z + beta * p
        Zip::from(&mut p).and(&z).for_each(|pi, &zi| *pi = zi + beta * *pi);
    }

    let residual = r.dot(&r).sqrt() / b_norm;
    CgSolution {
        x,
        iterations: config.max_iterations,
        residual,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{Array2, array};

    fn config(max_iterations: usize) -> CgConfig<f64> {
        CgConfig {
            max_iterations,
            tolerance: 1e-12,
        }
    }

    #[test]
    fn test_pcg_spd() {
        let a: Array2<f64> = array![[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let b = array![1.0, 2.0, 3.0];
        let inv_diag = a.diag().mapv(|d| 1.0 / d);

        let solution = pcg(|p| a.dot(p), &b, &inv_diag, &config(50));
        assert!(solution.converged);
        assert!(solution.iterations <= 4);

        let ax = a.dot(&solution.x);
        for i in 0..3 {
            assert_relative_eq!(ax[i], b[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_pcg_diagonal_converges_in_one_step() {
        let d = array![2.0, 5.0, 0.5];
        let b = array![4.0, -5.0, 1.0];
        let inv_diag = d.mapv(|x: f64| 1.0 / x);

        let solution = pcg(|p| &d * p, &b, &inv_diag, &config(10));
        assert!(solution.converged);
        assert_eq!(solution.iterations, 1);
        assert_relative_eq!(solution.x[0], 2.0, epsilon = 1e-14);
        assert_relative_eq!(solution.x[1], -1.0, epsilon = 1e-14);
        assert_relative_eq!(solution.x[2], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn test_pcg_zero_rhs() {
        let b = Array1::<f64>::zeros(4);
        let solution = pcg(|p| p.clone(), &b, &Array1::ones(4), &config(10));
        assert!(solution.converged);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.x, b);
    }

    #[test]
    fn test_pcg_reports_iteration_limit() {
        let a: Array2<f64> = array![[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]];
        let b = array![1.0, 2.0, 3.0];

        let solution = pcg(|p| a.dot(p), &b, &Array1::ones(3), &config(1));
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 1);
        assert!(solution.residual > 1e-12);
    }
}
