//! Iterative solvers
//!
//! Matrix-free preconditioned CG, used for the normal equations behind
//! pseudo-inverse restriction.

mod cg;

pub use cg::{CgConfig, CgSolution, pcg};
