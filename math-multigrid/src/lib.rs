//! Inter-level transfer operators for geometric multigrid
//!
//! This crate moves vectors between adjacent levels of a multigrid hierarchy
//! built over curves or meshes, for preconditioners of the sparse systems
//! produced by discretized curvature and energy operators.
//!
//! # Features
//!
//! - **Transfer modes**: plain vertex vectors, 3-wide interleaved vertex blocks,
//!   trailing barycenter scalars, edge-constraint blocks and projected modes
//! - **Three directions**: prolongation, transpose restriction (Galerkin
//!   consistent) and pseudo-inverse restriction (least-squares left inverse)
//! - **Projectors**: orthogonal projection onto the nullspace of constraint rows
//! - **Sparse maps**: CSR transfer matrices with a matrix-free pseudo-inverse
//!   (preconditioned CG on the normal equations), plus curve subdivision helpers
//! - **Generic scalar types**: works with f64 and f32
//!
//! # Example
//!
//! ```ignore
//! use math_audio_multigrid::{SparseTransfer, TransferMode, TransferOperator};
//! use ndarray::array;
//!
//! // Closed curve with 3 coarse and 6 fine vertices
//! let vertices = SparseTransfer::curve_subdivision(3, true);
//! let op = TransferOperator::new(3, 6, vertices)?;
//!
//! // Vertex values plus one global scalar
//! let fine = op.prolong(&array![1.0, 3.0, 5.0, 7.5], TransferMode::Barycenter)?;
//! assert_eq!(fine[6], 7.5);
//!
//! let coarse = op.restrict_by_transpose(&fine, TransferMode::Barycenter)?;
//! assert_eq!(coarse.len(), 4);
//! ```

pub mod config;
pub mod error;
pub mod iterative;
pub mod projector;
pub mod sparse;
pub mod traits;
pub mod transfer;

// Re-export main types
pub use config::TransferConfig;
pub use error::{Result, TransferError};
pub use projector::ConstraintProjector;
pub use sparse::CsrMatrix;
pub use traits::{IdentityProjector, Projector, Scalar, TransferMap};

// Re-export the transfer layer
pub use transfer::{
    BlockLayout, Direction, Level, RestrictionKind, SparseTransfer, Step, TransferMode,
    TransferOperator, TransferPlan,
};
