//! Inter-level transfer for geometric multigrid
//!
//! Prolongation (coarse to fine) and restriction (fine to coarse) of vectors
//! whose layout carries more than per-vertex values: global barycenter
//! scalars, 3-wide vertex blocks, edge constraints and constraint-subspace
//! projections. The layout and the ordered primitives of each layout are
//! described by a [`TransferMode`]; the [`TransferOperator`] runs them.

mod mode;
mod operator;
mod plan;
mod sparse;

pub use mode::{BlockLayout, Direction, Level, RestrictionKind, Step, TransferMode};
pub use operator::TransferOperator;
pub use plan::TransferPlan;
pub use sparse::SparseTransfer;
