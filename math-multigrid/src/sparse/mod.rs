//! Sparse matrix storage for transfer maps

mod csr;

pub use csr::CsrMatrix;
