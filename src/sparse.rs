//! Sparse matrix utilities.
//!
//! Helpers for assembling nalgebra-sparse CSC matrices and handing them to
//! Clarabel.

use clarabel::algebra::CscMatrix as ClarabelCsc;
use nalgebra::DMatrix;
use nalgebra_sparse::{CooMatrix, CscMatrix};

/// Create a CSC matrix from (row, col, value) triplets.
///
/// Duplicates are summed together. Out-of-range triplets are dropped.
pub fn csc_from_triplets(
    nrows: usize,
    ncols: usize,
    triplets: impl IntoIterator<Item = (usize, usize, f64)>,
) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(nrows, ncols);
    for (row, col, val) in triplets {
        if row < nrows && col < ncols {
            coo.push(row, col, val);
        }
    }
    CscMatrix::from(&coo)
}

/// Upper triangle (including the diagonal) of a dense square matrix, scaled.
pub fn upper_triangle_csc(dense: &DMatrix<f64>, scale: f64) -> CscMatrix<f64> {
    let n = dense.nrows();
    let mut triplets = Vec::new();
    for j in 0..dense.ncols() {
        for i in 0..=j.min(n.saturating_sub(1)) {
            let v = dense[(i, j)];
            if v.abs() > 1e-15 {
                triplets.push((i, j, scale * v));
            }
        }
    }
    csc_from_triplets(n, dense.ncols(), triplets)
}

/// Convert nalgebra CSC to Clarabel CSC.
pub fn to_clarabel_csc(m: &CscMatrix<f64>) -> ClarabelCsc<f64> {
    ClarabelCsc::new(
        m.nrows(),
        m.ncols(),
        m.col_offsets().to_vec(),
        m.row_indices().to_vec(),
        m.values().to_vec(),
    )
}
