//! Symmetric QUBO matrix.

use std::fmt;

use nalgebra::{DMatrix, SymmetricEigen};

/// A symmetric n×n matrix Q whose quadratic form xᵀQx is minimized over
/// binary vectors x.
///
/// Instances are immutable once built. The only constructor mirrors the
/// upper triangle into the lower one.
#[derive(Debug, Clone, PartialEq)]
pub struct QuboMatrix {
    q: DMatrix<f64>,
}

impl QuboMatrix {
    /// Build a matrix from its upper triangle. Entries below the diagonal in
    /// `upper` are ignored and replaced by their mirror.
    pub fn from_upper(mut upper: DMatrix<f64>) -> Self {
        let n = upper.nrows().min(upper.ncols());
        for i in 0..n {
            for j in (i + 1)..n {
                upper[(j, i)] = upper[(i, j)];
            }
        }
        QuboMatrix { q: upper }
    }

    /// Number of binary variables.
    pub fn n(&self) -> usize {
        self.q.nrows()
    }

    /// Entry `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.q[(i, j)]
    }

    /// Borrow the underlying dense matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.q
    }

    /// Evaluate xᵀQx.
    ///
    /// # Panics
    ///
    /// Panics if `x.len() != self.n()`.
    pub fn energy(&self, x: &[f64]) -> f64 {
        let n = self.n();
        assert_eq!(x.len(), n, "vector length must match QUBO dimension");

        let mut total = 0.0;
        for i in 0..n {
            if x[i] == 0.0 {
                continue;
            }
            let mut row = 0.0;
            for j in 0..n {
                row += self.q[(i, j)] * x[j];
            }
            total += x[i] * row;
        }
        total
    }

    /// Evaluate xᵀQx for a 0/1 selection.
    pub fn energy_of_bits(&self, bits: &[u8]) -> f64 {
        let x: Vec<f64> = bits.iter().map(|&b| f64::from(b)).collect();
        self.energy(&x)
    }

    /// Check `|Q[i,j] - Q[j,i]| <= tol` for all pairs.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        let n = self.n();
        (0..n).all(|i| ((i + 1)..n).all(|j| (self.q[(i, j)] - self.q[(j, i)]).abs() <= tol))
    }

    /// Smallest eigenvalue of Q.
    pub fn min_eigenvalue(&self) -> f64 {
        if self.n() == 0 {
            return 0.0;
        }
        SymmetricEigen::new(self.q.clone()).eigenvalues.min()
    }
}

impl fmt::Display for QuboMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.n() {
            for j in 0..self.n() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{:>12.4}", self.q[(i, j)])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_upper_mirrors() {
        let m = QuboMatrix::from_upper(DMatrix::from_row_slice(
            2,
            2,
            &[1.0, 3.0, 99.0, 2.0],
        ));
        assert_eq!(m.get(1, 0), 3.0);
        assert!(m.is_symmetric(0.0));
    }

    #[test]
    fn test_energy() {
        // x = [1, 1]: 1 + 3 + 3 + 2 = 9
        let m = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 0.0, 2.0]));
        assert_eq!(m.energy(&[1.0, 1.0]), 9.0);
        assert_eq!(m.energy(&[0.0, 1.0]), 2.0);
        assert_eq!(m.energy_of_bits(&[1, 0]), 1.0);
    }

    #[test]
    fn test_min_eigenvalue() {
        // eigenvalues of [[0, 1], [1, 0]] are -1 and 1
        let m = QuboMatrix::from_upper(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]));
        assert!((m.min_eigenvalue() + 1.0).abs() < 1e-12);
    }
}
