use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Square tridiagonal matrix stored as its three bands.
///
/// `lower[0]` and `upper[n - 1]` lie outside the matrix and are ignored.
#[derive(Debug, Clone)]
pub struct Tridiagonal {
    lower: Vec<f64>,
    diagonal: Vec<f64>,
    upper: Vec<f64>,
}

impl Tridiagonal {

    pub fn new(lower: Vec<f64>, diagonal: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        let n = diagonal.len();
        if lower.len() != n {
            return Err(Error::ShapeMismatch {
                what: "lower band",
                expected: (n, 1),
                actual: (lower.len(), 1),
            });
        }
        if upper.len() != n {
            return Err(Error::ShapeMismatch {
                what: "upper band",
                expected: (n, 1),
                actual: (upper.len(), 1),
            });
        }
        Ok(Tridiagonal { lower, diagonal, upper })
    }

    pub fn size(&self) -> usize {
        self.diagonal.len()
    }

    /// Solves `T·x = rhs` with the Thomas algorithm (banded Gaussian
    /// elimination without pivoting). Stable for diagonally dominant bands.
    pub fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>> {
        let n = self.size();
        if rhs.len() != n {
            return Err(Error::ShapeMismatch {
                what: "right-hand side",
                expected: (n, 1),
                actual: (rhs.len(), 1),
            });
        }
        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        let mut modified_upper = vec![0.0; n];
        let mut modified_rhs = vec![0.0; n];

        let mut pivot = self.diagonal[0];
        if pivot == 0.0 {
            return Err(Error::ZeroPivot { row: 0 });
        }
        modified_upper[0] = self.upper[0] / pivot;
        modified_rhs[0] = rhs[0] / pivot;

        for i in 1..n {
            pivot = self.diagonal[i] - self.lower[i] * modified_upper[i - 1];
            if pivot == 0.0 {
                return Err(Error::ZeroPivot { row: i });
            }
            modified_upper[i] = self.upper[i] / pivot;
            modified_rhs[i] = (rhs[i] - self.lower[i] * modified_rhs[i - 1]) / pivot;
        }

        let mut solution = DVector::zeros(n);
        solution[n - 1] = modified_rhs[n - 1];
        for i in (0..n - 1).rev() {
            solution[i] = modified_rhs[i] - modified_upper[i] * solution[i + 1];
        }
        Ok(solution)
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.size();
        DMatrix::from_fn(n, n, |row, col| {
            if row == col {
                self.diagonal[row]
            } else if col + 1 == row {
                self.lower[row]
            } else if row + 1 == col {
                self.upper[row]
            } else {
                0.0
            }
        })
    }
}
