//! Dense linear system solvers.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Solve a linear system Ax = b using LU decomposition.
///
/// A solution containing NaN or infinity is reported as singular.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    check_square(a)?;
    if a.nrows() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }

    if a.is_empty() {
        return Ok(DVector::zeros(0));
    }

    let x = a.clone().lu().solve(b).ok_or(Error::SingularMatrix)?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(Error::SingularMatrix)
    }
}

/// Invert a square matrix using LU decomposition.
pub fn invert_dense(a: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    check_square(a)?;
    if a.is_empty() {
        return Ok(DMatrix::zeros(0, 0));
    }
    let inv = a.clone().lu().try_inverse().ok_or(Error::SingularMatrix)?;
    if inv.iter().all(|v| v.is_finite()) {
        Ok(inv)
    } else {
        Err(Error::SingularMatrix)
    }
}

fn check_square(a: &DMatrix<f64>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    Ok(())
}
