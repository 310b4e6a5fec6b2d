/*
MIT License

Copyright (c) 2026 The slabcor developers
*/

//! Dense complex linear solves on Faer storage
//!
//! The Poisson solver produces one dense N×N system per transverse mode.
//! The systems are small and all different, so each is factorized once and
//! discarded; LU with partial pivoting is plenty.

use super::errors::{Result, UtilsError};
use faer::{col, Mat};
use num_complex::Complex64;

/// Pivot magnitudes below this are treated as a singular system.
const PIVOT_TOLERANCE: f64 = 1e-280;

/// Solve `A·x = b` by LU decomposition with partial pivoting.
///
/// Consumes the coefficient matrix and factorizes it in place. Returns an
/// error when a pivot collapses to round-off, which signals a singular
/// system.
pub fn lu_solve(mut a: Mat<Complex64>, b: &col::Col<Complex64>) -> Result<col::Col<Complex64>> {
    let n = a.nrows();
    if a.ncols() != n || b.nrows() != n {
        return Err(UtilsError::LinearAlgebra(format!(
            "solve expects a square system, got {}x{} with rhs of length {}",
            a.nrows(),
            a.ncols(),
            b.nrows()
        )));
    }

    let mut x = b.clone();

    for k in 0..n {
        // Find pivot
        let mut pivot_row = k;
        let mut pivot_val = a.read(k, k).norm();
        for i in (k + 1)..n {
            let val = a.read(i, k).norm();
            if val > pivot_val {
                pivot_row = i;
                pivot_val = val;
            }
        }

        if pivot_val < PIVOT_TOLERANCE {
            return Err(UtilsError::LinearAlgebra(format!(
                "singular pivot in column {}",
                k
            )));
        }

        // Swap rows if necessary
        if pivot_row != k {
            for j in 0..n {
                let temp = a.read(k, j);
                a.write(k, j, a.read(pivot_row, j));
                a.write(pivot_row, j, temp);
            }
            let temp = x.read(k);
            x.write(k, x.read(pivot_row));
            x.write(pivot_row, temp);
        }

        // Eliminate below, updating the right-hand side alongside
        for i in (k + 1)..n {
            let factor = a.read(i, k) / a.read(k, k);
            for j in (k + 1)..n {
                let upper = a.read(k, j);
                let updated = a.read(i, j) - factor * upper;
                a.write(i, j, updated);
            }
            let lead = x.read(k);
            let updated = x.read(i) - factor * lead;
            x.write(i, updated);
        }
    }

    // Back substitution
    for i in (0..n).rev() {
        let mut sum = Complex64::new(0.0, 0.0);
        for j in (i + 1)..n {
            sum += a.read(i, j) * x.read(j);
        }
        x.write(i, (x.read(i) - sum) / a.read(i, i));
    }

    Ok(x)
}
