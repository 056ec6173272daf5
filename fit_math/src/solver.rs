//! Dense linear system solver
//!
//! Gaussian elimination with partial pivoting followed by back substitution.
//! Used by polynomial regression to solve the normal equations and by the
//! reference ARIMA model to estimate autoregressive coefficients.

use crate::{MathError, Result};

/// Solve `A·x = b` for a square matrix `A` (given as rows) and vector `b`.
///
/// At every column the row with the largest absolute value among the
/// remaining rows is swapped into the pivot position. If that pivot is
/// numerically zero relative to the magnitude of `A`, the system is reported
/// as [`MathError::SingularSystem`] instead of producing NaN-laden output.
///
/// # Examples
///
/// ```
/// use fit_math::solve_linear_system;
///
/// let a = vec![vec![2.0, 1.0], vec![1.0, 3.0]];
/// let b = vec![3.0, 5.0];
/// let x = solve_linear_system(&a, &b).unwrap();
/// assert!((x[0] - 0.8).abs() < 1e-12);
/// assert!((x[1] - 1.4).abs() < 1e-12);
/// ```
pub fn solve_linear_system(a: &[Vec<f64>], b: &[f64]) -> Result<Vec<f64>> {
    let n = a.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Coefficient matrix must not be empty".to_string(),
        ));
    }
    if b.len() != n {
        return Err(MathError::InvalidInput(format!(
            "Right-hand side has length {}, expected {}",
            b.len(),
            n
        )));
    }
    if let Some(row) = a.iter().position(|row| row.len() != n) {
        return Err(MathError::InvalidInput(format!(
            "Coefficient matrix must be square: row {} has {} columns, expected {}",
            row,
            a[row].len(),
            n
        )));
    }
    if a.iter().flatten().chain(b).any(|v| !v.is_finite()) {
        return Err(MathError::InvalidInput(
            "Linear system contains non-finite values".to_string(),
        ));
    }

    let max_abs = a.iter().flatten().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let tolerance = f64::EPSILON * n as f64 * max_abs;

    // Augmented matrix [A | b]
    let mut augmented: Vec<Vec<f64>> = a
        .iter()
        .zip(b)
        .map(|(row, &rhs)| {
            let mut r = row.clone();
            r.push(rhs);
            r
        })
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| {
                augmented[i][col]
                    .abs()
                    .total_cmp(&augmented[j][col].abs())
            })
            .unwrap_or(col);
        augmented.swap(col, pivot_row);

        let pivot = augmented[col][col];
        if max_abs == 0.0 || pivot.abs() <= tolerance {
            tracing::debug!(column = col, pivot, "singular pivot during elimination");
            return Err(MathError::SingularSystem { column: col, pivot });
        }

        for row in col + 1..n {
            let factor = augmented[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..=n {
                augmented[row][j] -= factor * augmented[col][j];
            }
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = augmented[i][n];
        for j in i + 1..n {
            sum -= augmented[i][j] * x[j];
        }
        x[i] = sum / augmented[i][i];
    }

    Ok(x)
}
