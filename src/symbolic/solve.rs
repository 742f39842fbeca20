//! Exact solution of linear systems with rational-function coefficients.
//!
//! Each row is first scaled by a common denominator so that every entry is a
//! polynomial. Determinants are then computed with fraction-free (Bareiss)
//! elimination, where every intermediate division is exact, and the unknowns
//! follow from Cramer's rule.

use std::iter;

use super::expr::Expr;
use super::poly::Poly;
use crate::error::{NodalError, Result};
use crate::solver::SparseMatrix;

/// Solve `M x = b` symbolically and simplify every component of `x`.
///
/// `tolerance` is the relative size below which coefficients produced by
/// cancellation are treated as zero.
pub fn solve_symbolic(m: &SparseMatrix<Expr>, b: &[Expr], tolerance: f64) -> Result<Vec<Expr>> {
    let n = m.nrows();
    if m.ncols() != n {
        return Err(NodalError::DimensionMismatch {
            expected: n,
            actual: m.ncols(),
        });
    }
    if b.len() != n {
        return Err(NodalError::DimensionMismatch {
            expected: n,
            actual: b.len(),
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut matrix = Vec::with_capacity(n);
    let mut rhs = Vec::with_capacity(n);
    for (row, value) in m.to_rows().iter().zip(b) {
        let (row, value) = clear_denominators(row, value, tolerance)?;
        matrix.push(row);
        rhs.push(value);
    }

    let det = determinant(matrix.clone(), tolerance)?;
    if det.is_zero() {
        return Err(NodalError::SingularMatrix);
    }
    log::debug!("Symbolic determinant has {} terms", det.len());

    (0..n)
        .map(|col| {
            let mut replaced = matrix.clone();
            for (row, value) in replaced.iter_mut().zip(&rhs) {
                row[col] = value.clone();
            }
            let det_col = determinant(replaced, tolerance)?;
            Ok(Expr::new(det_col, det.clone()).simplify(tolerance))
        })
        .collect()
}

/// Scale a row and its rhs by the lcm of their denominators.
///
/// Monomial denominators are combined through their monomial lcm; any other
/// denominator not already dividing the multiplier is multiplied in whole.
fn clear_denominators(row: &[Expr], rhs: &Expr, tolerance: f64) -> Result<(Vec<Poly>, Poly)> {
    let mut multiplier = Poly::one();

    for entry in row.iter().chain(iter::once(rhs)) {
        let den = entry.denom();
        if entry.is_zero() || den.as_constant().is_some() {
            continue;
        }
        if multiplier.div_exact(den, tolerance).is_some() {
            continue;
        }
        multiplier = match den.as_term() {
            Some((monomial, _)) => {
                let common = multiplier.content().gcd(monomial);
                let missing = monomial.div(&common).unwrap_or_else(|| monomial.clone());
                multiplier.mul_term(&missing, 1.0)
            }
            None => &multiplier * den,
        };
    }

    let scale = |entry: &Expr| -> Result<Poly> {
        let factor = multiplier
            .div_exact(entry.denom(), tolerance)
            .ok_or(NodalError::InexactDivision)?;
        Ok(entry.numer() * &factor)
    };

    let row = row.iter().map(&scale).collect::<Result<Vec<_>>>()?;
    Ok((row, scale(rhs)?))
}

/// Determinant of a polynomial matrix by Bareiss elimination.
fn determinant(mut a: Vec<Vec<Poly>>, tolerance: f64) -> Result<Poly> {
    let n = a.len();
    let mut sign = 1.0;
    let mut previous = Poly::one();

    for k in 0..n {
        if a[k][k].is_zero() {
            match (k + 1..n).find(|&i| !a[i][k].is_zero()) {
                Some(i) => {
                    a.swap(k, i);
                    sign = -sign;
                }
                None => return Ok(Poly::zero()),
            }
        }

        for i in k + 1..n {
            for j in k + 1..n {
                let keep = &a[i][j] * &a[k][k];
                let cross = &a[i][k] * &a[k][j];
                let threshold = tolerance * keep.max_coeff().max(cross.max_coeff());
                let mut entry = &keep - &cross;
                entry.prune(threshold);
                a[i][j] = entry
                    .div_exact(&previous, tolerance)
                    .ok_or(NodalError::InexactDivision)?;
            }
        }
        previous = a[k][k].clone();
    }

    Ok(a[n - 1][n - 1].scale(sign))
}
