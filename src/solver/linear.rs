//! Numeric linear system solvers.

use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet};
use nalgebra::{DMatrix, DVector};

use super::sparse::SparseMatrix;
use super::SolverConfig;
use crate::error::{NodalError, Result};

/// Solve `A x = b`, picking dense or sparse LU by system size.
pub fn solve(
    a: &SparseMatrix<f64>,
    b: &DVector<f64>,
    config: &SolverConfig,
) -> Result<DVector<f64>> {
    if a.nrows() != a.ncols() {
        return Err(NodalError::DimensionMismatch {
            expected: a.nrows(),
            actual: a.ncols(),
        });
    }
    if a.nrows() != b.len() {
        return Err(NodalError::DimensionMismatch {
            expected: a.nrows(),
            actual: b.len(),
        });
    }
    if a.nrows() == 0 {
        return Ok(DVector::zeros(0));
    }

    let x = if a.nrows() >= config.sparse_threshold {
        solve_sparse(a.nrows(), &a.triplets(), b)?
    } else {
        solve_dense(&a.to_dense(), b)?
    };

    // A numerically singular factorisation shows up as inf/NaN
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(NodalError::SingularMatrix)
    }
}

/// Solve a linear system Ax = b using dense LU decomposition.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    a.clone().lu().solve(b).ok_or(NodalError::SingularMatrix)
}

/// Solve a sparse linear system Ax = b using sparse LU decomposition.
///
/// Duplicate triplets at the same position are summed by faer.
pub fn solve_sparse(
    size: usize,
    triplets: &[(usize, usize, f64)],
    rhs: &DVector<f64>,
) -> Result<DVector<f64>> {
    let faer_triplets: Vec<_> = triplets
        .iter()
        .map(|&(r, c, v)| Triplet::new(r, c, v))
        .collect();

    let sparse_mat = SparseColMat::<usize, f64>::try_new_from_triplets(size, size, &faer_triplets)
        .map_err(|_| NodalError::SingularMatrix)?;

    let lu = sparse_mat.sp_lu().map_err(|_| NodalError::SingularMatrix)?;

    let faer_rhs = Col::<f64>::from_fn(size, |i| rhs[i]);
    let faer_x = lu.solve(&faer_rhs);

    Ok(DVector::from_fn(size, |i, _| faer_x[i]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn divider() -> (SparseMatrix<f64>, DVector<f64>) {
        // Two 1-ohm resistors in series from a 1 A source to ground
        let mut m = SparseMatrix::square(2);
        m.stamp_conductance(0, 1, 1.0);
        m.add(1, 1, 1.0);
        (m, DVector::from_vec(vec![1.0, 0.0]))
    }

    #[test]
    fn test_dense_path() {
        let (m, b) = divider();
        let x = solve(&m, &b, &SolverConfig::default()).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_sparse_path_agrees() {
        let (m, b) = divider();
        let config = SolverConfig::default().with_sparse_threshold(1);
        let x = solve(&m, &b, &config).unwrap();
        assert_relative_eq!(x[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_singular() {
        let mut m = SparseMatrix::square(2);
        m.stamp_conductance(0, 1, 1.0);
        let b = DVector::from_vec(vec![1.0, -1.0]);
        assert_eq!(
            solve(&m, &b, &SolverConfig::default()),
            Err(NodalError::SingularMatrix)
        );
    }

    #[test]
    fn test_dimension_mismatch() {
        let m = SparseMatrix::square(2);
        let b = DVector::zeros(3);
        assert!(matches!(
            solve(&m, &b, &SolverConfig::default()),
            Err(NodalError::DimensionMismatch { .. })
        ));
    }
}
