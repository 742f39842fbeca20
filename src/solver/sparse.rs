//! Sparse matrix storage for MNA assembly.
//!
//! Entries are accumulated additively, so components can stamp in any order.
//! The same container holds numeric (`f64`) and symbolic ([`Expr`]) systems.
//!
//! [`Expr`]: crate::symbolic::Expr

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{AddAssign, Neg};

use nalgebra::{DMatrix, DVector};
use num_traits::{One, Zero};

/// Element type of an MNA system.
pub trait Scalar: Clone + fmt::Debug + Zero + One + Neg<Output = Self> + AddAssign {}

impl<T> Scalar for T where T: Clone + fmt::Debug + Zero + One + Neg<Output = T> + AddAssign {}

/// A fixed-size sparse matrix keyed by `(row, col)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    nrows: usize,
    ncols: usize,
    entries: BTreeMap<(usize, usize), T>,
}

impl<T: Scalar> SparseMatrix<T> {
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            entries: BTreeMap::new(),
        }
    }

    /// A `size × size` matrix of zeros.
    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Add `value` to element (row, col).
    pub fn add(&mut self, row: usize, col: usize, value: T) {
        assert!(
            row < self.nrows && col < self.ncols,
            "entry ({}, {}) outside {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        *self.entries.entry((row, col)).or_insert_with(T::zero) += value;
    }

    /// Element (row, col); zero when nothing was stamped there.
    pub fn get(&self, row: usize, col: usize) -> T {
        self.entries
            .get(&(row, col))
            .cloned()
            .unwrap_or_else(T::zero)
    }

    /// Stored entries in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.entries.iter().map(|(&(r, c), v)| (r, c, v))
    }

    /// Element-wise sum.
    pub fn sum(&self, other: &Self) -> Self {
        let mut out = self.clone();
        for (r, c, v) in other.iter() {
            out.add(r, c, v.clone());
        }
        out
    }

    /// Remove the listed rows and columns, keeping the remaining ones in
    /// their original relative order.
    pub fn delete(&self, rows: &[usize], cols: &[usize]) -> Self {
        let row_map = index_map(self.nrows, rows);
        let col_map = index_map(self.ncols, cols);
        let entries = self
            .entries
            .iter()
            .filter_map(|(&(r, c), v)| Some(((row_map[r]?, col_map[c]?), v.clone())))
            .collect();

        Self {
            nrows: self.nrows - count_removed(self.nrows, rows),
            ncols: self.ncols - count_removed(self.ncols, cols),
            entries,
        }
    }

    /// Dense row-major copy.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        let mut rows = vec![vec![T::zero(); self.ncols]; self.nrows];
        for (r, c, v) in self.iter() {
            rows[r][c] = v.clone();
        }
        rows
    }

    /// Stamp a two-terminal admittance `g` between rows `a` and `b`:
    ///   M[a,a] += g, M[b,b] += g, M[a,b] -= g, M[b,a] -= g
    pub fn stamp_conductance(&mut self, a: usize, b: usize, g: T) {
        self.add(a, a, g.clone());
        self.add(b, b, g.clone());
        self.add(a, b, -g.clone());
        self.add(b, a, -g);
    }

    /// Stamp the incidence pattern of a branch current unknown at `row`
    /// constraining V[p] - V[n]:
    ///   M[row,p] += 1, M[row,n] -= 1, M[p,row] -= 1, M[n,row] += 1
    pub fn stamp_branch(&mut self, row: usize, p: usize, n: usize) {
        self.add(row, p, T::one());
        self.add(row, n, -T::one());
        self.add(p, row, -T::one());
        self.add(n, row, T::one());
    }

    /// Stamp a voltage-controlled current source.
    /// I = gm * (V[ctrl+] - V[ctrl-]) flowing from out+ to out-.
    pub fn stamp_transconductance(
        &mut self,
        out_pos: usize,
        out_neg: usize,
        ctrl_pos: usize,
        ctrl_neg: usize,
        gm: T,
    ) {
        self.add(out_pos, ctrl_pos, gm.clone());
        self.add(out_pos, ctrl_neg, -gm.clone());
        self.add(out_neg, ctrl_pos, -gm.clone());
        self.add(out_neg, ctrl_neg, gm);
    }
}

impl SparseMatrix<f64> {
    /// Multiply every entry by `alpha`.
    pub fn scaled(&self, alpha: f64) -> Self {
        let mut out = self.clone();
        for v in out.entries.values_mut() {
            *v *= alpha;
        }
        out
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut y = DVector::zeros(self.nrows);
        for (r, c, v) in self.iter() {
            y[r] += v * x[c];
        }
        y
    }

    /// `(row, col, value)` triplets for sparse factorisation.
    pub fn triplets(&self) -> Vec<(usize, usize, f64)> {
        self.iter().map(|(r, c, &v)| (r, c, v)).collect()
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.nrows, self.ncols);
        for (r, c, &v) in self.iter() {
            dense[(r, c)] = v;
        }
        dense
    }
}

/// Old index → new index after removing `removed`.
fn index_map(len: usize, removed: &[usize]) -> Vec<Option<usize>> {
    let mut next = 0;
    (0..len)
        .map(|i| {
            if removed.contains(&i) {
                None
            } else {
                next += 1;
                Some(next - 1)
            }
        })
        .collect()
}

fn count_removed(len: usize, removed: &[usize]) -> usize {
    (0..len).filter(|i| removed.contains(i)).count()
}

/// Drop the listed positions from a vector, preserving order of the rest.
pub fn remove_entries<T>(items: Vec<T>, removed: &[usize]) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !removed.contains(i))
        .map(|(_, item)| item)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_additive_stamping() {
        let mut m = SparseMatrix::<f64>::square(3);
        m.stamp_conductance(0, 1, 0.5);
        m.stamp_conductance(1, 2, 0.25);
        assert_relative_eq!(m.get(1, 1), 0.75);
        assert_relative_eq!(m.get(0, 1), -0.5);
        assert_relative_eq!(m.get(0, 2), 0.0);
    }

    #[test]
    fn test_delete_preserves_order() {
        let mut m = SparseMatrix::<f64>::square(4);
        for i in 0..4 {
            for j in 0..4 {
                m.add(i, j, (10 * i + j) as f64);
            }
        }
        let reduced = m.delete(&[1], &[1]);
        assert_eq!(reduced.nrows(), 3);
        assert_eq!(reduced.ncols(), 3);
        assert_relative_eq!(reduced.get(0, 0), 0.0);
        assert_relative_eq!(reduced.get(1, 2), 23.0);
        assert_relative_eq!(reduced.get(2, 1), 32.0);

        let reduced = m.delete(&[0, 3], &[]);
        assert_eq!((reduced.nrows(), reduced.ncols()), (2, 4));
        assert_relative_eq!(reduced.get(0, 3), 13.0);
    }

    #[test]
    fn test_remove_entries() {
        let names = vec!["V0", "V1", "V2", "I1_0"];
        assert_eq!(remove_entries(names, &[1]), vec!["V0", "V2", "I1_0"]);
    }

    #[test]
    fn test_mul_vec_and_scale() {
        let mut m = SparseMatrix::<f64>::square(2);
        m.add(0, 0, 2.0);
        m.add(1, 0, 1.0);
        m.add(1, 1, 3.0);
        let y = m.scaled(2.0).mul_vec(&DVector::from_vec(vec![1.0, 1.0]));
        assert_relative_eq!(y[0], 4.0);
        assert_relative_eq!(y[1], 8.0);
    }

    #[test]
    fn test_stamp_order_does_not_matter() {
        let mut a = SparseMatrix::<f64>::square(3);
        a.stamp_conductance(0, 1, 1.0);
        a.stamp_branch(2, 0, 1);

        let mut b = SparseMatrix::<f64>::square(3);
        b.stamp_branch(2, 0, 1);
        b.stamp_conductance(0, 1, 1.0);

        assert_eq!(a, b);
    }
}
