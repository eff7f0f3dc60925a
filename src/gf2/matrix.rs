use std::fmt::Debug;

use itertools::Itertools;

use super::BitVector;

/// A dense matrix over GF(2), stored as a list of row vectors.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Matrix {
    rows: Vec<BitVector>,
    columns: usize,
}

impl Matrix {
    /// The `rows × columns` zero matrix.
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| BitVector::zeros(columns)).collect(),
            columns,
        }
    }

    /// The `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            rows: (0..n).map(|i| BitVector::unit(n, i)).collect(),
            columns: n,
        }
    }

    /// Builds a matrix from its rows, which all need to have length `columns`.
    pub fn from_rows(rows: Vec<BitVector>, columns: usize) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns));
        Self { rows, columns }
    }

    /// Parses rows given as strings of `0` and `1`. Returns `None` if a row has an invalid
    /// character or a different length than the first row.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Option<Self> {
        let rows: Vec<_> = rows
            .iter()
            .map(|row| BitVector::parse(row.as_ref()))
            .collect::<Option<_>>()?;
        let columns = rows.first().map(BitVector::len).unwrap_or(0);
        rows.iter()
            .all(|row| row.len() == columns)
            .then_some(Self { rows, columns })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns
    }

    /// Reads the entry at row `i` and column `j`.
    pub fn get(&self, i: usize, j: usize) -> bool {
        self.rows[i].get(j)
    }

    /// Overwrites the entry at row `i` and column `j`.
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        self.rows[i].set(j, value)
    }

    /// Gives access to row `i`.
    pub fn row(&self, i: usize) -> &BitVector {
        &self.rows[i]
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &BitVector> + '_ {
        self.rows.iter()
    }

    /// Extracts column `j` as a vector.
    pub fn column(&self, j: usize) -> BitVector {
        self.rows.iter().map(|row| row.get(j)).collect()
    }

    /// Returns the transposed matrix.
    pub fn transpose(&self) -> Matrix {
        Matrix {
            rows: (0..self.columns).map(|j| self.column(j)).collect(),
            columns: self.height(),
        }
    }

    /// Multiplies the row vector `v` from the left, i.e. computes `v · self`.
    pub fn vec_mul(&self, v: &BitVector) -> BitVector {
        debug_assert_eq!(v.len(), self.height());
        let mut out = BitVector::zeros(self.columns);
        for i in v.ones() {
            out.add_assign(&self.rows[i]);
        }
        out
    }

    /// Multiplies the column vector `v` from the right, i.e. computes `self · v`.
    pub fn mul_vec(&self, v: &BitVector) -> BitVector {
        debug_assert_eq!(v.len(), self.columns);
        self.rows.iter().map(|row| row.dot(v)).collect()
    }

    /// The matrix product `self · other`.
    pub fn mul(&self, other: &Matrix) -> Matrix {
        debug_assert_eq!(self.columns, other.height());
        Matrix {
            rows: self.rows.iter().map(|row| other.vec_mul(row)).collect(),
            columns: other.columns,
        }
    }

    /// Computes the rank by Gaussian elimination.
    pub fn rank(&self) -> usize {
        let mut rows = self.rows.clone();
        let mut rank = 0;
        for column in 0..self.columns {
            let Some(pivot) = (rank..rows.len()).find(|&r| rows[r].get(column)) else {
                continue;
            };
            rows.swap(rank, pivot);
            let pivot_row = rows[rank].clone();
            for row in rows.iter_mut().skip(rank + 1) {
                if row.get(column) {
                    row.add_assign(&pivot_row);
                }
            }
            rank += 1;
        }
        rank
    }

    /// A square matrix is invertible iff it has full rank.
    pub fn is_invertible(&self) -> bool {
        self.height() == self.columns && self.rank() == self.columns
    }

    /// Computes the inverse by Gauss-Jordan elimination, `None` if the matrix is singular or not
    /// square.
    pub fn inverse(&self) -> Option<Matrix> {
        let n = self.height();
        if n != self.columns {
            return None;
        }
        let mut left = self.rows.clone();
        let mut right = Matrix::identity(n).rows;
        for column in 0..n {
            let pivot = (column..n).find(|&r| left[r].get(column))?;
            left.swap(column, pivot);
            right.swap(column, pivot);
            let (pivot_left, pivot_right) = (left[column].clone(), right[column].clone());
            for r in (0..n).filter(|&r| r != column) {
                if left[r].get(column) {
                    left[r].add_assign(&pivot_left);
                    right[r].add_assign(&pivot_right);
                }
            }
        }
        Some(Matrix {
            rows: right,
            columns: n,
        })
    }

    /// Solves `self · x = b` for a square invertible matrix.
    pub fn solve(&self, b: &BitVector) -> Option<BitVector> {
        self.inverse().map(|inverse| inverse.mul_vec(b))
    }

    /// Solves `self · x = b` for an arbitrary matrix by Gauss-Jordan elimination on the
    /// augmented system. Free variables are set to 0. Returns `None` if the system is
    /// inconsistent.
    pub fn solve_any(&self, b: &BitVector) -> Option<BitVector> {
        debug_assert_eq!(b.len(), self.height());
        let width = self.columns;
        let mut rows: Vec<BitVector> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut augmented = row.resized(width + 1);
                augmented.set(width, b.get(i));
                augmented
            })
            .collect();

        let mut pivots = Vec::new();
        for column in 0..width {
            let rank = pivots.len();
            let Some(pivot) = (rank..rows.len()).find(|&r| rows[r].get(column)) else {
                continue;
            };
            rows.swap(rank, pivot);
            let pivot_row = rows[rank].clone();
            for (r, row) in rows.iter_mut().enumerate() {
                if r != rank && row.get(column) {
                    row.add_assign(&pivot_row);
                }
            }
            pivots.push(column);
        }

        // a row 0 ... 0 | 1 means there is no solution
        if rows[pivots.len()..].iter().any(|row| row.get(width)) {
            return None;
        }
        let mut solution = BitVector::zeros(width);
        for (r, &column) in pivots.iter().enumerate() {
            solution.set(column, rows[r].get(width));
        }
        Some(solution)
    }

    /// Returns the rows in string form, the format used for serialization.
    pub fn to_strings(&self) -> Vec<String> {
        self.rows.iter().map(ToString::to_string).collect()
    }
}

impl Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.rows.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&str]) -> Matrix {
        Matrix::parse(rows).unwrap()
    }

    #[test]
    fn products() {
        let a = m(&["11", "01"]);
        let v = BitVector::parse("10").unwrap();
        assert_eq!(a.vec_mul(&v), BitVector::parse("11").unwrap());
        assert_eq!(a.mul_vec(&v), BitVector::parse("10").unwrap());
        assert_eq!(a.mul(&a), Matrix::identity(2));
        assert_eq!(a.transpose(), m(&["10", "11"]));
    }

    #[test]
    fn inversion() {
        let a = m(&["110", "011", "001"]);
        let inverse = a.inverse().unwrap();
        assert_eq!(a.mul(&inverse), Matrix::identity(3));
        assert!(m(&["11", "11"]).inverse().is_none());
        assert_eq!(m(&["11", "11"]).rank(), 1);
        assert!(!m(&["110", "011", "101"]).is_invertible());
        let b = BitVector::parse("101").unwrap();
        let x = a.solve(&b).unwrap();
        assert_eq!(a.mul_vec(&x), b);
    }

    #[test]
    fn non_square_systems() {
        let a = m(&["110", "011"]);
        let b = BitVector::parse("11").unwrap();
        let x = a.solve_any(&b).unwrap();
        assert_eq!(a.mul_vec(&x), b);
        assert_eq!(x, BitVector::parse("010").unwrap());

        let inconsistent = m(&["11", "11", "01"]);
        assert!(inconsistent
            .solve_any(&BitVector::parse("100").unwrap())
            .is_none());
    }

    #[test]
    fn random_invertible_matrices() {
        use rand::{rngs::StdRng, Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(2);
        let mut checked = 0;
        while checked < 50 {
            let n = rng.gen_range(1..=8);
            let a = Matrix::from_rows(
                (0..n)
                    .map(|_| (0..n).map(|_| rng.gen_bool(0.5)).collect())
                    .collect(),
                n,
            );
            let Some(inverse) = a.inverse() else {
                assert!(!a.is_invertible());
                continue;
            };
            assert!(a.is_invertible());
            assert_eq!(a.mul(&inverse), Matrix::identity(n));
            assert_eq!(inverse.mul(&a), Matrix::identity(n));
            let b: BitVector = (0..n).map(|_| rng.gen_bool(0.5)).collect();
            let x = a.solve(&b).unwrap();
            assert_eq!(a.mul_vec(&x), b);
            assert_eq!(a.solve_any(&b), Some(x));
            checked += 1;
        }
    }

    #[test]
    fn parsing_rejects_ragged_rows() {
        assert!(Matrix::parse(&["10", "1"]).is_none());
        assert_eq!(m(&["10", "01"]).to_strings(), vec!["10", "01"]);
    }
}
