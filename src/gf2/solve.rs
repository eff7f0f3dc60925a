use super::{BitVector, Matrix};

const PIVOT_EPSILON: f64 = 1e-9;

/// How square linear systems `A · x = b` are solved when building hypotheses from a possibly
/// incomplete table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Solver {
    /// Gauss-Jordan elimination over GF(2).
    #[default]
    Exact,
    /// Embeds the system into the reals, solves it there with partial pivoting and reduces the
    /// rounded solution modulo 2. This can give wrong answers whenever the real determinant is
    /// even although the matrix is invertible over GF(2), so it is only kept for comparison.
    RealEmbedding,
}

impl Solver {
    /// Solves `matrix · x = rhs`, returns `None` if the matrix is (numerically) singular.
    pub fn solve(&self, matrix: &Matrix, rhs: &BitVector) -> Option<BitVector> {
        match self {
            Solver::Exact => matrix.solve(rhs),
            Solver::RealEmbedding => solve_real_embedding(matrix, rhs),
        }
    }
}

/// Solves the system over the reals and maps the rounded result back to GF(2).
pub fn solve_real_embedding(matrix: &Matrix, rhs: &BitVector) -> Option<BitVector> {
    let n = matrix.height();
    if n != matrix.width() || rhs.len() != n {
        return None;
    }
    let as_real = |bit: bool| if bit { 1.0 } else { 0.0 };
    let mut augmented: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            (0..n)
                .map(|j| as_real(matrix.get(i, j)))
                .chain(std::iter::once(as_real(rhs.get(i))))
                .collect()
        })
        .collect();

    for column in 0..n {
        let pivot = (column..n).max_by(|&a, &b| {
            augmented[a][column]
                .abs()
                .total_cmp(&augmented[b][column].abs())
        })?;
        if augmented[pivot][column].abs() < PIVOT_EPSILON {
            return None;
        }
        augmented.swap(column, pivot);
        for row in column + 1..n {
            let factor = augmented[row][column] / augmented[column][column];
            for k in column..=n {
                augmented[row][k] -= factor * augmented[column][k];
            }
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n)
            .map(|k| augmented[row][k] * solution[k])
            .sum();
        solution[row] = (augmented[row][n] - tail) / augmented[row][row];
    }
    Some(
        solution
            .into_iter()
            .map(|x| (x.round() as i64).rem_euclid(2) == 1)
            .collect(),
    )
}

/// Finds coefficients `x` such that the sum of the rows `rows[i]` with `x_i = 1` equals
/// `target`, by solving the transposed system with the given solver. The exact solver also
/// accepts dependent or non-square row sets and sets free coefficients to 0.
pub fn solve_combination(solver: Solver, rows: &Matrix, target: &BitVector) -> Option<BitVector> {
    match solver {
        Solver::Exact => rows.transpose().solve_any(target),
        Solver::RealEmbedding => solve_real_embedding(&rows.transpose(), target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ones_minus_identity(n: usize) -> Matrix {
        let mut out = Matrix::zeros(n, n);
        for i in 0..n {
            for j in (0..n).filter(|&j| j != i) {
                out.set(i, j, true);
            }
        }
        out
    }

    #[test]
    fn real_embedding_agrees_on_triangular_systems() {
        let a = Matrix::parse(&["110", "011", "001"]).unwrap();
        let b = BitVector::parse("111").unwrap();
        assert_eq!(
            Solver::RealEmbedding.solve(&a, &b),
            Solver::Exact.solve(&a, &b)
        );
    }

    #[test]
    fn real_embedding_can_be_wrong() {
        // J - I of size 4 has determinant -3 over the reals and is its own inverse over GF(2)
        let a = ones_minus_identity(4);
        let b = BitVector::unit(4, 0);
        let exact = Solver::Exact.solve(&a, &b).unwrap();
        assert_eq!(exact, BitVector::parse("0111").unwrap());
        assert_eq!(a.mul_vec(&exact), b);

        let embedded = Solver::RealEmbedding.solve(&a, &b).unwrap();
        assert_eq!(embedded, BitVector::parse("1000").unwrap());
        assert_ne!(a.mul_vec(&embedded), b);
    }

    #[test]
    fn singular_systems() {
        let a = Matrix::parse(&["11", "11"]).unwrap();
        let b = BitVector::parse("11").unwrap();
        assert!(Solver::Exact.solve(&a, &b).is_none());
        assert!(Solver::RealEmbedding.solve(&a, &b).is_none());
    }

    #[test]
    fn combinations_of_rows() {
        let rows = Matrix::parse(&["100", "110", "111"]).unwrap();
        let target = BitVector::parse("011").unwrap();
        let x = solve_combination(Solver::Exact, &rows, &target).unwrap();
        assert_eq!(rows.vec_mul(&x), target);
        let x = solve_combination(Solver::RealEmbedding, &rows, &target).unwrap();
        assert_eq!(rows.vec_mul(&x), target);

        let dependent = Matrix::parse(&["110", "110", "001"]).unwrap();
        assert!(solve_combination(Solver::Exact, &dependent, &target).is_none());
        let reachable = BitVector::parse("111").unwrap();
        let x = solve_combination(Solver::Exact, &dependent, &reachable).unwrap();
        assert_eq!(dependent.vec_mul(&x), reachable);
    }
}
