//! Linear algebra over the two element field GF(2).
//!
//! Vectors are bit sets backed by [`fixedbitset`], so addition is a word-wise xor. The
//! [`Basis`] is the workhorse of the table based learners: it keeps a growing set of
//! independent rows and expresses further rows in terms of them.

mod basis;
mod matrix;
mod solve;
mod vector;

pub use basis::{Basis, Extension};
pub use matrix::Matrix;
pub use solve::{solve_combination, solve_real_embedding, Solver};
pub use vector::{BitVector, PartialVector};
