//! Multiplicity automata over the two element field GF(2).
//!
//! A multiplicity automaton (MA) of dimension $d$ over GF(2) consists of an initial row vector $\alpha$, a final column vector $\gamma$ and a $d \times d$ transition matrix $T_a$ for every symbol $a$ of the alphabet. It assigns to a finite word $w = a_1 \dots a_n$ the bit $\alpha \cdot T_{a_1} \cdots T_{a_n} \cdot \gamma$, where addition is xor and multiplication is and. Such automata describe exactly the boolean functions whose Hankel matrix has finite rank over GF(2), which includes every regular language but also languages like "the number of occurrences of some pattern is odd" with far fewer states than a DFA.
//!
//! This crate provides the building blocks that the learners in `m2ma-learning` are made of:
//! - [`Alphabet`], [`word::Word`] and [`label::Label`], the vocabulary for talking about examples,
//! - the [`gf2`] module with bit vectors, matrices, an incrementally built [`gf2::Basis`] and linear system solvers,
//! - [`Hypothesis`], the learned automaton itself, which can be evaluated, compared with other hypotheses and (de)serialized as JSON,
//! - the [`minimization::Minimizer`] trait together with the [`minimization::Reduction`] algorithm.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use m2ma::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, AlphabetError, Symbol},
        gf2::{Basis, BitVector, Extension, Matrix, PartialVector, Solver},
        hypothesis::{Hypothesis, HypothesisError},
        label::Label,
        math,
        minimization::{Minimizer, Reduction},
        word::Word,
    };
}

/// This module contains some definitions of mathematical objects which are used throughout the
/// crate and do not really fit to the top level.
pub mod math;

/// Alphabets and their symbols.
pub mod alphabet;
pub use alphabet::Alphabet;

/// Finite words.
pub mod word;

/// Three-valued labels of words.
pub mod label;

pub mod gf2;

/// Multiplicity automata over GF(2), the hypotheses that learners produce.
pub mod hypothesis;
pub use hypothesis::Hypothesis;

/// Minimization of multiplicity automata.
pub mod minimization;
