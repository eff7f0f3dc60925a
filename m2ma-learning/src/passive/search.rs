//! Hypotheses assembled from table cells, and a bounded exhaustive search over the cells whose
//! labels are unknown.

use m2ma::{gf2::solve_combination, prelude::*};
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::{store::Store, verify::find_counterexample};

/// An entry of an [`Assembly`] whose value is not known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    /// An entry `f(r_i·c_j)` of the base matrix.
    Base {
        /// Index of the selected row.
        row: usize,
        /// Index of the selected column.
        column: usize,
    },
    /// The final weight `f(r_i)` of a state.
    Final {
        /// Index of the selected row.
        row: usize,
    },
    /// An entry `f(c_j)` of the right hand side that determines the initial vector.
    Initial {
        /// Index of the selected column.
        column: usize,
    },
    /// An entry `f(r_i·σ·c_j)` of the block for `σ`.
    Transition {
        /// The symbol `σ`.
        symbol: Symbol,
        /// Index of the selected row.
        row: usize,
        /// Index of the selected column.
        column: usize,
    },
}

/// How the initial vector of an assembled hypothesis is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitialVector {
    /// ε is the selected row with this index, the initial vector is the corresponding unit
    /// vector.
    Unit(usize),
    /// ε is not among the selected rows, the initial vector expresses its restricted row,
    /// which is given here, in terms of the base.
    Columns(BitVector),
}

/// The raw material of a hypothesis: for selected rows `r_1 … r_d` and columns `c_1 … c_d` the
/// base matrix `B[i][j] = f(r_i·c_j)`, one block `F_σ[i][j] = f(r_i·σ·c_j)` per symbol and the
/// final weights `f(r_i)`.
///
/// State `i` stands for the row of `r_i`, so the transition of `r_i` under `σ` is the
/// combination of base rows that yields row `i` of `F_σ`.
#[derive(Debug, Clone)]
pub struct Assembly {
    alphabet: Alphabet,
    base: Matrix,
    blocks: Vec<Matrix>,
    accepting: BitVector,
    initial: InitialVector,
}

impl Assembly {
    /// Puts the parts together, `blocks` has to be in alphabet order.
    pub fn new(
        alphabet: Alphabet,
        base: Matrix,
        blocks: Vec<Matrix>,
        accepting: BitVector,
        initial: InitialVector,
    ) -> Self {
        Self {
            alphabet,
            base,
            blocks,
            accepting,
            initial,
        }
    }

    /// The number of selected rows.
    pub fn dimension(&self) -> usize {
        self.base.height()
    }

    /// The base matrix.
    pub fn base(&self) -> &Matrix {
        &self.base
    }

    /// Overwrites a single entry.
    pub fn set(&mut self, cell: Cell, value: bool) {
        match cell {
            Cell::Base { row, column } => self.base.set(row, column, value),
            Cell::Final { row } => self.accepting.set(row, value),
            Cell::Initial { column } => {
                if let InitialVector::Columns(rhs) = &mut self.initial {
                    rhs.set(column, value)
                }
            }
            Cell::Transition {
                symbol,
                row,
                column,
            } => self.blocks[symbol.index()].set(row, column, value),
        }
    }

    /// Solves for the transitions and the initial vector. Gives `None` if the base matrix is
    /// singular or the solver fails.
    pub fn hypothesis(&self, solver: Solver) -> Option<Hypothesis> {
        if !self.base.is_invertible() {
            return None;
        }
        let dimension = self.dimension();
        let transitions = self
            .blocks
            .iter()
            .map(|block| {
                let rows = block
                    .rows()
                    .map(|row| solve_combination(solver, &self.base, row))
                    .collect::<Option<Vec<_>>>()?;
                Some(Matrix::from_rows(rows, dimension))
            })
            .collect::<Option<Vec<_>>>()?;
        let initial = match &self.initial {
            InitialVector::Unit(position) => BitVector::unit(dimension, *position),
            InitialVector::Columns(rhs) => solve_combination(solver, &self.base, rhs)?,
        };
        Hypothesis::new(
            self.alphabet.clone(),
            initial,
            self.accepting.clone(),
            transitions,
        )
        .ok()
    }
}

/// The exhaustive search refused to run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Enumerating all assignments would take too long.
    #[error("{unknowns} unknown entries exceed the search cap of {cap}")]
    TooLarge {
        /// The number of unknown entries.
        unknowns: usize,
        /// The configured cap.
        cap: usize,
    },
}

/// Tries every assignment of bits to the `unknowns` of `assembly` and returns a hypothesis that
/// classifies all examples of `store` correctly.
///
/// Candidate `k` sets unknown `i` to bit `i` of `k`. Candidates are evaluated in parallel, but
/// the result is always the one with the smallest `k`, so it does not depend on scheduling.
/// Candidates with a singular base are skipped. Without unknowns there is nothing to search
/// and the result is `Ok(None)`.
pub fn exhaustive_search(
    assembly: &Assembly,
    unknowns: &[Cell],
    store: &Store,
    solver: Solver,
    cap: usize,
) -> Result<Option<Hypothesis>, SearchError> {
    let too_large = SearchError::TooLarge {
        unknowns: unknowns.len(),
        cap,
    };
    if unknowns.is_empty() {
        return Ok(None);
    }
    if unknowns.len() > cap {
        return Err(too_large);
    }
    let candidates = u32::try_from(unknowns.len())
        .ok()
        .and_then(|bits| 1usize.checked_shl(bits))
        .ok_or(too_large)?;

    let start = std::time::Instant::now();
    let found = (0..candidates).into_par_iter().find_map_first(|candidate| {
        let mut assembly = assembly.clone();
        for (i, &cell) in unknowns.iter().enumerate() {
            assembly.set(cell, (candidate >> i) & 1 == 1);
        }
        let hypothesis = assembly.hypothesis(solver)?;
        find_counterexample(&hypothesis, store)
            .is_none()
            .then_some(hypothesis)
    });
    debug!(
        "searched {candidates} assignments of {} unknowns in {}µs, {}",
        unknowns.len(),
        start.elapsed().as_micros(),
        if found.is_some() { "success" } else { "nothing found" }
    );
    Ok(found)
}
