//! Deriving unknown table entries from known ones by linear dependence.

use std::cell::RefCell;

use m2ma::{gf2::solve_combination, prelude::*};
use tracing::trace;

use crate::store::Store;

/// The known examples overlaid with labels that were derived during learning.
///
/// Derived labels never override the store, and they are only kept for the duration of one
/// learner.
pub struct Knowledge<'a> {
    store: &'a Store,
    derived: RefCell<math::Map<Word, bool>>,
}

impl<'a> Knowledge<'a> {
    /// Knowledge consisting only of the examples in `store`.
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            derived: RefCell::new(math::Map::default()),
        }
    }

    /// The underlying examples.
    pub fn store(&self) -> &'a Store {
        self.store
    }

    /// The label of `word`, taking derived labels into account.
    pub fn label(&self, word: &Word) -> Label {
        self.store
            .lookup(word)
            .or_else(|| Label::from(self.derived(word)))
    }

    /// The derived label of `word`, if there is one.
    pub fn derived(&self, word: &Word) -> Option<bool> {
        self.derived.borrow().get(word).copied()
    }

    /// Remembers a derived label.
    pub fn record(&self, word: Word, label: bool) {
        self.derived.borrow_mut().insert(word, label);
    }

    /// The number of derived labels.
    pub fn derived_count(&self) -> usize {
        self.derived.borrow().len()
    }
}

/// Derives unknown labels `f(prefix·suffix)` from the linear dependency of the row of `prefix`
/// on a set of selected rows.
///
/// If on enough columns the row of `prefix` equals `Σ x_i · row(r_i)`, then under the
/// assumption that the target is linear this holds on every column and in particular
/// `f(prefix·suffix) = Σ x_i · f(r_i·suffix)`.
pub struct LinearInference<'k, 'a> {
    knowledge: &'k Knowledge<'a>,
    rows: &'k [Word],
    columns: &'k [Word],
}

impl<'k, 'a> LinearInference<'k, 'a> {
    /// Infers in terms of the given rows, using the given columns to find coefficients.
    pub fn new(knowledge: &'k Knowledge<'a>, rows: &'k [Word], columns: &'k [Word]) -> Self {
        Self {
            knowledge,
            rows,
            columns,
        }
    }

    /// Tries to derive the label of `prefix·suffix`. On success the label is recorded.
    pub fn infer(&self, prefix: &Word, suffix: &Word) -> Option<bool> {
        let word = prefix.concat(suffix);
        if let Some(label) = self.knowledge.derived(&word) {
            return Some(label);
        }

        let bit = |word: &Word| self.knowledge.label(word).bit();
        let usable: Vec<&Word> = self
            .columns
            .iter()
            .filter(|column| {
                bit(&prefix.concat(column)).is_some()
                    && self.rows.iter().all(|row| bit(&row.concat(column)).is_some())
            })
            .collect();
        if usable.len() < self.rows.len() {
            return None;
        }

        let restricted = |row: &Word| -> Option<BitVector> {
            usable
                .iter()
                .map(|column| bit(&row.concat(column)))
                .collect()
        };
        let matrix = Matrix::from_rows(
            self.rows.iter().map(restricted).collect::<Option<Vec<_>>>()?,
            usable.len(),
        );
        let target = restricted(prefix)?;
        let coefficients = solve_combination(Solver::Exact, &matrix, &target)?;

        let mut label = false;
        for i in coefficients.ones() {
            label ^= bit(&self.rows[i].concat(suffix))?;
        }
        trace!("derived label {label} for {word:?}");
        self.knowledge.record(word, label);
        Some(label)
    }
}
