use std::fmt::Debug;

use tracing::trace;

use super::{BitVector, PartialVector};

/// The outcome of offering a row to [`Basis::try_extend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extension {
    /// The row was linearly independent and was added at the given index.
    Added(usize),
    /// The row is the sum of the original basis rows marked in the coefficient vector.
    Dependent(BitVector),
    /// The row contains unknown entries, nothing was changed.
    Unknown,
}

#[derive(Clone)]
struct Entry {
    original: BitVector,
    reduced: BitVector,
    pivot: usize,
    combination: BitVector,
}

/// An incrementally built, linearly independent set of row vectors over GF(2).
///
/// Every inserted row is kept in its original form as well as in reduced form. A reduced row
/// has a pivot, which is the position of its lowest one, and it is zero at the pivots of all rows
/// that were inserted before it. Alongside the reduced form we remember which original rows sum
/// up to it, so that [`Basis::express`] can give coefficients with respect to the rows as they
/// were inserted. These coefficients are what the transition matrices of a hypothesis are made of.
///
/// # Example
/// ```
/// use m2ma::gf2::{Basis, BitVector};
/// let mut basis = Basis::new(3);
/// basis.insert(BitVector::parse("110").unwrap());
/// basis.insert(BitVector::parse("011").unwrap());
/// let coefficients = basis.express(&BitVector::parse("101").unwrap()).unwrap();
/// assert_eq!(coefficients, BitVector::parse("11").unwrap());
/// assert!(basis.express(&BitVector::parse("001").unwrap()).is_none());
/// ```
#[derive(Clone)]
pub struct Basis {
    width: usize,
    entries: Vec<Entry>,
}

impl Basis {
    /// Creates an empty basis for vectors of length `width`.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            entries: vec![],
        }
    }

    /// The length of the vectors in the basis.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The number of rows in the basis.
    pub fn dimension(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no row has been inserted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gives the `i`-th row as it was inserted.
    pub fn original(&self, i: usize) -> &BitVector {
        &self.entries[i].original
    }

    /// Iterates over the rows as they were inserted.
    pub fn originals(&self) -> impl Iterator<Item = &BitVector> + '_ {
        self.entries.iter().map(|entry| &entry.original)
    }

    /// Reduces `vector` against all rows in insertion order. Returns the residual and the set of
    /// original rows whose sum was subtracted, as a vector of length [`Basis::dimension`].
    pub fn reduce(&self, vector: &BitVector) -> (BitVector, BitVector) {
        debug_assert_eq!(vector.len(), self.width);
        let mut residual = vector.clone();
        let mut combination = BitVector::zeros(self.dimension());
        for entry in &self.entries {
            if residual.get(entry.pivot) {
                residual.add_assign(&entry.reduced);
                combination.add_assign(&entry.combination.resized(self.dimension()));
            }
        }
        (residual, combination)
    }

    /// Returns `true` if `vector` lies in the span of the basis.
    pub fn contains(&self, vector: &BitVector) -> bool {
        self.reduce(vector).0.is_zero()
    }

    /// Expresses `vector` as a sum of original basis rows, `None` if it is not in the span.
    pub fn express(&self, vector: &BitVector) -> Option<BitVector> {
        let (residual, combination) = self.reduce(vector);
        residual.is_zero().then_some(combination)
    }

    /// Inserts a complete row if it is independent of the current rows. Returns the index it was
    /// inserted at, or the coefficients that express it otherwise.
    pub fn insert(&mut self, vector: BitVector) -> Extension {
        let (residual, combination) = self.reduce(&vector);
        let Some(pivot) = residual.lowest_one() else {
            return Extension::Dependent(combination);
        };
        let index = self.dimension();
        let mut combination = combination.resized(index + 1);
        combination.toggle(index);
        trace!("adding row {vector} with pivot {pivot} at index {index}");
        self.entries.push(Entry {
            original: vector,
            reduced: residual,
            pivot,
            combination,
        });
        Extension::Added(index)
    }

    /// Like [`Basis::insert`] but for rows that may have unknown entries. Such rows are never
    /// inserted and yield [`Extension::Unknown`].
    pub fn try_extend(&mut self, row: &PartialVector) -> Extension {
        match row.to_complete() {
            Some(vector) => self.insert(vector),
            None => Extension::Unknown,
        }
    }
}

impl Debug for Basis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.original))
            .finish()
    }
}
