use std::{cmp::Ordering, fmt::Debug};

use itertools::Itertools;

use crate::alphabet::Symbol;

/// A finite word, i.e. a (possibly empty) sequence of [`Symbol`]s.
///
/// Words are ordered length-lexicographically: shorter words come first and words of the same
/// length are compared symbol by symbol according to the alphabet order. This is the order in
/// which rows and columns of observation tables are enumerated.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Word(Vec<Symbol>);

impl Word {
    /// The empty word ε.
    pub fn epsilon() -> Self {
        Self(vec![])
    }

    /// Creates a word from the given symbols.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }

    /// Creates a word from symbol indices, which is mostly useful in tests.
    pub fn from_indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        indices.into_iter().map(Symbol::new).collect()
    }

    /// Gives the number of symbols in the word.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this is ε.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the symbols of the word.
    pub fn symbols(&self) -> impl DoubleEndedIterator<Item = Symbol> + ExactSizeIterator + '_ {
        self.0.iter().copied()
    }

    /// Gives access to the underlying symbols.
    pub fn as_slice(&self) -> &[Symbol] {
        &self.0
    }

    /// Concatenates `self` with `suffix`.
    pub fn concat(&self, suffix: &Word) -> Word {
        let mut symbols = Vec::with_capacity(self.len() + suffix.len());
        symbols.extend_from_slice(&self.0);
        symbols.extend_from_slice(&suffix.0);
        Self(symbols)
    }

    /// Concatenates the three words `self`, `middle` and `suffix`.
    pub fn concat3(&self, middle: &Word, suffix: &Word) -> Word {
        let mut symbols = Vec::with_capacity(self.len() + middle.len() + suffix.len());
        symbols.extend_from_slice(&self.0);
        symbols.extend_from_slice(&middle.0);
        symbols.extend_from_slice(&suffix.0);
        Self(symbols)
    }

    /// Returns the word `self` followed by the single symbol `symbol`.
    pub fn append(&self, symbol: Symbol) -> Word {
        let mut symbols = self.0.clone();
        symbols.push(symbol);
        Self(symbols)
    }

    /// Returns the prefix of the given length, panics if `length` exceeds the word length.
    pub fn prefix(&self, length: usize) -> Word {
        Self(self.0[..length].to_vec())
    }

    /// Returns the suffix that starts at position `offset`.
    pub fn suffix_from(&self, offset: usize) -> Word {
        Self(self.0[offset..].to_vec())
    }

    /// Iterates over all prefixes from ε up to and including the word itself.
    pub fn prefixes(&self) -> impl Iterator<Item = Word> + '_ {
        (0..=self.len()).map(|length| self.prefix(length))
    }

    /// Iterates over all suffixes from the word itself down to and including ε.
    pub fn suffixes(&self) -> impl Iterator<Item = Word> + '_ {
        (0..=self.len()).map(|offset| self.suffix_from(offset))
    }

    /// Iterates over all ways of splitting the word into a prefix and a suffix.
    pub fn splits(&self) -> impl Iterator<Item = (Word, Word)> + '_ {
        (0..=self.len()).map(|position| (self.prefix(position), self.suffix_from(position)))
    }
}

impl FromIterator<Symbol> for Word {
    fn from_iter<T: IntoIterator<Item = Symbol>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Symbol>> for Word {
    fn from(value: Vec<Symbol>) -> Self {
        Self(value)
    }
}

impl Ord for Word {
    fn cmp(&self, other: &Self) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Word {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "ε")
        } else {
            write!(f, "{}", self.0.iter().map(|sym| sym.index()).join("."))
        }
    }
}
