//! Oracles answer membership and equivalence queries.

use std::cell::RefCell;

use m2ma::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::trace;

use crate::store::Store;

/// A word on which a hypothesis is wrong, together with its correct label.
pub type Counterexample = (Word, bool);

/// A minimally adequate teacher (MAT) for active learning. It answers membership queries,
/// i.e. whether a single word belongs to the target language, and equivalence queries, which
/// either confirm a hypothesis or give a [`Counterexample`].
///
/// Implementations range from exact ones backed by an automaton to approximate ones that only
/// know a finite set of examples.
pub trait Oracle {
    /// The alphabet of the target language.
    fn alphabet(&self) -> &Alphabet;

    /// Returns `true` if `word` belongs to the target language.
    fn membership(&self, word: &Word) -> bool;

    /// Checks whether `hypothesis` computes the target language.
    fn equivalence(&self, hypothesis: &Hypothesis) -> Result<(), Counterexample>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn alphabet(&self) -> &Alphabet {
        (**self).alphabet()
    }

    fn membership(&self, word: &Word) -> bool {
        (**self).membership(word)
    }

    fn equivalence(&self, hypothesis: &Hypothesis) -> Result<(), Counterexample> {
        (**self).equivalence(hypothesis)
    }
}

/// An oracle based on a set of examples. Membership queries for words that are not in the
/// store are answered with a default label. Equivalence queries only check the examples and
/// return the length-lexicographically smallest misclassified one.
#[derive(Debug, Clone)]
pub struct SampleOracle {
    store: Store,
    default: bool,
}

impl SampleOracle {
    /// Creates an oracle answering from `store` and with `default` for all other words.
    pub fn new(store: Store, default: bool) -> Self {
        Self { store, default }
    }

    /// The underlying examples.
    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Oracle for SampleOracle {
    fn alphabet(&self) -> &Alphabet {
        self.store.alphabet()
    }

    fn membership(&self, word: &Word) -> bool {
        self.store.classify(word).unwrap_or(self.default)
    }

    fn equivalence(&self, hypothesis: &Hypothesis) -> Result<(), Counterexample> {
        match self
            .store
            .classified_words()
            .filter(|(word, label)| hypothesis.evaluate(word) != *label)
            .min_by(|(left, _), (right, _)| left.cmp(right))
        {
            Some((word, label)) => Err((word.clone(), label)),
            None => Ok(()),
        }
    }
}

/// Approximates equivalence queries of an oracle that can only answer membership queries by
/// comparing the hypothesis with the oracle on random words.
///
/// The random words are drawn from a seeded generator, so runs are reproducible. Successive
/// equivalence queries continue the same random stream.
#[derive(Debug)]
pub struct RandomTestingOracle<O> {
    inner: O,
    num_tests: usize,
    max_test_length: usize,
    rng: RefCell<StdRng>,
}

impl<O: Oracle> RandomTestingOracle<O> {
    /// The default number of random words per equivalence query.
    pub const NUM_TESTS: usize = 1000;
    /// The default maximal length of random words.
    pub const MAX_TEST_LENGTH: usize = 25;

    /// Wraps `inner` with the default number and length of tests.
    pub fn new(inner: O, seed: u64) -> Self {
        Self {
            inner,
            num_tests: Self::NUM_TESTS,
            max_test_length: Self::MAX_TEST_LENGTH,
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Sets the number of random words per equivalence query.
    pub fn with_num_tests(mut self, num_tests: usize) -> Self {
        self.num_tests = num_tests;
        self
    }

    /// Sets the maximal length of random words.
    pub fn with_max_test_length(mut self, max_test_length: usize) -> Self {
        self.max_test_length = max_test_length;
        self
    }

    /// The wrapped oracle.
    pub fn inner(&self) -> &O {
        &self.inner
    }

    fn random_word(&self) -> Word {
        let alphabet = self.inner.alphabet();
        if alphabet.is_empty() {
            return Word::epsilon();
        }
        let mut rng = self.rng.borrow_mut();
        let length = rng.gen_range(0..=self.max_test_length);
        (0..length)
            .map(|_| Symbol::new(rng.gen_range(0..alphabet.size())))
            .collect()
    }
}

impl<O: Oracle> Oracle for RandomTestingOracle<O> {
    fn alphabet(&self) -> &Alphabet {
        self.inner.alphabet()
    }

    fn membership(&self, word: &Word) -> bool {
        self.inner.membership(word)
    }

    fn equivalence(&self, hypothesis: &Hypothesis) -> Result<(), Counterexample> {
        for test in 0..self.num_tests {
            let word = self.random_word();
            let expected = self.inner.membership(&word);
            if hypothesis.evaluate(&word) != expected {
                trace!("random test {test} found counterexample {word:?}");
                return Err((word, expected));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Store {
        Store::from_strings(
            Alphabet::new(["a", "b"]).unwrap(),
            ["b b", "a"],
            ["", "a b"],
        )
        .unwrap()
    }

    #[test_log::test]
    fn sample_oracle() {
        let oracle = SampleOracle::new(store(), true);
        let alphabet = oracle.alphabet().clone();
        assert!(oracle.membership(&alphabet.parse_word("b b").unwrap()));
        assert!(!oracle.membership(&Word::epsilon()));
        assert!(oracle.membership(&alphabet.parse_word("b a b").unwrap()));

        // the trivial hypothesis gets `a` and `b b` wrong, `a` is smaller
        let trivial = Hypothesis::trivial(alphabet.clone());
        assert_eq!(
            oracle.equivalence(&trivial),
            Err((alphabet.parse_word("a").unwrap(), true))
        );
    }

    #[test_log::test]
    fn random_testing_is_reproducible() {
        let oracle = SampleOracle::new(store(), false);
        let alphabet = oracle.alphabet().clone();
        let trivial = Hypothesis::trivial(alphabet.clone());

        let first = RandomTestingOracle::new(&oracle, 7).with_max_test_length(3);
        let second = RandomTestingOracle::new(&oracle, 7).with_max_test_length(3);
        let found = first.equivalence(&trivial);
        assert_eq!(found, second.equivalence(&trivial));
        // both words of the store that are accepted are short, so 1000 tests will hit one
        let (word, label) = found.unwrap_err();
        assert!(label);
        assert!(word == alphabet.parse_word("a").unwrap() || word == alphabet.parse_word("b b").unwrap());

        let none = RandomTestingOracle::new(&oracle, 7).with_num_tests(0);
        assert_eq!(none.equivalence(&trivial), Ok(()));
    }
}
