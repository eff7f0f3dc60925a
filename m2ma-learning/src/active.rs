//! Active learning with a minimally adequate teacher.
//!
//! The [`ActiveLearner`] reuses the strict table engine: whenever the engine stops because
//! labels are missing, the missing words are asked as membership queries, and every hypothesis
//! the engine produces is checked with an equivalence query.

pub mod dfa;
pub mod oracle;

use m2ma::prelude::*;
use tracing::{debug, info, trace};

use self::oracle::Oracle;
use crate::{
    config::LearnerConfig, error::LearningError, passive::strict::StrictLearner, store::Store,
};

/// The result of a successful active learning run.
#[derive(Debug, Clone)]
pub struct ActiveOutcome {
    /// The hypothesis that passed the equivalence query.
    pub hypothesis: Hypothesis,
    /// The number of equivalence queries, including the final one.
    pub equivalence_queries: usize,
    /// The number of membership queries.
    pub membership_queries: usize,
}

/// Learns the language of an [`Oracle`] in the style of L*.
///
/// Suffixes of counterexamples become forced columns, so the strict engine is guaranteed to
/// classify a counterexample correctly from then on. Because the suffix length of the regular
/// columns is capped (at 1 unless configured otherwise), the number of membership queries per
/// round stays proportional to the table size.
pub struct ActiveLearner<O: Oracle> {
    oracle: O,
    config: LearnerConfig,
    store: Store,
    forced: math::Set<Word>,
    membership_queries: usize,
}

impl<O: Oracle> ActiveLearner<O> {
    /// Creates a learner that knows nothing yet.
    pub fn new(oracle: O, config: LearnerConfig) -> Self {
        let config = match config.max_suffix_length {
            Some(_) => config,
            None => config.with_max_suffix_length(Some(1)),
        };
        Self {
            store: Store::new(oracle.alphabet().clone()),
            oracle,
            config,
            forced: math::Set::default(),
            membership_queries: 0,
        }
    }

    /// Everything that was learned from the oracle so far.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// The oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The configuration in use, with the suffix cap filled in.
    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    /// Gives up the learner and returns every answer it collected, i.e. the membership
    /// queries together with the counterexamples. Learning passively from this store
    /// reproduces the tables the active run has seen.
    pub fn into_store(self) -> Store {
        self.store
    }

    fn ask<I: IntoIterator<Item = Word>>(&mut self, words: I) -> Result<(), LearningError> {
        for word in words {
            let answer = self.oracle.membership(&word);
            trace!("membership query {word:?} -> {answer}");
            if self.store.insert(word, answer)? {
                self.membership_queries += 1;
            }
        }
        Ok(())
    }

    /// Alternates between table closure and equivalence queries until the oracle accepts a
    /// hypothesis. Each closure attempt and each equivalence query counts as one iteration.
    pub fn infer(&mut self) -> Result<ActiveOutcome, LearningError> {
        let start = std::time::Instant::now();
        let mut equivalence_queries = 0;
        for iteration in 1..=self.config.max_iterations {
            let attempt =
                StrictLearner::with_forced_columns(&self.store, &self.config, self.forced.iter().cloned())
                    .infer();
            let hypothesis = match attempt {
                Ok(hypothesis) => hypothesis,
                Err(LearningError::InsufficientInformation { missing }) => {
                    debug!(
                        "iteration {iteration}: asking {} membership queries",
                        missing.len()
                    );
                    self.ask(missing)?;
                    continue;
                }
                Err(other) => return Err(other),
            };

            equivalence_queries += 1;
            match self.oracle.equivalence(&hypothesis) {
                Ok(()) => {
                    info!(
                        "active learning found hypothesis of dimension {} with {} membership and {} equivalence queries in {}µs",
                        hypothesis.dimension(),
                        self.membership_queries,
                        equivalence_queries,
                        start.elapsed().as_micros()
                    );
                    return Ok(ActiveOutcome {
                        hypothesis,
                        equivalence_queries,
                        membership_queries: self.membership_queries,
                    });
                }
                Err((counterexample, label)) => {
                    debug!(
                        "iteration {iteration}: hypothesis of dimension {} refuted by {counterexample:?}",
                        hypothesis.dimension()
                    );
                    self.forced.extend(counterexample.suffixes());
                    self.store.insert(counterexample, label)?;
                }
            }
        }
        Err(LearningError::DidNotConverge {
            iterations: self.config.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        dfa::{tests::*, Dfa, DfaOracle},
        oracle::{RandomTestingOracle, SampleOracle},
        *,
    };

    fn learn_dfa(dot: &str) -> (Dfa, ActiveOutcome) {
        let dfa = Dfa::parse_dot(dot).unwrap();
        let oracle = DfaOracle::new(dfa.clone());
        let mut learner = ActiveLearner::new(&oracle, LearnerConfig::default());
        let outcome = learner.infer().unwrap();
        assert_eq!(outcome.membership_queries, oracle.membership_queries());
        assert_eq!(outcome.equivalence_queries, oracle.equivalence_queries());
        (dfa, outcome)
    }

    #[test_log::test]
    fn recovers_parity() {
        let (dfa, outcome) = learn_dfa(EVEN_A);
        assert!(outcome.hypothesis.equivalent(&dfa.to_hypothesis()));
        assert_eq!(outcome.hypothesis.dimension(), 2);
        assert_eq!(outcome.equivalence_queries, 1);
    }

    #[test_log::test]
    fn collected_answers_are_kept() {
        let dfa = Dfa::parse_dot(EVEN_A).unwrap();
        let oracle = DfaOracle::new(dfa.clone());
        let mut learner = ActiveLearner::new(&oracle, LearnerConfig::default());
        let outcome = learner.infer().unwrap();
        assert_eq!(learner.config().max_suffix_length, Some(1));
        let store = learner.into_store();
        // all words up to length 2 and the extensions of `a a` and `a b`
        assert_eq!(store.len(), 11);
        assert_eq!(store.len(), outcome.membership_queries);
        for (word, label) in store.classified_words() {
            assert_eq!(dfa.accepts(word), label);
        }
    }

    #[test_log::test]
    fn recovers_suffix_languages() {
        for dot in [ENDS_WITH_A, SECOND_TO_LAST_A] {
            let (dfa, outcome) = learn_dfa(dot);
            assert!(outcome.hypothesis.equivalent(&dfa.to_hypothesis()));
            assert!(outcome.hypothesis.dimension() <= dfa.size());
        }
    }

    #[test_log::test]
    fn random_testing_suffices_for_parity() {
        let oracle = RandomTestingOracle::new(DfaOracle::new(Dfa::parse_dot(EVEN_A).unwrap()), 3);
        let mut learner = ActiveLearner::new(oracle, LearnerConfig::default());
        let outcome = learner.infer().unwrap();
        let target = learner.oracle().inner().dfa().to_hypothesis();
        assert!(outcome.hypothesis.equivalent(&target));
    }

    #[test_log::test]
    fn sample_oracle_reproduces_examples() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let examples =
            Store::from_strings(alphabet.clone(), ["a", "b a", "a b b"], ["", "b", "a a"]).unwrap();
        let oracle = SampleOracle::new(examples.clone(), false);
        let outcome = ActiveLearner::new(&oracle, LearnerConfig::default())
            .infer()
            .unwrap();
        for (word, label) in examples.classified_words() {
            assert_eq!(outcome.hypothesis.evaluate(word), label);
        }
    }
}
