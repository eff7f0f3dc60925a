//! The table engine for complete information.
//!
//! Every entry the [`StrictLearner`] looks at has to be known. If some are not, it reports the
//! words whose labels are missing instead of guessing.

use itertools::Itertools;
use m2ma::prelude::*;
use tracing::{debug, info, trace};

use crate::{config::LearnerConfig, error::LearningError, store::Store, table::ObservationTable};

/// The observation table engine for complete information.
///
/// It extracts a table from the known examples, picks a basis of linearly independent rows and
/// grows the basis until the table is closed, i.e. until the row of `ε` and every one-symbol
/// extension `u·σ` of a basis prefix `u` is a combination of basis rows. From a closed table a
/// hypothesis is read off directly. If some cell that closedness depends on is unknown, the
/// engine stops and reports the missing words instead of guessing.
pub struct StrictLearner<'a> {
    store: &'a Store,
    config: &'a LearnerConfig,
    forced: math::Set<Word>,
    table: ObservationTable,
    basis: Basis,
    // prefixes of the basis rows, in basis order
    basis_prefixes: Vec<Word>,
    // true if no row could be added and we act as if there was a single zero row for ε
    synthetic: bool,
}

impl<'a> StrictLearner<'a> {
    /// Creates a learner for the given examples, the table is filled right away.
    pub fn new(store: &'a Store, config: &'a LearnerConfig) -> Self {
        Self::with_forced_columns(store, config, [])
    }

    /// Like [`StrictLearner::new`] but additionally uses the given suffixes as columns, which is
    /// how counterexamples enter the table.
    pub fn with_forced_columns<I>(store: &'a Store, config: &'a LearnerConfig, forced: I) -> Self
    where
        I: IntoIterator<Item = Word>,
    {
        let forced: math::Set<Word> = forced.into_iter().collect();
        let (prefixes, suffixes) = Self::extract(store, config, &forced);
        let table = ObservationTable::build(prefixes, suffixes, |w| store.lookup(w));
        let mut learner = Self {
            store,
            config,
            forced,
            basis: Basis::new(table.width()),
            table,
            basis_prefixes: vec![],
            synthetic: false,
        };
        learner.extract_basis();
        learner
    }

    /// Computes the candidate prefixes and suffixes, both sorted length-lexicographically.
    fn extract(
        store: &Store,
        config: &LearnerConfig,
        forced: &math::Set<Word>,
    ) -> (Vec<Word>, Vec<Word>) {
        let alphabet = store.alphabet();
        let coverage = store.max_full_coverage_length();
        let length = match (coverage, config.max_suffix_length) {
            (Some(covered), Some(cap)) => Some(covered.min(cap)),
            (covered, _) => covered,
        };
        trace!("full coverage up to {coverage:?}, using suffixes up to {length:?}");

        let symbols = || alphabet.universe().map(|sym| Word::new(vec![sym]));
        let mut suffixes: math::OrderedSet<Word> = std::iter::once(Word::epsilon())
            .chain(symbols())
            .chain(forced.iter().cloned())
            .collect();
        if let Some(length) = length {
            suffixes.extend(
                store
                    .suffixes()
                    .into_iter()
                    .filter(|suffix| suffix.len() <= length),
            );
            suffixes.extend(alphabet.words_up_to(length));
        }

        let prefixes: math::OrderedSet<Word> = std::iter::once(Word::epsilon())
            .chain(symbols())
            .chain(store.prefixes())
            .collect();
        (
            prefixes.into_iter().collect(),
            suffixes.into_iter().collect(),
        )
    }

    /// Offers every row to the basis in table order, rows with unknown entries are skipped.
    fn extract_basis(&mut self) {
        for i in 0..self.table.height() {
            if let Extension::Added(_) = self.basis.try_extend(&self.table.row(i)) {
                self.basis_prefixes.push(self.table.prefix(i).clone());
            }
        }
        self.synthetic = self.basis.is_empty();
        debug!(
            "initial basis of dimension {} from {} rows{}",
            self.basis.dimension(),
            self.table.height(),
            if self.synthetic { ", using synthetic basis" } else { "" }
        );
    }

    /// The rows that must be combinations of basis rows in a closed table.
    fn required_rows(&self) -> Vec<Word> {
        let alphabet = self.store.alphabet();
        let roots = if self.synthetic {
            vec![Word::epsilon()]
        } else {
            self.basis_prefixes.clone()
        };
        std::iter::once(Word::epsilon())
            .chain(
                roots
                    .iter()
                    .flat_map(|root| alphabet.universe().map(move |sym| root.append(sym))),
            )
            .unique()
            .collect()
    }

    /// Grows the basis until the table is closed. Fails with
    /// [`LearningError::InsufficientInformation`] if a required row has unknown entries once
    /// the basis stops growing.
    pub fn close(&mut self) -> Result<(), LearningError> {
        let start = std::time::Instant::now();
        let store = self.store;
        for iteration in 1..=self.config.max_iterations {
            let mut missing = math::Set::default();
            let mut grew = false;
            for required in self.required_rows() {
                let index = self.table.add_row(required.clone(), |w| store.lookup(w));
                let row = self.table.row(index);
                if !row.is_complete() {
                    missing.extend(self.table.unknown_words(index));
                    continue;
                }
                if let Extension::Added(_) = self.basis.try_extend(&row) {
                    trace!("row {:?} is not a combination of basis rows", required);
                    self.basis_prefixes.push(required);
                    self.synthetic = false;
                    grew = true;
                }
            }
            trace!(
                "closure iteration {iteration}, basis has dimension {}\n{:?}",
                self.basis.dimension(),
                self.table
            );
            if !grew {
                debug!(
                    "closure took {iteration} iterations and {}µs",
                    start.elapsed().as_micros()
                );
                return if missing.is_empty() {
                    Ok(())
                } else {
                    info!("cannot close table, {} labels are missing", missing.len());
                    Err(LearningError::InsufficientInformation {
                        missing: missing.into_iter().collect(),
                    })
                };
            }
        }
        Err(LearningError::DidNotConverge {
            iterations: self.config.max_iterations,
        })
    }

    fn complete_row(&self, prefix: &Word) -> Option<BitVector> {
        self.table.row_of(prefix).and_then(|row| row.to_complete())
    }

    /// Reads a hypothesis off the table, which needs to be closed.
    pub fn construct(&self) -> Result<Hypothesis, LearningError> {
        let alphabet = self.store.alphabet();
        if self.synthetic {
            return Ok(Hypothesis::trivial(alphabet.clone()));
        }
        let dimension = self.basis.dimension();
        let epsilon_column = self.table.column_index(&Word::epsilon()).ok_or(
            LearningError::InconsistentBasis {
                prefix: Word::epsilon(),
                symbol: None,
            },
        )?;
        let accepting: BitVector = self
            .basis
            .originals()
            .map(|row| row.get(epsilon_column))
            .collect();

        let mut transitions = Vec::with_capacity(alphabet.size());
        for sym in alphabet.universe() {
            let mut rows = Vec::with_capacity(dimension);
            for prefix in &self.basis_prefixes {
                let inconsistent = || LearningError::InconsistentBasis {
                    prefix: prefix.clone(),
                    symbol: Some(sym),
                };
                let row = self
                    .complete_row(&prefix.append(sym))
                    .ok_or_else(inconsistent)?;
                rows.push(self.basis.express(&row).ok_or_else(inconsistent)?);
            }
            transitions.push(Matrix::from_rows(rows, dimension));
        }

        let initial = match self.basis_prefixes.iter().position(Word::is_empty) {
            Some(position) => BitVector::unit(dimension, position),
            None => self
                .complete_row(&Word::epsilon())
                .and_then(|row| self.basis.express(&row))
                .ok_or(LearningError::InconsistentBasis {
                    prefix: Word::epsilon(),
                    symbol: None,
                })?,
        };

        Hypothesis::new(alphabet.clone(), initial, accepting, transitions).map_err(|_| {
            LearningError::InconsistentBasis {
                prefix: Word::epsilon(),
                symbol: None,
            }
        })
    }

    /// Runs closure and construction.
    pub fn infer(&mut self) -> Result<Hypothesis, LearningError> {
        let start = std::time::Instant::now();
        self.close()?;
        let hypothesis = self.construct()?;
        info!(
            "strict learner built hypothesis of dimension {} in {}µs",
            hypothesis.dimension(),
            start.elapsed().as_micros()
        );
        Ok(hypothesis)
    }

    /// The current table.
    pub fn table(&self) -> &ObservationTable {
        &self.table
    }

    /// The current basis.
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// The prefixes of the basis rows in basis order.
    pub fn basis_prefixes(&self) -> &[Word] {
        &self.basis_prefixes
    }

    /// The columns that were forced in addition to the extracted ones.
    pub fn forced_columns(&self) -> impl Iterator<Item = &Word> + '_ {
        self.forced.iter()
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

    use super::*;

    fn count_a(word: &Word) -> usize {
        word.symbols().filter(|s| s.index() == 0).count()
    }

    /// All words up to length 3 over {a, b}, labeled by whether they have an even number of `a`.
    fn even_a_store() -> Store {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let mut store = Store::new(alphabet.clone());
        for word in alphabet.words_up_to(3) {
            let label = count_a(&word) % 2 == 0;
            store.insert(word, label).unwrap();
        }
        store
    }

    #[test_log::test]
    fn learns_parity_of_a() {
        let store = even_a_store();
        let config = LearnerConfig::default().with_max_suffix_length(Some(1));
        let mut learner = StrictLearner::new(&store, &config);
        let hypothesis = learner.infer().unwrap();

        let alphabet = store.alphabet();
        assert_eq!(hypothesis.dimension(), 2);
        assert_eq!(
            learner.basis_prefixes(),
            &[Word::epsilon(), alphabet.parse_word("a").unwrap()]
        );
        assert_eq!(hypothesis.initial(), &BitVector::parse("10").unwrap());
        assert_eq!(hypothesis.accepting(), &BitVector::parse("10").unwrap());
        let a = alphabet.symbol("a").unwrap();
        let b = alphabet.symbol("b").unwrap();
        assert_eq!(hypothesis.transition(a), &Matrix::parse(&["01", "10"]).unwrap());
        assert_eq!(hypothesis.transition(b), &Matrix::identity(2));

        for (word, label) in store.classified_words() {
            assert_eq!(hypothesis.evaluate(word), label);
        }
        for word in alphabet.words_up_to(6) {
            assert_eq!(hypothesis.evaluate(&word), count_a(&word) % 2 == 0);
        }
    }

    #[test_log::test]
    fn uncapped_suffixes_leave_long_rows_open() {
        let store = even_a_store();
        let config = LearnerConfig::default();
        let mut learner = StrictLearner::new(&store, &config);
        // all words up to length 3 are columns, so the rows of `a` and `b` need labels of
        // words of length 4
        assert!(matches!(
            learner.infer(),
            Err(LearningError::InsufficientInformation { missing }) if missing.iter().all(|w| w.len() > 3)
        ));
    }

    #[test_log::test]
    fn reports_missing_words() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let store = Store::from_strings(alphabet.clone(), ["a a"], []).unwrap();
        let config = LearnerConfig::default();
        let mut learner = StrictLearner::new(&store, &config);
        let Err(LearningError::InsufficientInformation { missing }) = learner.infer() else {
            panic!("expected missing information");
        };
        let missing = missing.iter().map(|w| alphabet.render(w)).collect_vec();
        assert_eq!(missing, vec!["", "a", "b", "a b", "b a", "b b"]);
    }

    /// Starts the closure from the synthetic basis, so that every basis row has to be found
    /// by the growth step.
    fn learner_without_basis<'a>(store: &'a Store, config: &'a LearnerConfig) -> StrictLearner<'a> {
        let mut learner = StrictLearner::new(store, config);
        learner.basis = Basis::new(learner.table.width());
        learner.basis_prefixes.clear();
        learner.synthetic = true;
        learner
    }

    #[test_log::test]
    fn closure_grows_the_basis() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let store = Store::from_strings(alphabet.clone(), ["a a"], [])
            .unwrap()
            .with_closed_world(true);
        let word = |text: &str| alphabet.parse_word(text).unwrap();

        // rows ε, a, b and a a over the columns ε, a, b
        let config = LearnerConfig::default();
        assert_eq!(StrictLearner::new(&store, &config).table().height(), 4);

        // the first pass finds `a`, the second `a a`, the third confirms closedness
        let mut learner = learner_without_basis(&store, &config);
        learner.close().unwrap();
        assert_eq!(learner.basis_prefixes(), &[word("a"), word("a a")]);
        assert_eq!(learner.table().height(), 7);
        for extension in ["a b", "a a a", "a a b"] {
            assert!(learner.table().row_of(&word(extension)).is_some());
        }
        let hypothesis = learner.construct().unwrap();
        assert_eq!(hypothesis.dimension(), 2);
        assert_eq!(hypothesis.accepting(), &BitVector::parse("01").unwrap());

        let config = LearnerConfig::default().with_max_iterations(2);
        let mut learner = learner_without_basis(&store, &config);
        assert!(matches!(
            learner.close(),
            Err(LearningError::DidNotConverge { iterations: 2 })
        ));
        assert_eq!(learner.basis().dimension(), 2);
        // `a b` was added in the second pass, the successors of `a a` were never asked for
        assert_eq!(learner.table().height(), 5);

        let config = LearnerConfig::default().with_max_iterations(0);
        let mut learner = StrictLearner::new(&store, &config);
        assert!(matches!(
            learner.infer(),
            Err(LearningError::DidNotConverge { iterations: 0 })
        ));
    }

    #[test_log::test]
    fn empty_closed_world_gives_trivial_hypothesis() {
        let alphabet = Alphabet::new(["a"]).unwrap();
        let store = Store::new(alphabet.clone()).with_closed_world(true);
        let config = LearnerConfig::default();
        let hypothesis = StrictLearner::new(&store, &config).infer().unwrap();
        assert_eq!(hypothesis, Hypothesis::trivial(alphabet));
    }

    #[test_log::test]
    fn closed_tables_always_yield_hypotheses() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let config = LearnerConfig::default().with_max_suffix_length(Some(1));
        for _ in 0..50 {
            let mut store = Store::new(alphabet.clone()).with_closed_world(true);
            for word in alphabet.words_up_to(4) {
                if rng.gen_bool(0.3) {
                    store.insert(word, true).unwrap();
                }
            }
            let mut learner = StrictLearner::new(&store, &config);
            match learner.close() {
                Ok(()) => {
                    let hypothesis = learner.construct().unwrap();
                    for (j, suffix) in learner.table().suffixes().enumerate() {
                        // the ε row is reproduced on every column
                        assert_eq!(
                            Label::from_bit(hypothesis.evaluate(suffix)),
                            store.lookup(suffix)
                        );
                        // and so is every basis row, starting from its unit vector
                        let future = hypothesis.future_of(suffix);
                        for (i, row) in learner.basis().originals().enumerate() {
                            assert_eq!(future.get(i), row.get(j));
                        }
                    }
                }
                Err(error) => panic!("closed-world table could not be closed: {error}"),
            }
        }
    }

    #[test_log::test]
    fn basis_dimension_does_not_depend_on_row_order() {
        let store = even_a_store();
        let config = LearnerConfig::default().with_max_suffix_length(Some(2));
        let learner = StrictLearner::new(&store, &config);
        let table = learner.table();
        let mut order = (0..table.height()).collect_vec();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..10 {
            order.shuffle(&mut rng);
            let mut basis = Basis::new(table.width());
            for &i in &order {
                basis.try_extend(&table.row(i));
            }
            assert_eq!(basis.dimension(), learner.basis().dimension());
        }
    }
}
