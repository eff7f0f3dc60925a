//! Learning from examples with missing labels.
//!
//! The [`HeuristicLearner`] prunes the candidate table to rows and columns that are known well
//! enough, grows an invertible submatrix greedily and reads a hypothesis off it. When that
//! hypothesis misclassifies an example, unknown entries are searched exhaustively and the
//! suffixes of the counterexample are forced into the table.

use m2ma::prelude::*;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use super::{
    inference::{Knowledge, LinearInference},
    search::{exhaustive_search, Assembly, Cell, InitialVector, SearchError},
};
use crate::{
    config::LearnerConfig, store::Store, table::ObservationTable, verify::find_counterexample,
};

/// Why the heuristic learner returned a hypothesis that may be wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Degradation {
    /// No entry of the pruned table is known to be 1, so not even a one-dimensional invertible
    /// submatrix exists. The result is the trivial hypothesis.
    #[error("no invertible submatrix exists, the pruned table has no known 1")]
    SingularSubmatrix,
    /// The exhaustive search was skipped.
    #[error("{unknowns} unknown entries exceed the search cap of {cap}")]
    SearchSpaceTooLarge {
        /// The number of unknown entries in the last round.
        unknowns: usize,
        /// The configured cap.
        cap: usize,
    },
    /// Neither inference nor search produced a consistent hypothesis, and this example is
    /// still misclassified.
    #[error("the example {0:?} is misclassified")]
    Counterexample(Word),
}

/// Whether the heuristic learner found a hypothesis that is consistent with all examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The hypothesis classifies every example correctly.
    Converged,
    /// The best effort hypothesis, for the given reason.
    Degraded(Degradation),
}

/// The result of running the [`HeuristicLearner`].
#[derive(Debug, Clone)]
pub struct HeuristicOutcome {
    /// The learned hypothesis.
    pub hypothesis: Hypothesis,
    /// Whether it is consistent with the examples.
    pub status: Status,
    /// The number of rounds of counterexample guided expansion.
    pub rounds: usize,
    /// How many labels were derived by inference.
    pub derived: usize,
}

impl HeuristicOutcome {
    /// Returns `true` if the hypothesis is consistent with all examples.
    pub fn is_converged(&self) -> bool {
        matches!(self.status, Status::Converged)
    }
}

/// A learner that copes with missing labels.
///
/// Each round prunes the observation table to the columns that are known often enough and the
/// rows that are fully known on them, greedily selects a square invertible submatrix of the
/// pruned table and assembles a hypothesis from it. Entries the assembly needs but does not
/// know are derived by [`LinearInference`] where possible and set to 0 otherwise. If the result
/// misclassifies an example, the remaining unknowns are searched exhaustively. If that fails as
/// well, the suffixes of the first misclassified example become mandatory columns and the next
/// round starts.
pub struct HeuristicLearner<'a> {
    store: &'a Store,
    config: &'a LearnerConfig,
    knowledge: Knowledge<'a>,
    forced: math::Set<Word>,
}

impl<'a> HeuristicLearner<'a> {
    /// Creates a learner for the given examples.
    pub fn new(store: &'a Store, config: &'a LearnerConfig) -> Self {
        Self::with_forced_columns(store, config, [])
    }

    /// Like [`HeuristicLearner::new`] but with additional mandatory columns.
    pub fn with_forced_columns<I>(store: &'a Store, config: &'a LearnerConfig, forced: I) -> Self
    where
        I: IntoIterator<Item = Word>,
    {
        Self {
            store,
            config,
            knowledge: Knowledge::new(store),
            forced: forced.into_iter().collect(),
        }
    }

    /// The examples together with everything derived so far.
    pub fn knowledge(&self) -> &Knowledge<'a> {
        &self.knowledge
    }

    /// The mandatory columns besides ε and the single symbols.
    pub fn forced_columns(&self) -> impl Iterator<Item = &Word> + '_ {
        self.forced.iter()
    }

    fn is_mandatory(&self, column: &Word) -> bool {
        column.len() <= 1 || self.forced.contains(column)
    }

    /// The table over all prefixes and suffixes of known words, the forced columns included.
    fn candidates(&self) -> ObservationTable {
        let alphabet = self.store.alphabet();
        let prefixes: math::OrderedSet<Word> = std::iter::once(Word::epsilon())
            .chain(self.store.prefixes())
            .collect();
        let suffixes: math::OrderedSet<Word> = std::iter::once(Word::epsilon())
            .chain(alphabet.universe().map(|sym| Word::new(vec![sym])))
            .chain(self.store.suffixes())
            .chain(self.forced.iter().cloned())
            .collect();
        ObservationTable::build(
            prefixes.into_iter().collect(),
            suffixes.into_iter().collect(),
            |w| self.knowledge.label(w),
        )
    }

    /// Keeps the columns that are known often enough and the rows that are fully known on
    /// them. If no row survives, the row of ε is kept regardless.
    fn prune(&self) -> ObservationTable {
        let table = self.candidates();
        let threshold = (table.height() as f64 * self.config.column_fraction).floor() as usize;
        let columns: Vec<usize> = (0..table.width())
            .filter(|&j| {
                let known = table.known_in_column(j);
                known >= threshold
                    || known >= self.config.column_minimum
                    || self.is_mandatory(table.suffix(j))
            })
            .collect();
        let mut rows: Vec<usize> = (0..table.height())
            .filter(|&i| table.is_known_on(i, &columns))
            .collect();
        if rows.is_empty() {
            debug!("no row is known on all selected columns, keeping only ε");
            rows.extend(table.row_index(&Word::epsilon()));
        }
        let pruned = table.restrict(&rows, &columns);
        trace!(
            "pruned {}x{} table to {}x{}\n{:?}",
            table.height(),
            table.width(),
            pruned.height(),
            pruned.width(),
            pruned
        );
        pruned
    }

    fn submatrix(pruned: &ObservationTable, rows: &[usize], columns: &[usize]) -> Matrix {
        Matrix::from_rows(
            rows.iter()
                .map(|&i| {
                    columns
                        .iter()
                        .map(|&j| pruned.label(i, j) == Label::Accept)
                        .collect()
                })
                .collect(),
            columns.len(),
        )
    }

    /// The first known 1 in the row of ε, or else the first known 1 in row major order.
    fn seed(pruned: &ObservationTable) -> Option<(usize, usize)> {
        let first_one = |i: usize| {
            (0..pruned.width())
                .find(|&j| pruned.label(i, j) == Label::Accept)
                .map(|j| (i, j))
        };
        pruned
            .row_index(&Word::epsilon())
            .and_then(first_one)
            .or_else(|| (0..pruned.height()).find_map(first_one))
    }

    /// Counts the entries `r·σ·c` that are known if row `r` and column `c` join the selection:
    /// those of the new row on all selected columns and those of the selected rows on the new
    /// column.
    fn extension_score(
        &self,
        pruned: &ObservationTable,
        rows: &[usize],
        columns: &[usize],
        r: usize,
        c: usize,
    ) -> usize {
        let known = |word: Word| self.knowledge.label(&word).is_known();
        let (new_row, new_column) = (pruned.prefix(r), pruned.suffix(c));
        let mut score = 0;
        for sym in self.store.alphabet().universe() {
            let extended = new_row.append(sym);
            score += columns
                .iter()
                .chain(std::iter::once(&c))
                .filter(|&&j| known(extended.concat(pruned.suffix(j))))
                .count();
            score += rows
                .iter()
                .filter(|&&i| known(pruned.prefix(i).append(sym).concat(new_column)))
                .count();
        }
        score
    }

    /// Greedily grows an invertible submatrix of the pruned table, returns the selected row and
    /// column indices. Unknown entries count as 0.
    fn select(&self, pruned: &ObservationTable) -> Option<(Vec<usize>, Vec<usize>)> {
        let (r, c) = Self::seed(pruned)?;
        let (mut rows, mut columns) = (vec![r], vec![c]);
        loop {
            let mut best: Option<(usize, usize, usize)> = None;
            for r in (0..pruned.height()).filter(|r| !rows.contains(r)) {
                for c in (0..pruned.width()).filter(|c| !columns.contains(c)) {
                    let (mut rows_ext, mut columns_ext) = (rows.clone(), columns.clone());
                    rows_ext.push(r);
                    columns_ext.push(c);
                    if !Self::submatrix(pruned, &rows_ext, &columns_ext).is_invertible() {
                        continue;
                    }
                    let score = self.extension_score(pruned, &rows, &columns, r, c);
                    if best.map_or(true, |(top, _, _)| score > top) {
                        best = Some((score, r, c));
                    }
                }
            }
            match best {
                Some((_, r, c)) => {
                    rows.push(r);
                    columns.push(c);
                }
                None => return Some((rows, columns)),
            }
        }
    }

    /// Builds the assembly for the selection. Every entry that is neither known nor inferable
    /// is set to 0 and reported, base entries first.
    fn assemble(
        &self,
        pruned: &ObservationTable,
        rows: &[usize],
        columns: &[usize],
    ) -> (Assembly, Vec<Cell>) {
        let alphabet = self.store.alphabet();
        let prefixes: Vec<Word> = rows.iter().map(|&i| pruned.prefix(i).clone()).collect();
        let suffixes: Vec<Word> = columns.iter().map(|&j| pruned.suffix(j).clone()).collect();
        let all_columns: Vec<Word> = pruned.suffixes().cloned().collect();
        let inference = LinearInference::new(&self.knowledge, &prefixes, &all_columns);
        let dimension = prefixes.len();

        let entry = |prefix: &Word, suffix: &Word, cell: Cell, unknowns: &mut Vec<Cell>| {
            match self
                .knowledge
                .label(&prefix.concat(suffix))
                .bit()
                .or_else(|| inference.infer(prefix, suffix))
            {
                Some(bit) => bit,
                None => {
                    unknowns.push(cell);
                    false
                }
            }
        };

        let mut unknowns = vec![];
        let mut base = Matrix::zeros(dimension, dimension);
        for (i, prefix) in prefixes.iter().enumerate() {
            for (j, suffix) in suffixes.iter().enumerate() {
                let cell = Cell::Base { row: i, column: j };
                base.set(i, j, entry(prefix, suffix, cell, &mut unknowns));
            }
        }
        let accepting: BitVector = prefixes
            .iter()
            .enumerate()
            .map(|(i, prefix)| entry(prefix, &Word::epsilon(), Cell::Final { row: i }, &mut unknowns))
            .collect();
        let initial = match prefixes.iter().position(Word::is_empty) {
            Some(position) => InitialVector::Unit(position),
            None => InitialVector::Columns(
                suffixes
                    .iter()
                    .enumerate()
                    .map(|(j, suffix)| {
                        let cell = Cell::Initial { column: j };
                        entry(&Word::epsilon(), suffix, cell, &mut unknowns)
                    })
                    .collect(),
            ),
        };

        let mut blocks = Vec::with_capacity(alphabet.size());
        for symbol in alphabet.universe() {
            let mut block = Matrix::zeros(dimension, dimension);
            for (i, prefix) in prefixes.iter().enumerate() {
                let extended = prefix.append(symbol);
                for (j, suffix) in suffixes.iter().enumerate() {
                    let cell = Cell::Transition {
                        symbol,
                        row: i,
                        column: j,
                    };
                    block.set(i, j, entry(&extended, suffix, cell, &mut unknowns));
                }
            }
            blocks.push(block);
        }

        (
            Assembly::new(alphabet.clone(), base, blocks, accepting, initial),
            unknowns,
        )
    }

    fn finish(
        &self,
        hypothesis: Hypothesis,
        status: Status,
        rounds: usize,
        start: std::time::Instant,
    ) -> HeuristicOutcome {
        info!(
            "heuristic learner built hypothesis of dimension {} in {} rounds and {}µs",
            hypothesis.dimension(),
            rounds,
            start.elapsed().as_micros()
        );
        HeuristicOutcome {
            hypothesis,
            status,
            rounds,
            derived: self.knowledge.derived_count(),
        }
    }

    /// Runs rounds until a hypothesis is consistent with all examples, a counterexample adds no
    /// new columns or the iteration bound is reached.
    pub fn infer(&mut self) -> HeuristicOutcome {
        let start = std::time::Instant::now();
        let alphabet = self.store.alphabet().clone();
        let mut round = 0;
        loop {
            round += 1;
            let pruned = self.prune();
            let Some((rows, columns)) = self.select(&pruned) else {
                warn!("pruned table has no known 1, falling back to the trivial hypothesis");
                return self.finish(
                    Hypothesis::trivial(alphabet),
                    Status::Degraded(Degradation::SingularSubmatrix),
                    round,
                    start,
                );
            };
            let (assembly, unknowns) = self.assemble(&pruned, &rows, &columns);
            debug!(
                "round {round}: selected dimension {} with {} unknown entries",
                assembly.dimension(),
                unknowns.len()
            );

            let hypothesis = assembly
                .hypothesis(self.config.solver)
                .unwrap_or_else(|| Hypothesis::trivial(alphabet.clone()));
            let Some((counterexample, _)) = find_counterexample(&hypothesis, self.store) else {
                return self.finish(hypothesis, Status::Converged, round, start);
            };
            debug!("hypothesis misclassifies {counterexample:?}, searching unknown entries");

            let degradation = match exhaustive_search(
                &assembly,
                &unknowns,
                self.store,
                self.config.solver,
                self.config.search_cap,
            ) {
                Ok(Some(found)) => return self.finish(found, Status::Converged, round, start),
                Ok(None) => Degradation::Counterexample(counterexample.clone()),
                Err(SearchError::TooLarge { unknowns, cap }) => {
                    Degradation::SearchSpaceTooLarge { unknowns, cap }
                }
            };

            let before = self.forced.len();
            self.forced.extend(counterexample.suffixes());
            if self.forced.len() == before || round >= self.config.max_iterations {
                warn!("giving up after {round} rounds: {degradation}");
                return self.finish(hypothesis, Status::Degraded(degradation), round, start);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn even_a_store(skip: &[&str]) -> Store {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let skipped: Vec<Word> = skip
            .iter()
            .map(|text| alphabet.parse_word(text).unwrap())
            .collect();
        let mut store = Store::new(alphabet.clone());
        for word in alphabet.words_up_to(3) {
            if !skipped.contains(&word) {
                let label = word.symbols().filter(|s| s.index() == 0).count() % 2 == 0;
                store.insert(word, label).unwrap();
            }
        }
        store
    }

    #[test_log::test]
    fn complete_information_converges() {
        let store = even_a_store(&[]);
        let config = LearnerConfig::default();
        let outcome = HeuristicLearner::new(&store, &config).infer();
        assert!(outcome.is_converged());
        assert_eq!(outcome.rounds, 1);
        assert_eq!(outcome.hypothesis.dimension(), 2);
        for word in store.alphabet().words_up_to(6) {
            let even = word.symbols().filter(|s| s.index() == 0).count() % 2 == 0;
            assert_eq!(outcome.hypothesis.evaluate(&word), even);
        }
    }

    #[test_log::test]
    fn derives_missing_transition_entries() {
        let store = even_a_store(&["a b a"]);
        let config = LearnerConfig::default();
        let mut learner = HeuristicLearner::new(&store, &config);
        let outcome = learner.infer();
        assert!(outcome.is_converged());
        assert!(outcome.derived >= 1);
        assert!(find_counterexample(&outcome.hypothesis, &store).is_none());
    }

    #[test_log::test]
    fn all_negative_gives_trivial_hypothesis() {
        let alphabet = Alphabet::new(["a"]).unwrap();
        let store = Store::from_strings(alphabet.clone(), [], ["", "a"]).unwrap();
        let config = LearnerConfig::default();
        let outcome = HeuristicLearner::new(&store, &config).infer();
        assert_eq!(
            outcome.status,
            Status::Degraded(Degradation::SingularSubmatrix)
        );
        assert_eq!(outcome.hypothesis, Hypothesis::trivial(alphabet));
    }

    #[test_log::test]
    fn search_fills_unknown_transitions() {
        let alphabet = Alphabet::new(["a"]).unwrap();
        let store = Store::from_strings(alphabet.clone(), ["", "a a a"], []).unwrap();
        let config = LearnerConfig::default();
        let outcome = HeuristicLearner::new(&store, &config).infer();
        assert!(outcome.is_converged());
        let a = alphabet.symbol("a").unwrap();
        assert_eq!(outcome.hypothesis.transition(a), &Matrix::identity(1));

        let capped = LearnerConfig::default().with_search_cap(0);
        let mut learner = HeuristicLearner::new(&store, &capped);
        let outcome = learner.infer();
        assert_eq!(
            outcome.status,
            Status::Degraded(Degradation::SearchSpaceTooLarge {
                unknowns: 1,
                cap: 0
            })
        );
        // the first round forces the suffixes of `a a a`, the second one adds nothing new
        assert_eq!(outcome.rounds, 2);
        assert_eq!(learner.forced_columns().count(), 4);
    }
}
