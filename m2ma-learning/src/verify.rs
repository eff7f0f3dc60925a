use m2ma::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::Store;

/// Returns the first known example that `hypothesis` gets wrong, together with its correct
/// label. Positive examples are checked before negative ones, each in insertion order.
pub fn find_counterexample(hypothesis: &Hypothesis, store: &Store) -> Option<(Word, bool)> {
    store
        .classified_words()
        .find(|(word, label)| hypothesis.evaluate(word) != *label)
        .map(|(word, label)| (word.clone(), label))
}

/// How well a hypothesis does on the known examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Positive examples that are accepted.
    pub positive_correct: usize,
    /// All positive examples.
    pub positive_total: usize,
    /// Negative examples that are rejected.
    pub negative_correct: usize,
    /// All negative examples.
    pub negative_total: usize,
    /// The examples that are classified wrongly, positive ones first.
    pub misclassified: Vec<Word>,
}

impl Verification {
    /// Evaluates `hypothesis` on every known example.
    pub fn new(hypothesis: &Hypothesis, store: &Store) -> Self {
        let mut out = Self {
            positive_correct: 0,
            positive_total: 0,
            negative_correct: 0,
            negative_total: 0,
            misclassified: vec![],
        };
        for (word, label) in store.classified_words() {
            let correct = hypothesis.evaluate(word) == label;
            match (label, correct) {
                (true, true) => out.positive_correct += 1,
                (false, true) => out.negative_correct += 1,
                _ => out.misclassified.push(word.clone()),
            }
            if label {
                out.positive_total += 1;
            } else {
                out.negative_total += 1;
            }
        }
        out
    }

    /// Returns `true` if every example is classified correctly.
    pub fn is_consistent(&self) -> bool {
        self.misclassified.is_empty()
    }

    /// The fraction of correctly classified examples, `1.0` if there are none.
    pub fn accuracy(&self) -> f64 {
        let total = self.positive_total + self.negative_total;
        if total == 0 {
            1.0
        } else {
            (self.positive_correct + self.negative_correct) as f64 / total as f64
        }
    }
}

/// A minimized hypothesis that gets a known example wrong although the original did not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("minimized hypothesis misclassifies {word:?}, which should be {}", if *.expected { "accepted" } else { "rejected" })]
pub struct MinimizationRegression {
    /// The misclassified example.
    pub word: Word,
    /// Its correct label.
    pub expected: bool,
}

/// What happened when a hypothesis was minimized under supervision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinimizationOutcome {
    /// The minimized hypothesis is smaller and was adopted.
    Adopted {
        /// Dimension before minimization.
        from: usize,
        /// Dimension after minimization.
        to: usize,
    },
    /// Minimization did not reduce the dimension, the original is kept.
    NotSmaller,
    /// The original hypothesis already misclassifies examples, minimization was not attempted.
    Skipped,
    /// The minimized hypothesis misclassifies an example, the original is kept.
    Regression(MinimizationRegression),
}

/// Runs `minimizer` on `hypothesis` but only adopts the result if it is strictly smaller and
/// still classifies every known example correctly.
pub fn minimize_checked<M: Minimizer>(
    hypothesis: Hypothesis,
    minimizer: &M,
    store: &Store,
) -> (Hypothesis, MinimizationOutcome) {
    if find_counterexample(&hypothesis, store).is_some() {
        debug!("not minimizing a hypothesis that misclassifies examples");
        return (hypothesis, MinimizationOutcome::Skipped);
    }
    let minimized = minimizer.minimize(&hypothesis);
    if let Some((word, expected)) = find_counterexample(&minimized, store) {
        let regression = MinimizationRegression { word, expected };
        warn!("discarding minimized hypothesis: {regression}");
        return (hypothesis, MinimizationOutcome::Regression(regression));
    }
    let (from, to) = (hypothesis.dimension(), minimized.dimension());
    if to < from {
        info!("minimized hypothesis from dimension {from} to {to}");
        (minimized, MinimizationOutcome::Adopted { from, to })
    } else {
        (hypothesis, MinimizationOutcome::NotSmaller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parity_store() -> Store {
        Store::from_strings(
            Alphabet::new(["a", "b"]).unwrap(),
            ["", "a a", "b"],
            ["a", "a b"],
        )
        .unwrap()
    }

    /// Even number of `a`, but with an unreachable third state.
    fn redundant_parity(alphabet: &Alphabet) -> Hypothesis {
        Hypothesis::new(
            alphabet.clone(),
            BitVector::parse("100").unwrap(),
            BitVector::parse("101").unwrap(),
            vec![
                Matrix::parse(&["010", "100", "001"]).unwrap(),
                Matrix::identity(3),
            ],
        )
        .unwrap()
    }

    struct Forgetful;

    impl Minimizer for Forgetful {
        fn minimize(&self, hypothesis: &Hypothesis) -> Hypothesis {
            Hypothesis::trivial(hypothesis.alphabet().clone())
        }
    }

    #[test_log::test]
    fn counterexamples_and_counts() {
        let store = parity_store();
        let trivial = Hypothesis::trivial(store.alphabet().clone());
        let (word, label) = find_counterexample(&trivial, &store).unwrap();
        assert!(word.is_empty());
        assert!(label);

        let verification = Verification::new(&trivial, &store);
        assert_eq!(verification.positive_correct, 0);
        assert_eq!(verification.negative_correct, 2);
        assert_eq!(verification.misclassified.len(), 3);
        assert!((verification.accuracy() - 0.4).abs() < 1e-9);

        let parity = redundant_parity(store.alphabet());
        assert!(find_counterexample(&parity, &store).is_none());
        assert!(Verification::new(&parity, &store).is_consistent());
    }

    #[test_log::test]
    fn supervised_minimization() {
        let store = parity_store();
        let parity = redundant_parity(store.alphabet());

        let (minimized, outcome) = minimize_checked(parity.clone(), &Reduction, &store);
        assert_eq!(outcome, MinimizationOutcome::Adopted { from: 3, to: 2 });
        assert!(minimized.equivalent(&parity));

        let (kept, outcome) = minimize_checked(parity.clone(), &Forgetful, &store);
        assert_eq!(kept, parity);
        assert!(matches!(
            outcome,
            MinimizationOutcome::Regression(MinimizationRegression { expected: true, .. })
        ));

        let (_, outcome) = minimize_checked(minimized, &Reduction, &store);
        assert_eq!(outcome, MinimizationOutcome::NotSmaller);

        let trivial = Hypothesis::trivial(store.alphabet().clone());
        let (_, outcome) = minimize_checked(trivial, &Reduction, &store);
        assert_eq!(outcome, MinimizationOutcome::Skipped);
    }
}
