use m2ma::prelude::*;
use tracing::{info, warn};

use crate::{
    config::{LearnerConfig, Strategy},
    error::LearningError,
    passive::{
        heuristic::{Degradation, HeuristicLearner, Status},
        strict::StrictLearner,
    },
    store::Store,
    verify::{find_counterexample, minimize_checked, MinimizationOutcome, Verification},
};

/// Everything [`learn`] found out.
#[derive(Debug, Clone)]
pub struct LearningOutcome {
    /// The learned hypothesis, minimized if that was requested and safe.
    pub hypothesis: Hypothesis,
    /// The learner that produced the hypothesis, either [`Strategy::Strict`] or
    /// [`Strategy::Heuristic`].
    pub engine: Strategy,
    /// Whether the hypothesis is consistent with the examples.
    pub status: Status,
    /// How the hypothesis does on the examples.
    pub verification: Verification,
    /// What minimization did, `None` if it was disabled.
    pub minimization: Option<MinimizationOutcome>,
}

/// Runs the strict engine and expands the table with the suffixes of misclassified examples
/// until the hypothesis is consistent, the expansion stalls or the iteration bound is hit.
fn learn_strict(store: &Store, config: &LearnerConfig) -> Result<(Hypothesis, Status), LearningError> {
    let mut forced = math::Set::default();
    for round in 1..=config.max_iterations {
        let hypothesis =
            StrictLearner::with_forced_columns(store, config, forced.iter().cloned()).infer()?;
        let Some((counterexample, _)) = find_counterexample(&hypothesis, store) else {
            return Ok((hypothesis, Status::Converged));
        };
        info!("strict round {round} misclassifies {counterexample:?}, forcing its suffixes");
        let before = forced.len();
        forced.extend(counterexample.suffixes());
        if forced.len() == before {
            return Ok((
                hypothesis,
                Status::Degraded(Degradation::Counterexample(counterexample)),
            ));
        }
    }
    Err(LearningError::DidNotConverge {
        iterations: config.max_iterations,
    })
}

fn learn_heuristic(store: &Store, config: &LearnerConfig) -> (Hypothesis, Status) {
    let outcome = HeuristicLearner::new(store, config).infer();
    (outcome.hypothesis, outcome.status)
}

/// Learns a hypothesis from the examples in `store` with the configured strategy.
///
/// With [`Strategy::Auto`] the strict engine runs first. If it fails or its hypothesis is not
/// consistent with the examples, the heuristic learner takes over. Errors are only returned by
/// [`Strategy::Strict`].
///
/// # Example
/// ```
/// use m2ma_learning::prelude::*;
/// let alphabet = Alphabet::new(["a"]).unwrap();
/// let store = Store::from_strings(alphabet, ["", "a a"], ["a", "a a a"]).unwrap();
/// let config = LearnerConfig::default().with_max_suffix_length(Some(1));
/// let outcome = learn(&store, &config).unwrap();
/// assert_eq!(outcome.engine, Strategy::Strict);
/// assert_eq!(outcome.hypothesis.dimension(), 2);
/// assert!(outcome.verification.is_consistent());
/// ```
pub fn learn(store: &Store, config: &LearnerConfig) -> Result<LearningOutcome, LearningError> {
    let start = std::time::Instant::now();
    let (hypothesis, engine, status) = match config.strategy {
        Strategy::Strict => {
            let (hypothesis, status) = learn_strict(store, config)?;
            (hypothesis, Strategy::Strict, status)
        }
        Strategy::Heuristic => {
            let (hypothesis, status) = learn_heuristic(store, config);
            (hypothesis, Strategy::Heuristic, status)
        }
        Strategy::Auto => match learn_strict(store, config) {
            Ok((hypothesis, Status::Converged)) => (hypothesis, Strategy::Strict, Status::Converged),
            Ok((_, Status::Degraded(reason))) => {
                info!("strict engine is inconsistent ({reason}), trying the heuristic learner");
                let (hypothesis, status) = learn_heuristic(store, config);
                (hypothesis, Strategy::Heuristic, status)
            }
            Err(error) => {
                info!("strict engine failed ({error}), trying the heuristic learner");
                let (hypothesis, status) = learn_heuristic(store, config);
                (hypothesis, Strategy::Heuristic, status)
            }
        },
    };
    if let Status::Degraded(reason) = &status {
        warn!("hypothesis is not consistent with the examples: {reason}");
    }

    let (hypothesis, minimization) = if config.minimize {
        let (hypothesis, outcome) = minimize_checked(hypothesis, &Reduction, store);
        (hypothesis, Some(outcome))
    } else {
        (hypothesis, None)
    };
    let verification = Verification::new(&hypothesis, store);
    info!(
        "learned hypothesis of dimension {} with {:?} engine in {}µs, accuracy {:.3}",
        hypothesis.dimension(),
        engine,
        start.elapsed().as_micros(),
        verification.accuracy()
    );
    Ok(LearningOutcome {
        hypothesis,
        engine,
        status,
        verification,
        minimization,
    })
}

/// How a passively learned hypothesis compares to a reference hypothesis.
#[derive(Debug, Clone)]
pub struct Comparison {
    /// The result of learning passively.
    pub outcome: LearningOutcome,
    /// The first example the passive hypothesis gets wrong, positives first.
    pub counterexample: Option<(Word, bool)>,
    /// A shortest word on which the reference and the passive hypothesis disagree.
    pub difference: Option<Word>,
}

impl Comparison {
    /// Returns `true` if the passive hypothesis computes the same function as the reference.
    pub fn is_equivalent(&self) -> bool {
        self.difference.is_none()
    }
}

/// Learns passively from `store` and compares the result with `reference`.
///
/// The store is typically the set of answers an [`crate::active::ActiveLearner`] collected,
/// and the reference is what it learned from them. If the answers contain everything the
/// table engine needs, both hypotheses are equivalent.
pub fn relearn(
    reference: &Hypothesis,
    store: &Store,
    config: &LearnerConfig,
) -> Result<Comparison, LearningError> {
    let outcome = learn(store, config)?;
    let counterexample = find_counterexample(&outcome.hypothesis, store);
    let difference = reference.distinguishing_word(&outcome.hypothesis);
    match &difference {
        None => info!("passive hypothesis is equivalent to the reference"),
        Some(word) => warn!(
            "passive hypothesis differs from the reference on \"{}\"",
            store.alphabet().show(word)
        ),
    }
    Ok(Comparison {
        outcome,
        counterexample,
        difference,
    })
}
