//! Learning GF(2) multiplicity automata.
//!
//! Passive learning starts from a [`store::Store`] of labeled examples. The [`passive::strict`]
//! engine builds an observation table and reads a hypothesis off it when all labels it needs
//! are known, the [`passive::heuristic`] learner copes with missing labels. [`learner::learn`]
//! combines both and verifies and minimizes the result.
//!
//! Active learning is done by the [`active::ActiveLearner`], which asks an [`active::oracle::Oracle`]
//! for the labels the strict engine is missing and for counterexamples to its hypotheses.
#![deny(missing_docs)]

/// Re-exports everything that is needed to learn, including the prelude of `m2ma`.
pub mod prelude {
    pub use super::{
        active::{
            dfa::{Dfa, DfaOracle, DotError},
            oracle::{Counterexample, Oracle, RandomTestingOracle, SampleOracle},
            ActiveLearner, ActiveOutcome,
        },
        config::{LearnerConfig, Strategy},
        error::LearningError,
        learner::{learn, relearn, Comparison, LearningOutcome},
        passive::{
            heuristic::{Degradation, HeuristicLearner, HeuristicOutcome, Status},
            strict::StrictLearner,
        },
        store::{Store, StoreError},
        table::ObservationTable,
        verify::{
            find_counterexample, minimize_checked, MinimizationOutcome, MinimizationRegression,
            Verification,
        },
    };
    pub use m2ma::prelude::*;
}

/// Labeled examples.
pub mod store;

/// Observation tables with possibly unknown entries.
pub mod table;

/// Configuration of the learners.
pub mod config;

/// Errors of the table based learners.
pub mod error;

pub mod passive;

pub mod active;

/// Checking hypotheses against examples, and minimization under supervision.
pub mod verify;

/// The top level entry point for passive learning.
pub mod learner;
pub use learner::learn;
