use m2ma::prelude::*;
use thiserror::Error;

use crate::store::StoreError;

/// The ways in which the table based learners can fail.
#[derive(Debug, Error)]
pub enum LearningError {
    /// The table cannot be closed because the labels of these words are unknown. This is the
    /// point where an active learner asks membership queries, a passive learner has to stop.
    #[error("insufficient information, the labels of {} words are missing", .missing.len())]
    InsufficientInformation {
        /// The words whose labels are needed, in the order they were first encountered.
        missing: Vec<Word>,
    },
    /// A row that should be expressible in terms of the basis is not. A closed table never
    /// produces this.
    #[error("row of {prefix:?} extended by {symbol:?} is not a combination of basis rows")]
    InconsistentBasis {
        /// The basis prefix, or ε when the initial vector could not be expressed.
        prefix: Word,
        /// The symbol by which the prefix was extended, if any.
        symbol: Option<Symbol>,
    },
    /// The iteration bound was hit.
    #[error("no fixpoint after {iterations} iterations")]
    DidNotConverge {
        /// The number of iterations that were performed.
        iterations: usize,
    },
    /// An oracle contradicted what is already known.
    #[error(transparent)]
    Store(#[from] StoreError),
}
