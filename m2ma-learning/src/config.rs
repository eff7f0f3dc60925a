use m2ma::gf2::Solver;
use tracing::warn;

/// The default bound on fixpoint iterations and learning rounds.
pub const MAX_ITERATIONS: usize = 100;
/// The default bound on the number of unknowns the exhaustive search is willing to enumerate.
pub const SEARCH_CAP: usize = 20;

/// Which learner [`crate::learner::learn`] runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Only the strict observation table engine, which needs complete information.
    Strict,
    /// Only the heuristic learner, which copes with missing labels.
    Heuristic,
    /// The strict engine first, and the heuristic learner if that fails or produces a
    /// hypothesis that misclassifies an example.
    #[default]
    Auto,
}

/// All knobs of the learners.
///
/// The defaults can be overridden through the environment variables `M2MA_MAX_ITERATIONS` and
/// `M2MA_SEARCH_CAP` by using [`LearnerConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerConfig {
    /// Caps the suffix length used for full-coverage columns of the strict engine. Without a
    /// cap all words up to the full coverage length become columns, and the rows of the longest
    /// words can then never be completed from a finite set of examples.
    pub max_suffix_length: Option<usize>,
    /// Bound on closure iterations and on rounds of counterexample guided expansion.
    pub max_iterations: usize,
    /// The exhaustive search gives up on more unknowns than this.
    pub search_cap: usize,
    /// The heuristic learner keeps a column if at least this fraction of the candidate rows
    /// know its entry, rounded down.
    pub column_fraction: f64,
    /// A column known in at least this many candidate rows is kept regardless of the fraction.
    pub column_minimum: usize,
    /// Solver for the transition systems of the heuristic learner.
    pub solver: Solver,
    /// Which learner to run.
    pub strategy: Strategy,
    /// Whether the result is minimized (under a regression check).
    pub minimize: bool,
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            max_suffix_length: None,
            max_iterations: MAX_ITERATIONS,
            search_cap: SEARCH_CAP,
            column_fraction: 1.0 / 3.0,
            column_minimum: 5,
            solver: Solver::Exact,
            strategy: Strategy::Auto,
            minimize: true,
        }
    }
}

fn env_override(variable: &str, default: usize) -> usize {
    match std::env::var(variable) {
        Ok(value) => value.parse().unwrap_or_else(|_| {
            warn!("ignoring {variable}={value}, it is not a number");
            default
        }),
        Err(_) => default,
    }
}

impl LearnerConfig {
    /// The default configuration with bounds taken from the environment where set.
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_iterations: env_override("M2MA_MAX_ITERATIONS", default.max_iterations),
            search_cap: env_override("M2MA_SEARCH_CAP", default.search_cap),
            ..default
        }
    }

    /// Sets [`LearnerConfig::max_suffix_length`].
    pub fn with_max_suffix_length(mut self, max_suffix_length: Option<usize>) -> Self {
        self.max_suffix_length = max_suffix_length;
        self
    }

    /// Sets [`LearnerConfig::max_iterations`].
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets [`LearnerConfig::search_cap`].
    pub fn with_search_cap(mut self, search_cap: usize) -> Self {
        self.search_cap = search_cap;
        self
    }

    /// Sets the column selection thresholds of the heuristic learner.
    pub fn with_column_selection(mut self, fraction: f64, minimum: usize) -> Self {
        self.column_fraction = fraction;
        self.column_minimum = minimum;
        self
    }

    /// Sets [`LearnerConfig::solver`].
    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    /// Sets [`LearnerConfig::strategy`].
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets [`LearnerConfig::minimize`].
    pub fn with_minimize(mut self, minimize: bool) -> Self {
        self.minimize = minimize;
        self
    }
}
