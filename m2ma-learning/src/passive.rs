//! Learners that work from a fixed set of examples.
//!
//! The [`strict`] engine needs every table entry it looks at to be known and reports the
//! missing words otherwise. The [`heuristic`] learner tolerates missing labels: it prunes the
//! table to well-known rows and columns, fills what it can by [`inference`] and falls back to
//! an exhaustive [`search`] over the remaining unknowns.

pub mod heuristic;
pub mod inference;
pub mod search;
pub mod strict;
