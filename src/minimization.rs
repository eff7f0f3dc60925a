use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::{
    gf2::{Basis, BitVector, Extension, Matrix},
    hypothesis::Hypothesis,
};

/// A service that turns a hypothesis into one that computes the same function with at most as
/// many states. Implementations are not trusted blindly, learners check the result against the
/// known examples before adopting it.
pub trait Minimizer {
    /// Returns a hypothesis for the same function, ideally of smaller dimension.
    fn minimize(&self, hypothesis: &Hypothesis) -> Hypothesis;
}

/// Minimizes a multiplicity automaton by a forward reduction onto the span of the reachable
/// state vectors `α · T_w`, followed by a backward reduction onto the span of the vectors
/// `T_w · γ`. The result is a minimal automaton for the same function. The zero function is
/// mapped to [`Hypothesis::trivial`].
///
/// # Example
/// ```
/// use m2ma::prelude::*;
/// let alphabet = Alphabet::new(["a"]).unwrap();
/// // two copies of the same single state
/// let redundant = Hypothesis::new(
///     alphabet,
///     BitVector::parse("10").unwrap(),
///     BitVector::parse("11").unwrap(),
///     vec![Matrix::parse(&["10", "01"]).unwrap()],
/// ).unwrap();
/// let minimal = Reduction.minimize(&redundant);
/// assert_eq!(minimal.dimension(), 1);
/// assert!(minimal.equivalent(&redundant));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Reduction;

impl Minimizer for Reduction {
    fn minimize(&self, hypothesis: &Hypothesis) -> Hypothesis {
        let start = std::time::Instant::now();
        let minimized = forward_reduction(hypothesis)
            .and_then(|reduced| forward_reduction(&reversed(&reduced)))
            .map(|reduced| reversed(&reduced))
            .unwrap_or_else(|| Hypothesis::trivial(hypothesis.alphabet().clone()));
        debug!(
            "reduced dimension from {} to {} in {}µs",
            hypothesis.dimension(),
            minimized.dimension(),
            start.elapsed().as_micros()
        );
        minimized
    }
}

/// The automaton with transposed matrices and swapped initial and final vectors. It assigns
/// to every word the value that `hypothesis` assigns to the reversed word, and a forward
/// reduction of it is a backward reduction of `hypothesis`.
fn reversed(hypothesis: &Hypothesis) -> Hypothesis {
    let alphabet = hypothesis.alphabet().clone();
    let transitions = alphabet
        .universe()
        .map(|sym| hypothesis.transition(sym).transpose())
        .collect();
    Hypothesis::new(
        alphabet,
        hypothesis.accepting().clone(),
        hypothesis.initial().clone(),
        transitions,
    )
    .unwrap_or_else(|_| hypothesis.clone())
}

/// Restricts `hypothesis` to the span of its reachable state vectors. Returns `None` if that
/// span is trivial, i.e. if the initial vector is zero.
fn forward_reduction(hypothesis: &Hypothesis) -> Option<Hypothesis> {
    let alphabet = hypothesis.alphabet();
    let mut span = Basis::new(hypothesis.dimension());
    let mut queue = VecDeque::new();
    if let Extension::Added(_) = span.insert(hypothesis.initial().clone()) {
        queue.push_back(hypothesis.initial().clone());
    }
    while let Some(state) = queue.pop_front() {
        for sym in alphabet.universe() {
            let successor = hypothesis.transition(sym).vec_mul(&state);
            if let Extension::Added(_) = span.insert(successor.clone()) {
                queue.push_back(successor);
            }
        }
    }

    let dimension = span.dimension();
    if dimension == 0 {
        return None;
    }
    trace!("forward span has dimension {dimension}");

    let initial = span.express(hypothesis.initial())?;
    let accepting: BitVector = span
        .originals()
        .map(|state| state.dot(hypothesis.accepting()))
        .collect();
    let mut transitions = Vec::with_capacity(alphabet.size());
    for sym in alphabet.universe() {
        let rows = span
            .originals()
            .map(|state| span.express(&hypothesis.transition(sym).vec_mul(state)))
            .collect::<Option<Vec<_>>>()?;
        transitions.push(Matrix::from_rows(rows, dimension));
    }
    Hypothesis::new(alphabet.clone(), initial, accepting, transitions).ok()
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::alphabet::Alphabet;

    fn random_hypothesis(rng: &mut StdRng, alphabet: &Alphabet, dimension: usize) -> Hypothesis {
        let mut bits = |n: usize| -> BitVector { (0..n).map(|_| rng.gen_bool(0.5)).collect() };
        let initial = bits(dimension);
        let accepting = bits(dimension);
        let transitions = alphabet
            .universe()
            .map(|_| {
                Matrix::from_rows(
                    (0..dimension).map(|_| bits(dimension)).collect(),
                    dimension,
                )
            })
            .collect();
        Hypothesis::new(alphabet.clone(), initial, accepting, transitions).unwrap()
    }

    #[test_log::test]
    fn reduction_preserves_the_function() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let mut rng = StdRng::seed_from_u64(0x6d32);
        for dimension in 1..=6 {
            for _ in 0..20 {
                let hypothesis = random_hypothesis(&mut rng, &alphabet, dimension);
                let minimal = Reduction.minimize(&hypothesis);
                assert!(minimal.dimension() <= hypothesis.dimension());
                assert_eq!(hypothesis.distinguishing_word(&minimal), None);
                for word in alphabet.words_up_to(5) {
                    assert_eq!(hypothesis.evaluate(&word), minimal.evaluate(&word));
                }
                // minimal automata are fixpoints
                assert_eq!(
                    Reduction.minimize(&minimal).dimension(),
                    minimal.dimension()
                );
            }
        }
    }

    #[test_log::test]
    fn zero_function_becomes_trivial() {
        let alphabet = Alphabet::new(["a"]).unwrap();
        let zero = Hypothesis::new(
            alphabet.clone(),
            BitVector::parse("110").unwrap(),
            BitVector::parse("000").unwrap(),
            vec![Matrix::identity(3)],
        )
        .unwrap();
        assert_eq!(Reduction.minimize(&zero), Hypothesis::trivial(alphabet));
    }
}
