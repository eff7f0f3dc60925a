use std::{collections::VecDeque, fmt::Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::{
    alphabet::{Alphabet, AlphabetError, Symbol},
    gf2::{Basis, BitVector, Extension, Matrix},
    math,
    word::Word,
};

/// Errors that can occur when assembling a [`Hypothesis`] from its parts or when reading one
/// from JSON.
#[derive(Debug, Error)]
pub enum HypothesisError {
    /// Some part does not have the dimension of the initial vector.
    #[error("{what} has dimension {found} but the hypothesis has dimension {expected}")]
    DimensionMismatch {
        /// Which part is off.
        what: String,
        /// The dimension of the initial vector.
        expected: usize,
        /// The dimension that was found.
        found: usize,
    },
    /// The number of transition matrices differs from the alphabet size, or a symbol has no
    /// matrix in serialized form.
    #[error("no transition matrix for symbol \"{0}\"")]
    MissingTransitions(String),
    /// A serialized bit vector contains something other than `0` and `1`.
    #[error("\"{0}\" is not a bit string")]
    InvalidBits(String),
    /// The serialized alphabet is invalid.
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
    /// The input is not valid JSON for a hypothesis.
    #[error("could not read hypothesis: {0}")]
    Json(#[from] serde_json::Error),
}

/// A multiplicity automaton over GF(2).
///
/// It consists of an initial row vector `α`, a final column vector `γ` and one `d × d`
/// transition matrix `T_a` for every symbol `a`. The value it assigns to a word `w = a_1 … a_n`
/// is `α · T_{a_1} · … · T_{a_n} · γ`, computed with xor as addition and and as multiplication.
///
/// # Example
/// ```
/// use m2ma::prelude::*;
/// let alphabet = Alphabet::new(["a", "b"]).unwrap();
/// let hypothesis = Hypothesis::trivial(alphabet.clone());
/// assert_eq!(hypothesis.dimension(), 1);
/// assert!(!hypothesis.evaluate(&alphabet.parse_word("a b").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SerializedHypothesis", into = "SerializedHypothesis")]
pub struct Hypothesis {
    alphabet: Alphabet,
    initial: BitVector,
    accepting: BitVector,
    transitions: Vec<Matrix>,
}

impl Hypothesis {
    /// Assembles a hypothesis, `transitions` has one matrix per symbol in alphabet order.
    pub fn new(
        alphabet: Alphabet,
        initial: BitVector,
        accepting: BitVector,
        transitions: Vec<Matrix>,
    ) -> Result<Self, HypothesisError> {
        let dimension = initial.len();
        let check = |what: String, found: usize| {
            if found == dimension {
                Ok(())
            } else {
                Err(HypothesisError::DimensionMismatch {
                    what,
                    expected: dimension,
                    found,
                })
            }
        };
        check("final vector".into(), accepting.len())?;
        if transitions.len() != alphabet.size() {
            let symbol = alphabet
                .names()
                .nth(transitions.len())
                .unwrap_or_default()
                .to_string();
            return Err(HypothesisError::MissingTransitions(symbol));
        }
        for (symbol, matrix) in alphabet.universe().zip(&transitions) {
            let what = format!("transition matrix of {}", alphabet.name(symbol));
            check(what.clone(), matrix.height())?;
            check(what, matrix.width())?;
        }
        Ok(Self {
            alphabet,
            initial,
            accepting,
            transitions,
        })
    }

    /// The one-dimensional automaton that rejects every word.
    pub fn trivial(alphabet: Alphabet) -> Self {
        let transitions = alphabet.universe().map(|_| Matrix::zeros(1, 1)).collect();
        Self {
            alphabet,
            initial: BitVector::unit(1, 0),
            accepting: BitVector::zeros(1),
            transitions,
        }
    }

    /// The alphabet the hypothesis reads.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of states, i.e. the length of the initial vector.
    pub fn dimension(&self) -> usize {
        self.initial.len()
    }

    /// The initial row vector.
    pub fn initial(&self) -> &BitVector {
        &self.initial
    }

    /// The final column vector.
    pub fn accepting(&self) -> &BitVector {
        &self.accepting
    }

    /// The transition matrix of `symbol`.
    pub fn transition(&self, symbol: Symbol) -> &Matrix {
        &self.transitions[symbol.index()]
    }

    /// Computes the row vector `α · T_w`.
    pub fn state_after(&self, word: &Word) -> BitVector {
        word.symbols().fold(self.initial.clone(), |state, symbol| {
            self.transition(symbol).vec_mul(&state)
        })
    }

    /// Computes the column vector `T_w · γ`.
    pub fn future_of(&self, word: &Word) -> BitVector {
        word.symbols()
            .rev()
            .fold(self.accepting.clone(), |future, symbol| {
                self.transition(symbol).mul_vec(&future)
            })
    }

    /// Computes the value the automaton assigns to `word`.
    pub fn evaluate(&self, word: &Word) -> bool {
        self.state_after(word).dot(&self.accepting)
    }

    /// Searches for a word on which `self` and `other` disagree. Words are explored shortest
    /// first in the difference automaton, whose states are the pairs of state vectors. Only
    /// pairs that are linearly independent of the pairs seen so far need to be extended, so
    /// this terminates after at most `self.dimension() + other.dimension()` expansions.
    pub fn distinguishing_word(&self, other: &Hypothesis) -> Option<Word> {
        debug_assert_eq!(self.alphabet, other.alphabet);
        let (left, right) = (self.dimension(), other.dimension());
        let combine = |x: &BitVector, y: &BitVector| -> BitVector {
            x.iter().chain(y.iter()).collect()
        };
        let differs = |state: &BitVector| {
            let (x, y) = split_at(state, left);
            x.dot(&self.accepting) != y.dot(&other.accepting)
        };

        let mut seen = Basis::new(left + right);
        let mut queue = VecDeque::new();
        let start = combine(&self.initial, &other.initial);
        if differs(&start) {
            return Some(Word::epsilon());
        }
        if let Extension::Added(_) = seen.insert(start.clone()) {
            queue.push_back((Word::epsilon(), start));
        }

        while let Some((word, state)) = queue.pop_front() {
            let (x, y) = split_at(&state, left);
            for symbol in self.alphabet.universe() {
                let successor = combine(
                    &self.transition(symbol).vec_mul(&x),
                    &other.transition(symbol).vec_mul(&y),
                );
                let extended = word.append(symbol);
                if differs(&successor) {
                    trace!("found distinguishing word {:?}", extended);
                    return Some(extended);
                }
                if let Extension::Added(_) = seen.insert(successor.clone()) {
                    queue.push_back((extended, successor));
                }
            }
        }
        None
    }

    /// Returns `true` if both hypotheses compute the same function.
    pub fn equivalent(&self, other: &Hypothesis) -> bool {
        self.distinguishing_word(other).is_none()
    }

    /// Serializes the hypothesis as pretty printed JSON.
    pub fn to_json(&self) -> Result<String, HypothesisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a hypothesis from the JSON format produced by [`Hypothesis::to_json`].
    pub fn from_json(text: &str) -> Result<Self, HypothesisError> {
        Ok(serde_json::from_str(text)?)
    }
}

fn split_at(state: &BitVector, position: usize) -> (BitVector, BitVector) {
    (
        (0..position).map(|i| state.get(i)).collect(),
        (position..state.len()).map(|i| state.get(i)).collect(),
    )
}

impl Display for Hypothesis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            ["State", "α", "γ"]
                .into_iter()
                .map(String::from)
                .chain(self.alphabet.names().map(|name| format!("T[{name}]"))),
        );
        for i in 0..self.dimension() {
            let bit = |b: bool| if b { "1" } else { "0" }.to_string();
            let row = [
                format!("q{i}"),
                bit(self.initial.get(i)),
                bit(self.accepting.get(i)),
            ]
            .into_iter()
            .chain(self.transitions.iter().map(|t| t.row(i).to_string()));
            builder.push_record(row);
        }
        write!(
            f,
            "{}",
            builder.build().with(tabled::settings::Style::rounded())
        )
    }
}

/// The on-disk form of a [`Hypothesis`], bit vectors are strings like `"0110"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedHypothesis {
    alphabet: Vec<String>,
    dimension: usize,
    initial: String,
    #[serde(rename = "final")]
    accepting: String,
    transitions: math::Map<String, Vec<String>>,
}

impl From<Hypothesis> for SerializedHypothesis {
    fn from(value: Hypothesis) -> Self {
        let transitions = value
            .alphabet
            .universe()
            .map(|sym| {
                (
                    value.alphabet.name(sym).to_string(),
                    value.transition(sym).to_strings(),
                )
            })
            .collect();
        Self {
            alphabet: value.alphabet.names().map(String::from).collect(),
            dimension: value.dimension(),
            initial: value.initial.to_string(),
            accepting: value.accepting.to_string(),
            transitions,
        }
    }
}

impl TryFrom<SerializedHypothesis> for Hypothesis {
    type Error = HypothesisError;

    fn try_from(value: SerializedHypothesis) -> Result<Self, Self::Error> {
        let alphabet = Alphabet::new(value.alphabet)?;
        let bits = |text: &str| {
            BitVector::parse(text).ok_or_else(|| HypothesisError::InvalidBits(text.to_string()))
        };
        let initial = bits(&value.initial)?;
        if initial.len() != value.dimension {
            return Err(HypothesisError::DimensionMismatch {
                what: "initial vector".into(),
                expected: value.dimension,
                found: initial.len(),
            });
        }
        let accepting = bits(&value.accepting)?;
        let mut transitions = Vec::with_capacity(alphabet.size());
        for name in alphabet.names() {
            let rows = value
                .transitions
                .get(name)
                .ok_or_else(|| HypothesisError::MissingTransitions(name.to_string()))?;
            let rows = rows
                .iter()
                .map(|row| bits(row))
                .collect::<Result<Vec<_>, _>>()?;
            if rows.len() != value.dimension {
                return Err(HypothesisError::DimensionMismatch {
                    what: format!("transition matrix of {name}"),
                    expected: value.dimension,
                    found: rows.len(),
                });
            }
            if let Some(row) = rows.iter().find(|row| row.len() != value.dimension) {
                return Err(HypothesisError::DimensionMismatch {
                    what: format!("row of transition matrix of {name}"),
                    expected: value.dimension,
                    found: row.len(),
                });
            }
            transitions.push(Matrix::from_rows(rows, value.dimension));
        }
        Hypothesis::new(alphabet, initial, accepting, transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts the words over {a, b} with an even number of `a`.
    fn even_a() -> Hypothesis {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        Hypothesis::new(
            alphabet,
            BitVector::parse("10").unwrap(),
            BitVector::parse("10").unwrap(),
            vec![
                Matrix::parse(&["01", "10"]).unwrap(),
                Matrix::identity(2),
            ],
        )
        .unwrap()
    }

    #[test_log::test]
    fn evaluation() {
        let hypothesis = even_a();
        let alphabet = hypothesis.alphabet().clone();
        for word in alphabet.words_up_to(4) {
            let a_count = word.symbols().filter(|s| s.index() == 0).count();
            assert_eq!(hypothesis.evaluate(&word), a_count % 2 == 0, "{word:?}");
        }
    }

    #[test_log::test]
    fn distinguishing_words() {
        let hypothesis = even_a();
        let alphabet = hypothesis.alphabet().clone();
        let trivial = Hypothesis::trivial(alphabet.clone());
        assert_eq!(
            hypothesis.distinguishing_word(&trivial),
            Some(Word::epsilon())
        );
        assert!(hypothesis.equivalent(&hypothesis.clone()));

        // odd number of a: agrees with the trivial automaton on ε
        let odd = Hypothesis::new(
            alphabet.clone(),
            BitVector::parse("10").unwrap(),
            BitVector::parse("01").unwrap(),
            vec![
                Matrix::parse(&["01", "10"]).unwrap(),
                Matrix::identity(2),
            ],
        )
        .unwrap();
        assert_eq!(odd.distinguishing_word(&trivial), Some(alphabet.parse_word("a").unwrap()));
    }

    #[test_log::test]
    fn dimension_checks() {
        let alphabet = Alphabet::new(["a"]).unwrap();
        assert!(matches!(
            Hypothesis::new(
                alphabet.clone(),
                BitVector::parse("10").unwrap(),
                BitVector::parse("1").unwrap(),
                vec![Matrix::identity(2)],
            ),
            Err(HypothesisError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Hypothesis::new(
                alphabet,
                BitVector::parse("1").unwrap(),
                BitVector::parse("1").unwrap(),
                vec![],
            ),
            Err(HypothesisError::MissingTransitions(symbol)) if symbol == "a"
        ));
    }

    #[test_log::test]
    fn json_format() {
        let hypothesis = even_a();
        let json = hypothesis.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dimension"], 2);
        assert_eq!(value["final"], "10");
        assert_eq!(value["transitions"]["a"][0], "01");
        assert_eq!(Hypothesis::from_json(&json).unwrap(), hypothesis);

        let broken = json.replace("\"01\"", "\"0x\"");
        assert!(Hypothesis::from_json(&broken).is_err());
    }

    #[test_log::test]
    fn table_display() {
        let shown = even_a().to_string();
        assert!(shown.contains("T[a]"));
        assert!(shown.contains("q1"));
    }
}
