//! Deterministic finite automata read from DOT files, and an oracle that answers queries
//! about their language.

use std::{
    cell::{Cell, RefCell},
    path::Path,
};

use itertools::Itertools;
use m2ma::prelude::*;
use thiserror::Error;
use tracing::{debug, trace};

use super::oracle::{Counterexample, Oracle};

/// Errors when reading a DFA from a DOT file.
#[derive(Debug, Error)]
pub enum DotError {
    /// No state was declared, so there is no start state.
    #[error("no start state, the file declares no states")]
    NoStartState,
    /// A state declaration or transition that cannot be parsed.
    #[error("cannot parse line {line_number}: \"{line}\"")]
    Malformed {
        /// One based line number.
        line_number: usize,
        /// The offending line.
        line: String,
    },
    /// A transition label is not a valid symbol name.
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
    /// The file could not be read.
    #[error("could not read DOT file: {0}")]
    Io(#[from] std::io::Error),
}

/// A (possibly partial) deterministic finite automaton. A missing transition leads to an
/// implicit rejecting sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Alphabet,
    states: math::Set<String>,
    start: usize,
    accepting: Vec<bool>,
    // successor of each state under each symbol
    transitions: Vec<Vec<Option<usize>>>,
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Parses `q [shape=doublecircle];` into the state name and whether it is accepting.
fn parse_state(line: &str) -> Option<(&str, bool)> {
    let (name, attributes) = line.split_once('[')?;
    let name = name.trim();
    let accepting = if attributes.contains("shape=doublecircle") {
        true
    } else if attributes.contains("shape=circle") {
        false
    } else {
        return None;
    };
    is_identifier(name).then_some((name, accepting))
}

/// Parses `p -> q [label="x"];` into source, target and label.
fn parse_transition(line: &str) -> Option<(&str, &str, &str)> {
    let (source, rest) = line.split_once("->")?;
    let (target, attributes) = rest.split_once('[')?;
    let (_, label) = attributes.split_once("label=\"")?;
    let (label, _) = label.split_once('"')?;
    let (source, target) = (source.trim(), target.trim());
    (is_identifier(source) && is_identifier(target) && !label.is_empty())
        .then_some((source, target, label))
}

impl Dfa {
    /// Reads a DFA from the DOT subset written by common automata tools:
    /// ```text
    /// digraph {
    ///   0 [shape=doublecircle];
    ///   1 [shape=circle];
    ///   0 -> 1 [label="a"];
    /// }
    /// ```
    /// The first declared state is the start state, `doublecircle` marks accepting states and
    /// the alphabet consists of all transition labels in sorted order. Empty lines, `//`
    /// comments and graph level attributes are ignored.
    ///
    /// # Example
    /// ```
    /// use m2ma_learning::prelude::*;
    /// let dfa = Dfa::parse_dot(r#"digraph {
    ///     0 [shape=doublecircle];
    ///     0 -> 0 [label="a"];
    /// }"#).unwrap();
    /// assert!(dfa.accepts(&dfa.alphabet().parse_word("a a").unwrap()));
    /// ```
    pub fn parse_dot(text: &str) -> Result<Dfa, DotError> {
        let mut states: math::Set<String> = math::Set::default();
        let mut accepting: math::Set<String> = math::Set::default();
        let mut edges = vec![];
        let mut start = None;

        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") || line.starts_with("digraph") || line == "}"
            {
                continue;
            }
            let malformed = || DotError::Malformed {
                line_number: index + 1,
                line: line.to_string(),
            };
            if line.contains("->") {
                let (source, target, label) = parse_transition(line).ok_or_else(malformed)?;
                states.insert(source.to_string());
                states.insert(target.to_string());
                edges.push((source.to_string(), target.to_string(), label.to_string()));
            } else if line.contains("shape=") && !line.starts_with("node") {
                let (name, is_accepting) = parse_state(line).ok_or_else(malformed)?;
                let (index, _) = states.insert_full(name.to_string());
                start.get_or_insert(index);
                if is_accepting {
                    accepting.insert(name.to_string());
                }
            } else {
                trace!("ignoring line {}: {line}", index + 1);
            }
        }

        let start = start.ok_or(DotError::NoStartState)?;
        let alphabet = Alphabet::new(edges.iter().map(|(_, _, label)| label).unique().sorted())?;
        let mut transitions = vec![vec![None; alphabet.size()]; states.len()];
        for (source, target, label) in &edges {
            let (Some(p), Some(q), Some(sym)) = (
                states.get_index_of(source),
                states.get_index_of(target),
                alphabet.symbol(label),
            ) else {
                continue;
            };
            transitions[p][sym.index()] = Some(q);
        }
        let missing = transitions.iter().flatten().filter(|t| t.is_none()).count();
        debug!(
            "read DFA with {} states over {} symbols, {missing} transitions lead to the sink",
            states.len(),
            alphabet.size()
        );

        Ok(Dfa {
            accepting: states.iter().map(|s| accepting.contains(s)).collect(),
            alphabet,
            states,
            start,
            transitions,
        })
    }

    /// Reads a DFA from a DOT file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Dfa, DotError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_dot(&text)
    }

    /// The alphabet, i.e. the sorted transition labels.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// The number of declared states, the implicit sink not included.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// The name of the start state.
    pub fn start(&self) -> &str {
        &self.states[self.start]
    }

    /// The state reached by reading `word`, `None` if it falls into the sink.
    pub fn reached(&self, word: &Word) -> Option<usize> {
        word.symbols()
            .try_fold(self.start, |state, sym| self.transitions[state][sym.index()])
    }

    /// Returns `true` if `word` is accepted.
    pub fn accepts(&self, word: &Word) -> bool {
        self.reached(word).is_some_and(|state| self.accepting[state])
    }

    /// The DFA as a multiplicity automaton with one-hot state vectors. Missing transitions
    /// become zero rows.
    pub fn to_hypothesis(&self) -> Hypothesis {
        let dimension = self.size();
        let transitions = self
            .alphabet
            .universe()
            .map(|sym| {
                Matrix::from_rows(
                    self.transitions
                        .iter()
                        .map(|successors| match successors[sym.index()] {
                            Some(q) => BitVector::unit(dimension, q),
                            None => BitVector::zeros(dimension),
                        })
                        .collect(),
                    dimension,
                )
            })
            .collect();
        Hypothesis::new(
            self.alphabet.clone(),
            BitVector::unit(dimension, self.start),
            self.accepting.iter().copied().collect(),
            transitions,
        )
        .unwrap_or_else(|_| Hypothesis::trivial(self.alphabet.clone()))
    }
}

/// An exact oracle for the language of a [`Dfa`].
///
/// Membership queries are cached. Equivalence queries compare the hypothesis with the DFA
/// viewed as a multiplicity automaton and return a shortest distinguishing word.
#[derive(Debug)]
pub struct DfaOracle {
    dfa: Dfa,
    target: Hypothesis,
    queries: RefCell<math::Map<Word, bool>>,
    equivalence_queries: Cell<usize>,
}

impl DfaOracle {
    /// Creates an oracle for `dfa`.
    pub fn new(dfa: Dfa) -> Self {
        Self {
            target: dfa.to_hypothesis(),
            dfa,
            queries: RefCell::new(math::Map::default()),
            equivalence_queries: Cell::new(0),
        }
    }

    /// The underlying DFA.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// The number of distinct words that were asked in membership queries.
    pub fn membership_queries(&self) -> usize {
        self.queries.borrow().len()
    }

    /// The number of equivalence queries asked so far.
    pub fn equivalence_queries(&self) -> usize {
        self.equivalence_queries.get()
    }
}

impl Oracle for DfaOracle {
    fn alphabet(&self) -> &Alphabet {
        self.dfa.alphabet()
    }

    fn membership(&self, word: &Word) -> bool {
        if let Some(&answer) = self.queries.borrow().get(word) {
            return answer;
        }
        let answer = self.dfa.accepts(word);
        trace!("membership query {word:?} -> {answer}");
        self.queries.borrow_mut().insert(word.clone(), answer);
        answer
    }

    fn equivalence(&self, hypothesis: &Hypothesis) -> Result<(), Counterexample> {
        self.equivalence_queries.set(self.equivalence_queries.get() + 1);
        match self.target.distinguishing_word(hypothesis) {
            Some(word) => {
                let label = self.dfa.accepts(&word);
                debug!("equivalence query refuted by {word:?}");
                Err((word, label))
            }
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Accepts the words with an even number of `a`.
    pub(crate) const EVEN_A: &str = r#"digraph {
        0 [shape=doublecircle];
        1 [shape=circle];
        0 -> 1 [label="a"];
        1 -> 0 [label="a"];
        0 -> 0 [label="b"];
        1 -> 1 [label="b"];
    }"#;

    /// Accepts the words ending in `a`.
    pub(crate) const ENDS_WITH_A: &str = r#"digraph {
        // start
        0 [shape=circle];
        1 [shape=doublecircle];
        0 -> 1 [label="a"];
        0 -> 0 [label="b"];
        1 -> 1 [label="a"];
        1 -> 0 [label="b"];
    }"#;

    /// Accepts the words whose second to last symbol is `a`.
    pub(crate) const SECOND_TO_LAST_A: &str = r#"digraph {
        rankdir=LR;
        0 [shape=circle];
        1 [shape=circle];
        2 [shape=doublecircle];
        3 [shape=doublecircle];
        0 -> 1 [label="a"];
        0 -> 0 [label="b"];
        1 -> 3 [label="a"];
        1 -> 2 [label="b"];
        2 -> 1 [label="a"];
        2 -> 0 [label="b"];
        3 -> 3 [label="a"];
        3 -> 2 [label="b"];
    }"#;

    #[test_log::test]
    fn parsing() {
        let dfa = Dfa::parse_dot(SECOND_TO_LAST_A).unwrap();
        assert_eq!(dfa.size(), 4);
        assert_eq!(dfa.start(), "0");
        assert_eq!(dfa.alphabet().names().collect::<Vec<_>>(), vec!["a", "b"]);
        let word = |text: &str| dfa.alphabet().parse_word(text).unwrap();
        assert!(dfa.accepts(&word("b a b")));
        assert!(dfa.accepts(&word("a a")));
        assert!(!dfa.accepts(&word("a b b")));
        assert!(!dfa.accepts(&word("a")));
        for text in ["", "a", "a b", "b a a", "a b a b"] {
            assert_eq!(dfa.to_hypothesis().evaluate(&word(text)), dfa.accepts(&word(text)));
        }
    }

    #[test_log::test]
    fn partial_and_broken_files() {
        let partial = Dfa::parse_dot("digraph {\n 0 [shape=circle];\n 0 -> 1 [label=\"x\"];\n 1 [shape=doublecircle];\n}")
            .unwrap();
        let x = |n: usize| Word::new(vec![Symbol::new(0); n]);
        assert!(partial.accepts(&x(1)));
        assert!(!partial.accepts(&x(2)));
        assert!(!partial.to_hypothesis().evaluate(&x(2)));

        assert!(matches!(
            Dfa::parse_dot("digraph {\n}"),
            Err(DotError::NoStartState)
        ));
        assert!(matches!(
            Dfa::parse_dot("digraph {\n 0 [shape=circle];\n 0 -> [label=\"a\"];\n}"),
            Err(DotError::Malformed { line_number: 3, .. })
        ));
    }

    #[test_log::test]
    fn oracle_counts_and_refutes() {
        let oracle = DfaOracle::new(Dfa::parse_dot(ENDS_WITH_A).unwrap());
        let alphabet = oracle.alphabet().clone();
        let ba = alphabet.parse_word("b a").unwrap();
        assert!(oracle.membership(&ba));
        assert!(oracle.membership(&ba));
        assert_eq!(oracle.membership_queries(), 1);

        let trivial = Hypothesis::trivial(alphabet.clone());
        let (word, label) = oracle.equivalence(&trivial).unwrap_err();
        assert_eq!(word, alphabet.parse_word("a").unwrap());
        assert!(label);
        assert_eq!(oracle.equivalence(&oracle.dfa().to_hypothesis()), Ok(()));
        assert_eq!(oracle.equivalence_queries(), 2);
    }
}
