use itertools::Itertools;
use m2ma::prelude::*;
use thiserror::Error;
use tracing::trace;

mod json;

/// Errors that can occur when filling a [`Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A word was given both labels.
    #[error("word \"{word}\" is labeled both positive and negative")]
    Conflict {
        /// The conflicting word in textual form.
        word: String,
    },
    /// An example file does not name its alphabet.
    #[error("example file has no alphabet")]
    MissingAlphabet,
    /// The alphabet is malformed or a word uses an unknown symbol.
    #[error(transparent)]
    Alphabet(#[from] AlphabetError),
    /// The example file is not valid JSON.
    #[error("could not parse example file: {0}")]
    Json(#[from] serde_json::Error),
    /// The example file could not be read.
    #[error("could not read example file: {0}")]
    Io(#[from] std::io::Error),
}

/// The Word & Label Store holds the ground truth that learning from examples starts with: a
/// finite set of positive and a finite set of negative words over a fixed alphabet.
///
/// Every word that is in neither set is unknown. Under the closed-world assumption unknown words
/// are treated as negative by [`Store::lookup`], while [`Store::classify`] always reports only
/// what is actually known. Both sets remember the order in which words were inserted, which makes
/// every iteration over the store deterministic.
#[derive(Clone, PartialEq, Eq)]
pub struct Store {
    alphabet: Alphabet,
    positive: math::Set<Word>,
    negative: math::Set<Word>,
    closed_world: bool,
}

impl Store {
    /// Creates an empty store over the given alphabet.
    pub fn new(alphabet: Alphabet) -> Self {
        Self {
            alphabet,
            positive: math::Set::default(),
            negative: math::Set::default(),
            closed_world: false,
        }
    }

    /// Creates a store from textual words, which are parsed with [`Alphabet::parse_word`].
    pub fn from_strings<'a, P, N>(alphabet: Alphabet, positive: P, negative: N) -> Result<Self, StoreError>
    where
        P: IntoIterator<Item = &'a str>,
        N: IntoIterator<Item = &'a str>,
    {
        let mut store = Self::new(alphabet);
        for word in positive {
            store.insert_str(word, true)?;
        }
        for word in negative {
            store.insert_str(word, false)?;
        }
        Ok(store)
    }

    /// Switches the closed-world assumption on or off.
    pub fn with_closed_world(mut self, closed_world: bool) -> Self {
        self.closed_world = closed_world;
        self
    }

    /// Returns `true` if unknown words are looked up as negative.
    pub fn is_closed_world(&self) -> bool {
        self.closed_world
    }

    /// The alphabet all words are over.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Records that `word` has the given label. Returns `true` if the word was not known before
    /// and fails if it is already known with the opposite label.
    pub fn insert(&mut self, word: Word, label: bool) -> Result<bool, StoreError> {
        let (same, other) = if label {
            (&mut self.positive, &self.negative)
        } else {
            (&mut self.negative, &self.positive)
        };
        if other.contains(&word) {
            return Err(StoreError::Conflict {
                word: self.alphabet.show(&word),
            });
        }
        let fresh = same.insert(word);
        if fresh {
            trace!("recorded {} example", if label { "positive" } else { "negative" });
        }
        Ok(fresh)
    }

    /// Parses `word` and records it with the given label.
    pub fn insert_str(&mut self, word: &str, label: bool) -> Result<bool, StoreError> {
        let parsed = self.alphabet.parse_word(word)?;
        self.insert(parsed, label)
    }

    /// The ground truth for `word`, `None` if it is unknown.
    pub fn classify(&self, word: &Word) -> Option<bool> {
        if self.positive.contains(word) {
            Some(true)
        } else if self.negative.contains(word) {
            Some(false)
        } else {
            None
        }
    }

    /// The label of `word` as used in observation tables. Unknown words are negative under the
    /// closed-world assumption.
    pub fn lookup(&self, word: &Word) -> Label {
        match self.classify(word) {
            Some(label) => Label::from_bit(label),
            None if self.closed_world => Label::Reject,
            None => Label::Unknown,
        }
    }

    /// The positive words in insertion order.
    pub fn positive(&self) -> impl Iterator<Item = &Word> + '_ {
        self.positive.iter()
    }

    /// The negative words in insertion order.
    pub fn negative(&self) -> impl Iterator<Item = &Word> + '_ {
        self.negative.iter()
    }

    /// All known words together with their label, positive ones first.
    pub fn classified_words(&self) -> impl Iterator<Item = (&Word, bool)> + '_ {
        self.positive
            .iter()
            .map(|w| (w, true))
            .chain(self.negative.iter().map(|w| (w, false)))
    }

    /// The number of known words.
    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len()
    }

    /// Returns `true` if no word is known.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The length of the longest known word, `0` if there is none.
    pub fn max_word_len(&self) -> usize {
        self.classified_words()
            .map(|(w, _)| w.len())
            .max()
            .unwrap_or(0)
    }

    /// All distinct prefixes of known words, including ε and the words themselves, sorted
    /// length-lexicographically.
    pub fn prefixes(&self) -> Vec<Word> {
        std::iter::once(Word::epsilon())
            .chain(self.classified_words().flat_map(|(w, _)| w.prefixes()))
            .collect::<math::OrderedSet<_>>()
            .into_iter()
            .collect()
    }

    /// All distinct suffixes of known words, including ε and the words themselves, sorted
    /// length-lexicographically.
    pub fn suffixes(&self) -> Vec<Word> {
        std::iter::once(Word::epsilon())
            .chain(self.classified_words().flat_map(|(w, _)| w.suffixes()))
            .collect::<math::OrderedSet<_>>()
            .into_iter()
            .collect()
    }

    fn known_per_length(&self) -> Vec<usize> {
        let mut counts = vec![0; self.max_word_len() + 1];
        for (word, _) in self.classified_words() {
            counts[word.len()] += 1;
        }
        counts
    }

    /// Returns `true` if every word of length at most `length` is known.
    pub fn is_fully_covered(&self, length: usize) -> bool {
        self.max_full_coverage_length()
            .is_some_and(|covered| covered >= length)
    }

    /// The largest `L` such that every word of length at most `L` is known. This is `None` if
    /// not even ε is known.
    pub fn max_full_coverage_length(&self) -> Option<usize> {
        let counts = self.known_per_length();
        let mut covered = None;
        for (length, &known) in counts.iter().enumerate() {
            match math::checked_power(self.alphabet.size(), length) {
                Some(total) if total == known => covered = Some(length),
                _ => break,
            }
        }
        covered
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |words: &math::Set<Word>| words.iter().map(|w| self.alphabet.show(w)).join(", ");
        write!(
            f,
            "positive: {{{}}}, negative: {{{}}}",
            show(&self.positive),
            show(&self.negative)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alphabet() -> Alphabet {
        Alphabet::new(["a", "b"]).unwrap()
    }

    #[test_log::test]
    fn conflicting_labels() {
        let mut store = Store::new(alphabet());
        assert!(store.insert_str("a b", true).unwrap());
        assert!(!store.insert_str("a b", true).unwrap());
        assert!(matches!(
            store.insert_str("a b", false),
            Err(StoreError::Conflict { word }) if word == "a b"
        ));
        assert!(matches!(
            store.insert_str("a c", false),
            Err(StoreError::Alphabet(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test_log::test]
    fn lookup_and_closed_world() {
        let store = Store::from_strings(alphabet(), ["a"], ["b"]).unwrap();
        let a = alphabet().parse_word("a").unwrap();
        let ab = alphabet().parse_word("a b").unwrap();
        assert_eq!(store.lookup(&a), Label::Accept);
        assert_eq!(store.lookup(&ab), Label::Unknown);
        assert_eq!(store.classify(&ab), None);
        let closed = store.with_closed_world(true);
        assert_eq!(closed.lookup(&ab), Label::Reject);
        assert_eq!(closed.classify(&ab), None);
    }

    #[test_log::test]
    fn prefixes_and_suffixes() {
        let store = Store::from_strings(alphabet(), ["a b"], ["b b a"]).unwrap();
        let show = |words: Vec<Word>| words.iter().map(|w| alphabet().show(w)).collect_vec();
        assert_eq!(
            show(store.prefixes()),
            vec!["ε", "a", "b", "a b", "b b", "b b a"]
        );
        assert_eq!(
            show(store.suffixes()),
            vec!["ε", "a", "b", "a b", "b a", "b b a"]
        );
    }

    #[test_log::test]
    fn coverage() {
        let mut store = Store::new(alphabet());
        assert_eq!(store.max_full_coverage_length(), None);
        store.insert_str("", false).unwrap();
        assert_eq!(store.max_full_coverage_length(), Some(0));
        store.insert_str("a", true).unwrap();
        assert_eq!(store.max_full_coverage_length(), Some(0));
        store.insert_str("b", false).unwrap();
        store.insert_str("a a", false).unwrap();
        assert_eq!(store.max_full_coverage_length(), Some(1));
        assert!(store.is_fully_covered(1));
        assert!(!store.is_fully_covered(2));
        for word in ["a b", "b a", "b b"] {
            store.insert_str(word, true).unwrap();
        }
        assert_eq!(store.max_full_coverage_length(), Some(2));
    }
}
