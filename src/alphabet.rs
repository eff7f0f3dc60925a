use std::fmt::Debug;

use itertools::Itertools;
use thiserror::Error;

use crate::{math, word::Word};

/// A symbol is an index into an [`Alphabet`]. The order of the symbols in the alphabet is fixed
/// once the alphabet is created, and it determines the order in which words are enumerated,
/// the order of columns in the transition matrices and so on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(usize);

impl Symbol {
    /// Creates the symbol with the given position in its alphabet.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of `self` in its alphabet.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors that can occur when building an alphabet or when parsing a word over it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphabetError {
    /// The same symbol name was given twice.
    #[error("symbol \"{0}\" occurs more than once in the alphabet")]
    Duplicate(String),
    /// Symbol names must be non-empty and may not contain whitespace, as words are written as
    /// symbol names separated by a single space.
    #[error("\"{0}\" is not a valid symbol name")]
    InvalidName(String),
    /// A word mentions a symbol that is not part of the alphabet.
    #[error("symbol \"{symbol}\" in word \"{word}\" is not part of the alphabet")]
    UnknownSymbol {
        /// The offending token.
        symbol: String,
        /// The word in which it occurred.
        word: String,
    },
}

/// A finite, ordered collection of named symbols.
///
/// # Example
/// ```
/// use m2ma::prelude::*;
/// let alphabet = Alphabet::new(["a", "b"]).unwrap();
/// let word = alphabet.parse_word("a b a").unwrap();
/// assert_eq!(word.len(), 3);
/// assert_eq!(alphabet.show(&word), "a b a");
/// assert_eq!(alphabet.show(&Word::epsilon()), "ε");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Alphabet {
    symbols: math::Set<String>,
}

impl Alphabet {
    /// Creates a new alphabet from the given symbol names, which are kept in the given order.
    pub fn new<I, S>(symbols: I) -> Result<Self, AlphabetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = math::Set::default();
        for name in symbols.into_iter().map(Into::into) {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(AlphabetError::InvalidName(name));
            }
            if set.contains(&name) {
                return Err(AlphabetError::Duplicate(name));
            }
            set.insert(name);
        }
        Ok(Self { symbols: set })
    }

    /// Returns the number of symbols.
    pub fn size(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if the alphabet has no symbols at all.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterates over all symbols in alphabet order.
    pub fn universe(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.size()).map(Symbol)
    }

    /// Looks up the symbol with the given name.
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.symbols.get_index_of(name).map(Symbol)
    }

    /// Gives the name of a symbol. Panics if the symbol does not belong to this alphabet.
    pub fn name(&self, symbol: Symbol) -> &str {
        self.symbols
            .get_index(symbol.0)
            .expect("symbol does not belong to this alphabet")
    }

    /// Iterates over the names of all symbols in alphabet order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.symbols.iter().map(String::as_str)
    }

    /// Parses a word given as symbol names joined by single spaces. The empty string is the
    /// empty word.
    pub fn parse_word(&self, text: &str) -> Result<Word, AlphabetError> {
        if text.is_empty() {
            return Ok(Word::epsilon());
        }
        text.split(' ')
            .map(|token| {
                self.symbol(token).ok_or_else(|| AlphabetError::UnknownSymbol {
                    symbol: token.to_string(),
                    word: text.to_string(),
                })
            })
            .collect()
    }

    /// Writes a word in the space separated form that [`Alphabet::parse_word`] understands,
    /// except for the empty word, which is shown as `ε`.
    pub fn show(&self, word: &Word) -> String {
        if word.is_empty() {
            "ε".to_string()
        } else {
            self.render(word)
        }
    }

    /// Like [`Alphabet::show`] but the empty word becomes the empty string, which is the format
    /// used by example files.
    pub fn render(&self, word: &Word) -> String {
        word.symbols().map(|sym| self.name(sym)).join(" ")
    }

    /// Returns all words of exactly the given length in length-lexicographic order.
    pub fn words_of_length(&self, length: usize) -> Vec<Word> {
        let mut current = vec![Word::epsilon()];
        for _ in 0..length {
            current = current
                .iter()
                .flat_map(|word| self.universe().map(move |sym| word.append(sym)))
                .collect();
        }
        current
    }

    /// Returns all words of length at most `max_length` in length-lexicographic order.
    pub fn words_up_to(&self, max_length: usize) -> Vec<Word> {
        (0..=max_length)
            .flat_map(|length| self.words_of_length(length))
            .collect()
    }
}

impl Debug for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.symbols.iter().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_alphabets() {
        assert_eq!(
            Alphabet::new(["a", "a"]),
            Err(AlphabetError::Duplicate("a".into()))
        );
        assert_eq!(
            Alphabet::new(["a b"]),
            Err(AlphabetError::InvalidName("a b".into()))
        );
        let alphabet = Alphabet::new(["x", "long"]).unwrap();
        assert_eq!(alphabet.symbol("long"), Some(Symbol::new(1)));
        assert_eq!(alphabet.name(Symbol::new(0)), "x");
    }

    #[test]
    fn parsing_words() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let word = alphabet.parse_word("b a b").unwrap();
        assert_eq!(
            word.symbols().collect::<Vec<_>>(),
            vec![Symbol::new(1), Symbol::new(0), Symbol::new(1)]
        );
        assert!(alphabet.parse_word("").unwrap().is_empty());
        assert!(matches!(
            alphabet.parse_word("a  b"),
            Err(AlphabetError::UnknownSymbol { symbol, .. }) if symbol.is_empty()
        ));
        assert!(alphabet.parse_word("a c").is_err());
        assert_eq!(alphabet.render(&word), "b a b");
    }

    #[test]
    fn enumeration_is_length_lexicographic() {
        let alphabet = Alphabet::new(["a", "b"]).unwrap();
        let words = alphabet
            .words_up_to(2)
            .iter()
            .map(|w| alphabet.show(w))
            .collect_vec();
        assert_eq!(words, vec!["ε", "a", "b", "a a", "a b", "b a", "b b"]);
        assert_eq!(alphabet.words_of_length(3).len(), 8);
    }
}
