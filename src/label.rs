/// The three-valued answer to the question whether a word belongs to the language that is
/// being learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// The word is known to be in the language (bit 1).
    Accept,
    /// The word is known not to be in the language (bit 0).
    Reject,
    /// Nothing is known about the word.
    Unknown,
}

impl Label {
    /// Converts a bit into a known label.
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Label::Accept
        } else {
            Label::Reject
        }
    }

    /// Gives the bit for a known label and `None` otherwise.
    pub fn bit(&self) -> Option<bool> {
        match self {
            Label::Accept => Some(true),
            Label::Reject => Some(false),
            Label::Unknown => None,
        }
    }

    /// Returns `true` unless the label is [`Label::Unknown`].
    pub fn is_known(&self) -> bool {
        !matches!(self, Label::Unknown)
    }

    /// Replaces an unknown label by the result of `f`, leaves known labels untouched.
    pub fn or_else<F: FnOnce() -> Label>(self, f: F) -> Label {
        match self {
            Label::Unknown => f(),
            known => known,
        }
    }

    /// Single character representation as used in table dumps.
    pub fn symbol(&self) -> char {
        match self {
            Label::Accept => '1',
            Label::Reject => '0',
            Label::Unknown => '?',
        }
    }
}

impl From<bool> for Label {
    fn from(value: bool) -> Self {
        Label::from_bit(value)
    }
}

impl From<Option<bool>> for Label {
    fn from(value: Option<bool>) -> Self {
        value.map(Label::from_bit).unwrap_or(Label::Unknown)
    }
}
