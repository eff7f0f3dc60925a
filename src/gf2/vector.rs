use std::fmt::{Debug, Display};

use fixedbitset::FixedBitSet;
use itertools::Itertools;

use crate::label::Label;

/// A vector over GF(2) of fixed length. Addition is bitwise xor, multiplication is bitwise and.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitVector {
    bits: FixedBitSet,
}

impl BitVector {
    /// The zero vector of the given length.
    pub fn zeros(len: usize) -> Self {
        Self {
            bits: FixedBitSet::with_capacity(len),
        }
    }

    /// The unit vector of length `len` which has a single 1 at `position`.
    pub fn unit(len: usize, position: usize) -> Self {
        let mut out = Self::zeros(len);
        out.set(position, true);
        out
    }

    /// Builds a vector from a sequence of bits.
    pub fn from_bits<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let bits = bits.into_iter().collect_vec();
        let mut out = Self::zeros(bits.len());
        for (i, bit) in bits.into_iter().enumerate() {
            out.set(i, bit);
        }
        out
    }

    /// Parses a string such as `"0110"`, returns `None` on any other character.
    pub fn parse(text: &str) -> Option<Self> {
        text.chars()
            .map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(Self::from_bits)
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the vector has length zero.
    pub fn is_empty(&self) -> bool {
        self.bits.len() == 0
    }

    /// Reads the entry at `position`.
    pub fn get(&self, position: usize) -> bool {
        self.bits.contains(position)
    }

    /// Overwrites the entry at `position`.
    pub fn set(&mut self, position: usize, value: bool) {
        self.bits.set(position, value)
    }

    /// Flips the entry at `position`.
    pub fn toggle(&mut self, position: usize) {
        self.bits.toggle(position)
    }

    /// Adds `other` to `self` in place. Both vectors must have the same length.
    pub fn add_assign(&mut self, other: &BitVector) {
        debug_assert_eq!(self.len(), other.len());
        self.bits.symmetric_difference_with(&other.bits);
    }

    /// Returns the sum `self + other`.
    pub fn add(&self, other: &BitVector) -> BitVector {
        let mut out = self.clone();
        out.add_assign(other);
        out
    }

    /// The inner product over GF(2), i.e. the parity of the common ones.
    pub fn dot(&self, other: &BitVector) -> bool {
        self.bits.intersection(&other.bits).count() % 2 == 1
    }

    /// Returns `true` if every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.bits.ones().next().is_none()
    }

    /// The position of the lowest entry that is 1.
    pub fn lowest_one(&self) -> Option<usize> {
        self.bits.ones().next()
    }

    /// Iterates over the positions of all ones in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.ones()
    }

    /// Iterates over all entries.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len()).map(|i| self.get(i))
    }

    /// Returns a copy of `self` extended or truncated to `len` entries, new entries are zero.
    pub fn resized(&self, len: usize) -> BitVector {
        BitVector::from_bits((0..len).map(|i| i < self.len() && self.get(i)))
    }

    /// Keeps only the entries at the given positions, in the given order.
    pub fn select(&self, positions: &[usize]) -> BitVector {
        BitVector::from_bits(positions.iter().map(|&i| self.get(i)))
    }
}

impl Display for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for bit in self.iter() {
            write!(f, "{}", if bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{self}]")
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self::from_bits(iter)
    }
}

/// A row of an observation table in which some entries may be unknown. Unknown entries read as
/// 0 in [`PartialVector::values`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PartialVector {
    values: BitVector,
    known: BitVector,
}

impl PartialVector {
    /// Builds a partial vector from labels.
    pub fn from_labels<I: IntoIterator<Item = Label>>(labels: I) -> Self {
        let (values, known): (Vec<_>, Vec<_>) = labels
            .into_iter()
            .map(|label| (label.bit().unwrap_or(false), label.is_known()))
            .unzip();
        Self {
            values: BitVector::from_bits(values),
            known: BitVector::from_bits(known),
        }
    }

    /// A partial vector in which every entry is known.
    pub fn complete(values: BitVector) -> Self {
        let known = BitVector::from_bits(std::iter::repeat(true).take(values.len()));
        Self { values, known }
    }

    /// The number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the vector has length zero.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Reads entry `position` as a label.
    pub fn label(&self, position: usize) -> Label {
        if self.known.get(position) {
            Label::from_bit(self.values.get(position))
        } else {
            Label::Unknown
        }
    }

    /// Returns `true` if no entry is unknown.
    pub fn is_complete(&self) -> bool {
        self.known.iter().all(|bit| bit)
    }

    /// Positions of the unknown entries.
    pub fn unknown_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| !self.known.get(i))
    }

    /// The known values, unknown entries are 0.
    pub fn values(&self) -> &BitVector {
        &self.values
    }

    /// The mask of known entries.
    pub fn known(&self) -> &BitVector {
        &self.known
    }

    /// Returns the values if the vector is complete.
    pub fn to_complete(&self) -> Option<BitVector> {
        self.is_complete().then(|| self.values.clone())
    }
}

impl Debug for PartialVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            (0..self.len()).map(|i| self.label(i).symbol()).join("")
        )
    }
}
