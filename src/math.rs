use std::collections::{BTreeMap, BTreeSet};

pub use indexmap::map;
pub use indexmap::set;

/// Type alias for sets that remember insertion order, we use this to hide which type of set
/// we are actually using. Iteration order is deterministic, which the learners rely on.
pub type Set<S> = indexmap::IndexSet<S>;
/// Type alias for maps that remember insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V>;

/// Type alias for sets that are ordered by their elements.
pub type OrderedSet<S> = BTreeSet<S>;
/// Type alias for maps that are ordered by their keys.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Computes `base^exponent`, returning `None` if the result does not fit into a `usize`.
/// This is used to count the number of words of a given length over an alphabet.
///
/// # Example
/// ```
/// use m2ma::math;
/// assert_eq!(math::checked_power(2, 10), Some(1024));
/// assert_eq!(math::checked_power(0, 0), Some(1));
/// assert_eq!(math::checked_power(2, 200), None);
/// ```
pub fn checked_power(base: usize, exponent: usize) -> Option<usize> {
    let exponent = u32::try_from(exponent).ok()?;
    base.checked_pow(exponent)
}
