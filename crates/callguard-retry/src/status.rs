use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A small set of HTTP status codes.
///
/// Stored sorted and deduplicated; membership is a binary search.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<u16>", into = "Vec<u16>"))]
pub struct StatusSet {
    codes: Vec<u16>,
}

impl StatusSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses that usually signal a transient condition:
    /// 408, 429, 500, 502, 503 and 504.
    pub fn transient() -> Self {
        Self::from([408, 429, 500, 502, 503, 504])
    }

    /// Returns true if `status` is in the set.
    pub fn contains(&self, status: u16) -> bool {
        self.codes.binary_search(&status).is_ok()
    }

    /// Adds `status`; returns false if it was already present.
    pub fn insert(&mut self, status: u16) -> bool {
        match self.codes.binary_search(&status) {
            Ok(_) => false,
            Err(index) => {
                self.codes.insert(index, status);
                true
            }
        }
    }

    /// Removes `status`; returns false if it was absent.
    pub fn remove(&mut self, status: u16) -> bool {
        match self.codes.binary_search(&status) {
            Ok(index) => {
                self.codes.remove(index);
                true
            }
            Err(_) => false,
        }
    }

    /// Iterates the codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.codes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl fmt::Debug for StatusSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(&self.codes).finish()
    }
}

impl FromIterator<u16> for StatusSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut codes: Vec<u16> = iter.into_iter().collect();
        codes.sort_unstable();
        codes.dedup();
        Self { codes }
    }
}

impl<const N: usize> From<[u16; N]> for StatusSet {
    fn from(codes: [u16; N]) -> Self {
        codes.into_iter().collect()
    }
}

impl From<Vec<u16>> for StatusSet {
    fn from(codes: Vec<u16>) -> Self {
        codes.into_iter().collect()
    }
}

impl From<StatusSet> for Vec<u16> {
    fn from(set: StatusSet) -> Self {
        set.codes
    }
}

impl Extend<u16> for StatusSet {
    fn extend<I: IntoIterator<Item = u16>>(&mut self, iter: I) {
        for status in iter {
            self.insert(status);
        }
    }
}
