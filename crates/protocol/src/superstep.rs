//! Superstep counter
//!
//! A `Superstep` is passed explicitly into every writer call that needs it.
//! "No active superstep" is expressed as `Option<Superstep>::None`.

use std::fmt;

/// Round number of a bulk-synchronous iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Superstep(u32);

impl Superstep {
    /// The first superstep of an iteration
    pub const FIRST: Superstep = Superstep(0);

    #[inline]
    #[must_use]
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The superstep following this one
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Superstep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Superstep {
    #[inline]
    fn from(n: u32) -> Self {
        Self(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next() {
        assert_eq!(Superstep::FIRST.next(), Superstep::new(1));
        assert_eq!(Superstep::new(u32::MAX).next(), Superstep::new(u32::MAX));
    }

    #[test]
    fn test_ordering_against_none() {
        // An absent superstep sorts before every active one
        assert!(None < Some(Superstep::FIRST));
    }

    #[test]
    fn test_display() {
        assert_eq!(Superstep::new(12).to_string(), "12");
    }
}
