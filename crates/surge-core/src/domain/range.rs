use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue indices spanned by one batch, `from..to` (exclusive upper bound).
///
/// `to` is clamped to the queue length, so a short final batch reports its real span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRange {
    pub from: usize,
    pub to: usize,
}

impl BatchRange {
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from <= to);
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to - self.from
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for BatchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}
