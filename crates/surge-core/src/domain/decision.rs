//! Increment decision: how big the next batch should be.
//!
//! This module only holds the pure decision table. Applying it (and routing
//! through a caller-supplied `ChangeIncrementFor` policy) is the executor's job.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the increment is being changed.
///
/// Serialized names are the ones callers match on in their policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncrementReason {
    MoreThanHalfHaveFailed,
    SomeHaveFailed,
    NoneHaveFailed,
}

impl IncrementReason {
    pub fn as_str(self) -> &'static str {
        match self {
            IncrementReason::MoreThanHalfHaveFailed => "more-than-half-have-failed",
            IncrementReason::SomeHaveFailed => "some-have-failed",
            IncrementReason::NoneHaveFailed => "none-have-failed",
        }
    }
}

impl fmt::Display for IncrementReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the decision table for one finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementDecision {
    /// Change the increment. `suggested` is the built-in choice, used when no
    /// policy overrides it.
    Adjust {
        reason: IncrementReason,
        suggested: usize,
    },

    /// Nothing to adapt. Never routed through a policy.
    Hold,
}

/// Evaluate the decision table (first match wins).
///
/// | condition                              | result                  |
/// |----------------------------------------|-------------------------|
/// | failed > batch_size / 2                | 1                       |
/// | 0 < failed, increment > 1              | increment - 1           |
/// | failed == 0, increment < max_spawn     | increment + 1           |
/// | otherwise                              | hold                    |
pub fn decide(
    increment: usize,
    failed: usize,
    batch_size: usize,
    max_spawn: usize,
) -> IncrementDecision {
    if failed > batch_size / 2 {
        IncrementDecision::Adjust {
            reason: IncrementReason::MoreThanHalfHaveFailed,
            suggested: 1,
        }
    } else if failed > 0 && increment > 1 {
        IncrementDecision::Adjust {
            reason: IncrementReason::SomeHaveFailed,
            suggested: increment - 1,
        }
    } else if failed == 0 && increment < max_spawn {
        IncrementDecision::Adjust {
            reason: IncrementReason::NoneHaveFailed,
            suggested: increment + 1,
        }
    } else {
        IncrementDecision::Hold
    }
}
