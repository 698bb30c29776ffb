//! Status - run summaries and queue counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::RunId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Execute,
    Retry,
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Execute => f.write_str("execute"),
            RunKind::Retry => f.write_str("retry"),
        }
    }
}

/// Counters accumulated by the executor during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTally {
    pub batches: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,

    /// Failed operations kept in the failure list (not suppressed by `on_failure`).
    pub requeued: usize,

    /// All-failed batches, i.e. sleeper waits.
    pub backoffs: usize,
}

/// What happened during one execute/retry pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: RunId,
    pub kind: RunKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    #[serde(flatten)]
    pub tally: RunTally,

    /// Increment the controller ended the run with.
    pub final_increment: usize,

    /// A hook failed and the run stopped early.
    pub aborted: bool,
}

/// Snapshot of the client's queue state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurgeCounts {
    /// Operations in the queue.
    pub queued: usize,

    /// Queued operations not attempted yet in the current/last run.
    pub pending: usize,

    /// Operations waiting for `retry`.
    pub failed: usize,

    pub increment: usize,
}
