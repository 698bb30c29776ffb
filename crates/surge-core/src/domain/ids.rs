//! Identifiers.
//!
//! - `OperationKey`: 呼び出し側が結果を引くためのキー（`{category}-{counter}`）
//! - `RunId`: execute / retry の 1 回分を識別する ULID ベースの ID

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::SystemTime;
use ulid::Ulid;

use super::ApiCategory;
use crate::ports::Clock;

/// Key of an enqueued operation.
///
/// Generated by the client as `"{category}-{counter}"` from one counter shared by
/// every category, so keys never collide within a client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationKey(String);

impl OperationKey {
    pub fn new(category: ApiCategory, counter: u64) -> Self {
        Self(format!("{category}-{counter}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for OperationKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of one execute/retry pass.
///
/// ULID なので生成順にソートできる（ログやサマリの並び替えに使う）。
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(Ulid);

impl RunId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a run id whose timestamp part comes from `clock`.
    pub fn generate(clock: &dyn Clock) -> Self {
        let at: SystemTime = clock.now().into();
        Self(Ulid::from_datetime(at))
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}
