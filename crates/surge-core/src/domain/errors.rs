//! Errors.
//!
//! - `CallError`: リモート呼び出し 1 件の失敗（リトライ対象として記録されるだけ）
//! - `HookError`: フックが返す失敗（run 全体を中断する）
//! - `SurgeError`: client 操作の失敗

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::ApiCategory;

/// Failure of a single remote call.
///
/// Shape follows what a GraphQL-over-HTTP endpoint reports: an optional HTTP
/// status, a message and the raw `errors` payload.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CallError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,

    pub message: String,

    #[serde(default)]
    pub errors: serde_json::Value,
}

impl CallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            status_text: None,
            message: message.into(),
            errors: serde_json::Value::Null,
        }
    }

    pub fn with_status(mut self, code: u16, status_text: impl Into<String>) -> Self {
        self.code = Some(code);
        self.status_text = Some(status_text.into());
        self
    }

    pub fn with_errors(mut self, errors: serde_json::Value) -> Self {
        self.errors = errors;
        self
    }
}

/// Error raised by a lifecycle hook.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HookError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which hook raised a `HookError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookKind {
    BeforeRequest,
    AfterRequest,
    OnFailure,
    OnBatchDone,
}

impl HookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::BeforeRequest => "beforeRequest",
            HookKind::AfterRequest => "afterRequest",
            HookKind::OnFailure => "onFailure",
            HookKind::OnBatchDone => "onBatchDone",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum SurgeError {
    #[error("no caller registered for category={0}")]
    CallerNotRegistered(ApiCategory),

    #[error("{hook} hook failed: {source}")]
    Hook {
        hook: HookKind,
        #[source]
        source: HookError,
    },
}

impl SurgeError {
    pub(crate) fn hook(hook: HookKind) -> impl FnOnce(HookError) -> SurgeError {
        move |source| SurgeError::Hook { hook, source }
    }
}
