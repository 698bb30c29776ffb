//! Lifecycle hooks.
//!
//! Every hook is optional. `Hooks` holds the configured subset; a `None` field
//! means the documented default is used. Closures implement each hook through a
//! blanket impl (async hooks receive owned clones so the returned future can be
//! `'static`).
//!
//! A hook returning `Err(HookError)` aborts the running execute/retry.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BatchRange, CallError, HookError, IncrementReason, Operation, OperationKey};

/// Called before each attempt. `Some(op)` replaces the operation for this
/// attempt only; the queued operation is unchanged.
#[async_trait]
pub trait BeforeRequest: Send + Sync {
    async fn before_request(
        &self,
        range: BatchRange,
        operation: &Operation,
    ) -> Result<Option<Operation>, HookError>;
}

/// Called after a successful attempt with the original (pre-replacement)
/// operation and the `{key: result}` pair that was recorded.
#[async_trait]
pub trait AfterRequest: Send + Sync {
    async fn after_request(
        &self,
        range: BatchRange,
        original: &Operation,
        key: &OperationKey,
        result: &serde_json::Value,
    ) -> Result<(), HookError>;
}

/// Called after a failed attempt. `Ok(true)` keeps the operation for `retry`.
#[async_trait]
pub trait OnFailure: Send + Sync {
    async fn on_failure(
        &self,
        range: BatchRange,
        error: &CallError,
        operation: &Operation,
    ) -> Result<bool, HookError>;
}

/// Called synchronously once a batch has joined and its results are merged.
pub trait OnBatchDone: Send + Sync {
    fn on_batch_done(&self, range: BatchRange) -> Result<(), HookError>;
}

/// Overrides the numeric choice of the increment decision table.
///
/// Only consulted when the table wants to change the increment. The engine
/// clamps the returned value to at least 1.
pub trait ChangeIncrementFor: Send + Sync {
    fn change_increment_for(&self, reason: IncrementReason, current: usize) -> usize;
}

#[async_trait]
impl<F, Fut> BeforeRequest for F
where
    F: Fn(BatchRange, Operation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Operation>, HookError>> + Send + 'static,
{
    async fn before_request(
        &self,
        range: BatchRange,
        operation: &Operation,
    ) -> Result<Option<Operation>, HookError> {
        (self)(range, operation.clone()).await
    }
}

#[async_trait]
impl<F, Fut> AfterRequest for F
where
    F: Fn(BatchRange, Operation, OperationKey, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HookError>> + Send + 'static,
{
    async fn after_request(
        &self,
        range: BatchRange,
        original: &Operation,
        key: &OperationKey,
        result: &serde_json::Value,
    ) -> Result<(), HookError> {
        (self)(range, original.clone(), key.clone(), result.clone()).await
    }
}

#[async_trait]
impl<F, Fut> OnFailure for F
where
    F: Fn(BatchRange, CallError, Operation) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<bool, HookError>> + Send + 'static,
{
    async fn on_failure(
        &self,
        range: BatchRange,
        error: &CallError,
        operation: &Operation,
    ) -> Result<bool, HookError> {
        (self)(range, error.clone(), operation.clone()).await
    }
}

impl<F> OnBatchDone for F
where
    F: Fn(BatchRange) -> Result<(), HookError> + Send + Sync,
{
    fn on_batch_done(&self, range: BatchRange) -> Result<(), HookError> {
        (self)(range)
    }
}

impl<F> ChangeIncrementFor for F
where
    F: Fn(IncrementReason, usize) -> usize + Send + Sync,
{
    fn change_increment_for(&self, reason: IncrementReason, current: usize) -> usize {
        (self)(reason, current)
    }
}

/// The configured hook subset.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Default: attempt the queued operation as is.
    pub before_request: Option<Arc<dyn BeforeRequest>>,

    /// Default: nothing.
    pub after_request: Option<Arc<dyn AfterRequest>>,

    /// Default: every failed operation is kept for `retry`.
    pub on_failure: Option<Arc<dyn OnFailure>>,

    /// Default: nothing.
    pub on_batch_done: Option<Arc<dyn OnBatchDone>>,

    /// Default: the built-in decision table values.
    pub change_increment_for: Option<Arc<dyn ChangeIncrementFor>>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("before_request", &self.before_request.is_some())
            .field("after_request", &self.after_request.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .field("on_batch_done", &self.on_batch_done.is_some())
            .field("change_increment_for", &self.change_increment_for.is_some())
            .finish()
    }
}
