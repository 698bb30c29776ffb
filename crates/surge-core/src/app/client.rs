//! SurgeClient - キュー・結果・失敗リストの所有者
//!
//! 1. `enqueue()` で operation を積む（ここではまだ何も呼ばない）
//! 2. `execute()` でキュー全体を BatchExecutor に流す
//! 3. `has_failed()` なら `retry()` で失敗分だけ再実行
//!
//! `execute` / `retry` / `enqueue` / `reset` は `&mut self` なので、
//! 同じ client で同時に走らせることはできない。

use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, info, info_span};

use super::builder::SurgeClientBuilder;
use super::executor::{BatchExecutor, QueueState};
use super::registry::CallerRegistry;
use super::status::{RunKind, RunSummary, RunTally, SurgeCounts};
use crate::domain::{ApiCategory, Operation, OperationKey, ResultStore, RunId, SurgeError};
use crate::ports::{Clock, RemoteCaller};

pub struct SurgeClient {
    registry: CallerRegistry,
    executor: BatchExecutor,
    state: QueueState,

    /// Next key counter, shared by every category. Never reset.
    counter: u64,

    last_results: ResultStore,
    last_summary: Option<RunSummary>,
    clock: Arc<dyn Clock>,
}

impl SurgeClient {
    pub fn builder() -> SurgeClientBuilder {
        SurgeClientBuilder::new()
    }

    pub(crate) fn new(
        registry: CallerRegistry,
        executor: BatchExecutor,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            executor,
            state: QueueState::default(),
            counter: 1,
            last_results: ResultStore::new(),
            last_summary: None,
            clock,
        }
    }

    /// Per-category enqueue helpers.
    pub fn enqueue(&mut self) -> Enqueue<'_> {
        Enqueue { client: self }
    }

    /// Append an operation bound to `category`'s caller and return its key.
    pub fn enqueue_for(
        &mut self,
        category: ApiCategory,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        let caller = self
            .registry
            .get(category)
            .cloned()
            .ok_or(SurgeError::CallerNotRegistered(category))?;

        let key = OperationKey::new(category, self.counter);
        self.counter += 1;

        self.state
            .queue
            .push(Operation::new(key.clone(), category, caller, query, variables));
        Ok(key)
    }

    /// Run every queued operation. Clears the failure list first.
    ///
    /// # Example
    /// ```ignore
    /// client.enqueue().search_api(query, json!({ "page": 1 }))?;
    /// let mut results = client.execute().await?;
    /// if client.has_failed() {
    ///     results.merge(client.retry().await?);
    /// }
    /// ```
    pub async fn execute(&mut self) -> Result<ResultStore, SurgeError> {
        self.state.failures.clear();
        self.state.seek = 0;
        self.run(RunKind::Execute).await
    }

    /// Re-run only the operations that failed in the previous pass.
    ///
    /// Returns this pass's results only; use `ResultStore::merge` to combine.
    pub async fn retry(&mut self) -> Result<ResultStore, SurgeError> {
        self.state.queue = std::mem::take(&mut self.state.failures);
        self.state.seek = 0;
        self.run(RunKind::Retry).await
    }

    /// Drop the queue and the failure list.
    pub fn reset(&mut self) {
        self.state = QueueState::default();
    }

    /// Whether the last pass left operations for `retry`.
    pub fn has_failed(&self) -> bool {
        !self.state.failures.is_empty()
    }

    /// Number of operations waiting for `retry`.
    pub fn failure_count(&self) -> usize {
        self.state.failures.len()
    }

    /// Operations waiting for `retry`, in failure order.
    pub fn failures(&self) -> &[Operation] {
        &self.state.failures
    }

    /// Operations in the queue, attempted or not.
    pub fn queued(&self) -> usize {
        self.state.queue.len()
    }

    /// Queued operations the current (or aborted) run has not attempted yet.
    pub fn pending(&self) -> usize {
        self.state.pending()
    }

    /// Size of the next batch. Carries over from one run to the next.
    pub fn increment(&self) -> usize {
        self.executor.increment()
    }

    /// Ceiling the decision table grows the increment to.
    pub fn max_spawn(&self) -> usize {
        self.executor.max_spawn()
    }

    /// The caller bound to `category`, for direct (non-batched) calls.
    pub fn caller(&self, category: ApiCategory) -> Option<Arc<dyn RemoteCaller>> {
        self.registry.get(category).cloned()
    }

    /// Results merged by a run that a hook aborted.
    ///
    /// A run that completes hands its store to the caller, so this is empty
    /// afterwards.
    pub fn last_results(&self) -> &ResultStore {
        &self.last_results
    }

    /// Summary of the last execute/retry, aborted or not.
    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    /// Snapshot of queue, pending, failure count and increment.
    pub fn counts(&self) -> SurgeCounts {
        SurgeCounts {
            queued: self.queued(),
            pending: self.pending(),
            failed: self.failure_count(),
            increment: self.increment(),
        }
    }

    async fn run(&mut self, kind: RunKind) -> Result<ResultStore, SurgeError> {
        let run_id = RunId::generate(self.clock.as_ref());
        let started_at = self.clock.now();
        let span = info_span!(
            "surge_run",
            run_id = %run_id,
            kind = %kind,
            queued = self.state.queue.len()
        );

        self.last_results = ResultStore::new();
        let mut tally = RunTally::default();
        let outcome = self
            .executor
            .run(&mut self.state, &mut self.last_results, &mut tally)
            .instrument(span.clone())
            .await;

        let summary = RunSummary {
            run_id,
            kind,
            started_at,
            finished_at: self.clock.now(),
            tally,
            final_increment: self.executor.increment(),
            aborted: outcome.is_err(),
        };
        span.in_scope(|| {
            info!(
                batches = summary.tally.batches,
                attempted = summary.tally.attempted,
                succeeded = summary.tally.succeeded,
                failed = summary.tally.failed,
                requeued = summary.tally.requeued,
                increment = summary.final_increment,
                aborted = summary.aborted,
                "run finished"
            )
        });
        self.last_summary = Some(summary);

        outcome?;
        Ok(std::mem::take(&mut self.last_results))
    }
}

/// `client.enqueue().catalogue_api(query, variables)` and friends.
pub struct Enqueue<'a> {
    client: &'a mut SurgeClient,
}

impl Enqueue<'_> {
    pub fn catalogue_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client
            .enqueue_for(ApiCategory::CatalogueApi, query, variables)
    }

    pub fn discovery_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client
            .enqueue_for(ApiCategory::DiscoveryApi, query, variables)
    }

    pub fn search_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client.enqueue_for(ApiCategory::SearchApi, query, variables)
    }

    pub fn order_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client.enqueue_for(ApiCategory::OrderApi, query, variables)
    }

    pub fn subscription_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client
            .enqueue_for(ApiCategory::SubscriptionApi, query, variables)
    }

    pub fn pim_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client.enqueue_for(ApiCategory::PimApi, query, variables)
    }

    pub fn next_pim_api(
        &mut self,
        query: impl Into<String>,
        variables: Value,
    ) -> Result<OperationKey, SurgeError> {
        self.client.enqueue_for(ApiCategory::NextPimApi, query, variables)
    }
}
