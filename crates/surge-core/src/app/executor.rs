//! BatchExecutor - 適応的バッチ実行ループ
//!
//! # フロー（1 バッチ）
//! 1. `[seek, seek + increment)` をキューから切り出す（残りが少なければ短くなる）
//! 2. バッチ内の全 operation を並行に実行し、全部終わるまで待つ（join barrier）
//! 3. 成功を ResultStore にマージ、失敗は on_failure の判断で failure list へ
//! 4. on_batch_done を呼ぶ
//! 5. seek を実際に試行した件数だけ進める
//! 6. 全件失敗なら sleeper.wait()、そうでなければ sleeper.reset()
//! 7. increment を調整する（キューを使い切ったバッチでは増やさない）
//!
//! 個々の operation の失敗で run が止まることはない。止まるのはフックが
//! エラーを返したときだけ。

use futures::future::join_all;
use tracing::{debug, warn};

use super::status::RunTally;
use crate::domain::{
    BatchRange, HookKind, IncrementDecision, IncrementReason, Operation, OperationKey,
    ResultStore, SurgeError, decide,
};
use crate::ports::{Hooks, Sleeper};

/// Queue state owned by the client and driven by the executor.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    pub(crate) queue: Vec<Operation>,
    pub(crate) seek: usize,
    pub(crate) failures: Vec<Operation>,
}

impl QueueState {
    pub(crate) fn pending(&self) -> usize {
        self.queue.len().saturating_sub(self.seek)
    }
}

/// Result of one attempt inside a batch.
enum Attempt {
    Succeeded {
        key: OperationKey,
        value: serde_json::Value,
    },
    Failed {
        operation: Operation,
        requeue: bool,
    },
}

/// The adaptive controller: increment, sleeper and hooks.
///
/// The increment is controller state, so it carries over from one run to the
/// next on the same client.
pub struct BatchExecutor {
    max_spawn: usize,
    increment: usize,
    sleeper: Box<dyn Sleeper>,
    hooks: Hooks,
}

impl BatchExecutor {
    pub fn new(
        max_spawn: usize,
        initial_spawn: usize,
        sleeper: Box<dyn Sleeper>,
        hooks: Hooks,
    ) -> Self {
        Self {
            max_spawn,
            increment: initial_spawn.max(1),
            sleeper,
            hooks,
        }
    }

    pub fn increment(&self) -> usize {
        self.increment
    }

    pub fn max_spawn(&self) -> usize {
        self.max_spawn
    }

    /// Drive the queue from `state.seek` to its end.
    ///
    /// Successes are merged into `results` batch by batch, so on a hook error
    /// everything merged by earlier batches is still there.
    pub(crate) async fn run(
        &mut self,
        state: &mut QueueState,
        results: &mut ResultStore,
        tally: &mut RunTally,
    ) -> Result<(), SurgeError> {
        loop {
            let size = self.increment.min(state.pending());
            if size == 0 {
                break;
            }
            let range = BatchRange::new(state.seek, state.seek + size);
            let batch = &state.queue[range.from..range.to];

            let hooks = &self.hooks;
            let attempts = join_all(batch.iter().map(|op| attempt(hooks, range, op))).await;
            // フックのエラーがあればバッチごと捨てる（マージも seek も進めない）
            let attempts = attempts.into_iter().collect::<Result<Vec<_>, _>>()?;

            let mut failed = 0;
            for attempt in attempts {
                match attempt {
                    Attempt::Succeeded { key, value } => {
                        results.insert(key, value);
                        tally.succeeded += 1;
                    }
                    Attempt::Failed { operation, requeue } => {
                        failed += 1;
                        if requeue {
                            state.failures.push(operation);
                            tally.requeued += 1;
                        }
                    }
                }
            }
            tally.batches += 1;
            tally.attempted += size;
            tally.failed += failed;

            if let Some(hook) = &self.hooks.on_batch_done {
                hook.on_batch_done(range)
                    .map_err(SurgeError::hook(HookKind::OnBatchDone))?;
            }

            state.seek += size;

            if failed == size {
                warn!(%range, failed, "every operation in the batch failed, backing off");
                tally.backoffs += 1;
                self.sleeper.wait().await;
            } else {
                self.sleeper.reset();
            }

            let drained = state.pending() == 0;
            self.increment = self.next_increment(failed, size, drained);
            if drained {
                debug!(%range, size, failed, increment = self.increment, "last batch done");
                break;
            }
            debug!(%range, size, failed, increment = self.increment, "batch done");
        }
        Ok(())
    }

    /// After the batch that drains the queue only the step-down rows apply.
    fn next_increment(&self, failed: usize, size: usize, drained: bool) -> usize {
        match decide(self.increment, failed, size, self.max_spawn) {
            IncrementDecision::Hold => self.increment,
            IncrementDecision::Adjust {
                reason: IncrementReason::NoneHaveFailed,
                ..
            } if drained => self.increment,
            IncrementDecision::Adjust { reason, suggested } => {
                match &self.hooks.change_increment_for {
                    Some(policy) => policy.change_increment_for(reason, self.increment).max(1),
                    None => suggested,
                }
            }
        }
    }
}

async fn attempt(
    hooks: &Hooks,
    range: BatchRange,
    operation: &Operation,
) -> Result<Attempt, SurgeError> {
    let replacement = match &hooks.before_request {
        Some(hook) => hook
            .before_request(range, operation)
            .await
            .map_err(SurgeError::hook(HookKind::BeforeRequest))?,
        None => None,
    };
    let attempted = replacement.as_ref().unwrap_or(operation);

    match attempted.invoke().await {
        Ok(value) => {
            if let Some(hook) = &hooks.after_request {
                hook.after_request(range, operation, operation.key(), &value)
                    .await
                    .map_err(SurgeError::hook(HookKind::AfterRequest))?;
            }
            Ok(Attempt::Succeeded {
                key: operation.key().clone(),
                value,
            })
        }
        Err(error) => {
            debug!(key = %operation.key(), %error, "operation failed");
            let requeue = match &hooks.on_failure {
                Some(hook) => hook
                    .on_failure(range, &error, operation)
                    .await
                    .map_err(SurgeError::hook(HookKind::OnFailure))?,
                None => true,
            };
            Ok(Attempt::Failed {
                operation: operation.clone(),
                requeue,
            })
        }
    }
}
