//! Sleeper port - バックオフ待機の抽象化
//!
//! # 実装
//! - `FibonacciSleeper`（デフォルト）
//! - `FixedSleeper`, `ExponentialSleeper`, `NoopSleeper`（impls::backoff）

use async_trait::async_trait;

/// Pause strategy used after a batch in which every operation failed.
///
/// `wait` is called once per all-failed batch and escalates; `reset` is called
/// after any batch with at least one success.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn wait(&mut self);

    fn reset(&mut self);
}
