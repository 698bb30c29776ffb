//! FibonacciSleeper - デフォルトのバックオフ
//!
//! 全件失敗が続くたびに 1, 2, 3, 5, 8, 13, ... 単位ずつ待つ。
//! 指数バックオフより緩やかに伸びるが、数回で数十秒に届く。

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::ports::Sleeper;

/// Sleeps `(a + b) * unit`, then advances `a, b = b, a + b`.
#[derive(Debug, Clone)]
pub struct FibonacciSleeper {
    a: u64,
    b: u64,
    unit: Duration,
}

impl FibonacciSleeper {
    /// One second per Fibonacci step.
    pub fn new() -> Self {
        Self::with_unit(Duration::from_secs(1))
    }

    /// Use a different step length (tests, or sub-second backoff).
    pub fn with_unit(unit: Duration) -> Self {
        Self { a: 0, b: 1, unit }
    }

    pub fn unit(&self) -> Duration {
        self.unit
    }

    /// Delay the next `wait` will sleep for.
    pub fn next_delay(&self) -> Duration {
        let steps = self.a.saturating_add(self.b);
        self.unit.saturating_mul(u32::try_from(steps).unwrap_or(u32::MAX))
    }

    fn advance(&mut self) {
        let next = self.a.saturating_add(self.b);
        self.a = self.b;
        self.b = next;
    }
}

impl Default for FibonacciSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sleeper for FibonacciSleeper {
    async fn wait(&mut self) {
        let delay = self.next_delay();
        self.advance();
        debug!(delay_ms = delay.as_millis() as u64, "backing off");
        tokio::time::sleep(delay).await;
    }

    fn reset(&mut self) {
        self.a = 0;
        self.b = 1;
    }
}
