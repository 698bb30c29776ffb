//! Alternative sleepers: fixed, exponential, no-op.

use std::time::Duration;

use async_trait::async_trait;

use crate::ports::Sleeper;

/// Always waits the same delay.
#[derive(Debug, Clone)]
pub struct FixedSleeper {
    pub delay: Duration,
}

impl FixedSleeper {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Sleeper for FixedSleeper {
    async fn wait(&mut self) {
        tokio::time::sleep(self.delay).await;
    }

    fn reset(&mut self) {}
}

/// Exponential backoff: `base_delay * multiplier^n` for the n-th consecutive
/// wait (0-indexed), optionally capped.
///
/// Example with base_delay=2s, multiplier=2.0: 2s, 4s, 8s, 16s, ...
#[derive(Debug, Clone)]
pub struct ExponentialSleeper {
    /// Delay of the first wait.
    pub base_delay: Duration,

    /// Growth factor between consecutive waits.
    pub multiplier: f64,

    /// Upper bound for a single wait.
    pub max_delay: Option<Duration>,

    waits: u32,
}

impl ExponentialSleeper {
    pub fn new(base_delay: Duration, multiplier: f64) -> Self {
        Self {
            base_delay,
            multiplier,
            max_delay: None,
            waits: 0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Delay the next `wait` will sleep for.
    pub fn next_delay(&self) -> Duration {
        let exponent = i32::try_from(self.waits).unwrap_or(i32::MAX);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);
        match self.max_delay {
            Some(max) => delay.min(max),
            None => delay,
        }
    }
}

#[async_trait]
impl Sleeper for ExponentialSleeper {
    async fn wait(&mut self) {
        let delay = self.next_delay();
        self.waits = self.waits.saturating_add(1);
        tokio::time::sleep(delay).await;
    }

    fn reset(&mut self) {
        self.waits = 0;
    }
}

/// Never sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn wait(&mut self) {}

    fn reset(&mut self) {}
}
