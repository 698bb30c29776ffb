//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **FibonacciSleeper**: デフォルトのバックオフ
//! - **FixedSleeper / ExponentialSleeper / NoopSleeper**: 差し替え用

pub mod backoff;
pub mod fibonacci;

pub use self::backoff::{ExponentialSleeper, FixedSleeper, NoopSleeper};
pub use self::fibonacci::FibonacciSleeper;
