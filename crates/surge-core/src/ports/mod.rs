//! Ports - 抽象化レイヤー
//!
//! エンジンが外部に依存する部分（リモート呼び出し、待機、フック、時刻）を
//! trait として定義する。実装は impls と呼び出し側が提供する。

pub mod clock;
pub mod hooks;
pub mod remote_caller;
pub mod sleeper;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::hooks::{
    AfterRequest, BeforeRequest, ChangeIncrementFor, Hooks, OnBatchDone, OnFailure,
};
pub use self::remote_caller::RemoteCaller;
pub use self::sleeper::Sleeper;
