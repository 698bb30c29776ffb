//! surge-core
//!
//! Adaptive batch execution of remote calls: operations are queued, then run in
//! concurrent batches whose size grows while calls succeed and shrinks when they
//! fail. Failed operations are kept for `retry`.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（category, ids, operation, results, range, decision, errors）
//! - **ports**: 抽象化レイヤー（RemoteCaller, Sleeper, hooks, Clock）
//! - **app**: アプリケーションロジック（builder, client, executor, registry, options, status）
//! - **impls**: 実装（FibonacciSleeper ほかの Sleeper）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{BuildError, SurgeClient, SurgeClientBuilder, SurgeOptions};
pub use domain::{
    ApiCategory, BatchRange, CallError, HookError, IncrementReason, Operation, OperationKey,
    ResultStore, SurgeError,
};
