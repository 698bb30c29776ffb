//! App - アプリケーション層
//!
//! ports を組み合わせてエンジン本体を実装する。
//!
//! # 主要コンポーネント
//! - **SurgeClientBuilder**: クライアントの構築とワイヤリング
//! - **SurgeClient**: キュー・失敗リスト・結果の所有者（execute / retry / enqueue）
//! - **BatchExecutor**: 適応的バッチ実行ループ
//! - **CallerRegistry**: カテゴリ → RemoteCaller
//! - **SurgeOptions**: 並列度の設定

pub mod builder;
pub mod client;
pub mod executor;
pub mod options;
pub mod registry;
pub mod status;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, SurgeClientBuilder};
pub use self::client::{Enqueue, SurgeClient};
pub use self::executor::BatchExecutor;
pub use self::options::{OptionsError, SurgeOptions};
pub use self::registry::{CallerRegistry, RegistryError};
pub use self::status::{RunKind, RunSummary, RunTally, SurgeCounts};
