//! SurgeClientBuilder - クライアントの構築とワイヤリング
//!
//! # 起動時検証（Fail-fast）
//! - `expect_categories()` で caller が必須なカテゴリを宣言
//! - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
//! - `max_spawn` / `initial_spawn` の範囲もここで検証
//!
//! ```ignore
//! let mut client = SurgeClient::builder()
//!     .caller(ApiCategory::SearchApi, search)?
//!     .max_spawn(8)
//!     .on_failure(|_range, err, _op| async move { Ok(err.code != Some(404)) })
//!     .expect_categories(&[ApiCategory::SearchApi])
//!     .build()?;
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

use super::client::SurgeClient;
use super::executor::BatchExecutor;
use super::options::{OptionsError, SurgeOptions};
use super::registry::{CallerRegistry, RegistryError};
use crate::domain::{
    ApiCategory, BatchRange, CallError, HookError, IncrementReason, Operation, OperationKey,
};
use crate::impls::FibonacciSleeper;
use crate::ports::{Clock, Hooks, RemoteCaller, Sleeper, SystemClock};

pub struct SurgeClientBuilder {
    registry: CallerRegistry,
    options: SurgeOptions,
    sleeper: Option<Box<dyn Sleeper>>,
    clock: Arc<dyn Clock>,
    hooks: Hooks,
    expected_categories: Option<Vec<ApiCategory>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing callers for categories: {0:?}. These categories were expected but not registered.")]
    MissingCategories(Vec<ApiCategory>),

    #[error(transparent)]
    InvalidOptions(#[from] OptionsError),
}

impl SurgeClientBuilder {
    pub fn new() -> Self {
        Self {
            registry: CallerRegistry::new(),
            options: SurgeOptions::default(),
            sleeper: None,
            clock: Arc::new(SystemClock),
            hooks: Hooks::default(),
            expected_categories: None,
        }
    }

    /// Bind an already shared caller to `category`.
    pub fn register(
        mut self,
        category: ApiCategory,
        caller: Arc<dyn RemoteCaller>,
    ) -> Result<Self, RegistryError> {
        self.registry.register(category, caller)?;
        Ok(self)
    }

    /// Bind a closure `(query, variables) -> future` to `category`.
    pub fn caller<F, Fut>(self, category: ApiCategory, f: F) -> Result<Self, RegistryError>
    where
        F: Fn(String, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, CallError>> + Send + 'static,
    {
        self.register(category, Arc::new(f))
    }

    pub fn options(mut self, options: SurgeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn max_spawn(mut self, max_spawn: usize) -> Self {
        self.options.max_spawn = max_spawn;
        self
    }

    pub fn initial_spawn(mut self, initial_spawn: usize) -> Self {
        self.options.initial_spawn = initial_spawn;
        self
    }

    /// Replace the default `FibonacciSleeper`.
    pub fn sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Some(Box::new(sleeper));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the whole hook set.
    pub fn hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn before_request<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(BatchRange, Operation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Operation>, HookError>> + Send + 'static,
    {
        self.hooks.before_request = Some(Arc::new(f));
        self
    }

    pub fn after_request<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(BatchRange, Operation, OperationKey, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.hooks.after_request = Some(Arc::new(f));
        self
    }

    pub fn on_failure<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(BatchRange, CallError, Operation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<bool, HookError>> + Send + 'static,
    {
        self.hooks.on_failure = Some(Arc::new(f));
        self
    }

    pub fn on_batch_done<F>(mut self, f: F) -> Self
    where
        F: Fn(BatchRange) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.hooks.on_batch_done = Some(Arc::new(f));
        self
    }

    pub fn change_increment_for<F>(mut self, f: F) -> Self
    where
        F: Fn(IncrementReason, usize) -> usize + Send + Sync + 'static,
    {
        self.hooks.change_increment_for = Some(Arc::new(f));
        self
    }

    /// Categories that must have a caller when `build()` runs.
    pub fn expect_categories(mut self, categories: &[ApiCategory]) -> Self {
        self.expected_categories = Some(categories.to_vec());
        self
    }

    pub fn build(self) -> Result<SurgeClient, BuildError> {
        if let Some(expected) = &self.expected_categories {
            let registered = self.registry.registered_categories();
            let missing: Vec<ApiCategory> = expected
                .iter()
                .filter(|c| !registered.contains(c))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingCategories(missing));
            }
        }
        self.options.validate()?;

        let sleeper = self
            .sleeper
            .unwrap_or_else(|| Box::new(FibonacciSleeper::new()));
        let executor = BatchExecutor::new(
            self.options.max_spawn,
            self.options.initial_spawn,
            sleeper,
            self.hooks,
        );
        Ok(SurgeClient::new(self.registry, executor, self.clock))
    }
}

impl Default for SurgeClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
