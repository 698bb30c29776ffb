//! RemoteCaller port - 外部 API 呼び出しの抽象化
//!
//! エンジンは query / variables を解釈しない。渡して、結果か失敗を受け取るだけ。

use std::future::Future;

use async_trait::async_trait;

use crate::domain::CallError;

/// Accepts `(query, variables)` and returns a result or fails.
///
/// Timeouts are the caller's concern: wrap the call in `tokio::time::timeout`
/// inside the implementation if a hung request must not stall its batch.
///
/// # 使用例
/// ```ignore
/// let caller = |query: String, variables: serde_json::Value| async move {
///     http_post(&query, &variables).await
/// };
/// builder.caller(ApiCategory::CatalogueApi, caller)?;
/// ```
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    async fn call(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<serde_json::Value, CallError>;
}

/// Closures taking owned `(String, Value)` are callers.
#[async_trait]
impl<F, Fut> RemoteCaller for F
where
    F: Fn(String, serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<serde_json::Value, CallError>> + Send + 'static,
{
    async fn call(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<serde_json::Value, CallError> {
        (self)(query.to_string(), variables.clone()).await
    }
}
