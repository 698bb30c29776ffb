use std::fmt;
use std::sync::Arc;

use super::{ApiCategory, CallError, OperationKey};
use crate::ports::RemoteCaller;

/// One queued remote call: key + bound caller + opaque query/variables.
///
/// Cloning is cheap apart from the payload; the caller is shared.
#[derive(Clone)]
pub struct Operation {
    key: OperationKey,
    category: ApiCategory,
    caller: Arc<dyn RemoteCaller>,
    query: String,
    variables: serde_json::Value,
}

impl Operation {
    pub fn new(
        key: OperationKey,
        category: ApiCategory,
        caller: Arc<dyn RemoteCaller>,
        query: impl Into<String>,
        variables: serde_json::Value,
    ) -> Self {
        Self {
            key,
            category,
            caller,
            query: query.into(),
            variables,
        }
    }

    pub fn key(&self) -> &OperationKey {
        &self.key
    }

    pub fn category(&self) -> ApiCategory {
        self.category
    }

    pub fn caller(&self) -> &Arc<dyn RemoteCaller> {
        &self.caller
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &serde_json::Value {
        &self.variables
    }

    /// Copy with different variables (typical `before_request` replacement).
    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_caller(mut self, caller: Arc<dyn RemoteCaller>) -> Self {
        self.caller = caller;
        self
    }

    /// Run the bound caller once.
    pub async fn invoke(&self) -> Result<serde_json::Value, CallError> {
        self.caller.call(&self.query, &self.variables).await
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("key", &self.key)
            .field("category", &self.category)
            .field("query", &self.query)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
