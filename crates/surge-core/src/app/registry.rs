//! CallerRegistry - カテゴリごとの RemoteCaller の登録
//!
//! Design:
//! - Built during initialization (mutable).
//! - Used by the client afterwards (read-only).

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::ApiCategory;
use crate::ports::RemoteCaller;

/// Category -> caller.
#[derive(Default, Clone)]
pub struct CallerRegistry {
    callers: HashMap<ApiCategory, Arc<dyn RemoteCaller>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Caller for category '{0}' is already registered")]
    AlreadyRegistered(ApiCategory),
}

impl CallerRegistry {
    pub fn new() -> Self {
        Self {
            callers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        category: ApiCategory,
        caller: Arc<dyn RemoteCaller>,
    ) -> Result<(), RegistryError> {
        if self.callers.contains_key(&category) {
            return Err(RegistryError::AlreadyRegistered(category));
        }
        self.callers.insert(category, caller);
        Ok(())
    }

    pub fn get(&self, category: ApiCategory) -> Option<&Arc<dyn RemoteCaller>> {
        self.callers.get(&category)
    }

    /// Registered categories, sorted.
    pub fn registered_categories(&self) -> Vec<ApiCategory> {
        let mut categories: Vec<ApiCategory> = self.callers.keys().copied().collect();
        categories.sort();
        categories
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}
