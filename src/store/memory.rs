use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::TokenStore;

/// A process-local token store. Tokens are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut tokens) = store.tokens.lock() {
            tokens.insert(key.to_string(), value.to_string());
        }
        store
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.tokens.lock().map_err(|_| anyhow!("lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let tokens = self.lock()?;
        let value = tokens.get(key).filter(|value| !value.is_empty());
        Ok(value.cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut tokens = self.lock()?;
        tokens.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut tokens = self.lock()?;
        tokens.remove(key);
        Ok(())
    }
}
