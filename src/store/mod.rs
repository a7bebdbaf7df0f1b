pub mod file;
pub mod memory;

use anyhow::Result;

/// Durable key/value storage for tokens.
///
/// Setting a key overwrites any previous value, so at most one token is ever kept per key.
pub trait TokenStore: Send + Sync {
    /// An empty stored value reads back as `None`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
