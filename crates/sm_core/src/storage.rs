use async_trait::async_trait;
use serde_json::Value;
use crate::Result;

/// Durable key-value state shared by the history store and the user settings.
///
/// Values are JSON documents. Each call is independent: there is no transaction
/// spanning a `get` followed by a `set`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a key, `None` when it was never written or has been removed.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Overwrite a key.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}
