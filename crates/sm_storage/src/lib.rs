use sm_core::{KeyValueStore, Result};
use std::path::Path;
use std::sync::Arc;

pub mod backends;
pub mod history;
pub mod settings;

pub use backends::*;
pub use history::{merge_records, HistoryConfig, LocalHistoryStore, OverwritePosition};
pub use settings::{ensure_user_id, set_update_flag, update_flag};

/// Open a key-value backend by name: `memory`, or `file` backed by `path`.
pub async fn create_store(kind: &str, path: Option<&Path>) -> Result<Arc<dyn KeyValueStore>> {
    match kind {
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "file" => {
            let path = path.ok_or_else(|| {
                sm_core::Error::Storage("The file store needs a path".to_string())
            })?;
            Ok(Arc::new(JsonFileStore::open(path).await?))
        }
        other => Err(sm_core::Error::Storage(format!("Unknown store kind: {}", other))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::history::{HistoryConfig, LocalHistoryStore, OverwritePosition};
    pub use sm_core::{KeyValueStore, PageRecord, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_store() {
        assert!(create_store("memory", None).await.is_ok());
        assert!(create_store("file", None).await.is_err());
        assert!(create_store("qdrant", None).await.is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert!(create_store("file", Some(&path)).await.is_ok());
    }
}
