use serde_json::Value;
use sm_core::{KeyValueStore, Result, UPDATE_FLAG_KEY, USER_ID_KEY};
use tracing::info;

/// The persisted user id, generated as a v4 UUID on first use.
pub async fn ensure_user_id(store: &dyn KeyValueStore) -> Result<String> {
    if let Some(Value::String(existing)) = store.get(USER_ID_KEY).await? {
        if !existing.is_empty() {
            return Ok(existing);
        }
    }

    let user_id = uuid::Uuid::new_v4().to_string();
    store.set(USER_ID_KEY, Value::String(user_id.clone())).await?;
    info!("🆔 Generated new userId: {}", user_id);
    Ok(user_id)
}

/// Whether the "what's new" notice was dismissed. `false` when never set.
pub async fn update_flag(store: &dyn KeyValueStore) -> Result<bool> {
    Ok(store
        .get(UPDATE_FLAG_KEY)
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(false))
}

pub async fn set_update_flag(store: &dyn KeyValueStore, value: bool) -> Result<()> {
    store.set(UPDATE_FLAG_KEY, Value::Bool(value)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_user_id_is_generated_once() {
        let store = MemoryStore::new();
        let first = ensure_user_id(&store).await.unwrap();
        let second = ensure_user_id(&store).await.unwrap();
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn test_existing_user_id_is_kept() {
        let store = MemoryStore::new();
        store.set(USER_ID_KEY, Value::String("legacy-id".into())).await.unwrap();
        assert_eq!(ensure_user_id(&store).await.unwrap(), "legacy-id");
    }

    #[tokio::test]
    async fn test_update_flag() {
        let store = MemoryStore::new();
        assert!(!update_flag(&store).await.unwrap());
        set_update_flag(&store, true).await.unwrap();
        assert!(update_flag(&store).await.unwrap());
    }
}
