#[cfg(test)]
mod tests {
    use crate::fallback::kv::{JsonFileKeyValueStore, KeyValueStore, MemoryKeyValueStore};

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();

        assert!(store.get("missing").await.unwrap().is_none());

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));

        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("store.json");

        {
            let store = JsonFileKeyValueStore::open(&path).await.unwrap();
            store.set("app_users", r#"[{"username":"u1"}]"#).await.unwrap();
            store.set("dbChildMigrationCompleted", "true").await.unwrap();
            store.remove("app_users").await.unwrap();
        }

        let reopened = JsonFileKeyValueStore::open(&path).await.unwrap();
        assert!(reopened.get("app_users").await.unwrap().is_none());
        assert_eq!(
            reopened
                .get("dbChildMigrationCompleted")
                .await
                .unwrap()
                .as_deref(),
            Some("true")
        );
    }

    #[tokio::test]
    async fn test_remove_many_clears_all_named_keys() {
        let store = MemoryKeyValueStore::new();
        store.set("dbGenericMigrationCompleted", "true").await.unwrap();
        store.set("dbChildMigrationCompleted", "true").await.unwrap();
        store.set("app_users", "[]").await.unwrap();

        store
            .remove_many(&[
                "dbGenericMigrationCompleted",
                "dbChildMigrationCompleted",
                "dbParentMigrationCompleted",
            ])
            .await
            .unwrap();

        assert!(store.get("dbGenericMigrationCompleted").await.unwrap().is_none());
        assert!(store.get("dbChildMigrationCompleted").await.unwrap().is_none());
        assert_eq!(store.get("app_users").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_file_store_remove_many_persists_in_one_write() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("store.json");

        {
            let store = JsonFileKeyValueStore::open(&path).await.unwrap();
            store.set("a", "1").await.unwrap();
            store.set("b", "2").await.unwrap();
            store.set("c", "3").await.unwrap();
            store.remove_many(&["a", "b"]).await.unwrap();
        }

        let reopened = JsonFileKeyValueStore::open(&path).await.unwrap();
        assert!(reopened.get("a").await.unwrap().is_none());
        assert!(reopened.get("b").await.unwrap().is_none());
        assert_eq!(reopened.get("c").await.unwrap().as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_file_store_opens_when_file_absent() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("does-not-exist.json");

        let store = JsonFileKeyValueStore::open(&path).await.unwrap();
        assert!(store.get("anything").await.unwrap().is_none());
    }
}
