#[cfg(test)]
pub mod test_storage {
    use std::sync::Arc;

    use crate::context::{Platform, SessionContext, StorageBackend};
    use crate::fallback::kv::{KeyValueStore, MemoryKeyValueStore};
    use crate::models::Role;
    use crate::service::Storage;

    pub fn backend(platform: Platform) -> (StorageBackend, Arc<MemoryKeyValueStore>) {
        let kv = Arc::new(MemoryKeyValueStore::new());
        let backend = StorageBackend::new(
            platform,
            "sqlite::memory:",
            kv.clone() as Arc<dyn KeyValueStore>,
        );
        (backend, kv)
    }

    /// Storage with a live relational engine plus an empty key-value store.
    pub async fn native_storage() -> (Storage, Arc<MemoryKeyValueStore>) {
        let (backend, kv) = backend(Platform::Native);
        let storage = Storage::new(backend);
        storage
            .ensure_initialized()
            .await
            .expect("ensure_initialized never fails");
        (storage, kv)
    }

    /// Storage where every primary operation fails fast, so everything runs
    /// against the fallback store.
    pub async fn web_storage() -> (Storage, Arc<MemoryKeyValueStore>) {
        let (backend, kv) = backend(Platform::Web);
        let storage = Storage::new(backend);
        storage
            .ensure_initialized()
            .await
            .expect("ensure_initialized never fails");
        (storage, kv)
    }

    pub async fn seed_json(kv: &MemoryKeyValueStore, key: &str, value: serde_json::Value) {
        kv.seed(key, &value.to_string()).await;
    }

    pub fn child_session(username: &str) -> SessionContext {
        SessionContext::new(username, Role::Child)
    }

    pub fn parent_session(username: &str) -> SessionContext {
        SessionContext::new(username, Role::Parent)
    }

    pub fn caretaker_session(username: &str) -> SessionContext {
        SessionContext::new(username, Role::Teacher)
    }
}
