#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::achievements::kinds;
    use crate::service::Storage;
    use crate::test::utils::test_storage::{native_storage, web_storage};

    #[tokio::test]
    async fn test_sequential_increments_accumulate() {
        let (storage, _) = native_storage().await;

        for _ in 0..5 {
            storage.update_achievement(1, kinds::STARS, 1).await.unwrap();
        }

        assert_eq!(storage.achievement(1, kinds::STARS).await.unwrap(), 5);
    }

    async fn fire_and_forget_increments(storage: Arc<Storage>) {
        let mut handles = Vec::new();
        for _ in 0..5 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage.update_achievement(1, kinds::STARS, 1).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }

    /// A naive read-modify-write would let two interleaved increments both
    /// observe the same pre-value and converge below +5.
    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_increments_converge_on_primary() {
        let (storage, _) = native_storage().await;
        let storage = Arc::new(storage);

        fire_and_forget_increments(storage.clone()).await;

        assert_eq!(storage.achievement(1, kinds::STARS).await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_increments_converge_on_fallback() {
        let (storage, _) = web_storage().await;
        let storage = Arc::new(storage);

        fire_and_forget_increments(storage.clone()).await;

        assert_eq!(storage.achievement(1, kinds::STARS).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_counters_start_at_delta_and_list_by_owner() {
        let (storage, _) = native_storage().await;

        assert_eq!(
            storage.update_achievement(2, kinds::DIAMONDS, 3).await.unwrap(),
            3
        );
        storage
            .update_achievement(2, kinds::REGULAR_BRUSHING, 1)
            .await
            .unwrap();
        storage.update_achievement(9, kinds::DIAMONDS, 4).await.unwrap();

        let owned = storage.achievements_for_owner(2).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert!(owned.iter().all(|a| a.owner_id == 2));
    }

    #[tokio::test]
    async fn test_explicit_reset_clears_counters() {
        let (storage, _) = native_storage().await;

        storage.update_achievement(1, kinds::STARS, 4).await.unwrap();
        storage
            .update_achievement(1, kinds::HEALTHY_SNACKS, 2)
            .await
            .unwrap();

        storage.reset_achievements(1).await.unwrap();

        assert_eq!(storage.achievement(1, kinds::STARS).await.unwrap(), 0);
        assert!(storage.achievements_for_owner(1).await.unwrap().is_empty());
    }
}
