#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::error::StorageError;
    use crate::executor::execute_with_fallback;
    use crate::models::Role;
    use crate::test::utils::test_storage::{native_storage, web_storage};

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let fallback_ran = Arc::new(AtomicBool::new(false));
        let flag = fallback_ran.clone();

        let value = execute_with_fallback(async { Ok::<_, StorageError>(41) }, async move {
            flag.store(true, Ordering::SeqCst);
            Ok(0)
        })
        .await
        .unwrap();

        assert_eq!(value, 41);
        assert!(!fallback_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_primary_failure_routes_to_fallback() {
        let value = execute_with_fallback(
            async { Err::<i64, _>(StorageError::Connection("engine closed".to_string())) },
            async { Ok(7) },
        )
        .await
        .unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_fallback_error_propagates_verbatim() {
        let err = execute_with_fallback(
            async { Err::<i64, _>(StorageError::NotInitialized("no pool".to_string())) },
            async { Err(StorageError::NotFound("row 9".to_string())) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(msg) if msg == "row 9"));
    }

    /// Callers cannot tell which path executed: the same facade call yields
    /// results of identical shape whether the primary store is live or every
    /// primary operation fails.
    #[tokio::test]
    async fn test_fallback_transparency_through_facade() {
        let (native, _) = native_storage().await;
        let (web, _) = web_storage().await;

        let via_primary = native.create_user("sara", Role::Parent).await.unwrap();
        let via_fallback = web.create_user("sara", Role::Parent).await.unwrap();

        assert_eq!(via_primary.username, via_fallback.username);
        assert_eq!(via_primary.role, via_fallback.role);

        let found_primary = native.find_user_by_username("sara").await.unwrap().unwrap();
        let found_fallback = web.find_user_by_username("sara").await.unwrap().unwrap();
        assert_eq!(found_primary.username, found_fallback.username);
        assert_eq!(found_primary.role, found_fallback.role);
    }
}
