//! Seal and read thoughts
//!
//! ## Seal order
//!
//! 1. Client id must be resolved, otherwise `NotReady` with no I/O
//! 2. Locked clients at or over the free quota get `QuotaExceeded`
//! 3. Blank content is a silent no-op; over-long content is rejected
//! 4. SHA256 over the raw bytes, `is_public` forced off for locked clients
//! 5. Insert; the store assigns `id` and `created_at`
//!
//! The count and the insert are separate round-trips. Two concurrent seals
//! from the same locked client can both pass the count, so the free quota
//! is advisory.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::SealError;
use crate::hash::seal_hash;
use crate::identity::ClientId;
use crate::store::ThoughtStore;
use crate::types::{NewThought, Thought, FREE_QUOTA, MAX_CONTENT_CHARS};

/// Sealing workflow and read queries over a [`ThoughtStore`]
#[derive(Clone)]
pub struct ThoughtService {
    store: Arc<dyn ThoughtStore>,
    free_quota: u64,
}

impl ThoughtService {
    pub fn new(store: Arc<dyn ThoughtStore>) -> Self {
        Self {
            store,
            free_quota: FREE_QUOTA,
        }
    }

    pub fn free_quota(&self) -> u64 {
        self.free_quota
    }

    /// Seal a thought
    ///
    /// Returns `Ok(None)` when the content is blank: nothing is written and
    /// nothing is reported.
    pub async fn seal(
        &self,
        content: &str,
        want_public: bool,
        client_id: Option<&ClientId>,
        unlocked: bool,
    ) -> Result<Option<Thought>, SealError> {
        let client_id = client_id.ok_or(SealError::NotReady)?;

        let count = self.store.count_by_client(client_id).await.map_err(|e| {
            warn!(client_id = %client_id, "Quota check failed: {}", e);
            SealError::Storage(e)
        })?;

        if !unlocked && count >= self.free_quota {
            info!(client_id = %client_id, count, "Free limit reached");
            return Err(SealError::QuotaExceeded {
                limit: self.free_quota,
            });
        }

        if content.trim().is_empty() {
            debug!(client_id = %client_id, "Ignoring blank thought");
            return Ok(None);
        }

        let chars = content.chars().count();
        if chars > MAX_CONTENT_CHARS {
            return Err(SealError::Validation(format!(
                "thought is {} characters, limit is {}",
                chars, MAX_CONTENT_CHARS
            )));
        }

        let new = NewThought {
            content: content.to_string(),
            hash: seal_hash(content),
            is_public: unlocked && want_public,
            client_id: client_id.to_string(),
        };

        let thought = self.store.insert(new).await.map_err(|e| {
            warn!(client_id = %client_id, "Insert failed: {}", e);
            SealError::Storage(e)
        })?;

        info!(
            id = %thought.id,
            client_id = %client_id,
            is_public = thought.is_public,
            hash = %thought.hash,
            "Thought sealed"
        );
        Ok(Some(thought))
    }

    /// Public thoughts, newest first
    pub async fn list_public(&self) -> Result<Vec<Thought>, SealError> {
        Ok(self.store.list_public().await?)
    }

    /// Thoughts owned by `client_id`, newest first
    pub async fn list_mine(&self, client_id: &ClientId) -> Result<Vec<Thought>, SealError> {
        Ok(self.store.list_by_client(client_id).await?)
    }

    /// One thought for direct-link viewing; `None` means not found
    pub async fn get(&self, id: &str) -> Result<Option<Thought>, SealError> {
        Ok(self.store.get(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::store::MemoryThoughtStore;
    use async_trait::async_trait;

    fn service() -> (ThoughtService, Arc<MemoryThoughtStore>) {
        let store = Arc::new(MemoryThoughtStore::new());
        (ThoughtService::new(store.clone()), store)
    }

    async fn seal_three(service: &ThoughtService, client: &ClientId) {
        for i in 0..3 {
            service
                .seal(&format!("thought {}", i), false, Some(client), false)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_fresh_client_seals_private_thought() {
        let (service, _) = service();
        let client = ClientId::from("client-x");

        let thought = service
            .seal("Bitcoin hits 100k by EOY", false, Some(&client), false)
            .await
            .unwrap()
            .unwrap();

        assert!(!thought.is_public);
        assert_eq!(thought.client_id, "client-x");
        assert_eq!(thought.content, "Bitcoin hits 100k by EOY");
        assert_eq!(
            thought.hash,
            "1067f23eeb220c32a302a322762533c70e35e2cd0c72a4c2c472a6140253ac66"
        );
    }

    #[tokio::test]
    async fn test_fourth_locked_seal_exceeds_quota() {
        let (service, store) = service();
        let client = ClientId::from("client-x");
        seal_three(&service, &client).await;

        let result = service.seal("one more", false, Some(&client), false).await;
        assert!(matches!(result, Err(SealError::QuotaExceeded { limit: 3 })));
        assert_eq!(store.count_by_client(&client).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unlocked_client_bypasses_quota() {
        let (service, store) = service();
        let client = ClientId::from("client-x");
        seal_three(&service, &client).await;

        let thought = service
            .seal("fourth", false, Some(&client), true)
            .await
            .unwrap();
        assert!(thought.is_some());
        assert_eq!(store.count_by_client(&client).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_quota_is_per_client() {
        let (service, _) = service();
        seal_three(&service, &ClientId::from("a")).await;

        let other = ClientId::from("b");
        assert!(service
            .seal("mine", false, Some(&other), false)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_locked_client_cannot_publish() {
        let (service, store) = service();
        let client = ClientId::from("client-x");

        let thought = service
            .seal("let everyone see", true, Some(&client), false)
            .await
            .unwrap()
            .unwrap();

        assert!(!thought.is_public);
        assert!(store.list_public().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlocked_client_can_publish() {
        let (service, _) = service();
        let client = ClientId::from("client-x");

        let public = service
            .seal("for the world", true, Some(&client), true)
            .await
            .unwrap()
            .unwrap();
        let private = service
            .seal("for me", false, Some(&client), true)
            .await
            .unwrap()
            .unwrap();

        assert!(public.is_public);
        assert!(!private.is_public);
        let listed = service.list_public().await.unwrap();
        assert_eq!(listed, vec![public]);
    }

    #[tokio::test]
    async fn test_blank_content_is_silently_ignored() {
        let (service, store) = service();
        let client = ClientId::from("client-x");

        let result = service.seal("   ", false, Some(&client), false).await.unwrap();
        assert!(result.is_none());
        let result = service.seal("\n\t", true, Some(&client), true).await.unwrap();
        assert!(result.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_quota_is_checked_before_blank_content() {
        let (service, _) = service();
        let client = ClientId::from("client-x");
        seal_three(&service, &client).await;

        let result = service.seal("  ", false, Some(&client), false).await;
        assert!(matches!(result, Err(SealError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn test_unresolved_client_is_not_ready() {
        let (service, store) = service();
        let result = service.seal("hello", false, None, true).await;
        assert!(matches!(result, Err(SealError::NotReady)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_content_length_limit_counts_characters() {
        let (service, store) = service();
        let client = ClientId::from("client-x");

        let at_limit = "é".repeat(MAX_CONTENT_CHARS);
        assert!(service
            .seal(&at_limit, false, Some(&client), true)
            .await
            .unwrap()
            .is_some());

        let too_long = "a".repeat(MAX_CONTENT_CHARS + 1);
        let result = service.seal(&too_long, false, Some(&client), true).await;
        assert!(matches!(result, Err(SealError::Validation(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_content_is_stored_untrimmed() {
        let (service, _) = service();
        let client = ClientId::from("client-x");

        let thought = service
            .seal("  padded  ", false, Some(&client), false)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(thought.content, "  padded  ");
        assert_eq!(thought.hash, seal_hash("  padded  "));
    }

    #[tokio::test]
    async fn test_get_returns_none_for_unknown_id() {
        let (service, _) = service();
        assert!(service.get("does-not-exist").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reading_twice_returns_identical_fields() {
        let (service, _) = service();
        let client = ClientId::from("client-x");
        let sealed = service
            .seal("read me twice", false, Some(&client), false)
            .await
            .unwrap()
            .unwrap();

        let first = service.get(&sealed.id).await.unwrap();
        let second = service.get(&sealed.id).await.unwrap();
        assert_eq!(first, Some(sealed));
        assert_eq!(first, second);
    }

    struct FailingStore;

    #[async_trait]
    impl ThoughtStore for FailingStore {
        async fn insert(&self, _thought: NewThought) -> StoreResult<Thought> {
            Err(StoreError::Server {
                status: 500,
                message: "boom".to_string(),
            })
        }

        async fn count_by_client(&self, _client_id: &ClientId) -> StoreResult<u64> {
            Ok(0)
        }

        async fn list_public(&self) -> StoreResult<Vec<Thought>> {
            Ok(Vec::new())
        }

        async fn list_by_client(&self, _client_id: &ClientId) -> StoreResult<Vec<Thought>> {
            Ok(Vec::new())
        }

        async fn get(&self, _id: &str) -> StoreResult<Option<Thought>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_insert_failure_surfaces_storage_error() {
        let service = ThoughtService::new(Arc::new(FailingStore));
        let client = ClientId::from("client-x");

        let result = service.seal("doomed", false, Some(&client), false).await;
        assert!(matches!(result, Err(SealError::Storage(StoreError::Server { status: 500, .. }))));
    }
}
