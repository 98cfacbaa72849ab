//! In-memory thought store for tests and offline runs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::ThoughtStore;
use crate::error::StoreResult;
use crate::identity::ClientId;
use crate::types::{NewThought, Thought};

/// Append-only thought table held in memory
#[derive(Default)]
pub struct MemoryThoughtStore {
    rows: RwLock<Vec<Thought>>,
}

impl MemoryThoughtStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all clients
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn newest_first<F>(&self, predicate: F) -> Vec<Thought>
    where
        F: Fn(&Thought) -> bool,
    {
        let rows = self.rows.read().await;
        // Reverse insertion order first so equal timestamps stay newest first
        let mut matched: Vec<Thought> = rows
            .iter()
            .rev()
            .filter(|t| predicate(*t))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matched
    }
}

#[async_trait]
impl ThoughtStore for MemoryThoughtStore {
    async fn insert(&self, thought: NewThought) -> StoreResult<Thought> {
        let row = Thought {
            id: Uuid::new_v4().to_string(),
            content: thought.content,
            hash: thought.hash,
            is_public: thought.is_public,
            client_id: thought.client_id,
            created_at: Utc::now(),
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn count_by_client(&self, client_id: &ClientId) -> StoreResult<u64> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|t| t.client_id == client_id.as_str())
            .count() as u64)
    }

    async fn list_public(&self) -> StoreResult<Vec<Thought>> {
        Ok(self.newest_first(|t| t.is_public).await)
    }

    async fn list_by_client(&self, client_id: &ClientId) -> StoreResult<Vec<Thought>> {
        Ok(self
            .newest_first(|t| t.client_id == client_id.as_str())
            .await)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Thought>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|t| t.id == id).cloned())
    }
}
