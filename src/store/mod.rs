//! Thought storage
//!
//! A single table of thoughts, queried by exact-match filters and newest
//! first ordering. The trait has no update or delete; sealed rows are final.

mod memory;
mod postgrest;

pub use memory::MemoryThoughtStore;
pub use postgrest::{parse_content_range_total, PostgrestConfig, PostgrestStore};

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::identity::ClientId;
use crate::types::{NewThought, Thought};

/// Storage backend for sealed thoughts
#[async_trait]
pub trait ThoughtStore: Send + Sync {
    /// Insert a row and return it with server-assigned `id` and `created_at`
    async fn insert(&self, thought: NewThought) -> StoreResult<Thought>;

    /// Number of thoughts owned by a client
    async fn count_by_client(&self, client_id: &ClientId) -> StoreResult<u64>;

    /// Public thoughts, newest first
    async fn list_public(&self) -> StoreResult<Vec<Thought>>;

    /// Thoughts owned by a client, newest first
    async fn list_by_client(&self, client_id: &ClientId) -> StoreResult<Vec<Thought>>;

    /// One thought by id, `None` when absent
    async fn get(&self, id: &str) -> StoreResult<Option<Thought>>;
}
