//! The key-value store notes are persisted in. The app only ever talks to it
//! through [`NoteStore`], so the durable Postgres table and the in-process
//! map are interchangeable.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use super::models::Entry;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Every entry whose key starts with `prefix`, ordered by key.
    async fn get_with_prefix(&self, prefix: &str) -> Result<Vec<Entry>>;
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    /// Insert or overwrite; last writer wins.
    async fn set(&self, key: &str, value: &Value) -> Result<()>;
    /// `Ok(false)` if there was nothing under `key`.
    async fn delete(&self, key: &str) -> Result<bool>;
}
