//! Task persistence.
//!
//! Handlers only see [`TaskStore`]. Validation happens before a call reaches
//! the store, so every error surfaced here is an infrastructure failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared::{NewTask, Task, TaskPatch};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{AppConfig, StoreKind};

pub mod connection;
pub mod memory;
pub mod redis_store;

pub use connection::{Connector, LazyConnection};
pub use memory::MemoryTaskStore;
pub use redis_store::RedisTaskStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store configuration error: {0}")]
    Config(String),

    #[error("store connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("timed out after {0:?} while connecting to the store")]
    Timeout(Duration),

    #[error("stored task could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn create(&self, new_task: NewTask) -> Result<Task, StoreError>;

    /// Returns `None` when no task has this id.
    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Option<Task>, StoreError>;

    /// Returns `false` when no task has this id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Builds the store selected by configuration. Never connects.
pub fn from_config(config: &AppConfig) -> Arc<dyn TaskStore> {
    match config.store_kind {
        StoreKind::Redis => Arc::new(RedisTaskStore::new(
            config.store_url.clone(),
            config.connect_timeout,
        )),
        StoreKind::Memory => Arc::new(MemoryTaskStore::new()),
    }
}

/// Newest first. Ties are broken by id so the order is total.
pub(crate) fn sort_newest_first(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
