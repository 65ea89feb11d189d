//! Redis-backed task store.
//!
//! Each task is one JSON document under `task:{id}`. The sorted set
//! `tasks:by_created` indexes ids by creation time in milliseconds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisResult};
use shared::{NewTask, Task, TaskPatch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::connection::{Connector, LazyConnection};
use super::{sort_newest_first, StoreError, TaskStore};

const CREATED_INDEX: &str = "tasks:by_created";

fn task_key(id: Uuid) -> String {
    format!("task:{}", id)
}

/// A multiplexed connection plus a flag that commands clear when the
/// connection itself fails.
#[derive(Clone)]
pub struct RedisHandle {
    conn: MultiplexedConnection,
    healthy: Arc<AtomicBool>,
}

/// Converts a command result, marking the connection unusable on I/O
/// failures so the next request reconnects.
fn checked<T>(healthy: &AtomicBool, result: RedisResult<T>) -> Result<T, StoreError> {
    result.map_err(|err| {
        if err.is_io_error() || err.is_connection_dropped() || err.is_timeout() {
            if healthy.swap(false, Ordering::AcqRel) {
                warn!(error = %err, "redis connection lost");
            }
        }
        StoreError::from(err)
    })
}

pub struct RedisConnector {
    url: Option<String>,
}

#[async_trait]
impl Connector for RedisConnector {
    type Connection = RedisHandle;

    async fn connect(&self) -> Result<RedisHandle, StoreError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Config("REDIS_URL environment variable is not defined".into()))?;

        let client = Client::open(url)?;
        let addr = client.get_connection_info().addr.to_string();
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => {
                info!(%addr, "connected to redis");
                Ok(RedisHandle {
                    conn,
                    healthy: Arc::new(AtomicBool::new(true)),
                })
            }
            Err(err) => {
                warn!(%addr, error = %err, "redis connection failed");
                Err(err.into())
            }
        }
    }

    fn is_ready(&self, connection: &RedisHandle) -> bool {
        connection.healthy.load(Ordering::Acquire)
    }
}

pub struct RedisTaskStore {
    connection: LazyConnection<RedisConnector>,
}

impl RedisTaskStore {
    pub fn new(url: Option<String>, connect_timeout: Duration) -> Self {
        Self {
            connection: LazyConnection::new(RedisConnector { url }, connect_timeout),
        }
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let RedisHandle { mut conn, healthy } = self.connection.get().await?;

        let ids: Vec<String> = checked(&healthy, conn.zrevrange(CREATED_INDEX, 0, -1).await)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| format!("task:{}", id)).collect();
        let documents: Vec<Option<String>> = checked(
            &healthy,
            redis::cmd("MGET").arg(&keys).query_async(&mut conn).await,
        )?;

        let mut tasks = Vec::with_capacity(documents.len());
        for (id, document) in ids.iter().zip(documents) {
            match document {
                Some(json) => tasks.push(serde_json::from_str::<Task>(&json)?),
                None => warn!(task_id = %id, "index entry without a task document"),
            }
        }
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let RedisHandle { mut conn, healthy } = self.connection.get().await?;

        let task_json: Option<String> = checked(&healthy, conn.get(task_key(id)).await)?;
        task_json
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn create(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let task = Task::new(new_task);
        let task_json = serde_json::to_string(&task)?;

        let RedisHandle { mut conn, healthy } = self.connection.get().await?;
        let stored = redis::pipe()
            .atomic()
            .set(task_key(task.id), &task_json)
            .ignore()
            .zadd(CREATED_INDEX, task.id.to_string(), task.created_at.timestamp_millis())
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await;
        checked(&healthy, stored)?;

        info!(task_id = %task.id, "task created");
        Ok(task)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Option<Task>, StoreError> {
        let RedisHandle { mut conn, healthy } = self.connection.get().await?;
        let key = task_key(id);

        let task_json: Option<String> = checked(&healthy, conn.get(&key).await)?;
        let Some(json) = task_json else {
            return Ok(None);
        };

        let mut task: Task = serde_json::from_str(&json)?;
        patch.apply_to(&mut task);
        let updated_json = serde_json::to_string(&task)?;

        // XX: a task deleted since the read stays deleted.
        let written: Option<String> = checked(
            &healthy,
            redis::cmd("SET")
                .arg(&key)
                .arg(&updated_json)
                .arg("XX")
                .query_async(&mut conn)
                .await,
        )?;
        if written.is_none() {
            debug!(task_id = %id, "task vanished during update");
            return Ok(None);
        }

        info!(task_id = %id, "task updated");
        Ok(Some(task))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let RedisHandle { mut conn, healthy } = self.connection.get().await?;

        let (deleted, _unindexed): (usize, usize) = checked(
            &healthy,
            redis::pipe()
                .atomic()
                .del(task_key(id))
                .zrem(CREATED_INDEX, id.to_string())
                .query_async(&mut conn)
                .await,
        )?;

        if deleted > 0 {
            info!(task_id = %id, "task deleted");
        }
        Ok(deleted > 0)
    }
}
