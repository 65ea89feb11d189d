//! In-process task store, used by tests and by `TASKS_STORE=memory`.

use std::collections::HashMap;

use async_trait::async_trait;
use shared::{NewTask, Task, TaskPatch};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::{sort_newest_first, StoreError, TaskStore};

#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a fully formed task as-is, keeping its id and timestamp.
    pub async fn insert(&self, task: Task) {
        self.tasks.write().await.insert(task.id, task);
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self.tasks.read().await.values().cloned().collect();
        sort_newest_first(&mut tasks);
        Ok(tasks)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn create(&self, new_task: NewTask) -> Result<Task, StoreError> {
        let task = Task::new(new_task);
        self.tasks.write().await.insert(task.id, task.clone());
        info!(task_id = %task.id, "task created");
        Ok(task)
    }

    async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Option<Task>, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(task);
        info!(task_id = %id, "task updated");
        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let removed = self.tasks.write().await.remove(&id).is_some();
        if removed {
            info!(task_id = %id, "task deleted");
        }
        Ok(removed)
    }
}
