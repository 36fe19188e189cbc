use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use super::cache::Cache;
use super::status::StoreStatus;
use crate::client::PocketsApi;
use crate::credential::CredentialHolder;
use crate::error::AppError;
use crate::models::{NewTaskRequest, Task, UpdateTaskRequest};

/// Task operations over the shared cache. The flat list exposed by
/// [`TaskStore::tasks`] is the task list of the active pocket, the one most
/// recently loaded.
pub struct TaskStore {
    api: Arc<dyn PocketsApi>,
    credentials: CredentialHolder,
    cache: Cache,
    status: StoreStatus,
    generation: AtomicU64,
    applied: AtomicU64,
}

impl TaskStore {
    pub fn new(api: Arc<dyn PocketsApi>, credentials: CredentialHolder, cache: Cache) -> Self {
        Self {
            api,
            credentials,
            cache,
            status: StoreStatus::default(),
            generation: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.cache.read(|c| c.active_tasks())
    }

    pub fn tasks_for(&self, pocket_id: &str) -> Option<Vec<Task>> {
        self.cache.read(|c| c.tasks_for(pocket_id).map(<[Task]>::to_vec))
    }

    pub fn active_pocket_id(&self) -> Option<String> {
        self.cache.read(|c| c.active_pocket_id().map(str::to_string))
    }

    pub fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.status.error()
    }

    /// Loads one pocket's tasks and makes it the active pocket. A response
    /// is discarded if a later `fetch_tasks` has already been applied.
    pub async fn fetch_tasks(&self, pocket_id: &str) -> Result<(), AppError> {
        self.status
            .track("fetch tasks", async {
                if pocket_id.trim().is_empty() {
                    return Err(AppError::Validation(
                        "Pocket ID is required to fetch tasks".to_string(),
                    ));
                }
                self.credentials.require()?;

                let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let tasks = self.api.list_tasks(pocket_id).await?;
                let count = tasks.len();

                let applied = self.cache.write(|cache| {
                    if self.applied.fetch_max(ticket, Ordering::SeqCst) >= ticket {
                        return false;
                    }
                    cache.set_tasks(pocket_id, tasks);
                    true
                });
                if applied {
                    info!("Fetched {} tasks for pocket {}", count, pocket_id);
                } else {
                    debug!("Discarding stale task list for pocket {}", pocket_id);
                }
                Ok(())
            })
            .await
    }

    pub async fn create_task(&self, pocket_id: &str, req: NewTaskRequest) -> Result<Task, AppError> {
        self.status
            .track("create task", async {
                self.credentials.require()?;
                let task = self.api.create_task(pocket_id, &req).await?;
                info!("Created task {} in pocket {}", task.id, pocket_id);
                self.cache.write(|cache| cache.push_task(pocket_id, task.clone()));
                Ok(task)
            })
            .await
    }

    /// Sends a partial update, then rewrites only `description` and
    /// `is_completed` of the cached task with that id.
    pub async fn update_task(
        &self,
        pocket_id: &str,
        task_id: &str,
        req: UpdateTaskRequest,
    ) -> Result<(), AppError> {
        self.status
            .track("update task", async {
                self.credentials.require()?;
                let patch = self.api.update_task(pocket_id, task_id, &req).await?;
                let found = self
                    .cache
                    .write(|cache| cache.patch_task(pocket_id, task_id, &patch));
                if !found {
                    debug!("Updated task {} is not cached", task_id);
                }
                Ok(())
            })
            .await
    }

    /// Flips completion of a cached task.
    pub async fn toggle_completed(&self, pocket_id: &str, task_id: &str) -> Result<(), AppError> {
        let current = self.cache.read(|c| {
            c.tasks_for(pocket_id)
                .and_then(|tasks| tasks.iter().find(|t| t.id == task_id))
                .map(|t| t.is_completed)
        });
        let Some(current) = current else {
            let err = AppError::Validation(format!("Task {} is not loaded", task_id));
            self.status.record("toggle task", &err);
            return Err(err);
        };

        self.update_task(
            pocket_id,
            task_id,
            UpdateTaskRequest {
                description: None,
                is_completed: Some(!current),
            },
        )
        .await
    }

    pub async fn delete_task(&self, pocket_id: &str, task_id: &str) -> Result<(), AppError> {
        self.status
            .track("delete task", async {
                self.credentials.require()?;
                self.api.delete_task(pocket_id, task_id).await?;
                self.cache.write(|cache| cache.remove_task(pocket_id, task_id));
                info!("Deleted task {} from pocket {}", task_id, pocket_id);
                Ok(())
            })
            .await
    }
}
