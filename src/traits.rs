use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::task::{Task, TaskDraft, TaskId};

/// A place tasks are stored in, usually the remote task service.
///
/// Every call is a single request. Implementors must not retry on their own (see [`Retrying`](crate::retry::Retrying) for that).
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns every task this store contains
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError>;

    /// Create a task. The store picks its ID, and the created task is returned
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError>;

    /// Replace the task `id` with `task`.
    /// This is a full replace: `task` must contain the complete desired state
    async fn update_task(&self, id: &TaskId, task: &Task) -> Result<Task, StoreError>;

    /// Delete the task `id`.
    /// Deleting a task that is already gone may either succeed or return [`StoreError::NotFound`], callers must tolerate both
    async fn delete_task(&self, id: &TaskId) -> Result<Confirmation, StoreError>;
}

#[async_trait]
impl<S: TaskStore + ?Sized> TaskStore for Arc<S> {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        (**self).list_tasks().await
    }
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        (**self).create_task(draft).await
    }
    async fn update_task(&self, id: &TaskId, task: &Task) -> Result<Task, StoreError> {
        (**self).update_task(id, task).await
    }
    async fn delete_task(&self, id: &TaskId) -> Result<Confirmation, StoreError> {
        (**self).delete_task(id).await
    }
}

/// What a store says after a successful update or deletion
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Confirmation {
    #[serde(default)]
    pub message: Option<String>,
}

impl Confirmation {
    pub fn new<S: ToString>(message: S) -> Self {
        Self { message: Some(message.to_string()) }
    }
}
