//! An in-memory task store, that mimics the remote service
//!
//! It is used by tests, and can also back a demo front-end when no server is available.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::StoreError;
use crate::mock_behaviour::MockBehaviour;
use crate::task::{Task, TaskDraft, TaskId};
use crate::traits::{Confirmation, TaskStore};

/// A [`TaskStore`] that keeps its tasks in memory and picks random IDs, just like the service would
#[derive(Debug, Default)]
pub struct MockStore {
    tasks: Mutex<Vec<Task>>,
    behaviour: Mutex<MockBehaviour>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already contains `tasks`
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            behaviour: Mutex::new(MockBehaviour::default()),
        }
    }

    /// A copy of what the store currently contains
    pub fn tasks(&self) -> Vec<Task> {
        lock(&self.tasks).clone()
    }

    pub fn set_behaviour(&self, behaviour: MockBehaviour) {
        *lock(&self.behaviour) = behaviour;
    }
}

#[async_trait]
impl TaskStore for MockStore {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        lock(&self.behaviour).can_list_tasks()?;
        Ok(self.tasks())
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        lock(&self.behaviour).can_create_task()?;
        let id = TaskId::Text(uuid::Uuid::new_v4().to_hyphenated().to_string());
        let task = Task::from_draft(id, draft.clone());
        lock(&self.tasks).push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, task: &Task) -> Result<Task, StoreError> {
        lock(&self.behaviour).can_update_task()?;
        let mut tasks = lock(&self.tasks);
        match tasks.iter_mut().find(|t| t.id() == id) {
            None => Err(StoreError::NotFound(id.clone())),
            Some(stored) => {
                *stored = task.clone();
                Ok(task.clone())
            },
        }
    }

    async fn delete_task(&self, id: &TaskId) -> Result<Confirmation, StoreError> {
        lock(&self.behaviour).can_delete_task()?;
        let mut tasks = lock(&self.tasks);
        match tasks.iter().position(|t| t.id() == id) {
            None => Err(StoreError::NotFound(id.clone())),
            Some(index) => {
                tasks.remove(index);
                Ok(Confirmation::new("Task deleted"))
            },
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    #[tokio::test]
    async fn mock_store_assigns_ids() {
        let store = MockStore::new();
        let draft = TaskDraft::new("Buy milk", "2024-05-01".parse().unwrap(), TaskStatus::Pending);

        let first = store.create_task(&draft).await.unwrap();
        let second = store.create_task(&draft).await.unwrap();
        assert_ne!(first.id(), second.id());
        assert_eq!(store.list_tasks().await.unwrap(), vec![first.clone(), second]);

        store.delete_task(first.id()).await.unwrap();
        assert!(store.delete_task(first.id()).await.unwrap_err().is_not_found());
        assert!(store.update_task(first.id(), &first).await.unwrap_err().is_not_found());
    }
}
