//! An optional decorator that retries requests when the service cannot be reached
//!
//! Stores never retry on their own. Wrap one into a [`Retrying`] to get retries with an exponential backoff.
//! Only network failures are retried: a request that the service rejected would be rejected again.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::task::{Task, TaskDraft, TaskId};
use crate::traits::{Confirmation, TaskStore};

/// How many times a request is attempted, and how long to wait in between
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. `1` means "no retry"
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub initial_backoff: Duration,
    /// Every subsequent wait is this many times longer than the previous one
    pub multiplier: u32,
}

impl RetryPolicy {
    /// A single attempt
    pub fn none() -> Self {
        Self { max_attempts: 1, initial_backoff: Duration::from_millis(0), multiplier: 1 }
    }

    /// `max_attempts` attempts, with a backoff that doubles every time
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), initial_backoff, multiplier: 2 }
    }

    /// How long to wait after the failed attempt number `attempt` (starting at 1)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}


/// A [`TaskStore`] that retries the calls of an inner store on network failures
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: TaskStore> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run<T, F, Fut>(&self, descr: &str, mut call: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let wait = self.policy.backoff(attempt);
                    log::warn!("{} failed (attempt {}/{}): {}. Retrying in {:?}", descr, attempt, self.policy.max_attempts, err, wait);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                },
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<S: TaskStore> TaskStore for Retrying<S> {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.run("list_tasks", || self.inner.list_tasks()).await
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        self.run("create_task", || self.inner.create_task(draft)).await
    }

    async fn update_task(&self, id: &TaskId, task: &Task) -> Result<Task, StoreError> {
        self.run("update_task", || self.inner.update_task(id, task)).await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<Confirmation, StoreError> {
        self.run("delete_task", || self.inner.delete_task(id)).await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_behaviour::MockBehaviour;
    use crate::mock_store::MockStore;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[test]
    fn backoff_grows() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(RetryPolicy::new(0, Duration::from_millis(1)).max_attempts, 1);
    }

    #[tokio::test]
    async fn retries_network_failures() {
        let store = MockStore::new();
        store.set_behaviour(MockBehaviour { list_tasks_behaviour: (0, 2), ..MockBehaviour::default() });

        let retrying = Retrying::new(store, fast_policy(3));
        assert!(retrying.list_tasks().await.is_ok());
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let store = MockStore::new();
        store.set_behaviour(MockBehaviour { list_tasks_behaviour: (0, 3), ..MockBehaviour::default() });

        let retrying = Retrying::new(store, fast_policy(3));
        assert!(matches!(retrying.list_tasks().await, Err(StoreError::Network(_))));
        // The fourth call would have succeeded
        assert!(retrying.inner().list_tasks().await.is_ok());
    }

    #[tokio::test]
    async fn does_not_retry_rejections() {
        let store = MockStore::new();
        let retrying = Retrying::new(store, fast_policy(5));
        let missing = TaskId::from("nope");
        assert!(matches!(retrying.delete_task(&missing).await, Err(StoreError::NotFound(_))));
    }
}
