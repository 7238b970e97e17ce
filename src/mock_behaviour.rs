//! Failure injection for [`MockStore`](crate::mock_store::MockStore)

use crate::error::StoreError;

/// Which calls of a mock store should fail.
///
/// For an operation to fail _n_ times after _m_ successes, set its budget to `(m, n)`
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// While set, every call goes through and no budget is consumed
    pub is_suspended: bool,

    pub list_tasks_behaviour: (u32, u32),
    pub create_task_behaviour: (u32, u32),
    pub update_task_behaviour: (u32, u32),
    pub delete_task_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All operations will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            list_tasks_behaviour: (0, n_fails),
            create_task_behaviour: (0, n_fails),
            update_task_behaviour: (0, n_fails),
            delete_task_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_list_tasks(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_tasks_behaviour, "list_tasks")
    }
    pub fn can_create_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.create_task_behaviour, "create_task")
    }
    pub fn can_update_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.update_task_behaviour, "update_task")
    }
    pub fn can_delete_task(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_task_behaviour, "delete_task")
    }
}


/// Consume one store call out of a `(successes, failures)` budget.
/// Successes are used up first, then failures. Once both are exhausted, every call goes through
fn decrement(budget: &mut (u32, u32), operation: &str) -> Result<(), StoreError> {
    if budget.0 > 0 {
        budget.0 -= 1;
        log::debug!("Mock store: letting {} through ({:?} left)", operation, budget);
        Ok(())
    } else if budget.1 > 0 {
        budget.1 -= 1;
        log::debug!("Mock store: failing {} ({:?} left)", operation, budget);
        Err(StoreError::network(format!("simulated network failure on {}", operation)))
    } else {
        Ok(())
    }
}
