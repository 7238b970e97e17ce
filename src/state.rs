//! The in-memory task collection, and the patches that mirror successful remote writes
//!
//! The collection is never re-fetched after a write: once the service has confirmed a write, the very same change is
//! applied locally. Because several writes may be in flight at the same time, every write is tagged with a
//! [`RequestToken`]: a response is dropped once a response to a later request on the same task has been applied.

use std::collections::{HashMap, HashSet};

use crate::task::{Task, TaskId};

/// A change to apply to the local collection, after the service has confirmed it
#[derive(Clone, Debug, PartialEq)]
pub enum Patch {
    /// The whole collection has been fetched
    Loaded(Vec<Task>),
    /// A task has been created
    Created(Task),
    /// A task has been replaced
    Updated(Task),
    /// A task has been deleted
    Deleted(TaskId),
}

/// The canonical list of tasks of a session
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new(tasks: Vec<Task>) -> Self {
        let mut collection = Self::default();
        collection.apply(Patch::Loaded(tasks));
        collection
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Apply a patch, and return whether the collection has changed
    pub fn apply(&mut self, patch: Patch) -> bool {
        match patch {
            Patch::Loaded(tasks) => {
                let mut unique: Vec<Task> = Vec::with_capacity(tasks.len());
                for task in tasks {
                    if unique.iter().any(|t| t.id() == task.id()) {
                        log::warn!("The service returned task {} twice. Only the first one is kept", task.id());
                        continue;
                    }
                    unique.push(task);
                }
                let changed = unique != self.tasks;
                self.tasks = unique;
                changed
            },
            Patch::Created(task) => {
                match self.position(task.id()) {
                    Some(index) => self.replace_at(index, task),
                    None => {
                        self.tasks.push(task);
                        true
                    },
                }
            },
            Patch::Updated(task) => {
                match self.position(task.id()) {
                    Some(index) => self.replace_at(index, task),
                    None => {
                        log::debug!("Not patching task {}, it is not in the collection", task.id());
                        false
                    },
                }
            },
            Patch::Deleted(id) => {
                match self.position(&id) {
                    Some(index) => {
                        self.tasks.remove(index);
                        true
                    },
                    None => {
                        log::debug!("Not removing task {}, it is not in the collection", id);
                        false
                    },
                }
            },
        }
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id() == id)
    }

    fn replace_at(&mut self, index: usize, task: Task) -> bool {
        if self.tasks[index] == task {
            return false;
        }
        self.tasks[index] = task;
        true
    }
}



/// What a request is about
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKey {
    /// A fetch of the whole collection
    List,
    /// A creation. Each one is independent from the others
    Create(u64),
    /// A write on an existing task
    Task(TaskId),
}

/// A ticket handed out when a request starts, and redeemed when its response arrives
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestToken {
    key: RequestKey,
    serial: u64,
}

impl RequestToken {
    pub fn key(&self) -> &RequestKey {
        &self.key
    }
}

/// Decides which responses may patch the collection.
///
/// Serials only ever grow. A confirmed response is applied unless a response to a request issued after it has already
/// been applied for the same key. Failures never undo anything, and a request still in flight never blocks an older one.
#[derive(Debug, Default)]
pub struct RequestTokens {
    next_serial: u64,
    /// Tokens up to this serial have been invalidated
    floor: u64,
    applied: HashMap<RequestKey, u64>,
    pending: HashSet<u64>,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self, key: RequestKey) -> RequestToken {
        self.next_serial += 1;
        let serial = self.next_serial;
        self.pending.insert(serial);
        RequestToken { key, serial }
    }

    /// Start a request on task `id`
    pub fn begin_task(&mut self, id: &TaskId) -> RequestToken {
        self.issue(RequestKey::Task(id.clone()))
    }

    /// Start a fetch of the whole collection
    pub fn begin_list(&mut self) -> RequestToken {
        self.issue(RequestKey::List)
    }

    /// Start a creation
    pub fn begin_create(&mut self) -> RequestToken {
        let key = RequestKey::Create(self.next_serial + 1);
        self.issue(key)
    }

    /// Whether a successful response for `token` would still be applied
    pub fn is_current(&self, token: &RequestToken) -> bool {
        if token.serial <= self.floor {
            return false;
        }
        match self.applied.get(&token.key) {
            Some(&last) => token.serial > last,
            None => true,
        }
    }

    /// Redeem `token` once a successful response has arrived. Returns whether its result may be applied
    pub fn finish(&mut self, token: &RequestToken) -> bool {
        self.pending.remove(&token.serial);
        if self.is_current(token) == false {
            return false;
        }
        self.applied.insert(token.key.clone(), token.serial);
        true
    }

    /// Redeem `token` after its request failed. Nothing is recorded as applied
    pub fn abandon(&mut self, token: &RequestToken) {
        self.pending.remove(&token.serial);
    }

    /// Number of requests whose response is still awaited
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Make every outstanding token stale. Used when the owner of the collection goes away
    pub fn invalidate_all(&mut self) {
        if self.pending.is_empty() == false {
            log::debug!("Dropping {} outstanding requests", self.pending.len());
        }
        self.pending.clear();
        self.floor = self.next_serial;
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    fn task(id: u64, title: &str) -> Task {
        Task::new(TaskId::from(id), title, "2024-05-01".parse().unwrap(), TaskStatus::Pending)
    }

    fn ids(collection: &TaskCollection) -> Vec<TaskId> {
        collection.tasks().iter().map(|t| t.id().clone()).collect()
    }

    #[test]
    fn complete_scenario() {
        let mut collection = TaskCollection::new(vec![task(1, "Buy milk")]);
        let done = collection.get(&TaskId::from(1)).unwrap().completed();
        assert!(collection.apply(Patch::Updated(done)));

        let only = &collection.tasks()[0];
        assert_eq!(collection.len(), 1);
        assert_eq!(only.id(), &TaskId::from(1));
        assert_eq!(only.title(), "Buy milk");
        assert_eq!(only.duedate().as_str(), "2024-05-01");
        assert_eq!(only.status(), TaskStatus::Completed);
    }

    #[test]
    fn update_is_idempotent_and_in_place() {
        let mut collection = TaskCollection::new(vec![task(1, "a"), task(2, "b"), task(3, "c")]);
        let mut renamed = task(2, "B");
        renamed.set_status(TaskStatus::InProgress);

        assert!(collection.apply(Patch::Updated(renamed.clone())));
        let once = collection.clone();
        assert_eq!(collection.apply(Patch::Updated(renamed)), false);
        assert_eq!(collection, once);
        assert_eq!(ids(&collection), vec![TaskId::from(1), TaskId::from(2), TaskId::from(3)]);
        assert_eq!(collection.tasks()[1].title(), "B");
    }

    #[test]
    fn updating_an_unknown_task_does_nothing() {
        let mut collection = TaskCollection::new(vec![task(1, "a")]);
        assert_eq!(collection.apply(Patch::Updated(task(9, "z"))), false);
        assert_eq!(ids(&collection), vec![TaskId::from(1)]);
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut collection = TaskCollection::new(vec![task(1, "a"), task(2, "b")]);
        assert!(collection.apply(Patch::Deleted(TaskId::from(2))));
        assert_eq!(ids(&collection), vec![TaskId::from(1)]);

        let mut collection = TaskCollection::new(vec![task(1, "a"), task(2, "b"), task(3, "c")]);
        assert!(collection.apply(Patch::Deleted(TaskId::from(2))));
        assert_eq!(ids(&collection), vec![TaskId::from(1), TaskId::from(3)]);
        assert_eq!(collection.apply(Patch::Deleted(TaskId::from(2))), false);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn created_tasks_are_appended() {
        let mut collection = TaskCollection::new(vec![task(1, "a")]);
        assert!(collection.apply(Patch::Created(task(2, "b"))));
        assert_eq!(ids(&collection), vec![TaskId::from(1), TaskId::from(2)]);
        // The same creation reported twice does not duplicate it
        assert_eq!(collection.apply(Patch::Created(task(2, "b"))), false);
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn loading_drops_duplicate_ids() {
        let collection = TaskCollection::new(vec![task(1, "a"), task(2, "b"), task(1, "again")]);
        assert_eq!(ids(&collection), vec![TaskId::from(1), TaskId::from(2)]);
        assert_eq!(collection.tasks()[0].title(), "a");
    }

    #[test]
    fn latest_request_wins() {
        let mut tokens = RequestTokens::new();
        let id = TaskId::from(1);
        let first = tokens.begin_task(&id);
        let second = tokens.begin_task(&id);
        let other = tokens.begin_task(&TaskId::from(2));

        assert_eq!(tokens.in_flight(), 3);
        assert!(tokens.finish(&second));
        // The first response arrives after the second one has been applied: it must not override it
        assert_eq!(tokens.is_current(&first), false);
        assert_eq!(tokens.finish(&first), false);
        assert!(tokens.finish(&other));
        assert_eq!(tokens.in_flight(), 0);
    }

    #[test]
    fn confirmed_writes_are_not_blocked_by_later_ones() {
        let mut tokens = RequestTokens::new();
        let id = TaskId::from(1);
        let first = tokens.begin_task(&id);
        let second = tokens.begin_task(&id);

        // The second request is still in flight when the first one is confirmed
        assert!(tokens.finish(&first));
        tokens.abandon(&second);
        assert_eq!(tokens.in_flight(), 0);

        // A failure does not prevent a later write from being applied
        let third = tokens.begin_task(&id);
        assert!(tokens.finish(&third));
    }

    #[test]
    fn stale_list_responses_are_dropped() {
        let mut tokens = RequestTokens::new();
        let older = tokens.begin_list();
        let newer = tokens.begin_list();
        assert!(tokens.finish(&newer));
        assert_eq!(tokens.finish(&older), false);
    }

    #[test]
    fn creations_are_independent() {
        let mut tokens = RequestTokens::new();
        let a = tokens.begin_create();
        let b = tokens.begin_create();
        assert_ne!(a.key(), b.key());
        assert!(tokens.finish(&a));
        assert!(tokens.finish(&b));
    }

    #[test]
    fn invalidated_tokens_stay_stale() {
        let mut tokens = RequestTokens::new();
        let list = tokens.begin_list();
        let write = tokens.begin_task(&TaskId::from(1));
        tokens.invalidate_all();
        assert_eq!(tokens.finish(&list), false);
        assert_eq!(tokens.finish(&write), false);

        let fresh = tokens.begin_task(&TaskId::from(1));
        assert_eq!(tokens.finish(&write), false);
        assert!(tokens.finish(&fresh));
    }
}
