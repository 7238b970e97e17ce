//! The state container of the main screen
//!
//! A [`Session`] owns the canonical task collection, the UI selection state (selected day, search query) and both
//! forms. Front-ends read derived views out of it and send user actions back into it.
//!
//! Every action that needs the service issues one request. Failures are logged and leave the collection at its
//! last known good value. Nothing is retried: the user can simply trigger the same action again.
//!
//! Actions take `&self`, so that several of them can be in flight at the same time. The internal lock is never held
//! while waiting for the service.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use crate::error::{FormError, StoreError};
use crate::filter::{tasks_due_on, tasks_matching};
use crate::form::{CreateDraft, CreateForm, EditForm};
use crate::state::{Patch, RequestToken, RequestTokens, TaskCollection};
use crate::task::{Task, TaskId};
use crate::traits::TaskStore;
use crate::view::{local_today, ShellView, UiEvent};

#[derive(Debug, Default)]
struct UiState {
    collection: TaskCollection,
    tokens: RequestTokens,
    selected_date: Option<NaiveDate>,
    search_query: String,
    create_form: CreateForm,
    edit_form: EditForm,
    closed: bool,
}

/// The main screen: a task collection mirrored from a [`TaskStore`], plus what the user has selected
pub struct Session<S: TaskStore> {
    store: S,
    state: Mutex<UiState>,
}

impl<S: TaskStore> Session<S> {
    /// Create a session. Nothing is fetched until [`Self::load`] is called
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: Mutex::new(UiState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record the end of a successful request, and apply `patch` unless a later request of the same kind has already
    /// been applied. Returns whether the patch was applied
    fn apply_if_current(&self, token: &RequestToken, patch: Patch) -> bool {
        let mut state = self.lock();
        if state.tokens.finish(token) == false || state.closed {
            log::debug!("Ignoring a stale response ({:?})", token.key());
            return false;
        }
        state.collection.apply(patch);
        true
    }

    /// Record the end of a request that failed
    fn abandon(&self, token: &RequestToken) {
        self.lock().tokens.abandon(token);
    }

    /// Fetch the whole collection from the store, replacing the local one.
    ///
    /// Returns whether it worked. On failure, the current collection is kept
    pub async fn load(&self) -> bool {
        let token = self.lock().tokens.begin_list();

        match self.store.list_tasks().await {
            Ok(tasks) => {
                let count = tasks.len();
                if self.apply_if_current(&token, Patch::Loaded(tasks)) {
                    log::info!("Loaded {} tasks", count);
                }
                true
            },
            Err(err) => {
                self.abandon(&token);
                log::error!("Error fetching tasks: {}", err);
                false
            },
        }
    }

    /// A copy of the current collection
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().collection.tasks().to_vec()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.lock().collection.get(id).cloned()
    }

    /// The day shown in the "due" list. Defaults to today
    pub fn selected_date(&self) -> NaiveDate {
        self.lock().selected_date.unwrap_or_else(local_today)
    }

    pub fn select_date(&self, date: NaiveDate) {
        log::debug!("Selected date: {}", date);
        self.lock().selected_date = Some(date);
    }

    pub fn search_query(&self) -> String {
        self.lock().search_query.clone()
    }

    pub fn set_search_query<Q: ToString>(&self, query: Q) {
        self.lock().search_query = query.to_string();
    }

    /// Tasks due on the selected date, in collection order
    pub fn due_on_selected(&self) -> Vec<Task> {
        let state = self.lock();
        let date = state.selected_date.unwrap_or_else(local_today);
        tasks_due_on(state.collection.tasks(), date).into_iter().cloned().collect()
    }

    /// Tasks matching the search query, in collection order
    pub fn matching_search(&self) -> Vec<Task> {
        let state = self.lock();
        tasks_matching(state.collection.tasks(), &state.search_query).into_iter().cloned().collect()
    }

    /// Everything a front-end needs to render the main screen, relative to `today`
    pub fn view(&self, today: NaiveDate) -> ShellView {
        let state = self.lock();
        let date = state.selected_date.unwrap_or(today);
        let due = tasks_due_on(state.collection.tasks(), date);
        let matching = tasks_matching(state.collection.tasks(), &state.search_query);

        let mut view = ShellView::new(date, &state.search_query, &due, &matching, today);
        view.create_form = state.create_form.state().draft().cloned();
        view.edit_form = state.edit_form.draft().cloned();
        view.submitting = state.create_form.state().is_submitting() || state.edit_form.is_submitting();
        view
    }


    /// Send `task` as the new state of task `id`, and patch the collection if the store accepted it
    async fn send_update(&self, id: &TaskId, task: &Task) -> Result<(), StoreError> {
        let token = self.lock().tokens.begin_task(id);

        match self.store.update_task(id, task).await {
            Ok(updated) => {
                self.apply_if_current(&token, Patch::Updated(updated));
                Ok(())
            },
            Err(err) => {
                self.abandon(&token);
                Err(err)
            },
        }
    }

    /// Mark a task as completed. Every other field is kept.
    ///
    /// Returns whether the store accepted the change. An accepted change is not applied locally when a later write on
    /// the same task has already been applied
    pub async fn complete(&self, id: &TaskId) -> bool {
        let updated = match self.task(id) {
            None => {
                log::warn!("Cannot complete task {}: it is not in the collection", id);
                return false;
            },
            Some(task) => task.completed(),
        };

        match self.send_update(id, &updated).await {
            Ok(()) => true,
            Err(err) => {
                log::error!("Error completing task {}: {}", id, err);
                false
            },
        }
    }

    /// Delete a task.
    ///
    /// A task the store does not know anymore has already been deleted, so it is removed locally as well
    pub async fn delete(&self, id: &TaskId) -> bool {
        let token = self.lock().tokens.begin_task(id);

        match self.store.delete_task(id).await {
            Ok(confirmation) => {
                log::info!("{}", confirmation.message.as_deref().unwrap_or("Task deleted"));
            },
            Err(StoreError::NotFound(_)) => {
                log::warn!("Task {} was already deleted", id);
            },
            Err(err) => {
                log::error!("Error deleting task {}: {}", id, err);
                self.abandon(&token);
                return false;
            },
        }

        self.apply_if_current(&token, Patch::Deleted(id.clone()));
        true
    }


    /// Open the edit form on a snapshot of task `id`
    pub fn open_edit(&self, id: &TaskId) -> Result<(), FormError> {
        let mut state = self.lock();
        let task = state.collection.get(id).cloned().ok_or_else(|| FormError::NoSuchTask(id.clone()))?;
        state.edit_form.open_for(&task)
    }

    /// The task being edited, if any
    pub fn edit_draft(&self) -> Option<Task> {
        self.lock().edit_form.draft().cloned()
    }

    /// Change the draft of the edit form. The collection itself is untouched until the form is submitted.
    /// Returns false if the form is not open
    pub fn update_edit_draft<F: FnOnce(&mut Task)>(&self, change: F) -> bool {
        match self.lock().edit_form.draft_mut() {
            None => false,
            Some(draft) => {
                change(draft);
                true
            },
        }
    }

    /// Send the edited task. On success the form closes and the collection is patched.
    /// On failure the form stays open with the edits intact
    pub async fn submit_edit(&self) -> Result<(), FormError> {
        let (draft, submission) = self.lock().edit_form.begin_submit()?;

        match self.send_update(draft.id(), &draft).await {
            Ok(()) => {
                self.lock().edit_form.submit_succeeded(submission);
                Ok(())
            },
            Err(err) => {
                log::error!("Error updating task {}: {}", draft.id(), err);
                self.lock().edit_form.submit_failed(submission);
                Err(err.into())
            },
        }
    }

    /// Close the edit form, dropping its draft
    pub fn cancel_edit(&self) {
        self.lock().edit_form.cancel();
    }


    /// Show or hide the create form. Returns whether it is now shown
    pub fn toggle_create_form(&self) -> bool {
        self.lock().create_form.toggle()
    }

    pub fn create_form_open(&self) -> bool {
        self.lock().create_form.is_open()
    }

    /// Change the draft of the create form. Returns false if the form is not open
    pub fn update_create_draft<F: FnOnce(&mut CreateDraft)>(&self, change: F) -> bool {
        match self.lock().create_form.draft_mut() {
            None => false,
            Some(draft) => {
                change(draft);
                true
            },
        }
    }

    /// Create the task described by the create form.
    ///
    /// Missing fields are reported without contacting the store. On success the form is cleared and closed, and the
    /// new task is appended to the collection. On failure the form stays open with its input intact
    pub async fn submit_create(&self) -> Result<Task, FormError> {
        let (payload, submission, token) = {
            let mut state = self.lock();
            let (payload, submission) = state.create_form.begin_submit()?;
            (payload, submission, state.tokens.begin_create())
        };

        match self.store.create_task(&payload).await {
            Ok(task) => {
                log::info!("Task created: {} ({})", task.title(), task.id());
                self.apply_if_current(&token, Patch::Created(task.clone()));
                self.lock().create_form.submit_succeeded(submission);
                Ok(task)
            },
            Err(err) => {
                log::error!("Error submitting form: {}", err);
                self.abandon(&token);
                self.lock().create_form.submit_failed(submission);
                Err(err.into())
            },
        }
    }


    /// Handle a user action. Returns whether it succeeded (failures are logged)
    pub async fn dispatch(&self, event: UiEvent) -> bool {
        match event {
            UiEvent::SelectDate(date) => { self.select_date(date); true },
            UiEvent::Search(query) => { self.set_search_query(query); true },

            UiEvent::ToggleCreateForm => { self.toggle_create_form(); true },
            UiEvent::SetCreateTitle(title) => self.update_create_draft(|d| d.title = title),
            UiEvent::SetCreateDueDate(date) => self.update_create_draft(|d| d.due_date = date),
            UiEvent::SetCreateStatus(status) => self.update_create_draft(|d| d.status = status),
            UiEvent::SubmitCreate => log_form_result("create", self.submit_create().await.map(|_| ())),

            UiEvent::Complete(id) => self.complete(&id).await,
            UiEvent::Edit(id) => log_form_result("edit", self.open_edit(&id)),
            UiEvent::Delete(id) => self.delete(&id).await,

            UiEvent::SetEditTitle(title) => self.update_edit_draft(|t| t.set_title(title)),
            UiEvent::SetEditDueDate(date) => self.update_edit_draft(|t| t.set_duedate(date.into())),
            UiEvent::SetEditStatus(status) => self.update_edit_draft(|t| t.set_status(status)),
            UiEvent::SubmitEdit => log_form_result("edit", self.submit_edit().await),
            UiEvent::CancelEdit => { self.cancel_edit(); true },
        }
    }

    /// Tear the session down: responses still awaited will not patch anything anymore
    pub fn close(&self) {
        let mut state = self.lock();
        state.tokens.invalidate_all();
        state.closed = true;
        log::debug!("Session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

fn log_form_result(form: &str, result: Result<(), FormError>) -> bool {
    match result {
        Ok(()) => true,
        // Store errors have already been logged
        Err(FormError::Store(_)) => false,
        Err(err) => {
            log::warn!("Cannot use the {} form: {}", form, err);
            false
        },
    }
}
