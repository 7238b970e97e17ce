//! The create and edit forms
//!
//! Both follow the same lifecycle: `Closed → Open → Submitting → Closed`. A failed submission goes back to `Open`
//! with the draft untouched, so that nothing the user typed is lost.
//!
//! Every submission gets its own [`Submission`] ticket. Its outcome is applied only if the form is still waiting for
//! that very submission: a result arriving after the form was cancelled or re-opened leaves the current form alone.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

use crate::error::FormError;
use crate::task::{DueDate, Task, TaskDraft, TaskStatus};

static NEXT_SUBMISSION: AtomicU64 = AtomicU64::new(1);

/// Identifies one submission of a form
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Submission(u64);

impl Submission {
    fn next() -> Self {
        Submission(NEXT_SUBMISSION.fetch_add(1, Ordering::Relaxed))
    }
}

/// The lifecycle of a form holding a draft of type `D`
#[derive(Clone, Debug, PartialEq)]
pub enum FormState<D> {
    Closed,
    Open(D),
    Submitting(D, Submission),
}

impl<D> Default for FormState<D> {
    fn default() -> Self {
        FormState::Closed
    }
}

impl<D: Clone> FormState<D> {
    /// Whether the form is displayed (including while it is being submitted)
    pub fn is_open(&self) -> bool {
        !matches!(self, FormState::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, FormState::Submitting(..))
    }

    pub fn draft(&self) -> Option<&D> {
        match self {
            FormState::Closed => None,
            FormState::Open(d) | FormState::Submitting(d, _) => Some(d),
        }
    }

    /// The draft can only be edited while the form is open and not being submitted
    pub fn draft_mut(&mut self) -> Option<&mut D> {
        match self {
            FormState::Open(d) => Some(d),
            _ => None,
        }
    }

    /// Open the form with `draft`. An open form gets its draft replaced. Refused while submitting
    pub fn open(&mut self, draft: D) -> Result<(), FormError> {
        if self.is_submitting() {
            return Err(FormError::AlreadySubmitting);
        }
        *self = FormState::Open(draft);
        Ok(())
    }

    /// Switch to `Submitting`, and return a copy of the draft to send, with the ticket of this submission
    pub fn begin_submit(&mut self) -> Result<(D, Submission), FormError> {
        let draft = match self {
            FormState::Closed => return Err(FormError::NotOpen),
            FormState::Submitting(..) => return Err(FormError::AlreadySubmitting),
            FormState::Open(d) => d.clone(),
        };
        let submission = Submission::next();
        *self = FormState::Submitting(draft.clone(), submission);
        Ok((draft, submission))
    }

    fn is_waiting_for(&self, submission: Submission) -> bool {
        match self {
            FormState::Submitting(_, current) if *current == submission => true,
            _ => {
                log::debug!("Ignoring the outcome of {:?}, the form has moved on", submission);
                false
            },
        }
    }

    /// `submission` worked: the form closes. Returns false if the form was not waiting for it
    pub fn submit_succeeded(&mut self, submission: Submission) -> bool {
        if self.is_waiting_for(submission) == false {
            return false;
        }
        *self = FormState::Closed;
        true
    }

    /// `submission` failed: the form is open again, with the same draft. Returns false if the form was not waiting for it
    pub fn submit_failed(&mut self, submission: Submission) -> bool {
        if self.is_waiting_for(submission) == false {
            return false;
        }
        if let FormState::Submitting(d, _) = std::mem::replace(self, FormState::Closed) {
            *self = FormState::Open(d);
        }
        true
    }

    /// Close the form and discard its draft
    pub fn cancel(&mut self) -> Option<D> {
        match std::mem::replace(self, FormState::Closed) {
            FormState::Closed => None,
            FormState::Open(d) | FormState::Submitting(d, _) => Some(d),
        }
    }
}



/// The edit form works on a full copy of the task being edited
pub type EditForm = FormState<Task>;

impl EditForm {
    /// Open the form on a snapshot of `task`
    pub fn open_for(&mut self, task: &Task) -> Result<(), FormError> {
        self.open(task.clone())
    }
}



/// What the user has typed in the create form so far. Empty selections are allowed until submission
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateDraft {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub status: Option<TaskStatus>,
}

impl CreateDraft {
    /// Check that every required field is filled, and build the payload to send
    pub fn validate(&self) -> Result<TaskDraft, FormError> {
        if self.title.trim().is_empty() {
            return Err(FormError::MissingField("title"));
        }
        let due_date = self.due_date.ok_or(FormError::MissingField("due date"))?;
        let status = self.status.ok_or(FormError::MissingField("status"))?;
        Ok(TaskDraft::new(&self.title, DueDate::from_day(due_date), status))
    }
}

/// The create form.
///
/// Hiding it keeps what was typed, so that showing it again brings the input back. Only a successful submission clears it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateForm {
    state: FormState<CreateDraft>,
    hidden_draft: CreateDraft,
}

impl CreateForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn state(&self) -> &FormState<CreateDraft> {
        &self.state
    }

    /// Show the form if it is hidden, hide it otherwise. Returns whether it is now shown.
    /// A form being submitted stays shown
    pub fn toggle(&mut self) -> bool {
        match std::mem::replace(&mut self.state, FormState::Closed) {
            FormState::Closed => self.state = FormState::Open(std::mem::take(&mut self.hidden_draft)),
            FormState::Open(d) => self.hidden_draft = d,
            submitting @ FormState::Submitting(..) => {
                log::debug!("Not hiding the create form while it is being submitted");
                self.state = submitting;
            },
        }
        self.state.is_open()
    }

    pub fn draft_mut(&mut self) -> Option<&mut CreateDraft> {
        self.state.draft_mut()
    }

    /// Validate the draft and switch to `Submitting`. An invalid draft leaves the form open
    pub fn begin_submit(&mut self) -> Result<(TaskDraft, Submission), FormError> {
        let payload = match &self.state {
            FormState::Closed => return Err(FormError::NotOpen),
            FormState::Submitting(..) => return Err(FormError::AlreadySubmitting),
            FormState::Open(d) => d.validate()?,
        };
        let (_, submission) = self.state.begin_submit()?;
        Ok((payload, submission))
    }

    /// The task has been created: the form closes and its input is cleared
    pub fn submit_succeeded(&mut self, submission: Submission) -> bool {
        if self.state.submit_succeeded(submission) == false {
            return false;
        }
        self.hidden_draft = CreateDraft::default();
        true
    }

    pub fn submit_failed(&mut self, submission: Submission) -> bool {
        self.state.submit_failed(submission)
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;

    fn filled_draft() -> CreateDraft {
        CreateDraft {
            title: "Buy milk".to_string(),
            due_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            status: Some(TaskStatus::Pending),
        }
    }

    #[test]
    fn edit_form_lifecycle() {
        let task = Task::new(TaskId::from(1), "Buy milk", "2024-05-01".parse().unwrap(), TaskStatus::Pending);
        let mut form = EditForm::default();
        assert!(matches!(form.begin_submit(), Err(FormError::NotOpen)));

        form.open_for(&task).unwrap();
        form.draft_mut().unwrap().set_title("Buy oat milk");
        let (sent, submission) = form.begin_submit().unwrap();
        assert_eq!(sent.title(), "Buy oat milk");
        assert!(form.draft_mut().is_none());
        assert!(matches!(form.begin_submit(), Err(FormError::AlreadySubmitting)));
        assert!(matches!(form.open_for(&task), Err(FormError::AlreadySubmitting)));

        assert!(form.submit_failed(submission));
        assert_eq!(form.draft().unwrap().title(), "Buy oat milk");
        // Reported twice, the same failure does nothing more
        assert_eq!(form.submit_failed(submission), false);

        let (_, submission) = form.begin_submit().unwrap();
        assert!(form.submit_succeeded(submission));
        assert_eq!(form, FormState::Closed);
    }

    #[test]
    fn late_outcomes_leave_a_reopened_form_alone() {
        let first = Task::new(TaskId::from(1), "Buy milk", "2024-05-01".parse().unwrap(), TaskStatus::Pending);
        let second = Task::new(TaskId::from(2), "Call Bob", "2024-05-01".parse().unwrap(), TaskStatus::Pending);
        let mut form = EditForm::default();

        form.open_for(&first).unwrap();
        let (_, stale) = form.begin_submit().unwrap();
        form.cancel();
        form.open_for(&second).unwrap();
        form.draft_mut().unwrap().set_title("Call Bob tonight");

        assert_eq!(form.submit_failed(stale), false);
        assert_eq!(form.submit_succeeded(stale), false);
        assert_eq!(form.draft_mut().map(|t| t.title().to_string()), Some("Call Bob tonight".to_string()));

        // A newer submission is not closed by the outcome of an older one either
        let (_, current) = form.begin_submit().unwrap();
        assert_eq!(form.submit_succeeded(stale), false);
        assert!(form.is_submitting());
        assert!(form.submit_succeeded(current));
        assert_eq!(form, FormState::Closed);
    }

    #[test]
    fn cancel_discards_the_draft() {
        let task = Task::new(TaskId::from(1), "Buy milk", "2024-05-01".parse().unwrap(), TaskStatus::Pending);
        let mut form = EditForm::default();
        form.open_for(&task).unwrap();
        form.draft_mut().unwrap().set_status(TaskStatus::Completed);
        assert_eq!(form.cancel().unwrap().status(), TaskStatus::Completed);
        assert!(form.is_open() == false);
        assert!(form.cancel().is_none());
    }

    #[test]
    fn required_fields() {
        let mut draft = CreateDraft::default();
        assert!(matches!(draft.validate(), Err(FormError::MissingField("title"))));
        draft.title = "   ".to_string();
        assert!(matches!(draft.validate(), Err(FormError::MissingField("title"))));
        draft.title = "Buy milk".to_string();
        assert!(matches!(draft.validate(), Err(FormError::MissingField("due date"))));
        draft.due_date = NaiveDate::from_ymd_opt(2024, 5, 1);
        assert!(matches!(draft.validate(), Err(FormError::MissingField("status"))));
        draft.status = Some(TaskStatus::InProgress);

        let payload = draft.validate().unwrap();
        assert_eq!(payload.title, "Buy milk");
        assert_eq!(payload.due_date.as_str(), "2024-05-01");
        assert_eq!(payload.status, TaskStatus::InProgress);
    }

    #[test]
    fn toggling_keeps_the_input() {
        let mut form = CreateForm::new();
        assert!(form.toggle());
        *form.draft_mut().unwrap() = filled_draft();
        assert_eq!(form.toggle(), false);
        assert!(form.draft_mut().is_none());
        assert!(form.toggle());
        assert_eq!(form.draft_mut().unwrap(), &mut filled_draft());
    }

    #[test]
    fn invalid_drafts_are_not_submitted() {
        let mut form = CreateForm::new();
        form.toggle();
        form.draft_mut().unwrap().title = "Buy milk".to_string();
        assert!(matches!(form.begin_submit(), Err(FormError::MissingField(_))));
        assert!(matches!(form.state(), FormState::Open(_)));
    }

    #[test]
    fn successful_creation_clears_the_form() {
        let mut form = CreateForm::new();
        form.toggle();
        *form.draft_mut().unwrap() = filled_draft();

        let (_, submission) = form.begin_submit().unwrap();
        assert!(form.toggle(), "a form being submitted stays shown");
        assert!(form.submit_failed(submission));
        assert_eq!(form.state(), &FormState::Open(filled_draft()));

        let (_, submission) = form.begin_submit().unwrap();
        assert!(form.submit_succeeded(submission));
        assert!(form.is_open() == false);
        assert!(form.toggle());
        assert_eq!(form.state(), &FormState::Open(CreateDraft::default()));
    }
}
