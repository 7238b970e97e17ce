//! Errors returned by task stores and forms

use thiserror::Error;

use crate::task::TaskId;

/// Why a call to the remote task service failed
#[derive(Error, Debug)]
pub enum StoreError {
    /// The service could not be reached, or the connection broke
    #[error("network error: {0}")]
    Network(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status code
    #[error("request rejected with HTTP status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The service does not know this task
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The service answered with something that is not what was expected
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An endpoint URL could not be built
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StoreError {
    pub fn network<E: Into<Box<dyn std::error::Error + Send + Sync>>>(err: E) -> Self {
        StoreError::Network(err.into())
    }

    /// Whether this failure is worth trying again as-is
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Network(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Network(Box::new(err))
    }
}


/// Why a form could not be submitted
#[derive(Error, Debug)]
pub enum FormError {
    #[error("the {0} field is required")]
    MissingField(&'static str),

    #[error("the form is not open")]
    NotOpen,

    #[error("the form is already being submitted")]
    AlreadySubmitting,

    #[error("no task {0} in the current collection")]
    NoSuchTask(TaskId),

    #[error(transparent)]
    Store(#[from] StoreError),
}
