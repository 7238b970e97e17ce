//! This module provides a client to connect to the remote task service

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::error::StoreError;
use crate::task::{DueDate, Task, TaskDraft, TaskId, TaskStatus};
use crate::traits::{Confirmation, TaskStore};

static LIST_PATH: &str = "getAllTasks";
static CREATE_PATH: &str = "createTask";
static UPDATE_PATH: &str = "updateTask";
static DELETE_PATH: &str = "deleteTask";

static JSON_CONTENT_TYPE: &str = "application/json";


/// What the service replies to a creation.
/// Only the ID is mandatory, any other field it echoes back wins over the draft
#[derive(Deserialize)]
struct CreatedTask {
    id: TaskId,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    duedate: Option<DueDate>,
    #[serde(default)]
    status: Option<TaskStatus>,
}


/// A task store that lives on a remote HTTP server
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self, StoreError> {
        Self::with_http_client(base_url, reqwest::Client::new())
    }

    /// Create a client that sends its requests through `http` (e.g. to tweak proxies or TLS settings)
    pub fn with_http_client<S: AsRef<str>>(base_url: S, http: reqwest::Client) -> Result<Self, StoreError> {
        let url = Url::parse(base_url.as_ref())?;
        Ok(Self::with_url(url, http))
    }

    /// Create a client for the service configured in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::with_url(config.base_url.clone(), reqwest::Client::new())
    }

    fn with_url(mut base_url: Url, http: reqwest::Client) -> Self {
        // Without a trailing slash, joining would replace the last path segment
        if base_url.path().ends_with('/') == false {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self { base_url, http }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    fn task_endpoint(&self, path: &str, id: &TaskId) -> Result<Url, StoreError> {
        let mut url = self.endpoint(path)?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(&id.to_string());
        Ok(url)
    }
}

/// Turns non-success responses into errors.
/// A 404 is reported as `NotFound` only when the request was about a given task
async fn check_status(response: Response, id: Option<&TaskId>) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match id {
        Some(id) if status == StatusCode::NOT_FOUND => return Err(StoreError::NotFound(id.clone())),
        _ => {},
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(err) => {
            log::debug!("Unable to read the body of a {} response: {}", status, err);
            String::new()
        },
    };
    Err(StoreError::Rejected { status: status.as_u16(), body })
}

/// Reads a `{message}` reply. A body that is missing or not JSON is not an error, the status code already told us it worked
fn parse_confirmation(text: &str) -> Confirmation {
    match serde_json::from_str::<Confirmation>(text) {
        Ok(confirmation) => confirmation,
        Err(err) => {
            log::debug!("Ignoring unexpected confirmation body {:?} ({})", text, err);
            Confirmation::default()
        },
    }
}

#[async_trait]
impl TaskStore for Client {
    async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let url = self.endpoint(LIST_PATH)?;
        log::debug!("Fetching every task from {}", url);

        let response = self.http
            .get(url)
            .send()
            .await?;
        let response = check_status(response, None).await?;
        let text = response.text().await?;

        let tasks: Vec<Task> = serde_json::from_str(&text)?;
        log::info!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        let url = self.endpoint(CREATE_PATH)?;
        let body = serde_json::to_string(draft)?;
        log::debug!("Creating task {:?}", draft.title);

        let response = self.http
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let response = check_status(response, None).await?;
        let text = response.text().await?;

        let created: CreatedTask = serde_json::from_str(&text)?;
        let mut task = Task::from_draft(created.id, draft.clone());
        if let Some(title) = created.title {
            task.set_title(title);
        }
        if let Some(duedate) = created.duedate {
            task.set_duedate(duedate);
        }
        if let Some(status) = created.status {
            task.set_status(status);
        }
        log::info!("Created task {} ({})", task.id(), task.title());
        Ok(task)
    }

    async fn update_task(&self, id: &TaskId, task: &Task) -> Result<Task, StoreError> {
        let url = self.task_endpoint(UPDATE_PATH, id)?;
        let body = serde_json::to_string(task)?;
        log::debug!("Updating task {}", id);

        let response = self.http
            .put(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let response = check_status(response, Some(id)).await?;
        let text = response.text().await?;

        let confirmation = parse_confirmation(&text);
        log::info!("Updated task {} ({})", id, confirmation.message.as_deref().unwrap_or("no message"));
        Ok(task.clone())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<Confirmation, StoreError> {
        let url = self.task_endpoint(DELETE_PATH, id)?;
        log::debug!("Deleting task {}", id);

        let response = self.http
            .delete(url)
            .send()
            .await?;
        let response = check_status(response, Some(id)).await?;
        let text = response.text().await?;

        let confirmation = parse_confirmation(&text);
        log::info!("Deleted task {} ({})", id, confirmation.message.as_deref().unwrap_or("no message"));
        Ok(confirmation)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_the_base_path() {
        let client = Client::new("https://api.example.com/v1").unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.example.com/v1/");
        assert_eq!(client.endpoint(LIST_PATH).unwrap().as_str(), "https://api.example.com/v1/getAllTasks");
        assert_eq!(
            client.task_endpoint(UPDATE_PATH, &TaskId::from(12)).unwrap().as_str(),
            "https://api.example.com/v1/updateTask/12"
        );
    }

    #[test]
    fn task_ids_are_escaped_in_paths() {
        let client = Client::new("http://localhost:5000/").unwrap();
        assert_eq!(
            client.task_endpoint(DELETE_PATH, &TaskId::from("a b/c")).unwrap().as_str(),
            "http://localhost:5000/deleteTask/a%20b%2Fc"
        );
    }

    #[test]
    fn invalid_base_url() {
        assert!(matches!(Client::new("not a url"), Err(StoreError::InvalidUrl(_))));
    }

    #[test]
    fn lenient_confirmations() {
        assert_eq!(parse_confirmation(r#"{"message":"Task deleted"}"#), Confirmation::new("Task deleted"));
        assert_eq!(parse_confirmation(""), Confirmation::default());
        assert_eq!(parse_confirmation("OK"), Confirmation::default());
    }
}
