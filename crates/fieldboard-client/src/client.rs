//! HTTP client for the task board API.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use url::Url;

use fieldboard_core::protocol::{
    CommentCreated, Deleted, ErrorBody, NewComment, StatusChange, StatusUpdated, TaskCreated,
    TaskDraft, TaskPatch, TaskPatched,
};
use fieldboard_core::task::{Comment, Task, TaskId, TaskStatus};
use fieldboard_core::ClientConfig;

use crate::retry::{with_retry, RetryConfig};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors from the task board API client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status of the failure, if the server responded at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status(),
            Self::Url(_) => None,
        }
    }

    /// True when the server rejected the request as malformed (4xx).
    /// These failures are the caller's fault and must not be retried.
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| s.is_client_error())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Client for the task board REST API.
///
/// All methods issue a single request, except [`TaskClient::update_status`]
/// which applies the bounded retry policy for drag-driven transitions.
#[derive(Clone)]
pub struct TaskClient {
    client: Arc<Client>,
    base_url: Url,
    retry: RetryConfig,
}

impl TaskClient {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        Self::with_retry_config(base_url, RetryConfig::default())
    }

    /// Build a client from the loaded config: base URL plus the configured
    /// transition retry policy.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::with_retry_config(
            &config.api_url,
            RetryConfig::new(config.status_retries, config.retry_backoff_ms),
        )
    }

    pub fn with_retry_config(base_url: &str, retry: RetryConfig) -> ClientResult<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url,
            retry,
        })
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// Turn a non-success response into `ClientError::Api`, pulling the
    /// message out of the server's `{"error": ...}` body when present.
    async fn check_response(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        };

        tracing::debug!("API request failed: {} - {}", status, message);
        Err(ClientError::Api { status, message })
    }

    pub async fn health_check(&self) -> ClientResult<()> {
        let url = self.endpoint("healthz")?;
        let response = self.client.get(url).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// Fetch every task, in creation order.
    pub async fn list_tasks(&self) -> ClientResult<Vec<Task>> {
        let url = self.endpoint("tasks")?;
        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    pub async fn get_task(&self, id: TaskId) -> ClientResult<Task> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    pub async fn create_task(&self, draft: &TaskDraft) -> ClientResult<TaskId> {
        let url = self.endpoint("tasks")?;
        let response = self.client.post(url).json(draft).send().await?;
        let response = Self::check_response(response).await?;
        let created: TaskCreated = response.json().await?;
        tracing::info!("Created task {}", created.id);
        Ok(created.id)
    }

    /// Move a task to a new status column.
    ///
    /// Transient failures (timeouts, connection errors, 5xx) are retried
    /// per the configured policy; 4xx rejections fail immediately.
    pub async fn update_status(&self, id: TaskId, status: TaskStatus) -> ClientResult<u64> {
        let url = self.endpoint(&format!("tasks/{id}/status"))?;
        let body = StatusChange { status };

        let response = with_retry(&self.retry, || {
            self.client.patch(url.clone()).json(&body).send()
        })
        .await?;

        let response = Self::check_response(response).await?;
        let updated: StatusUpdated = response.json().await?;
        Ok(updated.updated)
    }

    /// Apply a partial edit and return the server's updated row.
    pub async fn patch_task(&self, id: TaskId, patch: &TaskPatch) -> ClientResult<Task> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        let response = self.client.patch(url).json(patch).send().await?;
        let response = Self::check_response(response).await?;
        let patched: TaskPatched = response.json().await?;
        Ok(patched.task)
    }

    pub async fn delete_task(&self, id: TaskId) -> ClientResult<u64> {
        let url = self.endpoint(&format!("tasks/{id}"))?;
        let response = self.client.delete(url).send().await?;
        let response = Self::check_response(response).await?;
        let deleted: Deleted = response.json().await?;
        tracing::info!("Deleted task {id}");
        Ok(deleted.deleted)
    }

    pub async fn list_comments(&self, task_id: TaskId) -> ClientResult<Vec<Comment>> {
        let url = self.endpoint(&format!("tasks/{task_id}/comments"))?;
        let response = self.client.get(url).send().await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    pub async fn add_comment(&self, task_id: TaskId, content: &str) -> ClientResult<i64> {
        let url = self.endpoint("comments")?;
        let body = NewComment {
            task_id,
            content: content.to_string(),
        };
        let response = self.client.post(url).json(&body).send().await?;
        let response = Self::check_response(response).await?;
        let created: CommentCreated = response.json().await?;
        Ok(created.id)
    }

    pub async fn delete_comment(&self, comment_id: i64) -> ClientResult<u64> {
        let url = self.endpoint(&format!("comments/{comment_id}"))?;
        let response = self.client.delete(url).send().await?;
        let response = Self::check_response(response).await?;
        let deleted: Deleted = response.json().await?;
        Ok(deleted.deleted)
    }
}
