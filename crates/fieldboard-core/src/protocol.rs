//! Wire-protocol request and response bodies for the task service API.
//!
//! These types define the single JSON contract shared by the axum handlers and
//! the reqwest client, so the two sides cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId, TaskStatus};
use crate::validate::{check_image, require_text, ValidationError};

/// Body of `POST /tasks`.
///
/// `image` is raw base64 without a data-URL prefix. Extra fields are ignored,
/// matching the tolerant create contract; only the patch endpoint enforces an
/// allow-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl TaskDraft {
    /// Validate required text fields and the optional image payload.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        if let Some(image) = &self.image {
            check_image(image)?;
        }
        Ok(())
    }

    /// Status to persist: the submitted one, or the "New Tasks" default.
    pub fn status_or_default(&self) -> TaskStatus {
        self.status.unwrap_or_default()
    }
}

/// Body of `PATCH /tasks/:id`: a typed partial update.
///
/// Unknown field names are rejected at deserialization (`deny_unknown_fields`),
/// which is the explicit allow-list the patch contract requires. An
/// all-`None` patch is rejected by [`TaskPatch::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// True when no recognized field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.image.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.status.is_none()
    }

    /// Validate the supplied fields: non-empty text, decodable image.
    ///
    /// Status needs no extra check; it is already a typed [`TaskStatus`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::new("no fields to update"));
        }
        if let Some(title) = &self.title {
            require_text("title", title)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(location) = &self.location {
            require_text("location", location)?;
        }
        if let Some(image) = &self.image {
            check_image(image)?;
        }
        Ok(())
    }

    /// Overlay the supplied fields onto a task, leaving the rest untouched.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(image) = &self.image {
            task.image = Some(image.clone());
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(location) = &self.location {
            task.location = location.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
    }
}

/// Body of `PATCH /tasks/:id/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: TaskStatus,
}

/// Body of `POST /comments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub task_id: TaskId,
    pub content: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)
    }
}

/// `POST /tasks` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreated {
    pub id: TaskId,
}

/// `POST /comments` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentCreated {
    pub id: i64,
}

/// `PATCH /tasks/:id/status` response: count of rows changed (0 or 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdated {
    pub updated: u64,
}

/// `PATCH /tasks/:id` response: row count plus the updated row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPatched {
    pub updated: u64,
    pub task: Task,
}

/// `DELETE /tasks/:id` and `DELETE /comments/:id` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: u64,
}

/// Error envelope for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
