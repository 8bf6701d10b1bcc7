//! Task editor form: client-side mirror of the server's validation rules.
//!
//! The form rejects bad input before a request is issued, so the common
//! failure mode (empty field, oversized image) never round-trips. The server
//! still enforces the same rules; this is a mirror, not the authority.

use fieldboard_core::protocol::{TaskDraft, TaskPatch};
use fieldboard_core::task::{Task, TaskStatus};
use fieldboard_core::validate::{encode_image, require_text, strip_data_url, ValidationError};

/// Editable task fields, for both the create and edit dialogs.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: Option<TaskStatus>,
    image: Option<String>,
}

impl TaskForm {
    /// Start an edit form pre-filled from an existing task.
    ///
    /// The task's image arrives as a data URL; the form keeps the raw
    /// payload so a round-trip submit does not grow a second prefix.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            location: task.location.clone(),
            status: Some(task.status),
            image: task.image.as_deref().map(|i| strip_data_url(i).to_string()),
        }
    }

    /// Attach an image from raw file bytes. Rejects files over the size
    /// limit before encoding.
    pub fn attach_image(&mut self, bytes: &[u8]) -> Result<(), ValidationError> {
        self.image = Some(encode_image(bytes)?);
        Ok(())
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Same rules the server applies on create.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("description", &self.description)?;
        require_text("location", &self.location)?;
        Ok(())
    }

    /// Build the create request body.
    pub fn into_draft(self) -> Result<TaskDraft, ValidationError> {
        self.validate()?;
        Ok(TaskDraft {
            title: self.title,
            description: self.description,
            location: self.location,
            status: self.status,
            image: self.image,
        })
    }

    /// Build a patch containing only the fields that differ from `original`.
    ///
    /// Returns an empty patch (see [`TaskPatch::is_empty`]) when nothing
    /// changed; callers should skip the request in that case.
    pub fn diff(&self, original: &Task) -> Result<TaskPatch, ValidationError> {
        self.validate()?;

        let mut patch = TaskPatch::default();
        if self.title != original.title {
            patch.title = Some(self.title.clone());
        }
        if self.description != original.description {
            patch.description = Some(self.description.clone());
        }
        if self.location != original.location {
            patch.location = Some(self.location.clone());
        }
        if let Some(status) = self.status {
            if status != original.status {
                patch.status = Some(status);
            }
        }

        let original_image = original.image.as_deref().map(strip_data_url);
        if self.image.as_deref() != original_image {
            if let Some(image) = &self.image {
                patch.image = Some(image.clone());
            }
            // Image removal is not expressible in the patch contract; a
            // cleared image simply stays absent from the patch.
        }

        Ok(patch)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use fieldboard_core::validate::to_data_url;

    fn sample_task() -> Task {
        Task {
            id: 1,
            title: "Recon".to_string(),
            description: "scout area".to_string(),
            location: "sector 4".to_string(),
            status: TaskStatus::NewTasks,
            image: None,
        }
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let form = TaskForm {
            title: "Recon".to_string(),
            description: "  ".to_string(),
            location: "sector 4".to_string(),
            ..TaskForm::default()
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_into_draft_carries_all_fields() {
        let mut form = TaskForm {
            title: "Recon".to_string(),
            description: "scout area".to_string(),
            location: "sector 4".to_string(),
            status: Some(TaskStatus::InProgress),
            ..TaskForm::default()
        };
        form.attach_image(b"jpeg bytes").unwrap();

        let draft = form.into_draft().unwrap();
        assert_eq!(draft.title, "Recon");
        assert_eq!(draft.status, Some(TaskStatus::InProgress));
        assert!(draft.image.is_some());
    }

    #[test]
    fn test_diff_contains_only_changed_fields() {
        let original = sample_task();
        let mut form = TaskForm::from_task(&original);
        form.location = "sector 5".to_string();
        form.status = Some(TaskStatus::Completed);

        let patch = form.diff(&original).unwrap();
        assert_eq!(patch.location.as_deref(), Some("sector 5"));
        assert_eq!(patch.status, Some(TaskStatus::Completed));
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
        assert!(patch.image.is_none());
    }

    #[test]
    fn test_diff_unchanged_form_is_empty() {
        let original = sample_task();
        let form = TaskForm::from_task(&original);
        let patch = form.diff(&original).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn test_from_task_strips_data_url_prefix() {
        let mut original = sample_task();
        original.image = Some(to_data_url("aGVsbG8="));

        let form = TaskForm::from_task(&original);
        let patch = form.diff(&original).unwrap();
        // Same payload under the prefix: no image change detected
        assert!(patch.image.is_none());
    }
}
