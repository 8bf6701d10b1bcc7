//! Comment panel for the task detail dialog.

use fieldboard_core::protocol::NewComment;
use fieldboard_core::task::{Comment, TaskId};
use fieldboard_core::validate::ValidationError;

use crate::client::{ClientResult, TaskClient};

/// Comments for one task, loaded when its dialog opens.
pub struct CommentPanel {
    client: TaskClient,
    task_id: TaskId,
    comments: Vec<Comment>,
}

impl CommentPanel {
    pub fn new(client: TaskClient, task_id: TaskId) -> Self {
        Self {
            client,
            task_id,
            comments: Vec::new(),
        }
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Reload the comment list from the server.
    pub async fn refresh(&mut self) -> ClientResult<()> {
        self.comments = self.client.list_comments(self.task_id).await?;
        Ok(())
    }

    /// Validate a comment body without sending it. Blank input is rejected
    /// here so the dialog can disable its submit button.
    pub fn check_input(&self, content: &str) -> Result<(), ValidationError> {
        NewComment {
            task_id: self.task_id,
            content: content.to_string(),
        }
        .validate()
    }

    /// Post a comment, then reload so the list shows the server's row.
    pub async fn add(&mut self, content: &str) -> ClientResult<()> {
        if self.check_input(content).is_err() {
            tracing::debug!("Ignoring blank comment for task {}", self.task_id);
            return Ok(());
        }
        self.client.add_comment(self.task_id, content).await?;
        self.refresh().await
    }

    /// Delete a comment, then reload. Deleting an already-gone comment is
    /// harmless; the server reports a zero count and the reload converges.
    pub async fn remove(&mut self, comment_id: i64) -> ClientResult<()> {
        let deleted = self.client.delete_comment(comment_id).await?;
        if deleted == 0 {
            tracing::debug!("Comment {comment_id} was already gone");
        }
        self.refresh().await
    }
}
