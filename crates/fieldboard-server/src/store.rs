//! SQLite-based task storage.
//!
//! This module provides `TaskStore`, the single source of truth for tasks and
//! comments. The store owns one `rusqlite::Connection`; the API layer wraps it
//! in a mutex for thread-safe access. Image payloads are stored as raw base64
//! text; reconstituting the display data URL is the API layer's job.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use thiserror::Error;

use fieldboard_core::{Comment, NewComment, Task, TaskDraft, TaskId, TaskPatch, TaskStatus};
use fieldboard_core::ValidationError;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No task row matches the id.
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    /// Input rejected before touching the database.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Underlying SQLite failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.to_string())
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value.0)
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed task and comment storage.
pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Open (or create) the store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (used by tests and throwaway servers).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize the database schema.
    ///
    /// Foreign keys are per-connection in SQLite, so the pragma runs on every
    /// open; the cascade from tasks to comments depends on it.
    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                image TEXT,
                description TEXT NOT NULL,
                location TEXT NOT NULL,
                status TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );
            "#,
        )?;
        Ok(())
    }

    /// Convert a database row to a Task.
    fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        let id: i64 = row.get(0)?;
        let title: String = row.get(1)?;
        let image: Option<String> = row.get(2)?;
        let description: String = row.get(3)?;
        let location: String = row.get(4)?;
        let status_str: String = row.get(5)?;

        let status = TaskStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(ValidationError::new(format!(
                    "stored status is not canonical: {status_str}"
                ))),
            )
        })?;

        Ok(Task {
            id,
            title,
            description,
            location,
            status,
            image,
        })
    }

    /// Check if a task exists by ID.
    pub fn task_exists(&self, id: TaskId) -> StoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List all tasks in insertion order.
    pub fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, image, description, location, status
             FROM tasks
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_task)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a task by ID.
    pub fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, image, description, location, status
                 FROM tasks WHERE id = ?1",
                params![id],
                Self::row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Create a task from a validated draft; status defaults to "New Tasks".
    ///
    /// The stored status is always the canonical casing, whatever casing the
    /// draft arrived with.
    pub fn create_task(&self, draft: &TaskDraft) -> StoreResult<TaskId> {
        draft.validate()?;

        self.conn.execute(
            "INSERT INTO tasks (title, image, description, location, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.title,
                draft.image,
                draft.description,
                draft.location,
                draft.status_or_default().as_str(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Created task with ID: {}", id);
        Ok(id)
    }

    /// Set a task's status. Returns the changed-row count (0 when absent).
    ///
    /// Single-statement update; concurrent transitions on the same row resolve
    /// to last-write-wins under SQLite's row atomicity.
    pub fn set_status(&self, id: TaskId, status: TaskStatus) -> StoreResult<u64> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        Ok(changed as u64)
    }

    /// Apply a partial update to a task, returning the updated row.
    ///
    /// Fetch-overlay-update: the current row is read, the patch's supplied
    /// fields are overlaid, and all columns are written back in one statement.
    pub fn patch_task(&self, id: TaskId, patch: &TaskPatch) -> StoreResult<Task> {
        patch.validate()?;

        let mut task = self.get_task(id)?.ok_or(StoreError::TaskNotFound(id))?;
        patch.apply(&mut task);

        self.conn.execute(
            "UPDATE tasks
             SET title = ?1, image = ?2, description = ?3, location = ?4, status = ?5
             WHERE id = ?6",
            params![
                task.title,
                task.image,
                task.description,
                task.location,
                task.status.as_str(),
                id,
            ],
        )?;

        tracing::debug!("Patched task: {}", id);
        Ok(task)
    }

    /// Delete a task. Returns the deleted-row count; comments cascade.
    pub fn delete_task(&self, id: TaskId) -> StoreResult<u64> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if deleted > 0 {
            tracing::debug!("Deleted task: {}", id);
        }
        Ok(deleted as u64)
    }

    /// List comments for a task in insertion order.
    ///
    /// An unknown task yields an empty list, not an error.
    pub fn list_comments(&self, task_id: TaskId) -> StoreResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, task_id, content FROM comments WHERE task_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![task_id], |row| {
            Ok(Comment {
                id: row.get(0)?,
                task_id: row.get(1)?,
                content: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Add a comment to an existing task.
    ///
    /// A task_id that references no task is a validation failure, caught
    /// before the insert rather than surfaced as a foreign-key error.
    pub fn add_comment(&self, new: &NewComment) -> StoreResult<i64> {
        new.validate()?;
        if !self.task_exists(new.task_id)? {
            return Err(StoreError::Validation(format!(
                "task_id {} does not reference an existing task",
                new.task_id
            )));
        }

        self.conn.execute(
            "INSERT INTO comments (task_id, content) VALUES (?1, ?2)",
            params![new.task_id, new.content],
        )?;

        let id = self.conn.last_insert_rowid();
        tracing::debug!("Created comment {} on task {}", id, new.task_id);
        Ok(id)
    }

    /// Delete a comment. Returns the deleted-row count; idempotent.
    pub fn delete_comment(&self, id: i64) -> StoreResult<u64> {
        let deleted = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(deleted as u64)
    }
}
