//! Sync client for the task board API.
//!
//! [`TaskClient`] wraps the REST endpoints; [`SyncEngine`] layers polling,
//! optimistic mutations, and conflict detection on top of it. The `board`,
//! `editor`, and `comments` modules are the view-models a UI binds to.

pub mod board;
pub mod client;
pub mod comments;
pub mod editor;
pub mod retry;
pub mod sync;

pub use board::{columns, Board, BoardColumn};
pub use client::{ClientError, ClientResult, TaskClient};
pub use comments::CommentPanel;
pub use editor::TaskForm;
pub use retry::RetryConfig;
pub use sync::{reconcile, PendingEdit, SyncEngine, SyncEvent, TaskEntry, TaskSyncState};
