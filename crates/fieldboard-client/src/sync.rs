//! Polling sync engine with optimistic local mutations.
//!
//! The engine keeps a local mirror of the server's task list. A background
//! poll loop refreshes the mirror on a fixed interval; mutations apply
//! optimistically to the mirror first, then hit the API, then force an
//! immediate refresh so the server's answer always wins.
//!
//! All merging of server state with in-flight local edits goes through one
//! pure function, [`reconcile`], so the merge rules live in exactly one place.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use fieldboard_core::protocol::{TaskDraft, TaskPatch};
use fieldboard_core::task::{Task, TaskId, TaskStatus};

use crate::client::{ClientError, ClientResult, TaskClient};

/// Sync state of a single task as shown on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSyncState {
    /// Local copy matches the last server snapshot
    Synced,
    /// A local mutation is in flight; the displayed value is optimistic
    Pending,
    /// The server changed the task while a local edit was in flight
    Conflicted,
}

/// A task plus its sync state. This is what views render.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskEntry {
    pub task: Task,
    pub state: TaskSyncState,
}

/// An in-flight local edit: the task as it looked when the edit started,
/// and the fields the edit changes.
#[derive(Debug, Clone)]
pub struct PendingEdit {
    pub base: Task,
    pub patch: TaskPatch,
}

/// Out-of-band notifications for the UI layer.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The server changed a task that has a local edit in flight; the
    /// local changes may not have saved.
    ConflictWarning { task_id: TaskId, title: String },
    /// A status transition failed after exhausting its retries.
    TransitionFailed {
        task_id: TaskId,
        title: String,
        error: String,
    },
    /// Any other mutation was rejected or failed.
    MutationFailed { message: String },
}

/// Merge a fresh server snapshot with the set of in-flight local edits.
///
/// Server state is authoritative. For each server task with a pending edit,
/// the edit's fields are overlaid so the optimistic value stays visible; if
/// the server row no longer matches the edit's base, the entry is marked
/// [`TaskSyncState::Conflicted`] and a warning is returned. A pending edit
/// whose task vanished from the server is dropped with a warning.
pub fn reconcile(
    server: Vec<Task>,
    pending: &HashMap<TaskId, PendingEdit>,
) -> (Vec<TaskEntry>, Vec<SyncEvent>) {
    let mut warnings = Vec::new();
    let mut seen = Vec::new();

    let entries = server
        .into_iter()
        .map(|task| {
            let Some(edit) = pending.get(&task.id) else {
                return TaskEntry {
                    task,
                    state: TaskSyncState::Synced,
                };
            };
            seen.push(task.id);

            let state = if task == edit.base {
                TaskSyncState::Pending
            } else {
                warnings.push(SyncEvent::ConflictWarning {
                    task_id: task.id,
                    title: task.title.clone(),
                });
                TaskSyncState::Conflicted
            };

            let mut merged = task;
            edit.patch.apply(&mut merged);
            TaskEntry {
                task: merged,
                state,
            }
        })
        .collect();

    for (id, edit) in pending {
        if !seen.contains(id) {
            warnings.push(SyncEvent::ConflictWarning {
                task_id: *id,
                title: edit.base.title.clone(),
            });
        }
    }

    (entries, warnings)
}

struct EngineState {
    entries: Vec<TaskEntry>,
    pending: HashMap<TaskId, PendingEdit>,
}

/// Shared sync engine. Cheap to clone; all clones observe the same board.
#[derive(Clone)]
pub struct SyncEngine {
    client: TaskClient,
    state: Arc<Mutex<EngineState>>,
    board_tx: Arc<watch::Sender<Vec<TaskEntry>>>,
    events_tx: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncEngine {
    /// Create an engine around an API client.
    ///
    /// Returns the engine, a watch channel that carries board snapshots,
    /// and a channel of [`SyncEvent`] notifications.
    pub fn new(
        client: TaskClient,
    ) -> (
        Self,
        watch::Receiver<Vec<TaskEntry>>,
        mpsc::UnboundedReceiver<SyncEvent>,
    ) {
        let (board_tx, board_rx) = watch::channel(Vec::new());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let engine = Self {
            client,
            state: Arc::new(Mutex::new(EngineState {
                entries: Vec::new(),
                pending: HashMap::new(),
            })),
            board_tx: Arc::new(board_tx),
            events_tx,
        };
        (engine, board_rx, events_rx)
    }

    /// Current board snapshot.
    pub fn snapshot(&self) -> Vec<TaskEntry> {
        self.state.lock().entries.clone()
    }

    fn publish(&self, entries: Vec<TaskEntry>) {
        let _ = self.board_tx.send(entries);
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Fetch the server's task list and reconcile it into local state.
    pub async fn refresh(&self) -> ClientResult<()> {
        let server = self.client.list_tasks().await?;

        let (entries, warnings) = {
            let mut state = self.state.lock();
            let (entries, warnings) = reconcile(server, &state.pending);
            state.entries = entries.clone();
            (entries, warnings)
        };

        self.publish(entries);
        for warning in warnings {
            tracing::warn!("Sync conflict: {warning:?}");
            self.emit(warning);
        }
        Ok(())
    }

    /// Poll loop: refresh on a fixed interval (typically
    /// `ClientConfig::poll_interval()`) until the engine is dropped by every
    /// other holder. Poll failures are logged and retried on the next tick;
    /// the loop never gives up.
    pub async fn run(&self, poll_interval: Duration) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                tracing::warn!("Poll failed, will retry next tick: {e}");
            }
        }
    }

    /// Move a task to another column.
    ///
    /// The move shows on the board immediately. The request retries per the
    /// client's transition policy; whatever the outcome, a forced refresh
    /// follows so the board converges to the server's answer (reverting the
    /// optimistic move if the transition ultimately failed).
    pub async fn move_task(&self, id: TaskId, to: TaskStatus) {
        let Some(base) = self.begin_pending(id, status_patch(to)) else {
            tracing::warn!("Ignoring move for unknown task {id}");
            return;
        };

        let result = self.client.update_status(id, to).await;
        self.clear_pending(id);

        if let Err(e) = result {
            tracing::error!("Status transition for task {id} failed: {e}");
            self.emit(SyncEvent::TransitionFailed {
                task_id: id,
                title: base.title,
                error: e.to_string(),
            });
        }

        if let Err(e) = self.refresh().await {
            tracing::warn!("Refresh after move failed: {e}");
        }
    }

    /// Create a task, then refresh so the new row (with its server id)
    /// appears on the board.
    pub async fn submit_create(&self, draft: &TaskDraft) -> ClientResult<TaskId> {
        let id = match self.client.create_task(draft).await {
            Ok(id) => id,
            Err(e) => {
                self.emit(SyncEvent::MutationFailed {
                    message: format!("Could not create task: {e}"),
                });
                return Err(e);
            }
        };

        if let Err(e) = self.refresh().await {
            tracing::warn!("Refresh after create failed: {e}");
        }
        Ok(id)
    }

    /// Apply a partial edit to a task.
    ///
    /// The edit shows optimistically while the request is in flight. On
    /// success the server's updated row replaces the local entry directly
    /// (clearing any conflict marking); on failure the engine refreshes so
    /// the board reverts to server state.
    pub async fn submit_edit(&self, id: TaskId, patch: TaskPatch) -> ClientResult<()> {
        if self.begin_pending(id, patch.clone()).is_none() {
            return Err(ClientError::Api {
                status: reqwest::StatusCode::NOT_FOUND,
                message: format!("Task {id} not found"),
            });
        }

        let result = self.client.patch_task(id, &patch).await;
        self.clear_pending(id);

        match result {
            Ok(updated) => {
                let entries = {
                    let mut state = self.state.lock();
                    if let Some(entry) = state.entries.iter_mut().find(|e| e.task.id == id) {
                        entry.task = updated;
                        entry.state = TaskSyncState::Synced;
                    }
                    state.entries.clone()
                };
                self.publish(entries);
                Ok(())
            }
            Err(e) => {
                self.emit(SyncEvent::MutationFailed {
                    message: format!("Could not save task {id}: {e}"),
                });
                if let Err(refresh_err) = self.refresh().await {
                    tracing::warn!("Refresh after failed edit also failed: {refresh_err}");
                }
                Err(e)
            }
        }
    }

    /// Delete a task. Removed from the board immediately; a refresh follows
    /// so a failed delete reappears.
    pub async fn delete_task(&self, id: TaskId) -> ClientResult<u64> {
        let entries = {
            let mut state = self.state.lock();
            state.entries.retain(|e| e.task.id != id);
            state.entries.clone()
        };
        self.publish(entries);

        let result = self.client.delete_task(id).await;
        if let Err(e) = &result {
            self.emit(SyncEvent::MutationFailed {
                message: format!("Could not delete task {id}: {e}"),
            });
        }

        if let Err(e) = self.refresh().await {
            tracing::warn!("Refresh after delete failed: {e}");
        }
        result
    }

    /// Record a pending edit for `id`, apply it optimistically to the local
    /// entry, and publish. Returns the pre-edit task, or `None` if the task
    /// is not on the board.
    fn begin_pending(&self, id: TaskId, patch: TaskPatch) -> Option<Task> {
        let (base, entries) = {
            let mut state = self.state.lock();
            let entry = state.entries.iter_mut().find(|e| e.task.id == id)?;

            let base = entry.task.clone();
            patch.apply(&mut entry.task);
            entry.state = TaskSyncState::Pending;

            state.pending.insert(
                id,
                PendingEdit {
                    base: base.clone(),
                    patch,
                },
            );
            (base, state.entries.clone())
        };
        self.publish(entries);
        Some(base)
    }

    fn clear_pending(&self, id: TaskId) {
        self.state.lock().pending.remove(&id);
    }
}

fn status_patch(status: TaskStatus) -> TaskPatch {
    TaskPatch {
        status: Some(status),
        ..TaskPatch::default()
    }
}
