//! Board view-model: the three status columns and drag handling.

use fieldboard_core::task::{TaskId, TaskStatus};

use crate::sync::{SyncEngine, TaskEntry};

/// One status column of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub tasks: Vec<TaskEntry>,
}

/// Partition a board snapshot into the three fixed columns.
///
/// Columns appear in board order; within a column, tasks keep the order of
/// the snapshot (the server's creation order).
pub fn columns(entries: &[TaskEntry]) -> [BoardColumn; 3] {
    TaskStatus::ALL.map(|status| BoardColumn {
        status,
        tasks: entries
            .iter()
            .filter(|e| e.task.status == status)
            .cloned()
            .collect(),
    })
}

/// Drag-and-drop controller for the board.
#[derive(Clone)]
pub struct Board {
    engine: SyncEngine,
}

impl Board {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Current columns.
    pub fn columns(&self) -> [BoardColumn; 3] {
        columns(&self.engine.snapshot())
    }

    /// Handle a card dropped onto a column.
    ///
    /// A drop onto the card's own column is a no-op; no request is issued.
    pub async fn drop_card(&self, task_id: TaskId, from: TaskStatus, to: TaskStatus) {
        if from == to {
            tracing::debug!("Task {task_id} dropped on its own column, ignoring");
            return;
        }
        self.engine.move_task(task_id, to).await;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use crate::sync::TaskSyncState;
    use fieldboard_core::task::Task;

    fn entry(id: TaskId, status: TaskStatus) -> TaskEntry {
        TaskEntry {
            task: Task {
                id,
                title: format!("task {id}"),
                description: "desc".to_string(),
                location: "yard".to_string(),
                status,
                image: None,
            },
            state: TaskSyncState::Synced,
        }
    }

    #[test]
    fn test_columns_partition_by_status_in_board_order() {
        let entries = vec![
            entry(1, TaskStatus::Completed),
            entry(2, TaskStatus::NewTasks),
            entry(3, TaskStatus::InProgress),
            entry(4, TaskStatus::NewTasks),
        ];

        let cols = columns(&entries);

        assert_eq!(cols[0].status, TaskStatus::NewTasks);
        assert_eq!(cols[1].status, TaskStatus::InProgress);
        assert_eq!(cols[2].status, TaskStatus::Completed);

        let new_ids: Vec<TaskId> = cols[0].tasks.iter().map(|e| e.task.id).collect();
        assert_eq!(new_ids, vec![2, 4]);
        assert_eq!(cols[1].tasks.len(), 1);
        assert_eq!(cols[2].tasks.len(), 1);
    }

    #[test]
    fn test_columns_empty_snapshot_has_three_empty_columns() {
        let cols = columns(&[]);
        assert!(cols.iter().all(|c| c.tasks.is_empty()));
    }
}
