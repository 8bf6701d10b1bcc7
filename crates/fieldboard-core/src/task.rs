//! Task and comment domain types shared by the server and the sync client.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Server-assigned task identifier.
pub type TaskId = i64;

/// The three fixed board columns.
///
/// The wire format is the canonical display string ("New Tasks", "In Progress",
/// "Completed"). Parsing is case-insensitive; serialization always emits the
/// canonical casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TaskStatus {
    #[default]
    NewTasks,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// All statuses in board-column order.
    pub const ALL: [TaskStatus; 3] =
        [TaskStatus::NewTasks, TaskStatus::InProgress, TaskStatus::Completed];

    /// Canonical display/wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NewTasks => "New Tasks",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Parse a status string, ignoring case and surrounding whitespace.
    ///
    /// Returns `None` for anything outside the three canonical values.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new tasks" => Some(TaskStatus::NewTasks),
            "in progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TaskStatus::parse(&raw).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid status '{raw}' (expected one of: New Tasks, In Progress, Completed)"
            ))
        })
    }
}

/// A single board task.
///
/// `image` carries the base64 payload: raw base64 when submitted, a
/// `data:image/jpeg;base64,` data URL when returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: TaskStatus,
    pub image: Option<String>,
}

/// A comment attached to a task. Destroyed with the task (cascade).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: TaskId,
    pub content: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_status_parse_case_insensitive() {
        assert_eq!(TaskStatus::parse("new tasks"), Some(TaskStatus::NewTasks));
        assert_eq!(TaskStatus::parse("NEW TASKS"), Some(TaskStatus::NewTasks));
        assert_eq!(TaskStatus::parse("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::parse("  completed  "), Some(TaskStatus::Completed));
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(TaskStatus::parse("Done"), None);
        assert_eq!(TaskStatus::parse(""), None);
        assert_eq!(TaskStatus::parse("New  Tasks"), None);
    }

    #[test]
    fn test_status_serializes_canonical_casing() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, r#""In Progress""#);
    }

    #[test]
    fn test_status_deserializes_any_casing() {
        let status: TaskStatus = serde_json::from_str(r#""cOmPlEtEd""#).unwrap();
        assert_eq!(status, TaskStatus::Completed);
    }

    #[test]
    fn test_status_deserialize_error_names_value() {
        let err = serde_json::from_str::<TaskStatus>(r#""Archived""#).unwrap_err();
        assert!(err.to_string().contains("Archived"));
    }

    #[test]
    fn test_task_serialization_round_trip() {
        let task = Task {
            id: 7,
            title: "Recon".to_string(),
            description: "scout area".to_string(),
            location: "sector 4".to_string(),
            status: TaskStatus::NewTasks,
            image: None,
        };

        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""status":"New Tasks""#));
        assert!(json.contains(r#""image":null"#));

        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
