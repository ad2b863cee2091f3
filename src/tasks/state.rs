// src/tasks/state.rs

//! Task status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Status of a task.
///
/// Allowed transitions:
///
/// - `pending` -> `ready` | `skipped`
/// - `ready` -> `running` | `skipped`
/// - `running` -> `done` | `failed`
/// - `failed` -> `pending` (retry)
///
/// `done` and `skipped` are terminal. A node whose status is still blank may
/// additionally enter `pending` or `ready`; that rule lives at the manager
/// layer where statuses are plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Ready,
    Running,
    Done,
    Failed,
    Skipped,
}

impl TaskState {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Ready => "ready",
            TaskState::Running => "running",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        }
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::*;
        matches!(
            (self, next),
            (Pending, Ready)
                | (Pending, Skipped)
                | (Ready, Running)
                | (Ready, Skipped)
                | (Running, Done)
                | (Running, Failed)
                | (Failed, Pending)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Skipped)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task state: {0:?}")]
pub struct ParseStateError(String);

impl FromStr for TaskState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskState::Pending),
            "ready" => Ok(TaskState::Ready),
            "running" => Ok(TaskState::Running),
            "done" => Ok(TaskState::Done),
            "failed" => Ok(TaskState::Failed),
            "skipped" => Ok(TaskState::Skipped),
            other => Err(ParseStateError(other.to_string())),
        }
    }
}
