//! Error types for taskrel
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, missing task, invalid relation)
//! - 3: Blocked by policy (missing capability)
//! - 4: Operation failed (storage, lock, serialization)

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::kind::RelationKind;
use crate::relation::TaskId;

/// Exit codes for the taskrel CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Which side of a relation a task id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSide {
    Base,
    Other,
}

impl fmt::Display for TaskSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSide::Base => f.write_str("base"),
            TaskSide::Other => f.write_str("other"),
        }
    }
}

/// Main error type for taskrel operations
#[derive(Error, Debug)]
pub enum Error {
    // Relation outcomes (exit code 2)
    #[error("Task does not exist: {task_id} ({side} task)")]
    TaskDoesNotExist { task_id: TaskId, side: TaskSide },

    #[error("A task cannot be related to itself: {task_id}")]
    RelationTasksCannotBeTheSame { task_id: TaskId },

    #[error("Relation already exists: {task_id} {kind} {other_task_id}")]
    RelationAlreadyExists {
        task_id: TaskId,
        other_task_id: TaskId,
        kind: RelationKind,
    },

    #[error("Relation would create a cycle: {task_id} {kind} {other_task_id}")]
    TaskRelationCycle {
        task_id: TaskId,
        other_task_id: TaskId,
        kind: RelationKind,
    },

    #[error("Relation does not exist: {task_id} {kind} {other_task_id}")]
    RelationDoesNotExist {
        task_id: TaskId,
        other_task_id: TaskId,
        kind: RelationKind,
    },

    #[error("Invalid relation kind: {0}")]
    InvalidRelationKind(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Policy blocks (exit code 3)
    #[error("Forbidden: {requester} may not change relations of task {task_id}")]
    Forbidden { requester: String, task_id: TaskId },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TaskDoesNotExist { .. }
            | Error::RelationTasksCannotBeTheSame { .. }
            | Error::RelationAlreadyExists { .. }
            | Error::TaskRelationCycle { .. }
            | Error::RelationDoesNotExist { .. }
            | Error::InvalidRelationKind(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_) => exit_codes::USER_ERROR,

            Error::Forbidden { .. } => exit_codes::POLICY_BLOCKED,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Stable, machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::TaskDoesNotExist { .. } => "task_does_not_exist",
            Error::RelationTasksCannotBeTheSame { .. } => "relation_tasks_cannot_be_the_same",
            Error::RelationAlreadyExists { .. } => "relation_already_exists",
            Error::TaskRelationCycle { .. } => "task_relation_cycle",
            Error::RelationDoesNotExist { .. } => "relation_does_not_exist",
            Error::InvalidRelationKind(_) => "invalid_relation_kind",
            Error::InvalidConfig(_) => "invalid_config",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Forbidden { .. } => "forbidden",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::TomlParse(_) => "toml_parse",
            Error::TomlSerialize(_) => "toml_serialize",
            Error::LockFailed(_) => "lock_failed",
            Error::OperationFailed(_) => "operation_failed",
        }
    }

    /// True for storage and serialization faults, as opposed to relation outcomes.
    pub fn is_infrastructure(&self) -> bool {
        self.exit_code() == exit_codes::OPERATION_FAILED
    }

    /// Structured fields for the JSON error envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        use serde_json::json;

        match self {
            Error::TaskDoesNotExist { task_id, side } => Some(json!({
                "task_id": task_id,
                "side": side,
            })),
            Error::RelationTasksCannotBeTheSame { task_id } => Some(json!({
                "task_id": task_id,
            })),
            Error::RelationAlreadyExists {
                task_id,
                other_task_id,
                kind,
            }
            | Error::TaskRelationCycle {
                task_id,
                other_task_id,
                kind,
            }
            | Error::RelationDoesNotExist {
                task_id,
                other_task_id,
                kind,
            } => Some(json!({
                "task_id": task_id,
                "other_task_id": other_task_id,
                "relation_kind": kind.as_str(),
            })),
            Error::Forbidden { requester, task_id } => Some(json!({
                "requester": requester,
                "task_id": task_id,
            })),
            Error::InvalidRelationKind(value) => Some(json!({ "value": value })),
            Error::InvalidConfig(message) | Error::InvalidArgument(message) => {
                Some(json!({ "message": message }))
            }
            Error::LockFailed(path) => Some(json!({ "path": path })),
            _ => None,
        }
    }
}

/// Result type alias for taskrel operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            kind: err.code(),
            details: err.details(),
        }
    }
}
