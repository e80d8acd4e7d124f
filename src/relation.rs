//! Relation rows and the mirrored pair written for every logical relation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::kind::RelationKind;

pub type TaskId = i64;

/// The identity of a relation row: `(task_id, other_task_id, kind)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RelationKey {
    pub task_id: TaskId,
    pub other_task_id: TaskId,
    #[serde(rename = "relation_kind")]
    pub kind: RelationKind,
}

impl RelationKey {
    pub fn new(task_id: TaskId, other_task_id: TaskId, kind: RelationKind) -> Self {
        Self {
            task_id,
            other_task_id,
            kind,
        }
    }

    /// Key of the mirror row.
    pub fn inverse(&self) -> Self {
        Self {
            task_id: self.other_task_id,
            other_task_id: self.task_id,
            kind: self.kind.inverse(),
        }
    }

    pub fn is_self_relation(&self) -> bool {
        self.task_id == self.other_task_id
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.task_id, self.kind, self.other_task_id)
    }
}

/// A persisted relation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRelation {
    pub task_id: TaskId,
    pub other_task_id: TaskId,
    pub relation_kind: RelationKind,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
}

impl TaskRelation {
    pub fn key(&self) -> RelationKey {
        RelationKey::new(self.task_id, self.other_task_id, self.relation_kind)
    }
}

/// Forward and inverse rows of one logical relation.
///
/// Stores only ever receive both rows together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPair {
    forward: TaskRelation,
    inverse: TaskRelation,
}

impl RelationPair {
    pub fn new(key: RelationKey, created_by_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        let created_by_id = created_by_id.into();
        let mirror = key.inverse();
        Self {
            forward: TaskRelation {
                task_id: key.task_id,
                other_task_id: key.other_task_id,
                relation_kind: key.kind,
                created_by_id: created_by_id.clone(),
                created_at,
            },
            inverse: TaskRelation {
                task_id: mirror.task_id,
                other_task_id: mirror.other_task_id,
                relation_kind: mirror.kind,
                created_by_id,
                created_at,
            },
        }
    }

    pub fn forward(&self) -> &TaskRelation {
        &self.forward
    }

    pub fn inverse(&self) -> &TaskRelation {
        &self.inverse
    }

    pub fn into_rows(self) -> [TaskRelation; 2] {
        [self.forward, self.inverse]
    }
}

/// The identity a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
}

impl Requester {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
