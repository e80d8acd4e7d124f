//! Task registry with per-task capability grants.
//!
//! This is the capability source the CLI plugs into the permission gate. A
//! task's owner and editors may update it; readers may only read it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::lock::FileLock;
use crate::permission::CapabilityResolver;
use crate::relation::{Requester, TaskId};
use crate::storage::Storage;

const REGISTRY_SCHEMA_VERSION: &str = "taskrel.tasks.v1";

fn default_schema_version() -> String {
    REGISTRY_SCHEMA_VERSION.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Read,
    Update,
}

impl std::str::FromStr for AccessLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(AccessLevel::Read),
            "update" | "write" => Ok(AccessLevel::Update),
            other => Err(Error::InvalidArgument(format!(
                "unknown access level '{other}' (expected read|update)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub owner: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub editors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readers: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl TaskEntry {
    fn can_update(&self, actor: &str) -> bool {
        self.owner == actor || self.editors.iter().any(|editor| editor == actor)
    }

    fn can_read(&self, actor: &str) -> bool {
        self.can_update(actor) || self.readers.iter().any(|reader| reader == actor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile {
    #[serde(default = "default_schema_version")]
    schema_version: String,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, TaskEntry>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry, or an empty one if the file does not exist yet.
    pub fn load(storage: &Storage) -> Result<Self> {
        let path = storage.tasks_file();
        if !path.exists() {
            return Ok(Self::new());
        }
        let file: RegistryFile = storage.read_json(&path)?;
        if file.schema_version != REGISTRY_SCHEMA_VERSION {
            return Err(Error::OperationFailed(format!(
                "unsupported task registry schema '{}'",
                file.schema_version
            )));
        }
        Ok(Self {
            tasks: file.tasks.into_iter().map(|task| (task.id, task)).collect(),
        })
    }

    pub fn save(&self, storage: &Storage) -> Result<()> {
        let file = RegistryFile {
            schema_version: default_schema_version(),
            tasks: self.tasks.values().cloned().collect(),
        };
        storage.write_json(&storage.tasks_file(), &file)
    }

    /// Load, apply `f`, and save while holding the registry lock.
    pub fn update<T, F>(storage: &Storage, timeout_ms: u64, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskRegistry) -> Result<T>,
    {
        let _lock = FileLock::acquire(storage.tasks_lock_file(), timeout_ms)?;
        let mut registry = Self::load(storage)?;
        let value = f(&mut registry)?;
        registry.save(storage)?;
        Ok(value)
    }

    pub fn add_task(
        &mut self,
        id: TaskId,
        title: Option<String>,
        owner: impl Into<String>,
    ) -> Result<&TaskEntry> {
        if self.tasks.contains_key(&id) {
            return Err(Error::InvalidArgument(format!("task already exists: {id}")));
        }
        let owner = owner.into();
        if owner.trim().is_empty() {
            return Err(Error::InvalidArgument("task owner cannot be empty".to_string()));
        }
        debug!(task_id = id, owner = %owner, "registering task");
        let entry = self.tasks.entry(id).or_insert(TaskEntry {
            id,
            title: title.map(|title| title.trim().to_string()).filter(|t| !t.is_empty()),
            owner,
            editors: Vec::new(),
            readers: Vec::new(),
            created_at: Utc::now(),
        });
        Ok(entry)
    }

    pub fn grant(&mut self, id: TaskId, actor: &str, level: AccessLevel) -> Result<&TaskEntry> {
        let actor = actor.trim();
        if actor.is_empty() {
            return Err(Error::InvalidArgument("actor cannot be empty".to_string()));
        }
        let entry = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| Error::InvalidArgument(format!("task not found: {id}")))?;
        let list = match level {
            AccessLevel::Read => &mut entry.readers,
            AccessLevel::Update => &mut entry.editors,
        };
        if !list.iter().any(|existing| existing == actor) {
            list.push(actor.to_string());
            list.sort();
        }
        Ok(entry)
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskEntry> {
        self.tasks.get(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &TaskEntry> {
        self.tasks.values()
    }
}

impl CapabilityResolver for TaskRegistry {
    fn task_exists(&self, task_id: TaskId) -> Result<bool> {
        Ok(self.tasks.contains_key(&task_id))
    }

    fn has_update_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        Ok(self
            .tasks
            .get(&task_id)
            .is_some_and(|task| task.can_update(&requester.id)))
    }

    fn has_read_capability(&self, requester: &Requester, task_id: TaskId) -> Result<bool> {
        Ok(self
            .tasks
            .get(&task_id)
            .is_some_and(|task| task.can_read(&requester.id)))
    }
}
