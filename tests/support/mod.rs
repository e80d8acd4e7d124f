#![allow(dead_code)]

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

use taskrel::error::Result;
use taskrel::{CapabilityResolver, Requester, TaskId};

/// Temporary workspace root for CLI tests.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".taskrel")
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(".taskrel.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Non-empty lines of `relations.jsonl`.
    pub fn relation_lines(&self) -> std::io::Result<Vec<String>> {
        let path = self.data_dir().join("relations.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(fs::read_to_string(path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `taskrel` bound to this workspace with no ambient actor.
    pub fn cmd(&self) -> Command {
        let mut cmd = taskrel_cmd();
        cmd.current_dir(self.path())
            .env_remove("TASKREL_ACTOR")
            .env_remove("TASKREL_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }
}

pub fn taskrel_cmd() -> Command {
    Command::cargo_bin("taskrel").expect("taskrel binary")
}

/// Capability stub: listed tasks exist and are open to everyone unless locked or hidden.
pub struct Tasks {
    existing: HashSet<TaskId>,
    locked: HashSet<TaskId>,
    hidden: HashSet<TaskId>,
}

impl Tasks {
    pub fn new(ids: &[TaskId]) -> Self {
        Self {
            existing: ids.iter().copied().collect(),
            locked: HashSet::new(),
            hidden: HashSet::new(),
        }
    }

    /// Nobody may update `id`.
    pub fn locked(mut self, id: TaskId) -> Self {
        self.locked.insert(id);
        self
    }

    /// Nobody may read (or update) `id`.
    pub fn hidden(mut self, id: TaskId) -> Self {
        self.hidden.insert(id);
        self.locked.insert(id);
        self
    }
}

impl CapabilityResolver for Tasks {
    fn task_exists(&self, task_id: TaskId) -> Result<bool> {
        Ok(self.existing.contains(&task_id))
    }

    fn has_update_capability(&self, _requester: &Requester, task_id: TaskId) -> Result<bool> {
        Ok(!self.locked.contains(&task_id))
    }

    fn has_read_capability(&self, _requester: &Requester, task_id: TaskId) -> Result<bool> {
        Ok(!self.hidden.contains(&task_id))
    }
}
