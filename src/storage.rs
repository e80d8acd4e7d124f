//! Storage layer for taskrel
//!
//! All persistent state lives in one directory under the workspace root
//! (`.taskrel/` unless configured otherwise).
//!
//! # Directory Structure
//!
//! ```text
//! .taskrel/
//!   actor                 # Persisted actor identity
//!   relations.jsonl       # One relation row per line (forward and inverse)
//!   relations.lock        # Held for the lifetime of a relation transaction
//!   tasks.json            # Task registry with capability grants
//!   tasks.lock            # Held while the registry is rewritten
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Default name of the state directory
pub const DEFAULT_DATA_DIR: &str = ".taskrel";

/// Storage manager for taskrel state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Workspace root the state directory is resolved against
    root: PathBuf,
    /// Absolute path of the state directory
    data_dir: PathBuf,
}

impl Storage {
    /// Create storage rooted at `root` with state in `root/<data_dir>`.
    pub fn new(root: PathBuf, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = root.join(data_dir);
        Self { root, data_dir }
    }

    /// Storage with the default `.taskrel` directory
    pub fn for_root(root: PathBuf) -> Self {
        Self::new(root, DEFAULT_DATA_DIR)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn actor_file(&self) -> PathBuf {
        self.data_dir.join("actor")
    }

    pub fn relations_file(&self) -> PathBuf {
        self.data_dir.join("relations.jsonl")
    }

    pub fn relations_lock_file(&self) -> PathBuf {
        self.data_dir.join("relations.lock")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }

    pub fn tasks_lock_file(&self) -> PathBuf {
        self.data_dir.join("tasks.lock")
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    /// Create the state directory and an empty relations file.
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        let relations = self.relations_file();
        if !relations.exists() {
            File::create(&relations)?;
        }

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir.exists()
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write data atomically using temp file + rename
    ///
    /// Readers never see a partial file: it is either the old content or the
    /// new content.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;

        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Replace a JSONL file with `records`, one per line, atomically.
    pub fn write_jsonl<T: Serialize>(&self, path: &Path, records: &[T]) -> Result<()> {
        let mut buffer = Vec::new();
        for record in records {
            let json = serde_json::to_string(record)?;
            buffer.extend_from_slice(json.as_bytes());
            buffer.push(b'\n');
        }
        self.write_atomic(path, &buffer)
    }

    /// Read all records from a JSONL file
    pub fn read_jsonl<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)?;
            records.push(record);
        }

        Ok(records)
    }
}
