//! File-backed relation store.
//!
//! Rows live in `relations.jsonl`. A transaction takes the exclusive
//! `relations.lock`, loads every row, works on the copy and, on commit,
//! rewrites the file through an atomic rename. Nothing touches the file
//! before commit, so a failed or dropped transaction leaves it as it was.

use tracing::debug;
use ulid::Ulid;

use crate::error::Result;
use crate::kind::RelationKind;
use crate::lock::{FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::relation::{RelationKey, RelationPair, TaskId, TaskRelation};
use crate::storage::Storage;
use crate::store::{self, PairRemoval, RelationStore, RelationTx, RowMap};

#[derive(Debug, Clone)]
pub struct FileStore {
    storage: Storage,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Committed rows, read without taking the transaction lock.
    pub fn rows(&self) -> Result<Vec<TaskRelation>> {
        self.storage.read_jsonl(&self.storage.relations_file())
    }
}

impl RelationStore for FileStore {
    type Tx<'a> = FileTx<'a>;

    fn begin(&self) -> Result<FileTx<'_>> {
        let lock = FileLock::acquire(self.storage.relations_lock_file(), self.lock_timeout_ms)?;
        let rows = store::collect_rows(self.rows()?);
        let id = Ulid::new();
        debug!(tx = %id, rows = rows.len(), "began relation transaction");
        Ok(FileTx {
            store: self,
            _lock: lock,
            id,
            rows,
            dirty: false,
        })
    }
}

/// Transaction over a [`FileStore`]; holds the relations lock until dropped.
pub struct FileTx<'a> {
    store: &'a FileStore,
    _lock: FileLock,
    id: Ulid,
    rows: RowMap,
    dirty: bool,
}

impl FileTx<'_> {
    pub fn id(&self) -> Ulid {
        self.id
    }
}

impl RelationTx for FileTx<'_> {
    fn find(&self, key: &RelationKey) -> Result<Option<TaskRelation>> {
        Ok(self.rows.get(key).cloned())
    }

    fn rows_of_kind(&self, kind: RelationKind) -> Result<Vec<TaskRelation>> {
        Ok(store::rows_of_kind(&self.rows, kind))
    }

    fn rows_for_task(&self, task_id: TaskId) -> Result<Vec<TaskRelation>> {
        Ok(store::rows_for_task(&self.rows, task_id))
    }

    fn insert_pair(&mut self, pair: RelationPair) -> Result<()> {
        store::insert_pair(&mut self.rows, pair)?;
        self.dirty = true;
        Ok(())
    }

    fn remove_pair(&mut self, key: &RelationKey) -> Result<PairRemoval> {
        let removal = store::remove_pair(&mut self.rows, key);
        if removal.forward || removal.inverse {
            self.dirty = true;
        }
        Ok(removal)
    }

    fn commit(self) -> Result<()> {
        if !self.dirty {
            debug!(tx = %self.id, "committed relation transaction without changes");
            return Ok(());
        }
        let rows: Vec<&TaskRelation> = self.rows.values().collect();
        let storage = &self.store.storage;
        storage.write_jsonl(&storage.relations_file(), &rows)?;
        debug!(tx = %self.id, rows = rows.len(), "committed relation transaction");
        Ok(())
    }
}
