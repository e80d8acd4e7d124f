//! Persistence adapter for relation rows.
//!
//! A [`RelationStore`] hands out transactions. Everything a Create or Delete
//! reads and writes goes through one [`RelationTx`]; committing publishes both
//! rows of every pair, dropping the transaction discards them.
//!
//! Isolation is the store's job. Both stores here serialize transactions (a
//! mutex for [`MemoryStore`], a file lock for
//! [`FileStore`](crate::file_store::FileStore)), which keeps the cycle check
//! from running against a view another writer is about to change.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::error::{Error, Result};
use crate::kind::RelationKind;
use crate::relation::{RelationKey, RelationPair, TaskId, TaskRelation};

/// Which rows a pair removal actually found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PairRemoval {
    pub forward: bool,
    pub inverse: bool,
}

/// A unit of work over relation rows.
pub trait RelationTx {
    fn find(&self, key: &RelationKey) -> Result<Option<TaskRelation>>;

    /// Every row whose kind is `kind`.
    fn rows_of_kind(&self, kind: RelationKind) -> Result<Vec<TaskRelation>>;

    /// Every row whose base task is `task_id`.
    fn rows_for_task(&self, task_id: TaskId) -> Result<Vec<TaskRelation>>;

    /// Insert forward and inverse rows together, or neither.
    fn insert_pair(&mut self, pair: RelationPair) -> Result<()>;

    /// Remove the row at `key` and its mirror.
    fn remove_pair(&mut self, key: &RelationKey) -> Result<PairRemoval>;

    fn commit(self) -> Result<()>
    where
        Self: Sized;
}

pub trait RelationStore {
    type Tx<'a>: RelationTx
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Tx<'_>>;
}

/// Run `f` in a fresh transaction: commit on `Ok`, roll back on `Err`.
pub fn in_transaction<'s, S, T, F>(store: &'s S, f: F) -> Result<T>
where
    S: RelationStore,
    F: FnOnce(&mut S::Tx<'s>) -> Result<T>,
{
    let mut tx = store.begin()?;
    match f(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            debug!(error = %err, "rolling back relation transaction");
            drop(tx);
            Err(err)
        }
    }
}

pub(crate) type RowMap = BTreeMap<RelationKey, TaskRelation>;

pub(crate) fn collect_rows<I>(rows: I) -> RowMap
where
    I: IntoIterator<Item = TaskRelation>,
{
    rows.into_iter().map(|row| (row.key(), row)).collect()
}

/// Row-map operations shared by the in-memory and file-backed transactions.
pub(crate) fn rows_of_kind(rows: &RowMap, kind: RelationKind) -> Vec<TaskRelation> {
    rows.values()
        .filter(|row| row.relation_kind == kind)
        .cloned()
        .collect()
}

pub(crate) fn rows_for_task(rows: &RowMap, task_id: TaskId) -> Vec<TaskRelation> {
    rows.values()
        .filter(|row| row.task_id == task_id)
        .cloned()
        .collect()
}

pub(crate) fn insert_pair(rows: &mut RowMap, pair: RelationPair) -> Result<()> {
    let forward = pair.forward().key();
    let inverse = pair.inverse().key();
    if rows.contains_key(&forward) {
        return Err(Error::RelationAlreadyExists {
            task_id: forward.task_id,
            other_task_id: forward.other_task_id,
            kind: forward.kind,
        });
    }
    if rows.contains_key(&inverse) {
        return Err(Error::OperationFailed(format!(
            "mirror row {inverse} exists without {forward}"
        )));
    }
    for row in pair.into_rows() {
        rows.insert(row.key(), row);
    }
    Ok(())
}

pub(crate) fn remove_pair(rows: &mut RowMap, key: &RelationKey) -> PairRemoval {
    PairRemoval {
        forward: rows.remove(key).is_some(),
        inverse: rows.remove(&key.inverse()).is_some(),
    }
}

/// Relation rows held in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<RowMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with rows as-is, without pairing or validation.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = TaskRelation>,
    {
        Self {
            rows: Mutex::new(collect_rows(rows)),
        }
    }

    /// Committed rows, ordered by key.
    pub fn rows(&self) -> Result<Vec<TaskRelation>> {
        Ok(self.lock()?.values().cloned().collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, RowMap>> {
        self.rows
            .lock()
            .map_err(|_| Error::OperationFailed("relation store mutex poisoned".to_string()))
    }
}

impl RelationStore for MemoryStore {
    type Tx<'a> = MemoryTx<'a>;

    fn begin(&self) -> Result<MemoryTx<'_>> {
        let guard = self.lock()?;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

/// Transaction over a [`MemoryStore`]; holds the store's mutex until dropped.
pub struct MemoryTx<'a> {
    guard: MutexGuard<'a, RowMap>,
    working: RowMap,
}

impl RelationTx for MemoryTx<'_> {
    fn find(&self, key: &RelationKey) -> Result<Option<TaskRelation>> {
        Ok(self.working.get(key).cloned())
    }

    fn rows_of_kind(&self, kind: RelationKind) -> Result<Vec<TaskRelation>> {
        Ok(rows_of_kind(&self.working, kind))
    }

    fn rows_for_task(&self, task_id: TaskId) -> Result<Vec<TaskRelation>> {
        Ok(rows_for_task(&self.working, task_id))
    }

    fn insert_pair(&mut self, pair: RelationPair) -> Result<()> {
        insert_pair(&mut self.working, pair)
    }

    fn remove_pair(&mut self, key: &RelationKey) -> Result<PairRemoval> {
        Ok(remove_pair(&mut self.working, key))
    }

    fn commit(self) -> Result<()> {
        let MemoryTx { mut guard, working } = self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pair(task_id: TaskId, other_task_id: TaskId, kind: RelationKind) -> RelationPair {
        RelationPair::new(RelationKey::new(task_id, other_task_id, kind), "tester", Utc::now())
    }

    #[test]
    fn commit_publishes_both_rows() {
        let store = MemoryStore::new();
        in_transaction(&store, |tx| tx.insert_pair(pair(1, 2, RelationKind::Subtask)))
            .expect("insert");

        let keys: Vec<_> = store.rows().expect("rows").iter().map(|row| row.key()).collect();
        assert_eq!(
            keys,
            vec![
                RelationKey::new(1, 2, RelationKind::Subtask),
                RelationKey::new(2, 1, RelationKind::Parenttask),
            ]
        );
    }

    #[test]
    fn error_rolls_back() {
        let store = MemoryStore::new();
        let result: Result<()> = in_transaction(&store, |tx| {
            tx.insert_pair(pair(1, 2, RelationKind::Blocking))?;
            Err(Error::OperationFailed("boom".to_string()))
        });
        assert!(result.is_err());
        assert!(store.rows().expect("rows").is_empty());
    }

    #[test]
    fn dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().expect("begin");
            tx.insert_pair(pair(3, 4, RelationKind::Related)).expect("insert");
            assert!(tx
                .find(&RelationKey::new(4, 3, RelationKind::Related))
                .expect("find")
                .is_some());
        }
        assert!(store.rows().expect("rows").is_empty());
    }

    #[test]
    fn insert_pair_rejects_existing_forward_row() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        tx.insert_pair(pair(1, 2, RelationKind::Follows)).expect("first");
        let err = tx
            .insert_pair(pair(1, 2, RelationKind::Follows))
            .expect_err("duplicate");
        assert!(matches!(err, Error::RelationAlreadyExists { .. }));
        assert_eq!(tx.rows_of_kind(RelationKind::Follows).expect("rows").len(), 1);
    }

    #[test]
    fn insert_pair_rejects_orphan_mirror_without_writing() {
        let orphan = pair(2, 1, RelationKind::Parenttask).forward().clone();
        let store = MemoryStore::from_rows([orphan]);
        let mut tx = store.begin().expect("begin");
        let err = tx
            .insert_pair(pair(1, 2, RelationKind::Subtask))
            .expect_err("orphan mirror");
        assert!(err.is_infrastructure());
        assert!(tx
            .find(&RelationKey::new(1, 2, RelationKind::Subtask))
            .expect("find")
            .is_none());
    }

    #[test]
    fn remove_pair_reports_missing_mirror() {
        let lone = pair(5, 6, RelationKind::CopiedFrom).forward().clone();
        let store = MemoryStore::from_rows([lone]);
        let removal = in_transaction(&store, |tx| {
            tx.remove_pair(&RelationKey::new(5, 6, RelationKind::CopiedFrom))
        })
        .expect("remove");
        assert_eq!(
            removal,
            PairRemoval {
                forward: true,
                inverse: false
            }
        );
        assert!(store.rows().expect("rows").is_empty());
    }

    #[test]
    fn rows_for_task_only_returns_base_rows() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        tx.insert_pair(pair(1, 2, RelationKind::Subtask)).expect("a");
        tx.insert_pair(pair(1, 3, RelationKind::Blocking)).expect("b");
        let rows = tx.rows_for_task(1).expect("rows");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.task_id == 1));
    }
}
