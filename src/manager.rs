//! Relation transaction manager.
//!
//! Create and Delete run inside a caller-supplied [`RelationTx`]. Checks run
//! in a fixed order and the first failure wins; rows are only written once
//! every check has passed, and always as a forward/inverse pair.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::cycle::would_create_cycle;
use crate::error::{Error, Result};
use crate::kind::RelationKind;
use crate::permission::{CapabilityResolver, PermissionGate};
use crate::relation::{RelationKey, RelationPair, Requester, TaskId, TaskRelation};
use crate::store::RelationTx;

/// One task on the far side of a relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedTask {
    pub task_id: TaskId,
    pub created_by_id: String,
    pub created_at: DateTime<Utc>,
}

/// A task's relations grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelatedTasks {
    pub task_id: TaskId,
    #[serde(serialize_with = "serialize_by_kind_name")]
    pub relations: BTreeMap<RelationKind, Vec<RelatedTask>>,
}

impl RelatedTasks {
    pub fn get(&self, kind: RelationKind) -> &[RelatedTask] {
        self.relations.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

fn serialize_by_kind_name<S: Serializer>(
    relations: &BTreeMap<RelationKind, Vec<RelatedTask>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(relations.iter().map(|(kind, tasks)| (kind.as_str(), tasks)))
}

#[derive(Debug, Clone)]
pub struct RelationManager<C> {
    gate: PermissionGate<C>,
}

impl<C: CapabilityResolver> RelationManager<C> {
    pub fn new(resolver: C) -> Self {
        Self {
            gate: PermissionGate::new(resolver),
        }
    }

    pub fn gate(&self) -> &PermissionGate<C> {
        &self.gate
    }

    /// Create `key` and its mirror on behalf of `requester`.
    ///
    /// Returns the forward row as persisted.
    pub fn create<T>(&self, tx: &mut T, key: RelationKey, requester: &Requester) -> Result<TaskRelation>
    where
        T: RelationTx + ?Sized,
    {
        if key.is_self_relation() {
            return Err(Error::RelationTasksCannotBeTheSame {
                task_id: key.task_id,
            });
        }

        if !self
            .gate
            .can_create(requester, key.task_id, key.other_task_id)?
        {
            warn!(requester = %requester, relation = %key, "relation create denied");
            return Err(Error::Forbidden {
                requester: requester.id.clone(),
                task_id: key.task_id,
            });
        }

        if tx.find(&key)?.is_some() {
            return Err(Error::RelationAlreadyExists {
                task_id: key.task_id,
                other_task_id: key.other_task_id,
                kind: key.kind,
            });
        }

        if key.kind.checks_cycles() {
            let edges = tx.rows_of_kind(key.kind)?;
            debug!(relation = %key, edges = edges.len(), "checking for cycle");
            if would_create_cycle(&edges, &key) {
                return Err(Error::TaskRelationCycle {
                    task_id: key.task_id,
                    other_task_id: key.other_task_id,
                    kind: key.kind,
                });
            }
        }

        let pair = RelationPair::new(key, requester.id.clone(), Utc::now());
        let forward = pair.forward().clone();
        tx.insert_pair(pair)?;

        info!(requester = %requester, relation = %key, "relation created");
        Ok(forward)
    }

    /// Delete `key` and its mirror on behalf of `requester`.
    pub fn delete<T>(&self, tx: &mut T, key: RelationKey, requester: &Requester) -> Result<()>
    where
        T: RelationTx + ?Sized,
    {
        if tx.find(&key)?.is_none() {
            return Err(Error::RelationDoesNotExist {
                task_id: key.task_id,
                other_task_id: key.other_task_id,
                kind: key.kind,
            });
        }

        if !self.gate.can_delete(requester, key.task_id)? {
            warn!(requester = %requester, relation = %key, "relation delete denied");
            return Err(Error::Forbidden {
                requester: requester.id.clone(),
                task_id: key.task_id,
            });
        }

        let removal = tx.remove_pair(&key)?;
        if !removal.inverse {
            warn!(relation = %key.inverse(), "mirror row was already missing");
        }

        info!(requester = %requester, relation = %key, "relation deleted");
        Ok(())
    }

    /// Relations of `task_id`, grouped by kind and ordered by the other task.
    pub fn related_tasks<T>(&self, tx: &T, task_id: TaskId, requester: &Requester) -> Result<RelatedTasks>
    where
        T: RelationTx + ?Sized,
    {
        if !self.gate.can_read(requester, task_id)? {
            return Err(Error::Forbidden {
                requester: requester.id.clone(),
                task_id,
            });
        }

        let mut relations: BTreeMap<RelationKind, Vec<RelatedTask>> = BTreeMap::new();
        for row in tx.rows_for_task(task_id)? {
            relations
                .entry(row.relation_kind)
                .or_default()
                .push(RelatedTask {
                    task_id: row.other_task_id,
                    created_by_id: row.created_by_id,
                    created_at: row.created_at,
                });
        }
        for tasks in relations.values_mut() {
            tasks.sort_by_key(|task| task.task_id);
        }

        Ok(RelatedTasks { task_id, relations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskSide;
    use crate::store::{in_transaction, MemoryStore, RelationStore};
    use std::collections::HashSet;

    /// Every task in `tasks` exists and everyone may update and read it.
    struct OpenTasks(HashSet<TaskId>);

    impl OpenTasks {
        fn new(ids: &[TaskId]) -> Self {
            Self(ids.iter().copied().collect())
        }
    }

    impl CapabilityResolver for OpenTasks {
        fn task_exists(&self, task_id: TaskId) -> Result<bool> {
            Ok(self.0.contains(&task_id))
        }

        fn has_update_capability(&self, _: &Requester, task_id: TaskId) -> Result<bool> {
            Ok(task_id != 14)
        }

        fn has_read_capability(&self, _: &Requester, _: TaskId) -> Result<bool> {
            Ok(true)
        }
    }

    fn manager() -> RelationManager<OpenTasks> {
        RelationManager::new(OpenTasks::new(&[1, 2, 3, 4, 14, 29]))
    }

    fn user() -> Requester {
        Requester::new("1")
    }

    #[test]
    fn create_returns_forward_row() {
        let store = MemoryStore::new();
        let row = in_transaction(&store, |tx| {
            manager().create(tx, RelationKey::new(1, 2, RelationKind::Subtask), &user())
        })
        .expect("create");
        assert_eq!(row.created_by_id, "1");
        assert_eq!(row.key(), RelationKey::new(1, 2, RelationKind::Subtask));
    }

    #[test]
    fn self_relation_checked_before_existence() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        let err = manager()
            .create(&mut tx, RelationKey::new(999, 999, RelationKind::Related), &user())
            .expect_err("same task");
        assert!(matches!(
            err,
            Error::RelationTasksCannotBeTheSame { task_id: 999 }
        ));
    }

    #[test]
    fn missing_task_beats_forbidden() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        let err = manager()
            .create(&mut tx, RelationKey::new(14, 77, RelationKind::Blocking), &user())
            .expect_err("missing other");
        assert!(matches!(
            err,
            Error::TaskDoesNotExist {
                task_id: 77,
                side: TaskSide::Other
            }
        ));
    }

    #[test]
    fn forbidden_when_base_not_updatable() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        let err = manager()
            .create(&mut tx, RelationKey::new(14, 1, RelationKind::Subtask), &user())
            .expect_err("forbidden");
        assert!(matches!(err, Error::Forbidden { task_id: 14, .. }));
        assert!(tx.rows_for_task(14).expect("rows").is_empty());
    }

    #[test]
    fn delete_missing_reports_does_not_exist() {
        let store = MemoryStore::new();
        let mut tx = store.begin().expect("begin");
        let err = manager()
            .delete(&mut tx, RelationKey::new(9999, 3, RelationKind::Subtask), &user())
            .expect_err("missing");
        assert!(matches!(err, Error::RelationDoesNotExist { task_id: 9999, .. }));
    }

    #[test]
    fn related_tasks_groups_by_kind() {
        let store = MemoryStore::new();
        let manager = manager();
        in_transaction(&store, |tx| {
            manager.create(tx, RelationKey::new(1, 3, RelationKind::Subtask), &user())?;
            manager.create(tx, RelationKey::new(1, 2, RelationKind::Subtask), &user())?;
            manager.create(tx, RelationKey::new(4, 1, RelationKind::Blocking), &user())?;
            Ok(())
        })
        .expect("seed");

        let tx = store.begin().expect("begin");
        let related = manager.related_tasks(&tx, 1, &user()).expect("related");
        let subtasks: Vec<TaskId> = related
            .get(RelationKind::Subtask)
            .iter()
            .map(|task| task.task_id)
            .collect();
        assert_eq!(subtasks, vec![2, 3]);
        assert_eq!(related.get(RelationKind::Blocked).len(), 1);
        assert!(related.get(RelationKind::Blocking).is_empty());

        let json = serde_json::to_value(&related).expect("serialize");
        assert_eq!(json["relations"]["subtask"][0]["task_id"], serde_json::json!(2));
        assert_eq!(json["relations"]["blocked"][0]["task_id"], serde_json::json!(4));
    }
}
