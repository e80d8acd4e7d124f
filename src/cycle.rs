//! Cycle detection over the relation graph of a single kind.
//!
//! Each logical relation is materialized in both directions with opposite
//! kinds, so walking rows of exactly the proposed kind sees every edge of that
//! family once, in the right direction.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::relation::{RelationKey, TaskId, TaskRelation};

/// Whether `target` can be reached from `start` over edges accepted by `filter`.
///
/// Breadth-first; the visited set keeps the walk finite even if stored data
/// already contains a cycle.
pub fn reachable<'a, I, F>(edges: I, start: TaskId, target: TaskId, filter: F) -> bool
where
    I: IntoIterator<Item = &'a TaskRelation>,
    F: Fn(&TaskRelation) -> bool,
{
    let mut adjacency: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for edge in edges.into_iter().filter(|edge| filter(edge)) {
        adjacency
            .entry(edge.task_id)
            .or_default()
            .push(edge.other_task_id);
    }

    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(&current) {
            for task_id in next {
                if !visited.contains(task_id) {
                    queue.push_back(*task_id);
                }
            }
        }
    }

    false
}

/// Whether adding `proposed` would close a cycle among rows of its kind.
pub fn would_create_cycle<'a, I>(edges: I, proposed: &RelationKey) -> bool
where
    I: IntoIterator<Item = &'a TaskRelation>,
{
    if proposed.is_self_relation() {
        return true;
    }
    reachable(edges, proposed.other_task_id, proposed.task_id, |edge| {
        edge.relation_kind == proposed.kind
    })
}
