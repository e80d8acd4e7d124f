//! taskrel relation command implementation
//!
//! Every mutating command runs inside one file-backed transaction: the
//! relations lock is held from the first check until the pair is written.

use serde::Serialize;

use crate::actor;
use crate::cli::Workspace;
use crate::error::Result;
use crate::kind::RelationKind;
use crate::manager::RelationManager;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::registry::TaskRegistry;
use crate::relation::{RelationKey, TaskId, TaskRelation};
use crate::store::{in_transaction, RelationStore};

#[derive(Serialize)]
struct RelationAddReport {
    relation: TaskRelation,
    inverse: RelationKey,
}

#[derive(Serialize)]
struct RelationRemoveReport {
    removed: RelationKey,
    inverse: RelationKey,
}

#[derive(Serialize)]
struct KindReport {
    name: &'static str,
    code: u8,
    inverse: &'static str,
    checks_cycles: bool,
}

#[derive(Serialize)]
struct KindsReport {
    kinds: Vec<KindReport>,
}

fn parse_key(task: TaskId, kind: &str, other: TaskId) -> Result<RelationKey> {
    let kind: RelationKind = kind.parse()?;
    Ok(RelationKey::new(task, other, kind))
}

fn manager(workspace: &Workspace) -> Result<RelationManager<TaskRegistry>> {
    Ok(RelationManager::new(TaskRegistry::load(&workspace.storage)?))
}

pub fn run_add(
    workspace: &Workspace,
    cli_actor: Option<&str>,
    task: TaskId,
    kind: &str,
    other: TaskId,
    output: OutputOptions,
) -> Result<()> {
    let key = parse_key(task, kind, other)?;
    let requester = actor::resolve_requester(&workspace.storage, &workspace.config, cli_actor)?;
    let manager = manager(workspace)?;

    let store = workspace.relation_store();
    let relation = in_transaction(&store, |tx| manager.create(tx, key, &requester))?;

    let report = RelationAddReport {
        inverse: key.inverse(),
        relation,
    };

    let mut human = HumanOutput::new(format!("taskrel relation add: {key}"));
    human.push_summary("inverse", report.inverse.to_string());
    human.push_summary("created by", report.relation.created_by_id.clone());
    human.push_next_step(format!("taskrel relation list {task}"));

    emit_success(output, "relation add", &report, Some(&human))
}

pub fn run_remove(
    workspace: &Workspace,
    cli_actor: Option<&str>,
    task: TaskId,
    kind: &str,
    other: TaskId,
    output: OutputOptions,
) -> Result<()> {
    let key = parse_key(task, kind, other)?;
    let requester = actor::resolve_requester(&workspace.storage, &workspace.config, cli_actor)?;
    let manager = manager(workspace)?;

    let store = workspace.relation_store();
    in_transaction(&store, |tx| manager.delete(tx, key, &requester))?;

    let report = RelationRemoveReport {
        removed: key,
        inverse: key.inverse(),
    };

    let mut human = HumanOutput::new(format!("taskrel relation remove: {key}"));
    human.push_summary("inverse", report.inverse.to_string());

    emit_success(output, "relation remove", &report, Some(&human))
}

pub fn run_list(
    workspace: &Workspace,
    cli_actor: Option<&str>,
    task: TaskId,
    output: OutputOptions,
) -> Result<()> {
    let requester = actor::resolve_requester(&workspace.storage, &workspace.config, cli_actor)?;
    let manager = manager(workspace)?;

    let store = workspace.relation_store();
    let tx = store.begin()?;
    let related = manager.related_tasks(&tx, task, &requester)?;
    drop(tx);

    let mut human = HumanOutput::new(format!("taskrel relation list: {task}"));
    if related.is_empty() {
        human.push_detail("no relations");
    }
    for (kind, tasks) in &related.relations {
        let ids: Vec<String> = tasks.iter().map(|t| t.task_id.to_string()).collect();
        human.push_summary(kind.as_str(), ids.join(", "));
    }

    emit_success(output, "relation list", &related, Some(&human))
}

pub fn run_kinds(output: OutputOptions) -> Result<()> {
    let report = KindsReport {
        kinds: RelationKind::ALL
            .iter()
            .map(|kind| KindReport {
                name: kind.as_str(),
                code: kind.code(),
                inverse: kind.inverse().as_str(),
                checks_cycles: kind.checks_cycles(),
            })
            .collect(),
    };

    let mut human = HumanOutput::new("taskrel relation kinds");
    for kind in &report.kinds {
        human.push_detail(format!("{} ({}) <-> {}", kind.name, kind.code, kind.inverse));
    }

    emit_success(output, "relation kinds", &report, Some(&human))
}
