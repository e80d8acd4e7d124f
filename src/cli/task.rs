//! taskrel task command implementation
//!
//! Maintains the task registry the permission gate consults.

use serde::Serialize;

use crate::actor;
use crate::cli::Workspace;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::registry::{AccessLevel, TaskEntry, TaskRegistry};

#[derive(Serialize)]
struct TaskListReport {
    tasks: Vec<TaskEntry>,
}

pub fn run_add(
    workspace: &Workspace,
    cli_actor: Option<&str>,
    id: i64,
    title: Option<String>,
    owner: Option<String>,
    output: OutputOptions,
) -> Result<()> {
    let owner = match owner {
        Some(owner) => owner,
        None => actor::resolve_actor(&workspace.storage, &workspace.config, cli_actor)?,
    };

    let entry = TaskRegistry::update(
        &workspace.storage,
        workspace.config.storage.lock_timeout_ms,
        |registry| registry.add_task(id, title, owner).cloned(),
    )?;

    let mut human = HumanOutput::new(format!("taskrel task add: {}", entry.id));
    if let Some(title) = &entry.title {
        human.push_summary("title", title.clone());
    }
    human.push_summary("owner", entry.owner.clone());
    human.push_next_step(format!("taskrel relation add {} <kind> <other>", entry.id));

    emit_success(output, "task add", &entry, Some(&human))
}

pub fn run_grant(
    workspace: &Workspace,
    id: i64,
    grantee: &str,
    level: &str,
    output: OutputOptions,
) -> Result<()> {
    let level: AccessLevel = level.parse()?;
    let entry = TaskRegistry::update(
        &workspace.storage,
        workspace.config.storage.lock_timeout_ms,
        |registry| registry.grant(id, grantee, level).cloned(),
    )?;

    let level_name = match level {
        AccessLevel::Read => "read",
        AccessLevel::Update => "update",
    };
    let mut human = HumanOutput::new(format!(
        "taskrel task grant: {} {level_name} on {}",
        grantee.trim(),
        entry.id
    ));
    human.push_summary("editors", entry.editors.join(", "));
    human.push_summary("readers", entry.readers.join(", "));

    emit_success(output, "task grant", &entry, Some(&human))
}

pub fn run_list(workspace: &Workspace, output: OutputOptions) -> Result<()> {
    let registry = TaskRegistry::load(&workspace.storage)?;
    let report = TaskListReport {
        tasks: registry.tasks().cloned().collect(),
    };

    let mut human = HumanOutput::new(format!("taskrel task list: {} task(s)", report.tasks.len()));
    for task in &report.tasks {
        let title = task.title.as_deref().unwrap_or("");
        human.push_detail(format!("{} {} (owner {})", task.id, title, task.owner));
    }

    emit_success(output, "task list", &report, Some(&human))
}
