//! taskrel init command implementation
//!
//! Creates the state directory and optionally persists the default actor.

use std::path::PathBuf;

use serde::Serialize;

use crate::actor;
use crate::cli::Workspace;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(Serialize)]
struct InitReport {
    data_dir: PathBuf,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    actor: Option<String>,
}

pub fn run(root: Option<PathBuf>, as_actor: Option<String>, output: OutputOptions) -> Result<()> {
    let workspace = Workspace::open(root)?;
    let storage = &workspace.storage;

    let created = !storage.is_initialized();
    storage.init()?;

    if let Some(name) = as_actor.as_deref() {
        actor::persist_actor(storage, name)?;
    }

    let report = InitReport {
        data_dir: storage.data_dir().to_path_buf(),
        created,
        actor: as_actor.map(|name| name.trim().to_string()),
    };

    let header = if created {
        "taskrel init: initialized"
    } else {
        "taskrel init: already initialized"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("data dir", report.data_dir.display().to_string());
    if let Some(actor) = &report.actor {
        human.push_summary("actor", actor.clone());
    }
    human.push_next_step("taskrel task add <id>");

    emit_success(output, "init", &report, Some(&human))
}
