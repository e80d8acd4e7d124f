//! Command-line interface for taskrel
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::file_store::FileStore;
use crate::output::OutputOptions;
use crate::storage::Storage;

mod init;
mod relation;
mod task;

/// taskrel - typed relations between tasks
///
/// Creates and removes relations such as subtask, blocking or follows,
/// keeping every relation mirrored and every relation kind free of cycles.
#[derive(Parser, Debug)]
#[command(name = "taskrel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workspace root holding .taskrel.toml and the state directory
    #[arg(long, global = true, env = "TASKREL_ROOT")]
    pub root: Option<PathBuf>,

    /// Actor identity used for permission checks and created_by
    #[arg(long, global = true, env = "TASKREL_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the state directory
    Init {
        /// Persist this actor as the workspace default
        #[arg(long = "as")]
        as_actor: Option<String>,
    },

    /// Task registry and capability grants
    #[command(subcommand)]
    Task(TaskCommands),

    /// Relations between tasks
    #[command(subcommand)]
    Relation(RelationCommands),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Register a task
    Add {
        /// Numeric task id
        id: i64,

        /// Optional title
        #[arg(long)]
        title: Option<String>,

        /// Owner (defaults to the current actor)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Grant an actor read or update access to a task
    Grant {
        /// Task id
        id: i64,

        /// Actor to grant
        actor: String,

        /// Access level: read or update
        #[arg(long, default_value = "read")]
        level: String,
    },

    /// List registered tasks
    List,
}

#[derive(Subcommand, Debug)]
pub enum RelationCommands {
    /// Create a relation and its mirror
    Add {
        /// Base task id
        task: i64,

        /// Relation kind (see `taskrel relation kinds`)
        kind: String,

        /// Other task id
        other: i64,
    },

    /// Remove a relation and its mirror
    Remove {
        /// Base task id
        task: i64,

        /// Relation kind
        kind: String,

        /// Other task id
        other: i64,
    },

    /// List the relations of a task grouped by kind
    List {
        /// Task id
        task: i64,
    },

    /// List relation kinds and their inverses
    Kinds,
}

/// Resolved workspace: root, configuration and storage.
#[derive(Debug, Clone)]
pub(crate) struct Workspace {
    pub config: Config,
    pub storage: Storage,
}

impl Workspace {
    pub(crate) fn open(root: Option<PathBuf>) -> Result<Self> {
        let root = match root {
            Some(root) => root,
            None => std::env::current_dir()?,
        };
        let config = Config::load_from_root(&root)?;
        let storage = config.storage(&root);
        Ok(Self { config, storage })
    }

    pub(crate) fn relation_store(&self) -> FileStore {
        FileStore::new(self.storage.clone()).with_lock_timeout(self.config.storage.lock_timeout_ms)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let actor = self.actor.as_deref();

        match self.command {
            Commands::Init { as_actor } => init::run(self.root, as_actor, output),
            Commands::Task(cmd) => {
                let workspace = Workspace::open(self.root)?;
                match cmd {
                    TaskCommands::Add { id, title, owner } => {
                        task::run_add(&workspace, actor, id, title, owner, output)
                    }
                    TaskCommands::Grant { id, actor: grantee, level } => {
                        task::run_grant(&workspace, id, &grantee, &level, output)
                    }
                    TaskCommands::List => task::run_list(&workspace, output),
                }
            }
            Commands::Relation(cmd) => {
                if let RelationCommands::Kinds = cmd {
                    return relation::run_kinds(output);
                }
                let workspace = Workspace::open(self.root)?;
                match cmd {
                    RelationCommands::Add { task, kind, other } => {
                        relation::run_add(&workspace, actor, task, &kind, other, output)
                    }
                    RelationCommands::Remove { task, kind, other } => {
                        relation::run_remove(&workspace, actor, task, &kind, other, output)
                    }
                    RelationCommands::List { task } => {
                        relation::run_list(&workspace, actor, task, output)
                    }
                    RelationCommands::Kinds => relation::run_kinds(output),
                }
            }
        }
    }
}
