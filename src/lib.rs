//! taskrel - Typed Task Relations Library
//!
//! This library provides the core functionality for the taskrel CLI tool:
//! directed, typed relations between tasks that are always stored together
//! with their mirror.
//!
//! # Core Concepts
//!
//! - **Relation kinds**: eleven kinds, each paired with an inverse
//! - **Mirrored pairs**: creating `A subtask B` also writes `B parenttask A`
//! - **Cycle prevention**: no kind except `related` may form a cycle
//! - **Permission gate**: update on the base task, read on the other task
//! - **Transactions**: every check and write of one operation sees one view
//!
//! # Module Organization
//!
//! - `kind`: Relation kinds and the inverse table
//! - `relation`: Relation rows, keys and mirrored pairs
//! - `cycle`: Reachability search over same-kind edges
//! - `permission`: Capability resolution and the permission gate
//! - `store`: Transactional store traits and the in-memory store
//! - `file_store`: JSONL-backed store under a file lock
//! - `manager`: Create, delete and list relations
//! - `registry`: File-backed task registry with capability grants
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskrel.toml`
//! - `error`: Error types and result aliases
//! - `actor`: Actor identity management
//! - `storage`: File storage and directory management
//! - `lock`: File locking for concurrency safety

pub mod actor;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod file_store;
pub mod kind;
pub mod lock;
pub mod manager;
pub mod output;
pub mod permission;
pub mod registry;
pub mod relation;
pub mod storage;
pub mod store;

pub use error::{Error, Result, TaskSide};
pub use file_store::FileStore;
pub use kind::RelationKind;
pub use manager::{RelatedTask, RelatedTasks, RelationManager};
pub use permission::{CapabilityResolver, PermissionGate};
pub use relation::{RelationKey, RelationPair, Requester, TaskId, TaskRelation};
pub use store::{in_transaction, MemoryStore, RelationStore, RelationTx};
