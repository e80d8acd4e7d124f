//! Actor identity management.
//!
//! Actor resolution order:
//! 1) CLI --actor (explicit)
//! 2) TASKREL_ACTOR environment variable
//! 3) Persisted value in `<data dir>/actor`
//! 4) Config default (actor.default) or "unknown"

use crate::config::Config;
use crate::error::{Error, Result};
use crate::relation::Requester;
use crate::storage::Storage;

pub const ACTOR_ENV: &str = "TASKREL_ACTOR";

/// Resolve the current actor using CLI, environment, persisted value, and config.
pub fn resolve_actor(storage: &Storage, config: &Config, cli_actor: Option<&str>) -> Result<String> {
    if let Some(actor) = non_empty(cli_actor) {
        return Ok(actor.to_string());
    }

    if let Ok(env_actor) = std::env::var(ACTOR_ENV) {
        if let Some(actor) = non_empty(Some(env_actor.as_str())) {
            return Ok(actor.to_string());
        }
    }

    if let Some(actor) = load_persisted_actor(storage)? {
        return Ok(actor);
    }

    Ok(config.actor.default.clone())
}

/// Resolve the actor and wrap it as the requester of relation operations.
pub fn resolve_requester(
    storage: &Storage,
    config: &Config,
    cli_actor: Option<&str>,
) -> Result<Requester> {
    resolve_actor(storage, config, cli_actor).map(Requester::new)
}

/// Persist the actor identity in the state directory.
pub fn persist_actor(storage: &Storage, actor: &str) -> Result<()> {
    let actor = non_empty(Some(actor))
        .ok_or_else(|| Error::InvalidArgument("actor name cannot be empty".to_string()))?;
    storage.write_atomic(&storage.actor_file(), format!("{actor}\n").as_bytes())
}

/// Load the persisted actor identity, if present.
pub fn load_persisted_actor(storage: &Storage) -> Result<Option<String>> {
    let path = storage.actor_file();
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    Ok(non_empty(Some(raw.as_str())).map(str::to_string))
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
