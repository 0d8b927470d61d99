//! Shard persistence: one JSON file per user under the store directory.
//!
//! The core keeps shards in memory; the CLI loads a user's shard before a
//! command and writes it back after any command that mutated it. Writes go
//! through a temp file rename so an interrupted command never leaves a
//! half-written shard behind.

use crate::error::CliError;
use crate::io_utils::ensure_parent_dir;
use railbird_core::store::UserShard;
use std::path::{Path, PathBuf};

/// Path of the persisted shard file for `user` inside `store_dir`.
pub fn shard_path(store_dir: &str, user: &str) -> PathBuf {
    Path::new(store_dir).join(format!("{}.json", user))
}

/// Rejects user names that would escape the store directory or produce
/// surprising filenames.
pub fn validate_user(user: &str) -> Result<(), CliError> {
    if user.is_empty() {
        return Err(CliError::InvalidInput("user must not be empty".into()));
    }
    let ok = user
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !ok || user.starts_with('.') {
        return Err(CliError::InvalidInput(format!(
            "invalid user name: {}",
            user
        )));
    }
    Ok(())
}

/// Loads a user's shard from disk. A missing file is an empty shard, not an
/// error: every user starts somewhere.
pub fn load_shard(store_dir: &str, user: &str) -> Result<UserShard, CliError> {
    validate_user(user)?;
    let path = shard_path(store_dir, user);
    if !path.exists() {
        return Ok(UserShard::default());
    }
    let content = std::fs::read_to_string(&path)?;
    serde_json::from_str(&content).map_err(|e| {
        CliError::Config(format!(
            "corrupt shard file {}: {}",
            path.display(),
            e
        ))
    })
}

/// Writes a user's shard to disk atomically.
pub fn save_shard(store_dir: &str, user: &str, shard: &UserShard) -> Result<(), CliError> {
    validate_user(user)?;
    let path = shard_path(store_dir, user);
    ensure_parent_dir(&path).map_err(CliError::Config)?;
    let json = serde_json::to_string(shard)
        .map_err(|e| CliError::Core(format!("failed to serialize shard: {}", e)))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
}
