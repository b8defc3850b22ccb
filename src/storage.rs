//! File-based storage for named hook state.
//!
//! Each state is one small JSON file in the state directory, named exactly
//! after its key:
//!
//! ```json
//! {"key": "pending_question", "timestamp": "2026-01-01T12:00:00Z", "payload": {}}
//! ```
//!
//! Expiry is computed from the embedded `timestamp` and the store's clock.
//! Files without a usable timestamp (for example ones created by other
//! tools) fall back to the file modification time.

use crate::error::{Error, Result};
use crate::traits::{Clock, StateStore, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// State key constants shared between hooks.
pub mod keys {
    /// A question is waiting for the user's answer.
    pub const PENDING_QUESTION: &str = "pending_question";
    /// The number of files the current task was expected to touch.
    pub const INITIAL_SCOPE: &str = "initial_scope";
    /// Files edited since the scope was recorded.
    pub const SCOPE_FILES: &str = "scope_files";
    /// Agents dispatched in the current batch.
    pub const TASK_DISPATCH_BATCH: &str = "task_dispatch_batch";
}

/// A stored state record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedState {
    /// The state key (also the file name).
    pub key: String,
    /// When the state was written.
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub payload: Value,
}

impl NamedState {
    /// Create a state record.
    pub fn new(key: impl Into<String>, payload: Value, created_at: DateTime<Utc>) -> Self {
        Self { key: key.into(), created_at, payload }
    }

    /// Age of the state at `now`. Negative if written in the future.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }

    /// Whether `now - created_at <= ttl`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self.age(now).num_milliseconds() <= ttl_ms
    }

    /// Whole seconds of age, clamped at zero.
    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(self.age(now).num_seconds()).unwrap_or(0)
    }
}

/// Check that a key can be used as a file name in the state directory.
///
/// # Errors
///
/// Returns [`Error::InvalidStateKey`] for empty keys, `.`/`..`, keys with
/// path separators or control characters, keys starting with `.`, and the
/// name of the agent correlation file that shares the state directory.
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == crate::paths::CORRELATION_FILENAME
        || key.starts_with('.')
        || key.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(Error::InvalidStateKey(key.to_string()));
    }
    Ok(())
}

/// State store backed by one JSON file per key.
#[derive(Debug, Clone)]
pub struct FileStateStore<C = SystemClock> {
    dir: PathBuf,
    clock: C,
}

impl FileStateStore {
    /// Create a store in `dir` using the wall clock.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), clock: SystemClock }
    }
}

impl<C: Clock> FileStateStore<C> {
    /// Create a store in `dir` with an explicit clock.
    pub fn with_clock(dir: impl Into<PathBuf>, clock: C) -> Self {
        Self { dir: dir.into(), clock }
    }

    /// The state directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not a valid file name.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    /// Interpret file content that was not written by this store.
    fn parse_foreign(key: &str, content: &str, path: &Path) -> Result<NamedState> {
        let payload = serde_json::from_str(content).unwrap_or(Value::Null);
        let mtime = fs::metadata(path)?.modified()?;
        Ok(NamedState::new(key, payload, DateTime::<Utc>::from(mtime)))
    }
}

impl<C: Clock> StateStore for FileStateStore<C> {
    fn load(&self, key: &str) -> Result<Option<NamedState>> {
        let path = self.path_for(key)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<NamedState>(&content) {
            Ok(state) => Ok(Some(state)),
            Err(_) => Self::parse_foreign(key, &content, &path).map(Some),
        }
    }

    fn save(&self, state: &NamedState) -> Result<()> {
        let path = self.path_for(&state.key)?;
        fs::create_dir_all(&self.dir)?;

        // Write to a sibling file and rename so readers never see half a file
        let tmp = self.dir.join(format!(".{}.tmp", state.key));
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_key(&name).is_err() {
                continue;
            }
            keys.push(name);
        }
        keys.sort();
        Ok(keys)
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// A store that keeps nothing.
///
/// Used when the state directory cannot be resolved so that hooks still run
/// and fail open.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStateStore;

impl StateStore for NullStateStore {
    fn load(&self, _key: &str) -> Result<Option<NamedState>> {
        Ok(None)
    }

    fn save(&self, _state: &NamedState) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
