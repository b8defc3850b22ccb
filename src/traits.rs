//! Core traits for testability and abstraction.

use crate::error::Result;
use crate::storage::NamedState;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

/// Source of the current time.
///
/// State expiry is computed against this clock rather than ambient file
/// metadata so that expiry can be tested with a fixed clock.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Trait for named, expiring hook state.
///
/// Implementors provide raw load/save/remove. The accessor methods built on
/// top of them (`write`, `exists_unexpired`, `read`, `clear`) never fail:
/// state is advisory, so every I/O problem degrades to "nothing stored".
pub trait StateStore {
    /// Load a state regardless of its age.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the state cannot be read.
    fn load(&self, key: &str) -> Result<Option<NamedState>>;

    /// Persist a state, replacing any previous state with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the state cannot be written.
    fn save(&self, state: &NamedState) -> Result<()>;

    /// Remove a state. Removing a missing state is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or removal fails.
    fn remove(&self, key: &str) -> Result<()>;

    /// List the keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be enumerated.
    fn keys(&self) -> Result<Vec<String>>;

    /// The clock used for timestamps and expiry.
    fn now(&self) -> DateTime<Utc>;

    /// Store `payload` under `key`, stamped with the current time.
    ///
    /// Returns whether the state was persisted.
    fn write(&self, key: &str, payload: Value) -> bool {
        let state = NamedState::new(key, payload, self.now());
        self.save(&state).is_ok()
    }

    /// Load a state only if it is younger than `ttl`.
    fn active(&self, key: &str, ttl: Duration) -> Option<NamedState> {
        let state = self.load(key).ok().flatten()?;
        state.is_active(self.now(), ttl).then_some(state)
    }

    /// Check whether an unexpired state exists for `key`.
    fn exists_unexpired(&self, key: &str, ttl: Duration) -> bool {
        self.active(key, ttl).is_some()
    }

    /// Read the payload of an unexpired state.
    fn read(&self, key: &str, ttl: Duration) -> Option<Value> {
        self.active(key, ttl).map(|state| state.payload)
    }

    /// Delete the state for `key`.
    ///
    /// Returns whether the removal succeeded (a missing state counts).
    fn clear(&self, key: &str) -> bool {
        self.remove(key).is_ok()
    }
}

/// Destination for the human-readable text a hook produces.
pub trait OutputSink {
    /// Emit one message block.
    fn emit(&self, message: &str);
}
