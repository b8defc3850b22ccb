//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::Result;
use crate::storage::{validate_key, NamedState};
use crate::traits::{Clock, StateStore};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can keep a handle and advance
/// the clock a store owns.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl Default for FixedClock {
    fn default() -> Self {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().unwrap_or_else(Utc::now);
        Self::at(start)
    }
}

impl FixedClock {
    /// A clock frozen at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Rc::new(Cell::new(now)) }
    }

    /// Move the clock forward.
    pub fn advance_secs(&self, secs: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(secs));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// An in-memory state store driven by a [`FixedClock`].
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    states: RefCell<BTreeMap<String, NamedState>>,
    clock: FixedClock,
    fail_writes: Cell<bool>,
}

impl MemoryStateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the store's clock.
    #[must_use]
    pub fn clock(&self) -> FixedClock {
        self.clock.clone()
    }

    /// Make every subsequent save fail, as an unwritable directory would.
    pub fn fail_writes(&self) {
        self.fail_writes.set(true);
    }

    /// Insert a state with an explicit age in seconds.
    pub fn insert_aged(&self, key: &str, payload: serde_json::Value, age_secs: i64) {
        let created = self.clock.now() - chrono::Duration::seconds(age_secs);
        self.states.borrow_mut().insert(key.to_string(), NamedState::new(key, payload, created));
    }

    /// Whether any state, expired or not, is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.states.borrow().contains_key(key)
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self, key: &str) -> Result<Option<NamedState>> {
        validate_key(key)?;
        Ok(self.states.borrow().get(key).cloned())
    }

    fn save(&self, state: &NamedState) -> Result<()> {
        validate_key(&state.key)?;
        if self.fail_writes.get() {
            return Err(std::io::Error::other("read-only state store").into());
        }
        self.states.borrow_mut().insert(state.key.clone(), state.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.states.borrow_mut().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.states.borrow().keys().cloned().collect())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
