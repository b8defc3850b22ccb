//! Scope-growth detection.
//!
//! Every file-editing tool call adds its path to the `scope_files` state.
//! When the number of distinct files exceeds the recorded initial scope by
//! more than the configured ratio, the hook warns. It never blocks.

use crate::config::ProjectConfig;
use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::storage::keys;
use crate::templates;
use crate::traits::StateStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tera::Context;

/// Tools whose calls count as edits.
const EDIT_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

/// Paths shown in the warning.
const RECENT_FILES_SHOWN: usize = 5;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackedFiles {
    #[serde(default)]
    files: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct InitialScope {
    file_count: usize,
}

/// Where the current task stands against its recorded scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeStatus {
    /// Distinct files edited so far.
    pub files: Vec<String>,
    /// Recorded initial file count, if an unexpired one exists.
    pub initial: Option<usize>,
    /// The warning ratio in effect.
    pub threshold: f64,
}

impl ScopeStatus {
    /// Number of distinct files edited.
    #[must_use]
    pub fn current(&self) -> usize {
        self.files.len()
    }

    /// Current count as a ratio of the initial scope.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // File counts are tiny
    pub fn ratio(&self) -> Option<f64> {
        match self.initial {
            Some(initial) if initial > 0 => Some(self.current() as f64 / initial as f64),
            _ => None,
        }
    }

    /// Whether the edits have outgrown the recorded scope.
    #[must_use]
    pub fn exceeded(&self) -> bool {
        self.ratio().is_some_and(|ratio| ratio > self.threshold)
    }
}

/// Record the initial scope estimate for the current task.
///
/// Starts a fresh tracked-file set. Returns whether the state was persisted.
pub fn record_initial_scope(store: &dyn StateStore, file_count: usize) -> bool {
    store.clear(keys::SCOPE_FILES);
    store.write(keys::INITIAL_SCOPE, json!({ "file_count": file_count }))
}

fn tracked_files(store: &dyn StateStore, config: &ProjectConfig) -> TrackedFiles {
    store
        .read(keys::SCOPE_FILES, config.initial_scope_ttl())
        .and_then(|payload| serde_json::from_value(payload).ok())
        .unwrap_or_default()
}

/// Read the current scope from the store.
#[must_use]
pub fn scope_status(store: &dyn StateStore, config: &ProjectConfig) -> ScopeStatus {
    let initial = store
        .read(keys::INITIAL_SCOPE, config.initial_scope_ttl())
        .and_then(|payload| serde_json::from_value::<InitialScope>(payload).ok())
        .map(|scope| scope.file_count);

    ScopeStatus {
        files: tracked_files(store, config).files,
        initial,
        threshold: config.scope_growth_threshold,
    }
}

/// Run the scope-growth `PostToolUse` hook.
///
/// Warns only when the edit brought in a new file, so repeated edits to
/// files already counted stay quiet.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn run_scope_growth_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let hook = HookKind::ScopeGrowth.name();

    let Some(tool_name) = input.tool_name() else {
        return HookOutcome::Allow;
    };
    if !EDIT_TOOLS.contains(&tool_name) {
        return HookOutcome::Allow;
    }
    let Some(path) = input.tool_input.as_ref().and_then(|ti| ti.file_path()) else {
        return HookOutcome::Allow;
    };

    let mut tracked = tracked_files(env.store, env.config);
    if tracked.files.iter().any(|f| f == path) {
        return HookOutcome::Allow;
    }
    tracked.files.push(path.to_string());
    match serde_json::to_value(&tracked) {
        Ok(payload) => {
            if !env.store.write(keys::SCOPE_FILES, payload) {
                env.log.append(hook, "could not persist scope_files");
            }
        }
        Err(e) => env.log.append(hook, &format!("could not serialize scope_files: {e}")),
    }

    let status = scope_status(env.store, env.config);
    let (Some(initial), Some(ratio)) = (status.initial, status.ratio()) else {
        return HookOutcome::Allow;
    };
    if !status.exceeded() {
        return HookOutcome::Allow;
    }

    let current = status.current();
    let percent = (ratio * 100.0).round() as u64;
    let threshold_percent = (status.threshold * 100.0).round() as u64;
    let recent: Vec<&String> = status.files.iter().rev().take(RECENT_FILES_SHOWN).collect();

    let mut ctx = Context::new();
    ctx.insert("current", &current);
    ctx.insert("initial", &initial);
    ctx.insert("percent", &percent);
    ctx.insert("threshold_percent", &threshold_percent);
    ctx.insert("recent", &recent);
    let message = templates::render_or("messages/scope_growth_warning.tera", &ctx, || {
        format!("Warning: {current} files touched against an initial scope of {initial}.")
    });
    env.sink.emit(&message);
    env.log.append(hook, &format!("scope at {current}/{initial} files ({percent}%) after {path}"));

    HookOutcome::Allow
}
