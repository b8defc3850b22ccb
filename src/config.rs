//! Configuration management for hookgate.
//!
//! This module handles the `.claude/hookgate.yaml` file which stores
//! project-specific tuning for the hooks. The TTLs and thresholds are
//! untuned defaults, so every one of them is configurable.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file path relative to project root.
pub const CONFIG_FILE_PATH: &str = ".claude/hookgate.yaml";

/// Name of the tool that answers a pending question.
pub const DEFAULT_QUESTION_TOOL: &str = "AskUserQuestion";

const fn default_pending_question_ttl_secs() -> u64 {
    300
}

const fn default_initial_scope_ttl_secs() -> u64 {
    7200
}

const fn default_scope_growth_threshold() -> f64 {
    1.5
}

const fn default_min_evidence_categories() -> usize {
    2
}

const fn default_dispatch_batch_window_secs() -> u64 {
    30
}

const fn default_verbose_dispatch_threshold() -> usize {
    3
}

fn default_question_tool() -> String {
    DEFAULT_QUESTION_TOOL.to_string()
}

/// Project configuration for the hooks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    /// Directory for state files. None means the environment or temp default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// Directory for hook logs. None means the environment or home default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// The tool whose invocation answers a pending question.
    #[serde(default = "default_question_tool")]
    pub question_tool: String,

    /// How long a pending question blocks other tools.
    #[serde(default = "default_pending_question_ttl_secs")]
    pub pending_question_ttl_secs: u64,

    /// How long a recorded initial scope stays valid.
    #[serde(default = "default_initial_scope_ttl_secs")]
    pub initial_scope_ttl_secs: u64,

    /// Growth ratio above which the scope hook warns (1.5 = 150%).
    #[serde(default = "default_scope_growth_threshold")]
    pub scope_growth_threshold: f64,

    /// Distinct evidence categories a completion claim needs.
    #[serde(default = "default_min_evidence_categories")]
    pub min_evidence_categories: usize,

    /// Window in which task dispatches count as one concurrent batch.
    #[serde(default = "default_dispatch_batch_window_secs")]
    pub dispatch_batch_window_secs: u64,

    /// Batch size at which the dispatch summary switches to the verbose block.
    #[serde(default = "default_verbose_dispatch_threshold")]
    pub verbose_dispatch_threshold: usize,

    /// Hooks that should allow without evaluating.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_hooks: Vec<String>,

    /// Append every raw hook event to `hook-events.jsonl`.
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            log_dir: None,
            question_tool: default_question_tool(),
            pending_question_ttl_secs: default_pending_question_ttl_secs(),
            initial_scope_ttl_secs: default_initial_scope_ttl_secs(),
            scope_growth_threshold: default_scope_growth_threshold(),
            min_evidence_categories: default_min_evidence_categories(),
            dispatch_batch_window_secs: default_dispatch_batch_window_secs(),
            verbose_dispatch_threshold: default_verbose_dispatch_threshold(),
            disabled_hooks: Vec::new(),
            debug_logging: false,
        }
    }
}

impl ProjectConfig {
    /// Load config from a specific base directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or holds
    /// values no hook can work with.
    pub fn load_from(base_dir: &Path) -> Result<Option<Self>> {
        let config_path = Self::config_path(base_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Some(Self::default()));
        }
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Save config to a specific base directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, base_dir: &Path) -> Result<()> {
        let config_path = Self::config_path(base_dir);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Get the config file path for a base directory.
    #[must_use]
    pub fn config_path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE_PATH)
    }

    fn validate(&self) -> Result<()> {
        if !self.scope_growth_threshold.is_finite() || self.scope_growth_threshold <= 0.0 {
            return Err(Error::Config(format!(
                "scope_growth_threshold must be a positive number, got {}",
                self.scope_growth_threshold
            )));
        }
        if self.question_tool.trim().is_empty() {
            return Err(Error::Config("question_tool must not be empty".to_string()));
        }
        Ok(())
    }

    /// TTL of the `pending_question` state.
    #[must_use]
    pub const fn pending_question_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_question_ttl_secs)
    }

    /// TTL of the `initial_scope` state.
    #[must_use]
    pub const fn initial_scope_ttl(&self) -> Duration {
        Duration::from_secs(self.initial_scope_ttl_secs)
    }

    /// Window of the task dispatch batch.
    #[must_use]
    pub const fn dispatch_batch_window(&self) -> Duration {
        Duration::from_secs(self.dispatch_batch_window_secs)
    }

    /// Whether the named hook should run.
    #[must_use]
    pub fn is_hook_enabled(&self, hook_name: &str) -> bool {
        !self.disabled_hooks.iter().any(|h| h == hook_name)
    }
}

/// Ensure config exists in a specific directory, creating defaults if not.
///
/// Returns the config and whether it was newly created.
///
/// # Errors
///
/// Returns an error if an existing config cannot be parsed or a new one
/// cannot be written.
pub fn ensure_config_in(base_dir: &Path) -> Result<(ProjectConfig, bool)> {
    if let Some(config) = ProjectConfig::load_from(base_dir)? {
        return Ok((config, false));
    }

    let config = ProjectConfig::default();
    config.save_to(base_dir)?;
    Ok((config, true))
}
