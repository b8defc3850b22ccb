//! Path utilities for determining where hook state and logs live.
//!
//! State files live in a temporary directory (`$TMPDIR/hookgate-state`) so
//! that they disappear with the machine's temp cleanup. Logs live under
//! `~/.hookgate/logs`. Both can be overridden through environment variables
//! or the project config.

use std::path::{Path, PathBuf};

/// The base directory name for hookgate data in the home directory.
const DATA_DIR_NAME: &str = ".hookgate";

/// Directory name for state files inside the temp directory.
const STATE_DIR_NAME: &str = "hookgate-state";

/// Fallback log directory name inside the temp directory.
const TEMP_LOG_DIR_NAME: &str = "hookgate-logs";

/// Environment variable overriding the state directory.
pub const STATE_DIR_ENV: &str = "HOOKGATE_STATE_DIR";

/// Environment variable overriding the log directory.
pub const LOG_DIR_ENV: &str = "HOOKGATE_LOG_DIR";

/// File name of the agent correlation file inside the state directory.
pub const CORRELATION_FILENAME: &str = "agent-correlation";

/// Get the base data directory for hookgate.
///
/// Returns `~/.hookgate/` or `None` if the home directory cannot be
/// determined.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// Resolve the state directory.
///
/// Precedence: `HOOKGATE_STATE_DIR`, then the configured directory, then
/// `$TMPDIR/hookgate-state`.
#[must_use]
pub fn state_dir(configured: Option<&Path>) -> PathBuf {
    env_dir(STATE_DIR_ENV)
        .or_else(|| configured.map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::temp_dir().join(STATE_DIR_NAME))
}

/// Resolve the log directory.
///
/// Precedence: `HOOKGATE_LOG_DIR`, then the configured directory, then
/// `~/.hookgate/logs`, then `$TMPDIR/hookgate-logs` when there is no home.
#[must_use]
pub fn log_dir(configured: Option<&Path>) -> PathBuf {
    env_dir(LOG_DIR_ENV)
        .or_else(|| configured.map(Path::to_path_buf))
        .or_else(|| data_dir().map(|d| d.join("logs")))
        .unwrap_or_else(|| std::env::temp_dir().join(TEMP_LOG_DIR_NAME))
}

/// Path of the agent correlation file for a state directory.
#[must_use]
pub fn correlation_path(state_dir: &Path) -> PathBuf {
    state_dir.join(CORRELATION_FILENAME)
}

fn env_dir(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}
