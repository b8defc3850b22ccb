//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::cli::{Command, QuestionCommand, ScopeCommand, StateCommand};
use crate::config::{self, ProjectConfig};
use crate::hook_logging::HookLog;
use crate::hooks::{
    mark_pending_question, parse_hook_input, record_initial_scope, run_hook, run_post_tool_use,
    run_pre_tool_use, run_user_prompt_submit, scope_status, HookEnv, HookOutcome, PendingQuestion,
};
use crate::output::BufferSink;
use crate::paths;
use crate::storage::{keys, validate_key, FileStateStore, NamedState, NullStateStore};
use crate::templates;
use crate::traits::StateStore;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Run a CLI command against the current directory's project.
pub fn run(command: Command, stdin: &str) -> CliOutput {
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    run_in(command, stdin, &base_dir)
}

/// Run a CLI command against the project rooted at `base_dir`.
pub fn run_in(command: Command, stdin: &str, base_dir: &Path) -> CliOutput {
    let mut warnings = Vec::new();
    let config = load_config(base_dir, &mut warnings);

    let mut output = match command {
        Command::Version => run_version(),
        Command::EnsureConfig => run_ensure_config(base_dir),
        Command::State(cmd) => run_state_cmd(cmd, &config),
        Command::Question(cmd) => run_question_cmd(cmd, &config),
        Command::Scope(cmd) => run_scope_cmd(cmd, &config),
        hook => run_hook_cmd(&hook, stdin, base_dir, &config),
    };

    warnings.append(&mut output.stderr);
    output.stderr = warnings;
    output
}

/// Load the project config, falling back to defaults with a warning.
fn load_config(base_dir: &Path, warnings: &mut Vec<String>) -> ProjectConfig {
    match ProjectConfig::load_from(base_dir) {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            warnings.push(format!("Warning: Could not load config: {e}"));
            ProjectConfig::default()
        }
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    CliOutput {
        exit_code: ExitCode::SUCCESS,
        stdout: vec![],
        stderr: vec![format!("hookgate v{}", crate::VERSION)],
    }
}

fn run_ensure_config(base_dir: &Path) -> CliOutput {
    match config::ensure_config_in(base_dir) {
        Ok((config, created)) => {
            let verb = if created { "Created" } else { "Config ensured at" };
            let messages = vec![
                format!("{verb} {}", config::CONFIG_FILE_PATH),
                format!("  question_tool: {}", config.question_tool),
                format!("  pending_question_ttl_secs: {}", config.pending_question_ttl_secs),
                format!("  min_evidence_categories: {}", config.min_evidence_categories),
            ];
            CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![], stderr: messages }
        }
        Err(e) => error_output(format!("Error ensuring config: {e}")),
    }
}

// === Hook Commands ===

fn run_hook_cmd(
    command: &Command,
    stdin: &str,
    base_dir: &Path,
    config: &ProjectConfig,
) -> CliOutput {
    let Some(hook_type) = command.hook_type() else {
        return error_output(format!("Not a hook command: {command:?}"));
    };

    let log = HookLog::new(paths::log_dir(config.log_dir.as_deref()));
    if config.debug_logging {
        log.log_event(hook_type, stdin);
    }

    let mut stderr = Vec::new();
    let mut warn = |message: String| {
        log.append(hook_type, &message);
        stderr.push(format!("Warning: {message}"));
    };

    if let Err(e) = templates::init_templates(Some(&templates::override_dir(base_dir))) {
        warn(format!("template overrides ignored: {e}"));
    }

    // Malformed input carries no signal, so it allows
    let input = match parse_hook_input(stdin) {
        Ok(input) => input,
        Err(e) => {
            warn(format!("could not parse hook input: {e}"));
            return CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![], stderr };
        }
    };

    let state_dir = paths::state_dir(config.state_dir.as_deref());
    let file_store = FileStateStore::new(state_dir.clone());
    let correlation_file = paths::correlation_path(&state_dir);
    let usable = !state_dir.exists() || state_dir.is_dir();
    if !usable {
        warn(format!("state directory {} is not a directory, state disabled", state_dir.display()));
    }
    let store: &dyn StateStore = if usable { &file_store } else { &NullStateStore };

    let sink = BufferSink::new();
    let env = HookEnv {
        store,
        sink: &sink,
        config,
        log: &log,
        correlation_file: usable.then_some(correlation_file.as_path()),
    };

    let outcome = match command {
        Command::PreToolUse => run_pre_tool_use(&input, &env),
        Command::UserPromptSubmit => run_user_prompt_submit(&input, &env),
        Command::PostToolUse => run_post_tool_use(&input, &env),
        other => other.hook_kind().map_or(HookOutcome::Allow, |kind| run_hook(kind, &input, &env)),
    };

    stderr.extend(sink.take());
    CliOutput { exit_code: ExitCode::from(outcome.exit_code()), stdout: vec![], stderr }
}

// === State Commands ===

fn run_state_cmd(cmd: StateCommand, config: &ProjectConfig) -> CliOutput {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => return error_output(e),
    };

    match cmd {
        StateCommand::Write { key, payload } => state_write(&store, &key, payload),
        StateCommand::Check { key, ttl } => state_check(&store, &key, ttl),
        StateCommand::Read { key, ttl } => state_read(&store, &key, ttl),
        StateCommand::Clear { key } => state_clear(&store, &key),
        StateCommand::List => state_list(&store),
    }
}

fn state_write(store: &FileStateStore, key: &str, payload: Option<String>) -> CliOutput {
    let payload = payload.map_or(Value::Null, |text| {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    });
    let state = NamedState::new(key, payload, store.now());
    match store.save(&state) {
        Ok(()) => success_output(format!("Wrote state {key}")),
        Err(e) => error_output(format!("Error writing state {key}: {e}")),
    }
}

fn state_check(store: &FileStateStore, key: &str, ttl: u64) -> CliOutput {
    if let Err(e) = validate_key(key) {
        return error_output(e.to_string());
    }
    match store.active(key, Duration::from_secs(ttl)) {
        Some(state) => {
            success_output(format!("{key} is active ({}s old)", state.age_secs(store.now())))
        }
        None => CliOutput {
            exit_code: ExitCode::from(1),
            stdout: vec![format!("{key} is not set or has expired")],
            stderr: vec![],
        },
    }
}

fn state_read(store: &FileStateStore, key: &str, ttl: u64) -> CliOutput {
    if let Err(e) = validate_key(key) {
        return error_output(e.to_string());
    }
    match store.read(key, Duration::from_secs(ttl)) {
        Some(payload) => json_output(&payload),
        None => error_output(format!("No active state for {key}")),
    }
}

fn state_clear(store: &FileStateStore, key: &str) -> CliOutput {
    match store.remove(key) {
        Ok(()) => success_output(format!("Cleared state {key}")),
        Err(e) => error_output(format!("Error clearing state {key}: {e}")),
    }
}

fn state_list(store: &FileStateStore) -> CliOutput {
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(e) => return error_output(format!("Error listing states: {e}")),
    };
    if keys.is_empty() {
        return success_output("No states stored".to_string());
    }

    let now = store.now();
    let lines: Vec<String> = keys
        .iter()
        .map(|key| match store.load(key) {
            Ok(Some(state)) => format!("{key}  {}s old", state.age_secs(now)),
            _ => format!("{key}  (unreadable)"),
        })
        .collect();
    success_output(lines.join("\n"))
}

// === Question Commands ===

fn run_question_cmd(cmd: QuestionCommand, config: &ProjectConfig) -> CliOutput {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => return error_output(e),
    };

    match cmd {
        QuestionCommand::Mark { question, options } => {
            if !mark_pending_question(&store, &question, &options) {
                return error_output(format!(
                    "Error recording pending question in {}",
                    store.dir().display()
                ));
            }
            success_output(format!(
                "Pending question recorded. Tools other than {} are blocked for up to {}s.",
                config.question_tool, config.pending_question_ttl_secs
            ))
        }
        QuestionCommand::Status => question_status(&store, config),
        QuestionCommand::Clear => match store.remove(keys::PENDING_QUESTION) {
            Ok(()) => success_output("Pending question cleared".to_string()),
            Err(e) => error_output(format!("Error clearing pending question: {e}")),
        },
    }
}

fn question_status(store: &FileStateStore, config: &ProjectConfig) -> CliOutput {
    let ttl = config.pending_question_ttl();
    let Some(state) = store.active(keys::PENDING_QUESTION, ttl) else {
        return success_output("No pending question".to_string());
    };

    let pending: PendingQuestion = serde_json::from_value(state.payload.clone()).unwrap_or_default();
    let age = state.age_secs(store.now());
    let mut lines = vec![
        format!("Pending question: {}", pending.question),
        format!("Asked {age}s ago, stops blocking in {}s", ttl.as_secs().saturating_sub(age)),
    ];
    lines.extend(pending.options.iter().map(|o| format!("  - {o}")));
    success_output(lines.join("\n"))
}

// === Scope Commands ===

fn run_scope_cmd(cmd: ScopeCommand, config: &ProjectConfig) -> CliOutput {
    let store = match open_store(config) {
        Ok(s) => s,
        Err(e) => return error_output(e),
    };

    match cmd {
        ScopeCommand::Init { file_count } => {
            if !record_initial_scope(&store, file_count) {
                return error_output(format!(
                    "Error recording initial scope in {}",
                    store.dir().display()
                ));
            }
            success_output(format!(
                "Initial scope recorded: {file_count} files (warning above {}%)",
                percent(config.scope_growth_threshold)
            ))
        }
        ScopeCommand::Status => {
            let status = scope_status(&store, config);
            let mut lines = vec![format!("Files touched: {}", status.current())];
            match (status.initial, status.ratio()) {
                (Some(initial), Some(ratio)) => lines.push(format!(
                    "Initial scope: {initial} files ({}% of scope, warning above {}%)",
                    percent(ratio),
                    percent(status.threshold)
                )),
                (Some(initial), None) => lines.push(format!("Initial scope: {initial} files")),
                (None, _) => lines.push("Initial scope: not recorded".to_string()),
            }
            lines.extend(status.files.iter().map(|f| format!("  - {f}")));
            success_output(lines.join("\n"))
        }
    }
}

// === Helper Functions ===

fn open_store(config: &ProjectConfig) -> Result<FileStateStore, String> {
    let dir = paths::state_dir(config.state_dir.as_deref());
    if dir.exists() && !dir.is_dir() {
        return Err(format!("State directory {} is not a directory", dir.display()));
    }
    Ok(FileStateStore::new(dir))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(ratio: f64) -> u64 {
    (ratio * 100.0).round() as u64
}

fn json_output(value: &Value) -> CliOutput {
    match serde_json::to_string_pretty(value) {
        Ok(json) => CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![json], stderr: vec![] },
        Err(e) => error_output(e.to_string()),
    }
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}
