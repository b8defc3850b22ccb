//! Tests for the CLI module.

use super::*;
use crate::config::{ProjectConfig, CONFIG_FILE_PATH};
use crate::hook_logging::HOOK_EVENTS_FILE;
use crate::paths::CORRELATION_FILENAME;
use serial_test::serial;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

/// A project directory whose config keeps state and logs inside it.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self::with_config(|_| {})
    }

    fn with_config(edit: impl FnOnce(&mut ProjectConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = ProjectConfig {
            state_dir: Some(dir.path().join("state")),
            log_dir: Some(dir.path().join("logs")),
            ..Default::default()
        };
        edit(&mut config);
        config.save_to(dir.path()).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    fn log_dir(&self) -> PathBuf {
        self.path().join("logs")
    }

    fn run(&self, command: Command, stdin: &str) -> CliOutput {
        run_in(command, stdin, self.path())
    }

    fn hook(&self, command: Command, event: &serde_json::Value) -> CliOutput {
        self.run(command, &event.to_string())
    }
}

fn tool(name: &str, tool_input: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({"hook_event_name": "PreToolUse", "tool_name": name, "tool_input": tool_input})
}

/// Points an environment variable at a directory until dropped.
struct EnvGuard {
    var: &'static str,
    original: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(var: &'static str, value: &Path) -> Self {
        let original = std::env::var_os(var);
        std::env::set_var(var, value);
        Self { var, original }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match &self.original {
            Some(value) => std::env::set_var(self.var, value),
            None => std::env::remove_var(self.var),
        }
    }
}

fn prompt(text: &str) -> serde_json::Value {
    serde_json::json!({"hook_event_name": "UserPromptSubmit", "prompt": text})
}

#[test]
fn test_command_needs_stdin() {
    assert!(!Command::Version.needs_stdin());
    assert!(!Command::EnsureConfig.needs_stdin());
    assert!(!Command::State(StateCommand::List).needs_stdin());
    assert!(!Command::Question(QuestionCommand::Status).needs_stdin());

    assert!(Command::PreToolUse.needs_stdin());
    assert!(Command::PostToolUse.needs_stdin());
    assert!(Command::UserPromptSubmit.needs_stdin());
    assert!(Command::VerifyClaims.needs_stdin());
}

#[test]
fn test_command_hook_type() {
    assert_eq!(Command::PreToolUse.hook_type(), Some("pre-tool-use"));
    assert_eq!(Command::UserPromptSubmit.hook_type(), Some("user-prompt-submit"));
    assert_eq!(Command::PendingQuestion.hook_type(), Some("pending-question"));
    assert_eq!(Command::SuggestSemanticSearch.hook_type(), Some("suggest-semantic-search"));
    assert_eq!(Command::TaskComplete.hook_type(), Some("task-complete"));
    assert_eq!(Command::Version.hook_type(), None);
    assert_eq!(Command::Scope(ScopeCommand::Status).hook_type(), None);
}

#[test]
fn test_cli_parses_subcommands() {
    use clap::Parser;

    let cli = Cli::try_parse_from(["hookgate", "question", "mark", "Which DB?", "-o", "pg", "-o", "sqlite"])
        .unwrap();
    match cli.command {
        Command::Question(QuestionCommand::Mark { question, options }) => {
            assert_eq!(question, "Which DB?");
            assert_eq!(options, vec!["pg", "sqlite"]);
        }
        other => panic!("unexpected command {other:?}"),
    }

    let cli = Cli::try_parse_from(["hookgate", "state", "check", "k", "--ttl", "60"]).unwrap();
    assert!(matches!(cli.command, Command::State(StateCommand::Check { ttl: 60, .. })));

    let cli = Cli::try_parse_from(["hookgate", "verify-claims"]).unwrap();
    assert!(matches!(cli.command, Command::VerifyClaims));
}

#[test]
#[serial]
fn test_run_version() {
    let project = Project::new();
    let output = project.run(Command::Version, "");
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr[0].contains("hookgate v"));
}

#[test]
#[serial]
fn test_run_ensure_config() {
    let dir = TempDir::new().unwrap();

    let output = run_in(Command::EnsureConfig, "", dir.path());
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr[0].starts_with("Created"));
    assert!(dir.path().join(CONFIG_FILE_PATH).exists());

    let output = run_in(Command::EnsureConfig, "", dir.path());
    assert!(output.stderr[0].starts_with("Config ensured at"));
}

#[test]
#[serial]
fn test_pending_question_blocks_until_asked() {
    let project = Project::new();
    let mark = project.run(
        Command::Question(QuestionCommand::Mark { question: "Which DB?".into(), options: vec![] }),
        "",
    );
    assert_eq!(mark.exit_code, ExitCode::SUCCESS);

    let blocked = project.hook(Command::PreToolUse, &tool("Bash", &serde_json::json!({"command": "ls"})));
    assert_eq!(blocked.exit_code, ExitCode::from(1));
    assert!(blocked.stderr.join("\n").contains("Which DB?"));

    let asked = project.hook(Command::PreToolUse, &tool("AskUserQuestion", &serde_json::json!({})));
    assert_eq!(asked.exit_code, ExitCode::SUCCESS);

    let status = project.run(Command::Question(QuestionCommand::Status), "");
    assert_eq!(status.stdout, vec!["No pending question"]);

    let allowed = project.hook(Command::PreToolUse, &tool("Bash", &serde_json::json!({"command": "ls"})));
    assert_eq!(allowed.exit_code, ExitCode::SUCCESS);
}

#[test]
#[serial]
fn test_question_status_and_clear() {
    let project = Project::new();
    project.run(
        Command::Question(QuestionCommand::Mark {
            question: "Ship it?".into(),
            options: vec!["yes".into(), "no".into()],
        }),
        "",
    );

    let status = project.run(Command::Question(QuestionCommand::Status), "");
    let text = status.stdout.join("\n");
    assert!(text.contains("Pending question: Ship it?"));
    assert!(text.contains("  - no"));

    let cleared = project.run(Command::Question(QuestionCommand::Clear), "");
    assert_eq!(cleared.exit_code, ExitCode::SUCCESS);
    assert!(!project.state_dir().join("pending_question").exists());
}

#[test]
#[serial]
fn test_invalid_json_allows_with_warning() {
    let project = Project::new();
    let output = project.run(Command::PreToolUse, "not json");

    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr[0].contains("could not parse hook input"));
    let log = std::fs::read_to_string(project.log_dir().join("pre-tool-use.log")).unwrap();
    assert!(log.contains("could not parse hook input"));
}

#[test]
#[serial]
fn test_empty_stdin_allows() {
    let project = Project::new();
    let output = project.run(Command::PostToolUse, "");
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr.is_empty());
}

#[test]
#[serial]
fn test_unverified_claim_is_blocked() {
    let project = Project::new();

    let output = project.hook(Command::UserPromptSubmit, &prompt("It's done"));
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr.join("\n").contains("Completion Claim Needs Evidence"));

    let output = project.hook(
        Command::VerifyClaims,
        &prompt("It's done: tested in Safari, console clear, at 390px"),
    );
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
}

#[test]
#[serial]
fn test_disabled_hook_is_skipped() {
    let project = Project::with_config(|c| c.disabled_hooks = vec!["verify-claims".to_string()]);
    let output = project.hook(Command::VerifyClaims, &prompt("It's done"));
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr.is_empty());
}

#[test]
#[serial]
fn test_broken_config_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
    std::fs::write(dir.path().join(CONFIG_FILE_PATH), "min_evidence_categories: [oops").unwrap();
    let _logs = EnvGuard::set(crate::paths::LOG_DIR_ENV, &dir.path().join("logs"));
    let _state = EnvGuard::set(crate::paths::STATE_DIR_ENV, &dir.path().join("state"));

    let output = run_in(Command::SuggestSemanticSearch, &prompt("where is main?").to_string(), dir.path());
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stderr[0].starts_with("Warning: Could not load config"));
    assert!(output.stderr.iter().any(|m| m.contains("semantic code search")));
}

#[test]
#[serial]
fn test_state_round_trip() {
    let project = Project::new();
    let write = |payload: &str| {
        project.run(
            Command::State(StateCommand::Write { key: "build".into(), payload: Some(payload.into()) }),
            "",
        )
    };

    assert_eq!(write(r#"{"ok": true}"#).exit_code, ExitCode::SUCCESS);

    let read = project.run(Command::State(StateCommand::Read { key: "build".into(), ttl: 60 }), "");
    assert_eq!(read.exit_code, ExitCode::SUCCESS);
    let payload: serde_json::Value = serde_json::from_str(&read.stdout[0]).unwrap();
    assert_eq!(payload, serde_json::json!({"ok": true}));

    let check = project.run(Command::State(StateCommand::Check { key: "build".into(), ttl: 60 }), "");
    assert_eq!(check.exit_code, ExitCode::SUCCESS);

    let list = project.run(Command::State(StateCommand::List), "");
    assert!(list.stdout[0].starts_with("build  "));

    let clear = project.run(Command::State(StateCommand::Clear { key: "build".into() }), "");
    assert_eq!(clear.exit_code, ExitCode::SUCCESS);

    let check = project.run(Command::State(StateCommand::Check { key: "build".into(), ttl: 60 }), "");
    assert_eq!(check.exit_code, ExitCode::from(1));
    let read = project.run(Command::State(StateCommand::Read { key: "build".into(), ttl: 60 }), "");
    assert_eq!(read.exit_code, ExitCode::from(1));
}

#[test]
#[serial]
fn test_state_write_plain_text_payload() {
    let project = Project::new();
    project.run(
        Command::State(StateCommand::Write { key: "note".into(), payload: Some("not json".into()) }),
        "",
    );
    let read = project.run(Command::State(StateCommand::Read { key: "note".into(), ttl: 60 }), "");
    assert_eq!(read.stdout, vec!["\"not json\""]);
}

#[test]
#[serial]
fn test_state_rejects_path_keys() {
    let project = Project::new();
    for cmd in [
        StateCommand::Write { key: "../escape".into(), payload: None },
        StateCommand::Read { key: "a/b".into(), ttl: 60 },
        StateCommand::Check { key: String::new(), ttl: 60 },
        StateCommand::Clear { key: "..".into() },
    ] {
        let output = project.run(Command::State(cmd), "");
        assert_eq!(output.exit_code, ExitCode::from(1));
    }
    assert!(!project.path().join("escape").exists());
}

#[test]
#[serial]
fn test_state_list_empty() {
    let project = Project::new();
    let list = project.run(Command::State(StateCommand::List), "");
    assert_eq!(list.stdout, vec!["No states stored"]);
}

#[test]
#[serial]
fn test_scope_growth_through_cli() {
    let project = Project::new();
    let init = project.run(Command::Scope(ScopeCommand::Init { file_count: 2 }), "");
    assert_eq!(init.stdout, vec!["Initial scope recorded: 2 files (warning above 150%)"]);

    let mut last = None;
    for file in ["a.rs", "b.rs", "c.rs", "d.rs"] {
        last = Some(project.hook(
            Command::PostToolUse,
            &tool("Edit", &serde_json::json!({"file_path": file, "new_string": "x"})),
        ));
    }
    let last = last.unwrap();
    assert_eq!(last.exit_code, ExitCode::SUCCESS);
    assert!(last.stderr.join("\n").contains("Warning: scope growth"));

    let status = project.run(Command::Scope(ScopeCommand::Status), "");
    let text = status.stdout.join("\n");
    assert!(text.contains("Files touched: 4"));
    assert!(text.contains("Initial scope: 2 files (200% of scope, warning above 150%)"));
}

#[test]
#[serial]
fn test_scope_status_without_init() {
    let project = Project::new();
    let status = project.run(Command::Scope(ScopeCommand::Status), "");
    assert_eq!(status.stdout, vec!["Files touched: 0\nInitial scope: not recorded"]);
}

#[test]
#[serial]
fn test_task_dispatch_and_completion_correlate() {
    let project = Project::new();
    let task = tool("Task", &serde_json::json!({"description": "Audit styles", "prompt": "go"}));

    let dispatched = project.hook(Command::PreToolUse, &task);
    assert_eq!(dispatched.exit_code, ExitCode::SUCCESS);
    let announcement = dispatched.stderr.join("\n");
    assert!(announcement.starts_with("Dispatching agent agent-audit-styles-"));

    let correlation = std::fs::read_to_string(project.state_dir().join(CORRELATION_FILENAME)).unwrap();
    let agent_id = correlation.trim().split_once('|').unwrap().1.to_string();

    let completed = project.hook(Command::PostToolUse, &task);
    assert_eq!(completed.stderr, vec![format!("Agent {agent_id} finished: Audit styles")]);
}

#[test]
#[serial]
fn test_debug_logging_records_events() {
    let project = Project::with_config(|c| c.debug_logging = true);
    let event = prompt("hello");
    project.hook(Command::UserPromptSubmit, &event);

    let events = std::fs::read_to_string(project.log_dir().join(HOOK_EVENTS_FILE)).unwrap();
    let entry: serde_json::Value = serde_json::from_str(events.lines().next().unwrap()).unwrap();
    assert_eq!(entry["hook_type"], "user-prompt-submit");
    assert_eq!(entry["input"]["prompt"], "hello");
}

#[test]
#[serial]
fn test_performance_log_written() {
    let project = Project::new();
    project.hook(Command::CdnVersion, &tool("Write", &serde_json::json!({"file_path": "a.css"})));

    let perf = std::fs::read_to_string(project.log_dir().join("performance.log")).unwrap();
    assert!(perf.starts_with("cdn-version "));
    assert!(perf.trim_end().ends_with(" allow"));
}

#[test]
#[serial]
fn test_unusable_state_dir_fails_open() {
    let project = Project::new();
    std::fs::write(project.state_dir(), "not a directory").unwrap();

    let hook = project.hook(Command::PreToolUse, &tool("Bash", &serde_json::json!({"command": "ls"})));
    assert_eq!(hook.exit_code, ExitCode::SUCCESS);
    assert!(hook.stderr[0].contains("state disabled"));

    let state = project.run(Command::State(StateCommand::List), "");
    assert_eq!(state.exit_code, ExitCode::from(1));
}
