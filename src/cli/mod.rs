//! Command-line interface for hookgate.
//!
//! Hook commands read one JSON event from stdin and exit 0 (allow) or 1
//! (block). The `state`, `question` and `scope` groups inspect and seed the
//! state the hooks share.

mod question;
mod run;
mod scope;
mod state;

#[cfg(test)]
mod tests;

pub use question::QuestionCommand;
pub use run::{run, run_in, CliOutput};
pub use scope::ScopeCommand;
pub use state::StateCommand;

use crate::hooks::HookKind;
use clap::{Parser, Subcommand};

/// Guard hooks for agentic coding sessions.
///
/// Wire the hook commands into the host's hook configuration, for example
/// `hookgate pre-tool-use` for `PreToolUse` events.
#[derive(Parser, Debug)]
#[command(name = "hookgate")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Inspect or edit named hook state.
    #[command(subcommand)]
    State(StateCommand),

    /// Mark, inspect or clear the pending question.
    ///
    /// While a question is pending, every tool except the question tool is
    /// blocked by the pre-tool-use hook.
    #[command(subcommand)]
    Question(QuestionCommand),

    /// Record or inspect the expected scope of the current task.
    #[command(subcommand)]
    Scope(ScopeCommand),

    // === Utility Commands ===
    /// Show version information.
    Version,

    /// Ensure config file exists (create with defaults if not).
    #[command(name = "ensure-config")]
    EnsureConfig,

    // === Event Dispatchers (receive JSON from stdin) ===
    /// Run every `PreToolUse` hook (stdin: JSON hook input).
    #[command(name = "pre-tool-use", hide = true)]
    PreToolUse,

    /// Run every `UserPromptSubmit` hook (stdin: JSON hook input).
    #[command(name = "user-prompt-submit", hide = true)]
    UserPromptSubmit,

    /// Run every `PostToolUse` hook (stdin: JSON hook input).
    #[command(name = "post-tool-use", hide = true)]
    PostToolUse,

    // === Individual Hooks (receive JSON from stdin) ===
    /// Block tools while a question is pending.
    #[command(name = "pending-question", hide = true)]
    PendingQuestion,

    /// Block completion claims that lack verification evidence.
    #[command(name = "verify-claims", hide = true)]
    VerifyClaims,

    /// Suggest semantic code search for exploration prompts.
    #[command(name = "suggest-semantic-search", hide = true)]
    SuggestSemanticSearch,

    /// Suggest code mode for multi-service prompts.
    #[command(name = "suggest-code-mode", hide = true)]
    SuggestCodeMode,

    /// List workflow hints for MCP-backed services.
    #[command(name = "detect-mcp-workflow", hide = true)]
    DetectMcpWorkflow,

    /// Warn when edits outgrow the recorded scope.
    #[command(name = "scope-growth", hide = true)]
    ScopeGrowth,

    /// Remind about cache-busting and CDN versions.
    #[command(name = "cdn-version", hide = true)]
    CdnVersion,

    /// Announce sub-agent dispatches.
    #[command(name = "announce-task", hide = true)]
    AnnounceTask,

    /// Record sub-agent completion.
    #[command(name = "task-complete", hide = true)]
    TaskComplete,
}

impl Command {
    /// Returns true if this command requires stdin input.
    #[must_use]
    pub const fn needs_stdin(&self) -> bool {
        self.is_hook()
    }

    /// Returns true if this is a hook command (invoked by the host).
    #[must_use]
    pub const fn is_hook(&self) -> bool {
        self.hook_type().is_some()
    }

    /// Returns the hook name for logging, or None for non-hook commands.
    #[must_use]
    pub const fn hook_type(&self) -> Option<&'static str> {
        match self {
            Self::PreToolUse => Some("pre-tool-use"),
            Self::UserPromptSubmit => Some("user-prompt-submit"),
            Self::PostToolUse => Some("post-tool-use"),
            _ => match self.hook_kind() {
                Some(kind) => Some(kind.name()),
                None => None,
            },
        }
    }

    /// The single hook this command runs, if it is not a dispatcher.
    #[must_use]
    pub const fn hook_kind(&self) -> Option<HookKind> {
        match self {
            Self::PendingQuestion => Some(HookKind::PendingQuestion),
            Self::VerifyClaims => Some(HookKind::VerifyClaims),
            Self::SuggestSemanticSearch => Some(HookKind::SemanticSearch),
            Self::SuggestCodeMode => Some(HookKind::CodeMode),
            Self::DetectMcpWorkflow => Some(HookKind::McpWorkflow),
            Self::ScopeGrowth => Some(HookKind::ScopeGrowth),
            Self::CdnVersion => Some(HookKind::CdnVersion),
            Self::AnnounceTask => Some(HookKind::AnnounceTask),
            Self::TaskComplete => Some(HookKind::TaskComplete),
            _ => None,
        }
    }
}
