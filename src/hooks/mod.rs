//! Hook implementations.
//!
//! Every hook takes the parsed event plus a [`HookEnv`] holding its
//! collaborators (state store, output sink, config, log) and returns a
//! [`HookOutcome`]. Hooks never fail: anything unexpected allows.

mod cdn_version;
mod code_mode;
mod dispatch;
mod mcp_workflow;
mod pending_question;
mod scope_growth;
mod semantic_search;
mod task_dispatch;
mod verification;

pub use cdn_version::{find_cdn_urls, run_cdn_version_hook};
pub use code_mode::run_code_mode_hook;
pub use dispatch::{run_hook, run_post_tool_use, run_pre_tool_use, run_user_prompt_submit};
pub use mcp_workflow::{detect_services, run_mcp_workflow_hook, McpService};
pub use pending_question::{mark_pending_question, run_pending_question_gate, PendingQuestion};
pub use scope_growth::{record_initial_scope, run_scope_growth_hook, scope_status, ScopeStatus};
pub use semantic_search::run_semantic_search_hook;
pub use task_dispatch::{
    lookup_agent_id, run_task_complete_hook, run_task_dispatch_hook, AgentDescriptor,
};
pub use verification::{find_completion_claim, find_evidence, run_verification_gate, Evidence};

use crate::config::ProjectConfig;
use crate::error::Result;
use crate::hook_logging::HookLog;
use crate::traits::{OutputSink, StateStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::path::Path;

/// Input provided to hooks by the host on stdin.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HookInput {
    /// Host session identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub session_id: Option<String>,
    /// The host event that triggered this hook.
    #[serde(default, deserialize_with = "lenient")]
    pub hook_event_name: Option<String>,
    /// Working directory of the host session.
    #[serde(default, deserialize_with = "lenient")]
    pub cwd: Option<String>,
    /// The tool being called (tool-use hooks).
    #[serde(default)]
    pub tool_name: Option<String>,
    /// The tool parameters (tool-use hooks).
    #[serde(default, deserialize_with = "lenient")]
    pub tool_input: Option<ToolInput>,
    /// The tool result (post-tool-use hooks).
    #[serde(default)]
    pub tool_response: Option<Value>,
    /// The submitted prompt (prompt-submit hooks).
    #[serde(default, deserialize_with = "lenient")]
    pub prompt: Option<String>,
}

/// Accept any JSON for a field, keeping it only if it has the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

impl HookInput {
    /// The tool name, if present and non-blank.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// The prompt text, if present and non-blank.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref().filter(|p| !p.trim().is_empty())
    }

    /// A string field of the tool input.
    #[must_use]
    pub fn tool_str(&self, key: &str) -> Option<&str> {
        self.tool_input.as_ref().and_then(|ti| ti.str_field(key))
    }
}

/// Tool parameters. The shape varies per tool, so this stays an open map
/// with accessors for the fields hooks read.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(transparent)]
pub struct ToolInput(pub Map<String, Value>);

impl ToolInput {
    /// A non-empty string field.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    /// The file path being written or edited.
    #[must_use]
    pub fn file_path(&self) -> Option<&str> {
        self.str_field("file_path").or_else(|| self.str_field("notebook_path"))
    }

    /// All text the edit introduces (`content`, `new_string`, `edits[].new_string`).
    #[must_use]
    pub fn edited_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.str_field("content"));
        parts.extend(self.str_field("new_string"));
        parts.extend(self.str_field("new_source"));
        if let Some(edits) = self.0.get("edits").and_then(Value::as_array) {
            parts.extend(edits.iter().filter_map(|e| e.get("new_string").and_then(Value::as_str)));
        }
        parts.join("\n")
    }

    /// A timeout given either as a number or a numeric string.
    #[must_use]
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// What the host should do with the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Let the tool call or prompt through (exit 0).
    Allow,
    /// Stop it (exit 1).
    Block,
}

impl HookOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Allow => 0,
            Self::Block => 1,
        }
    }

    /// Whether this is a block.
    #[must_use]
    pub const fn is_block(self) -> bool {
        matches!(self, Self::Block)
    }

    /// Name used in the performance log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
        }
    }
}

/// Collaborators a hook runs against.
#[derive(Clone, Copy)]
pub struct HookEnv<'a> {
    /// Named state shared between hook invocations.
    pub store: &'a dyn StateStore,
    /// Where human-readable output goes.
    pub sink: &'a dyn OutputSink,
    /// Project configuration.
    pub config: &'a ProjectConfig,
    /// Hook log files.
    pub log: &'a HookLog,
    /// Append-only agent correlation file, if one is available.
    pub correlation_file: Option<&'a Path>,
}

impl std::fmt::Debug for HookEnv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookEnv")
            .field("config", self.config)
            .field("log", self.log)
            .field("correlation_file", &self.correlation_file)
            .finish_non_exhaustive()
    }
}

/// Every hook the binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Block tools while a question is pending.
    PendingQuestion,
    /// Block unverified completion claims.
    VerifyClaims,
    /// Suggest semantic code search.
    SemanticSearch,
    /// Suggest batching MCP calls in code mode.
    CodeMode,
    /// Detect MCP-backed service workflows.
    McpWorkflow,
    /// Warn when edits outgrow the recorded scope.
    ScopeGrowth,
    /// Remind about CDN cache-busting versions.
    CdnVersion,
    /// Announce task dispatches.
    AnnounceTask,
    /// Record task completion.
    TaskComplete,
}

impl HookKind {
    /// All hooks, in dispatcher order.
    pub const ALL: [Self; 9] = [
        Self::PendingQuestion,
        Self::AnnounceTask,
        Self::VerifyClaims,
        Self::SemanticSearch,
        Self::CodeMode,
        Self::McpWorkflow,
        Self::ScopeGrowth,
        Self::CdnVersion,
        Self::TaskComplete,
    ];

    /// Name used for subcommands, log files and `disabled_hooks`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PendingQuestion => "pending-question",
            Self::VerifyClaims => "verify-claims",
            Self::SemanticSearch => "suggest-semantic-search",
            Self::CodeMode => "suggest-code-mode",
            Self::McpWorkflow => "detect-mcp-workflow",
            Self::ScopeGrowth => "scope-growth",
            Self::CdnVersion => "cdn-version",
            Self::AnnounceTask => "announce-task",
            Self::TaskComplete => "task-complete",
        }
    }

    /// Look a hook up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Parse hook input from stdin.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed as JSON.
pub fn parse_hook_input(input: &str) -> Result<HookInput> {
    if input.trim().is_empty() {
        return Ok(HookInput::default());
    }
    let parsed: HookInput = serde_json::from_str(input)?;
    Ok(parsed)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::output::BufferSink;
    use crate::testing::MemoryStateStore;
    use std::path::PathBuf;

    /// Owns everything a [`HookEnv`] borrows.
    pub struct TestEnv {
        pub store: MemoryStateStore,
        pub sink: BufferSink,
        pub config: ProjectConfig,
        pub log: HookLog,
        pub correlation_file: Option<PathBuf>,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                store: MemoryStateStore::new(),
                sink: BufferSink::new(),
                config: ProjectConfig::default(),
                log: HookLog::disabled(),
                correlation_file: None,
            }
        }

        pub fn env(&self) -> HookEnv<'_> {
            HookEnv {
                store: &self.store,
                sink: &self.sink,
                config: &self.config,
                log: &self.log,
                correlation_file: self.correlation_file.as_deref(),
            }
        }
    }

    pub fn tool_event(tool: &str, tool_input: &serde_json::Value) -> HookInput {
        let json = serde_json::json!({"tool_name": tool, "tool_input": tool_input});
        parse_hook_input(&json.to_string()).unwrap()
    }

    pub fn prompt_event(prompt: &str) -> HookInput {
        HookInput { prompt: Some(prompt.to_string()), ..Default::default() }
    }
}
