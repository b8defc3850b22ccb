//! Task-dispatch announcer and completion hook.
//!
//! Each `Task` tool call gets an agent ID. Dispatches within a short window
//! of each other form one batch; small batches get a one-line summary,
//! large ones a bordered block listing every agent. The pairing of
//! description and ID is appended to the correlation file so the
//! completion hook can name the agent that finished.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome, ToolInput};
use crate::ids;
use crate::storage::keys;
use crate::templates;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tera::Context;

/// The tool that dispatches sub-agents.
const TASK_TOOL: &str = "Task";

/// Width of the verbose block border.
const BORDER_WIDTH: usize = 60;

/// Longest description shown before truncation.
const MAX_DESCRIPTION_CHARS: usize = 80;

/// A dispatched sub-agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Ephemeral agent ID.
    pub id: String,
    /// What the agent was asked to do.
    pub description: String,
    /// Requested model, or `inherit`.
    pub model: String,
    /// Requested timeout, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    /// Requested agent type.
    pub subagent_type: String,
    /// When the dispatch was seen.
    pub dispatched_at: DateTime<Utc>,
}

impl AgentDescriptor {
    /// Build a descriptor from `Task` tool parameters.
    #[must_use]
    pub fn from_tool_input(tool_input: Option<&ToolInput>, now: DateTime<Utc>) -> Self {
        let description = task_description(tool_input);
        let field = |key: &str, default: &str| {
            tool_input.and_then(|ti| ti.str_field(key)).unwrap_or(default).to_string()
        };
        Self {
            id: ids::generate_agent_id(&description),
            model: field("model", "inherit"),
            subagent_type: field("subagent_type", "general-purpose"),
            timeout: tool_input.and_then(|ti| ti.u64_field("timeout")),
            dispatched_at: now,
            description,
        }
    }

    /// The timeout as shown to the user.
    #[must_use]
    pub fn timeout_display(&self) -> String {
        self.timeout.map_or_else(|| "default".to_string(), |t| t.to_string())
    }
}

/// The task description, falling back to the first line of the prompt.
fn task_description(tool_input: Option<&ToolInput>) -> String {
    let raw = tool_input
        .and_then(|ti| ti.str_field("description").or_else(|| ti.str_field("prompt")))
        .and_then(|text| text.lines().map(str::trim).find(|line| !line.is_empty()))
        .unwrap_or("(no description)");

    if raw.chars().count() > MAX_DESCRIPTION_CHARS {
        let truncated: String = raw.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        format!("{truncated}...")
    } else {
        raw.to_string()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DispatchBatch {
    #[serde(default)]
    agents: Vec<AgentDescriptor>,
}

/// Correlation lines are `description|agent_id`, one per line.
fn correlation_key(description: &str) -> String {
    description.replace(['|', '\n', '\r'], " ")
}

fn append_correlation(path: &Path, agent: &AgentDescriptor) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}|{}", correlation_key(&agent.description), agent.id)
}

/// Find the agent ID recorded for `description`, taking the first match.
#[must_use]
pub fn lookup_agent_id(path: &Path, description: &str) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let wanted = correlation_key(description);
    content.lines().find_map(|line| {
        let (desc, id) = line.rsplit_once('|')?;
        (desc == wanted && !id.is_empty()).then(|| id.to_string())
    })
}

fn compact_summary(agent: &AgentDescriptor, batch_size: usize) -> String {
    let mut line = format!(
        "Dispatching agent {} ({}, model {}, timeout {}): {}",
        agent.id,
        agent.subagent_type,
        agent.model,
        agent.timeout_display(),
        agent.description
    );
    if batch_size > 1 {
        line.push_str(&format!(" [{batch_size} agents in flight]"));
    }
    line
}

#[derive(Serialize)]
struct AgentRow<'a> {
    id: &'a str,
    description: &'a str,
    model: &'a str,
    timeout: String,
}

fn verbose_block(agents: &[AgentDescriptor]) -> String {
    let rows: Vec<AgentRow<'_>> = agents
        .iter()
        .map(|a| AgentRow {
            id: &a.id,
            description: &a.description,
            model: &a.model,
            timeout: a.timeout_display(),
        })
        .collect();

    let mut ctx = Context::new();
    ctx.insert("border", &"-".repeat(BORDER_WIDTH));
    ctx.insert("count", &agents.len());
    ctx.insert("agents", &rows);
    templates::render_or("messages/task_dispatch_verbose.tera", &ctx, || {
        let mut text = format!("Dispatching {} agents in parallel", agents.len());
        for agent in agents {
            text.push_str(&format!("\n  {} {}", agent.id, agent.description));
        }
        text
    })
}

/// Run the task-dispatch `PreToolUse` hook.
///
/// Announces only: always allows.
pub fn run_task_dispatch_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let hook = HookKind::AnnounceTask.name();
    if input.tool_name() != Some(TASK_TOOL) {
        return HookOutcome::Allow;
    }

    let agent = AgentDescriptor::from_tool_input(input.tool_input.as_ref(), env.store.now());

    let mut batch: DispatchBatch = env
        .store
        .read(keys::TASK_DISPATCH_BATCH, env.config.dispatch_batch_window())
        .and_then(|payload| serde_json::from_value(payload).ok())
        .unwrap_or_default();
    batch.agents.push(agent.clone());
    let persisted = serde_json::to_value(&batch)
        .is_ok_and(|payload| env.store.write(keys::TASK_DISPATCH_BATCH, payload));
    if !persisted {
        env.log.append(hook, "could not persist dispatch batch");
    }

    let count = batch.agents.len();
    let message = if count >= env.config.verbose_dispatch_threshold {
        verbose_block(&batch.agents)
    } else {
        compact_summary(&agent, count)
    };
    env.sink.emit(&message);

    env.log.append(
        hook,
        &format!(
            "dispatched {} type={} model={} timeout={} batch={count} description=\"{}\"",
            agent.id,
            agent.subagent_type,
            agent.model,
            agent.timeout_display(),
            agent.description
        ),
    );

    if let Some(path) = env.correlation_file {
        if let Err(e) = append_correlation(path, &agent) {
            env.log.append(hook, &format!("could not write correlation file: {e}"));
        }
    }

    HookOutcome::Allow
}

/// Run the task-completion `PostToolUse` hook.
///
/// Always allows.
pub fn run_task_complete_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    if input.tool_name() != Some(TASK_TOOL) {
        return HookOutcome::Allow;
    }

    let description = task_description(input.tool_input.as_ref());
    let agent_id = env.correlation_file.and_then(|path| lookup_agent_id(path, &description));

    let notice = match &agent_id {
        Some(id) => format!("Agent {id} finished: {description}"),
        None => format!("Agent finished: {description}"),
    };
    env.sink.emit(&notice);
    env.log.append(
        HookKind::TaskComplete.name(),
        &format!("completed {} description=\"{description}\"", agent_id.as_deref().unwrap_or("unknown")),
    );

    HookOutcome::Allow
}
