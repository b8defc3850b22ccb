//! Pending-question gate.
//!
//! While a question to the user is outstanding, every tool except the
//! question-asking tool is blocked. Calling the question tool clears the
//! question. A question older than its TTL stops blocking on its own.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::storage::keys;
use crate::templates;
use crate::traits::StateStore;
use serde::{Deserialize, Serialize};
use tera::Context;

/// Payload of the `pending_question` state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    /// The question text.
    #[serde(default)]
    pub question: String,
    /// Answer options offered to the user.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Record that `question` is waiting for an answer.
///
/// Returns whether the state was persisted.
pub fn mark_pending_question(store: &dyn StateStore, question: &str, options: &[String]) -> bool {
    let payload = PendingQuestion { question: question.to_string(), options: options.to_vec() };
    serde_json::to_value(payload).is_ok_and(|value| store.write(keys::PENDING_QUESTION, value))
}

/// Run the pending-question `PreToolUse` gate.
pub fn run_pending_question_gate(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let hook = HookKind::PendingQuestion.name();

    let Some(tool_name) = input.tool_name() else {
        return HookOutcome::Allow;
    };

    if tool_name == env.config.question_tool {
        let had_question = env.store.load(keys::PENDING_QUESTION).ok().flatten().is_some();
        env.store.clear(keys::PENDING_QUESTION);
        if had_question {
            env.log.append(hook, &format!("cleared pending question ({tool_name} invoked)"));
        }
        return HookOutcome::Allow;
    }

    let ttl = env.config.pending_question_ttl();
    let Some(state) = env.store.active(keys::PENDING_QUESTION, ttl) else {
        return HookOutcome::Allow;
    };

    let pending: PendingQuestion = serde_json::from_value(state.payload.clone()).unwrap_or_default();
    let question = if pending.question.trim().is_empty() {
        "(no question text recorded)".to_string()
    } else {
        pending.question
    };
    let age_secs = state.age_secs(env.store.now());
    let remaining_secs = ttl.as_secs().saturating_sub(age_secs);

    let mut ctx = Context::new();
    ctx.insert("tool_name", tool_name);
    ctx.insert("question", &question);
    ctx.insert("options", &pending.options);
    ctx.insert("asked_at", &state.created_at.to_rfc3339());
    ctx.insert("age_secs", &age_secs);
    ctx.insert("remaining_secs", &remaining_secs);
    ctx.insert("question_tool", &env.config.question_tool);

    let message = templates::render_or("messages/pending_question_block.tera", &ctx, || {
        format!("Tool use blocked: `{tool_name}` - a question is pending: {question}")
    });
    env.sink.emit(&message);
    env.log.append(hook, &format!("blocked {tool_name} (question pending {age_secs}s)"));

    HookOutcome::Block
}
