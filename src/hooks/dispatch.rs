//! Event dispatchers.
//!
//! Hosts usually wire one command per event, so each dispatcher runs every
//! hook that applies to its event in a fixed order and stops at the first
//! block.

use crate::hooks::{
    run_cdn_version_hook, run_code_mode_hook, run_mcp_workflow_hook, run_pending_question_gate,
    run_scope_growth_hook, run_semantic_search_hook, run_task_complete_hook,
    run_task_dispatch_hook, run_verification_gate, HookEnv, HookInput, HookKind, HookOutcome,
};
use std::time::Instant;

/// Hooks run for `PreToolUse`, in order.
const PRE_TOOL_USE: &[HookKind] = &[HookKind::PendingQuestion, HookKind::AnnounceTask];

/// Hooks run for `UserPromptSubmit`, in order.
const USER_PROMPT_SUBMIT: &[HookKind] = &[
    HookKind::VerifyClaims,
    HookKind::SemanticSearch,
    HookKind::CodeMode,
    HookKind::McpWorkflow,
];

/// Hooks run for `PostToolUse`, in order.
const POST_TOOL_USE: &[HookKind] =
    &[HookKind::ScopeGrowth, HookKind::CdnVersion, HookKind::TaskComplete];

/// Run one hook, honoring `disabled_hooks` and recording its duration.
pub fn run_hook(kind: HookKind, input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    if !env.config.is_hook_enabled(kind.name()) {
        return HookOutcome::Allow;
    }

    let started = Instant::now();
    let outcome = match kind {
        HookKind::PendingQuestion => run_pending_question_gate(input, env),
        HookKind::VerifyClaims => run_verification_gate(input, env),
        HookKind::SemanticSearch => run_semantic_search_hook(input, env),
        HookKind::CodeMode => run_code_mode_hook(input, env),
        HookKind::McpWorkflow => run_mcp_workflow_hook(input, env),
        HookKind::ScopeGrowth => run_scope_growth_hook(input, env),
        HookKind::CdnVersion => run_cdn_version_hook(input, env),
        HookKind::AnnounceTask => run_task_dispatch_hook(input, env),
        HookKind::TaskComplete => run_task_complete_hook(input, env),
    };
    env.log.record_performance(kind.name(), started.elapsed(), outcome.as_str());
    outcome
}

fn run_chain(kinds: &[HookKind], input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    for &kind in kinds {
        let outcome = run_hook(kind, input, env);
        if outcome.is_block() {
            return outcome;
        }
    }
    HookOutcome::Allow
}

/// Run every `PreToolUse` hook.
pub fn run_pre_tool_use(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    run_chain(PRE_TOOL_USE, input, env)
}

/// Run every `UserPromptSubmit` hook.
pub fn run_user_prompt_submit(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    run_chain(USER_PROMPT_SUBMIT, input, env)
}

/// Run every `PostToolUse` hook.
pub fn run_post_tool_use(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    run_chain(POST_TOOL_USE, input, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook_logging::{HookLog, PERFORMANCE_LOG};
    use crate::hooks::mark_pending_question;
    use crate::hooks::test_support::{prompt_event, tool_event, TestEnv};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_pending_question_blocks_before_task_announcement() {
        let t = TestEnv::new();
        mark_pending_question(&t.store, "Which approach?", &[]);

        let input = tool_event("Task", &json!({"description": "Explore"}));
        assert_eq!(run_pre_tool_use(&input, &t.env()), HookOutcome::Block);

        let messages = t.sink.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Question Pending"));
    }

    #[test]
    fn test_task_is_announced_when_nothing_pending() {
        let t = TestEnv::new();
        let input = tool_event("Task", &json!({"description": "Explore"}));

        assert_eq!(run_pre_tool_use(&input, &t.env()), HookOutcome::Allow);
        assert!(t.sink.joined().starts_with("Dispatching agent agent-explore-"));
    }

    #[test]
    fn test_blocked_claim_skips_advisories() {
        let t = TestEnv::new();
        let input = prompt_event("It's done, where is the Webflow and Notion sync?");

        assert_eq!(run_user_prompt_submit(&input, &t.env()), HookOutcome::Block);
        let messages = t.sink.take();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("Completion Claim Needs Evidence"));
    }

    #[test]
    fn test_advisories_all_run() {
        let t = TestEnv::new();
        let input = prompt_event("Where is the code that syncs Webflow items to Notion?");

        assert_eq!(run_user_prompt_submit(&input, &t.env()), HookOutcome::Allow);
        let messages = t.sink.take();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].contains("semantic code search"));
        assert!(messages[1].contains("code mode"));
        assert!(messages[2].contains("MCP workflow detected"));
    }

    #[test]
    fn test_disabled_hook_allows_without_evaluating() {
        let mut t = TestEnv::new();
        t.config.disabled_hooks = vec!["verify-claims".to_string()];

        assert_eq!(run_user_prompt_submit(&prompt_event("All done!"), &t.env()), HookOutcome::Allow);
        assert!(t.sink.is_empty());
    }

    #[test]
    fn test_post_tool_use_runs_scope_and_cdn_hooks() {
        let t = TestEnv::new();
        let input = tool_event("Write", &json!({"file_path": "site/main.css", "content": "body{}"}));

        assert_eq!(run_post_tool_use(&input, &t.env()), HookOutcome::Allow);
        assert!(t.sink.joined().contains("`site/main.css` changed"));
        assert_eq!(crate::hooks::scope_status(&t.store, &t.config).files, vec!["site/main.css"]);
    }

    #[test]
    fn test_performance_is_recorded_per_hook() {
        let dir = TempDir::new().unwrap();
        let mut t = TestEnv::new();
        t.log = HookLog::new(dir.path());
        t.config.disabled_hooks = vec!["announce-task".to_string()];

        run_pre_tool_use(&tool_event("Bash", &json!({"command": "ls"})), &t.env());

        let perf = std::fs::read_to_string(dir.path().join(PERFORMANCE_LOG)).unwrap();
        let lines: Vec<&str> = perf.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("pending-question "));
        assert!(lines[0].ends_with(" allow"));
    }
}
