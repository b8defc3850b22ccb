//! Code-mode suggestion hook.

use crate::hooks::mcp_workflow::{detect_services, McpService};
use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::Context;

/// Phrasing that chains several tool calls.
static CHAINING_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(?:multiple|several|many)\s+(?:tools?|tool\s+calls|services|apis)\b").unwrap(),
        Regex::new(r"\b(?:for\s+(?:each|every)|in\s+bulk|bulk[- ](?:update|create|import|edit)|batch)\b").unwrap(),
        Regex::new(r"\bthen\b[^.\n]{1,80}\bthen\b").unwrap(),
        Regex::new(r"\b(?:sync|copy|migrate|move)\b[^.\n]{1,60}\bfrom\b[^.\n]{1,60}\b(?:to|into)\b").unwrap(),
    ]
});

fn has_chaining_phrase(lower: &str) -> bool {
    CHAINING_PATTERNS.iter().any(|re| re.is_match(lower))
}

/// Why code mode applies to `prompt`, if it does.
fn suggestion_reason(prompt: &str, services: &[McpService]) -> Option<String> {
    let names: Vec<&str> = services.iter().map(|s| s.name()).collect();
    if services.len() >= 2 {
        return Some(format!(
            "This prompt touches {} MCP-backed services ({}).",
            services.len(),
            names.join(", ")
        ));
    }
    if has_chaining_phrase(&prompt.to_lowercase()) {
        return Some("This prompt chains several tool calls in sequence.".to_string());
    }
    None
}

/// Run the code-mode suggestion `UserPromptSubmit` hook.
///
/// Advisory only: always allows.
pub fn run_code_mode_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let Some(prompt) = input.prompt() else {
        return HookOutcome::Allow;
    };

    let services = detect_services(prompt);
    let Some(reason) = suggestion_reason(prompt, &services) else {
        return HookOutcome::Allow;
    };
    let names: Vec<&str> = services.iter().map(|s| s.name()).collect();

    let mut ctx = Context::new();
    ctx.insert("reason", &reason);
    ctx.insert("services", &names);
    let message = templates::render_or("messages/code_mode_suggestion.tera", &ctx, || {
        format!("Suggestion: batch these calls in one code-mode execution. {reason}")
    });
    env.sink.emit(&message);
    env.log.append(HookKind::CodeMode.name(), &format!("suggested: {reason}"));

    HookOutcome::Allow
}
