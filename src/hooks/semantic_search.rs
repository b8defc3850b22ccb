//! Semantic-search suggestion hook.
//!
//! When a prompt reads like code exploration ("where is", "how does ...
//! work"), suggest a semantic code search before grep and glob.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::Context;

/// Exploration phrasings, paired with the label shown in the suggestion.
static EXPLORATION_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    vec![
        ("where is", Regex::new(r"\bwhere\s+(?:is|are|do|does)\b").unwrap()),
        ("how does ... work", Regex::new(r"\bhow\s+(?:does|do|is)\b[^?.\n]{0,60}\b(?:work|works|handled|implemented)\b").unwrap()),
        ("find the code", Regex::new(r"\bfind\s+(?:the\s+)?(?:code|function|logic|implementation|place)\b").unwrap()),
        ("which file", Regex::new(r"\bwhich\s+(?:file|module|component|function)s?\b").unwrap()),
        ("implementation of", Regex::new(r"\bimplementation\s+of\b").unwrap()),
        ("what calls", Regex::new(r"\b(?:what|who)\s+(?:calls|uses|references)\b").unwrap()),
        ("explore the codebase", Regex::new(r"\b(?:explore|understand|walk\s+through)\s+(?:the\s+)?(?:codebase|code\s+base|repo|repository|project)\b").unwrap()),
        ("locate", Regex::new(r"\blocate\b").unwrap()),
    ]
});

/// Labels of the exploration phrasings found in `prompt`.
fn matched_phrases(prompt: &str) -> Vec<&'static str> {
    let lower = prompt.to_lowercase();
    EXPLORATION_PATTERNS
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(label, _)| *label)
        .collect()
}

/// Run the semantic-search suggestion `UserPromptSubmit` hook.
///
/// Advisory only: always allows.
pub fn run_semantic_search_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let Some(prompt) = input.prompt() else {
        return HookOutcome::Allow;
    };

    let matched = matched_phrases(prompt);
    if matched.is_empty() {
        return HookOutcome::Allow;
    }

    let mut ctx = Context::new();
    ctx.insert("matched", &matched);
    let message = templates::render_or("messages/semantic_search_suggestion.tera", &ctx, || {
        "Suggestion: try a semantic code search before grep.".to_string()
    });
    env.sink.emit(&message);
    env.log.append(HookKind::SemanticSearch.name(), &format!("suggested for [{}]", matched.join(", ")));

    HookOutcome::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::{prompt_event, TestEnv};

    #[test]
    fn test_exploration_prompt_gets_suggestion() {
        let t = TestEnv::new();
        let input = prompt_event("Where is the auth token refreshed?");

        assert_eq!(run_semantic_search_hook(&input, &t.env()), HookOutcome::Allow);
        let message = t.sink.joined();
        assert!(message.contains("semantic code search"));
        assert!(message.contains("where is"));
    }

    #[test]
    fn test_how_does_it_work() {
        assert_eq!(matched_phrases("How does the cache invalidation work?"), vec!["how does ... work"]);
    }

    #[test]
    fn test_multiple_matches() {
        let matched = matched_phrases("Which file has the implementation of the router?");
        assert_eq!(matched, vec!["which file", "implementation of"]);
    }

    #[test]
    fn test_plain_instruction_is_silent() {
        let t = TestEnv::new();
        let input = prompt_event("Rename the variable foo to bar in main.rs");

        assert_eq!(run_semantic_search_hook(&input, &t.env()), HookOutcome::Allow);
        assert!(t.sink.is_empty());
    }

    #[test]
    fn test_no_prompt_is_silent() {
        let t = TestEnv::new();
        assert_eq!(run_semantic_search_hook(&HookInput::default(), &t.env()), HookOutcome::Allow);
        assert!(t.sink.is_empty());
    }
}
