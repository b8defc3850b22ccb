//! Verification-claim gate.
//!
//! A prompt that declares the work finished ("it's done", "fixed", "works
//! now") is blocked unless it also shows evidence from at least two
//! different categories: a named browser test, a clean console, a viewport
//! size, or a first-hand observation.
//!
//! The pattern tables are literal trigger phrases. They are deliberately
//! coarse and will both over- and under-trigger.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use tera::Context;

/// Phrases asserting that work is complete.
static CLAIM_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"(?:\bit|\bthis|\bthat|\beverything|\ball)\s*(?:'s|’s|\s+is|\s+are)\s+(?:now\s+)?(?:done|fixed|working|complete|completed|finished|resolved)\b",
        )
        .unwrap(),
        Regex::new(
            r"\b(?:i've|i’ve|i have|we've|we’ve|we have)\s+(?:now\s+)?(?:fixed|finished|completed|resolved)\b",
        )
        .unwrap(),
        Regex::new(r"\b(?:should|will)\s+(?:now\s+)?(?:work|be\s+working|be\s+fixed)\b").unwrap(),
        Regex::new(r"\bworks\s+(?:now|perfectly|correctly|fine|as expected)\b").unwrap(),
        Regex::new(r"^\s*(?:all\s+)?(?:done|fixed|complete)\s*[.!]*\s*$").unwrap(),
    ]
});

/// Named browser test.
static BROWSER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![Regex::new(
        r"\b(?:tested|verified|checked|confirmed|opened|loaded|ran it)\b[^.\n]{0,40}?\b(?:chrome|firefox|safari|edge|brave|browser|devtools|playwright|puppeteer)\b",
    )
    .unwrap()]
});

/// Console free of errors.
static CONSOLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(
            r"\bconsole\b[^.\n]{0,25}?\b(?:clear|clean|empty|no errors?|0 errors|zero errors|error[- ]free)\b",
        )
        .unwrap(),
        Regex::new(r"\bno\s+(?:js\s+|javascript\s+)?errors\s+in\s+(?:the\s+)?console\b").unwrap(),
    ]
});

/// Viewport or breakpoint mention.
static VIEWPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b\d{3,4}\s?px\b").unwrap(),
        Regex::new(r"\b(?:mobile|tablet|desktop)\s+(?:viewport|breakpoint|view|width)\b").unwrap(),
        Regex::new(r"\b(?:viewports?|breakpoints?)\b").unwrap(),
    ]
});

/// First-hand observation verb.
static OBSERVATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"\b(?:saw|observed|noticed|watched|screenshot(?:ted|s)?)\b").unwrap(),
        Regex::new(r"\bvisually\s+(?:checked|confirmed|verified|inspected)\b").unwrap(),
        Regex::new(r"\bi\s+(?:can\s+)?see\b").unwrap(),
    ]
});

/// A category of verification evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// "tested in Chrome".
    BrowserTest,
    /// "console clear".
    ConsoleClear,
    /// "at 375px".
    ViewportSize,
    /// "I saw the menu collapse".
    Observation,
}

impl Evidence {
    /// All categories, in reporting order.
    pub const ALL: [Self; 4] =
        [Self::BrowserTest, Self::ConsoleClear, Self::ViewportSize, Self::Observation];

    /// Short label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BrowserTest => "browser test",
            Self::ConsoleClear => "console clear",
            Self::ViewportSize => "viewport size",
            Self::Observation => "observation",
        }
    }

    /// What to add to the prompt to satisfy this category.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::BrowserTest => "Name the browser you tested in (\"tested in Chrome\")",
            Self::ConsoleClear => "State the console result (\"console clear, no errors\")",
            Self::ViewportSize => "Give the viewport sizes checked (\"at 375px and 1440px\")",
            Self::Observation => "Describe what you observed (\"I saw the form submit\")",
        }
    }

    fn patterns(self) -> &'static [Regex] {
        match self {
            Self::BrowserTest => &BROWSER_PATTERNS,
            Self::ConsoleClear => &CONSOLE_PATTERNS,
            Self::ViewportSize => &VIEWPORT_PATTERNS,
            Self::Observation => &OBSERVATION_PATTERNS,
        }
    }
}

/// Find the first completion claim in `text`, returning the matched phrase.
#[must_use]
pub fn find_completion_claim(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    CLAIM_PATTERNS
        .iter()
        .find_map(|re| re.find(&lower))
        .map(|m| m.as_str().trim_end_matches(['.', '!', ' ']).trim().to_string())
}

/// Evidence categories present in `text`, each at most once.
#[must_use]
pub fn find_evidence(text: &str) -> Vec<Evidence> {
    let lower = text.to_lowercase();
    Evidence::ALL
        .into_iter()
        .filter(|category| category.patterns().iter().any(|re| re.is_match(&lower)))
        .collect()
}

/// Run the verification `UserPromptSubmit` gate.
pub fn run_verification_gate(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let Some(prompt) = input.prompt() else {
        return HookOutcome::Allow;
    };

    let Some(claim) = find_completion_claim(prompt) else {
        return HookOutcome::Allow;
    };

    let found = find_evidence(prompt);
    let required = env.config.min_evidence_categories;
    if found.len() >= required {
        return HookOutcome::Allow;
    }

    let found_labels: Vec<&str> = found.iter().map(|e| e.label()).collect();
    let missing: Vec<&str> =
        Evidence::ALL.into_iter().filter(|e| !found.contains(e)).map(Evidence::hint).collect();

    let mut ctx = Context::new();
    ctx.insert("claim", &claim);
    ctx.insert("found", &found_labels);
    ctx.insert("found_count", &found.len());
    ctx.insert("min_evidence", &required);
    ctx.insert("missing", &missing);

    let message = templates::render_or("messages/verification_block.tera", &ctx, || {
        format!(
            "Completion claim \"{claim}\" needs at least {required} kinds of verification evidence."
        )
    });
    env.sink.emit(&message);
    env.log.append(
        HookKind::VerifyClaims.name(),
        &format!(
            "rejected claim \"{claim}\" with {} of {required} evidence categories [{}]",
            found.len(),
            found_labels.join(", ")
        ),
    );

    HookOutcome::Block
}
