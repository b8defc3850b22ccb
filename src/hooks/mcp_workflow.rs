//! MCP-workflow detection hook.
//!
//! Detects prompts that will need an MCP-backed service and prints the
//! workflow hint for each one. The keyword table is a literal list of
//! trigger phrases, not an intent classifier.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tera::Context;

/// An external service reached through an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpService {
    /// Webflow sites and CMS.
    Webflow,
    /// Notion pages and databases.
    Notion,
    /// `ClickUp` tasks.
    ClickUp,
    /// Figma design files.
    Figma,
    /// GitHub repositories, issues and pull requests.
    GitHub,
    /// Chrome `DevTools` protocol.
    ChromeDevTools,
}

static WEBFLOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bwebflow\b|\bcms\s+collections?\b|\bcollection\s+items?\b|\bdesigner\s+api\b")
        .unwrap()
});
static NOTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bnotion\b").unwrap());
static CLICKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bclick\s?up\b").unwrap());
static FIGMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfigma\b|\bdesign\s+(?:file|tokens)\b").unwrap());
static GITHUB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgithub\b|\bpull\s+requests?\b").unwrap());
static CHROME_DEVTOOLS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bchrome\s+devtools\b|\bdevtools\b|\blighthouse\b|\bperformance\s+trace\b").unwrap()
});

impl McpService {
    /// All services, in reporting order.
    pub const ALL: [Self; 6] =
        [Self::Webflow, Self::Notion, Self::ClickUp, Self::Figma, Self::GitHub, Self::ChromeDevTools];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Webflow => "Webflow",
            Self::Notion => "Notion",
            Self::ClickUp => "ClickUp",
            Self::Figma => "Figma",
            Self::GitHub => "GitHub",
            Self::ChromeDevTools => "Chrome DevTools",
        }
    }

    /// The workflow to follow for this service.
    #[must_use]
    pub const fn hint(self) -> &'static str {
        match self {
            Self::Webflow => {
                "read the site and collection schema first, then create or update items; publish only after review"
            }
            Self::Notion => {
                "search for the target page or database before creating anything; batch block updates"
            }
            Self::ClickUp => "resolve workspace, space and list IDs before creating or moving tasks",
            Self::Figma => "pull node data and variables from the file before generating code",
            Self::GitHub => "use the GitHub tools for issues and pull requests instead of the web UI",
            Self::ChromeDevTools => {
                "capture console and network output through DevTools instead of screenshots"
            }
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::Webflow => &WEBFLOW,
            Self::Notion => &NOTION,
            Self::ClickUp => &CLICKUP,
            Self::Figma => &FIGMA,
            Self::GitHub => &GITHUB,
            Self::ChromeDevTools => &CHROME_DEVTOOLS,
        }
    }
}

/// Services mentioned in `text`.
#[must_use]
pub fn detect_services(text: &str) -> Vec<McpService> {
    let lower = text.to_lowercase();
    McpService::ALL.into_iter().filter(|s| s.pattern().is_match(&lower)).collect()
}

#[derive(Serialize)]
struct Workflow {
    service: &'static str,
    hint: &'static str,
}

/// Run the MCP-workflow detection `UserPromptSubmit` hook.
///
/// Advisory only: always allows.
pub fn run_mcp_workflow_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let Some(prompt) = input.prompt() else {
        return HookOutcome::Allow;
    };

    let services = detect_services(prompt);
    if services.is_empty() {
        return HookOutcome::Allow;
    }

    let workflows: Vec<Workflow> =
        services.iter().map(|s| Workflow { service: s.name(), hint: s.hint() }).collect();
    let names: Vec<&str> = services.iter().map(|s| s.name()).collect();

    let mut ctx = Context::new();
    ctx.insert("workflows", &workflows);
    let message = templates::render_or("messages/mcp_workflow_suggestion.tera", &ctx, || {
        format!("MCP workflow detected: {}", names.join(", "))
    });
    env.sink.emit(&message);
    env.log.append(HookKind::McpWorkflow.name(), &format!("detected [{}]", names.join(", ")));

    HookOutcome::Allow
}
