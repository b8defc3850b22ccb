//! Template loading and rendering using Tera.
//!
//! Block and suggestion messages live in template files embedded in the
//! binary. A project can override any of them by placing a file with the
//! same relative name under `.claude/hookgate-templates/`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tera::{Context, Tera};

/// Override directory relative to the project root.
const TEMPLATES_DIR: &str = ".claude/hookgate-templates";

/// Embedded default templates for fallback when files don't exist.
static EMBEDDED_TEMPLATES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    // Blocking hooks
    m.insert(
        "messages/pending_question_block.tera",
        include_str!("../templates/messages/pending_question_block.tera"),
    );
    m.insert(
        "messages/verification_block.tera",
        include_str!("../templates/messages/verification_block.tera"),
    );

    // Advisory hooks
    m.insert(
        "messages/semantic_search_suggestion.tera",
        include_str!("../templates/messages/semantic_search_suggestion.tera"),
    );
    m.insert(
        "messages/code_mode_suggestion.tera",
        include_str!("../templates/messages/code_mode_suggestion.tera"),
    );
    m.insert(
        "messages/mcp_workflow_suggestion.tera",
        include_str!("../templates/messages/mcp_workflow_suggestion.tera"),
    );
    m.insert(
        "messages/scope_growth_warning.tera",
        include_str!("../templates/messages/scope_growth_warning.tera"),
    );
    m.insert(
        "messages/cdn_version_reminder.tera",
        include_str!("../templates/messages/cdn_version_reminder.tera"),
    );
    m.insert(
        "messages/task_dispatch_verbose.tera",
        include_str!("../templates/messages/task_dispatch_verbose.tera"),
    );

    m
});

/// Global template engine with caching.
static TERA: Lazy<RwLock<Option<Tera>>> = Lazy::new(|| RwLock::new(None));

/// Build an engine from an override directory plus the embedded defaults.
///
/// # Errors
///
/// Returns an error if the directory exists but contains invalid templates,
/// or if an embedded template fails to parse.
pub fn build_engine(templates_dir: &Path) -> Result<Tera> {
    let mut tera = Tera::default();

    if templates_dir.exists() {
        let glob_pattern = format!("{}/**/*.tera", templates_dir.display());
        tera = Tera::new(&glob_pattern).map_err(|e| {
            Error::Template(format!(
                "Failed to load templates from {}: {e}",
                templates_dir.display()
            ))
        })?;
    }

    for (name, content) in EMBEDDED_TEMPLATES.iter() {
        if tera.get_template(name).is_err() {
            tera.add_raw_template(name, content)
                .map_err(|e| Error::Template(format!("Embedded template {name}: {e}")))?;
        }
    }

    Ok(tera)
}

/// The template override directory of a project.
#[must_use]
pub fn override_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(TEMPLATES_DIR)
}

/// Initialize the global engine.
///
/// `None` uses the override directory of the current project.
///
/// # Errors
///
/// Returns an error if the templates cannot be loaded.
pub fn init_templates(templates_dir: Option<&Path>) -> Result<()> {
    let dir = templates_dir.map_or_else(
        || override_dir(&std::env::current_dir().unwrap_or_default()),
        Path::to_path_buf,
    );

    let tera = build_engine(&dir)?;
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = Some(tera);

    Ok(())
}

/// Render a template with the given context.
///
/// Templates are lazy-loaded on first use.
///
/// # Errors
///
/// Returns an error if the template doesn't exist or rendering fails.
pub fn render(name: &str, context: &Context) -> Result<String> {
    let needs_init = TERA.read().map_err(|e| Error::Template(e.to_string()))?.is_none();

    if needs_init {
        init_templates(None)?;
    }

    let guard = TERA.read().map_err(|e| Error::Template(e.to_string()))?;
    let tera = guard.as_ref().ok_or_else(|| Error::Template("Templates not initialized".into()))?;
    let rendered = tera
        .render(name, context)
        .map_err(|e| Error::Template(format!("Failed to render template {name}: {e}")))?;
    drop(guard);

    Ok(rendered.trim_end().to_string())
}

/// Render a template, falling back to `fallback` if rendering fails.
///
/// Hooks must never crash the host, so a broken override degrades to
/// plain text.
pub fn render_or(name: &str, context: &Context, fallback: impl FnOnce() -> String) -> String {
    render(name, context).unwrap_or_else(|e| format!("{}\n({e})", fallback()))
}

/// Reset the template cache, forcing re-initialization on next use.
///
/// # Errors
///
/// Returns an error if the write lock cannot be acquired.
pub fn reset_cache() -> Result<()> {
    *TERA.write().map_err(|e| Error::Template(e.to_string()))? = None;
    Ok(())
}

/// Get the list of all embedded template names.
#[must_use]
pub fn embedded_template_names() -> Vec<&'static str> {
    EMBEDDED_TEMPLATES.keys().copied().collect()
}

/// Verify all embedded templates can be rendered with sample data.
///
/// # Errors
///
/// Returns an error if any template fails to render.
pub fn verify_all_templates() -> Result<()> {
    let tera = build_engine(Path::new("/nonexistent"))?;
    let ctx = sample_context();

    for name in embedded_template_names() {
        tera.render(name, &ctx)
            .map_err(|e| Error::Template(format!("Template {name} failed to render: {e}")))?;
    }

    Ok(())
}

/// A context holding every variable any embedded template uses.
fn sample_context() -> Context {
    let mut ctx = Context::new();

    // Pending question
    ctx.insert("tool_name", "Bash");
    ctx.insert("question", "Which database should I use?");
    ctx.insert("options", &vec!["Postgres", "SQLite"]);
    ctx.insert("asked_at", "2026-01-01T12:00:00Z");
    ctx.insert("age_secs", &10_u64);
    ctx.insert("remaining_secs", &290_u64);
    ctx.insert("question_tool", "AskUserQuestion");

    // Verification
    ctx.insert("claim", "it's done");
    ctx.insert("found", &vec!["viewport size"]);
    ctx.insert("found_count", &1_usize);
    ctx.insert("min_evidence", &2_usize);
    ctx.insert("missing", &vec!["Name the browser you tested in"]);

    // Advisories
    ctx.insert("matched", &vec!["where is"]);
    ctx.insert("reason", "This prompt involves Webflow and Notion.");
    ctx.insert("services", &vec!["Webflow", "Notion"]);
    ctx.insert(
        "workflows",
        &vec![serde_json::json!({"service": "Webflow", "hint": "Read the collection schema first"})],
    );
    ctx.insert("initial", &4_usize);
    ctx.insert("current", &7_usize);
    ctx.insert("percent", &175_u64);
    ctx.insert("threshold_percent", &150_u64);
    ctx.insert("recent", &vec!["src/app.js"]);
    ctx.insert("asset", "assets/app.js");
    ctx.insert("cdn_urls", &vec!["https://cdn.jsdelivr.net/npm/gsap@3.12.5/dist/gsap.min.js"]);

    // Task dispatch
    ctx.insert("border", &"-".repeat(20));
    ctx.insert("count", &3_usize);
    ctx.insert(
        "agents",
        &vec![serde_json::json!({
            "id": "agent-review-0001",
            "description": "Review",
            "model": "sonnet",
            "timeout": "600s",
        })],
    );

    ctx
}
