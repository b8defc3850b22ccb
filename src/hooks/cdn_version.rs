//! CDN-version reminder.
//!
//! Two separate checks on each write or edit:
//!
//! - Editing a local `.js` or `.css` asset means any HTML that loads it
//!   with a `?v=` cache-busting query should get a new version.
//! - New content containing version-pinned CDN URLs (jsDelivr, unpkg,
//!   cdnjs) gets those URLs listed for review.

use crate::hooks::{HookEnv, HookInput, HookKind, HookOutcome};
use crate::templates;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tera::Context;

const WRITE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit"];

/// Directory names whose contents are third-party code.
const VENDORED_DIRS: &[&str] = &["node_modules", "vendor", "bower_components"];

static CDN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"https?://(?:cdn\.jsdelivr\.net/(?:npm/(?:@[\w.-]+/)?[\w.-]+|gh/[\w.-]+/[\w.-]+)@[\w.^~-]+|unpkg\.com/(?:@[\w.-]+/)?[\w.-]+@[\w.^~-]+|cdnjs\.cloudflare\.com/ajax/libs/[\w.-]+/\d[\w.-]*)(?:/[^\s"'<>)]*)?"#,
    )
    .unwrap()
});

/// Version-pinned CDN URLs in `text`, deduplicated in order of appearance.
#[must_use]
pub fn find_cdn_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for m in CDN_URL.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';']);
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Whether `path` is a hand-maintained script or stylesheet.
fn is_local_asset(path: &str) -> bool {
    let p = Path::new(path);
    let Some(name) = p.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let lower = name.to_ascii_lowercase();
    let is_asset = Path::new(&lower)
        .extension()
        .is_some_and(|ext| ext == "js" || ext == "css");
    if !is_asset || lower.contains(".min.") {
        return false;
    }
    !p.components()
        .any(|c| c.as_os_str().to_str().is_some_and(|s| VENDORED_DIRS.contains(&s)))
}

/// Run the CDN-version `PostToolUse` hook.
///
/// Advisory only: always allows.
pub fn run_cdn_version_hook(input: &HookInput, env: &HookEnv<'_>) -> HookOutcome {
    let Some(tool_name) = input.tool_name() else {
        return HookOutcome::Allow;
    };
    if !WRITE_TOOLS.contains(&tool_name) {
        return HookOutcome::Allow;
    }
    let Some(tool_input) = input.tool_input.as_ref() else {
        return HookOutcome::Allow;
    };

    let asset = tool_input.file_path().filter(|p| is_local_asset(p));
    let cdn_urls = find_cdn_urls(&tool_input.edited_text());
    if asset.is_none() && cdn_urls.is_empty() {
        return HookOutcome::Allow;
    }

    let mut ctx = Context::new();
    ctx.insert("asset", &asset);
    ctx.insert("cdn_urls", &cdn_urls);
    let message = templates::render_or("messages/cdn_version_reminder.tera", &ctx, || {
        "Reminder: check cache-busting and CDN versions for this edit.".to_string()
    });
    env.sink.emit(&message);

    let mut entry = String::from("reminded");
    if let Some(asset) = asset {
        entry.push_str(&format!(" asset={asset}"));
    }
    if !cdn_urls.is_empty() {
        entry.push_str(&format!(" cdn_urls={}", cdn_urls.len()));
    }
    env.log.append(HookKind::CdnVersion.name(), &entry);

    HookOutcome::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::test_support::{tool_event, TestEnv};
    use serde_json::json;

    #[test]
    fn test_local_assets() {
        assert!(is_local_asset("src/js/main.js"));
        assert!(is_local_asset("styles/site.CSS"));
        assert!(!is_local_asset("dist/app.min.js"));
        assert!(!is_local_asset("node_modules/lodash/lodash.js"));
        assert!(!is_local_asset("assets/vendor/jquery.js"));
        assert!(!is_local_asset("index.html"));
        assert!(!is_local_asset("src/lib.rs"));
    }

    #[test]
    fn test_find_cdn_urls() {
        let html = r#"
            <script src="https://cdn.jsdelivr.net/npm/alpinejs@3.13.3/dist/cdn.min.js"></script>
            <script src="https://unpkg.com/@popperjs/core@2.11.8"></script>
            <link href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
            <script src="https://cdn.jsdelivr.net/gh/user/repo@v1.0/x.js"></script>
            <script src="https://unpkg.com/htmx.org"></script>
        "#;
        assert_eq!(
            find_cdn_urls(html),
            vec![
                "https://cdn.jsdelivr.net/npm/alpinejs@3.13.3/dist/cdn.min.js",
                "https://unpkg.com/@popperjs/core@2.11.8",
                "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css",
                "https://cdn.jsdelivr.net/gh/user/repo@v1.0/x.js",
            ]
        );
    }

    #[test]
    fn test_find_cdn_urls_dedupes() {
        let text = "https://unpkg.com/react@18 and again https://unpkg.com/react@18.";
        assert_eq!(find_cdn_urls(text), vec!["https://unpkg.com/react@18"]);
    }

    #[test]
    fn test_asset_edit_reminds_about_cache_busting() {
        let t = TestEnv::new();
        let input = tool_event(
            "Edit",
            &json!({"file_path": "public/js/menu.js", "old_string": "a", "new_string": "b"}),
        );

        assert_eq!(run_cdn_version_hook(&input, &t.env()), HookOutcome::Allow);
        let message = t.sink.joined();
        assert!(message.contains("`public/js/menu.js` changed"));
        assert!(message.contains("?v="));
        assert!(!message.contains("Version-pinned CDN URLs"));
    }

    #[test]
    fn test_cdn_urls_in_html_are_listed() {
        let t = TestEnv::new();
        let input = tool_event(
            "Write",
            &json!({"file_path": "index.html", "content": "<script src=\"https://unpkg.com/vue@3.4.0\"></script>"}),
        );

        run_cdn_version_hook(&input, &t.env());
        let message = t.sink.joined();
        assert!(message.contains("  - https://unpkg.com/vue@3.4.0"));
        assert!(!message.contains("changed"));
    }

    #[test]
    fn test_minified_and_unrelated_edits_are_silent() {
        let t = TestEnv::new();
        run_cdn_version_hook(&tool_event("Write", &json!({"file_path": "app.min.js", "content": "x"})), &t.env());
        run_cdn_version_hook(&tool_event("Edit", &json!({"file_path": "README.md", "new_string": "y"})), &t.env());
        run_cdn_version_hook(&tool_event("Read", &json!({"file_path": "menu.js"})), &t.env());
        assert!(t.sink.is_empty());
    }
}
