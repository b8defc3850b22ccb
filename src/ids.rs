//! Agent ID generation.
//!
//! IDs look like `agent-<slug>-<hex>`: the slug keeps them readable in
//! logs, the hex suffix keeps two agents with the same description apart.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Longest slug kept in an agent ID.
const MAX_SLUG_LEN: usize = 32;

/// Lowercase ASCII words joined by single hyphens, at most `max_len` bytes.
#[must_use]
pub fn slugify(text: &str, max_len: usize) -> String {
    let mut slug = String::with_capacity(text.len().min(max_len + 1));
    let mut pending_hyphen = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
        if slug.len() >= max_len {
            break;
        }
    }

    slug.truncate(max_len);
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Six hex characters of per-process randomness.
#[allow(clippy::cast_possible_truncation)] // Only the low bits are used
fn random_suffix() -> String {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64),
    );
    hasher.write_u32(std::process::id());
    format!("{:06x}", hasher.finish() & 0x00FF_FFFF)
}

/// Build an agent ID from a description and an explicit suffix.
#[must_use]
pub fn agent_id_with_suffix(description: &str, suffix: &str) -> String {
    let slug = slugify(description, MAX_SLUG_LEN);
    if slug.is_empty() {
        format!("agent-{suffix}")
    } else {
        format!("agent-{slug}-{suffix}")
    }
}

/// Generate a fresh agent ID for a dispatched task.
#[must_use]
pub fn generate_agent_id(description: &str) -> String {
    agent_id_with_suffix(description, &random_suffix())
}
