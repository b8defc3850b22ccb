//! # `hookgate`
//!
//! Guard hooks for agentic coding sessions: a pending-question gate, a
//! verification-claim gate, a handful of advisory hooks, and the TTL state
//! store they coordinate through.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod hook_logging;
pub mod hooks;
pub mod ids;
pub mod output;
pub mod paths;
pub mod storage;
pub mod templates;
pub mod testing;
pub mod traits;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
