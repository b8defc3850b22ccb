//! Scope CLI subcommands.

use clap::Subcommand;

/// Task scope commands.
#[derive(Subcommand, Debug, Clone)]
pub enum ScopeCommand {
    /// Record how many files the current task is expected to touch.
    ///
    /// The scope-growth hook warns once the edited files exceed this count
    /// by more than `scope_growth_threshold`.
    Init {
        /// Expected number of files
        file_count: usize,
    },

    /// Show edited files against the recorded scope.
    Status,
}
