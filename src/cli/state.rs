//! State CLI subcommands.

use clap::Subcommand;

/// Named state management commands.
///
/// Each state is a small JSON file in the state directory. States expire by
/// age: every read takes a TTL, and a state older than its TTL reads as
/// absent even though its file may still exist.
#[derive(Subcommand, Debug, Clone)]
pub enum StateCommand {
    /// Store a state, replacing any previous value.
    Write {
        /// State key (a plain file name)
        key: String,

        /// JSON payload; text that is not JSON is stored as a string
        #[arg(short, long)]
        payload: Option<String>,
    },

    /// Exit 0 if an unexpired state exists, 1 otherwise.
    Check {
        /// State key
        key: String,

        /// Maximum age in seconds
        #[arg(short, long, default_value_t = 300)]
        ttl: u64,
    },

    /// Print the payload of an unexpired state.
    Read {
        /// State key
        key: String,

        /// Maximum age in seconds
        #[arg(short, long, default_value_t = 300)]
        ttl: u64,
    },

    /// Delete a state. Deleting a missing state succeeds.
    Clear {
        /// State key
        key: String,
    },

    /// List stored states with their ages.
    List,
}
