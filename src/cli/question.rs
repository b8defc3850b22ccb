//! Question CLI subcommands.

use clap::Subcommand;

/// Pending question commands.
///
/// Mark a question before asking it so the agent cannot carry on with
/// other tools until the user has been asked:
/// ```bash
/// hookgate question mark "Which auth provider?" --option Auth0 --option Cognito
/// ```
///
/// The question clears itself when the question tool runs, or stops
/// blocking once it is older than `pending_question_ttl_secs`.
#[derive(Subcommand, Debug, Clone)]
pub enum QuestionCommand {
    /// Record a pending question.
    Mark {
        /// The question text
        question: String,

        /// An answer option (repeatable)
        #[arg(short, long = "option")]
        options: Vec<String>,
    },

    /// Show the pending question, if one is active.
    Status,

    /// Clear the pending question.
    Clear,
}
