//! Error types for `hookgate`.

/// Errors that can occur while running hooks or managing hook state.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON parsing error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// A state key that cannot be used as a file name.
    #[error("Invalid state key: {0:?}")]
    InvalidStateKey(String),

    /// The configuration file is present but unusable.
    #[error("Config error: {0}")]
    Config(String),
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
