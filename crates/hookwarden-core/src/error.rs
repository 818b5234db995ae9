use thiserror::Error;

/// A convenience `Result` alias using [`HookwardenError`].
pub type HookwardenResult<T> = Result<T, HookwardenError>;

/// Top-level error type for hookwarden.
///
/// None of these ever reach the host: the mediator treats every variant as
/// "no information available" and falls back to a silent allow.
#[derive(Error, Debug)]
pub enum HookwardenError {
    /// Settings or filter file could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// A block rule failed to compile.
    #[error("Guard error: {0}")]
    Guard(String),

    /// The external search program could not be run.
    #[error("Search error: {0}")]
    Search(String),

    /// The web pre-fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// An audit record could not be appended.
    #[error("Audit error: {0}")]
    Audit(String),

    /// A JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
