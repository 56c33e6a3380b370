use bark_api::GitHubError;
use bark_store::StoreError;
use thiserror::Error;

/// All the ways a bark action can go wrong
///
/// Commands never swallow these; whoever invoked the command decides how
/// to show them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("GitHub request failed: {0}")]
    Api(#[from] GitHubError),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected bookmark row: {0}")]
    InvalidRow(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::Store(err) if err.is_constraint_violation())
    }
}
