use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Everything the table store can fail with
#[derive(Error, Debug)]
pub enum StoreError {
    /// A NOT NULL, CHECK or UNIQUE rule was broken, or a required field was missing
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Refusing to {0} without any column values")]
    EmptyCriteria(&'static str),

    #[error("Database error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, StoreError::ConstraintViolation(_))
    }
}

// Constraint failures get their own variant so callers can tell
// "bad data" apart from "broken database"
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| code.to_string());
                StoreError::ConstraintViolation(detail)
            }
            other => StoreError::Sqlite(other),
        }
    }
}
