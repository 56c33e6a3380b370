// SQLite-backed table store
// Every value goes through parameter binding; only validated identifiers
// ever reach the SQL text.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{Column, Row, TableStore};

// Re-exported so callers can build rows without depending on rusqlite directly
pub use rusqlite::types::Value;
