// Bookmark domain logic: repository, commands and the GitHub star importer
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod repo;

pub use commands::{
    AddBookmark, Command, CommandInput, CommandOutput, DeleteBookmark, ImportGitHubStars,
    ListBookmarks, QuitCommand,
};
pub use config::Config;
pub use error::Error;
pub use models::{Bookmark, BookmarkDraft, BookmarkOrder, ImportOptions, NewBookmark};
pub use repo::{BookmarkRepository, SqliteBookmarkRepository};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
