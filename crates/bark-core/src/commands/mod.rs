// User-facing actions behind one uniform `execute` contract
//
// The menu and the CLI only know about `Command`; each action decides what
// input it needs and what it hands back.
use async_trait::async_trait;

use crate::models::{Bookmark, BookmarkDraft, ImportOptions};
use crate::Result;

mod bookmarks;
mod import;

pub use bookmarks::{AddBookmark, DeleteBookmark, ListBookmarks, QuitCommand};
pub use import::ImportGitHubStars;

/// What a command gets to work with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandInput {
    None,
    NewBookmark(BookmarkDraft),
    /// Raw id as typed by the user
    BookmarkId(String),
    /// Id that is already a number
    BookmarkNumber(i64),
    GitHubImport(ImportOptions),
}

impl CommandInput {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandInput::None => "no input",
            CommandInput::NewBookmark(_) => "a new bookmark",
            CommandInput::BookmarkId(_) | CommandInput::BookmarkNumber(_) => "a bookmark id",
            CommandInput::GitHubImport(_) => "GitHub import options",
        }
    }
}

/// What a successful command hands back
///
/// Failure is the `Err` side of the `Result` that `execute` returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Empty,
    Bookmarks(Vec<Bookmark>),
    Message(String),
}

#[async_trait]
pub trait Command: Send + Sync {
    async fn execute(&self, input: CommandInput) -> Result<CommandOutput>;
}

fn wrong_input(command: &str, expected: &str, got: &CommandInput) -> crate::Error {
    crate::Error::InvalidInput(format!(
        "{} expects {}, got {}",
        command,
        expected,
        got.kind()
    ))
}
