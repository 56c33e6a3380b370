use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::{wrong_input, Command, CommandInput, CommandOutput};
use crate::models::{format_timestamp, BookmarkDraft, BookmarkOrder, NewBookmark};
use crate::repo::BookmarkRepository;
use crate::{Error, Result};

/// Save a new bookmark, stamped with the given time or now
pub struct AddBookmark {
    repo: Arc<dyn BookmarkRepository>,
}

impl AddBookmark {
    pub fn new(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self { repo }
    }

    /// The add path shared by `execute` and the star importer
    pub fn add(&self, draft: BookmarkDraft) -> Result<i64> {
        let date_added = format_timestamp(draft.added_at.unwrap_or_else(Utc::now));

        self.repo.create(&NewBookmark {
            title: draft.title,
            url: draft.url,
            notes: draft.notes,
            date_added,
        })
    }
}

#[async_trait]
impl Command for AddBookmark {
    async fn execute(&self, input: CommandInput) -> Result<CommandOutput> {
        match input {
            CommandInput::NewBookmark(draft) => {
                let id = self.add(draft)?;
                info!(id, "Bookmark added");
                Ok(CommandOutput::Empty)
            }
            other => Err(wrong_input("add", "a new bookmark", &other)),
        }
    }
}

/// Every bookmark, sorted by a fixed field
pub struct ListBookmarks {
    repo: Arc<dyn BookmarkRepository>,
    order: BookmarkOrder,
}

impl ListBookmarks {
    pub fn new(repo: Arc<dyn BookmarkRepository>, order: BookmarkOrder) -> Self {
        Self { repo, order }
    }

    pub fn by_date(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self::new(repo, BookmarkOrder::DateAdded)
    }

    pub fn by_title(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self::new(repo, BookmarkOrder::Title)
    }
}

#[async_trait]
impl Command for ListBookmarks {
    // Input is ignored; listing needs nothing from the user
    async fn execute(&self, _input: CommandInput) -> Result<CommandOutput> {
        Ok(CommandOutput::Bookmarks(self.repo.list(self.order)?))
    }
}

/// Remove a bookmark by id; succeeds whether or not it existed
///
/// Takes the id as text (trimmed, then parsed) or as a number.
pub struct DeleteBookmark {
    repo: Arc<dyn BookmarkRepository>,
}

impl DeleteBookmark {
    pub fn new(repo: Arc<dyn BookmarkRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl Command for DeleteBookmark {
    async fn execute(&self, input: CommandInput) -> Result<CommandOutput> {
        let id = match input {
            CommandInput::BookmarkNumber(id) => id,
            CommandInput::BookmarkId(raw) => parse_id(&raw)?,
            other => return Err(wrong_input("delete", "a bookmark id", &other)),
        };

        self.repo.delete(id)?;
        info!(id, "Bookmark deleted");
        Ok(CommandOutput::Empty)
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    raw.parse().map_err(|_| Error::InvalidInput(format!("'{}' is not a bookmark id", raw)))
}

/// Leave the program. Never returns.
pub struct QuitCommand;

#[async_trait]
impl Command for QuitCommand {
    async fn execute(&self, _input: CommandInput) -> Result<CommandOutput> {
        info!("Quitting");
        std::process::exit(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{MockBookmarkRepository, SqliteBookmarkRepository};
    use chrono::{DateTime, Duration, TimeZone};
    use mockall::predicate::eq;

    fn sqlite_repo() -> Arc<SqliteBookmarkRepository> {
        Arc::new(SqliteBookmarkRepository::in_memory().unwrap())
    }

    fn draft(title: &str) -> CommandInput {
        let url = format!("https://example.com/{}", title);
        CommandInput::NewBookmark(BookmarkDraft::new(title, url))
    }

    #[tokio::test]
    async fn test_add_stamps_current_time_by_default() {
        let repo = sqlite_repo();
        let add = AddBookmark::new(repo.clone());

        let before = Utc::now();
        let output = add.execute(draft("now")).await.unwrap();
        let after = Utc::now();
        assert_eq!(output, CommandOutput::Empty);

        let saved = repo.list(BookmarkOrder::DateAdded).unwrap();
        let stamped = DateTime::parse_from_rfc3339(&saved[0].date_added)
            .unwrap()
            .with_timezone(&Utc);
        assert!(stamped >= before - Duration::seconds(1), "{} < {}", stamped, before);
        assert!(stamped <= after + Duration::seconds(1), "{} > {}", stamped, after);
    }

    #[tokio::test]
    async fn test_add_keeps_explicit_timestamp() {
        let repo = sqlite_repo();
        let add = AddBookmark::new(repo.clone());
        let when = Utc.with_ymd_and_hms(2015, 5, 15, 10, 0, 0).unwrap();

        add.execute(CommandInput::NewBookmark(
            BookmarkDraft::new("rust 1.0", "https://blog.rust-lang.org")
                .with_notes("release day")
                .added_at(when),
        ))
        .await
        .unwrap();

        let saved = repo.list(BookmarkOrder::DateAdded).unwrap();
        assert_eq!(saved[0].date_added, "2015-05-15T10:00:00.000000Z");
        assert_eq!(saved[0].notes.as_deref(), Some("release day"));
    }

    #[tokio::test]
    async fn test_add_without_title_fails_and_writes_nothing() {
        let repo = sqlite_repo();
        let add = AddBookmark::new(repo.clone());

        let err = add.execute(draft("")).await.unwrap_err();
        assert!(err.is_constraint_violation());
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_add_rejects_wrong_input() {
        let add = AddBookmark::new(sqlite_repo());
        let err = add.execute(CommandInput::None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_list_variants_use_their_order() {
        let repo = sqlite_repo();
        let add = AddBookmark::new(repo.clone());
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for (offset, title) in ["beta", "alpha", "gamma"].iter().enumerate() {
            add.add(
                BookmarkDraft::new(*title, "https://example.com")
                    .added_at(base + Duration::days(offset as i64)),
            )
            .unwrap();
        }

        let titles = |output: CommandOutput| match output {
            CommandOutput::Bookmarks(list) => list.into_iter().map(|b| b.title).collect::<Vec<_>>(),
            other => panic!("expected bookmarks, got {:?}", other),
        };

        let by_date = ListBookmarks::by_date(repo.clone());
        assert_eq!(
            titles(by_date.execute(CommandInput::None).await.unwrap()),
            vec!["beta", "alpha", "gamma"]
        );

        let by_title = ListBookmarks::by_title(repo.clone());
        assert_eq!(
            titles(by_title.execute(CommandInput::None).await.unwrap()),
            vec!["alpha", "beta", "gamma"]
        );
    }

    #[tokio::test]
    async fn test_delete_parses_text_id() {
        let mut mock = MockBookmarkRepository::new();
        mock.expect_delete().with(eq(42)).times(1).returning(|_| Ok(()));

        let delete = DeleteBookmark::new(Arc::new(mock));
        let output = delete
            .execute(CommandInput::BookmarkId(" 42\n".to_string()))
            .await
            .unwrap();
        assert_eq!(output, CommandOutput::Empty);
    }

    #[tokio::test]
    async fn test_delete_takes_numeric_id() {
        let mut mock = MockBookmarkRepository::new();
        mock.expect_delete().with(eq(7)).times(1).returning(|_| Ok(()));

        let delete = DeleteBookmark::new(Arc::new(mock));
        let output = delete.execute(CommandInput::BookmarkNumber(7)).await.unwrap();
        assert_eq!(output, CommandOutput::Empty);
    }

    #[tokio::test]
    async fn test_delete_rejects_non_numeric_id() {
        let mut mock = MockBookmarkRepository::new();
        mock.expect_delete().never();

        let delete = DeleteBookmark::new(Arc::new(mock));
        let err = delete
            .execute(CommandInput::BookmarkId("abc".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_bookmark_still_succeeds() {
        let repo = sqlite_repo();
        AddBookmark::new(repo.clone()).add(BookmarkDraft::new("keep", "https://keep")).unwrap();

        let delete = DeleteBookmark::new(repo.clone());
        let output = delete
            .execute(CommandInput::BookmarkId("9999".to_string()))
            .await
            .unwrap();

        assert_eq!(output, CommandOutput::Empty);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut mock = MockBookmarkRepository::new();
        mock.expect_list().returning(|_| {
            Err(Error::Store(bark_store::StoreError::ConstraintViolation(
                "boom".to_string(),
            )))
        });

        let list = ListBookmarks::by_title(Arc::new(mock));
        assert!(list.execute(CommandInput::None).await.is_err());
    }
}
