// Bookmark persistence: the capability set commands rely on, plus its SQLite backing
use bark_store::{Column, Row, StoreError, TableStore, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::models::{Bookmark, BookmarkOrder, NewBookmark};
use crate::{Error, Result};

const TABLE: &str = "bookmarks";

const BOOKMARK_COLUMNS: &[Column<'static>] = &[
    ("id", "INTEGER PRIMARY KEY AUTOINCREMENT"),
    ("title", "TEXT NOT NULL"),
    ("url", "TEXT NOT NULL"),
    ("notes", "TEXT"),
    ("date_added", "TEXT NOT NULL"),
];

/// Storage backend for bookmarks
///
/// Anything that can create, list and delete bookmarks can stand in here;
/// commands only ever see this trait.
#[cfg_attr(test, mockall::automock)]
pub trait BookmarkRepository: Send + Sync {
    /// Make sure the backing table exists. Safe to call on every startup.
    fn initialize(&self) -> Result<()>;

    /// Store a bookmark and return its freshly assigned id
    fn create(&self, bookmark: &NewBookmark) -> Result<i64>;

    fn list(&self, order: BookmarkOrder) -> Result<Vec<Bookmark>>;

    /// Remove a bookmark. A missing id is not an error.
    fn delete(&self, id: i64) -> Result<()>;
}

/// Bookmarks kept in the `bookmarks` table of a [`TableStore`]
pub struct SqliteBookmarkRepository {
    store: Arc<TableStore>,
}

impl SqliteBookmarkRepository {
    pub fn new(store: Arc<TableStore>) -> Self {
        Self { store }
    }

    /// Open the store at `path` and make sure the table is there
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let repo = Self::new(Arc::new(TableStore::open(path)?));
        repo.initialize()?;
        Ok(repo)
    }

    /// In-memory repository, ready to use
    pub fn in_memory() -> Result<Self> {
        let repo = Self::new(Arc::new(TableStore::open_in_memory()?));
        repo.initialize()?;
        Ok(repo)
    }

    pub fn count(&self) -> Result<u64> {
        Ok(self.store.count(TABLE)?)
    }
}

impl BookmarkRepository for SqliteBookmarkRepository {
    fn initialize(&self) -> Result<()> {
        self.store.create_table(TABLE, BOOKMARK_COLUMNS)?;
        info!(table = TABLE, "Bookmark table ready");
        Ok(())
    }

    fn create(&self, bookmark: &NewBookmark) -> Result<i64> {
        // SQLite's NOT NULL happily accepts "", so blank fields are caught here
        // before anything is written.
        require("title", &bookmark.title)?;
        require("url", &bookmark.url)?;
        require("date_added", &bookmark.date_added)?;

        let notes = match &bookmark.notes {
            Some(notes) => Value::Text(notes.clone()),
            None => Value::Null,
        };

        let id = self.store.insert(
            TABLE,
            &[
                ("title", Value::Text(bookmark.title.clone())),
                ("url", Value::Text(bookmark.url.clone())),
                ("notes", notes),
                ("date_added", Value::Text(bookmark.date_added.clone())),
            ],
        )?;

        debug!(id, title = %bookmark.title, "Created bookmark");
        Ok(id)
    }

    fn list(&self, order: BookmarkOrder) -> Result<Vec<Bookmark>> {
        self.store
            .select(TABLE, &[], Some(order.column()))?
            .into_iter()
            .map(bookmark_from_row)
            .collect()
    }

    fn delete(&self, id: i64) -> Result<()> {
        let removed = self.store.delete(TABLE, &[("id", Value::Integer(id))])?;
        debug!(id, removed, "Deleted bookmark");
        Ok(())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::ConstraintViolation(format!("{} is required", field)).into());
    }
    Ok(())
}

fn bookmark_from_row(row: Row) -> Result<Bookmark> {
    let mut values = row.into_iter();
    let mut next = |column: &str| {
        values
            .next()
            .ok_or_else(|| Error::InvalidRow(format!("missing column {}", column)))
    };

    let id = match next("id")? {
        Value::Integer(id) => id,
        other => return Err(unexpected("id", &other)),
    };
    let title = text(next("title")?, "title")?;
    let url = text(next("url")?, "url")?;
    let notes = match next("notes")? {
        Value::Null => None,
        Value::Text(notes) => Some(notes),
        other => return Err(unexpected("notes", &other)),
    };
    let date_added = text(next("date_added")?, "date_added")?;

    Ok(Bookmark {
        id,
        title,
        url,
        notes,
        date_added,
    })
}

fn text(value: Value, column: &str) -> Result<String> {
    match value {
        Value::Text(text) => Ok(text),
        other => Err(unexpected(column, &other)),
    }
}

fn unexpected(column: &str, value: &Value) -> Error {
    Error::InvalidRow(format!("column {} holds {:?}", column, value))
}
