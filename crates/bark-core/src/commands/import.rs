// Pulls a user's GitHub stars in as bookmarks, one page at a time
use async_trait::async_trait;
use bark_api::{GitHubClient, RetryConfig, StarredRepo};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{wrong_input, AddBookmark, Command, CommandInput, CommandOutput};
use crate::config::GitHubConfig;
use crate::models::{BookmarkDraft, ImportOptions};
use crate::repo::BookmarkRepository;
use crate::{Error, Result};

/// Format GitHub uses for `starred_at`
const STARRED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Import every starred repo of a GitHub user
///
/// Each star goes through the regular add path as its own insert. There is
/// no surrounding transaction: if a page fails halfway through an import,
/// everything added before it stays.
pub struct ImportGitHubStars {
    add: AddBookmark,
    client: GitHubClient,
}

impl ImportGitHubStars {
    pub fn new(repo: Arc<dyn BookmarkRepository>, client: GitHubClient) -> Self {
        Self {
            add: AddBookmark::new(repo),
            client,
        }
    }

    /// Build the GitHub client from config (token, API URL, timeout, retries)
    pub fn from_config(repo: Arc<dyn BookmarkRepository>, config: &GitHubConfig) -> Result<Self> {
        let client = GitHubClient::with_base_url(
            config.token.clone(),
            config.api_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_retry_config(RetryConfig {
            max_retries: config.max_retries,
            ..RetryConfig::default()
        });

        Ok(Self::new(repo, client))
    }

    /// Run the import and return how many bookmarks were added
    pub async fn import(&self, options: &ImportOptions) -> Result<usize> {
        let username = options.github_username.trim();
        if username.is_empty() {
            return Err(Error::InvalidInput("GitHub user name is required".to_string()));
        }

        info!(
            username,
            preserve_timestamps = options.preserve_timestamps,
            "Importing GitHub stars"
        );

        let mut imported = 0;
        let mut next_page = Some(self.client.starred_url(username));

        while let Some(url) = next_page {
            let page = self.client.starred_page(&url).await?;

            for star in page.stars {
                let added_at = if options.preserve_timestamps {
                    Some(parse_starred_at(&star.starred_at)?)
                } else {
                    None
                };

                let id = self.add.add(draft_from_star(star, added_at))?;
                imported += 1;
                debug!(id, imported, "Imported star");
            }

            next_page = page.next;
        }

        info!(username, imported, "GitHub star import finished");
        Ok(imported)
    }
}

#[async_trait]
impl Command for ImportGitHubStars {
    async fn execute(&self, input: CommandInput) -> Result<CommandOutput> {
        let options = match input {
            CommandInput::GitHubImport(options) => options,
            other => return Err(wrong_input("import", "GitHub import options", &other)),
        };

        let bookmarks_imported = self.import(&options).await?;
        Ok(CommandOutput::Message(format!(
            "Imported {} bookmarks from the starred repo!",
            bookmarks_imported
        )))
    }
}

fn draft_from_star(star: StarredRepo, added_at: Option<DateTime<Utc>>) -> BookmarkDraft {
    BookmarkDraft {
        title: star.repo.name,
        url: star.repo.html_url,
        notes: star.repo.description,
        added_at,
    }
}

fn parse_starred_at(raw: &str) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw, STARRED_AT_FORMAT)
        .map_err(|e| Error::ParseError(format!("starred_at '{}': {}", raw, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_starred_at() {
        let parsed = parse_starred_at("2021-02-03T04:05:06Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2021, 2, 3, 4, 5, 6).unwrap());
    }

    #[test]
    fn test_parse_starred_at_rejects_other_formats() {
        assert!(matches!(
            parse_starred_at("2021-02-03 04:05:06"),
            Err(Error::ParseError(_))
        ));
        assert!(parse_starred_at("yesterday").is_err());
    }

    #[test]
    fn test_draft_takes_repo_fields() {
        let star: StarredRepo = serde_json::from_value(serde_json::json!({
            "starred_at": "2021-02-03T04:05:06Z",
            "repo": {
                "name": "ripgrep",
                "html_url": "https://github.com/BurntSushi/ripgrep",
                "description": "fast grep"
            }
        }))
        .unwrap();

        let draft = draft_from_star(star, None);
        assert_eq!(draft.title, "ripgrep");
        assert_eq!(draft.url, "https://github.com/BurntSushi/ripgrep");
        assert_eq!(draft.notes.as_deref(), Some("fast grep"));
        assert!(draft.added_at.is_none());
    }

    #[tokio::test]
    async fn test_blank_username_is_rejected() {
        let repo = Arc::new(crate::repo::SqliteBookmarkRepository::in_memory().unwrap());
        let importer = ImportGitHubStars::new(repo, GitHubClient::new(None).unwrap());

        let err = importer
            .execute(CommandInput::GitHubImport(ImportOptions {
                github_username: "  ".to_string(),
                preserve_timestamps: true,
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
