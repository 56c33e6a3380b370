// GitHub API client used by the star importer
pub mod github;
pub mod link;
pub mod retry;

// Re-export common types
pub use github::{GitHubClient, GitHubError, GitHubRepo, StarPage, StarredRepo};
pub use link::next_page_url;
pub use retry::RetryConfig;
