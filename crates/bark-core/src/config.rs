use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from the config file, then overridden by env vars, then by CLI
/// flags. Priority: CLI > Env > File > Defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub github: GitHubConfig,
}

impl Config {
    /// Load config from the default location; no file means defaults
    pub fn load() -> crate::Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load config from an explicit file, which must exist
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Apply `BARK_DB` and `GITHUB_TOKEN` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env`](Self::apply_env) but with a custom lookup, so tests
    /// don't have to touch the real environment
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("BARK_DB").filter(|v| !v.trim().is_empty()) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(token) = lookup("GITHUB_TOKEN").filter(|v| !v.trim().is_empty()) {
            self.github.token = Some(token);
        }
    }

    /// Where the bookmark database lives
    ///
    /// Falls back to the platform data dir (XDG on Linux, AppData on Windows)
    /// and finally the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }

        dirs::data_dir()
            .map(|dir| dir.join("bark"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bookmarks.db")
    }

    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("bark").join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to `<data dir>/bark/bookmarks.db`
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GitHubConfig {
    /// GitHub personal access token, only needed for higher rate limits
    /// Get one at https://github.com/settings/tokens
    #[serde(default)]
    pub token: Option<String>,

    /// API URL (for GitHub Enterprise)
    #[serde(default = "default_github_url")]
    pub api_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How often a page fetch is retried on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_github_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_github_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert_eq!(config.github.timeout_secs, 30);
        assert_eq!(config.github.max_retries, 3);
        assert!(config.github.token.is_none());
        assert!(config.database_path().ends_with("bookmarks.db"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [github]
            token = "ghp_abc"
            "#,
        )
        .unwrap();

        assert_eq!(config.github.token.as_deref(), Some("ghp_abc"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = Config::from_toml("github = 3").unwrap_err();
        assert!(matches!(err, crate::Error::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml(
            r#"
            [database]
            path = "/tmp/from-file.db"
            "#,
        )
        .unwrap();

        config.apply_overrides(|key| match key {
            "BARK_DB" => Some("/tmp/from-env.db".to_string()),
            "GITHUB_TOKEN" => Some(String::new()),
            _ => None,
        });

        assert_eq!(config.database_path(), PathBuf::from("/tmp/from-env.db"));
        // Blank values don't clobber anything
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("api_url"));
        assert!(toml.contains("timeout_secs"));
    }
}
