use anyhow::Context;
use bark_core::{
    AddBookmark, BookmarkDraft, BookmarkOrder, BookmarkRepository, Command, CommandInput,
    CommandOutput, Config, DeleteBookmark, ImportGitHubStars, ImportOptions, ListBookmarks,
    SqliteBookmarkRepository,
};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod menu;

#[derive(Parser)]
#[command(name = "bark")]
#[command(version, about = "Bookmarks in your terminal", long_about = None)]
struct Cli {
    /// SQLite file holding the bookmarks (overrides config and BARK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Without a subcommand bark starts the interactive menu
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a bookmark
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List bookmarks
    List {
        /// Sort field: date or title
        #[arg(long, default_value_t = BookmarkOrder::DateAdded)]
        by: BookmarkOrder,
    },
    /// Delete a bookmark by id
    Delete { id: i64 },
    /// Import a GitHub user's starred repositories
    ImportStars {
        /// GitHub user name
        username: String,
        /// Stamp bookmarks with the import time instead of when they were starred
        #[arg(long)]
        no_timestamps: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep the interactive screen quiet unless asked otherwise
    let default_filter = if cli.command.is_none() { "warn" } else { "bark=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load()?,
    };
    config.apply_env();
    if let Some(db) = cli.db {
        config.database.path = Some(db);
    }

    let db_path = config.database_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    // The one connection every command shares for the life of the process
    let repo: Arc<dyn BookmarkRepository> = Arc::new(
        SqliteBookmarkRepository::open(&db_path)
            .with_context(|| format!("Failed to open {}", db_path.display()))?,
    );
    tracing::debug!("Using database {}", db_path.display());

    let importer = ImportGitHubStars::from_config(repo.clone(), &config.github)?;

    match cli.command {
        None => {
            let options = menu::default_options(repo, importer);
            let stdin = io::stdin();
            let mut prompter = menu::Prompter::new(stdin.lock(), io::stdout());
            menu::run(&options, &mut prompter).await
        }
        Some(command) => run_command(command, repo, importer).await,
    }
}

async fn run_command(
    command: Commands,
    repo: Arc<dyn BookmarkRepository>,
    importer: ImportGitHubStars,
) -> anyhow::Result<()> {
    let (action, input, success_message): (Box<dyn Command>, CommandInput, Option<&str>) =
        match command {
            Commands::Add { title, url, notes } => (
                Box::new(AddBookmark::new(repo)),
                CommandInput::NewBookmark(BookmarkDraft {
                    title,
                    url,
                    notes,
                    added_at: None,
                }),
                Some("Bookmark added!"),
            ),
            Commands::List { by } => (
                Box::new(ListBookmarks::new(repo, by)),
                CommandInput::None,
                None,
            ),
            Commands::Delete { id } => (
                Box::new(DeleteBookmark::new(repo)),
                CommandInput::BookmarkNumber(id),
                Some("Bookmark deleted!"),
            ),
            Commands::ImportStars {
                username,
                no_timestamps,
            } => (
                Box::new(importer),
                CommandInput::GitHubImport(ImportOptions {
                    github_username: username,
                    preserve_timestamps: !no_timestamps,
                }),
                None,
            ),
        };

    let output = action.execute(input).await?;
    match (success_message, &output) {
        (Some(message), _) => println!("{}", message),
        (None, CommandOutput::Bookmarks(bookmarks)) => {
            for bookmark in bookmarks {
                println!("{}", menu::format_bookmark(bookmark));
            }
        }
        (None, other) => println!("{}", menu::render_output(other)),
    }

    Ok(())
}
