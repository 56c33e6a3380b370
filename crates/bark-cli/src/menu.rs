// Interactive menu: pick an action by letter, answer its prompts, see the result
use bark_core::{
    AddBookmark, Bookmark, BookmarkDraft, BookmarkRepository, Command, CommandInput,
    CommandOutput, DeleteBookmark, ImportGitHubStars, ImportOptions, ListBookmarks, QuitCommand,
};
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// What an option needs to ask before its command can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Nothing,
    NewBookmark,
    BookmarkId,
    GitHubImport,
}

pub struct MenuOption {
    pub shortcut: char,
    pub name: &'static str,
    pub command: Box<dyn Command>,
    pub prompt: Prompt,
    /// Shown on success instead of the command's own output
    pub success_message: Option<&'static str>,
}

/// The six actions, in menu order
pub fn default_options(
    repo: Arc<dyn BookmarkRepository>,
    importer: ImportGitHubStars,
) -> Vec<MenuOption> {
    vec![
        MenuOption {
            shortcut: 'A',
            name: "Add a bookmark",
            command: Box::new(AddBookmark::new(repo.clone())),
            prompt: Prompt::NewBookmark,
            success_message: Some("Bookmark added!"),
        },
        MenuOption {
            shortcut: 'B',
            name: "List all bookmarks sorted by date",
            command: Box::new(ListBookmarks::by_date(repo.clone())),
            prompt: Prompt::Nothing,
            success_message: None,
        },
        MenuOption {
            shortcut: 'T',
            name: "List all bookmarks sorted by title",
            command: Box::new(ListBookmarks::by_title(repo.clone())),
            prompt: Prompt::Nothing,
            success_message: None,
        },
        MenuOption {
            shortcut: 'D',
            name: "Delete a bookmark",
            command: Box::new(DeleteBookmark::new(repo)),
            prompt: Prompt::BookmarkId,
            success_message: Some("Bookmark deleted!"),
        },
        MenuOption {
            shortcut: 'G',
            name: "Import GitHub stars",
            command: Box::new(importer),
            prompt: Prompt::GitHubImport,
            success_message: None,
        },
        MenuOption {
            shortcut: 'Q',
            name: "Quit",
            command: Box::new(QuitCommand),
            prompt: Prompt::Nothing,
            success_message: None,
        },
    ]
}

/// Line-based prompting over any reader/writer pair
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask once; empty answers come back as `None`
    ///
    /// Closed input is reported as `UnexpectedEof` so the menu can stop.
    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}: ", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        let answer = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        Ok(if answer.is_empty() {
            None
        } else {
            Some(answer.to_string())
        })
    }

    /// Keep asking until we get something
    pub fn required(&mut self, label: &str) -> io::Result<String> {
        loop {
            if let Some(answer) = self.ask(label)? {
                return Ok(answer);
            }
        }
    }

    pub fn optional(&mut self, label: &str) -> io::Result<Option<String>> {
        self.ask(label)
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }
}

/// Match a typed choice against the shortcuts, ignoring case
fn find_option<'a>(choice: &str, options: &'a [MenuOption]) -> Option<&'a MenuOption> {
    let mut chars = choice.trim().chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    options
        .iter()
        .find(|option| option.shortcut.eq_ignore_ascii_case(&letter))
}

pub fn get_option_choice<'a, R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    options: &'a [MenuOption],
) -> io::Result<&'a MenuOption> {
    loop {
        let choice = prompter.ask("Choose an action")?.unwrap_or_default();
        if let Some(option) = find_option(&choice, options) {
            return Ok(option);
        }
        writeln!(prompter.output(), "Unacceptable option")?;
    }
}

pub fn print_options<W: Write>(out: &mut W, options: &[MenuOption]) -> io::Result<()> {
    for option in options {
        writeln!(out, "({}) {}", option.shortcut, option.name)?;
    }
    writeln!(out)
}

/// Gather whatever the chosen option needs from the user
pub fn collect_input<R: BufRead, W: Write>(
    prompt: Prompt,
    prompter: &mut Prompter<R, W>,
) -> io::Result<CommandInput> {
    Ok(match prompt {
        Prompt::Nothing => CommandInput::None,
        Prompt::NewBookmark => {
            let title = prompter.required("Title")?;
            let url = prompter.required("URL")?;
            let notes = prompter.optional("Notes")?;
            CommandInput::NewBookmark(BookmarkDraft {
                title,
                url,
                notes,
                added_at: None,
            })
        }
        Prompt::BookmarkId => {
            CommandInput::BookmarkId(prompter.required("Enter a bookmark ID to delete")?)
        }
        Prompt::GitHubImport => {
            let github_username = prompter.required("GitHub user name")?;
            let answer = prompter.optional("Save timestamps? [Y/y]")?;
            CommandInput::GitHubImport(ImportOptions {
                github_username,
                preserve_timestamps: wants_timestamps(answer.as_deref()),
            })
        }
    })
}

/// Anything but an explicit `Y`/`y` (or just ENTER) means no
pub fn wants_timestamps(answer: Option<&str>) -> bool {
    matches!(answer, None | Some("Y") | Some("y"))
}

/// One bookmark per line, tab separated, empty cells for missing notes
pub fn format_bookmark(bookmark: &Bookmark) -> String {
    [
        bookmark.id.to_string(),
        bookmark.title.clone(),
        bookmark.url.clone(),
        bookmark.notes.clone().unwrap_or_default(),
        bookmark.date_added.clone(),
    ]
    .join("\t")
}

pub fn render_output(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Empty => String::new(),
        CommandOutput::Message(message) => message.clone(),
        CommandOutput::Bookmarks(bookmarks) => bookmarks
            .iter()
            .map(|bookmark| format!("\n{}", format_bookmark(bookmark)))
            .collect(),
    }
}

fn clear_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Clear(ClearType::All), MoveTo(0, 0))
}

/// Run the menu until the user quits or input runs out
pub async fn run<R: BufRead, W: Write>(
    options: &[MenuOption],
    prompter: &mut Prompter<R, W>,
) -> anyhow::Result<()> {
    loop {
        match run_once(options, prompter).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                tracing::debug!("Input closed, leaving menu");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
}

async fn run_once<R: BufRead, W: Write>(
    options: &[MenuOption],
    prompter: &mut Prompter<R, W>,
) -> io::Result<()> {
    clear_screen(prompter.output())?;
    print_options(prompter.output(), options)?;

    let option = get_option_choice(prompter, options)?;
    clear_screen(prompter.output())?;

    let input = collect_input(option.prompt, prompter)?;
    match option.command.execute(input).await {
        Ok(output) => {
            let message = match option.success_message {
                Some(message) => message.to_string(),
                None => render_output(&output),
            };
            writeln!(prompter.output(), "{}", message)?;
        }
        Err(err) => {
            tracing::warn!("{} failed: {}", option.name, err);
            writeln!(prompter.output(), "Error: {}", err)?;
        }
    }

    prompter.ask("Press ENTER to return to the menu")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bark_core::SqliteBookmarkRepository;
    use std::io::Cursor;

    fn options() -> Vec<MenuOption> {
        let repo: Arc<dyn BookmarkRepository> =
            Arc::new(SqliteBookmarkRepository::in_memory().unwrap());
        let importer = ImportGitHubStars::from_config(repo.clone(), &Default::default()).unwrap();
        default_options(repo, importer)
    }

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn written(prompter: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.output).unwrap()
    }

    #[test]
    fn test_choice_is_case_insensitive() {
        let options = options();
        let option_choice_is_valid = |choice: &str, options: &[MenuOption]| {
            find_option(choice, options).is_some()
        };
        assert!(option_choice_is_valid("a", &options));
        assert!(option_choice_is_valid("G", &options));
        assert!(option_choice_is_valid(" t \n", &options));
        assert!(!option_choice_is_valid("x", &options));
        assert!(!option_choice_is_valid("AB", &options));
        assert!(!option_choice_is_valid("", &options));
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let options = options();
        let mut p = prompter("z\n\nd\n");

        let chosen = get_option_choice(&mut p, &options).unwrap();
        assert_eq!(chosen.shortcut, 'D');
        assert_eq!(written(p).matches("Unacceptable option").count(), 2);
    }

    #[test]
    fn test_required_prompt_repeats_until_answered() {
        let mut p = prompter("\n\nRust\n");
        assert_eq!(p.required("Title").unwrap(), "Rust");
        assert_eq!(written(p).matches("Title: ").count(), 3);
    }

    #[test]
    fn test_new_bookmark_prompts() {
        let mut p = prompter("Rust\nhttps://rust-lang.org\n\n");
        let input = collect_input(Prompt::NewBookmark, &mut p).unwrap();
        assert_eq!(
            input,
            CommandInput::NewBookmark(BookmarkDraft::new("Rust", "https://rust-lang.org"))
        );
    }

    #[test]
    fn test_import_prompts() {
        let mut p = prompter("octocat\nn\n");
        let input = collect_input(Prompt::GitHubImport, &mut p).unwrap();
        assert_eq!(
            input,
            CommandInput::GitHubImport(ImportOptions {
                github_username: "octocat".to_string(),
                preserve_timestamps: false,
            })
        );
    }

    #[test]
    fn test_timestamp_answer() {
        assert!(wants_timestamps(None));
        assert!(wants_timestamps(Some("y")));
        assert!(wants_timestamps(Some("Y")));
        assert!(!wants_timestamps(Some("n")));
        assert!(!wants_timestamps(Some("yes")));
    }

    #[test]
    fn test_closed_input_is_eof() {
        let mut p = prompter("");
        let err = p.required("Title").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_format_bookmark_leaves_missing_notes_empty() {
        let bookmark = Bookmark {
            id: 7,
            title: "Rust".to_string(),
            url: "https://rust-lang.org".to_string(),
            notes: None,
            date_added: "2024-01-01T00:00:00.000000Z".to_string(),
        };
        assert_eq!(
            format_bookmark(&bookmark),
            "7\tRust\thttps://rust-lang.org\t\t2024-01-01T00:00:00.000000Z"
        );
    }

    #[tokio::test]
    async fn test_menu_adds_and_lists_then_stops_at_eof() {
        let options = options();
        let mut p = prompter("a\nRust\nhttps://rust-lang.org\nsystems\n\nT\n\n");

        run(&options, &mut p).await.unwrap();

        let out = written(p);
        assert!(out.contains("(A) Add a bookmark"));
        assert!(out.contains("Bookmark added!"));
        assert!(out.contains("\tRust\thttps://rust-lang.org\tsystems\t"));
    }

    #[tokio::test]
    async fn test_menu_reports_errors_and_keeps_going() {
        let options = options();
        let mut p = prompter("d\nnot-a-number\n\nb\n\n");

        run(&options, &mut p).await.unwrap();

        let out = written(p);
        assert!(out.contains("Error: Invalid input"));
    }
}
