//! Command-line front end.
//!
//! Each subcommand invokes exactly one library operation and renders its
//! result or rejection. The CLI holds no state of its own: the library is
//! loaded from the data directory on start and saved by the operation.
//!
//! ## Configuration
//!
//! - `LIBRARY_DATA_DIR` - directory holding the JSON files (default: `.`)
//! - `LIBRARY_BOOKS_FILE`, `LIBRARY_USERS_FILE`, `LIBRARY_HISTORY_FILE` -
//!   file names inside the data directory

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use crate::{
    book::Book,
    config::{DEFAULT_BOOKS_FILE, DEFAULT_HISTORY_FILE, DEFAULT_USERS_FILE, StoreConfig},
    coordinator::LoanReceipt,
    error::LibraryError,
    events::LoanEvent,
    observers::NotificationService,
    persistence::{BookRecord, LoanEventRecord, UserRecord},
    system::Library,
    user::User,
    visualization::CatalogVisualization,
};

/// Library catalog manager
#[derive(Debug, Parser)]
#[command(name = "library-ledger")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the JSON files.
    #[arg(long, env = "LIBRARY_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Book records file name.
    #[arg(long, env = "LIBRARY_BOOKS_FILE", default_value = DEFAULT_BOOKS_FILE)]
    pub books_file: String,

    /// User records file name.
    #[arg(long, env = "LIBRARY_USERS_FILE", default_value = DEFAULT_USERS_FILE)]
    pub users_file: String,

    /// Loan history file name.
    #[arg(long, env = "LIBRARY_HISTORY_FILE", default_value = DEFAULT_HISTORY_FILE)]
    pub history_file: String,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Storage configuration from the flags
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.data_dir.clone(),
            books_file: self.books_file.clone(),
            users_file: self.users_file.clone(),
            history_file: self.history_file.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a book to the catalog.
    AddBook {
        /// Unique title.
        title: String,
        /// Physical location.
        location: String,
        /// Section.
        section: String,
    },
    /// Show one book.
    FindBook {
        /// Title to look up.
        title: String,
    },
    /// Remove a book that is not on loan.
    RemoveBook {
        /// Title to remove.
        title: String,
    },
    /// List books on the shelf.
    Available,
    /// List books on loan.
    Borrowed,
    /// List every book.
    Books,
    /// Register a user.
    AddUser {
        /// Positive integer id.
        #[arg(allow_negative_numbers = true)]
        user_id: i64,
        /// Display name.
        name: String,
    },
    /// Show one user.
    FindUser {
        /// Id to look up.
        #[arg(allow_negative_numbers = true)]
        user_id: i64,
    },
    /// List registered users.
    Users,
    /// Lend a book to a user.
    Borrow {
        /// Title to lend.
        title: String,
        /// Borrowing user.
        #[arg(allow_negative_numbers = true)]
        user_id: i64,
    },
    /// Take a book back from a user.
    Return {
        /// Title to return.
        title: String,
        /// Returning user.
        #[arg(allow_negative_numbers = true)]
        user_id: i64,
    },
    /// Show the loan history.
    History {
        /// Only events for this title.
        #[arg(long)]
        title: Option<String>,
    },
    /// Show summary counts.
    Stats,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// Open the library, run one command and print its result.
///
/// Domain rejections are printed and give exit status 1.
///
/// # Errors
///
/// Load and save failures.
pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.store_config();
    let mut library = Library::open(&config)
        .with_context(|| format!("failed to open library in {}", config.data_dir.display()))?;

    let notifier = NotificationService::new();
    let inbox = notifier.inbox();
    library.register_observer(Box::new(notifier));

    match execute(&mut library, cli.command, cli.format) {
        Ok(output) => {
            if cli.format == OutputFormat::Text {
                for notice in inbox.borrow().iter() {
                    println!("{}", notice.green());
                }
            }
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) if err.downcast_ref::<LibraryError>().is_some_and(LibraryError::is_recoverable) => {
            eprintln!("{} {err}", "error:".red().bold());
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

/// Dispatch one command and render its result
///
/// # Errors
///
/// The operation's `LibraryError`, or a JSON encoding failure.
pub fn execute(library: &mut Library, command: Commands, format: OutputFormat) -> Result<String> {
    let output = match command {
        Commands::AddBook { title, location, section } => {
            let book = library.add_book(&title, &location, &section)?;
            render_book(format, &book, "Book added:")?
        }
        Commands::FindBook { title } => {
            let book = library.find_book(title.trim())?;
            render_book(format, book, "Book found:")?
        }
        Commands::RemoveBook { title } => {
            let book = library.remove_book(title.trim())?;
            render_book(format, &book, "Book removed:")?
        }
        Commands::Available => {
            render_books(format, &library.list_available(), "No books are available right now.")?
        }
        Commands::Borrowed => {
            render_books(format, &library.list_borrowed(), "No books are on loan right now.")?
        }
        Commands::Books => render_books(format, &library.list_all(), "The catalog is empty.")?,
        Commands::AddUser { user_id, name } => {
            let user = library.register_user(user_id, &name)?;
            render_user(format, &user, "User registered:")?
        }
        Commands::FindUser { user_id } => {
            let user = library.find_user(user_id)?;
            render_user(format, user, "User found:")?
        }
        Commands::Users => {
            let users = library.list_users();
            let records: Vec<UserRecord> = users.iter().copied().map(UserRecord::from).collect();
            render(format, &records, || {
                format!("{}\n{}", "Registered users:".bold(), CatalogVisualization::user_list(&users))
            })?
        }
        Commands::Borrow { title, user_id } => {
            let receipt = library.borrow(title.trim(), user_id)?;
            render_receipt(format, &receipt)?
        }
        Commands::Return { title, user_id } => {
            let receipt = library.return_book(title.trim(), user_id)?;
            render_receipt(format, &receipt)?
        }
        Commands::History { title } => {
            let events: Vec<LoanEvent> = match title {
                Some(title) => library.ledger().events_for_title(title.trim()).cloned().collect(),
                None => library.history().to_vec(),
            };
            let records: Vec<LoanEventRecord> = events.iter().map(LoanEventRecord::from).collect();
            render(format, &records, || {
                format!("{}\n{}", "Loan history:".bold(), CatalogVisualization::history_table(&events))
            })?
        }
        Commands::Stats => {
            let stats = library.stats();
            render(format, &stats, || CatalogVisualization::stats(&stats))?
        }
    };
    Ok(output)
}

/// Pick JSON or text for a value
fn render<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce() -> String) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("failed to encode output"),
        OutputFormat::Text => Ok(text()),
    }
}

/// A single book with a heading
fn render_book(format: OutputFormat, book: &Book, heading: &str) -> Result<String> {
    render(format, &BookRecord::from(book), || {
        format!("{} {}", heading.bold(), CatalogVisualization::book_line(book))
    })
}

/// A list of books with an empty-list placeholder
fn render_books(format: OutputFormat, books: &[&Book], empty: &str) -> Result<String> {
    let records: Vec<BookRecord> = books.iter().copied().map(BookRecord::from).collect();
    render(format, &records, || CatalogVisualization::book_list(books, empty))
}

/// A single user with a heading
fn render_user(format: OutputFormat, user: &User, heading: &str) -> Result<String> {
    render(format, &UserRecord::from(user), || {
        format!("{} {}", heading.bold(), CatalogVisualization::user_line(user))
    })
}

/// The book after a loan transition
fn render_receipt(format: OutputFormat, receipt: &LoanReceipt) -> Result<String> {
    render(format, &LoanEventRecord::from(&receipt.event), || {
        CatalogVisualization::book_line(&receipt.book)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parse a command line and run it against `library`
    fn run_line(library: &mut Library, args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("library-ledger").chain(args.iter().copied()))?;
        execute(library, cli.command, cli.format)
    }

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from(["library-ledger", "--data-dir", "/tmp/lib", "--books-file", "b.json", "books"]);
        let config = cli.store_config();
        assert_eq!(config.books_path(), PathBuf::from("/tmp/lib/b.json"));
        assert_eq!(config.users_file, DEFAULT_USERS_FILE);
        assert!(matches!(cli.command, Commands::Books));
    }

    #[test]
    fn test_negative_ids_reach_the_core() {
        let mut library = Library::in_memory();
        let result = run_line(&mut library, &["add-user", "-4", "Ana"]);
        let err = result.err();
        assert!(matches!(
            err.as_ref().and_then(|e| e.downcast_ref::<LibraryError>()),
            Some(LibraryError::InvalidId { raw: -4 })
        ));
    }

    #[test]
    fn test_json_output_uses_record_shape() {
        colored::control::set_override(false);
        let mut library = Library::in_memory();
        assert!(run_line(&mut library, &["add-user", "1", "Ana"]).is_ok());
        assert!(run_line(&mut library, &["add-book", "Dune", "Shelf3", "SciFi"]).is_ok());
        assert!(run_line(&mut library, &["borrow", "Dune", "1"]).is_ok());

        let output = run_line(&mut library, &["--format", "json", "borrowed"]);
        let value: serde_json::Value = output
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        assert_eq!(value.pointer("/0/title").and_then(|v| v.as_str()), Some("Dune"));
        assert_eq!(value.pointer("/0/borrowed_by").and_then(|v| v.as_str()), Some("Ana"));

        let history = run_line(&mut library, &["history", "--title", "Dune"]);
        assert!(history.is_ok_and(|text| text.contains("| 1 | Borrowed | Dune | Ana (ID: 1) |")));
    }

    #[test]
    fn test_rejections_are_recoverable() {
        let mut library = Library::in_memory();
        let result = run_line(&mut library, &["return", "Dune", "1"]);
        let err = result.err();
        assert!(
            err.as_ref()
                .and_then(|e| e.downcast_ref::<LibraryError>())
                .is_some_and(LibraryError::is_recoverable)
        );
    }
}
