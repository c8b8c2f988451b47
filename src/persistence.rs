//! JSON files backing the catalog, the directory and the ledger.
//!
//! Each store is written as one pretty-printed JSON array, replacing the
//! whole file on every save. A missing file loads as an empty store.

use std::{
    fs::{self, File},
    io::{Read, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use tracing::{info, warn};

use crate::{
    book::{Book, BookState},
    catalog::BookCatalog,
    config::StoreConfig,
    directory::UserDirectory,
    error::{LibraryError, Result},
    events::{LoanEvent, LoanEventKind},
    ledger::LoanLedger,
    user::{User, UserId},
};

/// Layout accepted for timestamps written without a UTC offset
const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A serializable ISO-8601 timestamp
///
/// Written as RFC 3339. Values without an offset are read as UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeStamp(pub DateTime<Utc>);

impl TimeStamp {
    /// Parse either RFC 3339 or an offset-less ISO-8601 date-time
    ///
    /// # Errors
    ///
    /// Returns the parse error of the offset-less attempt when both fail.
    pub fn parse(raw: &str) -> std::result::Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|at| at.with_timezone(&Utc))
            .or_else(|_| NaiveDateTime::parse_from_str(raw, NAIVE_FORMAT).map(|at| at.and_utc()))
            .map(Self)
    }
}

impl Serialize for TimeStamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for TimeStamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// On-disk shape of a book
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookRecord {
    /// Title
    pub title: String,
    /// Physical location
    pub location: String,
    /// Section
    pub section: String,
    /// Whether the book is on loan
    pub borrowed: bool,
    /// Holder's name, null when available
    pub borrowed_by: Option<String>,
    /// Loan start, null when available
    pub borrow_date: Option<TimeStamp>,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title().to_string(),
            location: book.location().to_string(),
            section: book.section().to_string(),
            borrowed: book.is_borrowed(),
            borrowed_by: book.borrowed_by().map(str::to_string),
            borrow_date: book.borrow_date().map(TimeStamp),
        }
    }
}

impl BookRecord {
    /// Rebuild the book, rejecting records whose loan fields disagree
    ///
    /// # Errors
    ///
    /// Returns a description of the inconsistency.
    pub fn into_book(self) -> std::result::Result<Book, String> {
        let state = match (self.borrowed, self.borrowed_by, self.borrow_date) {
            (false, None, None) => BookState::Available,
            (true, Some(by), Some(TimeStamp(since))) => BookState::Borrowed { by, since },
            (borrowed, by, date) => {
                return Err(format!(
                    "book '{}' has borrowed={borrowed} but borrowed_by={by:?} and borrow_date={date:?}",
                    self.title
                ));
            }
        };
        Ok(Book::new(self.title, self.location, self.section).with_state(state))
    }
}

/// On-disk shape of a user
///
/// `borrowed_books` is written for readers of the file; loading ignores it
/// and rebuilds borrowed sets from the book records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserRecord {
    /// Identifier
    pub user_id: i64,
    /// Display name
    pub name: String,
    /// Titles held when the file was written
    #[serde(default)]
    pub borrowed_books: Vec<String>,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id().get(),
            name: user.name().to_string(),
            borrowed_books: user.borrowed_titles().iter().cloned().collect(),
        }
    }
}

/// On-disk shape of a loan event
///
/// The two kinds carry no tag: the date field present decides which one a
/// record is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum LoanEventRecord {
    /// Has a `borrow_date`
    Borrow {
        /// Borrower id
        user_id: i64,
        /// Borrower name
        user_name: String,
        /// Title
        book_title: String,
        /// When the loan started
        borrow_date: TimeStamp,
    },
    /// Has a `return_date`
    Return {
        /// Returner id
        user_id: i64,
        /// Returner name
        user_name: String,
        /// Title
        book_title: String,
        /// When the book came back
        return_date: TimeStamp,
    },
}

impl From<&LoanEvent> for LoanEventRecord {
    fn from(event: &LoanEvent) -> Self {
        let user_id = event.user_id.get();
        let user_name = event.user_name.clone();
        let book_title = event.book_title.clone();
        let at = TimeStamp(event.timestamp);
        match event.kind {
            LoanEventKind::Borrow => Self::Borrow { user_id, user_name, book_title, borrow_date: at },
            LoanEventKind::Return => Self::Return { user_id, user_name, book_title, return_date: at },
        }
    }
}

impl LoanEventRecord {
    /// Rebuild the event
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if the recorded user id is not positive.
    pub fn into_event(self) -> Result<LoanEvent> {
        Ok(match self {
            Self::Borrow { user_id, user_name, book_title, borrow_date } => {
                LoanEvent::borrow(UserId::new(user_id)?, &user_name, &book_title, borrow_date.0)
            }
            Self::Return { user_id, user_name, book_title, return_date } => {
                LoanEvent::give_back(UserId::new(user_id)?, &user_name, &book_title, return_date.0)
            }
        })
    }
}

/// Reads and writes the three store files
#[derive(Debug, Clone)]
pub struct JsonStore {
    /// Book records
    books_path: PathBuf,
    /// User records
    users_path: PathBuf,
    /// Loan events
    history_path: PathBuf,
}

impl JsonStore {
    /// Store using the paths from `config`
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            books_path: config.books_path(),
            users_path: config.users_path(),
            history_path: config.history_path(),
        }
    }

    /// Book records file
    #[must_use]
    pub fn books_path(&self) -> &Path {
        &self.books_path
    }

    /// User records file
    #[must_use]
    pub fn users_path(&self) -> &Path {
        &self.users_path
    }

    /// Loan events file
    #[must_use]
    pub fn history_path(&self) -> &Path {
        &self.history_path
    }

    /// Overwrite the books file with the whole catalog, ordered by title.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if serialization or writing fails.
    pub fn save_books(&self, catalog: &BookCatalog) -> Result<()> {
        let records: Vec<BookRecord> = catalog.list_all().into_iter().map(BookRecord::from).collect();
        write_json(&self.books_path, &records)
    }

    /// Load the catalog; a missing file gives an empty catalog.
    ///
    /// Records repeating an earlier title are skipped with a warning.
    ///
    /// # Errors
    ///
    /// - `Load` if the file cannot be read or parsed
    /// - `CorruptRecord` if a record's loan fields disagree
    pub fn load_books(&self) -> Result<BookCatalog> {
        let mut catalog = BookCatalog::new();
        for record in read_json::<BookRecord>(&self.books_path)? {
            let book = record.into_book().map_err(|message| LibraryError::CorruptRecord {
                path: self.books_path.clone(),
                message,
            })?;
            if let Err(err) = catalog.insert(book) {
                warn!(path = %self.books_path.display(), %err, "skipping duplicate book record");
            }
        }
        Ok(catalog)
    }

    /// Overwrite the users file with the whole directory, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if serialization or writing fails.
    pub fn save_users(&self, directory: &UserDirectory) -> Result<()> {
        let records: Vec<UserRecord> = directory.list_users().into_iter().map(UserRecord::from).collect();
        write_json(&self.users_path, &records)
    }

    /// Load the directory with empty borrowed sets; a missing file gives an
    /// empty directory.
    ///
    /// # Errors
    ///
    /// - `Load` if the file cannot be read or parsed
    /// - `CorruptRecord` if a record has a non-positive id or a blank name
    pub fn load_users(&self) -> Result<UserDirectory> {
        let mut directory = UserDirectory::new();
        for record in read_json::<UserRecord>(&self.users_path)? {
            let user_id = UserId::new(record.user_id).map_err(|err| self.corrupt_user(&err))?;
            if record.name.trim().is_empty() {
                return Err(LibraryError::CorruptRecord {
                    path: self.users_path.clone(),
                    message: format!("user {user_id} has an empty name"),
                });
            }
            if let Err(err) = directory.insert(User::new(user_id, record.name)) {
                warn!(path = %self.users_path.display(), %err, "skipping duplicate user record");
            }
        }
        Ok(directory)
    }

    /// Overwrite the history file with every event, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if serialization or writing fails.
    pub fn save_history(&self, ledger: &LoanLedger) -> Result<()> {
        let records: Vec<LoanEventRecord> = ledger.history().iter().map(LoanEventRecord::from).collect();
        write_json(&self.history_path, &records)
    }

    /// Load the ledger; a missing file gives an empty ledger.
    ///
    /// # Errors
    ///
    /// - `Load` if the file cannot be read or parsed
    /// - `CorruptRecord` if an event has a non-positive user id
    pub fn load_history(&self) -> Result<LoanLedger> {
        let events = read_json::<LoanEventRecord>(&self.history_path)?
            .into_iter()
            .map(|record| record.into_event().map_err(|err| self.corrupt_history(&err)))
            .collect::<Result<Vec<_>>>()?;
        Ok(LoanLedger::from_events(events))
    }

    /// Wrap a user validation failure
    fn corrupt_user(&self, err: &LibraryError) -> LibraryError {
        LibraryError::CorruptRecord { path: self.users_path.clone(), message: err.to_string() }
    }

    /// Wrap an event validation failure
    fn corrupt_history(&self, err: &LibraryError) -> LibraryError {
        LibraryError::CorruptRecord { path: self.history_path.clone(), message: err.to_string() }
    }
}

/// Serialize `records` and replace the file at `path`
fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let persistence_error = |message: String| LibraryError::Persistence { path: path.to_path_buf(), message };

    let serialized = serde_json::to_string_pretty(records).map_err(|e| persistence_error(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| persistence_error(format!("Failed to create directory: {e}")))?;
    }

    info!(path = %path.display(), count = records.len(), "saving records");
    let mut file =
        File::create(path).map_err(|e| persistence_error(format!("Failed to create file: {e}")))?;
    file.write_all(serialized.as_bytes())
        .map_err(|e| persistence_error(format!("Failed to write to file: {e}")))?;

    Ok(())
}

/// Read every record from `path`, or none if the file does not exist
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let load_error = |message: String| LibraryError::Load { path: path.to_path_buf(), message };

    if !path.exists() {
        info!(path = %path.display(), "no file found, starting empty");
        return Ok(Vec::new());
    }

    let mut file = File::open(path).map_err(|e| load_error(format!("Failed to open file: {e}")))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| load_error(format!("Failed to read file: {e}")))?;

    let records: Vec<T> = serde_json::from_str(&contents)
        .map_err(|e| load_error(format!("Failed to parse JSON: {e}")))?;
    info!(path = %path.display(), count = records.len(), "loaded records");
    Ok(records)
}
