//! Where the three stores live on disk.

use std::path::{Path, PathBuf};

/// Default file for book records
pub const DEFAULT_BOOKS_FILE: &str = "books.json";
/// Default file for user records
pub const DEFAULT_USERS_FILE: &str = "users.json";
/// Default file for loan events
pub const DEFAULT_HISTORY_FILE: &str = "loan_history.json";

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the three files
    pub data_dir: PathBuf,
    /// Book records file name, relative to `data_dir`
    pub books_file: String,
    /// User records file name, relative to `data_dir`
    pub users_file: String,
    /// Loan events file name, relative to `data_dir`
    pub history_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            books_file: DEFAULT_BOOKS_FILE.to_string(),
            users_file: DEFAULT_USERS_FILE.to_string(),
            history_file: DEFAULT_HISTORY_FILE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Default file names inside `data_dir`
    #[must_use]
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self { data_dir: data_dir.as_ref().to_path_buf(), ..Self::default() }
    }

    /// Full path of the books file
    #[must_use]
    pub fn books_path(&self) -> PathBuf {
        self.data_dir.join(&self.books_file)
    }

    /// Full path of the users file
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    /// Full path of the history file
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join(&self.history_file)
    }
}
