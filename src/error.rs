//! Error types for catalog, directory, loan and persistence operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::user::UserId;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Errors that can occur while operating on the library stores.
///
/// Every variant except the persistence ones is a rejection: it is returned
/// before any store is touched, so the stores are exactly as they were
/// before the call.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// A book with this title is already in the catalog.
    #[error("book '{title}' already exists in the catalog")]
    BookAlreadyExists {
        /// Title that collided.
        title: String,
    },

    /// A user with this id is already registered.
    #[error("user with id {user_id} already exists")]
    UserAlreadyExists {
        /// Id that collided.
        user_id: UserId,
    },

    /// No book with this title.
    #[error("book '{title}' not found")]
    BookNotFound {
        /// Title that was looked up.
        title: String,
    },

    /// No user with this id.
    #[error("user with id {user_id} not found")]
    UserNotFound {
        /// Raw id that was looked up.
        user_id: i64,
    },

    /// The book is on loan and cannot be removed.
    #[error("book '{title}' is borrowed and cannot be removed")]
    StillBorrowed {
        /// Title of the borrowed book.
        title: String,
    },

    /// User ids must be positive integers.
    #[error("user id must be a positive integer, got {raw}")]
    InvalidId {
        /// The rejected value.
        raw: i64,
    },

    /// The book is already on loan.
    #[error("book '{title}' is already borrowed by {borrower}")]
    AlreadyBorrowed {
        /// Title of the book.
        title: String,
        /// Name of the current holder.
        borrower: String,
    },

    /// The book is not on loan, so it cannot be returned.
    #[error("book '{title}' was not borrowed")]
    NotBorrowed {
        /// Title of the book.
        title: String,
    },

    /// The book is on loan to somebody other than the requesting user.
    #[error("book '{title}' is borrowed by {borrower}, not by {requester}")]
    WrongBorrower {
        /// Title of the book.
        title: String,
        /// Name of the current holder.
        borrower: String,
        /// Name of the user who tried to return it.
        requester: String,
    },

    /// A required text field was empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the field.
        field: &'static str,
    },

    /// Writing a store to disk failed. The in-memory change stays applied.
    #[error("failed to save {}: {message}", path.display())]
    Persistence {
        /// File being written.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Reading a store from disk failed.
    #[error("failed to load {}: {message}", path.display())]
    Load {
        /// File being read.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// A persisted record could not be turned back into a valid entity.
    #[error("corrupt record in {}: {message}", path.display())]
    CorruptRecord {
        /// File holding the record.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },
}

impl LibraryError {
    /// Whether the error is a domain rejection that left every store untouched.
    ///
    /// I/O and decoding failures return `false`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Persistence { .. } | Self::Load { .. } | Self::CorruptRecord { .. })
    }
}
