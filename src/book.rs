use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Loan state of a book
///
/// A book is either on the shelf or held by exactly one user, so the
/// borrower and the borrow date exist together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum BookState {
    /// Book is on the shelf
    #[default]
    Available,
    /// Book is held by a user
    Borrowed {
        /// Name of the user holding the book
        by: String,
        /// When the loan started
        since: DateTime<Utc>,
    },
}

impl BookState {
    /// Get a human-readable description of the current state
    #[must_use]
    pub fn get_description(&self) -> String {
        match self {
            Self::Available => "Book is available for borrowing".to_string(),
            Self::Borrowed { by, since } => {
                format!("Book is borrowed by {by} since {}", since.to_rfc3339())
            }
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Unique title, used as the catalog key
    title: String,
    /// Physical location (shelf, room)
    location: String,
    /// Section the book is filed under
    section: String,
    /// Current loan state
    state: BookState,
}

impl Book {
    /// Create an available book
    #[must_use]
    pub fn new(title: impl Into<String>, location: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
            section: section.into(),
            state: BookState::Available,
        }
    }

    /// Create a book in a given state, used when restoring from disk
    #[must_use]
    pub(crate) fn with_state(mut self, state: BookState) -> Self {
        self.state = state;
        self
    }

    /// Title of the book
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Where the book is kept
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Section the book is filed under
    #[must_use]
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Current loan state
    #[must_use]
    pub fn state(&self) -> &BookState {
        &self.state
    }

    /// Whether the book is on loan
    #[must_use]
    pub fn is_borrowed(&self) -> bool {
        matches!(self.state, BookState::Borrowed { .. })
    }

    /// Name of the holder, if on loan
    #[must_use]
    pub fn borrowed_by(&self) -> Option<&str> {
        match &self.state {
            BookState::Borrowed { by, .. } => Some(by),
            BookState::Available => None,
        }
    }

    /// Start of the current loan, if on loan
    #[must_use]
    pub fn borrow_date(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            BookState::Borrowed { since, .. } => Some(*since),
            BookState::Available => None,
        }
    }

    /// Mark the book as held by `borrower`
    pub(crate) fn lend(&mut self, borrower: &str, at: DateTime<Utc>) {
        self.state = BookState::Borrowed { by: borrower.to_string(), since: at };
    }

    /// Put the book back on the shelf
    pub(crate) fn give_back(&mut self) {
        self.state = BookState::Available;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_new_book_is_available() {
        let book = Book::new("Dune", "Shelf3", "SciFi");
        assert!(!book.is_borrowed());
        assert_eq!(book.borrowed_by(), None);
        assert_eq!(book.borrow_date(), None);
        assert_eq!(book.state().get_description(), "Book is available for borrowing");
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_lend_and_give_back() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).single().expect("valid date");

        let mut book = Book::new("Dune", "Shelf3", "SciFi");
        book.lend("Ana", at);
        assert!(book.is_borrowed());
        assert_eq!(book.borrowed_by(), Some("Ana"));
        assert_eq!(book.borrow_date(), Some(at));

        book.give_back();
        assert_eq!(*book.state(), BookState::Available);
        assert_eq!(book.borrowed_by(), None);
    }
}
