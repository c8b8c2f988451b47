//! Book catalog keyed by title.

use tracing::{debug, info};

use crate::{
    book::Book,
    error::{LibraryError, Result},
    index::{IndexError, RecordIndex},
};

/// Trim a text field and reject it if nothing is left
pub(crate) fn required<'a>(value: &'a str, field: &'static str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { Err(LibraryError::EmptyField { field }) } else { Ok(trimmed) }
}

/// Owns every book record and answers availability queries
#[derive(Debug, Clone, Default)]
pub struct BookCatalog {
    /// Books keyed by title
    books: RecordIndex<String, Book>,
}

impl BookCatalog {
    /// Create an empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new, available book.
    ///
    /// Fields are trimmed before use.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if any field is blank
    /// - `BookAlreadyExists` if the title is already catalogued
    pub fn add_book(&mut self, title: &str, location: &str, section: &str) -> Result<&Book> {
        let title = required(title, "title")?;
        let location = required(location, "location")?;
        let section = required(section, "section")?;

        self.insert(Book::new(title, location, section))?;
        info!(title, location, section, "book added");
        self.find_book(title)
    }

    /// Insert a fully built book, keeping its loan state.
    ///
    /// # Errors
    ///
    /// Returns `BookAlreadyExists` if the title is already catalogued.
    pub fn insert(&mut self, book: Book) -> Result<()> {
        let title = book.title().to_string();
        self.books.insert(title.clone(), book).map_err(|err| match err {
            IndexError::DuplicateKey => LibraryError::BookAlreadyExists { title },
        })
    }

    /// Look up a book by title.
    ///
    /// # Errors
    ///
    /// Returns `BookNotFound` if no book has this title.
    pub fn find_book(&self, title: &str) -> Result<&Book> {
        self.books.find(title).ok_or_else(|| {
            debug!(title, "book lookup missed");
            LibraryError::BookNotFound { title: title.to_string() }
        })
    }

    /// Mutable lookup reserved for the loan protocol
    pub(crate) fn find_book_mut(&mut self, title: &str) -> Result<&mut Book> {
        self.books
            .find_mut(title)
            .ok_or_else(|| LibraryError::BookNotFound { title: title.to_string() })
    }

    /// Remove a book that is not on loan and return it.
    ///
    /// # Errors
    ///
    /// - `BookNotFound` if no book has this title
    /// - `StillBorrowed` if the book is on loan; it stays in the catalog
    pub fn remove_book(&mut self, title: &str) -> Result<Book> {
        if self.find_book(title)?.is_borrowed() {
            return Err(LibraryError::StillBorrowed { title: title.to_string() });
        }
        let removed = self
            .books
            .remove(title)
            .ok_or_else(|| LibraryError::BookNotFound { title: title.to_string() })?;
        info!(title, "book removed");
        Ok(removed)
    }

    /// Books on the shelf, ordered by title
    #[must_use]
    pub fn list_available(&self) -> Vec<&Book> {
        self.snapshot(|book| !book.is_borrowed())
    }

    /// Books on loan, ordered by title
    #[must_use]
    pub fn list_borrowed(&self) -> Vec<&Book> {
        self.snapshot(Book::is_borrowed)
    }

    /// Every book, ordered by title
    #[must_use]
    pub fn list_all(&self) -> Vec<&Book> {
        self.snapshot(|_| true)
    }

    /// Lazy, unordered iteration over every book
    pub fn iter(&self) -> impl Iterator<Item = &Book> + '_ {
        self.books.values()
    }

    /// Number of catalogued books
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Filtered, title-ordered copy of the current book references
    fn snapshot(&self, keep: impl Fn(&Book) -> bool) -> Vec<&Book> {
        let mut books: Vec<&Book> = self.books.values().filter(|book| keep(book)).collect();
        books.sort_by(|a, b| a.title().cmp(b.title()));
        books
    }
}
