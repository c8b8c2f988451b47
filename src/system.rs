use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    book::Book,
    catalog::BookCatalog,
    config::StoreConfig,
    coordinator::{LoanCoordinator, LoanReceipt},
    directory::UserDirectory,
    error::Result,
    events::LoanEvent,
    ledger::LoanLedger,
    observers::{LoanObserver, TransitionLogger},
    persistence::JsonStore,
    user::User,
};

/// Counts shown by the stats view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    /// Catalogued books
    pub books: usize,
    /// Books on the shelf
    pub available: usize,
    /// Books on loan
    pub borrowed: usize,
    /// Registered users
    pub users: usize,
    /// Ledger entries
    pub events: usize,
}

/// The library context: every store plus the optional file backing
///
/// Built once at startup and threaded through every operation. Each
/// mutating operation saves the stores it touched; a save failure is
/// returned as `Persistence` but the in-memory change stays applied.
pub struct Library {
    /// Books keyed by title
    catalog: BookCatalog,
    /// Users keyed by id
    directory: UserDirectory,
    /// Loan history
    ledger: LoanLedger,
    /// File backing, absent for in-memory libraries
    store: Option<JsonStore>,
    /// Registered loan observers
    observers: Vec<Box<dyn LoanObserver>>,
}

// Manual implementation of Debug for Library
impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("catalog", &self.catalog)
            .field("directory", &self.directory)
            .field("ledger", &self.ledger)
            .field("store", &self.store)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl Library {
    /// Create an empty library that is never written to disk
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_parts(BookCatalog::new(), UserDirectory::new(), LoanLedger::new(), None)
    }

    /// Assemble a library from already-built stores
    #[must_use]
    pub fn from_parts(
        catalog: BookCatalog,
        directory: UserDirectory,
        ledger: LoanLedger,
        store: Option<JsonStore>,
    ) -> Self {
        Self { catalog, directory, ledger, store, observers: vec![Box::new(TransitionLogger)] }
    }

    /// Load books, then users, then loan history from the configured files.
    ///
    /// Missing files start empty. Users' borrowed sets are rebuilt from the
    /// book records.
    ///
    /// # Errors
    ///
    /// Returns `Load` or `CorruptRecord` if a file exists but cannot be used.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = JsonStore::new(config);
        let catalog = store.load_books()?;
        let mut directory = store.load_users()?;
        let ledger = store.load_history()?;

        let orphans = directory.rebuild_loans(&catalog);
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "borrowed books reference unregistered users");
        }
        info!(
            books = catalog.len(),
            users = directory.len(),
            events = ledger.len(),
            "library opened"
        );
        Ok(Self::from_parts(catalog, directory, ledger, Some(store)))
    }

    /// Register an observer to be notified of loan transitions
    pub fn register_observer(&mut self, observer: Box<dyn LoanObserver>) {
        self.observers.push(observer);
    }

    /// Read access to the catalog
    #[must_use]
    pub fn catalog(&self) -> &BookCatalog {
        &self.catalog
    }

    /// Read access to the directory
    #[must_use]
    pub fn directory(&self) -> &UserDirectory {
        &self.directory
    }

    /// Read access to the ledger
    #[must_use]
    pub fn ledger(&self) -> &LoanLedger {
        &self.ledger
    }

    /// Add an available book and save the catalog.
    ///
    /// # Errors
    ///
    /// `EmptyField`, `BookAlreadyExists`, or `Persistence` after the book
    /// was added.
    pub fn add_book(&mut self, title: &str, location: &str, section: &str) -> Result<Book> {
        let book = self.catalog.add_book(title, location, section)?.clone();
        self.save_books()?;
        Ok(book)
    }

    /// Look up a book by title.
    ///
    /// # Errors
    ///
    /// `BookNotFound`.
    pub fn find_book(&self, title: &str) -> Result<&Book> {
        self.catalog.find_book(title)
    }

    /// Remove a book that is not on loan and save the catalog.
    ///
    /// # Errors
    ///
    /// `BookNotFound`, `StillBorrowed`, or `Persistence` after the book was
    /// removed.
    pub fn remove_book(&mut self, title: &str) -> Result<Book> {
        let book = self.catalog.remove_book(title)?;
        self.save_books()?;
        Ok(book)
    }

    /// Books on the shelf
    #[must_use]
    pub fn list_available(&self) -> Vec<&Book> {
        self.catalog.list_available()
    }

    /// Books on loan
    #[must_use]
    pub fn list_borrowed(&self) -> Vec<&Book> {
        self.catalog.list_borrowed()
    }

    /// Every book
    #[must_use]
    pub fn list_all(&self) -> Vec<&Book> {
        self.catalog.list_all()
    }

    /// Register a user and save the directory.
    ///
    /// # Errors
    ///
    /// `InvalidId`, `EmptyField`, `UserAlreadyExists`, or `Persistence`
    /// after the user was registered.
    pub fn register_user(&mut self, user_id: i64, name: &str) -> Result<User> {
        let user = self.directory.register_user(user_id, name)?.clone();
        self.save_users()?;
        Ok(user)
    }

    /// Look up a user by id.
    ///
    /// # Errors
    ///
    /// `UserNotFound`.
    pub fn find_user(&self, user_id: i64) -> Result<&User> {
        self.directory.find_user(user_id)
    }

    /// Every user
    #[must_use]
    pub fn list_users(&self) -> Vec<&User> {
        self.directory.list_users()
    }

    /// Lend a book now.
    ///
    /// # Errors
    ///
    /// See [`Library::borrow_at`].
    pub fn borrow(&mut self, title: &str, user_id: i64) -> Result<LoanReceipt> {
        self.borrow_at(title, user_id, Utc::now())
    }

    /// Lend a book at a given time, notify observers and save.
    ///
    /// # Errors
    ///
    /// `UserNotFound`, `BookNotFound`, `AlreadyBorrowed`, or `Persistence`
    /// after the loan was applied.
    pub fn borrow_at(&mut self, title: &str, user_id: i64, at: DateTime<Utc>) -> Result<LoanReceipt> {
        let receipt = self.coordinator().borrow(title, user_id, at)?;
        self.after_transition(&receipt)?;
        Ok(receipt)
    }

    /// Take a book back now.
    ///
    /// # Errors
    ///
    /// See [`Library::return_at`].
    pub fn return_book(&mut self, title: &str, user_id: i64) -> Result<LoanReceipt> {
        self.return_at(title, user_id, Utc::now())
    }

    /// Take a book back at a given time, notify observers and save.
    ///
    /// # Errors
    ///
    /// `UserNotFound`, `BookNotFound`, `NotBorrowed`, `WrongBorrower`, or
    /// `Persistence` after the return was applied.
    pub fn return_at(&mut self, title: &str, user_id: i64, at: DateTime<Utc>) -> Result<LoanReceipt> {
        let receipt = self.coordinator().give_back(title, user_id, at)?;
        self.after_transition(&receipt)?;
        Ok(receipt)
    }

    /// Every loan event, oldest first
    #[must_use]
    pub fn history(&self) -> &[LoanEvent] {
        self.ledger.history()
    }

    /// Summary counts
    #[must_use]
    pub fn stats(&self) -> LibraryStats {
        let borrowed = self.catalog.list_borrowed().len();
        LibraryStats {
            books: self.catalog.len(),
            available: self.catalog.len().saturating_sub(borrowed),
            borrowed,
            users: self.directory.len(),
            events: self.ledger.len(),
        }
    }

    /// Write all three stores.
    ///
    /// # Errors
    ///
    /// The first `Persistence` error; later stores are still attempted.
    pub fn save_all(&self) -> Result<()> {
        let books = self.save_books();
        let users = self.save_users();
        let history = self.save_history();
        books.and(users).and(history)
    }

    /// Coordinator over the three stores
    fn coordinator(&mut self) -> LoanCoordinator<'_> {
        LoanCoordinator::new(&mut self.catalog, &mut self.directory, &mut self.ledger)
    }

    /// Notify observers, then save what a loan transition touched
    fn after_transition(&self, receipt: &LoanReceipt) -> Result<()> {
        for observer in &self.observers {
            observer.on_loan_event(&receipt.event, &receipt.book);
        }
        self.save_all()
    }

    /// Save the catalog if file-backed
    fn save_books(&self) -> Result<()> {
        self.store.as_ref().map_or(Ok(()), |store| store.save_books(&self.catalog))
    }

    /// Save the directory if file-backed
    fn save_users(&self) -> Result<()> {
        self.store.as_ref().map_or(Ok(()), |store| store.save_users(&self.directory))
    }

    /// Save the ledger if file-backed
    fn save_history(&self) -> Result<()> {
        self.store.as_ref().map_or(Ok(()), |store| store.save_history(&self.ledger))
    }
}

impl Default for Library {
    fn default() -> Self {
        Self::in_memory()
    }
}

// Implementing display for nicer output
impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let LibraryStats { books, available, borrowed, users, events } = self.stats();
        write!(
            f,
            "{books} books ({available} available, {borrowed} borrowed), {users} users, {events} loan events"
        )
    }
}

#[cfg(test)]
mod tests;
