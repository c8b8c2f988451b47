//! Borrow and return protocol spanning the catalog, the directory and the ledger.
//!
//! Each book moves between two states, `Available` and `Borrowed`. A
//! transition touches three stores, so every check that can fail runs
//! before the first write: when a call returns an error nothing has
//! changed, and when it succeeds the book, the user's borrowed set and the
//! ledger all reflect the transition.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    book::{Book, BookState},
    catalog::BookCatalog,
    directory::UserDirectory,
    error::{LibraryError, Result},
    events::LoanEvent,
    ledger::LoanLedger,
};

/// Result of an applied loan transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanReceipt {
    /// The book after the transition
    pub book: Book,
    /// The event appended to the ledger
    pub event: LoanEvent,
}

/// Executes loan transitions over borrowed stores
#[derive(Debug)]
pub struct LoanCoordinator<'a> {
    /// Books
    catalog: &'a mut BookCatalog,
    /// Users
    directory: &'a mut UserDirectory,
    /// History
    ledger: &'a mut LoanLedger,
}

impl<'a> LoanCoordinator<'a> {
    /// Coordinate the given stores
    #[must_use]
    pub fn new(
        catalog: &'a mut BookCatalog,
        directory: &'a mut UserDirectory,
        ledger: &'a mut LoanLedger,
    ) -> Self {
        Self { catalog, directory, ledger }
    }

    /// Lend `title` to user `user_id` at time `at`.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user is not registered
    /// - `BookNotFound` if the title is not catalogued
    /// - `AlreadyBorrowed` if the book is on loan, to anyone
    pub fn borrow(&mut self, title: &str, user_id: i64, at: DateTime<Utc>) -> Result<LoanReceipt> {
        let user = self.directory.find_user(user_id)?;
        let (id, name) = (user.user_id(), user.name().to_string());

        let book = self.catalog.find_book_mut(title)?;
        if let BookState::Borrowed { by, .. } = book.state() {
            return Err(LibraryError::AlreadyBorrowed {
                title: title.to_string(),
                borrower: by.clone(),
            });
        }

        self.directory.add_borrowed_title(id, title)?;
        book.lend(&name, at);
        let event = LoanEvent::borrow(id, &name, book.title(), at);
        self.ledger.record(event.clone());

        info!(title, user_id, user = %name, "book borrowed");
        Ok(LoanReceipt { book: book.clone(), event })
    }

    /// Take `title` back from user `user_id` at time `at`.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the user is not registered
    /// - `BookNotFound` if the title is not catalogued
    /// - `NotBorrowed` if the book is on the shelf
    /// - `WrongBorrower` if the book is held by a user with another name
    pub fn give_back(&mut self, title: &str, user_id: i64, at: DateTime<Utc>) -> Result<LoanReceipt> {
        let user = self.directory.find_user(user_id)?;
        let (id, name) = (user.user_id(), user.name().to_string());

        let book = self.catalog.find_book_mut(title)?;
        match book.state() {
            BookState::Available => {
                return Err(LibraryError::NotBorrowed { title: title.to_string() });
            }
            BookState::Borrowed { by, .. } if *by != name => {
                return Err(LibraryError::WrongBorrower {
                    title: title.to_string(),
                    borrower: by.clone(),
                    requester: name,
                });
            }
            BookState::Borrowed { .. } => {}
        }

        self.directory.remove_borrowed_title(id, title)?;
        book.give_back();
        let event = LoanEvent::give_back(id, &name, book.title(), at);
        self.ledger.record(event.clone());

        info!(title, user_id, user = %name, "book returned");
        Ok(LoanReceipt { book: book.clone(), event })
    }
}
