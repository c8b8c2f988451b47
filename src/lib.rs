//! Library catalog manager.
//!
//! Tracks books, registered users and an append-only ledger of loan
//! events, persisting each store as a JSON file.
//!
//! - [`RecordIndex`] is the chained hash table behind both keyed stores
//! - [`BookCatalog`] owns books keyed by title
//! - [`UserDirectory`] owns users keyed by id and their borrowed sets
//! - [`LoanLedger`] records every borrow and return in order
//! - [`LoanCoordinator`] applies borrow/return across all three
//! - [`Library`] is the context object tying the stores to their files

pub mod book;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod events;
pub mod index;
pub mod ledger;
pub mod observers;
pub mod persistence;
pub mod system;
pub mod user;
pub mod visualization;

pub use book::{Book, BookState};
pub use catalog::BookCatalog;
pub use config::StoreConfig;
pub use coordinator::{LoanCoordinator, LoanReceipt};
pub use directory::UserDirectory;
pub use error::{LibraryError, Result};
pub use events::{LoanEvent, LoanEventKind};
pub use index::RecordIndex;
pub use ledger::LoanLedger;
pub use persistence::JsonStore;
pub use system::Library;
pub use user::{User, UserId};
pub use visualization::CatalogVisualization;
