use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use crate::{
    config::StoreConfig,
    error::LibraryError,
    events::LoanEventKind,
    observers::NotificationService,
    system::{Library, LibraryStats},
};

/// Helper function to set up a library with one user and one book
fn setup_test_library() -> Library {
    let mut library = Library::in_memory();
    drop(library.register_user(1, "Ana"));
    drop(library.add_book("Dune", "Shelf3", "SciFi"));
    library
}

#[test]
fn test_initial_state() {
    let library = setup_test_library();
    assert_eq!(library.list_available().len(), 1);
    assert!(library.list_borrowed().is_empty());
    assert!(library.history().is_empty());
}

#[test]
fn test_borrow_and_return_through_context() {
    let mut library = setup_test_library();

    let result = library.borrow("Dune", 1);
    assert!(matches!(result, Ok(ref r) if r.book.borrowed_by() == Some("Ana")));
    assert!(matches!(library.find_user(1), Ok(user) if user.holds("Dune")));

    let result = library.borrow("Dune", 1);
    assert!(matches!(result, Err(LibraryError::AlreadyBorrowed { .. })));

    let result = library.return_book("Dune", 1);
    assert!(matches!(result, Ok(ref r) if !r.book.is_borrowed()));

    let kinds: Vec<LoanEventKind> = library.history().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![LoanEventKind::Borrow, LoanEventKind::Return]);
}

#[test]
fn test_remove_guard() {
    let mut library = setup_test_library();
    drop(library.borrow("Dune", 1));

    let result = library.remove_book("Dune");
    assert!(matches!(result, Err(LibraryError::StillBorrowed { .. })));
    assert!(matches!(library.find_book("Dune"), Ok(book) if book.is_borrowed()));
}

#[test]
fn test_observers_are_notified() {
    let mut library = setup_test_library();
    let notifier = NotificationService::new();
    let inbox = notifier.inbox();
    library.register_observer(Box::new(notifier));

    drop(library.borrow("Dune", 1));
    drop(library.borrow("Dune", 1));
    drop(library.return_book("Dune", 1));

    // Rejected transitions produce no notice
    let notices = inbox.borrow();
    assert_eq!(notices.len(), 2);
    assert_eq!(notices.first().map(String::as_str), Some("Book 'Dune' lent to Ana."));
    assert_eq!(notices.last().map(String::as_str), Some("Book 'Dune' returned by Ana."));
}

#[test]
fn test_stats_and_display() {
    let mut library = setup_test_library();
    drop(library.add_book("Emma", "Shelf1", "Classics"));
    drop(library.borrow("Emma", 1));

    assert_eq!(
        library.stats(),
        LibraryStats { books: 2, available: 1, borrowed: 1, users: 1, events: 1 }
    );
    assert_eq!(
        library.to_string(),
        "2 books (1 available, 1 borrowed), 1 users, 1 loan events"
    );
}

#[test]
#[allow(clippy::expect_used)]
fn test_reopen_restores_every_store() {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig::in_dir(dir.path());
    let at = Utc.with_ymd_and_hms(2024, 4, 10, 9, 0, 0).single().expect("valid date");

    {
        let mut library = Library::open(&config).expect("open empty");
        library.register_user(1, "Ana").expect("register");
        library.register_user(2, "Luis").expect("register");
        library.add_book("Dune", "Shelf3", "SciFi").expect("add");
        library.add_book("Emma", "Shelf1", "Classics").expect("add");
        library.borrow_at("Dune", 1, at).expect("borrow");
    }

    let library = Library::open(&config).expect("reopen");
    assert_eq!(library.list_all().len(), 2);
    assert_eq!(library.list_users().len(), 2);
    assert_eq!(library.history().len(), 1);
    assert!(matches!(
        library.find_book("Dune"),
        Ok(book) if book.borrowed_by() == Some("Ana") && book.borrow_date() == Some(at)
    ));
    // Borrowed sets are rebuilt from the book records
    assert!(matches!(library.find_user(1), Ok(user) if user.holds("Dune")));
    assert!(matches!(library.find_user(2), Ok(user) if user.borrowed_titles().is_empty()));
}

#[test]
#[allow(clippy::expect_used)]
fn test_save_failure_keeps_memory_change() {
    let dir = TempDir::new().expect("temp dir");
    // The data directory is a regular file, so every save fails
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").expect("write");
    let mut library = Library::open(&StoreConfig::in_dir(&blocker)).expect("open");

    let result = library.add_book("Dune", "Shelf3", "SciFi");
    assert!(matches!(result, Err(LibraryError::Persistence { .. })));
    assert!(library.find_book("Dune").is_ok());
}
