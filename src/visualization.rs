use std::fmt::Write as _;

use crate::{
    book::{Book, BookState},
    events::{LoanEvent, LoanEventKind},
    system::LibraryStats,
    user::User,
};

/// Text rendering for books, users and loan history
#[derive(Debug)]
pub struct CatalogVisualization;

impl CatalogVisualization {
    /// One line describing a book
    #[must_use]
    pub fn book_line(book: &Book) -> String {
        format!(
            "{} | Section: {} | Location: {} | {}",
            book.title(),
            book.section(),
            book.location(),
            Self::format_state(book.state())
        )
    }

    /// One line describing a user and what they hold
    #[must_use]
    pub fn user_line(user: &User) -> String {
        let held = user.borrowed_titles();
        if held.is_empty() {
            format!("ID: {} | Name: {}", user.user_id(), user.name())
        } else {
            let titles: Vec<&str> = held.iter().map(String::as_str).collect();
            format!("ID: {} | Name: {} | Holding: {}", user.user_id(), user.name(), titles.join(", "))
        }
    }

    /// One line per book, or a placeholder when the list is empty
    #[must_use]
    pub fn book_list(books: &[&Book], empty: &str) -> String {
        if books.is_empty() {
            return empty.to_string();
        }
        books.iter().map(|book| format!(" - {}", Self::book_line(book))).collect::<Vec<_>>().join("\n")
    }

    /// One line per user, or a placeholder when nobody is registered
    #[must_use]
    pub fn user_list(users: &[&User]) -> String {
        if users.is_empty() {
            return "No registered users.".to_string();
        }
        users.iter().map(|user| format!(" - {}", Self::user_line(user))).collect::<Vec<_>>().join("\n")
    }

    /// Format a state for display
    fn format_state(state: &BookState) -> String {
        match state {
            BookState::Available => "Available".to_string(),
            BookState::Borrowed { by, since } => {
                format!("Borrowed by {by} since {}", since.format("%Y-%m-%d %H:%M"))
            }
        }
    }

    /// Generate a markdown table of the history
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)]
    pub fn history_table(events: &[LoanEvent]) -> String {
        if events.is_empty() {
            return "No loan events recorded yet.".to_string();
        }

        let mut table = String::from("| # | Event | Book | User | Date |\n");
        table.push_str("|---|-------|------|------|------|\n");

        for (i, event) in events.iter().enumerate() {
            let kind = match event.kind {
                LoanEventKind::Borrow => "Borrowed",
                LoanEventKind::Return => "Returned",
            };
            let _ = writeln!(
                table,
                "| {} | {kind} | {} | {} (ID: {}) | {} |",
                i + 1,
                event.book_title,
                event.user_name,
                event.user_id,
                event.timestamp.to_rfc3339()
            );
        }

        table
    }

    /// Summary of the library counts
    #[must_use]
    pub fn stats(stats: &LibraryStats) -> String {
        format!(
            "Books: {}\n  available: {}\n  borrowed: {}\nUsers: {}\nLoan events: {}",
            stats.books, stats.available, stats.borrowed, stats.users, stats.events
        )
    }
}
