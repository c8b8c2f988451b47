use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Kind of loan state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LoanEventKind {
    /// A book left the shelf
    Borrow,
    /// A book came back
    Return,
}

impl fmt::Display for LoanEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Borrow => f.write_str("borrow"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// One immutable entry of the loan ledger
///
/// User and book fields are copied at the time of the event so history does
/// not depend on the current catalog or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanEvent {
    /// What happened
    pub kind: LoanEventKind,
    /// Who borrowed or returned
    pub user_id: UserId,
    /// Name of that user at the time
    pub user_name: String,
    /// Title of the book
    pub book_title: String,
    /// When it happened
    pub timestamp: DateTime<Utc>,
}

impl LoanEvent {
    /// A borrow event
    #[must_use]
    pub fn borrow(user_id: UserId, user_name: &str, book_title: &str, at: DateTime<Utc>) -> Self {
        Self::new(LoanEventKind::Borrow, user_id, user_name, book_title, at)
    }

    /// A return event
    #[must_use]
    pub fn give_back(user_id: UserId, user_name: &str, book_title: &str, at: DateTime<Utc>) -> Self {
        Self::new(LoanEventKind::Return, user_id, user_name, book_title, at)
    }

    /// Shared constructor
    fn new(
        kind: LoanEventKind,
        user_id: UserId,
        user_name: &str,
        book_title: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            user_id,
            user_name: user_name.to_string(),
            book_title: book_title.to_string(),
            timestamp,
        }
    }
}

impl fmt::Display for LoanEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { kind, user_id, user_name, book_title, timestamp } = self;
        let date = timestamp.to_rfc3339();
        match kind {
            LoanEventKind::Borrow => {
                write!(f, "'{book_title}' borrowed by {user_name} (ID: {user_id}) on {date}")
            }
            LoanEventKind::Return => {
                write!(f, "'{book_title}' returned by {user_name} (ID: {user_id}) on {date}")
            }
        }
    }
}
