use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

/// Registered user identifier, always a positive integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    /// Validate a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if `raw` is zero or negative.
    pub fn new(raw: i64) -> Result<Self> {
        if raw > 0 { Ok(Self(raw)) } else { Err(LibraryError::InvalidId { raw }) }
    }

    /// The raw integer
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for UserId {
    type Error = LibraryError;

    fn try_from(raw: i64) -> Result<Self> {
        Self::new(raw)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered library user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier
    user_id: UserId,
    /// Display name, matched against `Book::borrowed_by`
    name: String,
    /// Titles currently held by this user
    borrowed_titles: BTreeSet<String>,
}

impl User {
    /// Create a user holding no books
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        Self { user_id, name: name.into(), borrowed_titles: BTreeSet::new() }
    }

    /// Identifier
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Titles currently held, in title order
    #[must_use]
    pub fn borrowed_titles(&self) -> &BTreeSet<String> {
        &self.borrowed_titles
    }

    /// Whether the user holds `title`
    #[must_use]
    pub fn holds(&self, title: &str) -> bool {
        self.borrowed_titles.contains(title)
    }

    /// Record that the user now holds `title`; returns false if already held
    pub(crate) fn add_title(&mut self, title: &str) -> bool {
        self.borrowed_titles.insert(title.to_string())
    }

    /// Record that the user gave `title` back; returns false if not held
    pub(crate) fn remove_title(&mut self, title: &str) -> bool {
        self.borrowed_titles.remove(title)
    }

    /// Forget every held title
    pub(crate) fn clear_titles(&mut self) {
        self.borrowed_titles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_must_be_positive() {
        assert!(matches!(UserId::new(1), Ok(id) if id.get() == 1));
        assert!(matches!(UserId::new(0), Err(LibraryError::InvalidId { raw: 0 })));
        assert!(matches!(UserId::new(-7), Err(LibraryError::InvalidId { raw: -7 })));
    }

    #[test]
    fn test_user_id_deserialization_validates() {
        assert!(serde_json::from_str::<UserId>("42").is_ok());
        assert!(serde_json::from_str::<UserId>("-1").is_err());
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_borrowed_titles_have_no_duplicates() {
        let id = UserId::new(3).expect("positive id");
        let mut user = User::new(id, "Ana");
        assert!(user.add_title("Dune"));
        assert!(!user.add_title("Dune"));
        assert_eq!(user.borrowed_titles().len(), 1);
        assert!(user.holds("Dune"));
        assert!(user.remove_title("Dune"));
        assert!(!user.remove_title("Dune"));
    }
}
