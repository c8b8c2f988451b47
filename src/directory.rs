//! Registered users keyed by id.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::{
    catalog::{BookCatalog, required},
    error::{LibraryError, Result},
    index::{IndexError, RecordIndex},
    user::{User, UserId},
};

/// Owns every user record and each user's set of held titles
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    /// Users keyed by id
    users: RecordIndex<UserId, User>,
}

impl UserDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user holding no books.
    ///
    /// # Errors
    ///
    /// - `InvalidId` if `user_id` is not positive
    /// - `EmptyField` if the name is blank
    /// - `UserAlreadyExists` if the id is taken
    pub fn register_user(&mut self, user_id: i64, name: &str) -> Result<&User> {
        let id = UserId::new(user_id)?;
        let name = required(name, "name")?;

        self.insert(User::new(id, name))?;
        info!(user_id, name, "user registered");
        self.find_user(user_id)
    }

    /// Insert a fully built user.
    ///
    /// # Errors
    ///
    /// Returns `UserAlreadyExists` if the id is taken.
    pub fn insert(&mut self, user: User) -> Result<()> {
        let user_id = user.user_id();
        self.users.insert(user_id, user).map_err(|err| match err {
            IndexError::DuplicateKey => LibraryError::UserAlreadyExists { user_id },
        })
    }

    /// Look up a user by raw id.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` if no user has this id. Non-positive ids are
    /// never registered, so they are reported the same way.
    pub fn find_user(&self, user_id: i64) -> Result<&User> {
        UserId::new(user_id).ok().and_then(|id| self.users.find(&id)).ok_or_else(|| {
            debug!(user_id, "user lookup missed");
            LibraryError::UserNotFound { user_id }
        })
    }

    /// Every user, ordered by id
    #[must_use]
    pub fn list_users(&self) -> Vec<&User> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by_key(|user| user.user_id());
        users
    }

    /// Record that `user_id` now holds `title`.
    ///
    /// Only the loan protocol calls this.
    pub(crate) fn add_borrowed_title(&mut self, user_id: UserId, title: &str) -> Result<()> {
        let user = self.find_user_mut(user_id)?;
        if !user.add_title(title) {
            warn!(%user_id, title, "title was already in the user's borrowed set");
        }
        Ok(())
    }

    /// Record that `user_id` gave `title` back.
    ///
    /// Only the loan protocol calls this.
    pub(crate) fn remove_borrowed_title(&mut self, user_id: UserId, title: &str) -> Result<()> {
        let user = self.find_user_mut(user_id)?;
        if !user.remove_title(title) {
            warn!(%user_id, title, "title was missing from the user's borrowed set");
        }
        Ok(())
    }

    /// Rebuild every borrowed set from the catalog's loan state.
    ///
    /// A borrowed book is credited to the lowest-id user whose name matches
    /// `borrowed_by`. Returns the titles whose borrower is not registered.
    pub fn rebuild_loans(&mut self, catalog: &BookCatalog) -> Vec<String> {
        let mut by_name: HashMap<String, UserId> = HashMap::new();
        for user in self.users.values_mut() {
            user.clear_titles();
            by_name
                .entry(user.name().to_string())
                .and_modify(|id| *id = (*id).min(user.user_id()))
                .or_insert_with(|| user.user_id());
        }

        let mut orphans = Vec::new();
        for book in catalog.iter() {
            let Some(borrower) = book.borrowed_by() else { continue };
            let holder = by_name.get(borrower).and_then(|id| self.users.find_mut(id));
            if let Some(user) = holder {
                user.add_title(book.title());
            } else {
                warn!(title = book.title(), borrower, "borrowed book has no registered borrower");
                orphans.push(book.title().to_string());
            }
        }
        orphans
    }

    /// Iterate over every user in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &User> + '_ {
        self.users.values()
    }

    /// Number of registered users
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether nobody is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Mutable lookup by validated id
    fn find_user_mut(&mut self, user_id: UserId) -> Result<&mut User> {
        self.users
            .find_mut(&user_id)
            .ok_or(LibraryError::UserNotFound { user_id: user_id.get() })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::book::Book;

    fn setup_directory() -> UserDirectory {
        let mut directory = UserDirectory::new();
        drop(directory.register_user(1, "Ana"));
        drop(directory.register_user(2, "Luis"));
        directory
    }

    #[test]
    fn test_register_and_find() {
        let directory = setup_directory();
        assert_eq!(directory.len(), 2);
        assert!(matches!(directory.find_user(1), Ok(user) if user.name() == "Ana" && user.borrowed_titles().is_empty()));
        assert!(matches!(directory.find_user(9), Err(LibraryError::UserNotFound { user_id: 9 })));
        assert!(matches!(directory.find_user(-1), Err(LibraryError::UserNotFound { user_id: -1 })));
    }

    #[test]
    fn test_register_rejections() {
        let mut directory = setup_directory();

        assert!(matches!(directory.register_user(0, "Zoe"), Err(LibraryError::InvalidId { raw: 0 })));
        assert!(matches!(directory.register_user(-3, "Zoe"), Err(LibraryError::InvalidId { raw: -3 })));
        assert!(matches!(directory.register_user(3, "  "), Err(LibraryError::EmptyField { field: "name" })));
        assert!(matches!(
            directory.register_user(1, "Other"),
            Err(LibraryError::UserAlreadyExists { user_id }) if user_id.get() == 1
        ));

        assert_eq!(directory.len(), 2);
        assert!(matches!(directory.find_user(1), Ok(user) if user.name() == "Ana"));
    }

    #[test]
    fn test_list_users_is_ordered_by_id() {
        let mut directory = UserDirectory::new();
        for (id, name) in [(30, "C"), (10, "A"), (20, "B")] {
            drop(directory.register_user(id, name));
        }
        let ids: Vec<i64> = directory.list_users().iter().map(|u| u.user_id().get()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn test_rebuild_loans_from_catalog() {
        let mut directory = setup_directory();
        let mut catalog = BookCatalog::new();
        let mut dune = Book::new("Dune", "Shelf3", "SciFi");
        dune.lend("Ana", Utc::now());
        let mut emma = Book::new("Emma", "Shelf1", "Classics");
        emma.lend("Nobody", Utc::now());
        drop(catalog.insert(dune));
        drop(catalog.insert(emma));
        drop(catalog.insert(Book::new("Ubik", "Shelf2", "SciFi")));

        let orphans = directory.rebuild_loans(&catalog);
        assert_eq!(orphans, vec!["Emma".to_string()]);
        assert!(matches!(directory.find_user(1), Ok(user) if user.holds("Dune") && user.borrowed_titles().len() == 1));
        assert!(matches!(directory.find_user(2), Ok(user) if user.borrowed_titles().is_empty()));
    }
}
