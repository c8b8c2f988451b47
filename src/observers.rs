use std::{cell::RefCell, rc::Rc};

use tracing::info;

use crate::{
    book::Book,
    events::{LoanEvent, LoanEventKind},
};

/// Trait for loan transition observation
pub trait LoanObserver {
    /// Called after a borrow or return has been applied
    fn on_loan_event(&self, event: &LoanEvent, book: &Book);
}

/// Logs all transitions that occur in the library
#[derive(Debug)]
pub struct TransitionLogger;

impl LoanObserver for TransitionLogger {
    fn on_loan_event(&self, event: &LoanEvent, book: &Book) {
        info!(
            kind = %event.kind,
            title = %event.book_title,
            user_id = %event.user_id,
            user = %event.user_name,
            state = %book.state().get_description(),
            "loan transition"
        );
    }
}

/// Shared queue of notices produced by [`NotificationService`]
pub type Inbox = Rc<RefCell<Vec<String>>>;

/// Collects a human-readable notice for each transition
///
/// The presentation layer keeps a handle on the inbox and drains it after
/// each operation.
#[derive(Debug, Default)]
pub struct NotificationService {
    /// Pending notices
    inbox: Inbox,
}

impl NotificationService {
    /// Create a service with an empty inbox
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle on the inbox, shared with the service
    #[must_use]
    pub fn inbox(&self) -> Inbox {
        Rc::clone(&self.inbox)
    }
}

impl LoanObserver for NotificationService {
    fn on_loan_event(&self, event: &LoanEvent, _book: &Book) {
        let notice = match event.kind {
            LoanEventKind::Borrow => {
                format!("Book '{}' lent to {}.", event.book_title, event.user_name)
            }
            LoanEventKind::Return => {
                format!("Book '{}' returned by {}.", event.book_title, event.user_name)
            }
        };
        self.inbox.borrow_mut().push(notice);
    }
}
