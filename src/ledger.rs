//! Append-only, chronological log of borrow and return events.

use tracing::debug;

use crate::{events::LoanEvent, user::UserId};

/// Loan history, never edited or truncated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoanLedger {
    /// Events in the order they were recorded
    events: Vec<LoanEvent>,
}

impl LoanLedger {
    /// Create an empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from previously recorded events, keeping their order
    #[must_use]
    pub fn from_events(events: Vec<LoanEvent>) -> Self {
        Self { events }
    }

    /// Append an event
    pub fn record(&mut self, event: LoanEvent) {
        debug!(kind = %event.kind, title = %event.book_title, "loan event recorded");
        self.events.push(event);
    }

    /// Every event, oldest first
    #[must_use]
    pub fn history(&self) -> &[LoanEvent] {
        &self.events
    }

    /// Events concerning one title, oldest first
    pub fn events_for_title<'a>(&'a self, title: &'a str) -> impl Iterator<Item = &'a LoanEvent> {
        self.events.iter().filter(move |event| event.book_title == title)
    }

    /// Events concerning one user, oldest first
    pub fn events_for_user(&self, user_id: UserId) -> impl Iterator<Item = &LoanEvent> + '_ {
        self.events.iter().filter(move |event| event.user_id == user_id)
    }

    /// The most recent event, if any
    #[must_use]
    pub fn last(&self) -> Option<&LoanEvent> {
        self.events.last()
    }

    /// Number of recorded events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::events::LoanEventKind;

    #[test]
    #[allow(clippy::expect_used)]
    fn test_record_keeps_order_and_filters() {
        let ana = UserId::new(1).expect("positive id");
        let luis = UserId::new(2).expect("positive id");
        let mut ledger = LoanLedger::new();
        assert!(ledger.is_empty());

        ledger.record(LoanEvent::borrow(ana, "Ana", "Dune", Utc::now()));
        ledger.record(LoanEvent::borrow(luis, "Luis", "Emma", Utc::now()));
        ledger.record(LoanEvent::give_back(ana, "Ana", "Dune", Utc::now()));

        let kinds: Vec<LoanEventKind> = ledger.history().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![LoanEventKind::Borrow, LoanEventKind::Borrow, LoanEventKind::Return]);
        assert_eq!(ledger.events_for_title("Dune").count(), 2);
        assert_eq!(ledger.events_for_user(luis).count(), 1);
        assert!(matches!(ledger.last(), Some(e) if e.kind == LoanEventKind::Return));
    }
}
