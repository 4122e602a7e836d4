//! Sequence guard for re-fetched lists.
//!
//! Every fetch takes a ticket when it is issued. Its result is applied only
//! if no later-issued fetch has been applied already, so overlapping
//! re-fetches can complete in any order and the newest request still wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Issue-order position of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

struct Applied<T> {
    ticket: u64,
    value: T,
}

/// A value kept current by re-fetching, guarded against stale completions.
pub struct SyncSlot<T> {
    name: &'static str,
    issued: AtomicU64,
    applied: Mutex<Applied<T>>,
}

impl<T: Clone + Default> SyncSlot<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            issued: AtomicU64::new(0),
            applied: Mutex::new(Applied {
                ticket: 0,
                value: T::default(),
            }),
        }
    }

    /// Take a ticket; call right before issuing the request.
    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply a completed fetch. Returns false when a newer result is already in.
    pub fn apply(&self, ticket: Ticket, value: T) -> bool {
        let Ok(mut applied) = self.applied.lock() else {
            tracing::error!(list = self.name, "Sync slot lock poisoned");
            return false;
        };
        if ticket.0 < applied.ticket {
            tracing::debug!(
                list = self.name,
                ticket = ticket.0,
                applied = applied.ticket,
                "Discarding stale fetch result"
            );
            return false;
        }
        applied.ticket = ticket.0;
        applied.value = value;
        true
    }

    pub fn get(&self) -> T {
        self.applied
            .lock()
            .map(|applied| applied.value.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_issue_wins_regardless_of_completion_order() {
        let slot: SyncSlot<Vec<&str>> = SyncSlot::new("initiative");
        let first = slot.issue();
        let second = slot.issue();

        assert!(slot.apply(second, vec!["new"]));
        assert!(!slot.apply(first, vec!["old"]));
        assert_eq!(slot.get(), vec!["new"]);
    }

    #[test]
    fn in_order_completions_all_apply() {
        let slot: SyncSlot<u32> = SyncSlot::new("roster");
        for n in 1..=3 {
            let ticket = slot.issue();
            assert!(slot.apply(ticket, n));
        }
        assert_eq!(slot.get(), 3);
    }

    #[test]
    fn any_interleaving_ends_with_newest_completed() {
        // Three overlapping fetches completing in every possible order.
        let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        for order in orders {
            let slot: SyncSlot<usize> = SyncSlot::new("initiative");
            let tickets: Vec<Ticket> = (0..3).map(|_| slot.issue()).collect();
            for i in order {
                slot.apply(tickets[i], i);
            }
            assert_eq!(slot.get(), 2, "completion order {:?}", order);
        }
    }
}
