//! Stable event ordering for deterministic processing.

use crate::domain::Event;

/// Sort events by transaction id.
///
/// The sort is stable, so events sharing an id keep their file order.
pub fn sort_events_deterministic(events: &mut [Event]) {
    events.sort_by(|a, b| a.transaction_id.cmp(&b.transaction_id));
}
