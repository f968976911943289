use crate::domain::{
    CloseLeg, DataQuality, DataQualityIssue, Decimal, Event, OpenLeg, Side, TradeRecord,
    TransactionId,
};
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashMap;
use tracing::{debug, warn};

use super::metrics;

/// Keep events at or after `cutoff`, preserving order.
///
/// Events whose timestamp failed to parse carry no time and are dropped.
pub fn apply_cutoff(events: Vec<Event>, cutoff: &DateTime<Tz>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.time.as_ref().is_some_and(|time| time >= cutoff))
        .collect()
}

/// Counters describing one correlation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationStats {
    pub opens: usize,
    pub closes_matched: usize,
    /// Closing events whose linked id was never opened (or was cut off).
    pub orphan_closes: usize,
}

/// Trades keyed by opening id, pass counters, and issues found while pairing.
pub type CorrelationOutputs = (
    HashMap<TransactionId, TradeRecord>,
    CorrelationStats,
    DataQuality,
);

/// Pairs opening market orders with the events that close them.
pub struct TradeCorrelator {
    max_units: Decimal,
    pips_multiplier: Decimal,

    trades: HashMap<TransactionId, TradeRecord>,
    stats: CorrelationStats,
    quality: DataQuality,
}

impl TradeCorrelator {
    pub fn new(max_units: Decimal, pips_multiplier: Decimal) -> Self {
        Self {
            max_units,
            pips_multiplier,
            trades: HashMap::new(),
            stats: CorrelationStats::default(),
            quality: DataQuality::default(),
        }
    }

    /// Feed every event in order and return the finished state.
    pub fn correlate(mut self, events: &[Event]) -> CorrelationOutputs {
        for event in events {
            self.process_event(event);
        }
        self.into_outputs()
    }

    /// Process a single event.
    ///
    /// Usable on its own to feed events incrementally, without going through
    /// [`apply_cutoff`]. Callers must feed opening events before the closes
    /// that link to them; a close that arrives first is treated as an orphan.
    /// Events without a timestamp are skipped.
    pub fn process_event(&mut self, event: &Event) {
        let Some(time) = event.time else {
            debug!(id = %event.transaction_id, "skipping event without timestamp");
            return;
        };

        match event.event_type.opening_side() {
            Some(side) => self.handle_open(event, side, time),
            None => self.handle_close(event, time),
        }
    }

    fn handle_open(&mut self, event: &Event, side: Side, time: DateTime<Tz>) {
        if self.trades.contains_key(&event.transaction_id) {
            warn!(id = %event.transaction_id, "duplicate opening event ignored");
            self.quality.record(DataQualityIssue::DuplicateOpen);
            return;
        }

        self.trades.insert(
            event.transaction_id.clone(),
            TradeRecord::Opened(OpenLeg {
                instrument: event.instrument.clone(),
                side,
                open_time: time,
                open_price: event.price,
            }),
        );
        self.stats.opens += 1;
    }

    fn handle_close(&mut self, event: &Event, time: DateTime<Tz>) {
        let Some(record) = self.trades.get_mut(&event.linked_transaction_id) else {
            debug!(
                id = %event.transaction_id,
                linked = %event.linked_transaction_id,
                kind = event.event_type.label(),
                "closing event has no matching open"
            );
            self.stats.orphan_closes += 1;
            return;
        };

        let open = record.open();
        let pips = metrics::pips(open.open_price, event.price, open.side, self.pips_multiplier);
        if pips.is_none() {
            warn!(
                id = %event.transaction_id,
                open_price = %open.open_price,
                close_price = %event.price,
                "pip calculation overflowed, leaving metrics empty"
            );
            self.quality.record(DataQualityIssue::PipOverflow);
        }
        let normalized_pips =
            pips.and_then(|pips| metrics::normalized_pips(pips, event.units, self.max_units));

        record.push_close(CloseLeg {
            close_id: event.transaction_id.clone(),
            close_time: time,
            close_price: event.price,
            units: event.units,
            max_units: self.max_units,
            pips,
            normalized_pips,
            profit: event.profit.clone(),
        });
        self.stats.closes_matched += 1;
    }

    pub fn into_outputs(self) -> CorrelationOutputs {
        (self.trades, self.stats, self.quality)
    }
}
