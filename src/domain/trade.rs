//! Round-trip trade records built by the correlator.

use crate::domain::{Decimal, Instrument, Side, TransactionId};
use chrono::DateTime;
use chrono_tz::Tz;

/// Fields known once the opening market order has been seen.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLeg {
    pub instrument: Instrument,
    pub side: Side,
    pub open_time: DateTime<Tz>,
    pub open_price: Decimal,
}

/// Fields contributed by one closing event.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseLeg {
    pub close_id: TransactionId,
    pub close_time: DateTime<Tz>,
    pub close_price: Decimal,
    pub units: Decimal,
    pub max_units: Decimal,
    /// `None` when the price movement overflowed the decimal range.
    pub pips: Option<Decimal>,
    /// `None` when the normalization could not be computed.
    pub normalized_pips: Option<Decimal>,
    pub profit: String,
}

/// A trade keyed by its opening transaction id.
///
/// A record starts `Opened` and moves to `Closed` on the first matching
/// closing event. Further closes for the same trade (partial closes) are
/// appended in arrival order. `closes` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeRecord {
    Opened(OpenLeg),
    Closed { open: OpenLeg, closes: Vec<CloseLeg> },
}

impl TradeRecord {
    pub fn open(&self) -> &OpenLeg {
        match self {
            TradeRecord::Opened(open) => open,
            TradeRecord::Closed { open, .. } => open,
        }
    }

    pub fn closes(&self) -> &[CloseLeg] {
        match self {
            TradeRecord::Opened(_) => &[],
            TradeRecord::Closed { closes, .. } => closes,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, TradeRecord::Closed { .. })
    }

    /// Attach a closing leg, promoting an `Opened` record to `Closed`.
    pub fn push_close(&mut self, leg: CloseLeg) {
        match self {
            TradeRecord::Closed { closes, .. } => closes.push(leg),
            TradeRecord::Opened(open) => {
                *self = TradeRecord::Closed {
                    open: open.clone(),
                    closes: vec![leg],
                };
            }
        }
    }
}
