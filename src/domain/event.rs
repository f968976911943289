//! Order events read from a trade history export.

use crate::domain::{Decimal, Instrument, Side, TransactionId};
use chrono::DateTime;
use chrono_tz::Tz;

/// The six order event kinds the converter understands.
///
/// Every other event label in an export (orders, fees, transfers, ...) is
/// dropped at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    BuyMarket,
    SellMarket,
    CloseTrade,
    TakeProfit,
    MarginCloseout,
    StopLoss,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::BuyMarket,
        EventType::SellMarket,
        EventType::CloseTrade,
        EventType::TakeProfit,
        EventType::MarginCloseout,
        EventType::StopLoss,
    ];

    /// Match the exact export label. Labels are case sensitive.
    pub fn from_label(label: &str) -> Option<EventType> {
        match label {
            "Buy Market" => Some(EventType::BuyMarket),
            "Sell Market" => Some(EventType::SellMarket),
            "Close Trade" => Some(EventType::CloseTrade),
            "Take Profit" => Some(EventType::TakeProfit),
            "Margin Closeout" => Some(EventType::MarginCloseout),
            "Stop Loss" => Some(EventType::StopLoss),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventType::BuyMarket => "Buy Market",
            EventType::SellMarket => "Sell Market",
            EventType::CloseTrade => "Close Trade",
            EventType::TakeProfit => "Take Profit",
            EventType::MarginCloseout => "Margin Closeout",
            EventType::StopLoss => "Stop Loss",
        }
    }

    /// Side of the trade this event opens, or `None` for closing events.
    pub fn opening_side(&self) -> Option<Side> {
        match self {
            EventType::BuyMarket => Some(Side::Buy),
            EventType::SellMarket => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn is_closing(&self) -> bool {
        self.opening_side().is_none()
    }
}

/// A filtered, normalized order event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub transaction_id: TransactionId,
    pub instrument: Instrument,
    pub event_type: EventType,
    /// Opening transaction this event refers back to. Only meaningful for closing events.
    pub linked_transaction_id: TransactionId,
    pub units: Decimal,
    /// Event time in the configured report timezone.
    /// `None` when the exported UTC timestamp could not be parsed.
    pub time: Option<DateTime<Tz>>,
    pub price: Decimal,
    /// Account-currency profit column, copied through verbatim.
    pub profit: String,
}
