//! Domain types for trade history conversion.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: TransactionId, Instrument, Side
//! - Order events and the two-phase trade record
//! - Deterministic event ordering
//! - Data-quality counters for best-effort parsing

pub mod decimal;
pub mod event;
pub mod ordering;
pub mod primitives;
pub mod quality;
pub mod trade;

pub use decimal::Decimal;
pub use event::{Event, EventType};
pub use ordering::sort_events_deterministic;
pub use primitives::{Instrument, Side, TransactionId};
pub use quality::{DataQuality, DataQualityIssue};
pub use trade::{CloseLeg, OpenLeg, TradeRecord};
