//! Pure computation: cutoff filtering, trade pairing and pip metrics.

pub mod correlator;
pub mod metrics;

pub use correlator::{apply_cutoff, CorrelationOutputs, CorrelationStats, TradeCorrelator};
pub use metrics::{normalized_pips, pips};
