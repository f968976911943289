//! Input side of the converter: trade history exports.

pub mod history_csv;

pub use history_csv::{HistoryCsvIngestor, IngestError, IngestStats, Ingested};
