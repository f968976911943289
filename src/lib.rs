pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod report;

pub use config::Config;
pub use datasource::{HistoryCsvIngestor, IngestError};
pub use domain::{
    CloseLeg, DataQuality, Decimal, Event, EventType, Instrument, OpenLeg, Side, TradeRecord,
    TransactionId,
};
pub use engine::{apply_cutoff, TradeCorrelator};
pub use error::AppError;
pub use orchestration::{Pipeline, PipelineError};
pub use report::RunSummary;
