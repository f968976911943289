//! Output side of the converter: the per-trade CSV report and run summary.

use std::path::PathBuf;
use thiserror::Error;

pub mod emitter;
pub mod summary;

pub use emitter::{to_rows, write_report, ReportRow};
pub use summary::RunSummary;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("cannot create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
