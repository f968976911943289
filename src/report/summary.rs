//! Machine-readable summary of one conversion run.

use crate::domain::DataQuality;
use serde::Serialize;
use std::path::Path;

use super::ReportError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub input_path: String,
    pub output_path: String,
    pub instrument: String,
    pub timezone: String,
    pub cutoff: String,
    pub rows_read: usize,
    pub rows_kept: usize,
    pub rows_filtered: usize,
    pub events_before_cutoff: usize,
    pub trades: usize,
    pub complete_trades: usize,
    pub partial_trades: usize,
    pub orphan_closes: usize,
    pub data_quality: DataQuality,
    /// SHA-256 of the report bytes; equal digests mean byte-identical reports.
    pub report_sha256: String,
}

impl RunSummary {
    pub fn write_json(&self, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| ReportError::Create {
            path: path.to_path_buf(),
            source,
        })
    }
}
