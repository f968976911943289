//! Flattening trade records into report rows and writing them as CSV.
//!
//! Row layout:
//! `id, instrument, side, openTime, openPrice` followed, for each closing
//! event, by `closeId, closeTime, closePrice, units, maxUnits, pips,
//! normalizedPips, profit`. Trades that were never closed stop after
//! `openPrice`, so rows are ragged.

use crate::domain::{decimal::REPORT_SCALE, CloseLeg, TradeRecord, TransactionId};
use chrono::DateTime;
use chrono_tz::Tz;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;

use super::ReportError;

/// Timestamp layout used in the report, e.g. `2019-01-25 17:59:26 +0900 JST`.
pub const REPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z %Z";

/// Columns contributed by the opening leg, including the id.
pub const OPEN_COLUMNS: usize = 5;
/// Columns contributed by each closing leg.
pub const CLOSE_COLUMNS: usize = 8;

pub type ReportRow = Vec<String>;

pub fn format_time(time: &DateTime<Tz>) -> String {
    time.format(REPORT_TIME_FORMAT).to_string()
}

/// Build report rows ordered by trade id.
pub fn to_rows(trades: &HashMap<TransactionId, TradeRecord>) -> Vec<ReportRow> {
    let mut ordered: Vec<_> = trades.iter().collect();
    ordered.sort_by(|(a, _), (b, _)| a.cmp(b));

    ordered
        .into_iter()
        .map(|(id, record)| to_row(id, record))
        .collect()
}

fn to_row(id: &TransactionId, record: &TradeRecord) -> ReportRow {
    let open = record.open();
    let mut row = Vec::with_capacity(OPEN_COLUMNS + CLOSE_COLUMNS * record.closes().len());
    row.push(id.to_string());
    row.push(open.instrument.to_string());
    row.push(open.side.label().to_string());
    row.push(format_time(&open.open_time));
    row.push(open.open_price.to_plain_string());

    for close in record.closes() {
        push_close(&mut row, close);
    }
    row
}

fn push_close(row: &mut ReportRow, close: &CloseLeg) {
    row.push(close.close_id.to_string());
    row.push(format_time(&close.close_time));
    row.push(close.close_price.to_plain_string());
    row.push(close.units.to_plain_string());
    row.push(close.max_units.to_plain_string());
    row.push(
        close
            .pips
            .map(|p| p.to_fixed(REPORT_SCALE))
            .unwrap_or_default(),
    );
    row.push(
        close
            .normalized_pips
            .map(|p| p.to_fixed(REPORT_SCALE))
            .unwrap_or_default(),
    );
    row.push(close.profit.clone());
}

/// Serialize rows to CSV bytes. Row widths may differ.
pub fn render_csv(rows: &[ReportRow]) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

/// Write the report to `path` and return the SHA-256 hex digest of its bytes.
pub fn write_report(path: &Path, rows: &[ReportRow]) -> Result<String, ReportError> {
    let bytes = render_csv(rows)?;
    std::fs::write(path, &bytes).map_err(|source| ReportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
