//! Reading and filtering broker trade history exports.
//!
//! The export has no stable header names, so columns are addressed by
//! position (see [`columns`]). Rows for other instruments and event kinds
//! are dropped; the rest become [`Event`]s ordered by transaction id.

use crate::domain::{
    sort_events_deterministic, DataQuality, DataQualityIssue, Decimal, Event, EventType,
    Instrument, TransactionId,
};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use csv::ByteRecord;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Fixed column positions in the export.
pub mod columns {
    pub const TRANSACTION_ID: usize = 0;
    pub const EVENT_TYPE: usize = 2;
    pub const INSTRUMENT: usize = 3;
    pub const UNITS: usize = 4;
    pub const TIME_UTC: usize = 5;
    pub const PRICE: usize = 6;
    pub const PROFIT: usize = 9;
    pub const LINKED_TRANSACTION_ID: usize = 15;

    /// Narrowest row that still has every column above.
    pub const MIN_WIDTH: usize = LINKED_TRANSACTION_ID + 1;
}

/// Layout of the exported UTC timestamp column.
pub const TIME_UTC_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("lz4 decode error: {0}")]
    Lz4(String),
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
}

/// Row counts observed while ingesting one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub rows_read: usize,
    pub rows_kept: usize,
    /// Rows for another instrument or an unrecognized event label.
    pub rows_filtered: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Kept events, ascending by transaction id.
    pub events: Vec<Event>,
    pub stats: IngestStats,
    pub quality: DataQuality,
}

/// Turns an export into filtered, time-normalized events for one instrument.
#[derive(Debug, Clone)]
pub struct HistoryCsvIngestor {
    instrument: Instrument,
    timezone: Tz,
}

impl HistoryCsvIngestor {
    pub fn new(instrument: Instrument, timezone: Tz) -> Self {
        Self {
            instrument,
            timezone,
        }
    }

    /// Ingest a file. Paths ending in `.lz4` are decompressed first.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or read, or if the CSV framing is broken.
    pub fn read_path(&self, path: &Path) -> Result<Ingested, IngestError> {
        let file = File::open(path).map_err(|source| IngestError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        let ingested = if is_lz4(path) {
            let mut compressed = Vec::new();
            reader.read_to_end(&mut compressed)?;
            let csv = Self::decompress_lz4_frame(&compressed)?;
            self.parse_reader(csv.as_slice())?
        } else {
            self.parse_reader(reader)?
        };

        info!(
            path = %path.display(),
            rows_read = ingested.stats.rows_read,
            rows_kept = ingested.stats.rows_kept,
            rows_filtered = ingested.stats.rows_filtered,
            data_quality_issues = ingested.quality.total(),
            "ingested trade history"
        );

        Ok(ingested)
    }

    pub fn decompress_lz4_frame(lz4_bytes: &[u8]) -> Result<Vec<u8>, IngestError> {
        let mut decoder = lz4_flex::frame::FrameDecoder::new(lz4_bytes);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| IngestError::Lz4(e.to_string()))?;
        Ok(out)
    }

    /// Parse CSV rows from any reader. A header row, if present, is dropped by
    /// the instrument filter like any other foreign row.
    ///
    /// Rows are read as raw bytes; only the columns of kept rows are decoded,
    /// so stray non-UTF-8 text elsewhere in the export never fails the run.
    pub fn parse_reader<R: Read>(&self, input: R) -> Result<Ingested, IngestError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut ingested = Ingested::default();
        for record in reader.byte_records() {
            let record = record?;
            ingested.stats.rows_read += 1;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() < columns::MIN_WIDTH {
                warn!(line, width = record.len(), "skipping row with too few columns");
                ingested.quality.record(DataQualityIssue::ShortRow);
                continue;
            }

            let Some(event_type) = self.accept(&record) else {
                ingested.stats.rows_filtered += 1;
                continue;
            };

            let event = self.to_event(&record, event_type, line, &mut ingested.quality);
            ingested.events.push(event);
            ingested.stats.rows_kept += 1;
        }

        sort_events_deterministic(&mut ingested.events);
        Ok(ingested)
    }

    /// Instrument and event-type filter. Returns the event kind for kept rows.
    fn accept(&self, record: &ByteRecord) -> Option<EventType> {
        if record.get(columns::INSTRUMENT)? != self.instrument.as_str().as_bytes() {
            return None;
        }
        let label = std::str::from_utf8(record.get(columns::EVENT_TYPE)?).ok()?;
        EventType::from_label(label)
    }

    fn to_event(
        &self,
        record: &ByteRecord,
        event_type: EventType,
        line: u64,
        quality: &mut DataQuality,
    ) -> Event {
        let mut lossy = false;
        let mut field = |idx: usize| {
            let raw = record.get(idx).unwrap_or_default();
            match std::str::from_utf8(raw) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    lossy = true;
                    String::from_utf8_lossy(raw).into_owned()
                }
            }
        };
        let transaction_id = TransactionId::new(field(columns::TRANSACTION_ID));
        let raw_time = field(columns::TIME_UTC);
        let raw_price = field(columns::PRICE);
        let raw_units = field(columns::UNITS);
        let profit = field(columns::PROFIT);
        let linked_transaction_id = TransactionId::new(field(columns::LINKED_TRANSACTION_ID));

        if lossy {
            warn!(line, id = %transaction_id, "invalid UTF-8 in kept row, decoded lossily");
            quality.record(DataQualityIssue::BadEncoding);
        }

        let time = match parse_utc(&raw_time, self.timezone) {
            Ok(time) => Some(time),
            Err(e) => {
                warn!(
                    line,
                    id = %transaction_id,
                    value = %raw_time,
                    error = %e,
                    "unparseable timestamp"
                );
                quality.record(DataQualityIssue::BadTimestamp);
                None
            }
        };

        let price = parse_or_zero(&raw_price, || {
            warn!(line, id = %transaction_id, value = %raw_price, "unparseable price, using 0");
            quality.record(DataQualityIssue::BadPrice);
        });
        let units = parse_or_zero(&raw_units, || {
            warn!(line, id = %transaction_id, value = %raw_units, "unparseable units, using 0");
            quality.record(DataQualityIssue::BadUnits);
        });

        Event {
            transaction_id,
            instrument: self.instrument.clone(),
            event_type,
            linked_transaction_id,
            units,
            time,
            price,
            profit,
        }
    }
}

fn is_lz4(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("lz4"))
        .unwrap_or(false)
}

/// Parse an exported UTC timestamp and express it in `timezone`.
pub fn parse_utc(raw: &str, timezone: Tz) -> Result<DateTime<Tz>, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), TIME_UTC_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive).with_timezone(&timezone))
}

fn parse_or_zero(raw: &str, on_error: impl FnOnce()) -> Decimal {
    Decimal::from_str_canonical(raw).unwrap_or_else(|_| {
        on_error();
        Decimal::zero()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Tokyo;
    use std::io::Write;

    /// Build a 16-column export row with the interesting columns filled in.
    fn row(
        id: &str,
        kind: &str,
        instrument: &str,
        time: &str,
        price: &str,
        linked: &str,
    ) -> String {
        let mut cols = vec![String::new(); columns::MIN_WIDTH];
        cols[columns::TRANSACTION_ID] = id.to_string();
        cols[1] = "acct".to_string();
        cols[columns::EVENT_TYPE] = kind.to_string();
        cols[columns::INSTRUMENT] = instrument.to_string();
        cols[columns::UNITS] = "10000".to_string();
        cols[columns::TIME_UTC] = time.to_string();
        cols[columns::PRICE] = price.to_string();
        cols[columns::PROFIT] = "1.5".to_string();
        cols[columns::LINKED_TRANSACTION_ID] = linked.to_string();
        cols.join(",")
    }

    fn ingestor() -> HistoryCsvIngestor {
        HistoryCsvIngestor::new(Instrument::new("EUR/GBP"), Tokyo)
    }

    fn compress_lz4_frame(input: &[u8]) -> Vec<u8> {
        let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
        encoder.write_all(input).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn keeps_only_configured_instrument_and_known_kinds() {
        let csv = [
            row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", ""),
            row("2", "Buy Market", "USD/JPY", "2019-01-25 08:59:26", "110.1", ""),
            row("3", "Buy Limit", "EUR/GBP", "2019-01-25 08:59:26", "1.1", ""),
            row("4", "Stop Loss", "EUR/GBP", "2019-01-25 09:00:00", "1.0", "1"),
            row("5", "Order Cancel", "EUR/GBP", "2019-01-25 09:00:00", "1.0", ""),
        ]
        .join("\n");

        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        let ids: Vec<_> = ingested.events.iter().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(ingested.stats.rows_read, 5);
        assert_eq!(ingested.stats.rows_kept, 2);
        assert_eq!(ingested.stats.rows_filtered, 3);
        assert!(ingested.quality.is_clean());
    }

    #[test]
    fn header_row_is_filtered_out() {
        let header = row("Transaction ID", "Type", "Instrument", "Time", "Price", "Linked");
        let csv = format!(
            "{}\n{}",
            header,
            row("7", "Sell Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "")
        );

        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        assert_eq!(ingested.events.len(), 1);
        assert_eq!(ingested.events[0].event_type, EventType::SellMarket);
        assert_eq!(ingested.stats.rows_filtered, 1);
    }

    #[test]
    fn converts_utc_to_target_timezone() {
        let csv = row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1000", "");
        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        let time = ingested.events[0].time.unwrap();
        assert_eq!(
            time.format("%Y-%m-%d %H:%M:%S %z %Z").to_string(),
            "2019-01-25 17:59:26 +0900 JST"
        );
    }

    #[test]
    fn sorts_by_numeric_transaction_id() {
        let csv = [
            row("1000", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", ""),
            row("999", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", ""),
            row("10001", "Close Trade", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "999"),
        ]
        .join("\n");

        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        let ids: Vec<_> = ingested.events.iter().map(|e| e.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["999", "1000", "10001"]);
    }

    #[test]
    fn bad_timestamp_keeps_event_without_time() {
        let csv = row("1", "Buy Market", "EUR/GBP", "25/01/2019 08:59", "1.1", "");
        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        assert_eq!(ingested.events.len(), 1);
        assert!(ingested.events[0].time.is_none());
        assert_eq!(ingested.quality.bad_timestamps, 1);
    }

    #[test]
    fn bad_numbers_are_zero_filled_and_counted() {
        let csv = row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "n/a", "")
            .replacen("10000", "ten", 1);
        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        let event = &ingested.events[0];
        assert!(event.price.is_zero());
        assert!(event.units.is_zero());
        assert_eq!(ingested.quality.bad_prices, 1);
        assert_eq!(ingested.quality.bad_units, 1);
    }

    #[test]
    fn short_rows_are_skipped() {
        let csv = format!(
            "1,acct,Buy Market,EUR/GBP\n{}",
            row("2", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "")
        );
        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        assert_eq!(ingested.events.len(), 1);
        assert_eq!(ingested.quality.short_rows, 1);
        assert_eq!(ingested.stats.rows_read, 2);
    }

    #[test]
    fn non_utf8_in_foreign_row_does_not_abort() {
        let mut csv = row("2", "Buy Market", "USD/JPY", "2019-01-25 08:59:26", "110.1", "")
            .replacen("acct", "\u{1}", 1)
            .into_bytes();
        let pos = csv.iter().position(|&b| b == 1).unwrap();
        csv.splice(pos..pos + 1, [0x83, 0x65, 0x83, 0x58]);
        csv.push(b'\n');
        csv.extend_from_slice(
            row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "").as_bytes(),
        );

        let ingested = ingestor().parse_reader(csv.as_slice()).unwrap();
        assert_eq!(ingested.events.len(), 1);
        assert_eq!(ingested.events[0].transaction_id.as_str(), "1");
        assert_eq!(ingested.stats.rows_filtered, 1);
        assert!(ingested.quality.is_clean());
    }

    #[test]
    fn non_utf8_in_kept_column_is_decoded_lossily_and_counted() {
        let mut csv = row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "")
            .replacen("1.5", "\u{1}", 1)
            .into_bytes();
        let pos = csv.iter().position(|&b| b == 1).unwrap();
        csv.splice(pos..pos + 1, [0x83, 0x65]);

        let ingested = ingestor().parse_reader(csv.as_slice()).unwrap();
        assert_eq!(ingested.events.len(), 1);
        assert!(ingested.events[0].profit.contains('\u{FFFD}'));
        assert_eq!(ingested.events[0].price.to_canonical_string(), "1.1");
        assert_eq!(ingested.quality.bad_encodings, 1);
    }

    #[test]
    fn copies_linked_id_and_profit() {
        let csv = row("11", "Take Profit", "EUR/GBP", "2019-01-25 09:10:00", "1.105", "10");
        let ingested = ingestor().parse_reader(csv.as_bytes()).unwrap();
        let event = &ingested.events[0];
        assert_eq!(event.linked_transaction_id.as_str(), "10");
        assert_eq!(event.profit, "1.5");
        assert_eq!(event.units.to_canonical_string(), "10000");
    }

    #[test]
    fn empty_input_yields_no_events() {
        let ingested = ingestor().parse_reader(&b""[..]).unwrap();
        assert!(ingested.events.is_empty());
        assert_eq!(ingested.stats, IngestStats::default());
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = ingestor()
            .read_path(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Open { .. }));
    }

    #[test]
    fn reads_lz4_compressed_file() {
        let csv = row("1", "Buy Market", "EUR/GBP", "2019-01-25 08:59:26", "1.1", "");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv.lz4");
        std::fs::write(&path, compress_lz4_frame(csv.as_bytes())).unwrap();

        let ingested = ingestor().read_path(&path).unwrap();
        assert_eq!(ingested.events.len(), 1);
    }

    #[test]
    fn corrupt_lz4_is_an_error() {
        let err = HistoryCsvIngestor::decompress_lz4_frame(b"not lz4").unwrap_err();
        assert!(matches!(err, IngestError::Lz4(_)));
    }
}
