//! Data-quality bookkeeping for best-effort parsing.
//!
//! Malformed fields never abort a run. Each one is logged where it is found
//! and tallied here so the run summary can report how much of the output
//! rests on zero-filled or skipped input.

use serde::Serialize;

/// Kinds of recoverable input problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataQualityIssue {
    /// Row too short to address by column position; skipped.
    ShortRow,
    /// UTC timestamp did not parse; the event carries no time.
    BadTimestamp,
    /// Price column did not parse; zero-filled.
    BadPrice,
    /// Units column did not parse; zero-filled.
    BadUnits,
    /// A kept column was not valid UTF-8; decoded with replacement characters.
    BadEncoding,
    /// A second opening event reused an id already open; ignored.
    DuplicateOpen,
    /// Pip arithmetic overflowed the decimal range; the cell is left empty.
    PipOverflow,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataQuality {
    pub short_rows: usize,
    pub bad_timestamps: usize,
    pub bad_prices: usize,
    pub bad_units: usize,
    pub bad_encodings: usize,
    pub duplicate_opens: usize,
    pub pip_overflows: usize,
}

impl DataQuality {
    pub fn record(&mut self, issue: DataQualityIssue) {
        match issue {
            DataQualityIssue::ShortRow => self.short_rows += 1,
            DataQualityIssue::BadTimestamp => self.bad_timestamps += 1,
            DataQualityIssue::BadPrice => self.bad_prices += 1,
            DataQualityIssue::BadUnits => self.bad_units += 1,
            DataQualityIssue::BadEncoding => self.bad_encodings += 1,
            DataQualityIssue::DuplicateOpen => self.duplicate_opens += 1,
            DataQualityIssue::PipOverflow => self.pip_overflows += 1,
        }
    }

    pub fn merge(&mut self, other: &DataQuality) {
        self.short_rows += other.short_rows;
        self.bad_timestamps += other.bad_timestamps;
        self.bad_prices += other.bad_prices;
        self.bad_units += other.bad_units;
        self.bad_encodings += other.bad_encodings;
        self.duplicate_opens += other.duplicate_opens;
        self.pip_overflows += other.pip_overflows;
    }

    pub fn total(&self) -> usize {
        self.short_rows
            + self.bad_timestamps
            + self.bad_prices
            + self.bad_units
            + self.bad_encodings
            + self.duplicate_opens
            + self.pip_overflows
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}
