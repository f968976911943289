use crate::config::Config;
use crate::datasource::{HistoryCsvIngestor, IngestError};
use crate::engine::{apply_cutoff, TradeCorrelator};
use crate::report::{self, emitter::format_time, ReportError, RunSummary};
use thiserror::Error;
use tracing::info;

/// One conversion run: ingest, cut off, correlate, emit.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the whole conversion.
    ///
    /// Nothing is written if the input cannot be ingested.
    pub fn run(&self) -> Result<RunSummary, PipelineError> {
        let config = &self.config;
        let ingestor = HistoryCsvIngestor::new(config.instrument.clone(), config.timezone);
        let ingested = ingestor.read_path(&config.input_path)?;

        let kept_before_cutoff = ingested.events.len();
        let events = apply_cutoff(ingested.events, &config.cutoff);
        let events_before_cutoff = kept_before_cutoff - events.len();
        info!(
            cutoff = %format_time(&config.cutoff),
            remaining = events.len(),
            dropped = events_before_cutoff,
            "applied cutoff"
        );

        let correlator = TradeCorrelator::new(config.max_units, config.pips_multiplier);
        let (trades, stats, correlation_quality) = correlator.correlate(&events);
        let complete_trades = trades.values().filter(|t| t.is_complete()).count();
        info!(
            trades = trades.len(),
            complete = complete_trades,
            orphan_closes = stats.orphan_closes,
            "correlated trades"
        );

        let rows = report::to_rows(&trades);
        let report_sha256 = report::write_report(&config.output_path, &rows)?;
        info!(
            path = %config.output_path.display(),
            rows = rows.len(),
            sha256 = %report_sha256,
            "wrote report"
        );

        let mut data_quality = ingested.quality;
        data_quality.merge(&correlation_quality);

        let summary = RunSummary {
            input_path: config.input_path.display().to_string(),
            output_path: config.output_path.display().to_string(),
            instrument: config.instrument.to_string(),
            timezone: config.timezone.name().to_string(),
            cutoff: format_time(&config.cutoff),
            rows_read: ingested.stats.rows_read,
            rows_kept: ingested.stats.rows_kept,
            rows_filtered: ingested.stats.rows_filtered,
            events_before_cutoff,
            trades: trades.len(),
            complete_trades,
            partial_trades: trades.len() - complete_trades,
            orphan_closes: stats.orphan_closes,
            data_quality,
            report_sha256,
        };

        if let Some(path) = &config.summary_path {
            summary.write_json(path)?;
            info!(path = %path.display(), "wrote run summary");
        }

        Ok(summary)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
