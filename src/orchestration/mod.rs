//! Wiring of ingestion, correlation and reporting into a single run.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineError};
