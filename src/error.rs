use crate::config::ConfigError;
use crate::orchestration::PipelineError;
use thiserror::Error;

/// Top-level failure of a conversion run. Every variant is fatal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Conversion failed: {0}")]
    Pipeline(#[from] PipelineError),
}

impl AppError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Pipeline(_) => 1,
        }
    }
}
