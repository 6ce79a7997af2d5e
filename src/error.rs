//! Error types for the analysis capabilities.
//!
//! Classifier and model failures are logged inside the analyzers and degrade
//! to their fallback results. Ingestion failures are returned to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The text-classification capability failed or timed out.
    #[error("sentiment classifier failed: {0}")]
    Classifier(String),

    /// The outlier-detection model could not be fitted.
    #[error("outlier model failed: {0}")]
    Model(String),

    /// Activity records could not be read from the source repository.
    #[error("activity ingestion failed: {0}")]
    Ingest(#[from] git2::Error),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;
