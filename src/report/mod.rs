//! Report generation for the comprehensive analysis.

pub mod generator;

pub use generator::{generate_json_report, generate_markdown_report, write_report};

use crate::analysis::{summarize, AnalysisSummary};
use crate::models::ComprehensiveAnalysis;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the analysis inputs came from and how long it took.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub developer_id: String,
    pub generated_at: DateTime<Utc>,
    /// Name of the sentiment classifier backend.
    pub classifier: String,
    pub activities_analyzed: usize,
    pub code_samples_analyzed: usize,
    pub pull_requests_analyzed: usize,
    pub duration_seconds: f64,
}

/// A finished analysis plus its summary, ready to render.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: AnalysisSummary,
    pub analysis: ComprehensiveAnalysis,
}

impl Report {
    pub fn new(metadata: ReportMetadata, analysis: ComprehensiveAnalysis) -> Self {
        Self {
            metadata,
            summary: summarize(&analysis),
            analysis,
        }
    }
}
