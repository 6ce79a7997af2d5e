//! JSON request payloads read by the CLI subcommands.
//!
//! Field names follow the camelCase bodies the ingestion side sends. Missing
//! collections default to empty.

use crate::models::{Activity, Anomaly, CodeQualityReport, CodeSample, PrComments, SentimentScore};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentsRequest {
    #[serde(default)]
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomaliesRequest {
    #[serde(default)]
    pub developer_id: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityRequest {
    #[serde(default)]
    pub commit_hash: String,
    pub code: String,
    #[serde(default = "crate::models::default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub developer_id: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    #[serde(default)]
    pub quality_reports: Vec<CodeQualityReport>,
    #[serde(default)]
    pub sentiment_scores: Vec<SentimentScore>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAlertRequest {
    pub quality_report: CodeQualityReport,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentAlertRequest {
    pub pr_number: u64,
    #[serde(default)]
    pub sentiment_scores: Vec<SentimentScore>,
}

/// Body of the comprehensive analysis. Every part is optional so that the
/// CLI can fill activities and samples from git history or a source tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub developer_id: String,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub code_samples: Vec<CodeSample>,
    #[serde(default)]
    pub pr_comments: Vec<PrComments>,
}

/// Read and parse a JSON payload from `path`, or from stdin when `path` is `-`.
pub fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read payload from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload file: {}", path.display()))?
    };

    parse_payload(&content).with_context(|| format!("Invalid payload in {}", path.display()))
}

pub fn parse_payload<T: DeserializeOwned>(content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityType, SentimentLabel};
    use tempfile::TempDir;

    #[test]
    fn test_parse_anomalies_request_without_metadata() {
        let json = r#"{
            "developerId": "dev-1",
            "activities": [
                {"id": "a1", "type": "commit", "developerId": "dev-1",
                 "repositoryId": "r1", "timestamp": "2024-03-01T09:30:00Z"},
                {"id": "a2", "type": "pull_request", "developerId": "dev-1",
                 "repositoryId": "r1", "timestamp": "2024-03-01T11:00:00Z",
                 "metadata": {"linesAdded": 12, "linesDeleted": 3}}
            ]
        }"#;

        let request: AnomaliesRequest = parse_payload(json).unwrap();
        assert_eq!(request.developer_id, "dev-1");
        assert_eq!(request.activities.len(), 2);
        assert_eq!(request.activities[0].kind, ActivityType::Commit);
        assert_eq!(request.activities[0].metadata.lines_changed(), 0);
        assert_eq!(request.activities[1].metadata.lines_changed(), 15);
    }

    #[test]
    fn test_parse_quality_request_default_language() {
        let request: QualityRequest =
            parse_payload(r#"{"commitHash": "abc", "code": "x = 1"}"#).unwrap();
        assert_eq!(request.commit_hash, "abc");
        assert_eq!(request.language, "python");
    }

    #[test]
    fn test_parse_sentiment_alert_request() {
        let json = r#"{"prNumber": 7, "sentimentScores": [
            {"score": -0.8, "label": "negative", "confidence": 0.9}
        ]}"#;
        let request: SentimentAlertRequest = parse_payload(json).unwrap();
        assert_eq!(request.pr_number, 7);
        assert_eq!(request.sentiment_scores[0].label, SentimentLabel::Negative);
    }

    #[test]
    fn test_parse_analyze_request_partial() {
        let request: AnalyzeRequest = parse_payload(r#"{"developerId": "dev-2"}"#).unwrap();
        assert_eq!(request.developer_id, "dev-2");
        assert!(request.activities.is_empty());
        assert!(request.code_samples.is_empty());
        assert!(request.pr_comments.is_empty());
    }

    #[test]
    fn test_read_payload_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("comments.json");
        std::fs::write(&path, r#"{"comments": ["looks good", "please fix"]}"#).unwrap();

        let request: CommentsRequest = read_payload(&path).unwrap();
        assert_eq!(request.comments.len(), 2);
    }

    #[test]
    fn test_read_payload_errors() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(read_payload::<CommentsRequest>(&missing).is_err());

        let bad = temp_dir.path().join("bad.json");
        std::fs::write(&bad, "not json").unwrap();
        assert!(read_payload::<CommentsRequest>(&bad).is_err());
    }
}
