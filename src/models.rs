//! Data models for the activity analyzer.
//!
//! This module contains the records that flow between the analyzers:
//! activities coming in, and anomalies, quality reports, sentiment scores,
//! alerts and recommendations going out. Every output record is a value
//! object assembled fresh on each call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Score above which a sentiment is labelled positive.
pub const POSITIVE_THRESHOLD: f64 = 0.2;
/// Score below which a sentiment is labelled negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.2;

/// Severity (or priority) level shared by anomalies, alerts and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth a look when convenient
    Low,
    /// Should be addressed soon
    Medium,
    /// Needs attention now
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
        }
    }
}

/// Kind of developer activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Commit,
    PullRequest,
    Issue,
    Review,
    /// Anything the ingestion side sent that we don't recognise.
    #[serde(other)]
    Unknown,
}

impl ActivityType {
    /// Numeric encoding used in outlier feature vectors.
    pub fn code(&self) -> f64 {
        match self {
            ActivityType::Commit => 0.0,
            ActivityType::PullRequest => 1.0,
            ActivityType::Issue => 2.0,
            ActivityType::Review => 3.0,
            ActivityType::Unknown => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Commit => "commit",
            ActivityType::PullRequest => "pull_request",
            ActivityType::Issue => "issue",
            ActivityType::Review => "review",
            ActivityType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional per-activity details. Missing numbers read as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_added: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_deleted: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_changed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<Vec<String>>,
}

impl ActivityMetadata {
    /// Lines added plus lines deleted, saturating at `u64::MAX`.
    pub fn lines_changed(&self) -> u64 {
        self.lines_added
            .unwrap_or(0)
            .saturating_add(self.lines_deleted.unwrap_or(0))
    }

    pub fn files_changed(&self) -> u64 {
        self.files_changed.unwrap_or(0)
    }
}

/// One recorded developer action. Read-only once ingested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Identifier assigned by the ingestion side.
    #[serde(default)]
    pub id: String,
    /// What kind of activity this was.
    #[serde(rename = "type")]
    pub kind: ActivityType,
    /// Developer who performed it.
    #[serde(default)]
    pub developer_id: String,
    /// Repository it happened in.
    #[serde(default)]
    pub repository_id: String,
    /// When it happened.
    pub timestamp: DateTime<Utc>,
    /// Optional details.
    #[serde(default)]
    pub metadata: ActivityMetadata,
}

/// Kind of detected anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    ProductivityDrop,
    UnusualPattern,
    QualityIssue,
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyType::ProductivityDrop => write!(f, "productivity_drop"),
            AnomalyType::UnusualPattern => write!(f, "unusual_pattern"),
            AnomalyType::QualityIssue => write!(f, "quality_issue"),
        }
    }
}

/// Closed-open time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A flagged deviation in a developer's activity pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub id: String,
    pub developer_id: String,
    #[serde(rename = "type")]
    pub kind: AnomalyType,
    pub severity: Severity,
    pub description: String,
    pub detected_at: DateTime<Utc>,
    pub affected_time_range: TimeRange,
    /// Set only by an external review workflow, never by the detectors.
    #[serde(default)]
    pub validated: bool,
}

impl Anomaly {
    /// Creates a new, unvalidated anomaly with a fresh identifier.
    pub fn new(
        developer_id: &str,
        kind: AnomalyType,
        severity: Severity,
        description: String,
        affected_time_range: TimeRange,
    ) -> Self {
        Self {
            id: new_id(),
            developer_id: developer_id.to_string(),
            kind,
            severity,
            description,
            detected_at: Utc::now(),
            affected_time_range,
            validated: false,
        }
    }
}

/// Per-commit code-quality scores. All numbers lie in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeQualityReport {
    #[serde(default)]
    pub commit_hash: String,
    /// Higher means simpler code.
    pub complexity: f64,
    /// Higher means better documented.
    pub documentation: f64,
    /// Higher means fewer style violations.
    pub standards: f64,
    /// Mean of the three dimensions.
    pub overall_score: f64,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl CodeQualityReport {
    /// Builds a report, clamping every dimension and deriving the overall score.
    pub fn new(
        commit_hash: &str,
        complexity: f64,
        documentation: f64,
        standards: f64,
        issues: Vec<String>,
    ) -> Self {
        let complexity = clamp_score(complexity);
        let documentation = clamp_score(documentation);
        let standards = clamp_score(standards);
        let overall_score = clamp_score((complexity + documentation + standards) / 3.0);

        Self {
            commit_hash: commit_hash.to_string(),
            complexity,
            documentation,
            standards,
            overall_score,
            issues,
        }
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Tri-state sentiment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl SentimentLabel {
    /// Derives the label from a signed score using the fixed thresholds.
    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_THRESHOLD {
            SentimentLabel::Positive
        } else if score < NEGATIVE_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Neutral => write!(f, "neutral"),
            SentimentLabel::Negative => write!(f, "negative"),
        }
    }
}

/// Signed polarity and confidence derived from a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// -1 (negative) to 1 (positive).
    pub score: f64,
    pub label: SentimentLabel,
    /// 0 to 1.
    pub confidence: f64,
}

impl SentimentScore {
    /// Builds a score, deriving the label from the (clamped) score.
    pub fn from_score(score: f64, confidence: f64) -> Self {
        let score = score.clamp(-1.0, 1.0);
        Self {
            score,
            label: SentimentLabel::from_score(score),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// A zero score with the given confidence.
    pub fn neutral(confidence: f64) -> Self {
        Self::from_score(0.0, confidence)
    }
}

/// Kind of alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    CodeQuality,
    HighComplexity,
    PoorDocumentation,
    QualityIssue,
    NegativeSentiment,
    VeryNegativeComment,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlertType::CodeQuality => "code_quality",
            AlertType::HighComplexity => "high_complexity",
            AlertType::PoorDocumentation => "poor_documentation",
            AlertType::QualityIssue => "quality_issue",
            AlertType::NegativeSentiment => "negative_sentiment",
            AlertType::VeryNegativeComment => "very_negative_comment",
        };
        f.write_str(name)
    }
}

/// Alert raised for a quality issue or negative sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AlertType,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Commit hash, PR number or developer id, as text.
    pub related_entity: String,
}

impl Alert {
    pub fn new(kind: AlertType, severity: Severity, message: String, related_entity: &str) -> Self {
        Self {
            id: new_id(),
            kind,
            severity,
            message,
            created_at: Utc::now(),
            related_entity: related_entity.to_string(),
        }
    }
}

/// Kind of recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    CodeReviewParticipation,
    PullRequestCreation,
    ProductivityRecovery,
    CodeComplexity,
    Documentation,
    CodingStandards,
    CollaborationTone,
}

/// Actionable recommendation for a developer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub developer_id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    pub title: String,
    pub description: String,
    /// Ordered, never empty.
    pub action_items: Vec<String>,
    pub priority: Severity,
    pub created_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn new(
        developer_id: &str,
        kind: RecommendationType,
        priority: Severity,
        title: &str,
        description: String,
        action_items: Vec<String>,
    ) -> Self {
        Self {
            id: new_id(),
            developer_id: developer_id.to_string(),
            kind,
            title: title.to_string(),
            description,
            action_items,
            priority,
            created_at: Utc::now(),
        }
    }
}

/// A piece of code to score, tagged with the commit it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSample {
    #[serde(default)]
    pub commit_hash: String,
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
}

pub fn default_language() -> String {
    "python".to_string()
}

/// Comment texts attached to one pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrComments {
    pub pr_number: u64,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// Result of the comprehensive per-developer workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveAnalysis {
    pub developer_id: String,
    pub anomalies: Vec<Anomaly>,
    pub quality_reports: Vec<CodeQualityReport>,
    pub sentiment_scores: Vec<SentimentScore>,
    pub recommendations: Vec<Recommendation>,
    pub alerts: Vec<Alert>,
}

/// Random unique identifier for generated records.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
