//! Alerts for low code quality and negative review sentiment.

use crate::models::{Alert, AlertType, CodeQualityReport, SentimentLabel, SentimentScore, Severity};
use tracing::debug;

const LOW_QUALITY: f64 = 40.0;
const HIGH_COMPLEXITY: f64 = 30.0;
const POOR_DOCUMENTATION: f64 = 30.0;
const HIGH_NEGATIVE_RATIO: f64 = 0.4;
const ELEVATED_NEGATIVE_RATIO: f64 = 0.25;
const VERY_NEGATIVE_SCORE: f64 = -0.7;
const VERY_NEGATIVE_CONFIDENCE: f64 = 0.8;

/// Turns quality reports and sentiment scores into alerts. Stateless.
#[derive(Debug, Clone, Default)]
pub struct AlertGenerator;

impl AlertGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Alerts for one commit's quality report.
    pub fn quality_alerts(&self, report: &CodeQualityReport) -> Vec<Alert> {
        let commit = report.commit_hash.as_str();
        let mut alerts = Vec::new();

        if report.overall_score < LOW_QUALITY {
            alerts.push(Alert::new(
                AlertType::CodeQuality,
                Severity::High,
                format!(
                    "Low code quality detected in commit {}: score {:.1}/100",
                    commit, report.overall_score
                ),
                commit,
            ));
        }

        if report.complexity < HIGH_COMPLEXITY {
            alerts.push(Alert::new(
                AlertType::HighComplexity,
                Severity::Medium,
                format!(
                    "High code complexity in commit {}: complexity score {:.1}/100",
                    commit, report.complexity
                ),
                commit,
            ));
        }

        if report.documentation < POOR_DOCUMENTATION {
            alerts.push(Alert::new(
                AlertType::PoorDocumentation,
                Severity::Low,
                format!(
                    "Insufficient documentation in commit {}: documentation score {:.1}/100",
                    commit, report.documentation
                ),
                commit,
            ));
        }

        for issue in &report.issues {
            alerts.push(Alert::new(
                AlertType::QualityIssue,
                issue_severity(issue),
                format!("{} in commit {}", issue, commit),
                commit,
            ));
        }

        alerts
    }

    /// Alerts for the comment sentiments of one pull request.
    pub fn sentiment_alerts(&self, pr_number: u64, scores: &[SentimentScore]) -> Vec<Alert> {
        if scores.is_empty() {
            return Vec::new();
        }

        let related = pr_number.to_string();
        let mut alerts = Vec::new();

        let negative = scores
            .iter()
            .filter(|s| s.label == SentimentLabel::Negative)
            .count();
        let negative_ratio = negative as f64 / scores.len() as f64;

        if negative_ratio > HIGH_NEGATIVE_RATIO {
            alerts.push(Alert::new(
                AlertType::NegativeSentiment,
                Severity::High,
                format!(
                    "High negative sentiment detected in PR #{}: {:.1}% of comments are negative",
                    pr_number,
                    negative_ratio * 100.0
                ),
                &related,
            ));
        } else if negative_ratio > ELEVATED_NEGATIVE_RATIO {
            alerts.push(Alert::new(
                AlertType::NegativeSentiment,
                Severity::Medium,
                format!(
                    "Elevated negative sentiment in PR #{}: {:.1}% of comments are negative",
                    pr_number,
                    negative_ratio * 100.0
                ),
                &related,
            ));
        }

        for (i, score) in scores.iter().enumerate() {
            if score.score < VERY_NEGATIVE_SCORE && score.confidence > VERY_NEGATIVE_CONFIDENCE {
                alerts.push(Alert::new(
                    AlertType::VeryNegativeComment,
                    Severity::Medium,
                    format!(
                        "Very negative comment detected in PR #{} (comment {}): sentiment score {:.2}",
                        pr_number,
                        i + 1,
                        score.score
                    ),
                    &related,
                ));
            }
        }

        alerts
    }

    /// Quality alerts for every report, then sentiment alerts for every PR.
    pub fn combined_alerts(
        &self,
        reports: &[CodeQualityReport],
        pr_sentiments: &[(u64, Vec<SentimentScore>)],
    ) -> Vec<Alert> {
        let mut alerts: Vec<Alert> = reports.iter().flat_map(|r| self.quality_alerts(r)).collect();

        for (pr_number, scores) in pr_sentiments {
            alerts.extend(self.sentiment_alerts(*pr_number, scores));
        }

        debug!("Generated {} alerts", alerts.len());
        alerts
    }
}

/// Medium for complexity issues, low for everything else.
fn issue_severity(issue: &str) -> Severity {
    if issue.contains("High code complexity") {
        Severity::Medium
    } else {
        Severity::Low
    }
}
