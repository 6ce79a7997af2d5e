//! Result aggregation and statistics.
//!
//! This module provides utilities for summarizing a comprehensive analysis:
//! alert and anomaly counts, quality averages and the sentiment mix.

use crate::models::{
    Alert, Anomaly, CodeQualityReport, ComprehensiveAnalysis, SentimentLabel, SentimentScore,
    Severity,
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts per severity level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn from_severities(severities: impl IntoIterator<Item = Severity>) -> Self {
        let mut counts = Self::default();
        for severity in severities {
            counts.total += 1;
            match severity {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }
}

/// Mean quality dimensions across reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAverages {
    pub complexity: f64,
    pub documentation: f64,
    pub standards: f64,
    pub overall_score: f64,
}

/// Label counts and mean score over sentiment results.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub average_score: f64,
}

/// Headline numbers for a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub alerts: SeverityCounts,
    pub alerts_by_type: BTreeMap<String, usize>,
    pub anomalies: SeverityCounts,
    pub anomalies_by_type: BTreeMap<String, usize>,
    pub quality: Option<QualityAverages>,
    pub sentiment: SentimentBreakdown,
    pub recommendations: usize,
}

/// Summarize a comprehensive analysis.
pub fn summarize(analysis: &ComprehensiveAnalysis) -> AnalysisSummary {
    AnalysisSummary {
        alerts: SeverityCounts::from_severities(analysis.alerts.iter().map(|a| a.severity)),
        alerts_by_type: count_alerts_by_type(&analysis.alerts),
        anomalies: SeverityCounts::from_severities(analysis.anomalies.iter().map(|a| a.severity)),
        anomalies_by_type: count_anomalies_by_type(&analysis.anomalies),
        quality: average_quality(&analysis.quality_reports),
        sentiment: sentiment_breakdown(&analysis.sentiment_scores),
        recommendations: analysis.recommendations.len(),
    }
}

/// Sort alerts by severity (high first), keeping input order within a level.
pub fn sort_alerts_by_severity(alerts: &mut [Alert]) {
    alerts.sort_by(|a, b| b.severity.cmp(&a.severity));
}

/// Highest alert severity, if any alert exists.
pub fn max_alert_severity(alerts: &[Alert]) -> Option<Severity> {
    alerts.iter().map(|a| a.severity).max()
}

pub fn count_alerts_by_type(alerts: &[Alert]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for alert in alerts {
        *counts.entry(alert.kind.to_string()).or_default() += 1;
    }
    counts
}

pub fn count_anomalies_by_type(anomalies: &[Anomaly]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for anomaly in anomalies {
        *counts.entry(anomaly.kind.to_string()).or_default() += 1;
    }
    counts
}

/// Mean of each quality dimension. `None` when there are no reports.
pub fn average_quality(reports: &[CodeQualityReport]) -> Option<QualityAverages> {
    if reports.is_empty() {
        return None;
    }

    let n = reports.len() as f64;
    let mean = |f: fn(&CodeQualityReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    Some(QualityAverages {
        complexity: mean(|r| r.complexity),
        documentation: mean(|r| r.documentation),
        standards: mean(|r| r.standards),
        overall_score: mean(|r| r.overall_score),
    })
}

pub fn sentiment_breakdown(scores: &[SentimentScore]) -> SentimentBreakdown {
    let mut breakdown = SentimentBreakdown::default();
    for score in scores {
        match score.label {
            SentimentLabel::Positive => breakdown.positive += 1,
            SentimentLabel::Neutral => breakdown.neutral += 1,
            SentimentLabel::Negative => breakdown.negative += 1,
        }
    }

    if !scores.is_empty() {
        breakdown.average_score = scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64;
    }

    breakdown
}

/// Reports with the lowest overall score first, at most `n`.
pub fn weakest_reports(reports: &[CodeQualityReport], n: usize) -> Vec<&CodeQualityReport> {
    let mut sorted: Vec<&CodeQualityReport> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        a.overall_score
            .partial_cmp(&b.overall_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AlertType;

    fn alert(kind: AlertType, severity: Severity) -> Alert {
        Alert::new(kind, severity, "msg".to_string(), "abc")
    }

    #[test]
    fn test_severity_counts() {
        let severities = [Severity::High, Severity::Low, Severity::Low];
        let counts = SeverityCounts::from_severities(severities);
        assert_eq!(
            counts,
            SeverityCounts {
                total: 3,
                high: 1,
                medium: 0,
                low: 2
            }
        );
    }

    #[test]
    fn test_sort_and_max_severity() {
        let mut alerts = vec![
            alert(AlertType::PoorDocumentation, Severity::Low),
            alert(AlertType::CodeQuality, Severity::High),
            alert(AlertType::HighComplexity, Severity::Medium),
        ];
        assert_eq!(max_alert_severity(&alerts), Some(Severity::High));

        sort_alerts_by_severity(&mut alerts);
        let order: Vec<Severity> = alerts.iter().map(|a| a.severity).collect();
        assert_eq!(order, vec![Severity::High, Severity::Medium, Severity::Low]);

        assert_eq!(max_alert_severity(&[]), None);
    }

    #[test]
    fn test_count_alerts_by_type() {
        let alerts = vec![
            alert(AlertType::QualityIssue, Severity::Low),
            alert(AlertType::QualityIssue, Severity::Medium),
            alert(AlertType::NegativeSentiment, Severity::High),
        ];
        let counts = count_alerts_by_type(&alerts);
        assert_eq!(counts.get("quality_issue"), Some(&2));
        assert_eq!(counts.get("negative_sentiment"), Some(&1));
    }

    #[test]
    fn test_average_quality() {
        assert!(average_quality(&[]).is_none());

        let reports = vec![
            CodeQualityReport::new("a", 20.0, 40.0, 60.0, vec![]),
            CodeQualityReport::new("b", 40.0, 60.0, 80.0, vec![]),
        ];
        let avg = average_quality(&reports).unwrap();
        assert_eq!(avg.complexity, 30.0);
        assert_eq!(avg.documentation, 50.0);
        assert_eq!(avg.standards, 70.0);
        assert_eq!(avg.overall_score, 50.0);

        let weakest = weakest_reports(&reports, 1);
        assert_eq!(weakest[0].commit_hash, "a");
    }

    #[test]
    fn test_sentiment_breakdown() {
        let scores = vec![
            SentimentScore::from_score(0.8, 0.9),
            SentimentScore::from_score(-0.6, 0.9),
            SentimentScore::from_score(0.1, 0.9),
            SentimentScore::from_score(-0.3, 0.9),
        ];
        let breakdown = sentiment_breakdown(&scores);
        assert_eq!(breakdown.positive, 1);
        assert_eq!(breakdown.neutral, 1);
        assert_eq!(breakdown.negative, 2);
        assert!(breakdown.average_score.abs() < 1e-9);
    }
}
