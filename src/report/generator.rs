//! Markdown and JSON report generation.
//!
//! This module renders a [`Report`] as a Markdown document for humans or as
//! pretty JSON for other tools.

use super::{Report, ReportMetadata};
use crate::analysis::{sort_alerts_by_severity, weakest_reports, AnalysisSummary};
use crate::models::{Alert, Anomaly, CodeQualityReport, Recommendation, Severity};
use anyhow::{Context, Result};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "# DevPulse Report: {}\n\n",
        report.metadata.developer_id
    ));

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_alerts_section(&report.analysis.alerts));
    output.push_str(&generate_anomalies_section(&report.analysis.anomalies));
    output.push_str(&generate_quality_section(&report.analysis.quality_reports));
    output.push_str(&generate_recommendations_section(
        &report.analysis.recommendations,
    ));
    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Developer:** {}\n", metadata.developer_id));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Sentiment Classifier:** `{}`\n",
        metadata.classifier
    ));
    section.push_str(&format!(
        "- **Activities Analyzed:** {}\n",
        metadata.activities_analyzed
    ));
    section.push_str(&format!(
        "- **Code Samples Analyzed:** {}\n",
        metadata.code_samples_analyzed
    ));
    section.push_str(&format!(
        "- **Pull Requests Analyzed:** {}\n",
        metadata.pull_requests_analyzed
    ));
    section.push_str(&format!(
        "- **Analysis Duration:** {:.1}s\n\n",
        metadata.duration_seconds
    ));

    section
}

fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Alerts](#alerts)\n");
    toc.push_str("- [Anomalies](#anomalies)\n");
    if !report.analysis.quality_reports.is_empty() {
        toc.push_str("- [Code Quality](#code-quality)\n");
    }
    if !report.analysis.recommendations.is_empty() {
        toc.push_str("- [Recommendations](#recommendations)\n");
    }
    toc.push('\n');

    toc
}

fn generate_summary_section(summary: &AnalysisSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    section.push_str("### Alert Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | **Total** |\n",
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        summary.alerts.high, summary.alerts.medium, summary.alerts.low, summary.alerts.total
    ));

    if !summary.alerts_by_type.is_empty() {
        section.push_str("### Alerts by Type\n\n");
        section.push_str("| Type | Count |\n");
        section.push_str("|:---|:---:|\n");
        for (kind, count) in &summary.alerts_by_type {
            section.push_str(&format!("| {} | {} |\n", kind, count));
        }
        section.push('\n');
    }

    if let Some(quality) = summary.quality {
        section.push_str("### Average Code Quality\n\n");
        section.push_str("| Complexity | Documentation | Standards | Overall |\n");
        section.push_str("|:---:|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {:.1} | {:.1} | {:.1} | **{:.1}** |\n\n",
            quality.complexity, quality.documentation, quality.standards, quality.overall_score
        ));
    }

    let sentiment = &summary.sentiment;
    if sentiment.positive + sentiment.neutral + sentiment.negative > 0 {
        section.push_str("### Review Sentiment\n\n");
        section.push_str("| Positive | Neutral | Negative | Average Score |\n");
        section.push_str("|:---:|:---:|:---:|:---:|\n");
        section.push_str(&format!(
            "| {} | {} | {} | {:.2} |\n\n",
            sentiment.positive, sentiment.neutral, sentiment.negative, sentiment.average_score
        ));
    }

    section
}

fn generate_alerts_section(alerts: &[Alert]) -> String {
    let mut section = String::new();

    section.push_str("## Alerts\n\n");

    if alerts.is_empty() {
        section.push_str("No alerts were raised. 🎉\n\n");
        return section;
    }

    let mut sorted = alerts.to_vec();
    sort_alerts_by_severity(&mut sorted);

    section.push_str("| Severity | Type | Message |\n");
    section.push_str("|:---|:---|:---|\n");
    for alert in &sorted {
        section.push_str(&format!(
            "| {} {} | `{}` | {} |\n",
            alert.severity.emoji(),
            alert.severity,
            alert.kind,
            escape_cell(&alert.message)
        ));
    }
    section.push('\n');

    section
}

fn generate_anomalies_section(anomalies: &[Anomaly]) -> String {
    let mut section = String::new();

    section.push_str("## Anomalies\n\n");

    if anomalies.is_empty() {
        section.push_str("No anomalies detected.\n\n");
        return section;
    }

    section.push_str("| Severity | Type | Window | Description |\n");
    section.push_str("|:---|:---|:---|:---|\n");
    for anomaly in anomalies {
        section.push_str(&format!(
            "| {} {} | `{}` | {} to {} | {} |\n",
            anomaly.severity.emoji(),
            anomaly.severity,
            anomaly.kind,
            anomaly.affected_time_range.start.format("%Y-%m-%d %H:%M"),
            anomaly.affected_time_range.end.format("%Y-%m-%d %H:%M"),
            escape_cell(&anomaly.description)
        ));
    }
    section.push('\n');

    section
}

fn generate_quality_section(reports: &[CodeQualityReport]) -> String {
    if reports.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Code Quality\n\n");
    section.push_str("Lowest scoring samples first.\n\n");

    for report in weakest_reports(reports, 10) {
        section.push_str(&format!(
            "### `{}` ({:.1}/100)\n\n",
            report.commit_hash, report.overall_score
        ));
        section.push_str(&format!(
            "*Complexity: {:.1} | Documentation: {:.1} | Standards: {:.1}*\n\n",
            report.complexity, report.documentation, report.standards
        ));
        for issue in &report.issues {
            section.push_str(&format!("- {}\n", issue));
        }
        if !report.issues.is_empty() {
            section.push('\n');
        }
    }

    section
}

fn generate_recommendations_section(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!(
            "### {}. {} ({} priority)\n\n",
            i + 1,
            rec.title,
            rec.priority
        ));
        section.push_str(&format!("{}\n\n", rec.description));
        for item in &rec.action_items {
            section.push_str(&format!("- [ ] {}\n", item));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    "---\n\n*Report generated by DevPulse*\n".to_string()
}

/// Pipes would break a Markdown table row.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
