//! Rule-based recommendations.
//!
//! Four independent rule sets run in a fixed order (activity pattern,
//! anomalies, code quality, sentiment) and append to one list.

use crate::models::{
    Activity, ActivityType, Anomaly, AnomalyType, CodeQualityReport, Recommendation,
    RecommendationType, SentimentLabel, SentimentScore, Severity,
};
use tracing::debug;

/// Activity rules need strictly more activities than this.
const MIN_ACTIVITIES: usize = 10;
const REVIEW_RATIO_FLOOR: f64 = 0.15;
const REVIEW_RATIO_TARGET: f64 = 0.20;
const PR_RATIO_FLOOR: f64 = 0.10;
const COMPLEXITY_FLOOR: f64 = 50.0;
const DOCUMENTATION_FLOOR: f64 = 40.0;
const STANDARDS_FLOOR: f64 = 60.0;
const NEGATIVE_RATIO_CEILING: f64 = 0.3;

/// Builds recommendations from analysis results. Stateless.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        developer_id: &str,
        activities: &[Activity],
        anomalies: &[Anomaly],
        quality_reports: &[CodeQualityReport],
        sentiment_scores: &[SentimentScore],
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        recommendations.extend(activity_recommendations(developer_id, activities));
        recommendations.extend(anomaly_recommendations(developer_id, anomalies));
        recommendations.extend(quality_recommendations(developer_id, quality_reports));
        recommendations.extend(sentiment_recommendations(developer_id, sentiment_scores));

        debug!(
            "Generated {} recommendations for {}",
            recommendations.len(),
            developer_id
        );
        recommendations
    }
}

#[derive(Default)]
struct ActivityCounts {
    commits: usize,
    pull_requests: usize,
    issues: usize,
    reviews: usize,
}

impl ActivityCounts {
    fn tally(activities: &[Activity]) -> Self {
        let mut counts = Self::default();
        for activity in activities {
            match activity.kind {
                ActivityType::Commit => counts.commits += 1,
                ActivityType::PullRequest => counts.pull_requests += 1,
                ActivityType::Issue => counts.issues += 1,
                ActivityType::Review => counts.reviews += 1,
                ActivityType::Unknown => {}
            }
        }
        counts
    }

    fn total(&self) -> usize {
        self.commits + self.pull_requests + self.issues + self.reviews
    }
}

fn activity_recommendations(developer_id: &str, activities: &[Activity]) -> Vec<Recommendation> {
    let counts = ActivityCounts::tally(activities);
    let total = counts.total();
    if total <= MIN_ACTIVITIES {
        return Vec::new();
    }

    let mut recommendations = Vec::new();

    let review_ratio = counts.reviews as f64 / total as f64;
    if review_ratio < REVIEW_RATIO_FLOOR {
        let target = (total as f64 * REVIEW_RATIO_TARGET - counts.reviews as f64).round() as i64;
        recommendations.push(Recommendation::new(
            developer_id,
            RecommendationType::CodeReviewParticipation,
            Severity::Medium,
            "Increase Code Review Participation",
            format!(
                "Your code review participation is at {:.1}%. Aim for at least 20% of activities.",
                review_ratio * 100.0
            ),
            vec![
                format!("Review {} more pull requests this week", target),
                "Set aside 30 minutes daily for code reviews".to_string(),
                "Subscribe to PR notifications for your team".to_string(),
            ],
        ));
    }

    let pr_ratio = counts.pull_requests as f64 / total as f64;
    if pr_ratio < PR_RATIO_FLOOR {
        recommendations.push(Recommendation::new(
            developer_id,
            RecommendationType::PullRequestCreation,
            Severity::Low,
            "Create More Pull Requests",
            "Consider breaking your work into smaller, more frequent pull requests for better collaboration."
                .to_string(),
            vec![
                "Break large features into smaller PRs".to_string(),
                "Aim for PRs under 400 lines of code".to_string(),
                "Submit PRs at least twice per week".to_string(),
            ],
        ));
    }

    recommendations
}

fn anomaly_recommendations(developer_id: &str, anomalies: &[Anomaly]) -> Vec<Recommendation> {
    let severe_drop = anomalies
        .iter()
        .any(|a| a.kind == AnomalyType::ProductivityDrop && a.severity == Severity::High);

    if !severe_drop {
        return Vec::new();
    }

    vec![Recommendation::new(
        developer_id,
        RecommendationType::ProductivityRecovery,
        Severity::High,
        "Address Productivity Drop",
        "A significant drop in activity has been detected. Consider if there are blockers or support needed."
            .to_string(),
        vec![
            "Identify any blockers or dependencies".to_string(),
            "Reach out to team lead if you need support".to_string(),
            "Review your current task priorities".to_string(),
        ],
    )]
}

fn quality_recommendations(
    developer_id: &str,
    reports: &[CodeQualityReport],
) -> Vec<Recommendation> {
    if reports.is_empty() {
        return Vec::new();
    }

    let count = reports.len() as f64;
    let avg_complexity = reports.iter().map(|r| r.complexity).sum::<f64>() / count;
    let avg_documentation = reports.iter().map(|r| r.documentation).sum::<f64>() / count;
    let avg_standards = reports.iter().map(|r| r.standards).sum::<f64>() / count;

    let mut recommendations = Vec::new();

    if avg_complexity < COMPLEXITY_FLOOR {
        recommendations.push(Recommendation::new(
            developer_id,
            RecommendationType::CodeComplexity,
            Severity::High,
            "Reduce Code Complexity",
            format!(
                "Your average code complexity score is {:.1}/100. Simpler code is easier to maintain.",
                avg_complexity
            ),
            vec![
                "Break down complex functions into smaller ones".to_string(),
                "Reduce nesting levels in control flow".to_string(),
                "Extract repeated logic into helper functions".to_string(),
                "Consider using design patterns for complex logic".to_string(),
            ],
        ));
    }

    if avg_documentation < DOCUMENTATION_FLOOR {
        recommendations.push(Recommendation::new(
            developer_id,
            RecommendationType::Documentation,
            Severity::Medium,
            "Improve Code Documentation",
            format!(
                "Your documentation score is {:.1}/100. Better documentation helps team collaboration.",
                avg_documentation
            ),
            vec![
                "Add docstrings to all functions and classes".to_string(),
                "Document complex logic with inline comments".to_string(),
                "Include usage examples in docstrings".to_string(),
                "Update documentation when changing code".to_string(),
            ],
        ));
    }

    if avg_standards < STANDARDS_FLOOR {
        recommendations.push(Recommendation::new(
            developer_id,
            RecommendationType::CodingStandards,
            Severity::Low,
            "Follow Coding Standards",
            format!(
                "Your coding standards score is {:.1}/100. Consistent style improves code readability.",
                avg_standards
            ),
            vec![
                "Keep lines under 100 characters".to_string(),
                "Use consistent indentation (4 spaces)".to_string(),
                "Follow naming conventions for your language".to_string(),
                "Run linter before committing code".to_string(),
            ],
        ));
    }

    recommendations
}

fn sentiment_recommendations(developer_id: &str, scores: &[SentimentScore]) -> Vec<Recommendation> {
    if scores.is_empty() {
        return Vec::new();
    }

    let negative = scores
        .iter()
        .filter(|s| s.label == SentimentLabel::Negative)
        .count();
    let negative_ratio = negative as f64 / scores.len() as f64;

    if negative_ratio <= NEGATIVE_RATIO_CEILING {
        return Vec::new();
    }

    vec![Recommendation::new(
        developer_id,
        RecommendationType::CollaborationTone,
        Severity::Medium,
        "Improve Collaboration Tone",
        format!(
            "{:.1}% of your recent communications show negative sentiment. Positive collaboration improves team health.",
            negative_ratio * 100.0
        ),
        vec![
            "Focus on constructive feedback in code reviews".to_string(),
            "Acknowledge good work from teammates".to_string(),
            "Use \"we\" language instead of \"you\" when discussing issues".to_string(),
            "Take breaks if feeling frustrated before responding".to_string(),
        ],
    )]
}
