//! Anomaly detection over a developer's activity log.
//!
//! Two independent passes run over the same activities:
//!
//! - a rolling-window productivity-drop check on daily activity counts
//! - an outlier check on per-activity feature vectors, delegated to an
//!   [`OutlierDetector`]
//!
//! Drops come first (in day order), then unusual patterns (in input order).

pub mod isolation_forest;

pub use isolation_forest::{IsolationForest, IsolationForestConfig};

use crate::error::AnalysisResult;
use crate::models::{Activity, Anomaly, AnomalyType, Severity, TimeRange};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use tracing::{debug, error};

/// Per-row verdict from an outlier detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierLabel {
    Inlier,
    Outlier,
}

/// An outlier-detection capability: fit on a numeric matrix and label every
/// row in-sample.
pub trait OutlierDetector: Send + Sync {
    fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>>;
}

/// Thresholds for the anomaly passes.
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Below this many activities nothing is reported.
    pub min_activities: usize,
    /// Minimum activities for the productivity-drop pass.
    pub min_activities_for_drops: usize,
    /// Minimum activities for the unusual-pattern pass.
    pub min_activities_for_patterns: usize,
    /// Rolling window length, in days.
    pub window_days: usize,
    /// A day counts as a drop below this fraction of the window average.
    pub drop_ratio: f64,
    /// Window average must exceed this for a drop to be reported.
    pub min_baseline: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            min_activities: 10,
            min_activities_for_drops: 14,
            min_activities_for_patterns: 20,
            window_days: 7,
            drop_ratio: 0.3,
            min_baseline: 2.0,
        }
    }
}

/// Detects productivity drops and unusual activity patterns.
pub struct AnomalyDetector {
    config: AnomalyConfig,
    outlier_detector: Box<dyn OutlierDetector>,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig, outlier_detector: Box<dyn OutlierDetector>) -> Self {
        Self {
            config,
            outlier_detector,
        }
    }

    /// Run both passes. Insufficient data yields an empty list, never an error.
    pub fn detect(&self, developer_id: &str, activities: &[Activity]) -> Vec<Anomaly> {
        if activities.len() < self.config.min_activities {
            debug!(
                "Skipping anomaly detection for {}: only {} activities",
                developer_id,
                activities.len()
            );
            return Vec::new();
        }

        let mut anomalies = self.detect_productivity_drops(developer_id, activities);
        anomalies.extend(self.detect_unusual_patterns(developer_id, activities));

        debug!("Detected {} anomalies for {}", anomalies.len(), developer_id);
        anomalies
    }

    fn detect_productivity_drops(
        &self,
        developer_id: &str,
        activities: &[Activity],
    ) -> Vec<Anomaly> {
        if activities.len() < self.config.min_activities_for_drops {
            return Vec::new();
        }

        let mut sorted: Vec<&Activity> = activities.iter().collect();
        sorted.sort_by_key(|a| a.timestamp);

        let Some((first_day, counts)) = daily_counts(&sorted) else {
            return Vec::new();
        };

        let window = self.config.window_days;
        if window == 0 || counts.len() < window {
            return Vec::new();
        }

        let mut anomalies = Vec::new();
        for i in window..counts.len() {
            let recent_avg = counts[i - window..i].iter().sum::<usize>() as f64 / window as f64;
            let current = counts[i];

            let below_window = (current as f64) < recent_avg * self.config.drop_ratio;
            if recent_avg > self.config.min_baseline && below_window {
                let day = first_day + Duration::days(i as i64);
                let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));

                anomalies.push(Anomaly::new(
                    developer_id,
                    AnomalyType::ProductivityDrop,
                    if current == 0 { Severity::High } else { Severity::Medium },
                    format!(
                        "Significant productivity drop detected: {} activities vs {:.1} average",
                        current, recent_avg
                    ),
                    TimeRange {
                        start,
                        end: start + Duration::days(1),
                    },
                ));
            }
        }

        anomalies
    }

    fn detect_unusual_patterns(&self, developer_id: &str, activities: &[Activity]) -> Vec<Anomaly> {
        if activities.len() < self.config.min_activities_for_patterns {
            return Vec::new();
        }

        let rows: Vec<Vec<f64>> = activities.iter().map(feature_vector).collect();

        let labels = match self.outlier_detector.fit_predict(&rows) {
            Ok(labels) => labels,
            Err(e) => {
                error!("Unusual pattern detection failed: {}", e);
                return Vec::new();
            }
        };

        if labels.len() != activities.len() {
            error!(
                "Unusual pattern detection failed: {} labels for {} activities",
                labels.len(),
                activities.len()
            );
            return Vec::new();
        }

        activities
            .iter()
            .zip(labels)
            .filter(|(_, label)| *label == OutlierLabel::Outlier)
            .map(|(activity, _)| {
                Anomaly::new(
                    developer_id,
                    AnomalyType::UnusualPattern,
                    Severity::Low,
                    format!("Unusual activity pattern detected for {} activity", activity.kind),
                    TimeRange {
                        start: activity.timestamp,
                        end: activity.timestamp + Duration::hours(1),
                    },
                )
            })
            .collect()
    }
}

/// Longest span of days the drop pass looks at, counted back from the last
/// activity.
const MAX_SPAN_DAYS: i64 = 3660;

/// Activity count per UTC calendar day, from the first to the last activity.
/// Activities more than [`MAX_SPAN_DAYS`] before the last one are ignored.
/// `sorted` must be ordered by timestamp.
fn daily_counts(sorted: &[&Activity]) -> Option<(NaiveDate, Vec<usize>)> {
    let last_day = sorted.last()?.timestamp.date_naive();
    let earliest = last_day - Duration::days(MAX_SPAN_DAYS - 1);
    let first_day = sorted.first()?.timestamp.date_naive().max(earliest);

    let days = (last_day - first_day).num_days() as usize + 1;
    let mut counts = vec![0usize; days];

    for activity in sorted {
        let day = activity.timestamp.date_naive();
        if day < first_day {
            continue;
        }
        counts[(day - first_day).num_days() as usize] += 1;
    }

    Some((first_day, counts))
}

/// (hour, weekday from Monday, type code, lines changed, files changed)
fn feature_vector(activity: &Activity) -> Vec<f64> {
    vec![
        activity.timestamp.hour() as f64,
        activity.timestamp.weekday().num_days_from_monday() as f64,
        activity.kind.code(),
        activity.metadata.lines_changed() as f64,
        activity.metadata.files_changed() as f64,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::models::{ActivityMetadata, ActivityType};
    use chrono::DateTime;

    struct NoOutliers;

    impl OutlierDetector for NoOutliers {
        fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
            Ok(vec![OutlierLabel::Inlier; rows.len()])
        }
    }

    /// Flags the rows at the given indices.
    struct FlagRows(Vec<usize>);

    impl OutlierDetector for FlagRows {
        fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
            Ok((0..rows.len())
                .map(|i| {
                    if self.0.contains(&i) {
                        OutlierLabel::Outlier
                    } else {
                        OutlierLabel::Inlier
                    }
                })
                .collect())
        }
    }

    struct BrokenModel;

    impl OutlierDetector for BrokenModel {
        fn fit_predict(&self, _rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
            Err(AnalysisError::Model("singular matrix".to_string()))
        }
    }

    /// Returns one label fewer than there are rows.
    struct ShortLabels;

    impl OutlierDetector for ShortLabels {
        fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
            Ok(vec![OutlierLabel::Outlier; rows.len().saturating_sub(1)])
        }
    }

    fn detector(outliers: impl OutlierDetector + 'static) -> AnomalyDetector {
        AnomalyDetector::new(AnomalyConfig::default(), Box::new(outliers))
    }

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()
    }

    fn commit_at(timestamp: DateTime<Utc>) -> Activity {
        Activity {
            id: crate::models::new_id(),
            kind: ActivityType::Commit,
            developer_id: "dev-1".to_string(),
            repository_id: "repo-1".to_string(),
            timestamp,
            metadata: ActivityMetadata {
                lines_added: Some(10),
                lines_deleted: Some(2),
                files_changed: Some(1),
                ..Default::default()
            },
        }
    }

    /// 14 busy days of 20 commits, then 7 quiet days with one commit on even days.
    fn busy_then_quiet() -> Vec<Activity> {
        let mut activities = Vec::new();
        for day in 0..14 {
            for n in 0..20 {
                let timestamp = base_time() + Duration::days(day) + Duration::minutes(n * 10);
                activities.push(commit_at(timestamp));
            }
        }
        for day in 14..21 {
            if day % 2 == 0 {
                activities.push(commit_at(base_time() + Duration::days(day)));
            }
        }
        activities
    }

    #[test]
    fn test_too_few_activities() {
        let activities: Vec<Activity> = (0..9)
            .map(|i| commit_at(base_time() + Duration::days(i)))
            .collect();
        assert!(detector(FlagRows(vec![0])).detect("dev-1", &activities).is_empty());
    }

    #[test]
    fn test_productivity_drop_after_busy_period() {
        let anomalies = detector(NoOutliers).detect("dev-1", &busy_then_quiet());

        assert!(!anomalies.is_empty());
        assert!(anomalies.iter().all(|a| a.kind == AnomalyType::ProductivityDrop));
        assert!(anomalies.iter().all(|a| !a.validated && a.developer_id == "dev-1"));

        let zero_day = base_time().date_naive() + Duration::days(15);
        let high = anomalies
            .iter()
            .find(|a| a.severity == Severity::High)
            .expect("a high severity drop");
        assert_eq!(high.affected_time_range.start.date_naive(), zero_day);
        assert_eq!(high.affected_time_range.start.hour(), 0);
        assert_eq!(
            high.affected_time_range.end - high.affected_time_range.start,
            Duration::days(1)
        );
        assert!(high
            .description
            .starts_with("Significant productivity drop detected: 0 activities vs"));
    }

    #[test]
    fn test_drop_severities_and_day_order() {
        let anomalies = detector(NoOutliers).detect("dev-1", &busy_then_quiet());

        // Days 14..=19 drop; day 20 is no longer below 30% of its window average.
        let severities: Vec<Severity> = anomalies.iter().map(|a| a.severity).collect();
        assert_eq!(
            severities,
            vec![
                Severity::Medium,
                Severity::High,
                Severity::Medium,
                Severity::High,
                Severity::Medium,
                Severity::High,
            ]
        );
        assert_eq!(
            anomalies[0].description,
            "Significant productivity drop detected: 1 activities vs 20.0 average"
        );
        assert!(anomalies
            .windows(2)
            .all(|w| w[0].affected_time_range.start < w[1].affected_time_range.start));
    }

    #[test]
    fn test_drop_detection_ignores_input_order() {
        let mut activities = busy_then_quiet();
        activities.reverse();
        assert_eq!(detector(NoOutliers).detect("dev-1", &activities).len(), 6);
    }

    #[test]
    fn test_unusual_patterns_follow_drops() {
        let activities = busy_then_quiet();
        let last = activities.len() - 1;
        let anomalies = detector(FlagRows(vec![3, last])).detect("dev-1", &activities);

        let patterns: Vec<&Anomaly> = anomalies
            .iter()
            .filter(|a| a.kind == AnomalyType::UnusualPattern)
            .collect();
        assert_eq!(patterns.len(), 2);
        assert_eq!(anomalies.last().map(|a| a.kind), Some(AnomalyType::UnusualPattern));

        assert!(patterns.iter().all(|a| !a.validated && a.developer_id == "dev-1"));

        let first = patterns[0];
        assert_eq!(first.severity, Severity::Low);
        assert_eq!(first.description, "Unusual activity pattern detected for commit activity");
        assert_eq!(first.affected_time_range.start, activities[3].timestamp);
        assert_eq!(
            first.affected_time_range.end,
            activities[3].timestamp + Duration::hours(1)
        );
        assert_eq!(patterns[1].affected_time_range.start, activities[last].timestamp);
    }

    #[test]
    fn test_model_failure_keeps_drops() {
        let anomalies = detector(BrokenModel).detect("dev-1", &busy_then_quiet());
        assert_eq!(anomalies.len(), 6);
        assert!(anomalies.iter().all(|a| a.kind == AnomalyType::ProductivityDrop));
    }

    #[test]
    fn test_label_count_mismatch_is_a_model_failure() {
        let anomalies = detector(ShortLabels).detect("dev-1", &busy_then_quiet());
        assert_eq!(anomalies.len(), 6);
        assert!(anomalies.iter().all(|a| a.kind == AnomalyType::ProductivityDrop));
    }

    #[test]
    fn test_extreme_line_counts_do_not_abort() {
        let activities: Vec<Activity> = (0..25)
            .map(|i| {
                let mut activity = commit_at(base_time() + Duration::minutes(i * 7));
                if i % 2 == 0 {
                    activity.metadata.lines_added = Some(u64::MAX);
                    activity.metadata.lines_deleted = Some(5);
                }
                activity
            })
            .collect();

        let anomalies = detector(IsolationForest::default()).detect("dev-1", &activities);
        assert!(anomalies.iter().all(|a| a.kind == AnomalyType::UnusualPattern));
        assert!(anomalies.len() < activities.len());
    }

    #[test]
    fn test_pattern_pass_needs_twenty_activities() {
        let activities: Vec<Activity> = (0..15)
            .map(|i| commit_at(base_time() + Duration::hours(i)))
            .collect();
        assert!(detector(FlagRows(vec![0, 1, 2])).detect("dev-1", &activities).is_empty());
    }

    #[test]
    fn test_feature_vector() {
        let mut activity = commit_at(Utc.with_ymd_and_hms(2025, 3, 9, 17, 30, 0).unwrap());
        activity.kind = ActivityType::Review;
        assert_eq!(feature_vector(&activity), vec![17.0, 6.0, 3.0, 12.0, 1.0]);
    }

    #[test]
    fn test_daily_counts_fill_gaps() {
        let a = commit_at(base_time());
        let b = commit_at(base_time() + Duration::days(3));
        let (first, counts) = daily_counts(&[&a, &b]).unwrap();
        assert_eq!(first, base_time().date_naive());
        assert_eq!(counts, vec![1, 0, 0, 1]);
    }

    #[test]
    fn test_daily_counts_cap_span() {
        let ancient = commit_at(base_time() - Duration::days(100_000));
        let recent = commit_at(base_time());
        let (first, counts) = daily_counts(&[&ancient, &recent]).unwrap();

        assert_eq!(counts.len(), MAX_SPAN_DAYS as usize);
        assert_eq!(first, base_time().date_naive() - Duration::days(MAX_SPAN_DAYS - 1));
        assert_eq!(counts.iter().sum::<usize>(), 1);
        assert_eq!(counts.last(), Some(&1));
    }

    #[test]
    fn test_with_isolation_forest() {
        let mut activities: Vec<Activity> = (0..40)
            .map(|i| commit_at(base_time() + Duration::days(i % 5) + Duration::minutes(i)))
            .collect();
        let mut huge = commit_at(base_time() + Duration::hours(3));
        huge.metadata.lines_added = Some(50_000);
        huge.metadata.files_changed = Some(400);
        activities.push(huge);

        let anomalies = detector(IsolationForest::default()).detect("dev-1", &activities);
        let patterns: Vec<&Anomaly> = anomalies
            .iter()
            .filter(|a| a.kind == AnomalyType::UnusualPattern)
            .collect();
        assert!(!patterns.is_empty());
        assert!(patterns.len() <= activities.len() / 10);
        assert!(patterns
            .iter()
            .any(|a| a.affected_time_range.start == base_time() + Duration::hours(3)));
    }
}
