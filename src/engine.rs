//! Analysis coordinator.
//!
//! Owns one instance of every analyzer and exposes each operation, plus the
//! comprehensive per-developer workflow that chains them together. All
//! operations take `&self`, so one coordinator can serve many callers.

use crate::alerts::AlertGenerator;
use crate::anomaly::{
    AnomalyConfig, AnomalyDetector, IsolationForest, IsolationForestConfig, OutlierDetector,
};
use crate::config::{ClassifierKind, Config};
use crate::models::{
    Activity, Alert, Anomaly, CodeQualityReport, CodeSample, ComprehensiveAnalysis, PrComments,
    Recommendation, SentimentScore,
};
use crate::quality::CodeQualityScorer;
use crate::recommend::RecommendationEngine;
use crate::sentiment::{
    LexiconClassifier, OllamaClassifier, OllamaClassifierConfig, SentimentScorer, TextClassifier,
};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Service name reported by [`AnalysisCoordinator::health`].
pub const SERVICE_NAME: &str = "devpulse";

/// Readiness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub service: &'static str,
}

impl Health {
    pub fn ok() -> Self {
        Self {
            status: "ok",
            service: SERVICE_NAME,
        }
    }

    /// Reported when the coordinator could not be built.
    pub fn degraded() -> Self {
        Self {
            status: "degraded",
            service: SERVICE_NAME,
        }
    }
}

/// Façade over every analyzer.
pub struct AnalysisCoordinator {
    sentiment: SentimentScorer,
    anomalies: AnomalyDetector,
    quality: CodeQualityScorer,
    recommendations: RecommendationEngine,
    alerts: AlertGenerator,
}

impl AnalysisCoordinator {
    /// Build a coordinator from injected capabilities.
    pub fn new(
        classifier: Box<dyn TextClassifier>,
        outlier_detector: Box<dyn OutlierDetector>,
        anomaly_config: AnomalyConfig,
    ) -> Self {
        Self {
            sentiment: SentimentScorer::new(classifier),
            anomalies: AnomalyDetector::new(anomaly_config, outlier_detector),
            quality: CodeQualityScorer::default(),
            recommendations: RecommendationEngine::new(),
            alerts: AlertGenerator::new(),
        }
    }

    /// Replace the code quality scorer.
    pub fn with_quality_scorer(mut self, scorer: CodeQualityScorer) -> Self {
        self.quality = scorer;
        self
    }

    /// Build a coordinator with the backends named in `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let classifier: Box<dyn TextClassifier> = match config.sentiment.classifier {
            ClassifierKind::Lexicon => Box::new(LexiconClassifier::with_max_input_chars(
                config.sentiment.max_input_chars,
            )),
            ClassifierKind::Ollama => Box::new(
                OllamaClassifier::new(OllamaClassifierConfig {
                    ollama_url: config.sentiment.ollama_url.clone(),
                    model_name: config.sentiment.model.clone(),
                    temperature: config.sentiment.temperature,
                    timeout_seconds: config.sentiment.timeout_seconds,
                    max_input_chars: config.sentiment.max_input_chars,
                })
                .context("Failed to initialize Ollama sentiment classifier")?,
            ),
        };

        let anomaly = &config.anomaly;
        let forest = IsolationForest::new(IsolationForestConfig {
            n_estimators: anomaly.n_estimators,
            contamination: anomaly.contamination,
            max_samples: anomaly.max_samples,
            seed: anomaly.seed,
        });
        let anomaly_config = AnomalyConfig {
            min_activities: anomaly.min_activities,
            window_days: anomaly.window_days,
            drop_ratio: anomaly.drop_ratio,
            min_baseline: anomaly.min_baseline,
            ..AnomalyConfig::default()
        };

        let quality = CodeQualityScorer::new(
            config.quality.max_line_length,
            config.quality.max_function_lines,
        );
        let coordinator =
            Self::new(classifier, Box::new(forest), anomaly_config).with_quality_scorer(quality);

        info!("Analysis engine initialized");
        Ok(coordinator)
    }

    /// Always `ok`: a coordinator that exists is ready.
    pub fn health(&self) -> Health {
        Health::ok()
    }

    pub fn analyze_sentiment(&self, text: &str) -> SentimentScore {
        self.sentiment.score(text)
    }

    pub fn analyze_pr_comments<S: AsRef<str>>(&self, comments: &[S]) -> Vec<SentimentScore> {
        self.sentiment.score_many(comments)
    }

    pub fn average_sentiment<S: AsRef<str>>(&self, texts: &[S]) -> SentimentScore {
        self.sentiment.average(texts)
    }

    pub fn detect_anomalies(&self, developer_id: &str, activities: &[Activity]) -> Vec<Anomaly> {
        self.anomalies.detect(developer_id, activities)
    }

    pub fn analyze_code_quality(
        &self,
        commit_hash: &str,
        code: &str,
        language: &str,
    ) -> CodeQualityReport {
        self.quality.analyze(commit_hash, code, language)
    }

    pub fn generate_recommendations(
        &self,
        developer_id: &str,
        activities: &[Activity],
        anomalies: &[Anomaly],
        quality_reports: &[CodeQualityReport],
        sentiment_scores: &[SentimentScore],
    ) -> Vec<Recommendation> {
        self.recommendations
            .generate(developer_id, activities, anomalies, quality_reports, sentiment_scores)
    }

    pub fn generate_quality_alerts(&self, report: &CodeQualityReport) -> Vec<Alert> {
        self.alerts.quality_alerts(report)
    }

    pub fn generate_sentiment_alerts(
        &self,
        pr_number: u64,
        scores: &[SentimentScore],
    ) -> Vec<Alert> {
        self.alerts.sentiment_alerts(pr_number, scores)
    }

    pub fn generate_combined_alerts(
        &self,
        reports: &[CodeQualityReport],
        pr_sentiments: &[(u64, Vec<SentimentScore>)],
    ) -> Vec<Alert> {
        self.alerts.combined_alerts(reports, pr_sentiments)
    }

    /// Run every analysis for one developer.
    ///
    /// Anomalies, then quality reports per sample, then comment sentiments
    /// per PR, then recommendations over all of it, then alerts.
    pub fn analyze_developer_comprehensive(
        &self,
        developer_id: &str,
        activities: &[Activity],
        code_samples: &[CodeSample],
        pr_comments: &[PrComments],
    ) -> ComprehensiveAnalysis {
        debug!(
            "Comprehensive analysis for {}: {} activities, {} samples, {} PRs",
            developer_id,
            activities.len(),
            code_samples.len(),
            pr_comments.len()
        );

        let anomalies = self.detect_anomalies(developer_id, activities);

        let quality_reports: Vec<CodeQualityReport> = code_samples
            .iter()
            .map(|s| self.analyze_code_quality(&s.commit_hash, &s.code, &s.language))
            .collect();

        let pr_sentiments: Vec<(u64, Vec<SentimentScore>)> = pr_comments
            .iter()
            .map(|pr| (pr.pr_number, self.analyze_pr_comments(&pr.comments)))
            .collect();
        let sentiment_scores: Vec<SentimentScore> = pr_sentiments
            .iter()
            .flat_map(|(_, scores)| scores.iter().copied())
            .collect();

        let recommendations = self.generate_recommendations(
            developer_id,
            activities,
            &anomalies,
            &quality_reports,
            &sentiment_scores,
        );
        let alerts = self.generate_combined_alerts(&quality_reports, &pr_sentiments);

        ComprehensiveAnalysis {
            developer_id: developer_id.to_string(),
            anomalies,
            quality_reports,
            sentiment_scores,
            recommendations,
            alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::OutlierLabel;
    use crate::error::AnalysisResult;
    use crate::models::{
        ActivityMetadata, ActivityType, AlertType, AnomalyType, RecommendationType, SentimentLabel,
        Severity,
    };
    use crate::sentiment::{Classification, ClassifierLabel};
    use chrono::{Duration, TimeZone, Utc};

    /// Negative for texts containing "bad", positive otherwise.
    struct KeywordClassifier;

    impl TextClassifier for KeywordClassifier {
        fn classify(&self, text: &str) -> AnalysisResult<Classification> {
            let label = if text.contains("bad") {
                ClassifierLabel::Negative
            } else {
                ClassifierLabel::Positive
            };
            Ok(Classification {
                label,
                confidence: 0.9,
            })
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    struct NoOutliers;

    impl OutlierDetector for NoOutliers {
        fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
            Ok(vec![OutlierLabel::Inlier; rows.len()])
        }
    }

    fn coordinator() -> AnalysisCoordinator {
        AnalysisCoordinator::new(
            Box::new(KeywordClassifier),
            Box::new(NoOutliers),
            AnomalyConfig::default(),
        )
    }

    fn commits_per_day(per_day: &[usize]) -> Vec<Activity> {
        let start = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();
        per_day
            .iter()
            .enumerate()
            .flat_map(|(day, &n)| {
                (0..n).map(move |i| Activity {
                    id: format!("c-{}-{}", day, i),
                    kind: ActivityType::Commit,
                    developer_id: "dev-7".to_string(),
                    repository_id: "repo".to_string(),
                    timestamp: start + Duration::days(day as i64) + Duration::minutes(i as i64),
                    metadata: ActivityMetadata::default(),
                })
            })
            .collect()
    }

    #[test]
    fn test_health() {
        assert_eq!(coordinator().health(), Health::ok());
        assert_eq!(Health::degraded().status, "degraded");
    }

    #[test]
    fn test_from_default_config() {
        let coordinator = AnalysisCoordinator::from_config(&Config::default()).unwrap();
        assert_eq!(coordinator.health().status, "ok");

        let score = coordinator.analyze_sentiment("Thanks, this is a great and clean change");
        assert_eq!(score.label, SentimentLabel::Positive);
    }

    #[test]
    fn test_from_config_with_ollama_backend() {
        let mut config = Config::default();
        config.sentiment.classifier = ClassifierKind::Ollama;
        config.sentiment.ollama_url = "http://127.0.0.1:9".to_string();
        config.sentiment.timeout_seconds = 2;

        let coordinator = AnalysisCoordinator::from_config(&config).unwrap();
        // Unreachable model degrades instead of failing.
        let score = coordinator.analyze_sentiment("looks fine");
        assert_eq!(score.score, 0.0);
        assert_eq!(score.confidence, 0.0);
    }

    #[test]
    fn test_comprehensive_busy_then_quiet_developer() {
        let mut per_day = vec![20; 14];
        per_day.extend([1, 0, 1, 0, 1, 0, 1]);
        let activities = commits_per_day(&per_day);

        let samples = vec![CodeSample {
            commit_hash: "deadbeef".to_string(),
            code: "x = 1\n".to_string(),
            language: "python".to_string(),
        }];
        let prs = vec![
            PrComments {
                pr_number: 11,
                comments: vec!["bad idea".to_string(), "bad naming".to_string(), "ok".to_string()],
            },
            PrComments {
                pr_number: 12,
                comments: vec!["nice".to_string()],
            },
        ];

        let result =
            coordinator().analyze_developer_comprehensive("dev-7", &activities, &samples, &prs);

        assert_eq!(result.developer_id, "dev-7");
        assert!(result
            .anomalies
            .iter()
            .any(|a| a.kind == AnomalyType::ProductivityDrop && a.severity == Severity::High));
        assert_eq!(result.quality_reports.len(), 1);
        assert_eq!(result.quality_reports[0].commit_hash, "deadbeef");
        assert_eq!(result.sentiment_scores.len(), 4);

        let rec_kinds: Vec<RecommendationType> =
            result.recommendations.iter().map(|r| r.kind).collect();
        assert!(rec_kinds.contains(&RecommendationType::ProductivityRecovery));
        assert!(rec_kinds.contains(&RecommendationType::CollaborationTone));

        let pr11: Vec<&Alert> = result.alerts.iter().filter(|a| a.related_entity == "11").collect();
        assert_eq!(pr11[0].kind, AlertType::NegativeSentiment);
        assert_eq!(pr11[0].severity, Severity::High);
        assert!(result.alerts.iter().all(|a| a.related_entity != "12"));
    }

    #[test]
    fn test_comprehensive_with_nothing() {
        let result = coordinator().analyze_developer_comprehensive("dev-0", &[], &[], &[]);
        assert!(result.anomalies.is_empty());
        assert!(result.quality_reports.is_empty());
        assert!(result.sentiment_scores.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(result.alerts.is_empty());
    }

    #[test]
    fn test_low_scores_drive_recommendations() {
        let report = CodeQualityReport::new("abc", 20.0, 20.0, 20.0, vec![]);
        let recs = coordinator().generate_recommendations("dev-7", &[], &[], &[report], &[]);
        let got: Vec<(RecommendationType, Severity)> =
            recs.iter().map(|r| (r.kind, r.priority)).collect();
        assert_eq!(
            got,
            vec![
                (RecommendationType::CodeComplexity, Severity::High),
                (RecommendationType::Documentation, Severity::Medium),
                (RecommendationType::CodingStandards, Severity::Low),
            ]
        );
    }

    #[test]
    fn test_average_sentiment() {
        let avg = coordinator().average_sentiment(&["bad", "good", "bad"]);
        assert!((avg.score - (-0.3)).abs() < 1e-9);
        assert_eq!(avg.label, SentimentLabel::Negative);
    }
}
