//! Sentiment scoring for PR comments and issue discussions.
//!
//! The scorer wraps a [`TextClassifier`] and maps its raw
//! `(label, confidence)` output onto a signed score in `[-1, 1]`. The final
//! label is always re-derived from the score, so it can disagree with the
//! classifier's raw label near the thresholds.

pub mod lexicon;
pub mod ollama;

pub use lexicon::LexiconClassifier;
pub use ollama::{OllamaClassifier, OllamaClassifierConfig};

use crate::error::AnalysisResult;
use crate::models::SentimentScore;
use tracing::{debug, error};

/// Default input budget, in characters, for classifiers.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;

/// Raw polarity reported by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierLabel {
    Positive,
    Negative,
    /// No polarity. Maps to a zero score.
    Neutral,
}

/// Output of a text-classification capability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub label: ClassifierLabel,
    /// 0 to 1.
    pub confidence: f64,
}

/// A text-classification capability: given text, return a label and confidence.
pub trait TextClassifier: Send + Sync {
    /// Classify a piece of text. Input has already been truncated to
    /// [`TextClassifier::max_input_chars`].
    fn classify(&self, text: &str) -> AnalysisResult<Classification>;

    /// Maximum number of characters passed to [`TextClassifier::classify`].
    fn max_input_chars(&self) -> usize {
        DEFAULT_MAX_INPUT_CHARS
    }

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Scores text sentiment through a pluggable classifier.
pub struct SentimentScorer {
    classifier: Box<dyn TextClassifier>,
}

impl SentimentScorer {
    pub fn new(classifier: Box<dyn TextClassifier>) -> Self {
        debug!("Sentiment scorer using {} classifier", classifier.name());
        Self { classifier }
    }

    /// Score a single text. Never fails: classifier errors degrade to a
    /// neutral zero-confidence result.
    pub fn score(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore::neutral(1.0);
        }

        let input = truncate_chars(text, self.classifier.max_input_chars());

        match self.classifier.classify(input) {
            Ok(classification) => {
                let confidence = classification.confidence.clamp(0.0, 1.0);
                let score = match classification.label {
                    ClassifierLabel::Positive => confidence,
                    ClassifierLabel::Negative => -confidence,
                    ClassifierLabel::Neutral => 0.0,
                };
                SentimentScore::from_score(score, confidence)
            }
            Err(e) => {
                error!("Sentiment analysis failed: {}", e);
                SentimentScore::neutral(0.0)
            }
        }
    }

    /// Score each text, preserving order.
    pub fn score_many<S: AsRef<str>>(&self, texts: &[S]) -> Vec<SentimentScore> {
        texts.iter().map(|t| self.score(t.as_ref())).collect()
    }

    /// Mean score and confidence across all texts.
    pub fn average<S: AsRef<str>>(&self, texts: &[S]) -> SentimentScore {
        if texts.is_empty() {
            return SentimentScore::neutral(1.0);
        }

        let scores = self.score_many(texts);
        let count = scores.len() as f64;
        let avg_score = scores.iter().map(|s| s.score).sum::<f64>() / count;
        let avg_confidence = scores.iter().map(|s| s.confidence).sum::<f64>() / count;

        SentimentScore::from_score(avg_score, avg_confidence)
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::models::SentimentLabel;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Returns a fixed classification and counts calls.
    struct FixedClassifier {
        result: Classification,
        calls: Arc<AtomicUsize>,
        last_len: Arc<AtomicUsize>,
    }

    impl TextClassifier for FixedClassifier {
        fn classify(&self, text: &str) -> AnalysisResult<Classification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.last_len.store(text.chars().count(), Ordering::SeqCst);
            Ok(self.result)
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingClassifier;

    impl TextClassifier for FailingClassifier {
        fn classify(&self, _text: &str) -> AnalysisResult<Classification> {
            Err(AnalysisError::Classifier("model unavailable".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    type Counter = Arc<AtomicUsize>;

    fn fixed(label: ClassifierLabel, confidence: f64) -> (SentimentScorer, Counter, Counter) {
        let calls = Arc::new(AtomicUsize::new(0));
        let last_len = Arc::new(AtomicUsize::new(0));
        let scorer = SentimentScorer::new(Box::new(FixedClassifier {
            result: Classification { label, confidence },
            calls: calls.clone(),
            last_len: last_len.clone(),
        }));
        (scorer, calls, last_len)
    }

    #[test]
    fn test_empty_text_skips_classifier() {
        let (scorer, calls, _) = fixed(ClassifierLabel::Negative, 0.9);
        let result = scorer.score("   \n\t");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_negative_maps_to_negative_score() {
        let (scorer, _, _) = fixed(ClassifierLabel::Negative, 0.95);
        let result = scorer.score("this is broken");
        assert_eq!(result.score, -0.95);
        assert_eq!(result.label, SentimentLabel::Negative);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_low_confidence_positive_is_neutral() {
        // The raw label says positive but the score falls inside the neutral band.
        let (scorer, _, _) = fixed(ClassifierLabel::Positive, 0.15);
        let result = scorer.score("fine I guess");
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.score, 0.15);
    }

    #[test]
    fn test_classifier_failure_degrades_to_neutral() {
        let scorer = SentimentScorer::new(Box::new(FailingClassifier));
        let result = scorer.score("anything");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SentimentLabel::Neutral);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_input_is_truncated() {
        let (scorer, _, last_len) = fixed(ClassifierLabel::Positive, 0.9);
        let long = "é".repeat(2000);
        scorer.score(&long);
        assert_eq!(last_len.load(Ordering::SeqCst), DEFAULT_MAX_INPUT_CHARS);
    }

    #[test]
    fn test_average_of_empty_is_neutral() {
        let (scorer, _, _) = fixed(ClassifierLabel::Negative, 0.9);
        let empty: Vec<String> = vec![];
        let avg = scorer.average(&empty);
        assert_eq!(avg.score, 0.0);
        assert_eq!(avg.label, SentimentLabel::Neutral);
        assert_eq!(avg.confidence, 1.0);
    }

    #[test]
    fn test_average_includes_empty_texts() {
        let (scorer, _, _) = fixed(ClassifierLabel::Negative, 0.9);
        let avg = scorer.average(&["bad", ""]);
        assert!((avg.score - (-0.45)).abs() < 1e-9);
        assert!((avg.confidence - 0.95).abs() < 1e-9);
        assert_eq!(avg.label, SentimentLabel::Negative);
    }

    proptest! {
        #[test]
        fn prop_score_many_is_well_formed(comments in proptest::collection::vec(".{0,80}", 1..20)) {
            let scorer = SentimentScorer::new(Box::new(LexiconClassifier::new()));
            let scores = scorer.score_many(&comments);
            prop_assert_eq!(scores.len(), comments.len());
            for s in scores {
                prop_assert!((-1.0..=1.0).contains(&s.score));
                prop_assert!((0.0..=1.0).contains(&s.confidence));
                prop_assert_eq!(s.label, SentimentLabel::from_score(s.score));
            }
        }
    }
}
