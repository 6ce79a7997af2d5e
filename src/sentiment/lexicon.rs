//! Offline lexicon classifier.
//!
//! Counts positive and negative words, flipping polarity after a negator.
//! Deterministic and dependency-free at runtime, so it is the default backend.

use super::{Classification, ClassifierLabel, TextClassifier, DEFAULT_MAX_INPUT_CHARS};
use crate::error::AnalysisResult;

/// How many words after a negator it stays in effect.
const NEGATION_WINDOW: usize = 3;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "awesome", "nice", "clean", "clear", "love", "like", "thanks",
    "thank", "appreciate", "helpful", "elegant", "perfect", "solid", "well", "better", "best",
    "neat", "happy", "glad", "brilliant", "fantastic", "amazing", "readable", "simple", "lgtm",
    "approve", "approved", "agree", "works", "fixed", "improved", "improvement", "correct",
    "impressive", "cool", "wonderful", "useful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "ugly", "wrong", "broken", "hate", "messy", "confusing",
    "useless", "stupid", "poor", "worse", "worst", "fail", "fails", "failed", "failing", "bug",
    "buggy", "slow", "sloppy", "annoying", "disappointed", "disappointing", "mess", "garbage",
    "nonsense", "unreadable", "hack", "hacky", "crash", "crashes", "problem", "issue", "reject",
    "rejected", "incorrect", "ridiculous",
];

const NEGATORS: &[&str] = &[
    "not", "no", "never", "nothing", "dont", "don't", "doesnt", "doesn't", "isnt", "isn't",
    "wasnt", "wasn't", "cant", "can't", "cannot", "wont", "won't", "shouldnt", "shouldn't",
];

/// Word-counting sentiment classifier.
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    max_input_chars: usize,
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    pub fn with_max_input_chars(max_input_chars: usize) -> Self {
        Self { max_input_chars }
    }

    /// Count (positive, negative) hits in `text`.
    fn count_hits(text: &str) -> (usize, usize) {
        let lowered = text.to_lowercase();
        let mut positive = 0;
        let mut negative = 0;
        let mut negation_left = 0usize;

        let words = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty());

        for word in words {
            if NEGATORS.contains(&word) {
                negation_left = NEGATION_WINDOW;
                continue;
            }

            let polarity = if POSITIVE_WORDS.contains(&word) {
                Some(true)
            } else if NEGATIVE_WORDS.contains(&word) {
                Some(false)
            } else {
                None
            };

            match polarity {
                Some(is_positive) => {
                    let flipped = negation_left > 0;
                    negation_left = 0;
                    if is_positive != flipped {
                        positive += 1;
                    } else {
                        negative += 1;
                    }
                }
                None => negation_left = negation_left.saturating_sub(1),
            }
        }

        (positive, negative)
    }
}

impl TextClassifier for LexiconClassifier {
    fn classify(&self, text: &str) -> AnalysisResult<Classification> {
        let (positive, negative) = Self::count_hits(text);

        let label = if positive > negative {
            ClassifierLabel::Positive
        } else if negative > positive {
            ClassifierLabel::Negative
        } else {
            ClassifierLabel::Neutral
        };

        let margin = positive.abs_diff(negative) as f64;
        let confidence = 0.5 + 0.5 * margin / (positive + negative + 1) as f64;

        Ok(Classification { label, confidence })
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
