//! Isolation forest outlier detector.
//!
//! Each tree isolates points by recursive random axis-aligned splits on a
//! random subsample. Points that end up isolated after few splits are
//! anomalous. The forest is fitted and discarded inside every
//! [`OutlierDetector::fit_predict`] call, so outlier status is always
//! relative to the batch being scored.

use super::{OutlierDetector, OutlierLabel};
use crate::error::{AnalysisError, AnalysisResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Configuration for the isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForestConfig {
    /// Number of trees.
    pub n_estimators: usize,
    /// Expected fraction of outliers, in (0, 0.5].
    pub contamination: f64,
    /// Upper bound on the per-tree subsample size.
    pub max_samples: usize,
    /// Random seed; a fixed seed makes predictions reproducible.
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            contamination: 0.1,
            max_samples: 256,
            seed: 42,
        }
    }
}

/// Outlier detector backed by an isolation forest.
#[derive(Debug, Clone, Default)]
pub struct IsolationForest {
    config: IsolationForestConfig,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Self {
        Self { config }
    }

    fn validate(&self, rows: &[Vec<f64>]) -> AnalysisResult<()> {
        let contamination = self.config.contamination;
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(AnalysisError::Model(format!(
                "contamination must be in (0, 0.5], got {}",
                contamination
            )));
        }
        if self.config.n_estimators == 0 {
            return Err(AnalysisError::Model("n_estimators must be at least 1".to_string()));
        }
        if rows.len() < 2 {
            return Err(AnalysisError::Model(format!(
                "need at least 2 samples, got {}",
                rows.len()
            )));
        }

        let width = rows[0].len();
        if width == 0 {
            return Err(AnalysisError::Model("feature rows are empty".to_string()));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(AnalysisError::Model(format!(
                    "row {} has {} features, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            if row.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::Model(format!("row {} has a non-finite value", i)));
            }
        }

        Ok(())
    }
}

impl OutlierDetector for IsolationForest {
    fn fit_predict(&self, rows: &[Vec<f64>]) -> AnalysisResult<Vec<OutlierLabel>> {
        self.validate(rows)?;

        let forest = Forest::fit(rows, &self.config);
        let scores: Vec<f64> = rows.iter().map(|row| forest.anomaly_score(row)).collect();

        let threshold = percentile(&scores, 100.0 * (1.0 - self.config.contamination));

        let labels: Vec<OutlierLabel> = scores
            .iter()
            .map(|&s| {
                if s > threshold {
                    OutlierLabel::Outlier
                } else {
                    OutlierLabel::Inlier
                }
            })
            .collect();

        debug!(
            "Isolation forest flagged {} of {} rows (threshold {:.4})",
            labels.iter().filter(|l| **l == OutlierLabel::Outlier).count(),
            rows.len(),
            threshold
        );

        Ok(labels)
    }
}

enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted forest. Lives only for the duration of one `fit_predict`.
struct Forest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl Forest {
    fn fit(rows: &[Vec<f64>], config: &IsolationForestConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let sample_size = config.max_samples.clamp(2, rows.len());
        let max_depth = (sample_size as f64).log2().ceil() as usize;

        let trees = (0..config.n_estimators)
            .map(|_| {
                let indices =
                    rand::seq::index::sample(&mut rng, rows.len(), sample_size).into_vec();
                build_tree(rows, indices, 0, max_depth, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Score in (0, 1]; values near 1 are anomalous.
    fn anomaly_score(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| path_length(t, row, 0)).sum();
        let mean = total / self.trees.len() as f64;
        2f64.powf(-mean / average_path_length(self.sample_size))
    }
}

fn build_tree(
    rows: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || indices.len() <= 1 {
        return Node::Leaf { size: indices.len() };
    }

    let width = rows[indices[0]].len();
    let splittable: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|f| {
            let bounds = (f64::INFINITY, f64::NEG_INFINITY);
            let (min, max) = indices.iter().fold(bounds, |(lo, hi), &i| {
                (lo.min(rows[i][f]), hi.max(rows[i][f]))
            });
            (max > min).then_some((f, min, max))
        })
        .collect();

    if splittable.is_empty() {
        return Node::Leaf { size: indices.len() };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);

    // threshold in [min, max) keeps both sides non-empty.
    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| rows[i][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(rows, left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(rows, right, depth + 1, max_depth, rng)),
    }
}

fn path_length(node: &Node, row: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] <= *threshold {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
