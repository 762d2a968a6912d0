//! Text-length anomaly detection.
//!
//! Each document with non-empty text becomes one row holding its character
//! count. An isolation forest scores the rows and the `contamination`
//! fraction with the lowest scores is reported.

use docsift_core::{AnalyticsConfig, AnomalyReport, DocumentId, ExtractedText};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{AnalyticsError, Result};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Per-row prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierLabel {
    Inlier,
    Outlier,
}

/// Fits a model over `rows` and labels every row
pub trait OutlierDetector: Send + Sync {
    fn fit_predict(&self, rows: &[Vec<f64>], contamination: f64) -> Result<Vec<OutlierLabel>>;

    fn name(&self) -> &'static str;
}

/// Anomaly detection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyConfig {
    pub contamination: f64,
    pub seed: Option<u64>,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            contamination: 0.2,
            seed: None,
        }
    }
}

impl From<&AnalyticsConfig> for AnomalyConfig {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            contamination: config.contamination,
            seed: config.seed,
        }
    }
}

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` nodes.
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

/// Percentile with linear interpolation between closest ranks.
pub(crate) fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(rows: &[Vec<f64>], sample: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(rows, sample, 0, height_limit, rng);
        tree
    }

    fn grow(
        &mut self,
        rows: &[Vec<f64>],
        indices: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            size: indices.len(),
        });

        if depth >= height_limit || indices.len() <= 1 {
            return id;
        }

        let width = rows[indices[0]].len();
        if width == 0 {
            return id;
        }
        let feature = rng.gen_range(0..width);

        let (min, max) = indices
            .iter()
            .map(|&i| rows[i][feature])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !(min < max) {
            return id;
        }

        let threshold = rng.gen_range(min..max);
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| rows[i][feature] < threshold);

        let left = self.grow(rows, left_idx, depth + 1, height_limit, rng);
        let right = self.grow(rows, right_idx, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }

    fn path_length(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Isolation forest outlier detector
#[derive(Debug, Clone)]
pub struct IsolationForest {
    n_trees: usize,
    max_samples: usize,
    seed: Option<u64>,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: None,
        }
    }
}

impl IsolationForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    /// Anomaly score in (0, 1] per row; higher means more isolated.
    pub fn score(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        let n = rows.len();
        if n == 0 {
            return Vec::new();
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sample_size = self.max_samples.min(n);
        let height_limit = (sample_size.max(2) as f64).log2().ceil() as usize;

        let trees: Vec<IsolationTree> = (0..self.n_trees.max(1))
            .map(|_| {
                let sample = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(rows, sample, height_limit, &mut rng)
            })
            .collect();

        let normaliser = average_path_length(sample_size);
        rows.iter()
            .map(|row| {
                let mean_depth = trees.iter().map(|t| t.path_length(row)).sum::<f64>()
                    / trees.len() as f64;
                if normaliser > 0.0 {
                    2f64.powf(-mean_depth / normaliser)
                } else {
                    0.5
                }
            })
            .collect()
    }
}

impl OutlierDetector for IsolationForest {
    fn fit_predict(&self, rows: &[Vec<f64>], contamination: f64) -> Result<Vec<OutlierLabel>> {
        if !(contamination > 0.0 && contamination <= 0.5) {
            return Err(AnalyticsError::invalid_parameter(format!(
                "contamination must be in (0, 0.5], got {}",
                contamination
            )));
        }

        // Lower is more abnormal
        let normality: Vec<f64> = self.score(rows).into_iter().map(|s| -s).collect();
        if normality.is_empty() {
            return Ok(Vec::new());
        }
        let threshold = percentile(&normality, contamination * 100.0);

        Ok(normality
            .into_iter()
            .map(|v| {
                if v < threshold {
                    OutlierLabel::Outlier
                } else {
                    OutlierLabel::Inlier
                }
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "isolation_forest"
    }
}

/// Flags documents whose text length is unusual within the corpus
#[derive(Clone)]
pub struct AnomalyDetector {
    detector: Arc<dyn OutlierDetector>,
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        let forest = IsolationForest::new().with_seed(config.seed);
        Self {
            detector: Arc::new(forest),
            config,
        }
    }

    pub fn with_detector(mut self, detector: Arc<dyn OutlierDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Detect anomalies. Fewer than two documents with text yields an empty report.
    pub fn detect(&self, extracted: &[ExtractedText]) -> Result<AnomalyReport> {
        let rows: Vec<(DocumentId, f64)> = extracted
            .iter()
            .filter(|e| e.has_text())
            .map(|e| (e.document_id, e.char_len() as f64))
            .collect();

        if rows.len() < 2 {
            debug!(documents = rows.len(), "Too few documents for anomaly detection");
            return Ok(AnomalyReport::empty());
        }

        let matrix: Vec<Vec<f64>> = rows.iter().map(|(_, len)| vec![*len]).collect();
        let labels = self
            .detector
            .fit_predict(&matrix, self.config.contamination)?;
        if labels.len() != rows.len() {
            return Err(AnalyticsError::model(format!(
                "{} returned {} labels for {} rows",
                self.detector.name(),
                labels.len(),
                rows.len()
            )));
        }

        let anomalies: Vec<DocumentId> = rows
            .iter()
            .zip(labels)
            .filter(|(_, label)| *label == OutlierLabel::Outlier)
            .map(|((id, _), _)| *id)
            .collect();

        debug!(
            documents = rows.len(),
            anomalies = anomalies.len(),
            detector = self.detector.name(),
            "Anomaly detection complete"
        );

        Ok(AnomalyReport { anomalies })
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
