//! K-means clustering with k-means++ seeding.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{AnalyticsError, Result};

/// Assigns every row one of `k` labels
pub trait Clusterer: Send + Sync {
    fn fit_predict(&self, rows: &[Vec<f64>], k: usize, n_init: usize) -> Result<Vec<usize>>;

    fn name(&self) -> &'static str;
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// One finished k-means run
#[derive(Debug, Clone)]
struct Run {
    labels: Vec<usize>,
    inertia: f64,
}

/// Lloyd's k-means; the run with the lowest inertia wins
#[derive(Debug, Clone)]
pub struct KMeans {
    max_iter: usize,
    tol: f64,
    seed: Option<u64>,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            max_iter: 300,
            tol: 1e-4,
            seed: None,
        }
    }
}

impl KMeans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn seed_centers(rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centers = vec![rows[rng.gen_range(0..rows.len())].clone()];

        while centers.len() < k {
            let weights: Vec<f64> = rows
                .iter()
                .map(|row| {
                    centers
                        .iter()
                        .map(|c| squared_distance(row, c))
                        .fold(f64::INFINITY, f64::min)
                })
                .collect();

            let next = match WeightedIndex::new(&weights) {
                Ok(dist) => dist.sample(rng),
                Err(_) => rng.gen_range(0..rows.len()),
            };
            centers.push(rows[next].clone());
        }

        centers
    }

    fn assign(rows: &[Vec<f64>], centers: &[Vec<f64>]) -> Vec<usize> {
        rows.iter()
            .map(|row| {
                centers
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, squared_distance(row, c)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Give every empty cluster the point farthest from its current centre,
    /// taken from a cluster that can spare one.
    fn fill_empty(rows: &[Vec<f64>], labels: &mut [usize], centers: &mut [Vec<f64>]) {
        let k = centers.len();
        let mut sizes = vec![0usize; k];
        for &label in labels.iter() {
            sizes[label] += 1;
        }

        for cluster in 0..k {
            if sizes[cluster] > 0 {
                continue;
            }

            let donor = labels
                .iter()
                .enumerate()
                .filter(|(_, &label)| sizes[label] > 1)
                .map(|(i, &label)| (i, squared_distance(&rows[i], &centers[label])))
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(i, _)| i);

            if let Some(i) = donor {
                sizes[labels[i]] -= 1;
                labels[i] = cluster;
                sizes[cluster] += 1;
                centers[cluster] = rows[i].clone();
            }
        }
    }

    fn means(rows: &[Vec<f64>], labels: &[usize], centers: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let width = rows[0].len();
        let mut sums = vec![vec![0.0; width]; centers.len()];
        let mut sizes = vec![0usize; centers.len()];

        for (row, &label) in rows.iter().zip(labels) {
            sizes[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(row) {
                *s += v;
            }
        }

        sums.into_iter()
            .zip(sizes)
            .zip(centers)
            .map(|((sum, size), old)| {
                if size == 0 {
                    old.clone()
                } else {
                    sum.into_iter().map(|s| s / size as f64).collect()
                }
            })
            .collect()
    }

    /// Tolerance scaled by the mean per-feature variance of the data
    fn scaled_tol(&self, rows: &[Vec<f64>]) -> f64 {
        let n = rows.len() as f64;
        let width = rows[0].len();
        if width == 0 {
            return 0.0;
        }

        let variance_sum: f64 = (0..width)
            .map(|j| {
                let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
                rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n
            })
            .sum();
        self.tol * variance_sum / width as f64
    }

    fn run_once(&self, rows: &[Vec<f64>], k: usize, tol: f64, rng: &mut StdRng) -> Run {
        let mut centers = Self::seed_centers(rows, k, rng);
        let mut labels = Self::assign(rows, &centers);

        for iteration in 0..self.max_iter {
            Self::fill_empty(rows, &mut labels, &mut centers);
            let updated = Self::means(rows, &labels, &centers);
            let shift: f64 = centers
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centers = updated;
            labels = Self::assign(rows, &centers);

            if shift <= tol {
                debug!(iteration, shift, "K-means converged");
                break;
            }
        }

        Self::fill_empty(rows, &mut labels, &mut centers);
        let inertia = rows
            .iter()
            .zip(&labels)
            .map(|(row, &label)| squared_distance(row, &centers[label]))
            .sum();

        Run { labels, inertia }
    }
}

impl Clusterer for KMeans {
    fn fit_predict(&self, rows: &[Vec<f64>], k: usize, n_init: usize) -> Result<Vec<usize>> {
        if k == 0 || k > rows.len() {
            return Err(AnalyticsError::invalid_parameter(format!(
                "k must be in 1..={}, got {}",
                rows.len(),
                k
            )));
        }
        if n_init == 0 {
            return Err(AnalyticsError::invalid_parameter("n_init must be at least 1"));
        }
        let width = rows[0].len();
        if rows.iter().any(|r| r.len() != width) {
            return Err(AnalyticsError::invalid_parameter("rows differ in width"));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let tol = self.scaled_tol(rows);

        let mut best: Option<Run> = None;
        for _ in 0..n_init {
            let run = self.run_once(rows, k, tol, &mut rng);
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        best.map(|run| run.labels)
            .ok_or_else(|| AnalyticsError::model("k-means produced no run"))
    }

    fn name(&self) -> &'static str {
        "kmeans"
    }
}
