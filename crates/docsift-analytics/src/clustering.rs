//! Topic clustering of policy statements.

use docsift_core::{AnalyticsConfig, ClusterReport};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::kmeans::{Clusterer, KMeans};
use crate::tfidf::{TfidfVectorizer, Vectorizer};
use crate::{AnalyticsError, Result};

/// Clustering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Upper bound on the number of clusters
    pub max_clusters: usize,
    /// K-means restarts
    pub n_init: usize,
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_clusters: 3,
            n_init: 10,
            seed: None,
        }
    }
}

impl From<&AnalyticsConfig> for ClusterConfig {
    fn from(config: &AnalyticsConfig) -> Self {
        Self {
            max_clusters: config.max_clusters,
            n_init: config.n_init,
            seed: config.seed,
        }
    }
}

/// Groups statements into at most `max_clusters` topics
#[derive(Clone)]
pub struct StatementClusterer {
    vectorizer: Arc<dyn Vectorizer>,
    clusterer: Arc<dyn Clusterer>,
    config: ClusterConfig,
}

impl StatementClusterer {
    pub fn new(config: ClusterConfig) -> Self {
        Self {
            vectorizer: Arc::new(TfidfVectorizer::new()),
            clusterer: Arc::new(KMeans::new().with_seed(config.seed)),
            config,
        }
    }

    pub fn with_vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn with_clusterer(mut self, clusterer: Arc<dyn Clusterer>) -> Self {
        self.clusterer = clusterer;
        self
    }

    /// Number of clusters used for `statement_count` statements
    pub fn cluster_count_for(&self, statement_count: usize) -> usize {
        self.config.max_clusters.min(statement_count)
    }

    /// Partition `statements` into clusters, returned in label order.
    pub fn cluster(&self, statements: &[String]) -> Result<ClusterReport> {
        if statements.is_empty() {
            return Ok(ClusterReport::empty());
        }

        let n = self.cluster_count_for(statements.len());
        if n < 2 {
            return Ok(ClusterReport {
                clusters: statements.iter().map(|s| vec![s.clone()]).collect(),
            });
        }

        let matrix = self.vectorizer.fit_transform(statements)?;
        if matrix.len() != statements.len() {
            return Err(AnalyticsError::model(format!(
                "{} returned {} rows for {} statements",
                self.vectorizer.name(),
                matrix.len(),
                statements.len()
            )));
        }

        let labels = self
            .clusterer
            .fit_predict(&matrix, n, self.config.n_init)?;

        let mut clusters: Vec<Vec<String>> = vec![Vec::new(); n];
        for (statement, label) in statements.iter().zip(labels) {
            let bucket = clusters.get_mut(label).ok_or_else(|| {
                AnalyticsError::model(format!(
                    "{} produced label {} for {} clusters",
                    self.clusterer.name(),
                    label,
                    n
                ))
            })?;
            bucket.push(statement.clone());
        }

        debug!(
            statements = statements.len(),
            clusters = n,
            vectorizer = self.vectorizer.name(),
            clusterer = self.clusterer.name(),
            "Statements clustered"
        );

        Ok(ClusterReport { clusters })
    }
}

impl Default for StatementClusterer {
    fn default() -> Self {
        Self::new(ClusterConfig::default())
    }
}
