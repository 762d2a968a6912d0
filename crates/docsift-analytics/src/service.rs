//! Corpus-wide analytics over a repository snapshot.

use docsift_core::{
    AnalyticsConfig, AnomalyReport, ClusterReport, CorpusSummary, DocumentRepository,
};
use std::sync::Arc;
use tracing::info;

use crate::anomaly::{AnomalyConfig, AnomalyDetector};
use crate::clustering::{ClusterConfig, StatementClusterer};
use crate::summary::summarize_corpus;
use crate::Result;

/// Recomputes analytics from the repository on every call
#[derive(Clone)]
pub struct CorpusAnalytics {
    repository: Arc<dyn DocumentRepository>,
    detector: AnomalyDetector,
    clusterer: StatementClusterer,
}

impl CorpusAnalytics {
    pub fn new(repository: Arc<dyn DocumentRepository>, config: &AnalyticsConfig) -> Self {
        Self {
            repository,
            detector: AnomalyDetector::new(AnomalyConfig::from(config)),
            clusterer: StatementClusterer::new(ClusterConfig::from(config)),
        }
    }

    pub fn with_detector(mut self, detector: AnomalyDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_clusterer(mut self, clusterer: StatementClusterer) -> Self {
        self.clusterer = clusterer;
        self
    }

    /// Documents whose extracted text length is an outlier
    pub async fn anomalies(&self) -> Result<AnomalyReport> {
        let extracted = self.repository.list_extracted().await?;
        let detector = self.detector.clone();

        let report = tokio::task::spawn_blocking(move || detector.detect(&extracted)).await??;
        info!(anomalies = report.len(), "Anomaly report computed");
        Ok(report)
    }

    /// Every statement in the corpus grouped by topic
    pub async fn clusters(&self) -> Result<ClusterReport> {
        let statements: Vec<String> = self
            .repository
            .list_extracted()
            .await?
            .into_iter()
            .flat_map(|e| e.statements)
            .collect();
        let clusterer = self.clusterer.clone();

        let report = tokio::task::spawn_blocking(move || clusterer.cluster(&statements)).await??;
        info!(
            clusters = report.cluster_count(),
            statements = report.statement_count(),
            "Cluster report computed"
        );
        Ok(report)
    }

    /// Document and statement counts
    pub async fn summary(&self) -> Result<CorpusSummary> {
        let records = self.repository.list_records().await?;
        Ok(summarize_corpus(&records))
    }
}
