//! Pipeline, storage and analytics wired together over a temporary directory.

use async_trait::async_trait;
use docsift_analytics::CorpusAnalytics;
use docsift_core::{AppConfig, BlobStore, DocumentKind, DocumentRepository, StorageConfig};
use docsift_infra::{JsonFileRepository, LocalBlobStore};
use docsift_ingestion::{
    ExtractiveModel, IngestionError, IngestionPipeline, OcrError, TextRecognizer, Upload,
};
use std::sync::Arc;
use tempfile::TempDir;

struct NoOcr;

#[async_trait]
impl TextRecognizer for NoOcr {
    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Ok(String::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

struct Harness {
    _dir: TempDir,
    config: AppConfig,
    blobs: Arc<LocalBlobStore>,
    repository: Arc<JsonFileRepository>,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig {
            storage: StorageConfig::with_root(dir.path()),
            ..AppConfig::default()
        };
        config.analytics.seed = Some(21);

        let blobs = Arc::new(LocalBlobStore::new(&config.storage.blob_dir));
        let repository = Arc::new(
            JsonFileRepository::open(config.storage.database_path())
                .await
                .unwrap(),
        );

        Self {
            _dir: dir,
            config,
            blobs,
            repository,
        }
    }

    fn pipeline(&self) -> IngestionPipeline {
        let blobs: Arc<dyn BlobStore> = self.blobs.clone();
        let repository: Arc<dyn DocumentRepository> = self.repository.clone();
        IngestionPipeline::from_config(
            &self.config,
            Arc::new(ExtractiveModel::new()),
            Arc::new(NoOcr),
            blobs,
            repository,
        )
        .unwrap()
    }

    fn analytics(&self) -> CorpusAnalytics {
        let repository: Arc<dyn DocumentRepository> = self.repository.clone();
        CorpusAnalytics::new(repository, &self.config.analytics)
    }
}

fn csv_upload(name: &str, first: &str, second: &str) -> Upload {
    let body = format!("note\n{}\n{}\nNothing relevant here.\n", first, second);
    Upload::new(name, "text/csv", body.into_bytes())
}

#[tokio::test]
async fn test_batch_ingest_then_analytics() {
    let harness = Harness::new().await;
    let pipeline = harness.pipeline();

    let uploads = vec![
        csv_upload(
            "security.csv",
            "The password policy requires rotation every quarter.",
            "Badges must follow the access rule at all times.",
        ),
        Upload::new("notes.txt", "text/plain", b"just notes".to_vec()),
        csv_upload(
            "travel.csv",
            "Flights follow the travel directive for employees.",
            "Hotel stays fall under the expense policy.",
        ),
        Upload::new(
            "broken.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            b"not a workbook".to_vec(),
        ),
        csv_upload(
            "remote.csv",
            "The remote work rule allows two days per week.",
            "Equipment loans follow the hardware policy.",
        ),
    ];

    let results = pipeline.ingest_batch(uploads).await;

    assert_eq!(results.len(), 5);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(IngestionError::UnsupportedKind(_))));
    assert!(results[2].is_ok());
    assert!(matches!(
        results[3],
        Err(IngestionError::ExtractionFailed {
            kind: DocumentKind::Spreadsheet,
            ..
        })
    ));
    assert!(results[4].is_ok());

    let stats = pipeline.stats().await;
    assert_eq!(stats.documents_processed, 3);
    assert_eq!(stats.documents_unsupported, 1);
    assert_eq!(stats.documents_failed, 1);
    assert_eq!(stats.statements_extracted, 6);

    // Only successful uploads leave anything behind
    let documents = harness.repository.list_documents().await.unwrap();
    assert_eq!(documents.len(), 3);
    let blob_count = std::fs::read_dir(harness.blobs.root()).unwrap().count();
    assert_eq!(blob_count, 3);
    for document in &documents {
        let locator = document.locator().unwrap();
        assert!(!harness.blobs.read(locator).await.unwrap().is_empty());
    }

    let analytics = harness.analytics();

    let summary = analytics.summary().await.unwrap();
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.file_types["text/csv"], 3);
    assert_eq!(summary.total_policies, 6);

    let clusters = analytics.clusters().await.unwrap();
    assert_eq!(clusters.cluster_count(), 3);
    assert_eq!(clusters.statement_count(), 6);
    assert!(clusters.clusters.iter().all(|c| !c.is_empty()));

    // Three similar-length documents are not enough to stand out
    let anomalies = analytics.anomalies().await.unwrap();
    assert!(anomalies.len() <= 1);
}

#[tokio::test]
async fn test_corpus_survives_reopen() {
    let harness = Harness::new().await;
    let outcome = harness
        .pipeline()
        .ingest(csv_upload(
            "policy.csv",
            "The retention policy keeps records for seven years.",
            "Shredding follows the disposal rule.",
        ))
        .await
        .unwrap();

    let reopened = JsonFileRepository::open(harness.config.storage.database_path())
        .await
        .unwrap();

    let document = reopened.get_document(&outcome.document.id).await.unwrap().unwrap();
    assert_eq!(document, outcome.document);
    assert!(document.locator().is_some());

    let extracted = reopened.get_extracted(&outcome.document.id).await.unwrap().unwrap();
    assert_eq!(extracted, outcome.extracted);
    assert_eq!(extracted.statements.len(), 2);
    assert_eq!(extracted.summary, "");
}

#[tokio::test]
async fn test_single_document_has_no_anomalies() {
    let harness = Harness::new().await;
    harness
        .pipeline()
        .ingest(csv_upload("one.csv", "A policy.", "A rule."))
        .await
        .unwrap();

    assert!(harness.analytics().anomalies().await.unwrap().is_empty());
}
