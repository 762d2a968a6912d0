//! Document Ingestion Pipeline
//!
//! Runs a single upload through classification, extraction, summarization
//! and statement extraction, then persists the blob, the document and its
//! extracted text. Unsupported or unparseable uploads store nothing.

use docsift_core::{
    AppConfig, BlobStore, Document, DocumentKind, DocumentRepository, ExtractedText,
    IngestConfig,
};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::classifier::classify;
use crate::extractors::ExtractorRegistry;
use crate::ocr::TextRecognizer;
use crate::statements::StatementExtractor;
use crate::summarizer::{SummarizationModel, Summarizer};
use crate::{IngestionError, Result};

/// An uploaded file awaiting ingestion
#[derive(Debug, Clone)]
pub struct Upload {
    /// Original filename, used for classification
    pub filename: String,
    /// Content type declared by the uploader
    pub content_type: String,
    /// Raw bytes
    pub content: Vec<u8>,
}

impl Upload {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// Read a file from disk, guessing its content type from the extension
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                IngestionError::ValidationError(format!("{} has no file name", path.display()))
            })?;
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();

        Ok(Self::new(filename, content_type, content))
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// What a successful ingestion persisted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionOutcome {
    pub document: Document,
    pub extracted: ExtractedText,
    pub processing_time_ms: u64,
    pub warnings: Vec<String>,
}

/// Pipeline statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineStats {
    pub documents_processed: u64,
    pub documents_failed: u64,
    pub documents_unsupported: u64,
    pub statements_extracted: u64,
    pub total_processing_time_ms: u64,
    pub bytes_processed: u64,
}

/// Document ingestion pipeline
pub struct IngestionPipeline {
    config: IngestConfig,
    registry: ExtractorRegistry,
    summarizer: Summarizer,
    statements: StatementExtractor,
    blobs: Arc<dyn BlobStore>,
    repository: Arc<dyn DocumentRepository>,
    stats: Arc<RwLock<PipelineStats>>,
}

impl IngestionPipeline {
    pub fn new(
        registry: ExtractorRegistry,
        summarizer: Summarizer,
        blobs: Arc<dyn BlobStore>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            config: IngestConfig::default(),
            registry,
            summarizer,
            statements: StatementExtractor::default(),
            blobs,
            repository,
            stats: Arc::new(RwLock::new(PipelineStats::default())),
        }
    }

    /// Wire a pipeline from application configuration with the default
    /// extractors.
    pub fn from_config(
        config: &AppConfig,
        model: Arc<dyn SummarizationModel>,
        recognizer: Arc<dyn TextRecognizer>,
        blobs: Arc<dyn BlobStore>,
        repository: Arc<dyn DocumentRepository>,
    ) -> Result<Self> {
        let summarizer = Summarizer::new(model, &config.summarizer)?;
        Ok(Self::new(
            ExtractorRegistry::with_defaults(recognizer),
            summarizer,
            blobs,
            repository,
        )
        .with_config(config.pipeline.clone())
        .with_statements(StatementExtractor::from_config(&config.statements)))
    }

    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_statements(mut self, statements: StatementExtractor) -> Self {
        self.statements = statements;
        self
    }

    /// Ingest a single upload
    pub async fn ingest(&self, upload: Upload) -> Result<IngestionOutcome> {
        let start = Instant::now();
        let filename = upload.filename.clone();
        let size = upload.size();

        let result = self.run(upload, start).await;

        let mut stats = self.stats.write().await;
        match &result {
            Ok(outcome) => {
                stats.documents_processed += 1;
                stats.statements_extracted += outcome.extracted.statements.len() as u64;
                stats.total_processing_time_ms += outcome.processing_time_ms;
                stats.bytes_processed += size as u64;

                info!(
                    document_id = %outcome.document.id,
                    filename = %filename,
                    kind = %outcome.document.kind,
                    statements = outcome.extracted.statements.len(),
                    processing_time_ms = outcome.processing_time_ms,
                    "Document ingested"
                );
            }
            Err(IngestionError::UnsupportedKind(_)) => {
                stats.documents_unsupported += 1;
                info!(filename = %filename, "Skipping unsupported document");
            }
            Err(e) => {
                stats.documents_failed += 1;
                warn!(filename = %filename, error = %e, "Document ingestion failed");
            }
        }

        result
    }

    async fn run(&self, upload: Upload, start: Instant) -> Result<IngestionOutcome> {
        let kind = classify(&upload.filename);
        if kind == DocumentKind::Unknown {
            return Err(IngestionError::UnsupportedKind(upload.filename));
        }

        if upload.size() > self.config.max_document_size {
            return Err(IngestionError::ValidationError(format!(
                "Document too large: {} bytes (max {})",
                upload.size(),
                self.config.max_document_size
            )));
        }

        let extraction = self.registry.extract(kind, &upload.content).await?;
        debug!(
            filename = %upload.filename,
            kind = %kind,
            chars = extraction.text.chars().count(),
            "Text extracted"
        );

        let (summary, statements) = tokio::join!(
            self.summarizer.summarize(&extraction.text),
            async { self.statements.extract(&extraction.text) }
        );

        let mut document = Document::new(
            upload.filename.clone(),
            upload.content_type.clone(),
            kind,
            upload.size(),
        );

        let locator = self.blobs.put(&upload.content, &upload.filename).await?;
        let extracted = ExtractedText::new(document.id, extraction.text, summary, statements);

        let saved = match document.assign_locator(locator.clone()) {
            Ok(()) => self.repository.save_ingested(&document, &extracted).await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            if let Err(cleanup) = self.blobs.remove(&locator).await {
                warn!(
                    locator = %locator,
                    error = %cleanup,
                    "Failed to remove blob after persistence failure"
                );
            }
            return Err(e.into());
        }

        Ok(IngestionOutcome {
            document,
            extracted,
            processing_time_ms: start.elapsed().as_millis() as u64,
            warnings: extraction.warnings,
        })
    }

    /// Ingest uploads concurrently, returning one result per upload in input
    /// order. A failed upload does not affect the others.
    pub async fn ingest_batch(&self, uploads: Vec<Upload>) -> Vec<Result<IngestionOutcome>> {
        let parallelism = self.config.parallelism.max(1);

        stream::iter(uploads)
            .map(|upload| self.ingest(upload))
            .buffered(parallelism)
            .collect()
            .await
    }

    /// Get pipeline statistics
    pub async fn stats(&self) -> PipelineStats {
        self.stats.read().await.clone()
    }

    /// Reset statistics
    pub async fn reset_stats(&self) {
        *self.stats.write().await = PipelineStats::default();
    }

    /// List registered extractors
    pub fn extractors(&self) -> Vec<&'static str> {
        self.registry.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::{ExtractionResult, TextExtractor};
    use crate::summarizer::tests::MockSummarizationModel;
    use async_trait::async_trait;
    use docsift_core::{AppError, AppResult, SummarizerConfig};
    use docsift_infra::MemoryRepository;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes and removals and hands out sequential locators
    #[derive(Default)]
    struct MockBlobStore {
        puts: AtomicUsize,
        removes: AtomicUsize,
        fail: bool,
    }

    impl MockBlobStore {
        fn live(&self) -> usize {
            self.puts.load(Ordering::SeqCst) - self.removes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlobStore for MockBlobStore {
        async fn put(&self, _bytes: &[u8], name: &str) -> AppResult<String> {
            if self.fail {
                return Err(AppError::storage("blob store offline"));
            }
            let n = self.puts.fetch_add(1, Ordering::SeqCst);
            Ok(format!("mock://{}/{}", n, name))
        }

        async fn remove(&self, _locator: &str) -> AppResult<()> {
            self.removes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    /// Extracts fixed text for one kind, or fails
    struct StubExtractor {
        kind: DocumentKind,
        text: Option<&'static str>,
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, _content: &[u8]) -> Result<ExtractionResult> {
            match self.text {
                Some(text) => Ok(ExtractionResult::new(text, self.kind)),
                None => Err(IngestionError::extraction(self.kind, "stub failure")),
            }
        }

        fn kind(&self) -> DocumentKind {
            self.kind
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    struct Fixture {
        pipeline: IngestionPipeline,
        blobs: Arc<MockBlobStore>,
        repository: Arc<MemoryRepository>,
    }

    /// Stores documents normally but fails to store any extracted text
    #[derive(Default)]
    struct TextlessRepository {
        inner: MemoryRepository,
    }

    #[async_trait]
    impl DocumentRepository for TextlessRepository {
        async fn save_document(&self, document: &Document) -> AppResult<()> {
            self.inner.save_document(document).await
        }

        async fn save_extracted(&self, _extracted: &ExtractedText) -> AppResult<()> {
            Err(AppError::storage("disk full"))
        }

        async fn save_ingested(&self, _document: &Document, _extracted: &ExtractedText) -> AppResult<()> {
            Err(AppError::storage("disk full"))
        }

        async fn list_documents(&self) -> AppResult<Vec<Document>> {
            self.inner.list_documents().await
        }

        async fn list_extracted(&self) -> AppResult<Vec<ExtractedText>> {
            self.inner.list_extracted().await
        }

        async fn get_document(&self, id: &docsift_core::DocumentId) -> AppResult<Option<Document>> {
            self.inner.get_document(id).await
        }

        async fn get_extracted(&self, id: &docsift_core::DocumentId) -> AppResult<Option<ExtractedText>> {
            self.inner.get_extracted(id).await
        }
    }

    fn build_pipeline(
        blobs: Arc<MockBlobStore>,
        repository: Arc<dyn DocumentRepository>,
    ) -> IngestionPipeline {
        let mut registry = ExtractorRegistry::new();
        registry.register(Arc::new(StubExtractor {
            kind: DocumentKind::Pdf,
            text: Some("The policy is clear. Nothing else here. This is a rule too."),
        }));
        registry.register(Arc::new(StubExtractor {
            kind: DocumentKind::Word,
            text: None,
        }));
        registry.register(Arc::new(StubExtractor {
            kind: DocumentKind::Image,
            text: Some(""),
        }));

        let summarizer = Summarizer::new(
            Arc::new(MockSummarizationModel::new()),
            &SummarizerConfig::default(),
        )
        .unwrap();

        IngestionPipeline::new(registry, summarizer, blobs, repository).with_config(IngestConfig {
            max_document_size: 64,
            parallelism: 2,
        })
    }

    fn fixture_with(blobs: MockBlobStore) -> Fixture {
        let blobs = Arc::new(blobs);
        let repository = Arc::new(MemoryRepository::new());
        let pipeline = build_pipeline(blobs.clone(), repository.clone());

        Fixture {
            pipeline,
            blobs,
            repository,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockBlobStore::default())
    }

    #[tokio::test]
    async fn test_successful_upload_persists_document_and_text() {
        let fx = fixture();

        let outcome = fx
            .pipeline
            .ingest(Upload::new("Report.PDF", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap();

        assert_eq!(outcome.document.kind, DocumentKind::Pdf);
        assert_eq!(outcome.document.locator(), Some("mock://0/Report.PDF"));
        assert_eq!(outcome.extracted.document_id, outcome.document.id);
        assert_eq!(
            outcome.extracted.statements,
            vec!["The policy is clear.", "This is a rule too."]
        );
        assert_eq!(outcome.extracted.summary, "");

        let documents = fx.repository.list_documents().await.unwrap();
        let extracted = fx.repository.list_extracted().await.unwrap();
        assert_eq!(documents, vec![outcome.document.clone()]);
        assert_eq!(extracted, vec![outcome.extracted.clone()]);
    }

    #[tokio::test]
    async fn test_unsupported_upload_stores_nothing() {
        let fx = fixture();

        let err = fx
            .pipeline
            .ingest(Upload::new("notes.txt", "text/plain", b"hello".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::UnsupportedKind(_)));
        assert_eq!(fx.blobs.puts.load(Ordering::SeqCst), 0);
        assert!(fx.repository.list_documents().await.unwrap().is_empty());
        assert_eq!(fx.pipeline.stats().await.documents_unsupported, 1);
    }

    #[tokio::test]
    async fn test_extraction_failure_stores_nothing() {
        let fx = fixture();

        let err = fx
            .pipeline
            .ingest(Upload::new("memo.docx", "application/msword", b"x".to_vec()))
            .await
            .unwrap_err();

        assert!(err.is_document_local());
        assert_eq!(fx.blobs.puts.load(Ordering::SeqCst), 0);
        assert!(fx.repository.list_documents().await.unwrap().is_empty());
        assert_eq!(fx.pipeline.stats().await.documents_failed, 1);
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let fx = fixture();

        let err = fx
            .pipeline
            .ingest(Upload::new("big.pdf", "application/pdf", vec![0; 65]))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_valid() {
        let fx = fixture();

        let outcome = fx
            .pipeline
            .ingest(Upload::new("blank.png", "image/png", b"png".to_vec()))
            .await
            .unwrap();

        assert!(!outcome.extracted.has_text());
        assert!(outcome.extracted.statements.is_empty());
        assert_eq!(outcome.extracted.summary, "");
    }

    #[tokio::test]
    async fn test_blob_failure_is_storage_error() {
        let fx = fixture_with(MockBlobStore {
            fail: true,
            ..MockBlobStore::default()
        });

        let err = fx
            .pipeline
            .ingest(Upload::new("a.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Storage(_)));
        assert!(!err.is_document_local());
        assert!(fx.repository.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_text_save_leaves_nothing_behind() {
        let blobs = Arc::new(MockBlobStore::default());
        let repository = Arc::new(TextlessRepository::default());
        let pipeline = build_pipeline(blobs.clone(), repository.clone());

        let err = pipeline
            .ingest(Upload::new("a.pdf", "application/pdf", b"%PDF".to_vec()))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestionError::Storage(AppError::Storage(_))));
        assert!(repository.list_documents().await.unwrap().is_empty());
        assert!(repository.list_extracted().await.unwrap().is_empty());
        assert_eq!(blobs.puts.load(Ordering::SeqCst), 1);
        assert_eq!(blobs.live(), 0);
        assert_eq!(pipeline.stats().await.documents_failed, 1);
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_isolates_failures() {
        let fx = fixture();

        let results = fx
            .pipeline
            .ingest_batch(vec![
                Upload::new("a.pdf", "application/pdf", b"1".to_vec()),
                Upload::new("b.docx", "application/msword", b"2".to_vec()),
                Upload::new("c.txt", "text/plain", b"3".to_vec()),
                Upload::new("d.pdf", "application/pdf", b"4".to_vec()),
            ])
            .await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().document.filename, "a.pdf");
        assert!(results[1].is_err());
        assert!(matches!(results[2], Err(IngestionError::UnsupportedKind(_))));
        assert_eq!(results[3].as_ref().unwrap().document.filename, "d.pdf");

        let stats = fx.pipeline.stats().await;
        assert_eq!(stats.documents_processed, 2);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.documents_unsupported, 1);
        assert_eq!(stats.statements_extracted, 4);
        assert_eq!(fx.repository.list_extracted().await.unwrap().len(), 2);

        fx.pipeline.reset_stats().await;
        assert_eq!(fx.pipeline.stats().await.documents_processed, 0);
    }

    #[tokio::test]
    async fn test_upload_from_file_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.csv");
        tokio::fs::write(&path, b"a,b\n").await.unwrap();

        let upload = Upload::from_file(&path).await.unwrap();

        assert_eq!(upload.filename, "rules.csv");
        assert_eq!(upload.content_type, "text/csv");
        assert_eq!(upload.size(), 4);
    }
}
