//! Application wiring: configuration, stores and services

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use docsift_analytics::CorpusAnalytics;
use docsift_core::{AppConfig, BlobStore, DocumentRepository};
use docsift_infra::{open_repository, LocalBlobStore};
use docsift_ingestion::{
    build_model, IngestionPipeline, SummarizerHandle, TesseractRecognizer, TextRecognizer,
};

/// Load configuration from defaults, an optional file and `DOCSIFT__*`
/// environment variables.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load().context("Failed to load configuration")?,
    };
    Ok(config)
}

/// Opened stores plus the configuration they came from
pub struct App {
    pub config: AppConfig,
    pub repository: Arc<dyn DocumentRepository>,
    blobs: Arc<dyn BlobStore>,
}

impl App {
    pub async fn open(config: AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let repository = open_repository(&config.storage)
            .await
            .context("Failed to open document repository")?;
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(&config.storage.blob_dir));

        info!(
            data_dir = %config.storage.data_dir.display(),
            blob_dir = %config.storage.blob_dir.display(),
            "Stores opened"
        );

        Ok(Self {
            config,
            repository,
            blobs,
        })
    }

    /// Build the ingestion pipeline. The summarization model is created once
    /// per process and shared by every pipeline.
    pub fn pipeline(&self) -> Result<IngestionPipeline> {
        let model = SummarizerHandle::global()
            .get_or_try_init(|| build_model(&self.config.summarizer))
            .context("Failed to initialize summarization model")?;
        let recognizer: Arc<dyn TextRecognizer> =
            Arc::new(TesseractRecognizer::new(&self.config.ocr));

        let pipeline = IngestionPipeline::from_config(
            &self.config,
            model,
            recognizer,
            self.blobs.clone(),
            self.repository.clone(),
        )?;
        Ok(pipeline)
    }

    pub fn analytics(&self) -> CorpusAnalytics {
        CorpusAnalytics::new(self.repository.clone(), &self.config.analytics)
    }
}
