//! Chunked summarization.
//!
//! Long text is cut into word chunks, each chunk is summarized by a
//! [`SummarizationModel`] and the partial summaries are joined in order.
//! A chunk the model fails on contributes an empty string.

mod extractive;
mod http;

pub use extractive::ExtractiveModel;
pub use http::HttpSummarizationModel;

use async_trait::async_trait;
use docsift_core::{SummarizerBackend, SummarizerConfig};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::chunking::WordChunker;
use crate::{IngestionError, Result};

/// Summarization capability failures
#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("Summarization request failed: {0}")]
    Request(String),

    #[error("Summarization service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid summarization response: {0}")]
    InvalidResponse(String),

    #[error("Summarization model error: {0}")]
    Model(String),
}

/// Length bounds passed to the model for each chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub min_length: usize,
    pub max_length: usize,
    pub deterministic: bool,
}

impl SummaryRequest {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            deterministic: true,
        }
    }
}

impl From<&SummarizerConfig> for SummaryRequest {
    fn from(config: &SummarizerConfig) -> Self {
        Self::new(config.min_length, config.max_length)
    }
}

/// A model that condenses one chunk of text
#[async_trait]
pub trait SummarizationModel: Send + Sync {
    async fn summarize_chunk(
        &self,
        text: &str,
        request: &SummaryRequest,
    ) -> std::result::Result<String, SummarizationError>;

    /// Model name, used in logs
    fn name(&self) -> &'static str;
}

/// Build the model selected by configuration
pub fn build_model(config: &SummarizerConfig) -> Result<Arc<dyn SummarizationModel>> {
    match config.backend {
        SummarizerBackend::Extractive => {
            let model: Arc<dyn SummarizationModel> = Arc::new(ExtractiveModel::new());
            Ok(model)
        }
        SummarizerBackend::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                IngestionError::ValidationError(
                    "the http summarizer requires an endpoint".to_string(),
                )
            })?;
            let mut model = HttpSummarizationModel::new(endpoint)?;
            if let Some(token) = &config.api_token {
                model = model.with_token(token.clone());
            }
            let model: Arc<dyn SummarizationModel> = Arc::new(model);
            Ok(model)
        }
    }
}

/// Process-wide summarization model, set once and never torn down
pub struct SummarizerHandle {
    cell: OnceCell<Arc<dyn SummarizationModel>>,
}

static GLOBAL_MODEL: SummarizerHandle = SummarizerHandle::new();

impl SummarizerHandle {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// The handle shared by the whole process
    pub fn global() -> &'static SummarizerHandle {
        &GLOBAL_MODEL
    }

    /// Install the model. Fails with the rejected model if one is already set.
    pub fn install(
        &self,
        model: Arc<dyn SummarizationModel>,
    ) -> std::result::Result<(), Arc<dyn SummarizationModel>> {
        self.cell.set(model)
    }

    pub fn get(&self) -> Option<Arc<dyn SummarizationModel>> {
        self.cell.get().cloned()
    }

    /// Return the installed model, building it on first use
    pub fn get_or_try_init<F>(&self, init: F) -> Result<Arc<dyn SummarizationModel>>
    where
        F: FnOnce() -> Result<Arc<dyn SummarizationModel>>,
    {
        self.cell.get_or_try_init(init).cloned()
    }
}

impl Default for SummarizerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Chunked summarizer over an injected model
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn SummarizationModel>,
    chunker: WordChunker,
    min_chunk_words: usize,
    request: SummaryRequest,
}

impl Summarizer {
    pub fn new(model: Arc<dyn SummarizationModel>, config: &SummarizerConfig) -> Result<Self> {
        Ok(Self {
            model,
            chunker: WordChunker::new(config.chunk_words)?,
            min_chunk_words: config.min_chunk_words,
            request: SummaryRequest::from(config),
        })
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Summarize `text`. Never fails; a failed chunk becomes `""`.
    pub async fn summarize(&self, text: &str) -> String {
        let text = text.trim();
        if text.is_empty() {
            return String::new();
        }

        let chunks = self.chunker.chunk(text);
        let mut parts = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            if chunk.is_shorter_than(self.min_chunk_words) {
                debug!(
                    chunk = chunk.index,
                    words = chunk.word_count,
                    "Skipping short chunk"
                );
                continue;
            }

            match self.model.summarize_chunk(&chunk.content, &self.request).await {
                Ok(summary) => parts.push(summary),
                Err(e) => {
                    warn!(
                        chunk = chunk.index,
                        model = self.model.name(),
                        error = %e,
                        "Chunk summarization failed"
                    );
                    parts.push(String::new());
                }
            }
        }

        debug!(
            chunks = chunks.len(),
            summarized = parts.len(),
            model = self.model.name(),
            "Summarization complete"
        );

        parts.join(" ")
    }
}
