//! Document Text Extractors
//!
//! One extractor per supported [`DocumentKind`], selected through an
//! [`ExtractorRegistry`]. Parsers are CPU bound and run on the blocking pool.

mod image;
mod pdf;
mod tabular;
mod word;

pub use self::image::ImageExtractor;
pub use self::pdf::PdfExtractor;
pub use self::tabular::{CsvExtractor, SpreadsheetExtractor, Table};
pub use self::word::WordExtractor;

use async_trait::async_trait;
use docsift_core::DocumentKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::ocr::TextRecognizer;
use crate::{IngestionError, Result};

/// Result of text extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text content, possibly empty
    pub text: String,
    /// Kind the text was extracted as
    pub kind: DocumentKind,
    /// Extracted metadata
    pub metadata: HashMap<String, serde_json::Value>,
    /// Warnings during extraction
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    pub fn new(text: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            text: text.into(),
            kind,
            metadata: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }
}

/// Trait for document text extractors
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from document content
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult>;

    /// Kind of document this extractor understands
    fn kind(&self) -> DocumentKind;

    /// Get extractor name
    fn name(&self) -> &'static str;
}

/// Run a parser on the blocking pool, mapping a crashed task to an
/// extraction failure for `kind`.
pub(crate) async fn run_blocking<T, F>(kind: DocumentKind, parse: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(parse)
        .await
        .map_err(|e| IngestionError::extraction(kind, format!("parser task failed: {}", e)))?
}

/// Registry of extractors keyed by document kind
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<DocumentKind, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with the built-in extractor for every supported kind
    pub fn with_defaults(recognizer: Arc<dyn TextRecognizer>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PdfExtractor::new()));
        registry.register(Arc::new(SpreadsheetExtractor::new()));
        registry.register(Arc::new(CsvExtractor::new()));
        registry.register(Arc::new(WordExtractor::new()));
        registry.register(Arc::new(ImageExtractor::new(recognizer)));
        registry
    }

    /// Register an extractor, replacing any previous one for the same kind
    pub fn register(&mut self, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    /// Get the extractor for a kind
    pub fn get(&self, kind: DocumentKind) -> Option<Arc<dyn TextExtractor>> {
        self.extractors.get(&kind).cloned()
    }

    /// Extract `content` with the extractor registered for `kind`
    pub async fn extract(&self, kind: DocumentKind, content: &[u8]) -> Result<ExtractionResult> {
        let extractor = self
            .get(kind)
            .ok_or_else(|| IngestionError::UnsupportedKind(kind.to_string()))?;
        extractor.extract(content).await
    }

    /// List all registered extractors
    pub fn list(&self) -> Vec<&'static str> {
        self.extractors.values().map(|e| e.name()).collect()
    }
}
