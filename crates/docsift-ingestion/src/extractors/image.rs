use async_trait::async_trait;
use docsift_core::DocumentKind;
use std::sync::Arc;
use tracing::debug;

use super::{ExtractionResult, TextExtractor};
use crate::ocr::TextRecognizer;
use crate::{IngestionError, Result};

/// Image extractor: OCR output returned verbatim
#[derive(Clone)]
pub struct ImageExtractor {
    recognizer: Arc<dyn TextRecognizer>,
}

impl ImageExtractor {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self { recognizer }
    }
}

#[async_trait]
impl TextExtractor for ImageExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let text = self
            .recognizer
            .recognize(content)
            .await
            .map_err(|e| IngestionError::extraction(DocumentKind::Image, e.to_string()))?;

        debug!(
            recognizer = self.recognizer.name(),
            chars = text.chars().count(),
            "Extracted image text"
        );

        Ok(ExtractionResult::new(text, DocumentKind::Image)
            .with_metadata("recognizer", serde_json::json!(self.recognizer.name())))
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Image
    }

    fn name(&self) -> &'static str {
        "image"
    }
}
