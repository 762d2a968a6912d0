//! Document Ingestion Pipeline for docsift
//!
//! Turns uploaded bytes into plain text, a summary and a list of policy
//! statements, then hands the results to the storage collaborators.
//!
//! # Stages
//!
//! - Type classification by filename extension
//! - Per-kind text extraction (PDF, spreadsheet, CSV, Word, image via OCR)
//! - Chunked summarization with per-chunk failure isolation
//! - Keyword-based policy statement extraction
//! - Persistence of the document, its blob and its extracted text

pub mod chunking;
pub mod classifier;
pub mod extractors;
pub mod ocr;
pub mod pipeline;
pub mod statements;
pub mod summarizer;

use docsift_core::{AppError, DocumentKind};

// Re-exports
pub use chunking::{Chunk, WordChunker};
pub use classifier::classify;
pub use extractors::{
    CsvExtractor, ExtractionResult, ExtractorRegistry, ImageExtractor, PdfExtractor,
    SpreadsheetExtractor, Table, TextExtractor, WordExtractor,
};
pub use ocr::{OcrError, TesseractRecognizer, TextRecognizer};
pub use pipeline::{IngestionOutcome, IngestionPipeline, PipelineStats, Upload};
pub use statements::{extract_statements, split_sentences, StatementExtractor};
pub use summarizer::{
    build_model, ExtractiveModel, HttpSummarizationModel, SummarizationError, SummarizationModel, Summarizer,
    SummarizerHandle, SummaryRequest,
};

/// Error types for ingestion operations
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Unsupported document type: {0}")]
    UnsupportedKind(String),

    #[error("Extraction failed for {kind} document: {reason}")]
    ExtractionFailed { kind: DocumentKind, reason: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] AppError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl IngestionError {
    pub fn extraction(kind: DocumentKind, reason: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether the failure concerns only the upload itself, as opposed to the
    /// collaborators the pipeline writes to.
    pub fn is_document_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedKind(_) | Self::ExtractionFailed { .. } | Self::ValidationError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IngestionError>;

impl From<IngestionError> for AppError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::UnsupportedKind(name) => {
                AppError::validation(format!("unsupported document type: {}", name))
            }
            IngestionError::ExtractionFailed { kind, reason } => {
                AppError::validation(format!("{} extraction failed: {}", kind, reason))
            }
            IngestionError::ValidationError(msg) => AppError::validation(msg),
            IngestionError::Storage(err) => err,
            IngestionError::IoError(err) => AppError::internal(err.to_string()),
            IngestionError::PipelineError(msg) => AppError::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestionError::UnsupportedKind("notes.txt".to_string());
        assert!(err.to_string().contains("Unsupported document type"));

        let err = IngestionError::extraction(DocumentKind::Pdf, "bad xref");
        assert_eq!(err.to_string(), "Extraction failed for pdf document: bad xref");
        assert!(err.is_document_local());
    }

    #[test]
    fn test_storage_errors_are_not_document_local() {
        let err = IngestionError::from(AppError::storage("disk full"));
        assert!(!err.is_document_local());

        let app: AppError = err.into();
        assert!(matches!(app, AppError::Storage(_)));
    }
}
