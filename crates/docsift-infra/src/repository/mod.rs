//! Document repositories

pub mod json;
pub mod memory;

pub use json::JsonFileRepository;
pub use memory::MemoryRepository;

use docsift_core::{
    AppResult, Document, DocumentId, DocumentRepository, ExtractedText, StorageBackend,
    StorageConfig,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::{InfraError, Result};

/// Everything a repository holds, in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct CorpusState {
    #[serde(default)]
    documents: Vec<Document>,
    #[serde(default)]
    extracted: Vec<ExtractedText>,
}

impl CorpusState {
    /// Stored documents never change, so a repeated id is a conflict.
    fn insert_document(&mut self, document: &Document) -> Result<()> {
        if self.documents.iter().any(|d| d.id == document.id) {
            return Err(InfraError::Conflict(format!(
                "document {} already stored",
                document.id
            )));
        }
        self.documents.push(document.clone());
        Ok(())
    }

    /// Insert a document and its text, leaving the state unchanged on error.
    fn insert_ingested(&mut self, document: &Document, extracted: &ExtractedText) -> Result<()> {
        if extracted.document_id != document.id {
            return Err(InfraError::Conflict(format!(
                "extracted text belongs to document {}, not {}",
                extracted.document_id, document.id
            )));
        }
        self.insert_document(document)?;
        if let Err(e) = self.insert_extracted(extracted) {
            self.documents.pop();
            return Err(e);
        }
        Ok(())
    }

    fn insert_extracted(&mut self, extracted: &ExtractedText) -> Result<()> {
        if !self.documents.iter().any(|d| d.id == extracted.document_id) {
            return Err(InfraError::NotFound(format!(
                "document {}",
                extracted.document_id
            )));
        }
        if self
            .extracted
            .iter()
            .any(|e| e.document_id == extracted.document_id)
        {
            return Err(InfraError::Conflict(format!(
                "extracted text already stored for document {}",
                extracted.document_id
            )));
        }
        self.extracted.push(extracted.clone());
        Ok(())
    }

    fn document(&self, id: &DocumentId) -> Option<Document> {
        self.documents.iter().find(|d| d.id == *id).cloned()
    }

    fn extracted_for(&self, id: &DocumentId) -> Option<ExtractedText> {
        self.extracted.iter().find(|e| e.document_id == *id).cloned()
    }
}

/// Open the repository selected by `config.backend`.
pub async fn open_repository(config: &StorageConfig) -> AppResult<Arc<dyn DocumentRepository>> {
    let repository: Arc<dyn DocumentRepository> = match config.backend {
        StorageBackend::Memory => Arc::new(MemoryRepository::new()),
        StorageBackend::Json => Arc::new(JsonFileRepository::open(config.database_path()).await?),
    };
    info!(backend = ?config.backend, "Repository opened");
    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::DocumentKind;

    fn document() -> Document {
        Document::new("a.pdf", "application/pdf", DocumentKind::Pdf, 3)
    }

    #[test]
    fn test_extracted_requires_document() {
        let mut state = CorpusState::default();
        let orphan = ExtractedText::new(DocumentId::new(), "text", "", vec![]);

        assert!(matches!(
            state.insert_extracted(&orphan),
            Err(InfraError::NotFound(_))
        ));
    }

    #[test]
    fn test_second_extracted_conflicts() {
        let mut state = CorpusState::default();
        let doc = document();
        state.insert_document(&doc).unwrap();

        let first = ExtractedText::new(doc.id, "first", "", vec![]);
        let second = ExtractedText::new(doc.id, "second", "", vec![]);

        state.insert_extracted(&first).unwrap();
        assert!(matches!(
            state.insert_extracted(&second),
            Err(InfraError::Conflict(_))
        ));
        assert_eq!(state.extracted_for(&doc.id).unwrap().raw_text, "first");
    }

    #[test]
    fn test_second_save_of_document_conflicts() {
        let mut state = CorpusState::default();
        let mut doc = document();
        doc.assign_locator("local://first").unwrap();
        state.insert_document(&doc).unwrap();

        let mut replacement = doc.clone();
        replacement.kind = DocumentKind::Image;

        assert!(matches!(
            state.insert_document(&replacement),
            Err(InfraError::Conflict(_))
        ));
        assert_eq!(state.documents.len(), 1);
        let stored = state.document(&doc.id).unwrap();
        assert_eq!(stored.kind, DocumentKind::Pdf);
        assert_eq!(stored.locator(), Some("local://first"));
    }

    #[test]
    fn test_ingested_pair_stored_together() {
        let mut state = CorpusState::default();
        let doc = document();

        state
            .insert_ingested(&doc, &ExtractedText::new(doc.id, "text", "", vec![]))
            .unwrap();

        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.extracted_for(&doc.id).unwrap().raw_text, "text");
    }

    #[test]
    fn test_rejected_ingested_pair_stores_nothing() {
        let mut state = CorpusState::default();
        let existing = document();
        state.insert_document(&existing).unwrap();

        // Same id as a stored document
        let err = state
            .insert_ingested(&existing, &ExtractedText::new(existing.id, "dup", "", vec![]))
            .unwrap_err();
        assert!(matches!(err, InfraError::Conflict(_)));

        // Text for a different document
        let fresh = document();
        let err = state
            .insert_ingested(&fresh, &ExtractedText::new(existing.id, "x", "", vec![]))
            .unwrap_err();
        assert!(matches!(err, InfraError::Conflict(_)));

        assert_eq!(state.documents.len(), 1);
        assert!(state.document(&fresh.id).is_none());
        assert!(state.extracted.is_empty());
    }

    #[tokio::test]
    async fn test_open_memory_backend() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let repo = open_repository(&config).await.unwrap();
        assert!(repo.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_json_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StorageConfig::with_root(dir.path());

        let repo = open_repository(&config).await.unwrap();
        repo.save_document(&document()).await.unwrap();

        assert!(config.database_path().exists());
    }
}
