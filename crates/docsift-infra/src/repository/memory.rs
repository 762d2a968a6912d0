//! In-memory repository
//!
//! Nothing survives the process. Used by tests and one-shot CLI runs.

use async_trait::async_trait;
use docsift_core::{AppResult, Document, DocumentId, DocumentRepository, ExtractedText};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::CorpusState;

#[derive(Clone, Default)]
pub struct MemoryRepository {
    state: Arc<RwLock<CorpusState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DocumentRepository for MemoryRepository {
    async fn save_document(&self, document: &Document) -> AppResult<()> {
        self.state.write().await.insert_document(document)?;
        debug!(document_id = %document.id, "Document saved in memory");
        Ok(())
    }

    async fn save_extracted(&self, extracted: &ExtractedText) -> AppResult<()> {
        self.state.write().await.insert_extracted(extracted)?;
        Ok(())
    }

    async fn save_ingested(&self, document: &Document, extracted: &ExtractedText) -> AppResult<()> {
        self.state.write().await.insert_ingested(document, extracted)?;
        debug!(document_id = %document.id, "Document and text saved in memory");
        Ok(())
    }

    async fn list_documents(&self) -> AppResult<Vec<Document>> {
        Ok(self.state.read().await.documents.clone())
    }

    async fn list_extracted(&self) -> AppResult<Vec<ExtractedText>> {
        Ok(self.state.read().await.extracted.clone())
    }

    async fn get_document(&self, id: &DocumentId) -> AppResult<Option<Document>> {
        Ok(self.state.read().await.document(id))
    }

    async fn get_extracted(&self, id: &DocumentId) -> AppResult<Option<ExtractedText>> {
        Ok(self.state.read().await.extracted_for(id))
    }
}
