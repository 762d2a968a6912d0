//! Collaborator interfaces the pipeline and analytics depend on.
//!
//! Implementations live in `docsift-infra`; tests use in-memory doubles.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::types::{Document, DocumentId, DocumentRecord, ExtractedText};

/// Durable byte storage. The returned locator is opaque to callers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under a name derived from `name`, returning a locator.
    async fn put(&self, bytes: &[u8], name: &str) -> AppResult<String>;

    /// Delete the blob behind a locator returned by `put`.
    async fn remove(&self, locator: &str) -> AppResult<()>;

    /// Backend name, used in logs
    fn name(&self) -> &'static str;
}

/// Persistence for documents and their extracted text.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fails with `Conflict` when a document with the same id exists.
    async fn save_document(&self, document: &Document) -> AppResult<()>;

    /// Fails with `NotFound` when the owning document was never saved and
    /// with `Conflict` when text already exists for it.
    async fn save_extracted(&self, extracted: &ExtractedText) -> AppResult<()>;

    /// Store a new document together with its extracted text. Either both
    /// are stored or neither is.
    async fn save_ingested(&self, document: &Document, extracted: &ExtractedText) -> AppResult<()>;

    async fn list_documents(&self) -> AppResult<Vec<Document>>;

    async fn list_extracted(&self) -> AppResult<Vec<ExtractedText>>;

    async fn get_document(&self, id: &DocumentId) -> AppResult<Option<Document>>;

    async fn get_extracted(&self, id: &DocumentId) -> AppResult<Option<ExtractedText>>;

    /// Documents joined with their extracted text.
    async fn list_records(&self) -> AppResult<Vec<DocumentRecord>> {
        let documents = self.list_documents().await?;
        let extracted = self.list_extracted().await?;
        Ok(DocumentRecord::join(documents, extracted))
    }
}
