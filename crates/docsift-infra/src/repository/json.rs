//! Repository persisted to a single JSON file
//!
//! The whole corpus is loaded on open and rewritten after every save.
//! Writes go to a sibling temp file which is then renamed over the target.

use async_trait::async_trait;
use docsift_core::{AppResult, Document, DocumentId, DocumentRepository, ExtractedText};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::CorpusState;
use crate::Result;

pub struct JsonFileRepository {
    path: PathBuf,
    state: RwLock<CorpusState>,
}

impl JsonFileRepository {
    /// Open `path`, loading its contents if it exists. Parent directories are
    /// created on first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => CorpusState::default(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => CorpusState::default(),
            Err(err) => return Err(err.into()),
        };

        info!(
            path = %path.display(),
            documents = state.documents.len(),
            "JSON repository opened"
        );

        Ok(Self {
            path,
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &CorpusState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "Corpus written");
        Ok(())
    }
}

#[async_trait]
impl DocumentRepository for JsonFileRepository {
    async fn save_document(&self, document: &Document) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.insert_document(document)?;
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn save_extracted(&self, extracted: &ExtractedText) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.insert_extracted(extracted)?;
        self.persist(&next).await?;
        *state = next;
        Ok(())
    }

    async fn save_ingested(&self, document: &Document, extracted: &ExtractedText) -> AppResult<()> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.insert_ingested(document, extracted)?;
        self.persist(&next).await?;
        *state = next;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InfraError;
    use docsift_core::{AppError, DocumentKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn stored_document() -> Document {
        let mut doc = Document::new("q1.xlsx", "application/vnd.ms-excel", DocumentKind::Spreadsheet, 42);
        doc.assign_locator("local:///data/uploads/abc-q1.xlsx").unwrap();
        doc
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_corpus() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::open(dir.path().join("corpus.json")).await.unwrap();

        assert!(repo.list_documents().await.unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_round_trip_through_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("corpus.json");

        let doc = stored_document();
        let extracted = ExtractedText::new(
            doc.id,
            "Revenue rule applies.",
            "Revenue",
            vec!["Revenue rule applies.".into()],
        );
        {
            let repo = JsonFileRepository::open(&path).await.unwrap();
            repo.save_document(&doc).await.unwrap();
            repo.save_extracted(&extracted).await.unwrap();
        }

        let reopened = JsonFileRepository::open(&path).await.unwrap();
        assert_eq!(reopened.list_documents().await.unwrap(), vec![doc.clone()]);
        assert_eq!(reopened.get_extracted(&doc.id).await.unwrap(), Some(extracted));
        assert_eq!(
            reopened.get_document(&doc.id).await.unwrap().unwrap().locator(),
            Some("local:///data/uploads/abc-q1.xlsx")
        );
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejected_save_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        let repo = JsonFileRepository::open(&path).await.unwrap();
        repo.save_document(&stored_document()).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = repo
            .save_extracted(&ExtractedText::new(DocumentId::new(), "x", "", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(repo.list_extracted().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingested_pair_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        let doc = stored_document();
        let extracted = ExtractedText::new(doc.id, "Audit rule.", "", vec!["Audit rule.".into()]);

        let repo = JsonFileRepository::open(&path).await.unwrap();
        repo.save_ingested(&doc, &extracted).await.unwrap();
        let before = std::fs::read(&path).unwrap();

        let err = repo.save_ingested(&doc, &extracted).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);

        let reopened = JsonFileRepository::open(&path).await.unwrap();
        assert_eq!(reopened.list_documents().await.unwrap(), vec![doc.clone()]);
        assert_eq!(reopened.get_extracted(&doc.id).await.unwrap(), Some(extracted));
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(&path, b"{ not json").unwrap();

        assert!(matches!(
            JsonFileRepository::open(&path).await,
            Err(InfraError::Serialization(_))
        ));
    }
}
