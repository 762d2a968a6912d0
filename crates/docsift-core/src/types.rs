use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// Newtype wrappers for type safety

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// Document kinds

/// Classified document category, decided from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    Spreadsheet,
    Csv,
    Word,
    Image,
    Unknown,
}

impl DocumentKind {
    pub const SUPPORTED: [DocumentKind; 5] = [
        DocumentKind::Pdf,
        DocumentKind::Spreadsheet,
        DocumentKind::Csv,
        DocumentKind::Word,
        DocumentKind::Image,
    ];

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentKind::Unknown)
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Spreadsheet => write!(f, "spreadsheet"),
            DocumentKind::Csv => write!(f, "csv"),
            DocumentKind::Word => write!(f, "word"),
            DocumentKind::Image => write!(f, "image"),
            DocumentKind::Unknown => write!(f, "unknown"),
        }
    }
}

// Document types

/// An uploaded document. Only the locator is assigned after creation, exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub content_type: String,
    pub kind: DocumentKind,
    pub size_bytes: usize,
    pub uploaded_at: DateTime<Utc>,
    locator: Option<String>,
}

impl Document {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        kind: DocumentKind,
        size_bytes: usize,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            filename: filename.into(),
            content_type: content_type.into(),
            kind,
            size_bytes,
            uploaded_at: Utc::now(),
            locator: None,
        }
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Records where the document bytes live. A second call is rejected.
    pub fn assign_locator(&mut self, locator: impl Into<String>) -> crate::AppResult<()> {
        if let Some(existing) = &self.locator {
            return Err(crate::AppError::conflict(format!(
                "document {} already stored at {}",
                self.id, existing
            )));
        }
        self.locator = Some(locator.into());
        Ok(())
    }
}

/// Text extracted from a single document, plus what the pipeline derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub document_id: DocumentId,
    pub raw_text: String,
    pub summary: String,
    pub statements: Vec<String>,
}

impl ExtractedText {
    pub fn new(
        document_id: DocumentId,
        raw_text: impl Into<String>,
        summary: impl Into<String>,
        statements: Vec<String>,
    ) -> Self {
        Self {
            document_id,
            raw_text: raw_text.into(),
            summary: summary.into(),
            statements,
        }
    }

    /// Length of the raw text in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.raw_text.chars().count()
    }

    pub fn has_text(&self) -> bool {
        !self.raw_text.is_empty()
    }
}

/// A document joined with its extracted text, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: Document,
    pub extracted: Option<ExtractedText>,
}

impl DocumentRecord {
    /// Pair each document with its extracted text, preserving document order.
    pub fn join(documents: Vec<Document>, extracted: Vec<ExtractedText>) -> Vec<Self> {
        let mut by_document: BTreeMap<DocumentId, ExtractedText> = extracted
            .into_iter()
            .map(|e| (e.document_id, e))
            .collect();

        documents
            .into_iter()
            .map(|document| {
                let extracted = by_document.remove(&document.id);
                Self { document, extracted }
            })
            .collect()
    }

    pub fn statement_count(&self) -> usize {
        self.extracted.as_ref().map(|e| e.statements.len()).unwrap_or(0)
    }
}

// Analytics reports

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    pub anomalies: Vec<DocumentId>,
}

impl AnomalyReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.anomalies.contains(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub clusters: Vec<Vec<String>>,
}

impl ClusterReport {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn statement_count(&self) -> usize {
        self.clusters.iter().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub total_files: usize,
    pub file_types: BTreeMap<String, usize>,
    pub kinds: BTreeMap<DocumentKind, usize>,
    pub total_policies: usize,
}
