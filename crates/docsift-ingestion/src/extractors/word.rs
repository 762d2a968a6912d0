use async_trait::async_trait;
use docsift_core::DocumentKind;
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, Run, RunChild};
use tracing::debug;

use super::{run_blocking, ExtractionResult, TextExtractor};
use crate::{IngestionError, Result};

/// Word (`.docx`) extractor: body paragraphs joined by newlines.
/// Tables, headers and footers are not extracted.
#[derive(Debug, Clone, Default)]
pub struct WordExtractor;

impl WordExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse(bytes: &[u8]) -> Result<Vec<String>> {
        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| IngestionError::extraction(DocumentKind::Word, e.to_string()))?;

        Ok(docx
            .document
            .children
            .iter()
            .filter_map(|child| match child {
                DocumentChild::Paragraph(paragraph) => Some(paragraph_text(paragraph)),
                _ => None,
            })
            .collect())
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    push_children(&paragraph.children, &mut out);
    out
}

fn push_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(run, out),
            ParagraphChild::Hyperlink(link) => push_children(&link.children, out),
            _ => {}
        }
    }
}

fn push_run(run: &Run, out: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(text) => out.push_str(&text.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

#[async_trait]
impl TextExtractor for WordExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let bytes = content.to_vec();
        let paragraphs = run_blocking(DocumentKind::Word, move || Self::parse(&bytes)).await?;

        debug!(paragraphs = paragraphs.len(), "Extracted Word text");

        Ok(ExtractionResult::new(paragraphs.join("\n"), DocumentKind::Word)
            .with_metadata("paragraph_count", serde_json::json!(paragraphs.len())))
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Word
    }

    fn name(&self) -> &'static str {
        "word"
    }
}
