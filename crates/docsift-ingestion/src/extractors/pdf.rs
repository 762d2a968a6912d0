use async_trait::async_trait;
use docsift_core::DocumentKind;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

use super::{run_blocking, ExtractionResult, TextExtractor};
use crate::{IngestionError, Result};

/// PDF extractor: page texts concatenated in document order
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse(bytes: &[u8]) -> Result<Vec<String>> {
        // pdf-extract panics on some malformed fonts
        match catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(bytes)
        })) {
            Ok(Ok(pages)) => Ok(pages),
            Ok(Err(e)) => Err(IngestionError::extraction(DocumentKind::Pdf, e.to_string())),
            Err(_) => {
                warn!("PDF parser panicked");
                Err(IngestionError::extraction(
                    DocumentKind::Pdf,
                    "parser panicked on malformed content",
                ))
            }
        }
    }
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let bytes = content.to_vec();
        let pages = run_blocking(DocumentKind::Pdf, move || Self::parse(&bytes)).await?;

        let empty_pages = pages.iter().filter(|p| p.trim().is_empty()).count();
        let page_count = pages.len();
        let text = pages.concat();

        debug!(
            page_count,
            empty_pages,
            chars = text.chars().count(),
            "Extracted PDF text"
        );

        let mut result = ExtractionResult::new(text, DocumentKind::Pdf)
            .with_metadata("page_count", serde_json::json!(page_count));
        if empty_pages > 0 {
            result = result.with_warning(format!("{} page(s) yielded no text", empty_pages));
        }
        Ok(result)
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn name(&self) -> &'static str {
        "pdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// One page per entry; an empty entry gives a page with no text
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let mut operations = Vec::new();
            if !text.is_empty() {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ];
            }
            let content = Content { operations }.encode().unwrap();
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_pages_concatenated_in_order() {
        let bytes = pdf_with_pages(&["Retention", "Access"]);

        let result = PdfExtractor::new().extract(&bytes).await.unwrap();

        assert_eq!(result.kind, DocumentKind::Pdf);
        assert_eq!(result.metadata["page_count"], serde_json::json!(2));
        let first = result.text.find("Retention").unwrap();
        let second = result.text.find("Access").unwrap();
        assert!(first < second);
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_blank_page_warns() {
        let bytes = pdf_with_pages(&["Travel", ""]);

        let result = PdfExtractor::new().extract(&bytes).await.unwrap();

        assert_eq!(result.metadata["page_count"], serde_json::json!(2));
        assert!(result.text.contains("Travel"));
        assert_eq!(result.warnings, vec!["1 page(s) yielded no text".to_string()]);
    }

    #[tokio::test]
    async fn test_garbage_is_extraction_error() {
        let err = PdfExtractor::new()
            .extract(b"definitely not a pdf")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            IngestionError::ExtractionFailed {
                kind: DocumentKind::Pdf,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_bytes_is_extraction_error() {
        assert!(PdfExtractor::new().extract(b"").await.is_err());
    }
}
