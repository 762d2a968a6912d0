use docsift_core::{CorpusSummary, DocumentRecord};

/// Count documents by declared content type and by kind, and total the
/// extracted statements.
pub fn summarize_corpus(records: &[DocumentRecord]) -> CorpusSummary {
    let mut summary = CorpusSummary {
        total_files: records.len(),
        ..CorpusSummary::default()
    };

    for record in records {
        *summary
            .file_types
            .entry(record.document.content_type.clone())
            .or_insert(0) += 1;
        *summary.kinds.entry(record.document.kind).or_insert(0) += 1;
        summary.total_policies += record.statement_count();
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsift_core::{Document, DocumentKind, ExtractedText};
    use pretty_assertions::assert_eq;

    fn record(name: &str, content_type: &str, kind: DocumentKind, statements: usize) -> DocumentRecord {
        let document = Document::new(name, content_type, kind, 1);
        let extracted = ExtractedText::new(
            document.id,
            "text",
            "",
            (0..statements).map(|i| format!("rule {}", i)).collect(),
        );
        DocumentRecord {
            document,
            extracted: Some(extracted),
        }
    }

    #[test]
    fn test_empty_corpus() {
        assert_eq!(summarize_corpus(&[]), CorpusSummary::default());
    }

    #[test]
    fn test_counts() {
        let mut unextracted = record("old.pdf", "application/pdf", DocumentKind::Pdf, 0);
        unextracted.extracted = None;

        let records = vec![
            record("a.pdf", "application/pdf", DocumentKind::Pdf, 2),
            record("b.csv", "text/csv", DocumentKind::Csv, 1),
            unextracted,
        ];

        let summary = summarize_corpus(&records);

        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.file_types["application/pdf"], 2);
        assert_eq!(summary.file_types["text/csv"], 1);
        assert_eq!(summary.kinds[&DocumentKind::Pdf], 2);
        assert_eq!(summary.total_policies, 3);
    }
}
