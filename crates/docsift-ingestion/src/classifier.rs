//! Filename based document classification.

use docsift_core::DocumentKind;
use std::path::Path;

/// Map a filename to its document kind using only the extension.
///
/// Matching is case-insensitive. Anything outside the table, including a
/// missing extension, is `DocumentKind::Unknown`.
pub fn classify(filename: &str) -> DocumentKind {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => DocumentKind::Pdf,
        Some("xls") | Some("xlsx") => DocumentKind::Spreadsheet,
        Some("csv") => DocumentKind::Csv,
        Some("docx") => DocumentKind::Word,
        Some("jpg") | Some("jpeg") | Some("png") => DocumentKind::Image,
        _ => DocumentKind::Unknown,
    }
}
