//! Document listing and inspection commands

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use docsift_core::{DocumentId, DocumentRecord};

use crate::app::App;
use crate::output::{self, OutputFormat};

#[derive(Tabled)]
struct DocumentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "File")]
    filename: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Statements")]
    statements: usize,
    #[tabled(rename = "Uploaded")]
    uploaded: String,
}

impl From<&DocumentRecord> for DocumentRow {
    fn from(record: &DocumentRecord) -> Self {
        let doc = &record.document;
        Self {
            id: doc.id.to_string(),
            filename: output::truncate(&doc.filename, 40),
            kind: doc.kind.to_string(),
            size: output::format_size(doc.size_bytes),
            statements: record.statement_count(),
            uploaded: doc.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

pub async fn list(app: &App, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let mut records = app.repository.list_records().await?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    output::emit(&records, format, |records| {
        if records.is_empty() {
            output::dimmed("No documents ingested yet.");
            return;
        }
        let rows: Vec<DocumentRow> = records.iter().map(DocumentRow::from).collect();
        println!("{}", Table::new(rows).with(Style::rounded()));
    })
}

pub async fn show(app: &App, id: &str, include_text: bool, format: OutputFormat) -> Result<()> {
    let id: DocumentId = id
        .parse()
        .with_context(|| format!("Invalid document ID: {}", id))?;

    let document = app
        .repository
        .get_document(&id)
        .await?
        .ok_or_else(|| anyhow!("Document {} not found", id))?;
    let mut extracted = app.repository.get_extracted(&id).await?;
    if !include_text {
        if let Some(extracted) = extracted.as_mut() {
            extracted.raw_text.clear();
        }
    }

    let record = DocumentRecord {
        document,
        extracted,
    };

    output::emit(&record, format, |record| print_record(record, include_text))
}

fn print_record(record: &DocumentRecord, include_text: bool) {
    let doc = &record.document;
    output::key_value("ID", &doc.id.to_string());
    output::key_value("File", &doc.filename);
    output::key_value("Content type", &doc.content_type);
    output::key_value("Kind", &doc.kind.to_string());
    output::key_value("Size", &output::format_size(doc.size_bytes));
    output::key_value("Uploaded", &doc.uploaded_at.to_rfc3339());
    output::key_value("Stored at", doc.locator().unwrap_or("-"));

    let Some(extracted) = &record.extracted else {
        output::warning("No extracted text stored for this document");
        return;
    };

    output::section("Summary");
    if extracted.summary.is_empty() {
        output::dimmed("(too short to summarize)");
    } else {
        println!("{}", extracted.summary);
    }

    output::section(&format!("Statements ({})", extracted.statements.len()));
    for (i, statement) in extracted.statements.iter().enumerate() {
        output::list_item(i + 1, statement);
    }

    if include_text {
        output::section("Text");
        println!("{}", extracted.raw_text.dimmed());
    }
}
