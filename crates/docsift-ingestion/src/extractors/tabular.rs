//! Spreadsheet and CSV extraction.
//!
//! Both kinds are read into a [`Table`] whose first row is the header and
//! written back out as comma separated text.

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Reader};
use docsift_core::DocumentKind;
use std::io::Cursor;
use tracing::debug;

use super::{run_blocking, ExtractionResult, TextExtractor};
use crate::{IngestionError, Result};

/// In-memory table; every row has the same width as the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from raw rows. The first row with content is the
    /// header. Blank lines are dropped but rows of empty cells are kept;
    /// short rows are padded.
    pub fn from_rows(rows: impl IntoIterator<Item = Vec<String>>) -> Option<Self> {
        let mut rows = rows.into_iter().filter(|row| !is_blank_line(row));

        let mut headers = rows
            .by_ref()
            .find(|row| row.iter().any(|cell| !cell.trim().is_empty()))?;
        let mut rows: Vec<Vec<String>> = rows.collect();

        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(headers.len()))
            .max()
            .unwrap_or(0);

        headers.resize(width, String::new());
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Some(Self { headers, rows })
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Serialise as CSV with the header row, one `\n` terminated line per row
    pub fn to_csv(&self) -> std::result::Result<String, String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&self.headers).map_err(|e| e.to_string())?;
        for row in &self.rows {
            writer.write_record(row).map_err(|e| e.to_string())?;
        }

        let bytes = writer.into_inner().map_err(|e| e.to_string())?;
        String::from_utf8(bytes).map_err(|e| e.to_string())
    }
}

/// A row with no fields at all, or the single empty field of a blank line
fn is_blank_line(row: &[String]) -> bool {
    match row {
        [] => true,
        [only] => only.is_empty(),
        _ => false,
    }
}

fn table_result(kind: DocumentKind, table: Table) -> Result<ExtractionResult> {
    let text = table
        .to_csv()
        .map_err(|e| IngestionError::extraction(kind, e))?;

    debug!(
        kind = %kind,
        columns = table.column_count(),
        rows = table.rows.len(),
        "Extracted tabular text"
    );

    Ok(ExtractionResult::new(text, kind)
        .with_metadata("columns", serde_json::json!(table.headers))
        .with_metadata("row_count", serde_json::json!(table.rows.len())))
}

/// Excel extractor (`.xls` and `.xlsx`), first worksheet only
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetExtractor;

impl SpreadsheetExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First worksheet as a table, or `None` when it holds no cells
    fn parse(bytes: Vec<u8>) -> Result<Option<Table>> {
        let kind = DocumentKind::Spreadsheet;
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
            .map_err(|e| IngestionError::extraction(kind, e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestionError::extraction(kind, "workbook has no worksheets"))?
            .map_err(|e| IngestionError::extraction(kind, e.to_string()))?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());

        Ok(Table::from_rows(rows))
    }
}

#[async_trait]
impl TextExtractor for SpreadsheetExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let bytes = content.to_vec();
        let kind = DocumentKind::Spreadsheet;
        match run_blocking(kind, move || Self::parse(bytes)).await? {
            Some(table) => table_result(kind, table),
            None => {
                debug!("First worksheet is empty");
                Ok(ExtractionResult::new(String::new(), kind)
                    .with_metadata("row_count", serde_json::json!(0))
                    .with_warning("first worksheet is empty"))
            }
        }
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Spreadsheet
    }

    fn name(&self) -> &'static str {
        "spreadsheet"
    }
}

/// CSV extractor
#[derive(Debug, Clone, Default)]
pub struct CsvExtractor;

impl CsvExtractor {
    pub fn new() -> Self {
        Self
    }

    fn parse(bytes: &[u8]) -> Result<Table> {
        let kind = DocumentKind::Csv;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let rows = reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(str::to_string).collect::<Vec<_>>())
                    .map_err(|e| IngestionError::extraction(kind, e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Table::from_rows(rows).ok_or_else(|| IngestionError::extraction(kind, "no columns to parse"))
    }
}

#[async_trait]
impl TextExtractor for CsvExtractor {
    async fn extract(&self, content: &[u8]) -> Result<ExtractionResult> {
        let bytes = content.to_vec();
        let table = run_blocking(DocumentKind::Csv, move || Self::parse(&bytes)).await?;
        table_result(DocumentKind::Csv, table)
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Csv
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}
