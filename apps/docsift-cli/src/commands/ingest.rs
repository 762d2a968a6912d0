//! Ingest command

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

use docsift_core::DocumentKind;
use docsift_ingestion::{IngestionError, IngestionOutcome, Upload};

use crate::app::App;
use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum IngestStatus {
    Ingested,
    Unsupported,
    Failed,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    status: IngestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    document_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<DocumentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    statements: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    processing_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl FileReport {
    fn ingested(file: String, outcome: &IngestionOutcome) -> Self {
        Self {
            file,
            status: IngestStatus::Ingested,
            document_id: Some(outcome.document.id.to_string()),
            kind: Some(outcome.document.kind),
            statements: Some(outcome.extracted.statements.len()),
            summary: Some(outcome.extracted.summary.clone()),
            processing_time_ms: Some(outcome.processing_time_ms),
            error: None,
        }
    }

    fn rejected(file: String, err: &IngestionError) -> Self {
        let status = match err {
            IngestionError::UnsupportedKind(_) => IngestStatus::Unsupported,
            _ => IngestStatus::Failed,
        };
        Self {
            file,
            status,
            document_id: None,
            kind: None,
            statements: None,
            summary: None,
            processing_time_ms: None,
            error: Some(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct IngestReport {
    ingested: usize,
    unsupported: usize,
    failed: usize,
    files: Vec<FileReport>,
}

impl IngestReport {
    fn new(files: Vec<FileReport>) -> Self {
        let count = |status| files.iter().filter(|f| f.status == status).count();
        Self {
            ingested: count(IngestStatus::Ingested),
            unsupported: count(IngestStatus::Unsupported),
            failed: count(IngestStatus::Failed),
            files,
        }
    }
}

pub async fn run(app: &App, paths: &[PathBuf], recursive: bool, format: OutputFormat) -> Result<()> {
    let files = collect_files(paths, recursive)?;
    if files.is_empty() {
        bail!("No files found to ingest");
    }

    let pipeline = app.pipeline()?;

    let mut reports = Vec::with_capacity(files.len());
    let mut uploads = Vec::new();
    let mut names = Vec::new();
    for path in &files {
        let name = path.display().to_string();
        match Upload::from_file(path).await {
            Ok(upload) => {
                uploads.push(upload);
                names.push(name);
            }
            Err(err) => reports.push(FileReport::rejected(name, &err)),
        }
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")?,
    );
    spinner.set_message(format!("Ingesting {} file(s)", uploads.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let results = pipeline.ingest_batch(uploads).await;
    spinner.finish_and_clear();

    let mut storage_error = None;
    for (name, result) in names.into_iter().zip(results) {
        match result {
            Ok(outcome) => reports.push(FileReport::ingested(name, &outcome)),
            Err(err) => {
                if !err.is_document_local() && storage_error.is_none() {
                    storage_error = Some(err.to_string());
                }
                reports.push(FileReport::rejected(name, &err));
            }
        }
    }

    let report = IngestReport::new(reports);
    output::emit(&report, format, print_report)?;

    if let Some(err) = storage_error {
        bail!("Storage failure during ingestion: {}", err);
    }
    if report.failed > 0 {
        bail!("{} of {} file(s) failed", report.failed, report.files.len());
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    for file in &report.files {
        match file.status {
            IngestStatus::Ingested => {
                output::success(&format!(
                    "{} {} ({}, {} statement(s), {})",
                    file.file,
                    file.document_id.as_deref().unwrap_or_default(),
                    file.kind.map(|k| k.to_string()).unwrap_or_default(),
                    file.statements.unwrap_or(0),
                    output::format_duration(file.processing_time_ms.unwrap_or(0)),
                ));
            }
            IngestStatus::Unsupported => {
                output::warning(&format!("{} skipped: unsupported type", file.file));
            }
            IngestStatus::Failed => {
                output::error(&format!(
                    "{}: {}",
                    file.file,
                    file.error.as_deref().unwrap_or_default()
                ));
            }
        }
    }

    output::dimmed(&format!(
        "{} ingested, {} unsupported, {} failed",
        report.ingested, report.unsupported, report.failed
    ));
}

/// Expand directories into the files beneath them, sorted by name.
/// Without `recursive` only a directory's direct children are taken.
fn collect_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_dir(path, recursive)?);
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }

    Ok(files)
}

fn walk_dir(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
