//! File ingestion commands.
//!
//! `desk ingest` reads a text or PDF file and runs it through the
//! [`IngestPipeline`]; `desk ingest-pages` takes crawler output as a JSON
//! array of `{url, title, text}` objects.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

use desk_copilot_core::models::DocumentSource;
use desk_copilot_core::{CrawledPage, IngestPipeline, IngestReport, PagesReport};

use crate::backends::Backends;
use crate::extract::extract_pdf;

/// Outcome of ingesting one PDF.
#[derive(Debug, Clone, Serialize)]
pub struct PdfReport {
    pub pages: usize,
    #[serde(flatten)]
    pub ingest: IngestReport,
}

/// Extract a PDF and ingest its text with source `pdf`.
///
/// `elapsed_ms` covers extraction as well as ingestion.
pub async fn ingest_pdf(
    pipeline: &IngestPipeline,
    title: Option<&str>,
    bytes: &[u8],
) -> Result<PdfReport> {
    let started = Instant::now();
    let pdf = extract_pdf(bytes)?;
    let mut ingest = pipeline
        .ingest_with_source(DocumentSource::Pdf, title, &pdf.text)
        .await?;
    ingest.elapsed_ms = started.elapsed().as_millis() as u64;
    Ok(PdfReport {
        pages: pdf.pages,
        ingest,
    })
}

/// Outcome of [`ingest_file`]: a plain-text or a PDF report.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileReport {
    Text(IngestReport),
    Pdf(PdfReport),
}

impl FileReport {
    /// The pipeline counts, whichever kind of file it was.
    pub fn ingest(&self) -> &IngestReport {
        match self {
            FileReport::Text(report) => report,
            FileReport::Pdf(report) => &report.ingest,
        }
    }
}

/// Ingest a file; the title defaults to the file name.
pub async fn ingest_file(
    backends: &Backends,
    path: &Path,
    title: Option<&str>,
    pdf: bool,
) -> Result<FileReport> {
    let default_title = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let title = title.map(str::to_string).or(default_title);
    let pipeline = backends.pipeline();

    let is_pdf = pdf
        || path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

    if is_pdf {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = ingest_pdf(&pipeline, title.as_deref(), &bytes).await?;
        Ok(FileReport::Pdf(report))
    } else {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = pipeline.ingest(title.as_deref(), &text).await?;
        Ok(FileReport::Text(report))
    }
}

pub async fn run_ingest(
    backends: &Backends,
    path: &Path,
    title: Option<&str>,
    pdf: bool,
) -> Result<()> {
    let report = ingest_file(backends, path, title, pdf).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Parse a crawler export.
pub fn read_pages(path: &Path) -> Result<Vec<CrawledPage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let pages: Vec<CrawledPage> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid pages JSON in {}", path.display()))?;
    Ok(pages)
}

pub async fn run_ingest_pages(backends: &Backends, path: &Path) -> Result<PagesReport> {
    let pages = read_pages(path)?;
    let report = backends.pipeline().ingest_pages(&pages).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(report)
}
