//! CSV and PDF parsing into text segments

use sha2::{Digest, Sha256};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::config::{IngestionConfig, PageFailurePolicy};
use crate::error::{Error, Result};
use crate::types::FileType;

/// Glyph names some PDF fonts leak into extracted text
const GLYPH_NAMES: &[(&str, char)] = &[
    ("uni2010", '-'),
    ("uni2011", '-'),
    ("uni2013", '-'),
    ("uni2014", '-'),
    ("uni2018", '\''),
    ("uni2019", '\''),
    ("uni201C", '"'),
    ("uni201D", '"'),
    ("uni2022", '*'),
    ("uni00A0", ' '),
    ("uni2212", '-'),
];

/// Clean up PDF text: glyph names, typographic punctuation, NULs, blank lines
fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.replace('\0', "");

    for (glyph_name, replacement) in GLYPH_NAMES {
        if result.contains(glyph_name) {
            result = result.replace(glyph_name, &replacement.to_string());
        }
    }

    let result = result
        .replace(['\u{2010}', '\u{2011}', '\u{2013}'], "-")
        .replace('\u{2014}', "--")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace('\u{2022}', "* ")
        .replace('\u{2026}', "...")
        .replace('\u{00A0}', " ")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB00}', "ff");

    result
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One unit of document text before chunking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Rendered text
    pub text: String,
    /// 1-based CSV data row (first row of the group) or PDF page
    pub position: u32,
}

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the raw bytes
    pub content_hash: String,
    /// Text segments in document order
    pub segments: Vec<Segment>,
    /// Total pages (PDF only)
    pub total_pages: Option<u32>,
    /// Pages whose extraction failed and were skipped
    pub skipped_pages: Vec<u32>,
}

/// CSV and PDF file parser
#[derive(Debug, Clone)]
pub struct FileParser {
    config: IngestionConfig,
}

impl FileParser {
    /// Create a new parser
    pub fn new(config: IngestionConfig) -> Self {
        Self { config }
    }

    /// Parse a file based on its extension. `filename` is used for format
    /// detection and error context only.
    pub fn parse(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_path(filename).ok_or_else(|| {
            Error::unsupported(filename, "supported formats are CSV (.csv) and PDF (.pdf)")
        })?;

        if data.is_empty() {
            return Err(Error::empty_document(filename));
        }

        let parsed = match file_type {
            FileType::Csv => self.parse_csv(filename, data)?,
            FileType::Pdf => self.parse_pdf(filename, data)?,
        };

        if parsed.segments.is_empty() {
            return Err(Error::empty_document(filename));
        }

        tracing::debug!(
            "Parsed {} into {} segments",
            filename,
            parsed.segments.len()
        );

        Ok(parsed)
    }

    /// Parse CSV file. Each group of `rows_per_segment` data rows becomes one
    /// segment rendered as `header: value` lines.
    fn parse_csv(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(data);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| Error::unsupported(filename, format!("invalid CSV header: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(Error::unsupported(filename, "CSV header row is required"));
        }

        let rows_per_segment = self.config.rows_per_segment.max(1);
        let mut segments = Vec::new();
        let mut group: Vec<String> = Vec::with_capacity(rows_per_segment);
        let mut group_start = 0u32;

        for (i, result) in reader.records().enumerate() {
            let row_number = i as u32 + 1;
            let record = result.map_err(|e| {
                Error::unsupported(filename, format!("invalid CSV at data row {}: {}", row_number, e))
            })?;

            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            if group.is_empty() {
                group_start = row_number;
            }
            group.push(render_row(&headers, &record));

            if group.len() == rows_per_segment {
                segments.push(Segment {
                    text: group.join("\n\n"),
                    position: group_start,
                });
                group.clear();
            }
        }

        if !group.is_empty() {
            segments.push(Segment {
                text: group.join("\n\n"),
                position: group_start,
            });
        }

        Ok(ParsedDocument {
            file_type: FileType::Csv,
            content_hash: hash_content(data),
            segments,
            total_pages: None,
            skipped_pages: Vec::new(),
        })
    }

    /// Parse PDF document page by page
    fn parse_pdf(&self, filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::unsupported(filename, format!("not a readable PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::empty_document(filename));
        }

        let pages: Vec<(u32, std::result::Result<String, String>)> =
            match self.extract_pages_with_timeout(data) {
                Some(texts) if texts.len() == page_numbers.len() => page_numbers
                    .iter()
                    .copied()
                    .zip(texts.into_iter().map(Ok))
                    .collect(),
                _ => page_numbers
                    .iter()
                    .map(|&n| (n, extract_page_with_lopdf(&doc, n)))
                    .collect(),
            };

        let (segments, skipped_pages) = self.collect_pages(filename, pages)?;

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content_hash: hash_content(data),
            segments,
            total_pages: Some(page_numbers.len() as u32),
            skipped_pages,
        })
    }

    /// Turn per-page extraction results into segments, applying the page
    /// failure policy. Returns the segments and the skipped page numbers.
    fn collect_pages(
        &self,
        filename: &str,
        pages: Vec<(u32, std::result::Result<String, String>)>,
    ) -> Result<(Vec<Segment>, Vec<u32>)> {
        let mut segments = Vec::new();
        let mut skipped_pages = Vec::new();

        for (page_number, text) in pages {
            match text {
                Ok(text) => {
                    let content = cleanup_pdf_text(&text);
                    if content.is_empty() {
                        tracing::debug!("{}: page {} has no extractable text", filename, page_number);
                        continue;
                    }
                    segments.push(Segment {
                        text: content,
                        position: page_number,
                    });
                }
                Err(message) => match self.config.pdf_page_failure {
                    PageFailurePolicy::Skip => {
                        tracing::warn!(
                            "{}: skipping page {} (text extraction failed: {})",
                            filename,
                            page_number,
                            message
                        );
                        skipped_pages.push(page_number);
                    }
                    PageFailurePolicy::Abort => {
                        return Err(Error::unsupported(
                            filename,
                            format!("text extraction failed on page {}: {}", page_number, message),
                        ));
                    }
                },
            }
        }

        Ok((segments, skipped_pages))
    }

    /// Extract all pages with pdf-extract on a worker thread, bounded by the
    /// configured timeout. `None` means the caller should fall back to
    /// per-page extraction.
    fn extract_pages_with_timeout(&self, data: &[u8]) -> Option<Vec<String>> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result);
        });

        let timeout = Duration::from_secs(self.config.pdf_extract_timeout_secs);
        match rx.recv_timeout(timeout) {
            Ok(Ok(pages)) => {
                let _ = handle.join();
                Some(pages)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed: {}, extracting pages individually", e);
                None
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // The worker cannot be killed; it is left to finish on its own
                tracing::warn!(
                    "PDF extraction exceeded {:?}, extracting pages individually",
                    timeout
                );
                None
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::warn!("PDF extraction thread crashed, extracting pages individually");
                None
            }
        }
    }
}

/// Extract one page with lopdf. A panic inside lopdf counts as a failed page.
fn extract_page_with_lopdf(
    doc: &lopdf::Document,
    page_number: u32,
) -> std::result::Result<String, String> {
    match panic::catch_unwind(AssertUnwindSafe(|| doc.extract_text(&[page_number]))) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err("text extractor panicked".to_string()),
    }
}

/// Render one CSV record as `header: value` lines
fn render_row(headers: &[String], record: &csv::StringRecord) -> String {
    record
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let key = headers
                .get(i)
                .filter(|h| !h.is_empty())
                .cloned()
                .unwrap_or_else(|| format!("column_{}", i + 1));
            format!("{}: {}", key, value.trim())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hash content for the document summary
fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
