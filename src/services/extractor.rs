use std::io::{Cursor, Read};
use std::time::Instant;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::models::{DocumentKind, UploadedFile};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("invalid PDF: {0}")]
    Pdf(String),

    #[error("invalid DOCX: {0}")]
    Docx(String),

    #[error("no text could be extracted from {file_name}")]
    Empty { file_name: String },

    #[error("extraction task failed: {0}")]
    Task(String),
}

#[derive(Debug)]
pub struct Extraction {
    pub text: String,
    pub kind: DocumentKind,
    /// Pages for PDFs, body paragraphs for DOCX.
    pub units: usize,
    pub processing_time_ms: u64,
}

pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract(&self, file: &UploadedFile) -> Result<Extraction, ExtractionError> {
        let start = Instant::now();

        let kind = file.document_kind().ok_or_else(|| {
            ExtractionError::UnsupportedMediaType(
                file.declared_media_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("unknown (file name {:?})", file.name)),
            )
        })?;

        tracing::info!(
            "Starting {} text extraction for file: {} ({} bytes)",
            kind,
            file.name,
            file.size
        );

        let content = file.content.clone();
        let (text, units) = tokio::task::spawn_blocking(move || match kind {
            DocumentKind::Pdf => extract_pdf_text(&content),
            DocumentKind::Docx => extract_docx_text(&content),
        })
        .await
        .map_err(|e| ExtractionError::Task(e.to_string()))??;

        if text.trim().is_empty() {
            tracing::warn!(file_name = %file.name, units, "Document yielded no text");
            return Err(ExtractionError::Empty {
                file_name: file.name.clone(),
            });
        }

        let processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "{} extraction completed in {}ms, {} units, {} characters",
            kind,
            processing_time_ms,
            units,
            text.chars().count()
        );

        Ok(Extraction {
            text,
            kind,
            units,
            processing_time_ms,
        })
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// lopdf renders fonts it cannot decode (Identity-H and other CMaps) as this
/// marker instead of failing.
const LOPDF_UNDECODED_MARKER: &str = "Unimplemented?";

/// Concatenates the text of every page in page order, without separators.
/// Returns the text and the page count.
///
/// pdf-extract is the primary path since it decodes composite (Type0) fonts
/// through their ToUnicode maps. It panics on some font programs, so a panic
/// or error falls back to per-page extraction with lopdf.
pub fn extract_pdf_text(content: &[u8]) -> Result<(String, usize), ExtractionError> {
    let document = lopdf::Document::load_mem(content)
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    let page_count = document.get_pages().len();

    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(content)) {
        Ok(Ok(pages)) => {
            tracing::debug!("PDF text extraction successful, {} pages", pages.len());
            return Ok((pages.concat(), page_count));
        }
        Ok(Err(e)) => tracing::warn!(
            error = %e,
            "pdf-extract failed, falling back to per-page lopdf extraction"
        ),
        Err(_) => tracing::warn!("pdf-extract panicked, falling back to per-page lopdf extraction"),
    }

    Ok((lopdf_page_text(&document), page_count))
}

fn lopdf_page_text(document: &lopdf::Document) -> String {
    let mut text = String::new();

    // BTreeMap keys: page numbers in ascending order.
    for page_number in document.get_pages().into_keys() {
        match document.extract_text(&[page_number]) {
            Ok(page_text) if page_text.contains(LOPDF_UNDECODED_MARKER) => {
                tracing::warn!(page = page_number, "Page font encoding not supported by lopdf, skipping");
            }
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => tracing::warn!(page = page_number, error = %e, "Page text extraction failed, skipping"),
        }
    }

    text
}

/// Joins the body paragraphs of a Word document with `\n`.
/// Returns the text and the paragraph count.
pub fn extract_docx_text(content: &[u8]) -> Result<(String, usize), ExtractionError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractionError::Docx(format!("missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("failed to read word/document.xml: {}", e)))?;

    let paragraphs = body_paragraphs(&xml)?;
    tracing::debug!("DOCX text extraction successful, {} paragraphs", paragraphs.len());

    let count = paragraphs.len();
    Ok((paragraphs.join("\n"), count))
}

/// Collects the text of top-level body paragraphs. Paragraphs inside tables
/// and nested paragraphs (text boxes) are skipped, as are tab-stop
/// definitions in paragraph properties.
fn body_paragraphs(xml: &str) -> Result<Vec<String>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut paragraph_depth = 0usize;
    let mut table_depth = 0usize;
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        let collecting = paragraph_depth == 1 && table_depth == 0;

        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => {
                    paragraph_depth += 1;
                    if paragraph_depth == 1 {
                        current.clear();
                    }
                }
                b"w:r" => run_depth += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" if paragraph_depth == 0 && table_depth == 0 => paragraphs.push(String::new()),
                b"w:tab" if collecting && run_depth > 0 => current.push('\t'),
                b"w:br" | b"w:cr" if collecting && run_depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text && collecting => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractionError::Docx(format!("bad text content: {}", e)))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:p" => {
                    if paragraph_depth == 1 && table_depth == 0 {
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    paragraph_depth = paragraph_depth.saturating_sub(1);
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractionError::Docx(format!(
                    "malformed document.xml at byte {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}
