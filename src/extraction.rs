//! Plain-text extraction for uploaded documents.
//!
//! The upload's file name decides the parser: `.pdf` goes through `pdf-extract` page by page,
//! `.docx` through `docx-rs`, and `.txt` is decoded as UTF-8 with invalid sequences dropped.
//! Extraction is synchronous and CPU-bound; async callers should run it on the blocking pool.

use serde_json::Value;
use std::fmt;
use std::panic;
use thiserror::Error;

/// Errors raised while turning an upload into plain text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    /// The file extension is not one of `pdf`, `docx` or `txt`.
    #[error("Unsupported file type: {0:?}")]
    UnsupportedFileType(String),
    /// Extraction succeeded but produced only whitespace.
    #[error("File contains no readable text")]
    NoReadableText,
    /// The PDF parser rejected the document.
    #[error("PDF extraction error: {0}")]
    Pdf(String),
    /// The DOCX parser rejected the document.
    #[error("Word document parsing error: {0}")]
    Docx(String),
}

/// Document formats accepted by the upload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Portable Document Format.
    Pdf,
    /// Office Open XML word processing document.
    Docx,
    /// UTF-8 plain text.
    Txt,
}

impl DocumentKind {
    /// Resolve the document kind from the extension of `filename`, ignoring case.
    pub fn from_filename(filename: &str) -> Result<Self, ExtractionError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, extension)| extension.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            _ => Err(ExtractionError::UnsupportedFileType(extension)),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Txt => "txt",
        })
    }
}

/// Extract plain text from `bytes`, failing when nothing readable remains.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => extract_docx(bytes)?,
        DocumentKind::Txt => decode_utf8_ignoring_errors(bytes),
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::NoReadableText);
    }

    tracing::debug!(%kind, bytes = bytes.len(), chars = text.len(), "Extracted document text");
    Ok(text)
}

/// Concatenate the text of every page; image-only pages contribute nothing.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractionError::Pdf("parser aborted on malformed document".to_string()))?
        .map_err(|error| ExtractionError::Pdf(error.to_string()))?;

    tracing::trace!(pages = pages.len(), "Parsed PDF pages");
    Ok(pages.concat())
}

/// Join the text of top-level body paragraphs with newlines, in document order.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx =
        docx_rs::read_docx(bytes).map_err(|error| ExtractionError::Docx(error.to_string()))?;
    let json: Value = serde_json::from_str(&docx.json())
        .map_err(|error| ExtractionError::Docx(format!("JSON parsing error: {error}")))?;

    let paragraphs = json
        .pointer("/document/children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .filter(|child| child.get("type").and_then(Value::as_str) == Some("paragraph"))
                .map(|paragraph| {
                    let mut text = String::new();
                    collect_run_text(paragraph, &mut text);
                    text
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    Ok(paragraphs.join("\n"))
}

/// Walk a serialized docx node, appending text runs (including those nested in hyperlinks).
fn collect_run_text(node: &Value, out: &mut String) {
    match node.get("type").and_then(Value::as_str) {
        Some("text") => {
            if let Some(text) = node.pointer("/data/text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
        Some("tab") => out.push('\t'),
        _ => {
            if let Some(children) = node.pointer("/data/children").and_then(Value::as_array) {
                for child in children {
                    collect_run_text(child, out);
                }
            }
        }
    }
}

/// Decode UTF-8, silently dropping byte sequences that are not valid.
fn decode_utf8_ignoring_errors(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}
