//! Uploaded resume files to plain text. PDF, DOCX and plain-text files are
//! accepted; parsing runs on the blocking pool so a slow or crashing parser
//! never stalls the runtime.

use std::io::{Cursor, Read};

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const PDF_MIME: &str = "application/pdf";
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const TEXT_MIME: &str = "text/plain";
const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Only PDF, DOCX, and TXT files are allowed")]
    Unsupported,

    #[error("Resume file exceeds the {} MB limit", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Could not read DOCX: {0}")]
    Docx(String),
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::Unsupported => "UNSUPPORTED_FILE_TYPE",
            DocumentError::TooLarge => "FILE_TOO_LARGE",
            DocumentError::Pdf(_) | DocumentError::Docx(_) => "UNREADABLE_FILE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    /// Trusts a specific content type; falls back to the file extension only
    /// when the client sent none or a generic one.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let mime = content_type
            .map(|c| c.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty());

        match mime.as_deref() {
            Some(PDF_MIME) => Some(DocumentKind::Pdf),
            Some(DOCX_MIME) => Some(DocumentKind::Docx),
            Some(TEXT_MIME) => Some(DocumentKind::Text),
            None | Some("application/octet-stream") => {
                let ext = file_name?.rsplit_once('.')?.1.to_ascii_lowercase();
                match ext.as_str() {
                    "pdf" => Some(DocumentKind::Pdf),
                    "docx" => Some(DocumentKind::Docx),
                    "txt" => Some(DocumentKind::Text),
                    _ => None,
                }
            }
            Some(_) => None,
        }
    }
}

/// Extracts the text of an uploaded document.
pub async fn read_document(kind: DocumentKind, bytes: Bytes) -> Result<String, DocumentError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(DocumentError::TooLarge);
    }

    let text = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
        .await
        .map_err(|e| match kind {
            DocumentKind::Docx => DocumentError::Docx(format!("parser failed: {e}")),
            _ => DocumentError::Pdf(format!("parser failed: {e}")),
        })??;

    debug!(kind = ?kind, chars = text.chars().count(), "Extracted document text");
    Ok(text)
}

fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    match kind {
        DocumentKind::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| DocumentError::Pdf(format!("{e:?}")))
        }
        DocumentKind::Docx => docx_text(bytes),
        DocumentKind::Text => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn docx_text(bytes: &[u8]) -> Result<String, DocumentError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| DocumentError::Docx(e.to_string()))?;
    let mut body = archive
        .by_name(DOCX_BODY)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;

    let mut xml = String::new();
    body.read_to_string(&mut xml)
        .map_err(|e| DocumentError::Docx(e.to_string()))?;
    Ok(wordml_text(&xml))
}

/// Text runs (`w:t`) in document order. Paragraph ends and breaks become
/// newlines, tabs become tabs, everything else is dropped.
fn wordml_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let closing = tag.starts_with('/');
        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match name {
            "w:t" => in_text = !closing && !self_closing,
            "w:p" if closing => out.push('\n'),
            "w:br" | "w:cr" => out.push('\n'),
            "w:tab" => out.push('\t'),
            _ => {}
        }
    }

    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let Some(semi) = after.find(';') else {
            out.push_str(after);
            return out;
        };
        let entity = &after[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&after[..=semi]),
        }
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    out
}
