//! Plain-text extraction from uploaded CV files.
//!
//! PDF goes through `pdf-extract`; DOCX is read natively from
//! `word/document.xml`; legacy binary DOC gets a best-effort scan for text
//! runs. All of it is CPU-bound and runs on the blocking pool.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
}

impl DocumentFormat {
    /// Declared content type first, then the file extension.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, AppError> {
        let mime = content_type
            .map(|m| m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase())
            .unwrap_or_default();
        match mime.as_str() {
            "application/pdf" => return Ok(DocumentFormat::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                return Ok(DocumentFormat::Docx)
            }
            "application/msword" => return Ok(DocumentFormat::Doc),
            _ => {}
        }

        let name = file_name.unwrap_or_default().to_ascii_lowercase();
        if name.ends_with(".pdf") {
            Ok(DocumentFormat::Pdf)
        } else if name.ends_with(".docx") {
            Ok(DocumentFormat::Docx)
        } else if name.ends_with(".doc") || mime.contains("word") {
            Ok(DocumentFormat::Doc)
        } else if mime.is_empty() {
            Err(AppError::UnsupportedFormat(
                name_or(file_name, "fichier sans type").to_string(),
            ))
        } else {
            Err(AppError::UnsupportedFormat(mime))
        }
    }
}

fn name_or<'a>(name: Option<&'a str>, fallback: &'a str) -> &'a str {
    name.filter(|n| !n.is_empty()).unwrap_or(fallback)
}

/// An uploaded file as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: bytes::Bytes,
}

impl UploadedFile {
    /// Size and format checks done before any extraction work.
    pub fn validate(&self, max_bytes: usize) -> Result<DocumentFormat, AppError> {
        if self.bytes.is_empty() {
            return Err(AppError::Validation("Le fichier est vide".to_string()));
        }
        if self.bytes.len() > max_bytes {
            return Err(AppError::OversizedFile {
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        DocumentFormat::detect(self.content_type.as_deref(), self.file_name.as_deref())
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, format: DocumentFormat, bytes: bytes::Bytes) -> Result<String, AppError>;
}

/// Pure-Rust extraction for every supported format.
#[derive(Debug, Clone, Default)]
pub struct NativeTextExtractor;

#[async_trait]
impl TextExtractor for NativeTextExtractor {
    async fn extract(&self, format: DocumentFormat, bytes: bytes::Bytes) -> Result<String, AppError> {
        let text = tokio::task::spawn_blocking(move || match format {
            DocumentFormat::Pdf => extract_pdf(&bytes),
            DocumentFormat::Docx => extract_docx(&bytes),
            DocumentFormat::Doc => extract_doc(&bytes),
        })
        .await
        .map_err(|e| {
            // pdf-extract panics on some malformed files
            if e.is_panic() {
                AppError::Extraction("Le fichier n'a pas pu être lu".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("extraction task failed: {e}"))
            }
        })??;

        debug!("Extracted {} characters from {:?}", text.len(), format);
        if text.trim().is_empty() {
            return Err(AppError::Extraction(
                "Aucun texte n'a pu être extrait du fichier".to_string(),
            ));
        }
        Ok(text)
    }
}

pub fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Lecture du PDF impossible: {e}")))
}

/// Paragraphs become lines; `w:tab` a tab and `w:br` a line break.
pub fn extract_docx(bytes: &[u8]) -> Result<String, AppError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AppError::Extraction(format!("Archive DOCX invalide: {e}")))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| AppError::Extraction(format!("Document DOCX incomplet: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Extraction(format!("Document DOCX illisible: {e}")))?;

    let doc = roxmltree::Document::parse(&xml)
        .map_err(|e| AppError::Extraction(format!("XML DOCX invalide: {e}")))?;

    let mut lines = Vec::new();
    for paragraph in doc.descendants().filter(|n| n.tag_name().name() == "p") {
        let mut line = String::new();
        for node in paragraph.descendants() {
            match node.tag_name().name() {
                "t" => line.push_str(node.text().unwrap_or_default()),
                "tab" => line.push('\t'),
                "br" | "cr" => line.push('\n'),
                _ => {}
            }
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

const MIN_RUN_CHARS: usize = 4;

/// Word 97-2003 stores body text as UTF-16LE or cp1252 runs inside an OLE
/// container. Printable runs are collected; the wider encoding wins.
pub fn extract_doc(bytes: &[u8]) -> Result<String, AppError> {
    let wide = utf16_runs(bytes);
    let narrow = byte_runs(bytes);
    let text = if wide.len() >= narrow.len() { wide } else { narrow };
    if text.is_empty() {
        return Err(AppError::Extraction(
            "Aucun texte lisible dans le document Word".to_string(),
        ));
    }
    Ok(text)
}

fn is_text_char(c: char) -> bool {
    !c.is_control() || c == '\t' || c == '\r' || c == '\n'
}

fn push_run(out: &mut String, run: &mut String) {
    if run.trim().chars().count() >= MIN_RUN_CHARS {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&run.replace('\r', "\n"));
    }
    run.clear();
}

fn utf16_runs(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let mut out = String::new();
    let mut run = String::new();
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) if is_text_char(c) && (c.is_ascii() || c.is_alphabetic() || c == '•') => {
                run.push(c)
            }
            _ => push_run(&mut out, &mut run),
        }
    }
    push_run(&mut out, &mut run);
    out
}

fn byte_runs(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut run = String::new();
    for &b in bytes {
        let c = match b {
            0x20..=0x7E | b'\t' | b'\r' | b'\n' => b as char,
            0x95 => '•',
            0xC0..=0xFF => char::from(b),
            _ => {
                push_run(&mut out, &mut run);
                continue;
            }
        };
        run.push(c);
    }
    push_run(&mut out, &mut run);
    out
}
