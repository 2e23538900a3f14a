//! PDF page extraction.
//!
//! Glyphs are collected through a positional [`OutputDev`] rather than
//! pdf-extract's plain-text writer: content streams do not guarantee visual
//! order, so each page's text blocks are re-sorted top to bottom before they
//! are joined.

use std::cmp::Ordering;
use std::panic::{catch_unwind, AssertUnwindSafe};

use lopdf::{Dictionary, Document, Object};
use pdf_extract::{MediaBox, OutputDev, OutputError, Transform};

use super::{ExtractedDocument, PageExtractor, MIME_PDF};
use crate::error::DocumentError;
use crate::models::{DocumentMetadata, FileType, RawPage};
use crate::normalize::normalize_whitespace;

pub struct PdfExtractor;

impl PageExtractor for PdfExtractor {
    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn mime_types(&self) -> &[&'static str] {
        &[MIME_PDF]
    }

    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<ExtractedDocument, DocumentError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| DocumentError::extraction(FileType::Pdf, e.to_string()))?;

        let mut metadata = read_metadata(&doc, file_name);
        metadata.total_pages = doc.get_pages().len() as u32;

        let mut collector = BlockCollector::default();
        // pdf-extract panics on some malformed font programs.
        catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::output_doc(&doc, &mut collector)
        }))
        .map_err(|_| DocumentError::extraction(FileType::Pdf, "text layer could not be decoded"))?
        .map_err(|e| DocumentError::extraction(FileType::Pdf, e.to_string()))?;

        let mut pages = Vec::new();
        for (index, blocks) in collector.pages.into_iter().enumerate() {
            let text = normalize_whitespace(&page_text(blocks));
            if text.is_empty() {
                tracing::debug!(
                    file = file_name,
                    physical_page = index + 1,
                    "page has no text layer"
                );
                continue;
            }
            pages.push(RawPage::new(pages.len() as u32 + 1, text));
        }

        Ok(ExtractedDocument { metadata, pages })
    }
}

/// A run of glyphs sharing one baseline.
#[derive(Debug, Clone)]
struct TextBlock {
    y: f64,
    text: String,
}

#[derive(Default)]
struct BlockCollector {
    pages: Vec<Vec<TextBlock>>,
    current: Vec<TextBlock>,
    last_end: f64,
}

impl OutputDev for BlockCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.current.clear();
        self.last_end = 0.0;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        self.pages.push(std::mem::take(&mut self.current));
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        spacing: f64,
        font_size: f64,
        text: &str,
    ) -> Result<(), OutputError> {
        let (x, y) = (trm.m31, trm.m32);
        let size = rendered_size(trm, font_size);

        match self.current.last_mut() {
            Some(block) if (block.y - y).abs() <= size * 0.5 => {
                if x > self.last_end + size * 0.1 && !block.text.ends_with(char::is_whitespace) {
                    block.text.push(' ');
                }
                block.text.push_str(text);
            }
            _ => self.current.push(TextBlock {
                y,
                text: text.to_string(),
            }),
        }
        self.last_end = x + (width * font_size + spacing) * trm.m11;
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Side of the square with the same area as the font's em box after the
/// text matrix is applied. `trm` carries no font scale of its own.
fn rendered_size(trm: &Transform, font_size: f64) -> f64 {
    let dx = font_size * trm.m11 + font_size * trm.m21;
    let dy = font_size * trm.m12 + font_size * trm.m22;
    (dx * dy).abs().sqrt().max(f64::EPSILON)
}

/// Join a page's blocks in top-to-bottom order. PDF space grows upwards, so
/// higher `y` comes first; ties keep stream order.
fn page_text(mut blocks: Vec<TextBlock>) -> String {
    blocks.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal));
    blocks
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_metadata(doc: &Document, file_name: &str) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::new(file_name, FileType::Pdf);
    if let Some(info) = info_dictionary(doc) {
        metadata.title = info_string(doc, info, b"Title");
        metadata.author = info_string(doc, info, b"Author");
        metadata.subject = info_string(doc, info, b"Subject");
        metadata.creator = info_string(doc, info, b"Creator");
        metadata.producer = info_string(doc, info, b"Producer");
    }
    metadata
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    resolve(doc, info)?.as_dict().ok()
}

fn info_string(doc: &Document, info: &Dictionary, key: &[u8]) -> String {
    match info.get(key).ok().and_then(|obj| resolve(doc, obj)) {
        Some(Object::String(bytes, _)) => decode_pdf_string(bytes),
        _ => String::new(),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, otherwise
/// PDFDocEncoding (treated as Latin-1).
fn decode_pdf_string(bytes: &[u8]) -> String {
    let text = if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(rest).into_owned()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    };
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}
