//! DOCX page extraction.
//!
//! Word documents have no page model. Body paragraphs are read in order,
//! then table cells row by row, and the running text is cut into synthetic
//! pages of at most `page_chars` characters.

use quick_xml::events::Event;
use quick_xml::Reader;

use super::{
    read_zip_entry_bounded, ExtractedDocument, PageExtractor, ZipReader, MIME_DOC, MIME_DOCX,
};
use crate::error::DocumentError;
use crate::models::{DocumentMetadata, FileType, RawPage};
use crate::normalize::normalize_whitespace;

const DOCUMENT_XML: &str = "word/document.xml";
const CORE_XML: &str = "docProps/core.xml";
const APP_XML: &str = "docProps/app.xml";

pub struct DocxExtractor {
    page_chars: usize,
}

impl DocxExtractor {
    pub fn new(page_chars: usize) -> Self {
        Self {
            page_chars: page_chars.max(1),
        }
    }
}

impl PageExtractor for DocxExtractor {
    fn file_type(&self) -> FileType {
        FileType::Docx
    }

    fn extensions(&self) -> &[&'static str] {
        &["docx", "doc"]
    }

    fn mime_types(&self) -> &[&'static str] {
        &[MIME_DOCX, MIME_DOC]
    }

    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<ExtractedDocument, DocumentError> {
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
            .map_err(|e| DocumentError::extraction(FileType::Docx, e.to_string()))?;

        let document_xml = read_zip_entry_bounded(&mut archive, DOCUMENT_XML, FileType::Docx)?
            .ok_or_else(|| {
                DocumentError::extraction(FileType::Docx, format!("{} not found", DOCUMENT_XML))
            })?;
        let body = read_body(&document_xml)?;

        let mut metadata = read_metadata(&mut archive, file_name)?;
        let texts = body.paragraphs.into_iter().chain(body.cells);
        let pages = paginate(texts, self.page_chars);
        metadata.total_pages = pages.len() as u32;

        Ok(ExtractedDocument { metadata, pages })
    }
}

/// Paragraph and table-cell texts in document order, already trimmed and
/// non-empty.
#[derive(Debug, Default)]
struct DocxBody {
    paragraphs: Vec<String>,
    cells: Vec<String>,
}

fn xml_error(e: impl std::fmt::Display) -> DocumentError {
    DocumentError::extraction(FileType::Docx, e.to_string())
}

fn read_body(xml: &[u8]) -> Result<DocxBody, DocumentError> {
    let mut body = DocxBody::default();
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    // One buffer per open `w:p`; text boxes nest paragraphs inside runs.
    let mut paragraphs: Vec<String> = Vec::new();
    // One buffer per open `w:tc`; nested tables push another.
    let mut cells: Vec<String> = Vec::new();
    let mut in_text = false;
    let mut skipped = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"t" => in_text = true,
                b"tc" => cells.push(String::new()),
                // `mc:Fallback` repeats the `mc:Choice` content.
                b"Fallback" => {
                    let end = e.to_end().into_owned();
                    reader
                        .read_to_end_into(end.name(), &mut skipped)
                        .map_err(xml_error)?;
                    skipped.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if let Some(paragraph) = paragraphs.last_mut() {
                    match e.local_name().as_ref() {
                        b"tab" => paragraph.push('\t'),
                        b"br" | b"cr" => paragraph.push('\n'),
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(xml_error)?;
                if let Some(paragraph) = paragraphs.last_mut() {
                    paragraph.push_str(&text);
                }
            }
            Ok(Event::CData(cd)) if in_text => {
                if let Some(paragraph) = paragraphs.last_mut() {
                    paragraph.push_str(&String::from_utf8_lossy(&cd));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let paragraph = paragraphs.pop().unwrap_or_default();
                    let text = paragraph.trim();
                    if !text.is_empty() {
                        match cells.last_mut() {
                            Some(cell) => {
                                if !cell.is_empty() {
                                    cell.push('\n');
                                }
                                cell.push_str(text);
                            }
                            None => body.paragraphs.push(text.to_string()),
                        }
                    }
                }
                b"tc" => {
                    if let Some(cell) = cells.pop() {
                        let text = cell.trim();
                        if !text.is_empty() {
                            body.cells.push(text.to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(body)
}

/// Join texts with newlines and cut the running buffer into pages whenever
/// it grows past `page_chars` characters. A cut backs off to the last
/// whitespace in the second half of the window; unbroken text is cut hard.
fn paginate(texts: impl IntoIterator<Item = String>, page_chars: usize) -> Vec<RawPage> {
    let mut pages = Vec::new();
    let mut buffer = String::new();

    for text in texts {
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&text);

        while buffer.chars().count() > page_chars {
            let hard = byte_index_of_char(&buffer, page_chars);
            let floor = byte_index_of_char(&buffer, page_chars / 2);
            let cut = buffer[..hard]
                .rfind(char::is_whitespace)
                .filter(|&i| i > floor)
                .unwrap_or(hard);
            let rest = buffer[cut..].trim_start().to_string();
            push_page(&mut pages, &buffer[..cut]);
            buffer = rest;
        }
    }
    push_page(&mut pages, &buffer);
    pages
}

fn push_page(pages: &mut Vec<RawPage>, text: &str) {
    let text = normalize_whitespace(text);
    if !text.is_empty() {
        pages.push(RawPage::new(pages.len() as u32 + 1, text));
    }
}

fn byte_index_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn read_metadata(
    archive: &mut ZipReader<'_>,
    file_name: &str,
) -> Result<DocumentMetadata, DocumentError> {
    let mut metadata = DocumentMetadata::new(file_name, FileType::Docx);
    if let Some(core) = read_zip_entry_bounded(archive, CORE_XML, FileType::Docx)? {
        for (name, value) in simple_elements(&core)? {
            match name.as_str() {
                "title" => metadata.title = value,
                "creator" => metadata.author = value,
                "subject" => metadata.subject = value,
                _ => {}
            }
        }
    }
    if let Some(app) = read_zip_entry_bounded(archive, APP_XML, FileType::Docx)? {
        if let Some((_, value)) = simple_elements(&app)?
            .into_iter()
            .find(|(name, _)| name == "Application")
        {
            metadata.creator = value;
        }
    }
    Ok(metadata)
}

/// `(local-name, text)` for every element that directly wraps text.
fn simple_elements(xml: &[u8]) -> Result<Vec<(String, String)>, DocumentError> {
    let mut out = Vec::new();
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut open: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                open = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Text(te)) => {
                if let Some(name) = open.take() {
                    let value = te.unescape().map_err(xml_error)?;
                    out.push((name, value.trim().to_string()));
                }
            }
            Ok(Event::End(_)) => open = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}
