//! Format-specific page extraction for binary documents (PDF, OOXML).
//!
//! Each supported format implements [`PageExtractor`]; the
//! [`ExtractorRegistry`] picks one by file extension or MIME type so new
//! formats can be added without touching the chunker.
//!
//! ```text
//! bytes ──▶ ExtractorRegistry ──▶ PdfExtractor  ──┐
//!              (ext / MIME)   └─▶ DocxExtractor ──┴─▶ DocumentMetadata + [RawPage]
//! ```

mod docx;
mod pdf;

use std::io::Read;
use std::path::Path;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;

use crate::error::DocumentError;
use crate::models::{DocumentMetadata, FileType, RawPage};

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_DOC: &str = "application/msword";

/// Synthetic page size for formats without a page model.
pub const DEFAULT_DOCX_PAGE_CHARS: usize = 1000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Result of running one extractor over a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub metadata: DocumentMetadata,
    /// Normalized, non-empty pages in reading order.
    pub pages: Vec<RawPage>,
}

/// Capability shared by every format variant: turn a document blob into
/// ordered pages plus document metadata.
pub trait PageExtractor: Send + Sync {
    fn file_type(&self) -> FileType;

    /// Lowercase extensions (without the dot) this extractor accepts.
    fn extensions(&self) -> &[&'static str];

    fn mime_types(&self) -> &[&'static str];

    fn extract(&self, bytes: &[u8], file_name: &str) -> Result<ExtractedDocument, DocumentError>;
}

/// Tunables shared by the built-in extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub docx_page_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            docx_page_chars: DEFAULT_DOCX_PAGE_CHARS,
        }
    }
}

/// Extractors keyed by extension and MIME type.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn PageExtractor>>,
}

impl ExtractorRegistry {
    /// An empty registry. Register extractors with [`register`](Self::register).
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Registry with the PDF and DOCX extractors.
    pub fn builtin(options: ExtractOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PdfExtractor));
        registry.register(Box::new(DocxExtractor::new(options.docx_page_chars)));
        registry
    }

    /// Later registrations win for extensions claimed twice.
    pub fn register(&mut self, extractor: Box<dyn PageExtractor>) {
        self.extractors.insert(0, extractor);
    }

    pub fn for_extension(&self, ext: &str) -> Option<&dyn PageExtractor> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        self.extractors
            .iter()
            .find(|e| e.extensions().contains(&ext.as_str()))
            .map(|e| e.as_ref())
    }

    pub fn for_mime(&self, mime: &str) -> Option<&dyn PageExtractor> {
        let mime = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.extractors
            .iter()
            .find(|e| e.mime_types().contains(&mime.as_str()))
            .map(|e| e.as_ref())
    }

    /// Resolve the extractor for `file_name`, or fail with
    /// [`DocumentError::UnsupportedFormat`] before any parsing happens.
    pub fn for_file_name(&self, file_name: &str) -> Result<&dyn PageExtractor, DocumentError> {
        let ext = extension_of(file_name);
        self.for_extension(&ext).ok_or_else(|| {
            DocumentError::UnsupportedFormat(if ext.is_empty() {
                file_name.to_string()
            } else {
                ext
            })
        })
    }

    /// All extensions known to the registry, for building discovery globs.
    pub fn extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .extractors
            .iter()
            .flat_map(|e| e.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::builtin(ExtractOptions::default())
    }
}

/// Lowercased extension of `file_name`, empty when there is none.
pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

pub(crate) type ZipReader<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

/// Read a ZIP entry with a decompressed size cap. `Ok(None)` when the entry
/// does not exist.
pub(crate) fn read_zip_entry_bounded(
    archive: &mut ZipReader<'_>,
    name: &str,
    format: FileType,
) -> Result<Option<Vec<u8>>, DocumentError> {
    let entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(DocumentError::extraction(format, e.to_string())),
    };
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|e| DocumentError::extraction(format, e.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(DocumentError::extraction(
            format,
            format!(
                "ZIP entry {} exceeds size limit ({} bytes)",
                name, MAX_XML_ENTRY_BYTES
            ),
        ));
    }
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension_case_insensitively() {
        let registry = ExtractorRegistry::default();
        assert_eq!(
            registry.for_file_name("Report.PDF").unwrap().file_type(),
            FileType::Pdf
        );
        assert_eq!(
            registry.for_file_name("notes.docx").unwrap().file_type(),
            FileType::Docx
        );
        assert_eq!(
            registry.for_file_name("legacy.doc").unwrap().file_type(),
            FileType::Docx
        );
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let registry = ExtractorRegistry::default();
        let err = registry.for_file_name("notes.txt").err().unwrap();
        assert!(matches!(err, DocumentError::UnsupportedFormat(ref e) if e == "txt"));
        let err = registry.for_file_name("README").err().unwrap();
        assert!(matches!(err, DocumentError::UnsupportedFormat(ref e) if e == "README"));
    }

    #[test]
    fn dispatches_by_mime_type() {
        let registry = ExtractorRegistry::default();
        assert_eq!(
            registry.for_mime("application/pdf; charset=binary").unwrap().file_type(),
            FileType::Pdf
        );
        assert_eq!(
            registry.for_mime(MIME_DOCX).unwrap().file_type(),
            FileType::Docx
        );
        assert!(registry.for_mime("text/plain").is_none());
    }

    #[test]
    fn lists_known_extensions() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.extensions(), vec!["doc", "docx", "pdf"]);
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = ExtractorRegistry::new();
        assert!(registry.for_extension("pdf").is_none());
    }
}
