//! Whole-document processing: extract → normalize → chunk → attach metadata.
//!
//! [`Pipeline`] is the long-lived handle; [`process_document_bytes`] and
//! [`process_document_path`] are one-shot conveniences over the built-in
//! extractors. Everything here is synchronous and CPU bound. Async callers
//! go through [`DocumentWorkerPool`](crate::worker::DocumentWorkerPool).
//!
//! Parsers read from in-memory buffers, so no scratch file is created and
//! nothing outlives a call regardless of how it returns.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::chunk::{chunk_pages, ChunkerConfig, PageChunk};
use crate::config::Config;
use crate::error::DocumentError;
use crate::extract::{ExtractOptions, ExtractedDocument, ExtractorRegistry};
use crate::models::{Chunk, ChunkMetadata, DocumentMetadata, ProcessingReport};
use crate::normalize::normalize_pages;

/// Default upper bound on input size (50 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 50 * 1024 * 1024;

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub metadata: Arc<DocumentMetadata>,
    /// Chunks in document order with contiguous 1-based indices.
    pub chunks: Vec<Chunk>,
    /// Pages that still carried text after normalization.
    pub pages_extracted: usize,
}

impl ProcessedDocument {
    /// Distinct pages among emitted chunks, and the chunk count.
    pub fn report(&self) -> ProcessingReport {
        let pages: BTreeSet<u32> = self.chunks.iter().map(|c| c.metadata.page).collect();
        ProcessingReport {
            pages_processed: pages.len(),
            chunks_processed: self.chunks.len(),
        }
    }

    /// The document parsed but produced no text (e.g. a scanned PDF).
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Number the surviving pieces and bind them to the shared document metadata.
pub fn attach_metadata(pieces: Vec<PageChunk>, document: Arc<DocumentMetadata>) -> Vec<Chunk> {
    pieces
        .into_iter()
        .filter(|piece| !piece.text.trim().is_empty())
        .enumerate()
        .map(|(i, piece)| Chunk {
            text: piece.text,
            metadata: ChunkMetadata {
                page: piece.page,
                chunk: i as u32 + 1,
                source: document.file_name.clone(),
            },
            document: Arc::clone(&document),
        })
        .collect()
}

pub struct Pipeline {
    registry: ExtractorRegistry,
    chunking: ChunkerConfig,
    max_document_bytes: u64,
}

impl Pipeline {
    pub fn new(registry: ExtractorRegistry, chunking: ChunkerConfig) -> Self {
        Self {
            registry,
            chunking,
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    /// Build from a validated [`Config`].
    pub fn from_config(config: &Config) -> Result<Self, DocumentError> {
        let chunking = ChunkerConfig::new(
            config.chunking.chunk_size,
            config.chunking.chunk_overlap,
        )?
        .with_attribution(config.chunking.attribution);
        let registry = ExtractorRegistry::builtin(ExtractOptions {
            docx_page_chars: config.extract.docx_page_chars,
        });
        Ok(Self::new(registry, chunking)
            .with_max_document_bytes(config.extract.max_document_bytes))
    }

    pub fn with_max_document_bytes(mut self, limit: u64) -> Self {
        self.max_document_bytes = limit;
        self
    }

    pub fn chunking(&self) -> &ChunkerConfig {
        &self.chunking
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Extract and normalize pages without chunking. The extractor is
    /// chosen from the extension of `file_name`.
    pub fn extract_pages(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ExtractedDocument, DocumentError> {
        let extractor = self.registry.for_file_name(file_name)?;
        let size = bytes.len() as u64;
        if size > self.max_document_bytes {
            return Err(DocumentError::TooLarge {
                size,
                limit: self.max_document_bytes,
            });
        }
        tracing::debug!(file = file_name, format = %extractor.file_type(), "extracting");

        let mut extracted = extractor.extract(bytes, file_name)?;
        extracted.pages = normalize_pages(extracted.pages);
        Ok(extracted)
    }

    /// Run the whole pipeline over an in-memory document.
    pub fn process_bytes(
        &self,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ProcessedDocument, DocumentError> {
        let ExtractedDocument { metadata, pages } = self.extract_pages(bytes, file_name)?;
        let pieces = chunk_pages(&pages, &self.chunking);
        let metadata = Arc::new(metadata);
        let chunks = attach_metadata(pieces, Arc::clone(&metadata));

        if chunks.is_empty() {
            tracing::warn!(
                file = file_name,
                total_pages = metadata.total_pages,
                "no text extracted"
            );
        } else {
            tracing::info!(
                file = file_name,
                pages = pages.len(),
                chunks = chunks.len(),
                "document processed"
            );
        }

        Ok(ProcessedDocument {
            metadata,
            chunks,
            pages_extracted: pages.len(),
        })
    }

    /// Read `path` and process it. The file name (without directories) is
    /// used as the chunk `source`.
    pub fn process_path(&self, path: &Path) -> Result<ProcessedDocument, DocumentError> {
        let (bytes, file_name) = read_document(path)?;
        self.process_bytes(&bytes, &file_name)
    }
}

/// Load a document from disk along with the bare file name used for
/// dispatch and attribution.
pub fn read_document(path: &Path) -> Result<(Vec<u8>, String), DocumentError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    let bytes = std::fs::read(path).map_err(|source| DocumentError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((bytes, file_name))
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ExtractorRegistry::default(), ChunkerConfig::default())
    }
}

/// One-shot processing of an in-memory document with the built-in extractors.
pub fn process_document_bytes(
    bytes: &[u8],
    file_name: &str,
    chunking: &ChunkerConfig,
) -> Result<ProcessedDocument, DocumentError> {
    Pipeline::new(ExtractorRegistry::default(), *chunking).process_bytes(bytes, file_name)
}

/// One-shot processing of a document on disk with the built-in extractors.
pub fn process_document_path(
    path: &Path,
    chunking: &ChunkerConfig,
) -> Result<ProcessedDocument, DocumentError> {
    Pipeline::new(ExtractorRegistry::default(), *chunking).process_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PageExtractor;
    use crate::models::{FileType, RawPage};

    /// Serves canned pages for `.fake` files.
    struct FakeExtractor {
        pages: Vec<RawPage>,
    }

    impl PageExtractor for FakeExtractor {
        fn file_type(&self) -> FileType {
            FileType::Pdf
        }

        fn extensions(&self) -> &[&'static str] {
            &["fake"]
        }

        fn mime_types(&self) -> &[&'static str] {
            &[]
        }

        fn extract(
            &self,
            _bytes: &[u8],
            file_name: &str,
        ) -> Result<ExtractedDocument, DocumentError> {
            let mut metadata = DocumentMetadata::new(file_name, FileType::Pdf);
            metadata.title = "Fixture".to_string();
            metadata.total_pages = 3;
            Ok(ExtractedDocument {
                metadata,
                pages: self.pages.clone(),
            })
        }
    }

    fn pipeline_with(pages: Vec<RawPage>, chunking: ChunkerConfig) -> Pipeline {
        let mut registry = ExtractorRegistry::new();
        registry.register(Box::new(FakeExtractor { pages }));
        Pipeline::new(registry, chunking)
    }

    #[test]
    fn two_pages_two_chunks() {
        let pipeline = pipeline_with(
            vec![RawPage::new(1, "Hello world."), RawPage::new(2, "Goodbye.")],
            ChunkerConfig::default(),
        );
        let doc = pipeline.process_bytes(b"", "memo.fake").unwrap();
        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(doc.chunks[0].text, "Hello world.");
        assert_eq!(doc.chunks[0].metadata.page, 1);
        assert_eq!(doc.chunks[1].text, "Goodbye.");
        assert_eq!(doc.chunks[1].metadata.page, 2);
        assert_eq!(doc.chunks[1].metadata.source, "memo.fake");
        assert_eq!(
            doc.report(),
            ProcessingReport {
                pages_processed: 2,
                chunks_processed: 2
            }
        );
    }

    #[test]
    fn chunks_share_one_metadata_allocation() {
        let pipeline = pipeline_with(
            vec![RawPage::new(1, "a b c"), RawPage::new(2, "d e f")],
            ChunkerConfig::default(),
        );
        let doc = pipeline.process_bytes(b"", "x.fake").unwrap();
        assert!(doc
            .chunks
            .iter()
            .all(|c| Arc::ptr_eq(&c.document, &doc.metadata)));
        assert_eq!(doc.metadata.title, "Fixture");
    }

    #[test]
    fn indices_contiguous_after_whitespace_pages_dropped() {
        let pipeline = pipeline_with(
            vec![
                RawPage::new(1, "  \n\t"),
                RawPage::new(2, "alpha beta gamma delta epsilon zeta eta theta"),
            ],
            ChunkerConfig::new(20, 5).unwrap(),
        );
        let doc = pipeline.process_bytes(b"", "x.fake").unwrap();
        let indices: Vec<u32> = doc.chunks.iter().map(|c| c.metadata.chunk).collect();
        let expected: Vec<u32> = (1..=doc.chunks.len() as u32).collect();
        assert_eq!(indices, expected);
        assert_eq!(doc.pages_extracted, 1);
        assert!(doc.chunks.iter().all(|c| c.text.chars().count() <= 20));
    }

    #[test]
    fn no_text_is_empty_not_error() {
        let pipeline = pipeline_with(vec![RawPage::new(1, "   ")], ChunkerConfig::default());
        let doc = pipeline.process_bytes(b"", "scan.fake").unwrap();
        assert!(doc.is_empty());
        assert_eq!(doc.report().pages_processed, 0);
        assert_eq!(doc.metadata.total_pages, 3);
    }

    #[test]
    fn unsupported_extension_rejected() {
        let err = Pipeline::default()
            .process_bytes(b"plain text", "notes.txt")
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedFormat(ref e) if e == "txt"));
    }

    #[test]
    fn oversized_input_rejected() {
        let pipeline = pipeline_with(vec![RawPage::new(1, "x")], ChunkerConfig::default())
            .with_max_document_bytes(4);
        let err = pipeline.process_bytes(b"12345", "big.fake").unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { size: 5, limit: 4 }));
    }

    #[test]
    fn missing_path_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = process_document_path(&dir.path().join("gone.pdf"), &ChunkerConfig::default())
            .unwrap_err();
        assert!(matches!(err, DocumentError::FileNotFound { .. }));
    }

    #[test]
    fn attach_metadata_drops_blank_pieces() {
        let doc = Arc::new(DocumentMetadata::new("a.pdf", FileType::Pdf));
        let chunks = attach_metadata(
            vec![
                PageChunk {
                    page: 1,
                    text: "one".to_string(),
                },
                PageChunk {
                    page: 1,
                    text: "  ".to_string(),
                },
                PageChunk {
                    page: 2,
                    text: "two".to_string(),
                },
            ],
            doc,
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].metadata.chunk, 2);
        assert_eq!(chunks[1].metadata.page, 2);
    }
}
