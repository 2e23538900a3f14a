//! Error taxonomy for the document pipeline.
//!
//! Every failure is returned to the immediate caller; nothing is retried or
//! swallowed here. A document that parses but carries no text is *not* an
//! error (see [`ProcessedDocument::is_empty`](crate::pipeline::ProcessedDocument::is_empty)).

use std::path::PathBuf;

use thiserror::Error;

use crate::models::FileType;

#[derive(Debug, Error)]
pub enum DocumentError {
    /// Input path missing or unreadable.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No extractor is registered for the extension or MIME type.
    #[error("unsupported document type: {0}")]
    UnsupportedFormat(String),

    /// The format parser could not produce any structure (corrupt, encrypted,
    /// truncated archive, ...).
    #[error("{format} extraction failed: {message}")]
    ExtractionFailure { format: FileType, message: String },

    /// Document is larger than `extract.max_document_bytes`.
    #[error("document is {size} bytes, limit is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("invalid chunking configuration: {0}")]
    InvalidConfig(String),

    /// A pooled job was cancelled or panicked before returning.
    #[error("document worker failed: {0}")]
    WorkerFailure(String),
}

impl DocumentError {
    pub(crate) fn extraction(format: FileType, message: impl Into<String>) -> Self {
        DocumentError::ExtractionFailure {
            format,
            message: message.into(),
        }
    }

    /// Short reply suitable for echoing back through a chat channel.
    pub fn user_message(&self) -> String {
        match self {
            DocumentError::FileNotFound { .. } => {
                "The document could not be found or read.".to_string()
            }
            DocumentError::UnsupportedFormat(ext) => format!(
                "Documents of type '{}' are not supported. Send a PDF or Word document.",
                ext
            ),
            DocumentError::ExtractionFailure { format, .. } => format!(
                "The {} file could not be read. It may be corrupted or password protected.",
                format
            ),
            DocumentError::TooLarge { limit, .. } => format!(
                "The document is too large to process (limit {} MB).",
                limit / (1024 * 1024)
            ),
            DocumentError::InvalidConfig(_) | DocumentError::WorkerFailure(_) => {
                "Something went wrong while processing the document.".to_string()
            }
        }
    }
}
