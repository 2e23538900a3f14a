//! Core data models used throughout the document pipeline.
//!
//! These types represent the pages, documents, and chunks that flow from
//! extraction through chunking to the vector-store collaborator.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Document formats with a registered extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "pdf",
            FileType::Docx => "docx",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of extracted text with its 1-based page number.
///
/// PDFs produce one per text-bearing physical page; DOCX files produce
/// synthetic pages cut from the running paragraph buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub page_number: u32,
    pub text: String,
}

impl RawPage {
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// Document-level metadata, extracted once and shared read-only by every
/// chunk derived from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub creator: String,
    pub producer: String,
    /// Physical pages (PDF) or synthetic pages (DOCX) before empty-page filtering.
    pub total_pages: u32,
    pub file_name: String,
    pub file_type: FileType,
}

impl DocumentMetadata {
    pub fn new(file_name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            subject: String::new(),
            creator: String::new(),
            producer: String::new(),
            total_pages: 0,
            file_name: file_name.into(),
            file_type,
        }
    }
}

/// Positional metadata of one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub page: u32,
    /// 1-based, contiguous within one document.
    pub chunk: u32,
    pub source: String,
}

/// A bounded-size span of document text plus its provenance.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
    pub document: Arc<DocumentMetadata>,
}

impl Chunk {
    /// Flatten into the `(text, metadata)` record handed to the vector store.
    pub fn to_record(&self) -> ChunkRecord {
        let mut metadata = Map::new();
        metadata.insert("page".into(), Value::from(self.metadata.page));
        metadata.insert("chunk".into(), Value::from(self.metadata.chunk));
        metadata.insert("source".into(), Value::from(self.metadata.source.clone()));

        let doc = &self.document;
        metadata.insert("title".into(), Value::from(doc.title.clone()));
        metadata.insert("author".into(), Value::from(doc.author.clone()));
        metadata.insert("subject".into(), Value::from(doc.subject.clone()));
        metadata.insert("creator".into(), Value::from(doc.creator.clone()));
        metadata.insert("producer".into(), Value::from(doc.producer.clone()));
        metadata.insert("total_pages".into(), Value::from(doc.total_pages));
        metadata.insert("file_name".into(), Value::from(doc.file_name.clone()));
        metadata.insert("file_type".into(), Value::from(doc.file_type.as_str()));

        ChunkRecord {
            text: self.text.clone(),
            metadata,
        }
    }

    /// Same as [`to_record`](Chunk::to_record) with caller provenance merged in.
    pub fn to_record_with(&self, provenance: &Provenance) -> ChunkRecord {
        let mut record = self.to_record();
        provenance.apply(&mut record.metadata);
        record
    }
}

/// Caller-supplied attributes describing where a document came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    /// Originating channel, e.g. `"whatsapp"` or `"telegram"`.
    pub channel: String,
    pub is_group: bool,
}

impl Provenance {
    fn apply(&self, metadata: &mut Map<String, Value>) {
        metadata.insert("sender".into(), Value::from(self.sender.clone()));
        metadata.insert("timestamp".into(), Value::from(self.timestamp.to_rfc3339()));
        metadata.insert("channel".into(), Value::from(self.channel.clone()));
        metadata.insert("is_group".into(), Value::from(self.is_group));
    }
}

/// Outbound record persisted by the vector-store collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Success reply reported back through the messaging channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Distinct page values among emitted chunks.
    pub pages_processed: usize,
    pub chunks_processed: usize,
}
