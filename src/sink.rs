//! Outbound persistence boundary for chunk records.
//!
//! The vector store that embeds and indexes chunks lives outside this crate.
//! [`ChunkSink`] is the seam it plugs into; records arrive already flattened
//! to `(text, metadata)` with any caller provenance attached.
//!
//! ```text
//! ProcessedDocument ──▶ Chunk::to_record_with() ──▶ ChunkSink::persist()
//!                                                     ├─ MemorySink
//!                                                     └─ JsonlSink (file / stdout)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use anyhow::Result;
//! use rag_docs::models::ChunkRecord;
//! use rag_docs::sink::ChunkSink;
//!
//! struct VectorStore;
//!
//! #[async_trait]
//! impl ChunkSink for VectorStore {
//!     async fn persist(&self, records: &[ChunkRecord]) -> Result<usize> {
//!         // embed + upsert ...
//!         Ok(records.len())
//!     }
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use crate::models::ChunkRecord;

/// Destination for chunk records.
///
/// Implementations must be safe to share across tasks; `persist` may be
/// called concurrently for different documents.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Store `records`, returning how many were written.
    async fn persist(&self, records: &[ChunkRecord]) -> Result<usize>;
}

/// Keeps every record in memory. Used for dry runs and tests.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<ChunkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<ChunkRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl ChunkSink for MemorySink {
    async fn persist(&self, records: &[ChunkRecord]) -> Result<usize> {
        self.records.lock().await.extend_from_slice(records);
        Ok(records.len())
    }
}

/// Writes one JSON object per line.
pub struct JsonlSink {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonlSink {
    /// Create (or truncate) `path`.
    pub async fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = tokio::fs::File::create(path)
            .await
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::from_writer(Box::new(tokio::io::BufWriter::new(file))))
    }

    pub fn stdout() -> Self {
        Self::from_writer(Box::new(tokio::io::stdout()))
    }

    pub fn from_writer(writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub async fn flush(&self) -> Result<()> {
        self.writer.lock().await.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ChunkSink for JsonlSink {
    async fn persist(&self, records: &[ChunkRecord]) -> Result<usize> {
        let mut buf = Vec::new();
        for record in records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        // One write per batch keeps a document's lines together.
        let mut writer = self.writer.lock().await;
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(records.len())
    }
}
