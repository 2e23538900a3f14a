//! Bounded pool for running the synchronous pipeline from async code.
//!
//! Parsing and splitting are CPU bound, so each document runs on a blocking
//! thread via [`tokio::task::spawn_blocking`]. A [`Semaphore`] caps how many
//! documents are in flight at once; jobs share only the read-only
//! [`Pipeline`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::DocumentError;
use crate::pipeline::{Pipeline, ProcessedDocument};

#[derive(Clone)]
pub struct DocumentWorkerPool {
    pipeline: Arc<Pipeline>,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl DocumentWorkerPool {
    pub fn new(pipeline: Arc<Pipeline>, workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            pipeline,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Process an in-memory document once a worker slot is free.
    pub async fn process(
        &self,
        bytes: Vec<u8>,
        file_name: String,
    ) -> Result<ProcessedDocument, DocumentError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| DocumentError::WorkerFailure(e.to_string()))?;

        let pipeline = Arc::clone(&self.pipeline);
        let name = file_name.clone();
        tokio::task::spawn_blocking(move || pipeline.process_bytes(&bytes, &name))
            .await
            .map_err(|e| {
                tracing::error!(file = %file_name, error = %e, "document worker panicked");
                DocumentError::WorkerFailure(format!("{}: {}", file_name, e))
            })?
    }

    /// Read and process a document on disk once a worker slot is free.
    pub async fn process_path(&self, path: PathBuf) -> Result<ProcessedDocument, DocumentError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| DocumentError::WorkerFailure(e.to_string()))?;

        let pipeline = Arc::clone(&self.pipeline);
        let shown = path.display().to_string();
        tokio::task::spawn_blocking(move || pipeline.process_path(&path))
            .await
            .map_err(|e| {
                tracing::error!(file = %shown, error = %e, "document worker panicked");
                DocumentError::WorkerFailure(format!("{}: {}", shown, e))
            })?
    }
}
