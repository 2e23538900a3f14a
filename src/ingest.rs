//! Command orchestration for `ragdoc chunk` and `ragdoc pages`.
//!
//! Coordinates the full flow: discovery → worker pool → provenance →
//! sink. A single file fails the command on any error; a directory run
//! skips failing documents, counts them, and keeps going.

use anyhow::{bail, Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::DocumentError;
use crate::models::{DocumentMetadata, ProcessingReport, Provenance};
use crate::pipeline::{read_document, Pipeline, ProcessedDocument};
use crate::sink::{ChunkSink, JsonlSink, MemorySink};
use crate::worker::DocumentWorkerPool;

/// Options for [`run_chunk`].
#[derive(Debug, Clone, Default)]
pub struct ChunkOptions {
    /// Write JSONL here instead of stdout.
    pub out: Option<PathBuf>,
    /// Attached to every record when present.
    pub provenance: Option<Provenance>,
    /// Count chunks without writing records.
    pub dry_run: bool,
}

/// Totals printed at the end of a `chunk` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    pub documents: usize,
    pub pages_processed: usize,
    pub chunks_processed: usize,
    pub no_text: usize,
    pub skipped: usize,
}

impl ChunkSummary {
    fn add(&mut self, report: ProcessingReport) {
        self.documents += 1;
        self.pages_processed += report.pages_processed;
        self.chunks_processed += report.chunks_processed;
        if report.chunks_processed == 0 {
            self.no_text += 1;
        }
    }
}

pub async fn run_chunk(
    config: &Config,
    path: &Path,
    options: ChunkOptions,
) -> Result<ChunkSummary> {
    let pipeline = Pipeline::from_config(config)?;
    let pool = DocumentWorkerPool::new(Arc::new(pipeline), config.ingest.workers);

    let sink: Arc<dyn ChunkSink> = if options.dry_run {
        Arc::new(MemorySink::new())
    } else if let Some(out) = &options.out {
        Arc::new(JsonlSink::create(out).await?)
    } else {
        Arc::new(JsonlSink::stdout())
    };

    let single = !path.is_dir();
    let files = if single {
        vec![path.to_path_buf()]
    } else {
        discover_documents(config, path)?
    };

    if options.dry_run {
        eprintln!("chunk {} (dry-run)", path.display());
    } else {
        eprintln!("chunk {}", path.display());
    }

    let mut set = tokio::task::JoinSet::new();
    for file in files {
        let pool = pool.clone();
        set.spawn(async move {
            let result = pool.process_path(file.clone()).await;
            (file, result)
        });
    }

    let mut results: Vec<(PathBuf, Result<ProcessedDocument, DocumentError>)> = Vec::new();
    while let Some(joined) = set.join_next().await {
        results.push(joined.context("document task failed")?);
    }
    // Sort for deterministic output
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut summary = ChunkSummary::default();
    for (file, result) in results {
        let doc = match result {
            Ok(doc) => doc,
            Err(e) if single => {
                return Err(e).with_context(|| format!("Failed to process {}", file.display()))
            }
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "skipping document");
                eprintln!("  {}: skipped ({})", display_name(path, &file), e);
                summary.skipped += 1;
                continue;
            }
        };

        let report = doc.report();
        summary.add(report);
        if doc.is_empty() {
            eprintln!("  {}: no text extracted", display_name(path, &file));
            continue;
        }

        let records: Vec<_> = doc
            .chunks
            .iter()
            .map(|chunk| match &options.provenance {
                Some(provenance) => chunk.to_record_with(provenance),
                None => chunk.to_record(),
            })
            .collect();
        sink.persist(&records)
            .await
            .with_context(|| format!("Failed to write chunks for {}", file.display()))?;

        eprintln!(
            "  {}: pages {}, chunks {}",
            display_name(path, &file),
            report.pages_processed,
            report.chunks_processed
        );
    }

    eprintln!("  documents: {}", summary.documents);
    eprintln!("  pages processed: {}", summary.pages_processed);
    eprintln!("  chunks processed: {}", summary.chunks_processed);
    if summary.no_text > 0 {
        eprintln!("  no text: {}", summary.no_text);
    }
    if summary.skipped > 0 {
        eprintln!("  skipped: {}", summary.skipped);
    }
    eprintln!("ok");

    Ok(summary)
}

#[derive(Serialize)]
struct PagesView<'a> {
    metadata: &'a DocumentMetadata,
    pages: Vec<PageView<'a>>,
}

#[derive(Serialize)]
struct PageView<'a> {
    page: u32,
    text: &'a str,
}

/// Print a document's metadata and normalized pages as JSON.
pub fn run_pages(config: &Config, path: &Path) -> Result<()> {
    let pipeline = Pipeline::from_config(config)?;
    let (bytes, file_name) = read_document(path)?;
    let extracted = pipeline
        .extract_pages(&bytes, &file_name)
        .with_context(|| format!("Failed to extract {}", path.display()))?;

    let view = PagesView {
        metadata: &extracted.metadata,
        pages: extracted
            .pages
            .iter()
            .map(|p| PageView {
                page: p.page_number,
                text: &p.text,
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Find documents under `root` matching the ingest globs, sorted by path.
pub fn discover_documents(config: &Config, root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Input directory does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.ingest.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.ingest.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(config.ingest.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // Phone uploads often arrive as `SCAN.PDF`.
        builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
    }
    Ok(builder.build()?)
}

fn display_name(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .ok()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(file)
        .display()
        .to_string()
}
