//! # rag-docs CLI (`ragdoc`)
//!
//! Turns PDF and Word documents into page-attributed chunk records ready
//! for a vector store.
//!
//! ## Usage
//!
//! ```bash
//! ragdoc [--config ./config/ragdoc.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragdoc chunk <path>` | Chunk one document, or every matching document under a directory |
//! | `ragdoc pages <file>` | Print extracted metadata and normalized pages as JSON |
//!
//! ## Examples
//!
//! ```bash
//! # Chunk a single PDF, records on stdout
//! ragdoc chunk ./inbox/report.pdf
//!
//! # Chunk a directory into a JSONL file, tagging provenance
//! ragdoc chunk ./inbox --out chunks.jsonl --sender +15550100 --channel whatsapp --group
//!
//! # Inspect what the extractor sees
//! ragdoc pages ./inbox/contract.docx
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use rag_docs::config;
use rag_docs::ingest::{self, ChunkOptions};
use rag_docs::logging;
use rag_docs::models::Provenance;

/// rag-docs: page-aware document chunking for retrieval-augmented assistants.
///
/// Configuration is optional; without `--config` the built-in defaults
/// are used (chunk_size 1000, chunk_overlap 100).
#[derive(Parser)]
#[command(
    name = "ragdoc",
    about = "Page-aware PDF/DOCX extraction and chunking",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// See `config/ragdoc.example.toml` for every setting.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Chunk a document or a directory of documents.
    ///
    /// Records are written as JSON lines (stdout by default); the
    /// per-document report and totals go to stderr.
    Chunk {
        /// A PDF/DOCX file, or a directory to scan with the ingest globs.
        path: PathBuf,

        /// Write JSONL records to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Sender identifier to attach to every record.
        #[arg(long)]
        sender: Option<String>,

        /// Originating channel (e.g. whatsapp, telegram).
        #[arg(long, requires = "sender", default_value = "cli")]
        channel: String,

        /// Mark records as coming from a group conversation.
        #[arg(long, requires = "sender")]
        group: bool,

        /// Count pages and chunks without writing records.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a document's metadata and normalized pages as JSON.
    Pages {
        /// A PDF or DOCX file.
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::default(),
    };

    match cli.command {
        Commands::Chunk {
            path,
            out,
            sender,
            channel,
            group,
            dry_run,
        } => {
            let provenance = sender.map(|sender| Provenance {
                sender,
                timestamp: chrono::Utc::now(),
                channel,
                is_group: group,
            });
            ingest::run_chunk(
                &cfg,
                &path,
                ChunkOptions {
                    out,
                    provenance,
                    dry_run,
                },
            )
            .await?;
        }
        Commands::Pages { path } => {
            ingest::run_pages(&cfg, &path)?;
        }
    }

    Ok(())
}
