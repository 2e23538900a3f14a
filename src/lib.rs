//! # rag-docs
//!
//! Page-aware document extraction and chunking for retrieval-augmented
//! chat assistants.
//!
//! A user sends a PDF or Word document; rag-docs turns it into bounded-size,
//! page-attributed chunks carrying the document's metadata, ready for a
//! vector store to embed and index.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────┐   ┌──────────┐
//! │ Extractor  │──▶│ Normalizer │──▶│ Chunker │──▶│ Metadata │──▶ ChunkSink
//! │ PDF / DOCX │   │ whitespace │   │ layered │   │ attacher │   (vector store)
//! └────────────┘   └────────────┘   └─────────┘   └──────────┘
//!        ▲
//!        └── DocumentWorkerPool (bounded, spawn_blocking)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rag_docs::chunk::ChunkerConfig;
//! use rag_docs::pipeline::process_document_path;
//!
//! let doc = process_document_path("report.pdf".as_ref(), &ChunkerConfig::default())?;
//! for chunk in &doc.chunks {
//!     println!("p{} #{}: {}", chunk.metadata.page, chunk.metadata.chunk, chunk.text);
//! }
//! # Ok::<(), rag_docs::error::DocumentError>(())
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`extract`] | PDF and DOCX page extraction |
//! | [`normalize`] | Whitespace normalization |
//! | [`chunk`] | Layered recursive chunking with overlap |
//! | [`pipeline`] | Whole-document processing and metadata attachment |
//! | [`worker`] | Bounded async worker pool |
//! | [`sink`] | Outbound record persistence |
//! | [`ingest`] | CLI orchestration |
//! | [`logging`] | Tracing subscriber setup |

pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod worker;
