use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::chunk::PageAttribution;
use crate::extract::DEFAULT_DOCX_PAGE_CHARS;
use crate::pipeline::DEFAULT_MAX_DOCUMENT_BYTES;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingSection,
    #[serde(default)]
    pub extract: ExtractSection,
    #[serde(default)]
    pub ingest: IngestSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingSection {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub attribution: PageAttribution,
}

impl Default for ChunkingSection {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            attribution: PageAttribution::default(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractSection {
    #[serde(default = "default_docx_page_chars")]
    pub docx_page_chars: usize,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            docx_page_chars: default_docx_page_chars(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

fn default_docx_page_chars() -> usize {
    DEFAULT_DOCX_PAGE_CHARS
}
fn default_max_document_bytes() -> u64 {
    DEFAULT_MAX_DOCUMENT_BYTES
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestSection {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            workers: default_workers(),
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.pdf".to_string(),
        "**/*.docx".to_string(),
        "**/*.doc".to_string(),
    ]
}
fn default_workers() -> usize {
    4
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    // Validate extraction
    if config.extract.docx_page_chars == 0 {
        anyhow::bail!("extract.docx_page_chars must be > 0");
    }
    if config.extract.max_document_bytes == 0 {
        anyhow::bail!("extract.max_document_bytes must be > 0");
    }

    // Validate ingest
    if config.ingest.workers == 0 {
        anyhow::bail!("ingest.workers must be >= 1");
    }
    for pattern in config
        .ingest
        .include_globs
        .iter()
        .chain(&config.ingest.exclude_globs)
    {
        globset::Glob::new(pattern)
            .with_context(|| format!("Invalid glob pattern in ingest: '{}'", pattern))?;
    }

    Ok(())
}
