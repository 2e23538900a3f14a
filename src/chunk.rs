//! Page-aware recursive text chunker.
//!
//! Splits normalized pages into pieces of at most `chunk_size` characters,
//! trying separators in priority order (blank line, newline, sentence end,
//! space, single character) and keeping up to `chunk_overlap` characters of
//! shared content between neighbouring pieces.
//!
//! Two page attribution modes are supported:
//!
//! - [`PageAttribution::Tracked`] splits each page on its own so every piece
//!   carries the page it came from. Overlap never crosses a page boundary.
//! - [`PageAttribution::Marker`] merges all pages into one stream of
//!   `Page <N>: <text>` blocks, splits the stream, and reads the page back
//!   from a leading marker. Pieces that start mid-page fall back to page 1.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::error::DocumentError;
use crate::models::RawPage;

/// Separators tried in priority order. The empty separator splits into
/// single characters.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

static LEADING_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Page (\d+):").expect("valid marker regex"));
static ANY_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Page \d+: ").expect("valid marker regex"));

/// How chunks recover the page they came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageAttribution {
    #[default]
    Tracked,
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub attribution: PageAttribution,
}

impl ChunkerConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, DocumentError> {
        if chunk_size == 0 {
            return Err(DocumentError::InvalidConfig(
                "chunk_size must be > 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(DocumentError::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            attribution: PageAttribution::Tracked,
        })
    }

    pub fn with_attribution(mut self, attribution: PageAttribution) -> Self {
        self.attribution = attribution;
        self
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            attribution: PageAttribution::Tracked,
        }
    }
}

/// A trimmed piece of source text and the byte offset it starts at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece<'a> {
    pub offset: usize,
    pub text: &'a str,
}

/// A chunk before document metadata is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChunk {
    pub page: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    chars: usize,
}

/// Layered recursive splitter with sliding-window overlap.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(config: &ChunkerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Split `text` into trimmed, non-empty pieces of at most `chunk_size`
    /// characters, in document order.
    pub fn split<'a>(&self, text: &'a str) -> Vec<Piece<'a>> {
        let mut windows = Vec::new();
        let whole = Span {
            start: 0,
            end: text.len(),
            chars: text.chars().count(),
        };
        self.split_span(text, whole, &SEPARATORS, &mut windows);

        windows
            .into_iter()
            .filter_map(|span| {
                let raw = &text[span.start..span.end];
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                let lead = raw.len() - raw.trim_start().len();
                Some(Piece {
                    offset: span.start + lead,
                    text: trimmed,
                })
            })
            .collect()
    }

    fn split_span(&self, text: &str, span: Span, separators: &[&str], out: &mut Vec<Span>) {
        let slice = &text[span.start..span.end];
        let Some(idx) = separators
            .iter()
            .position(|sep| sep.is_empty() || slice.contains(sep))
        else {
            out.push(span);
            return;
        };
        let remaining = &separators[idx + 1..];

        let mut good = Vec::new();
        for piece in split_keep_separator(slice, separators[idx], span.start) {
            if piece.chars < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                self.merge(&good, out);
                good.clear();
            }
            if remaining.is_empty() {
                out.push(piece);
            } else {
                self.split_span(text, piece, remaining, out);
            }
        }
        if !good.is_empty() {
            self.merge(&good, out);
        }
    }

    /// Greedily pack contiguous splits into windows of at most `chunk_size`
    /// characters. Each new window starts with the trailing splits of the
    /// previous one, up to `chunk_overlap` characters.
    fn merge(&self, splits: &[Span], out: &mut Vec<Span>) {
        let mut window: VecDeque<Span> = VecDeque::new();
        let mut total = 0usize;

        for &split in splits {
            if total + split.chars > self.chunk_size && !window.is_empty() {
                out.push(join(&window, total));
                while total > self.chunk_overlap
                    || (total > 0 && total + split.chars > self.chunk_size)
                {
                    match window.pop_front() {
                        Some(front) => total -= front.chars,
                        None => break,
                    }
                }
            }
            window.push_back(split);
            total += split.chars;
        }

        if !window.is_empty() {
            out.push(join(&window, total));
        }
    }
}

fn join(window: &VecDeque<Span>, total: usize) -> Span {
    // Splits of one parent are contiguous, so the window is a single span.
    let start = window.front().map(|s| s.start).unwrap_or(0);
    let end = window.back().map(|s| s.end).unwrap_or(start);
    Span {
        start,
        end,
        chars: total,
    }
}

/// Split `slice` on `separator`, leaving each separator attached to the end
/// of the piece before it so no content is lost. Offsets are shifted by `base`.
fn split_keep_separator(slice: &str, separator: &str, base: usize) -> Vec<Span> {
    if separator.is_empty() {
        return slice
            .char_indices()
            .map(|(i, c)| Span {
                start: base + i,
                end: base + i + c.len_utf8(),
                chars: 1,
            })
            .collect();
    }

    let mut spans = Vec::new();
    let mut last = 0;
    for (i, _) in slice.match_indices(separator) {
        let end = i + separator.len();
        spans.push(span_of(slice, last, end, base));
        last = end;
    }
    if last < slice.len() {
        spans.push(span_of(slice, last, slice.len(), base));
    }
    spans
}

fn span_of(slice: &str, start: usize, end: usize, base: usize) -> Span {
    Span {
        start: base + start,
        end: base + end,
        chars: slice[start..end].chars().count(),
    }
}

/// Split normalized pages into page-attributed chunks. Empty chunks are
/// dropped; the returned order is document order.
pub fn chunk_pages(pages: &[RawPage], config: &ChunkerConfig) -> Vec<PageChunk> {
    let splitter = TextSplitter::new(config);
    match config.attribution {
        PageAttribution::Tracked => chunk_tracked(pages, &splitter),
        PageAttribution::Marker => chunk_with_markers(pages, &splitter),
    }
}

fn chunk_tracked(pages: &[RawPage], splitter: &TextSplitter) -> Vec<PageChunk> {
    pages
        .iter()
        .flat_map(|page| {
            splitter.split(&page.text).into_iter().map(|piece| PageChunk {
                page: page.page_number,
                text: piece.text.to_string(),
            })
        })
        .collect()
}

/// Build the merged `Page <N>: <text>` stream used by marker attribution.
pub fn merge_with_markers(pages: &[RawPage]) -> String {
    pages
        .iter()
        .map(|page| format!("Page {}: {}", page.page_number, page.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn chunk_with_markers(pages: &[RawPage], splitter: &TextSplitter) -> Vec<PageChunk> {
    let merged = merge_with_markers(pages);
    splitter
        .split(&merged)
        .into_iter()
        .filter_map(|piece| {
            let page = LEADING_MARKER
                .captures(piece.text)
                .and_then(|caps| caps[1].parse::<u32>().ok())
                .unwrap_or(1);
            let text = ANY_MARKER.replace_all(piece.text, "");
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                Some(PageChunk {
                    page,
                    text: text.to_string(),
                })
            }
        })
        .collect()
}
