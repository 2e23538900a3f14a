//! Per-page text cleanup applied between extraction and chunking.

use crate::models::RawPage;

/// Collapse every whitespace run (spaces, tabs, newlines, NBSP, ...) to a
/// single ASCII space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Normalize each page and drop the ones left empty.
pub fn normalize_pages(pages: Vec<RawPage>) -> Vec<RawPage> {
    pages
        .into_iter()
        .filter_map(|page| {
            let text = normalize_whitespace(&page.text);
            if text.is_empty() {
                tracing::debug!(page = page.page_number, "dropping empty page");
                None
            } else {
                Some(RawPage {
                    page_number: page.page_number,
                    text,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace() {
        assert_eq!(
            normalize_whitespace("  Hello\t\tworld\n\n  again \u{a0} "),
            "Hello world again"
        );
    }

    #[test]
    fn whitespace_only_becomes_empty() {
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn drops_empty_pages_and_keeps_numbers() {
        let pages = vec![
            RawPage::new(1, "Hello   world."),
            RawPage::new(2, "   \n"),
            RawPage::new(3, "Goodbye.\n"),
        ];
        let out = normalize_pages(pages);
        assert_eq!(
            out,
            vec![RawPage::new(1, "Hello world."), RawPage::new(3, "Goodbye.")]
        );
    }

    #[test]
    fn deterministic() {
        let text = "a\n b\t\tc";
        assert_eq!(normalize_whitespace(text), normalize_whitespace(text));
    }
}
