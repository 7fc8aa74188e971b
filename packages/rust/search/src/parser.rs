//! Search result page parsing.
//!
//! Extracts title/snippet pairs from an HTML results page and formats them
//! into the evidence blob embedded in grounding prompts.

use scraper::{ElementRef, Html, Selector};

/// Separator placed between formatted snippets.
pub const SNIPPET_DELIMITER: &str = "\n---\n";

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snippet {
    /// Result title (link text).
    pub title: String,
    /// Result excerpt; may be empty.
    pub snippet: String,
}

/// Parse up to `max_results` organic result blocks from a results page.
///
/// Ads and blocks without a title are skipped.
pub fn parse_results(html: &str, max_results: usize) -> Vec<Snippet> {
    let doc = Html::parse_document(html);
    let block_sel = Selector::parse("div.result:not(.result--ad)").unwrap();
    let title_sel = Selector::parse(".result__a").unwrap();
    let snippet_sel = Selector::parse(".result__snippet").unwrap();

    doc.select(&block_sel)
        .filter_map(|block| {
            let title = first_text(&block, &title_sel)?;
            let snippet = first_text(&block, &snippet_sel).unwrap_or_default();
            Some(Snippet { title, snippet })
        })
        .take(max_results)
        .collect()
}

/// Format snippets as `Title: ...\nSnippet: ...` pairs joined by [`SNIPPET_DELIMITER`].
pub fn format_evidence(snippets: &[Snippet]) -> String {
    snippets
        .iter()
        .map(|s| format!("Title: {}\nSnippet: {}", s.title, s.snippet))
        .collect::<Vec<_>>()
        .join(SNIPPET_DELIMITER)
}

/// Whitespace-collapsed text of the first element matching `sel`, if non-empty.
fn first_text(block: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    let el = block.select(sel).next()?;
    let text = el.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_fixture() -> String {
        let path = "../../../fixtures/search/duckduckgo.html";
        std::fs::read_to_string(path).unwrap_or_else(|_| panic!("missing fixture: {path}"))
    }

    #[test]
    fn parses_organic_results_in_order() {
        let results = parse_results(&load_fixture(), 10);
        assert_eq!(results.len(), 6);
        assert_eq!(results[0].title, "Stripe - Wikipedia");
        assert!(results[0].snippet.contains("Patrick and John Collison"));
        assert!(results.iter().all(|r| !r.title.contains("Sponsored")));
    }

    #[test]
    fn respects_max_results() {
        let results = parse_results(&load_fixture(), 5);
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn block_without_snippet_keeps_title() {
        let results = parse_results(&load_fixture(), 10);
        let last = results.last().unwrap();
        assert_eq!(last.title, "Stripe company profile");
        assert_eq!(last.snippet, "");
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(parse_results("<html><body>No results.</body></html>", 5).is_empty());
    }

    #[test]
    fn format_joins_pairs_with_delimiter() {
        let blob = format_evidence(&[
            Snippet {
                title: "A".into(),
                snippet: "first".into(),
            },
            Snippet {
                title: "B".into(),
                snippet: "second".into(),
            },
        ]);
        assert_eq!(blob, "Title: A\nSnippet: first\n---\nTitle: B\nSnippet: second");
        assert_eq!(format_evidence(&[]), "");
    }
}
