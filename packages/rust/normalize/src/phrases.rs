//! The phrase table: every marker, phrase, and template the classifier and
//! normalizer know about.
//!
//! Upstream phrasing drifts, so this table is the only place such strings
//! live. Bump [`PHRASE_TABLE_VERSION`] whenever an entry changes meaning.

use std::sync::LazyLock;

use founderlookup_shared::ErrorKind;
use regex::Regex;
use tracing::warn;

pub use founderlookup_shared::NOT_FOUND_SENTINEL;

/// Version of the table below.
pub const PHRASE_TABLE_VERSION: u32 = 1;

/// Markers written by earlier tool versions. Read, never written.
pub const LEGACY_ERROR_MARKERS: &[(&str, ErrorKind)] =
    &[("Founders_Not_Yet_Looked_Up", ErrorKind::Unexpected)];

/// Lower-case substrings that mean the answer carries no founder.
pub const NOT_FOUND_PHRASES: &[&str] = &[
    "not found",
    "couldn't find",
    "could not find",
    "unable to find",
    "no founder information",
    "i do not have access",
    "i don't have access",
    "i cannot provide",
    "i can't provide",
    "does not have clearly defined founders",
];

/// Whole answers (trimmed, case-insensitive) that mean "no founder".
pub const EXACT_NOT_FOUND_ANSWERS: &[&str] = &["n/a", "none", "unknown"];

/// Boilerplate lead-ins stripped from the start of an answer, tried in order.
///
/// Regex fragments; `{company}` is replaced with the escaped company name.
/// Templates naming the company come first so the specific variant wins over
/// the generic one.
pub const LEAD_IN_TEMPLATES: &[&str] = &[
    r#"(?:the\s+)?(?:co-?)?founders?\s+of\s+(?:the\s+company\s+)?['"“]?{company}['"”]?\s+(?:is|are|was|were|include|includes)\s*:?"#,
    r#"['"“]?{company}['"”]?(?:'s|’s)\s+(?:co-?)?founders?\s+(?:is|are|was|were|include|includes)\s*:?"#,
    r"{company}\s+was\s+(?:co-?)?founded\s+(?:in\s+\d{4}\s+)?by",
    r"key\s+figures\s+associated\s+with\s+the\s+founding(?:\s+of\s+{company})?\s+include",
    r"the\s+company\s+was\s+(?:co-?)?founded\s+(?:in\s+\d{4}\s+)?by",
    r"key\s+figures\s+associated\s+with\s+the\s+founding\s+include",
    r"(?:co-?)?founded\s+by",
    r"(?:the\s+)?(?:co-?)?founders?\s+(?:is|are|was|were|include|includes)\s*:?",
    r"(?:the\s+)?(?:co-?)?founders?\s*:",
];

/// Words and phrases marking a collective or a legal entity rather than a
/// person. Matched as whole words, case-insensitively.
pub const STOPLIST: &[&str] = &[
    "various",
    "several",
    "group of",
    "team of",
    "a group",
    "group",
    "holdings",
    "llc",
    "l.l.c",
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "company",
    "ltd",
    "limited",
    "gmbh",
    "plc",
    "ventures",
    "investors",
    "founders",
];

/// Maximum number of words in a plausible person name.
pub const MAX_NAME_WORDS: usize = 4;

static STOPLIST_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = STOPLIST
        .iter()
        .map(|entry| regex::escape(entry))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternatives})\b")).expect("valid regex")
});

/// The error kind a marker stands for, if `text` is exactly one (trimmed).
pub fn error_marker_kind(text: &str) -> Option<ErrorKind> {
    let text = text.trim();
    ErrorKind::ALL
        .iter()
        .find(|kind| kind.marker() == text)
        .copied()
        .or_else(|| {
            LEGACY_ERROR_MARKERS
                .iter()
                .find(|(marker, _)| *marker == text)
                .map(|(_, kind)| *kind)
        })
}

/// Whether `text` is empty or reads as an explicit "no founder" answer.
///
/// Error markers are not considered here; see [`error_marker_kind`].
pub fn reads_as_not_found(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    EXACT_NOT_FOUND_ANSWERS.contains(&lower.as_str())
        || NOT_FOUND_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Whether `candidate` contains a stoplist entry.
pub fn contains_stopword(candidate: &str) -> bool {
    STOPLIST_RE.is_match(candidate)
}

// ---------------------------------------------------------------------------
// Lead-in matcher
// ---------------------------------------------------------------------------

/// [`LEAD_IN_TEMPLATES`] compiled for one company name.
#[derive(Debug, Clone)]
pub struct LeadIns {
    patterns: Vec<Regex>,
}

impl LeadIns {
    /// Compile the templates with `company` interpolated and regex-escaped.
    ///
    /// Company-specific templates are skipped when `company` is blank, or
    /// when the interpolated pattern does not compile (for example, a name
    /// too long for the regex size limit).
    pub fn for_company(company: &str) -> Self {
        let company = company.trim();
        let escaped = regex::escape(company);
        let patterns = LEAD_IN_TEMPLATES
            .iter()
            .filter(|template| !company.is_empty() || !template.contains("{company}"))
            .filter_map(|template| {
                let body = template.replace("{company}", &escaped);
                match Regex::new(&format!(r"(?i)^\s*(?:{body})\s*")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(
                            company_len = company.len(),
                            error = %e,
                            "skipping lead-in template that failed to compile"
                        );
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Strip the first template matching at the start of `text`.
    /// Returns `None` when no template matches.
    pub fn strip_once<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|re| re.find(text))
            .map(|m| &text[m.end()..])
    }

    /// Strip templates repeatedly until none matches.
    pub fn strip_all<'t>(&self, mut text: &'t str) -> &'t str {
        while let Some(rest) = self.strip_once(text) {
            if rest.len() == text.len() {
                break;
            }
            text = rest;
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_version_is_pinned() {
        assert_eq!(PHRASE_TABLE_VERSION, 1);
        assert_eq!(NOT_FOUND_SENTINEL, "Not Found");
    }

    #[test]
    fn canonical_and_legacy_markers_resolve() {
        assert_eq!(
            error_marker_kind("Error_API_Call_Failed"),
            Some(ErrorKind::OracleCallFailed)
        );
        assert_eq!(
            error_marker_kind(" Error_OpenAI_Client_Not_Initialized "),
            Some(ErrorKind::OracleUnavailable)
        );
        assert_eq!(
            error_marker_kind("Error_Unexpected_API"),
            Some(ErrorKind::Unexpected)
        );
        assert_eq!(
            error_marker_kind("Founders_Not_Yet_Looked_Up"),
            Some(ErrorKind::Unexpected)
        );
        assert_eq!(error_marker_kind("error_api_call_failed"), None);
        assert_eq!(error_marker_kind("Jane Doe"), None);
    }

    #[test]
    fn not_found_phrases_match_case_insensitively() {
        assert!(reads_as_not_found(""));
        assert!(reads_as_not_found("   "));
        assert!(reads_as_not_found("Not Found"));
        assert!(reads_as_not_found("I couldn't find any founders for that company."));
        assert!(reads_as_not_found("I do not have access to real-time data."));
        assert!(reads_as_not_found("N/A"));
        assert!(reads_as_not_found(" none "));
        assert!(!reads_as_not_found("Jane Doe, John Smith"));
        assert!(!reads_as_not_found("None of the above, Jane Doe"));
    }

    #[test]
    fn stoplist_matches_whole_words_only() {
        assert!(contains_stopword("Acme Holdings Group"));
        assert!(contains_stopword("Globex Inc"));
        assert!(contains_stopword("Initech GmbH"));
        assert!(contains_stopword("various investors"));
        assert!(!contains_stopword("Vincent Corpuz"));
        assert!(!contains_stopword("Grace Hopper"));
    }

    #[test]
    fn lead_in_company_specific_variant_wins() {
        let lead_ins = LeadIns::for_company("Acme");
        assert_eq!(
            lead_ins.strip_once("The founders of Acme are Jane Doe"),
            Some("Jane Doe")
        );
        assert_eq!(
            lead_ins.strip_once("Acme's founder is Jane Doe"),
            Some("Jane Doe")
        );
        assert_eq!(
            lead_ins.strip_once("the founder of the company 'Acme' is: Jane Doe"),
            Some("Jane Doe")
        );
        assert_eq!(lead_ins.strip_once("Jane Doe"), None);
    }

    #[test]
    fn lead_in_company_name_is_escaped() {
        let lead_ins = LeadIns::for_company("C++ Labs (EU)");
        assert_eq!(
            lead_ins.strip_once("The founders of C++ Labs (EU) are Ada Park"),
            Some("Ada Park")
        );
    }

    #[test]
    fn lead_in_strip_all_removes_residual_prefixes() {
        let lead_ins = LeadIns::for_company("Globex");
        assert_eq!(
            lead_ins.strip_all("Founders: Founded by Hank Scorpio"),
            "Hank Scorpio"
        );
        assert_eq!(
            lead_ins.strip_all("Key figures associated with the founding include Hank Scorpio"),
            "Hank Scorpio"
        );
    }

    #[test]
    fn oversized_company_keeps_generic_templates() {
        let company = "x".repeat(300_000);
        let lead_ins = LeadIns::for_company(&company);
        assert_eq!(lead_ins.strip_once("Founded by Ada Park"), Some("Ada Park"));
        assert_eq!(lead_ins.strip_once("Founders: Ada Park"), Some("Ada Park"));
    }

    #[test]
    fn blank_company_skips_company_templates() {
        let lead_ins = LeadIns::for_company("  ");
        assert_eq!(lead_ins.strip_once("Co-founded by Ada Park"), Some("Ada Park"));
    }
}
