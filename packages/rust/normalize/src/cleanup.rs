//! Text passes that turn an oracle answer into candidate names.
//!
//! Text-level passes are `&str -> String` functions applied in sequence by
//! [`crate::normalize`]; candidate-level cleanup runs to a fixpoint so that
//! normalizing already-normalized output changes nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::phrases::{self, LeadIns, MAX_NAME_WORDS};

// ---------------------------------------------------------------------------
// Text-level passes
// ---------------------------------------------------------------------------

/// Remove parenthetical asides, innermost first.
pub(crate) fn strip_parentheticals(text: &str) -> String {
    static PAREN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\([^()]*\)").expect("valid regex"));

    let mut result = text.to_string();
    while PAREN_RE.is_match(&result) {
        result = PAREN_RE.replace_all(&result, " ").into_owned();
    }
    result
}

/// Turn whitespace-delimited `and` / `&` into a comma separator.
pub(crate) fn split_conjunctions(text: &str) -> String {
    static CONJ_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s+(?:and|&)\s+").expect("valid regex"));

    CONJ_RE.replace_all(text, ", ").into_owned()
}

/// Replace semicolons, bullets, list numbering, and line breaks with commas.
pub(crate) fn unify_separators(text: &str) -> String {
    static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
        // "- Jane", "* Jane", "1. Jane", "2) Jane" at the start of a line
        Regex::new(r"(?m)^[ \t]*(?:[-*]|\d+[.)])[ \t]+").expect("valid regex")
    });
    static SEPARATOR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[;•·●▪\r\n]+").expect("valid regex"));

    let without_markers = LIST_MARKER_RE.replace_all(text, ",");
    SEPARATOR_RE.replace_all(&without_markers, ",").into_owned()
}

/// Split on commas, trim, and drop empty or single-character tokens.
pub(crate) fn split_candidates(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| token.chars().count() > 1)
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Candidate-level cleanup
// ---------------------------------------------------------------------------

/// Clean one candidate until it stops changing.
pub(crate) fn clean_candidate(candidate: &str, lead_ins: &LeadIns) -> String {
    let mut current = candidate.trim().to_string();
    loop {
        let next = clean_step(&current, lead_ins);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// A single cleanup step. Every operation only removes text.
fn clean_step(candidate: &str, lead_ins: &LeadIns) -> String {
    // "1. Jane", "2) Jane"
    static NUMBERING_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d+[.)]\s+").expect("valid regex"));
    // "Jane Doe in 2001"
    static FOUNDING_YEAR_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)\s+in\s+\d{4}$").expect("valid regex"));

    let collapsed = strip_parentheticals(candidate)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let mut s = collapsed.trim_start_matches(['-', '*', '•', '·']).trim_start();
    if let Some(m) = NUMBERING_RE.find(s) {
        s = &s[m.end()..];
    }
    s = strip_wrapping_quotes(s).trim_end_matches('.').trim();

    if let Some(stripped) = s.strip_suffix("'s").or_else(|| s.strip_suffix("’s")) {
        s = stripped.trim_end();
    }
    if let Some(m) = FOUNDING_YEAR_RE.find(s) {
        s = &s[..m.start()];
    }

    lead_ins.strip_once(s).unwrap_or(s).trim().to_string()
}

/// Drop stray double quotes at either end, and single quotes only when they
/// wrap the whole candidate so apostrophes inside names survive.
fn strip_wrapping_quotes(candidate: &str) -> &str {
    let s = candidate.trim_matches(['"', '“', '”']).trim();
    let mut chars = s.chars();
    match (chars.next(), chars.next_back()) {
        (Some('\'' | '‘'), Some('\'' | '’')) => chars.as_str().trim(),
        _ => s,
    }
}

// ---------------------------------------------------------------------------
// Filtering and dedup
// ---------------------------------------------------------------------------

/// Whether a cleaned candidate can stand for a person name of `company`.
pub(crate) fn is_plausible(candidate: &str, company: &str) -> bool {
    if candidate.chars().count() < 2 {
        return false;
    }
    if candidate.to_lowercase() == company.trim().to_lowercase() {
        return false;
    }
    if candidate.split_whitespace().count() > MAX_NAME_WORDS {
        return false;
    }
    if phrases::contains_stopword(candidate) {
        return false;
    }
    // An answer fragment such as "unknown" or a marker is not a name.
    !phrases::reads_as_not_found(candidate) && phrases::error_marker_kind(candidate).is_none()
}

/// Drop repeated names, keeping first-seen order. Comparison is exact.
pub(crate) fn dedup_preserving_order(names: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect()
}
