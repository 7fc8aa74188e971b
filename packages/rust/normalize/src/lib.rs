//! Founder-name normalization and response classification.
//!
//! Turns free-text oracle answers ("The founders of X are A and B.",
//! "Founded by A, B & C", "Not Found") into a [`FounderResult`]: the canonical
//! not-found sentinel or an ordered, duplicate-free list of plausible names.
//!
//! All marker knowledge lives in [`phrases`]; [`classify`] and [`normalize`]
//! only consume it.

mod classify;
mod cleanup;
pub mod phrases;

use founderlookup_shared::FounderResult;
use tracing::debug;

pub use classify::{Classification, classify};
pub use phrases::{LeadIns, NOT_FOUND_SENTINEL, PHRASE_TABLE_VERSION};

/// Normalize a raw answer about `company` into a [`FounderResult`].
///
/// Never returns [`FounderResult::Error`]: error markers read as "not found"
/// here and only [`classify`] surfaces them as errors. Idempotent on its own
/// rendered output.
pub fn normalize(raw: &str, company: &str) -> FounderResult {
    // Explicit markers
    if phrases::reads_as_not_found(raw) || phrases::error_marker_kind(raw).is_some() {
        return FounderResult::NotFound;
    }

    let lead_ins = LeadIns::for_company(company);

    let text = lead_ins.strip_all(raw.trim());
    let text = cleanup::strip_parentheticals(text);
    let text = cleanup::split_conjunctions(&text);
    let text = cleanup::unify_separators(&text);

    let candidates = cleanup::split_candidates(&text)
        .iter()
        .map(|candidate| cleanup::clean_candidate(candidate, &lead_ins))
        .filter(|candidate| cleanup::is_plausible(candidate, company))
        .collect();
    let names = cleanup::dedup_preserving_order(candidates);

    // Empty after cleaning: the answer was all boilerplate or filtered out.
    if names.is_empty() {
        debug!(company, raw, "no plausible founder names left after cleanup");
        return FounderResult::NotFound;
    }

    FounderResult::Names(names)
}
