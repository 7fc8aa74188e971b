//! Response classification: usable text, "not found", or a persisted error.

use founderlookup_shared::ErrorKind;

use crate::phrases;

/// How a raw oracle/search response should be treated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Text worth normalizing (trimmed).
    Usable(String),
    /// Empty, or an explicit "no founder" answer.
    NotFound,
    /// One of the error markers.
    Error(ErrorKind),
}

/// Classify a raw response.
///
/// Error markers are matched exactly (after trimming) before the not-found
/// phrase detection that [`crate::normalize`] also applies on its own.
pub fn classify(raw: &str) -> Classification {
    if let Some(kind) = phrases::error_marker_kind(raw) {
        return Classification::Error(kind);
    }
    if phrases::reads_as_not_found(raw) {
        return Classification::NotFound;
    }
    Classification::Usable(raw.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_markers_classify_as_errors() {
        for kind in ErrorKind::ALL {
            assert_eq!(classify(kind.marker()), Classification::Error(kind));
        }
        assert_eq!(
            classify("Founders_Not_Yet_Looked_Up"),
            Classification::Error(ErrorKind::Unexpected)
        );
    }

    #[test]
    fn not_found_answers() {
        assert_eq!(classify(""), Classification::NotFound);
        assert_eq!(classify("Not Found"), Classification::NotFound);
        assert_eq!(
            classify("I'm sorry, I couldn't find information on that company."),
            Classification::NotFound
        );
        assert_eq!(
            classify("The organization does not have clearly defined founders."),
            Classification::NotFound
        );
    }

    #[test]
    fn usable_text_is_trimmed() {
        assert_eq!(
            classify("  Jane Doe and John Smith\n"),
            Classification::Usable("Jane Doe and John Smith".into())
        );
    }

    #[test]
    fn marker_inside_longer_text_is_not_an_error() {
        assert!(matches!(
            classify("Error_API_Call_Failed, Jane Doe"),
            Classification::Usable(_)
        ));
    }
}
