//! Core domain types for FounderLookup.

use uuid::Uuid;

/// Canonical sentinel persisted when no founder could be determined.
pub const NOT_FOUND_SENTINEL: &str = "Not Found";

/// Name of the column appended to every output row.
pub const FOUNDERS_COLUMN: &str = "Founders";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one batch session (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Origin of a failed lookup. Each kind persists as one canonical marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The completion call was made and failed.
    OracleCallFailed,
    /// The oracle could not be reached or was never configured.
    OracleUnavailable,
    /// Anything else (malformed response, internal failure).
    Unexpected,
}

impl ErrorKind {
    /// Every kind, in marker-table order.
    pub const ALL: [ErrorKind; 3] = [
        Self::OracleCallFailed,
        Self::OracleUnavailable,
        Self::Unexpected,
    ];

    /// The marker string written to the Founders column.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::OracleCallFailed => "Error_API_Call_Failed",
            Self::OracleUnavailable => "Error_OpenAI_Client_Not_Initialized",
            Self::Unexpected => "Error_Unexpected_API",
        }
    }

    /// Short slug for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OracleCallFailed => "oracle-call-failed",
            Self::OracleUnavailable => "oracle-unavailable",
            Self::Unexpected => "unexpected",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FounderResult
// ---------------------------------------------------------------------------

/// Outcome of a founder lookup for one company.
///
/// `Display` renders the value persisted in the Founders column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FounderResult {
    /// No founder could be determined.
    NotFound,
    /// The lookup failed; the marker keeps the row visible for reprocessing.
    Error(ErrorKind),
    /// Distinct plausible names, in first-seen order. Never empty.
    Names(Vec<String>),
}

impl FounderResult {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The extracted names, or an empty slice for the other variants.
    pub fn names(&self) -> &[String] {
        match self {
            Self::Names(names) => names,
            _ => &[],
        }
    }

    /// Short outcome label for logs and summaries.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::Error(_) => "error",
            Self::Names(_) => "names",
        }
    }
}

impl std::fmt::Display for FounderResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str(NOT_FOUND_SENTINEL),
            Self::Error(kind) => f.write_str(kind.marker()),
            Self::Names(names) => f.write_str(&names.join(", ")),
        }
    }
}

// ---------------------------------------------------------------------------
// CompanyRecord
// ---------------------------------------------------------------------------

/// One row of tabular input: ordered column name → value pairs.
///
/// Header names are stored trimmed; values are kept verbatim so that every
/// non-founder field passes through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyRecord {
    fields: Vec<(String, String)>,
}

impl CompanyRecord {
    /// Zip headers with values. Missing trailing values become empty strings.
    pub fn new<H, V>(headers: &[H], values: &[V]) -> Self
    where
        H: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let value = values.get(i).map(|v| v.as_ref()).unwrap_or_default();
                (h.as_ref().trim().to_string(), value.to_string())
            })
            .collect();
        Self { fields }
    }

    /// Value of `column`, if the record has that column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Identity key: the trimmed value of `column`, or `None` when blank.
    pub fn key(&self, column: &str) -> Option<&str> {
        self.get(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Values for the given columns in order; absent columns yield `""`.
    pub fn project<'a>(&'a self, columns: &'a [String]) -> impl Iterator<Item = &'a str> + 'a {
        columns.iter().map(|c| self.get(c).unwrap_or_default())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_is_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }

    #[test]
    fn founder_result_renders_for_persistence() {
        assert_eq!(FounderResult::NotFound.to_string(), "Not Found");
        assert_eq!(
            FounderResult::Error(ErrorKind::OracleCallFailed).to_string(),
            "Error_API_Call_Failed"
        );
        let names = FounderResult::Names(vec!["Jane Doe".into(), "John Smith".into()]);
        assert_eq!(names.to_string(), "Jane Doe, John Smith");
        assert_eq!(names.names().len(), 2);
        assert!(FounderResult::NotFound.names().is_empty());
    }

    #[test]
    fn error_kind_markers_are_distinct() {
        let markers: std::collections::HashSet<_> =
            ErrorKind::ALL.iter().map(|k| k.marker()).collect();
        assert_eq!(markers.len(), ErrorKind::ALL.len());
    }

    #[test]
    fn company_record_trims_headers_and_keys() {
        let record = CompanyRecord::new(&[" Company ", "Country"], &["  Acme ", "US"]);
        assert_eq!(record.get("Company"), Some("  Acme "));
        assert_eq!(record.key("Company"), Some("Acme"));
        assert_eq!(record.get("Country"), Some("US"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn company_record_blank_key_is_none() {
        let record = CompanyRecord::new(&["Company", "Country"], &["   "]);
        assert_eq!(record.key("Company"), None);
        assert_eq!(record.get("Country"), Some(""));
    }

    #[test]
    fn company_record_projection_fills_missing_columns() {
        let record = CompanyRecord::new(&["Company", "Country"], &["Acme", "US"]);
        let columns = vec!["Country".to_string(), "Valuation".to_string()];
        let projected: Vec<&str> = record.project(&columns).collect();
        assert_eq!(projected, vec!["US", ""]);
    }
}
