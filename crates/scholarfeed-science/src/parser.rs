use once_cell::sync::Lazy;
use regex::Regex;
use scholarfeed_core::PublicationRecord;
use serde_json::Value;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));
static YEAR_WITH_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",?\s*\b(19|20)\d{2}\b").expect("valid regex"));

const SUMMARY_SEPARATOR: &str = " - ";

/// Fields derived from the free-text `publication_info.summary`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryParts {
    pub authors: Option<String>,
    pub journal: Option<String>,
    pub year: Option<i32>,
    pub publisher: Option<String>,
}

/// Turns one raw search-result item into a [`PublicationRecord`].
///
/// Parsing is best-effort and never fails: missing or malformed fields
/// simply stay empty. Validity is decided later by [`crate::filter_valid`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, item: &Value) -> PublicationRecord {
        let summary = item
            .get("publication_info")
            .and_then(|info| info.get("summary"))
            .and_then(Value::as_str)
            .map(split_summary)
            .unwrap_or_default();

        let inline_links = item.get("inline_links");
        let cited_by = inline_links.and_then(|links| links.get("cited_by"));

        PublicationRecord {
            external_id: str_field(item, "result_id").unwrap_or_default(),
            title: str_field(item, "title").unwrap_or_default(),
            authors_text: summary.authors,
            publication_year: summary.year,
            journal: summary.journal,
            publisher: summary.publisher,
            abstract_text: str_field(item, "snippet"),
            article_url: str_field(item, "link"),
            pdf_url: extract_pdf_url(item),
            citation_count: cited_by
                .and_then(|c| c.get("total"))
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            cites_id: cited_by.and_then(|c| id_field(c, "cites_id")),
            cluster_id: inline_links
                .and_then(|links| links.get("versions"))
                .and_then(|v| id_field(v, "cluster_id")),
        }
    }

    pub fn parse_all(&self, items: &[Value]) -> Vec<PublicationRecord> {
        items.iter().map(|item| self.parse(item)).collect()
    }
}

/// Splits `"Authors - Journal, 2019 - publisher"` into its parts.
///
/// At most three segments are taken; the year is the first `19xx`/`20xx`
/// token of the second segment and is removed (with a leading comma) to
/// leave the journal.
pub fn split_summary(summary: &str) -> SummaryParts {
    if summary.trim().is_empty() {
        return SummaryParts::default();
    }

    let mut segments = summary.splitn(3, SUMMARY_SEPARATOR);
    let authors = segments.next().and_then(non_empty);

    let (journal, year) = match segments.next() {
        Some(segment) => match YEAR_RE.find(segment) {
            Some(m) => {
                let year = m.as_str().parse::<i32>().ok();
                let journal = YEAR_WITH_SEPARATOR_RE.replace(segment, "");
                (non_empty(&journal), year)
            }
            None => (non_empty(segment), None),
        },
        None => (None, None),
    };

    let publisher = segments.next().and_then(non_empty);

    SummaryParts {
        authors,
        journal,
        year,
        publisher,
    }
}

/// Link of the first resource whose `file_format` is `PDF`, ignoring case.
pub fn extract_pdf_url(item: &Value) -> Option<String> {
    item.get("resources")
        .and_then(Value::as_array)?
        .iter()
        .find(|resource| {
            resource
                .get("file_format")
                .and_then(Value::as_str)
                .is_some_and(|format| format.trim().eq_ignore_ascii_case("pdf"))
        })
        .and_then(|resource| str_field(resource, "link"))
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToOwned::to_owned)
}

/// Identifiers occasionally arrive as JSON numbers.
fn id_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(segment: &str) -> Option<String> {
    let trimmed = segment.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_with_all_three_parts() {
        let parts = split_summary("A - B, 1999 - C");
        assert_eq!(
            parts,
            SummaryParts {
                authors: Some("A".into()),
                journal: Some("B".into()),
                year: Some(1999),
                publisher: Some("C".into()),
            }
        );
    }

    #[test]
    fn summary_without_year_keeps_whole_segment_as_journal() {
        let parts = split_summary("J Doe, R Roe -  Proceedings of Things  - acm.org");
        assert_eq!(parts.year, None);
        assert_eq!(parts.journal.as_deref(), Some("Proceedings of Things"));
        assert_eq!(parts.authors.as_deref(), Some("J Doe, R Roe"));
        assert_eq!(parts.publisher.as_deref(), Some("acm.org"));
    }

    #[test]
    fn year_outside_19xx_20xx_is_not_a_year() {
        let parts = split_summary("A - Annals 1850 edition - C");
        assert_eq!(parts.year, None);
        assert_eq!(parts.journal.as_deref(), Some("Annals 1850 edition"));

        let parts = split_summary("A - Vol 12345 - C");
        assert_eq!(parts.year, None);
    }

    #[test]
    fn segment_that_is_only_a_year_leaves_no_journal() {
        let parts = split_summary("G Hinton - 2006 - science.org");
        assert_eq!(parts.year, Some(2006));
        assert_eq!(parts.journal, None);
    }

    #[test]
    fn only_first_year_token_is_stripped() {
        let parts = split_summary("A - Trends 2020, 2021 - C");
        assert_eq!(parts.year, Some(2020));
        assert_eq!(parts.journal.as_deref(), Some("Trends, 2021"));
    }

    #[test]
    fn summary_with_authors_only() {
        let parts = split_summary("Solo Author");
        assert_eq!(parts.authors.as_deref(), Some("Solo Author"));
        assert_eq!(parts.journal, None);
        assert_eq!(parts.year, None);
        assert_eq!(parts.publisher, None);
    }

    #[test]
    fn extra_separators_stay_in_publisher() {
        let parts = split_summary("A - B, 2001 - C - D");
        assert_eq!(parts.publisher.as_deref(), Some("C - D"));
    }

    #[test]
    fn empty_or_missing_summary_yields_no_derived_fields() {
        assert_eq!(split_summary(""), SummaryParts::default());
        assert_eq!(split_summary("   "), SummaryParts::default());

        let parser = RecordParser::new();
        for item in [
            json!({"result_id": "x", "title": "t"}),
            json!({"result_id": "x", "title": "t", "publication_info": {}}),
            json!({"result_id": "x", "title": "t", "publication_info": {"summary": 42}}),
            json!({"result_id": "x", "title": "t", "publication_info": "oops"}),
        ] {
            let record = parser.parse(&item);
            assert_eq!(record.authors_text, None);
            assert_eq!(record.journal, None);
            assert_eq!(record.publication_year, None);
            assert_eq!(record.publisher, None);
        }
    }

    #[test]
    fn parse_full_item() {
        let item = json!({
            "position": 0,
            "title": "Learning representations by back-propagating errors",
            "result_id": "abcXYZ",
            "link": "https://www.nature.com/articles/323533a0",
            "snippet": "We describe a new learning procedure ...",
            "publication_info": {
                "summary": "DE Rumelhart, GE Hinton, RJ Williams - nature, 1986 - nature.com"
            },
            "resources": [
                {"title": "stanford.edu", "file_format": "HTML", "link": "https://example.edu/page"},
                {"title": "toronto.edu", "file_format": "PDF", "link": "https://example.edu/paper.pdf"}
            ],
            "inline_links": {
                "cited_by": {"total": 31337, "cites_id": "1234567890"},
                "versions": {"total": 40, "cluster_id": "9876543210"}
            }
        });

        let record = RecordParser::new().parse(&item);
        assert_eq!(record.external_id, "abcXYZ");
        assert_eq!(record.title, "Learning representations by back-propagating errors");
        assert_eq!(record.authors_text.as_deref(), Some("DE Rumelhart, GE Hinton, RJ Williams"));
        assert_eq!(record.journal.as_deref(), Some("nature"));
        assert_eq!(record.publication_year, Some(1986));
        assert_eq!(record.publisher.as_deref(), Some("nature.com"));
        assert_eq!(record.abstract_text.as_deref(), Some("We describe a new learning procedure ..."));
        assert_eq!(record.article_url.as_deref(), Some("https://www.nature.com/articles/323533a0"));
        assert_eq!(record.pdf_url.as_deref(), Some("https://example.edu/paper.pdf"));
        assert_eq!(record.citation_count, 31337);
        assert_eq!(record.cites_id.as_deref(), Some("1234567890"));
        assert_eq!(record.cluster_id.as_deref(), Some("9876543210"));
        assert!(record.is_valid());
    }

    #[test]
    fn missing_citation_count_defaults_to_zero() {
        let parser = RecordParser::new();
        let bare = parser.parse(&json!({"result_id": "x", "title": "t"}));
        assert_eq!(bare.citation_count, 0);

        let no_total = parser.parse(&json!({
            "result_id": "x", "title": "t",
            "inline_links": {"cited_by": {"cites_id": "5"}}
        }));
        assert_eq!(no_total.citation_count, 0);
        assert_eq!(no_total.cites_id.as_deref(), Some("5"));
    }

    #[test]
    fn pdf_match_is_case_insensitive_and_order_independent() {
        let item = json!({"resources": [
            {"file_format": "HTML", "link": "https://a/html"},
            {"file_format": "Doc", "link": "https://a/doc"},
            {"file_format": "pdf", "link": "https://a/first.pdf"},
            {"file_format": "PDF", "link": "https://a/second.pdf"}
        ]});
        assert_eq!(extract_pdf_url(&item).as_deref(), Some("https://a/first.pdf"));

        let item = json!({"resources": [
            {"file_format": "Pdf", "link": "https://b/only.pdf"},
            {"file_format": "HTML", "link": "https://b/html"}
        ]});
        assert_eq!(extract_pdf_url(&item).as_deref(), Some("https://b/only.pdf"));
    }

    #[test]
    fn pdf_absent_for_empty_missing_or_malformed_resources() {
        assert_eq!(extract_pdf_url(&json!({})), None);
        assert_eq!(extract_pdf_url(&json!({"resources": []})), None);
        assert_eq!(extract_pdf_url(&json!({"resources": "nope"})), None);
        assert_eq!(
            extract_pdf_url(&json!({"resources": [{"file_format": "HTML", "link": "x"}, 7]})),
            None
        );
    }

    #[test]
    fn parser_keeps_raw_text() {
        let record = RecordParser::new().parse(&json!({
            "result_id": "x",
            "title": "  Spaced   out  title ",
        }));
        assert_eq!(record.title, "  Spaced   out  title ");
    }

    #[test]
    fn parse_never_fails_on_garbage() {
        let parser = RecordParser::new();
        let record = parser.parse(&json!(null));
        assert!(!record.is_valid());
        let record = parser.parse(&json!(["not", "an", "object"]));
        assert!(!record.is_valid());
    }
}
