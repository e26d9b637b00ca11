use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Years accepted for `publication_year`; matches the `19xx`/`20xx` tokens the parser extracts.
pub const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1900..=2099;

/// A normalized publication as produced from one search-result item.
///
/// Text fields hold raw source text until [`PublicationRecord::sanitized`] is
/// applied right before persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub external_id: String,
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,

    #[serde(default)]
    pub citation_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cites_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

impl PublicationRecord {
    pub fn new(external_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// A record is valid iff both `title` and `external_id` are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.external_id.trim().is_empty()
    }

    /// Collapses whitespace in every free-text field, drops fields that become
    /// empty, and clears a year outside [`PLAUSIBLE_YEARS`].
    pub fn sanitized(&self) -> Self {
        Self {
            external_id: self.external_id.trim().to_string(),
            title: sanitize_text(&self.title),
            authors_text: sanitize_opt(self.authors_text.as_deref()),
            publication_year: self
                .publication_year
                .filter(|year| PLAUSIBLE_YEARS.contains(year)),
            journal: sanitize_opt(self.journal.as_deref()),
            publisher: sanitize_opt(self.publisher.as_deref()),
            abstract_text: sanitize_opt(self.abstract_text.as_deref()),
            article_url: sanitize_opt(self.article_url.as_deref()),
            pdf_url: sanitize_opt(self.pdf_url.as_deref()),
            citation_count: self.citation_count,
            cites_id: sanitize_opt(self.cites_id.as_deref()),
            cluster_id: sanitize_opt(self.cluster_id.as_deref()),
        }
    }
}

/// Collapses every whitespace run to a single space and trims both ends.
pub fn sanitize_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn sanitize_opt(input: Option<&str>) -> Option<String> {
    input.map(sanitize_text).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_collapses_whitespace() {
        assert_eq!(sanitize_text("  Deep\n\tlearning   for  graphs "), "Deep learning for graphs");
        assert_eq!(sanitize_text("   "), "");
        assert_eq!(sanitize_text("plain"), "plain");
    }

    #[test]
    fn test_is_valid_requires_title_and_external_id() {
        assert!(PublicationRecord::new("abc123", "A title").is_valid());
        assert!(!PublicationRecord::new("", "A title").is_valid());
        assert!(!PublicationRecord::new("abc123", "").is_valid());
        assert!(!PublicationRecord::new("abc123", "   ").is_valid());
        assert!(!PublicationRecord::default().is_valid());
    }

    #[test]
    fn test_sanitized_cleans_all_text_fields() {
        let record = PublicationRecord {
            authors_text: Some(" A  Author,\nB Author ".into()),
            journal: Some("   ".into()),
            publisher: Some("springer.com ".into()),
            abstract_text: Some("First\n\nsecond".into()),
            publication_year: Some(2021),
            citation_count: 7,
            ..PublicationRecord::new(" id-1 ", "  Graph   Networks ")
        };

        let clean = record.sanitized();
        assert_eq!(clean.external_id, "id-1");
        assert_eq!(clean.title, "Graph Networks");
        assert_eq!(clean.authors_text.as_deref(), Some("A Author, B Author"));
        assert_eq!(clean.journal, None);
        assert_eq!(clean.publisher.as_deref(), Some("springer.com"));
        assert_eq!(clean.abstract_text.as_deref(), Some("First second"));
        assert_eq!(clean.publication_year, Some(2021));
        assert_eq!(clean.citation_count, 7);

        // The source record keeps its raw text.
        assert_eq!(record.title, "  Graph   Networks ");
    }

    #[test]
    fn test_sanitized_drops_implausible_year() {
        let mut record = PublicationRecord::new("x", "t");
        record.publication_year = Some(1066);
        assert_eq!(record.sanitized().publication_year, None);
        record.publication_year = Some(1999);
        assert_eq!(record.sanitized().publication_year, Some(1999));
    }
}
