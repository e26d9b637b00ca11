use scholarfeed_core::SavedPublicationRef;
use serde::{Deserialize, Serialize};

/// Per-author portion of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub author: String,
    pub fetched: usize,
    pub saved: usize,
    pub already_exists: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub saved_records: Vec<SavedPublicationRef>,
}

impl AuthorSummary {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..Default::default()
        }
    }

    pub fn failed(author: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(author)
        }
    }
}

/// Result of one harvest invocation. Built in memory, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_fetched: usize,
    pub total_saved: usize,
    pub total_already_exists: usize,
    pub authors: Vec<AuthorSummary>,
    pub saved_records: Vec<SavedPublicationRef>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl RunSummary {
    /// Folds a finished author into the run-level counters.
    pub fn push(&mut self, author: AuthorSummary) {
        self.total_fetched += author.fetched;
        self.total_saved += author.saved;
        self.total_already_exists += author.already_exists;
        self.saved_records.extend(author.saved_records.iter().cloned());
        self.authors.push(author);
    }

    pub fn failed_authors(&self) -> impl Iterator<Item = &AuthorSummary> {
        self.authors.iter().filter(|a| a.error.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_accumulates_totals_and_flat_saved_list() {
        let mut run = RunSummary::default();

        let mut first = AuthorSummary::new("A");
        first.fetched = 10;
        first.saved = 2;
        first.already_exists = 1;
        first.saved_records = vec![
            SavedPublicationRef { id: 1, external_id: "x".into(), title: "X".into(), citation_count: 3 },
            SavedPublicationRef { id: 2, external_id: "y".into(), title: "Y".into(), citation_count: 0 },
        ];
        run.push(first);
        run.push(AuthorSummary::failed("B", "boom"));

        assert_eq!(run.total_fetched, 10);
        assert_eq!(run.total_saved, 2);
        assert_eq!(run.total_already_exists, 1);
        assert_eq!(run.saved_records.len(), 2);
        assert_eq!(run.authors.len(), 2);
        assert_eq!(run.failed_authors().count(), 1);
    }

    #[test]
    fn serialized_shape() {
        let mut run = RunSummary::default();
        run.push(AuthorSummary::failed("B", "No articles found"));
        let json = serde_json::to_value(&run).unwrap();

        assert_eq!(json["total_saved"], 0);
        assert_eq!(json["authors"][0]["error"], "No articles found");
        assert!(json["saved_records"].as_array().unwrap().is_empty());
        assert!(json.get("cancelled").is_none());
    }
}
