use serde::{Deserialize, Serialize};

/// Aggregate counts over the publications table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationStats {
    /// Non-deleted rows.
    pub total: usize,
    pub deleted: usize,
    pub with_pdf: usize,
    pub with_year: usize,
    pub total_citations: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oldest_year: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub newest_year: Option<i32>,
}
