use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::publication::PublicationRecord;

/// A persisted publication row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPublication {
    pub id: i64,

    #[serde(flatten)]
    pub record: PublicationRecord,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StoredPublication {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Reference to a record saved during a harvest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPublicationRef {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub citation_count: u32,
}

impl SavedPublicationRef {
    pub fn new(id: i64, record: &PublicationRecord) -> Self {
        Self {
            id,
            external_id: record.external_id.clone(),
            title: record.title.clone(),
            citation_count: record.citation_count,
        }
    }
}
