use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod serpapi;

/// One page of raw result items, exactly as the search API returned them.
#[derive(Debug, Clone, Default)]
pub struct RawSearchResult {
    pub items: Vec<Value>,
    pub search_id: Option<String>,
}

impl RawSearchResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// A scholarly search backend.
///
/// Every call fetches a single fixed page and never retries. Failures are
/// either transport-level ([`ScienceError::is_transport`](crate::ScienceError::is_transport))
/// or reported by the remote API ([`ScienceError::is_remote`](crate::ScienceError::is_remote)).
#[async_trait]
pub trait ScholarSearch: Send + Sync {
    fn name(&self) -> &str;

    /// Items authored by `author`, using the backend's own author-search syntax.
    async fn search_by_author(&self, author: &str) -> Result<RawSearchResult>;

    /// Items citing the work identified by `cites_id`.
    async fn get_cited_by(&self, cites_id: &str) -> Result<RawSearchResult>;

    /// All versions of the work identified by `cluster_id`.
    async fn get_all_versions(&self, cluster_id: &str) -> Result<RawSearchResult>;

    /// Whether the backend has the credentials it needs.
    fn is_configured(&self) -> bool;
}
