pub mod database;
pub mod queries;
pub mod repositories;

use crate::error::Result;
use crate::models::PublicationRecord;

/// The write path the harvest pipeline depends on.
///
/// `insert` must report a uniqueness violation on `external_id` as
/// [`CoreError::DuplicatePublication`](crate::error::CoreError::DuplicatePublication),
/// even after `exists_by_external_id` returned `false`.
pub trait PublicationStore: Send + Sync {
    fn exists_by_external_id(&self, external_id: &str) -> Result<bool>;
    fn insert(&self, record: &PublicationRecord) -> Result<i64>;
}

impl PublicationStore for database::Database {
    fn exists_by_external_id(&self, external_id: &str) -> Result<bool> {
        self.publication_exists(external_id)
    }

    fn insert(&self, record: &PublicationRecord) -> Result<i64> {
        self.insert_publication(record)
    }
}
