mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{get_applied_versions, run_migrations, Migration};
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use crate::error::{CoreError, Result};
use crate::models::{PublicationRecord, PublicationStats, StoredPublication};

use super::queries::PublicationStatsQuery;
use super::repositories::{PublicationRepository, Repository, SqlitePublicationRepository};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }

    /// Round-trips a trivial query; used by the liveness check.
    pub fn ping(&self) -> Result<()> {
        let conn = self.pool.get_connection();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    pub fn schema_versions(&self) -> Result<Vec<u32>> {
        let conn = self.pool.get_connection();
        get_applied_versions(&conn)
    }

    pub fn insert_publication(&self, record: &PublicationRecord) -> Result<i64> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.insert(record)
    }

    pub fn publication_exists(&self, external_id: &str) -> Result<bool> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.exists_by_external_id(external_id)
    }

    pub fn get_publication(&self, id: i64) -> Result<StoredPublication> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.find_by_id(&id)?
            .ok_or_else(|| CoreError::PublicationNotFound(id.to_string()))
    }

    pub fn find_by_external_id(&self, external_id: &str) -> Result<Option<StoredPublication>> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.find_by_external_id(external_id)
    }

    pub fn list_publications(&self, limit: usize, offset: usize) -> Result<Vec<StoredPublication>> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.list(limit, offset)
    }

    pub fn count_publications(&self) -> Result<usize> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        repo.count()
    }

    pub fn soft_delete_publication(&self, id: i64) -> Result<()> {
        let conn = self.pool.get_connection();
        let repo = SqlitePublicationRepository::new(conn);
        if !repo.delete(&id)? {
            return Err(CoreError::PublicationNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn stats(&self) -> Result<PublicationStats> {
        let conn = self.pool.get_connection();
        let query = PublicationStatsQuery::new(conn);
        query.get_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PublicationStore;
    use tempfile::TempDir;

    fn record(external_id: &str, year: Option<i32>, citations: u32, pdf: bool) -> PublicationRecord {
        PublicationRecord {
            publication_year: year,
            citation_count: citations,
            pdf_url: pdf.then(|| format!("https://example.org/{external_id}.pdf")),
            ..PublicationRecord::new(external_id, format!("Title {external_id}"))
        }
    }

    #[test]
    fn test_open_on_disk_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scholarfeed.db");
        let db = Database::open(&path).unwrap();
        db.ping().unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.to_string_lossy().as_ref()));
        assert_eq!(Database::open_in_memory().unwrap().path(), None);
        assert_eq!(db.schema_versions().unwrap(), vec![1, 2]);

        let id = db.insert_publication(&record("disk", None, 0, false)).unwrap();
        drop(db);

        let reopened = Database::open(&path).unwrap();
        assert_eq!(reopened.get_publication(id).unwrap().record.external_id, "disk");
    }

    #[test]
    fn test_store_trait_dedupes_by_external_id() {
        let db = Database::open_in_memory().unwrap();
        let store: &dyn PublicationStore = &db;

        assert!(!store.exists_by_external_id("x1").unwrap());
        store.insert(&record("x1", Some(2020), 3, true)).unwrap();
        assert!(store.exists_by_external_id("x1").unwrap());
        assert!(store.insert(&record("x1", Some(2020), 3, true)).unwrap_err().is_duplicate());
    }

    #[test]
    fn test_soft_delete_and_not_found() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert_publication(&record("del", None, 0, false)).unwrap();

        db.soft_delete_publication(id).unwrap();
        assert!(matches!(db.get_publication(id), Err(CoreError::PublicationNotFound(_))));
        assert!(matches!(
            db.soft_delete_publication(id),
            Err(CoreError::PublicationNotFound(_))
        ));
        assert!(db.find_by_external_id("del").unwrap().is_none());
    }

    #[test]
    fn test_stats_exclude_deleted_rows() {
        let db = Database::open_in_memory().unwrap();
        db.insert_publication(&record("a", Some(1998), 10, true)).unwrap();
        db.insert_publication(&record("b", Some(2021), 5, false)).unwrap();
        db.insert_publication(&record("c", None, 0, true)).unwrap();
        let gone = db.insert_publication(&record("d", Some(1950), 100, true)).unwrap();
        db.soft_delete_publication(gone).unwrap();

        let stats = db.stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.with_pdf, 2);
        assert_eq!(stats.with_year, 2);
        assert_eq!(stats.total_citations, 15);
        assert_eq!(stats.oldest_year, Some(1998));
        assert_eq!(stats.newest_year, Some(2021));
        assert_eq!(db.count_publications().unwrap(), 3);
    }

    #[test]
    fn test_stats_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let stats = db.stats().unwrap();
        assert_eq!(stats, PublicationStats::default());
    }
}
