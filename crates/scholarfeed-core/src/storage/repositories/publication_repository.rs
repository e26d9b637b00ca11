use std::sync::MutexGuard;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, params};

use crate::error::{CoreError, Result};
use crate::models::{PublicationRecord, StoredPublication};

use super::Repository;

pub trait PublicationRepository: Repository<Entity = StoredPublication, Id = i64> {
    fn insert(&self, record: &PublicationRecord) -> Result<i64>;
    fn exists_by_external_id(&self, external_id: &str) -> Result<bool>;
    fn find_by_external_id(&self, external_id: &str) -> Result<Option<StoredPublication>>;
    fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredPublication>>;
    fn count(&self) -> Result<usize>;
}

const SELECT_COLUMNS: &str = "SELECT id, external_id, title, authors, publication_year, journal,
        publisher, abstract, article_url, pdf_url, citation_count, cites_id,
        cluster_id, created_at, updated_at, deleted_at
     FROM publications";

pub struct SqlitePublicationRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> SqlitePublicationRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_publication(row: &rusqlite::Row) -> rusqlite::Result<StoredPublication> {
        let citation_count: i64 = row.get(10)?;
        let deleted_at: Option<String> = row.get(15)?;

        Ok(StoredPublication {
            id: row.get(0)?,
            record: PublicationRecord {
                external_id: row.get(1)?,
                title: row.get(2)?,
                authors_text: row.get(3)?,
                publication_year: row.get(4)?,
                journal: row.get(5)?,
                publisher: row.get(6)?,
                abstract_text: row.get(7)?,
                article_url: row.get(8)?,
                pdf_url: row.get(9)?,
                citation_count: u32::try_from(citation_count).unwrap_or_default(),
                cites_id: row.get(11)?,
                cluster_id: row.get(12)?,
            },
            created_at: parse_timestamp(13, &row.get::<_, String>(13)?)?,
            updated_at: parse_timestamp(14, &row.get::<_, String>(14)?)?,
            deleted_at: deleted_at
                .map(|ts| parse_timestamp(15, &ts))
                .transpose()?,
        })
    }
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl<'a> Repository for SqlitePublicationRepository<'a> {
    type Entity = StoredPublication;
    type Id = i64;

    fn find_by_id(&self, id: &Self::Id) -> Result<Option<Self::Entity>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1 AND deleted_at IS NULL");
        let publication = self
            .conn
            .query_row(&sql, params![id], Self::row_to_publication)
            .optional()?;
        Ok(publication)
    }

    /// Soft delete: stamps `deleted_at`, the row stays in the table.
    fn delete(&self, id: &Self::Id) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE publications SET deleted_at = ?1, updated_at = ?1
             WHERE id = ?2 AND deleted_at IS NULL",
            params![now, id],
        )?;
        Ok(updated > 0)
    }
}

impl<'a> PublicationRepository for SqlitePublicationRepository<'a> {
    fn insert(&self, record: &PublicationRecord) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        let result = self.conn.execute(
            "INSERT INTO publications
                (external_id, title, authors, publication_year, journal, publisher,
                 abstract, article_url, pdf_url, citation_count, cites_id, cluster_id,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
            params![
                record.external_id,
                record.title,
                record.authors_text,
                record.publication_year,
                record.journal,
                record.publisher,
                record.abstract_text,
                record.article_url,
                record.pdf_url,
                i64::from(record.citation_count),
                record.cites_id,
                record.cluster_id,
                now,
            ],
        );

        match result {
            Ok(_) => Ok(self.conn.last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => {
                Err(CoreError::DuplicatePublication(record.external_id.clone()))
            }
            Err(e) => Err(CoreError::Database(e)),
        }
    }

    fn exists_by_external_id(&self, external_id: &str) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM publications WHERE external_id = ?1 AND deleted_at IS NULL")?
            .exists(params![external_id])?;
        Ok(exists)
    }

    fn find_by_external_id(&self, external_id: &str) -> Result<Option<StoredPublication>> {
        let sql = format!("{SELECT_COLUMNS} WHERE external_id = ?1 AND deleted_at IS NULL");
        let publication = self
            .conn
            .query_row(&sql, params![external_id], Self::row_to_publication)
            .optional()?;
        Ok(publication)
    }

    fn list(&self, limit: usize, offset: usize) -> Result<Vec<StoredPublication>> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE deleted_at IS NULL ORDER BY id DESC LIMIT ?1 OFFSET ?2"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_publication)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM publications WHERE deleted_at IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
