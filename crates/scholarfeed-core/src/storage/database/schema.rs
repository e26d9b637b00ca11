use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS publications (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id      TEXT NOT NULL,
            title            TEXT NOT NULL,
            authors          TEXT,
            publication_year INTEGER CHECK(publication_year IS NULL OR publication_year BETWEEN 1900 AND 2099),
            journal          TEXT,
            publisher        TEXT,
            abstract         TEXT,
            article_url      TEXT,
            pdf_url          TEXT,
            citation_count   INTEGER NOT NULL DEFAULT 0 CHECK(citation_count >= 0),
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            deleted_at       TEXT
        );
        ",
    )?;
    Ok(())
}

/// External ids are unique among live rows only, so a soft-deleted record can be harvested again.
pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE UNIQUE INDEX IF NOT EXISTS idx_publications_external_id
            ON publications(external_id) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_publications_year       ON publications(publication_year);
        CREATE INDEX IF NOT EXISTS idx_publications_deleted_at ON publications(deleted_at);
        ",
    )?;
    Ok(())
}
