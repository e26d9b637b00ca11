use rusqlite::Connection;
use std::sync::MutexGuard;

use crate::error::Result;
use crate::models::PublicationStats;

pub struct PublicationStatsQuery<'a> {
    conn: MutexGuard<'a, Connection>,
}

impl<'a> PublicationStatsQuery<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn count_where(&self, predicate: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM publications WHERE {predicate}");
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_stats(&self) -> Result<PublicationStats> {
        let total = self.count_where("deleted_at IS NULL")?;
        let deleted = self.count_where("deleted_at IS NOT NULL")?;
        let with_pdf = self.count_where("deleted_at IS NULL AND pdf_url IS NOT NULL")?;
        let with_year = self.count_where("deleted_at IS NULL AND publication_year IS NOT NULL")?;

        let (total_citations, oldest_year, newest_year): (i64, Option<i32>, Option<i32>) =
            self.conn.query_row(
                "SELECT COALESCE(SUM(citation_count), 0), MIN(publication_year), MAX(publication_year)
                 FROM publications WHERE deleted_at IS NULL",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )?;

        Ok(PublicationStats {
            total,
            deleted,
            with_pdf,
            with_year,
            total_citations: u64::try_from(total_citations).unwrap_or_default(),
            oldest_year,
            newest_year,
        })
    }
}
