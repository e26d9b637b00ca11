use rusqlite::Connection;

use super::Migration;
use crate::error::Result;

pub struct V2CitationIds;

impl Migration for V2CitationIds {
    fn version(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Add cites_id and cluster_id columns to publications table"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        let has_cites_id: bool = conn
            .prepare("SELECT 1 FROM pragma_table_info('publications') WHERE name='cites_id'")?
            .exists([])?;

        if !has_cites_id {
            conn.execute_batch(
                "
                ALTER TABLE publications ADD COLUMN cites_id TEXT;
                ALTER TABLE publications ADD COLUMN cluster_id TEXT;
                ",
            )?;
        }
        Ok(())
    }
}
