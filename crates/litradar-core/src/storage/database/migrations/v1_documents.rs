use rusqlite::Connection;

use super::Migration;
use crate::error::Result;
use crate::storage::database::schema;

pub struct V1Documents;

impl Migration for V1Documents {
    fn version(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Versioned documents table for the shortlist and dismissed records"
    }

    fn up(&self, conn: &Connection) -> Result<()> {
        schema::create_tables(conn)?;
        schema::create_indexes(conn)?;
        Ok(())
    }
}
