mod connection;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

use super::{DocumentStore, PutOutcome, StoredDocument};
use crate::error::Result;

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection()?;
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection()?;
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// SQLite-backed [`DocumentStore`]. Every collection shares one `documents`
/// table; conditional writes compare the `version` column.
pub struct SqliteDocumentStore {
    pool: ConnectionPool,
}

impl SqliteDocumentStore {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        tracing::debug!(path = %path.display(), "opened document store");
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    pub fn path(&self) -> Option<&str> {
        self.pool.path()
    }
}

fn parse_body(raw: &str) -> Result<Value> {
    Ok(serde_json::from_str(raw)?)
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let conn = self.pool.get_connection()?;
        let row = conn
            .query_row(
                "SELECT version, body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        match row {
            Some((version, body)) => Ok(Some(StoredDocument {
                id: id.to_string(),
                version: version as u64,
                body: parse_body(&body)?,
            })),
            None => Ok(None),
        }
    }

    fn put(
        &self,
        collection: &str,
        id: &str,
        expected: Option<u64>,
        body: &Value,
    ) -> Result<PutOutcome> {
        let conn = self.pool.get_connection()?;
        let text = serde_json::to_string(body)?;
        let now = Utc::now().to_rfc3339();

        let changed = match expected {
            None => conn.execute(
                "INSERT INTO documents (collection, id, version, body, updated_at)
                 VALUES (?1, ?2, 1, ?3, ?4)
                 ON CONFLICT(collection, id) DO NOTHING",
                params![collection, id, text, now],
            )?,
            Some(version) => conn.execute(
                "UPDATE documents SET version = version + 1, body = ?3, updated_at = ?4
                 WHERE collection = ?1 AND id = ?2 AND version = ?5",
                params![collection, id, text, now, version as i64],
            )?,
        };

        if changed == 1 {
            return Ok(PutOutcome::Written(expected.unwrap_or(0) + 1));
        }

        let current = conn
            .query_row(
                "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .map(|v| v as u64);
        Ok(PutOutcome::Conflict { current })
    }

    fn scan(&self, collection: &str) -> Result<Vec<StoredDocument>> {
        let conn = self.pool.get_connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, version, body FROM documents WHERE collection = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, version, body)| {
                Ok(StoredDocument {
                    id,
                    version: version as u64,
                    body: parse_body(&body)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn migrations_are_recorded_once() {
        let pool = open_in_memory().unwrap();
        let conn = pool.get_connection().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_applied_versions(&conn).unwrap(), vec![SCHEMA_VERSION]);
    }

    #[test]
    fn conditional_put_detects_stale_version() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        assert_eq!(
            store.put("shortlist", "shortlist", None, &json!({"entries": []})).unwrap(),
            PutOutcome::Written(1)
        );
        assert_eq!(
            store.put("shortlist", "shortlist", Some(1), &json!({"entries": [1]})).unwrap(),
            PutOutcome::Written(2)
        );
        assert_eq!(
            store.put("shortlist", "shortlist", Some(1), &json!({"entries": [2]})).unwrap(),
            PutOutcome::Conflict { current: Some(2) }
        );

        let doc = store.get("shortlist", "shortlist").unwrap().unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.body["entries"], json!([1]));
    }

    #[test]
    fn insert_only_if_absent() {
        let store = SqliteDocumentStore::open_in_memory().unwrap();
        store.put("dismissed", "a", None, &json!(1)).unwrap();
        assert_eq!(
            store.put("dismissed", "a", None, &json!(2)).unwrap(),
            PutOutcome::Conflict { current: Some(1) }
        );
    }

    #[test]
    fn documents_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db").join("litradar.db");
        {
            let store = SqliteDocumentStore::open(&path).unwrap();
            store.put("dismissed", "a", None, &json!({"title": "x"})).unwrap();
            store.put("dismissed", "b", None, &json!({"title": "y"})).unwrap();
            store.put("shortlist", "shortlist", None, &json!({})).unwrap();
        }
        let store = SqliteDocumentStore::open(&path).unwrap();
        assert_eq!(store.path(), path.to_str());
        let docs = store.scan("dismissed").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "a");
        assert_eq!(docs[1].body["title"], "y");
    }
}
