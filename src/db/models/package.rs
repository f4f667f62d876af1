// src/db/models/package.rs

//! CatalogEntry model - directly registered packages

use crate::error::{Error, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

/// A package registered by name with a caller-supplied canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: Option<i64>,
    pub name: String,
    pub url: String,
    pub created_at: Option<String>,
}

impl CatalogEntry {
    /// Create a new, not yet persisted entry
    pub fn new(name: String, url: String) -> Self {
        Self {
            id: None,
            name,
            url,
            created_at: None,
        }
    }

    /// Insert this entry into the database
    ///
    /// Fails with [`Error::AlreadyExists`] when the name is taken.
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let inserted = conn.execute(
            "INSERT INTO packages (name, url) VALUES (?1, ?2)",
            params![&self.name, &self.url],
        );

        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(Error::AlreadyExists(format!("package '{}'", self.name)));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find an entry by exact name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, url, created_at FROM packages WHERE name = ?1",
        )?;

        let entry = stmt.query_row([name], Self::from_row).optional()?;

        Ok(entry)
    }

    /// List all entries in registration order
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, url, created_at FROM packages ORDER BY id",
        )?;

        let entries = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Case-insensitive substring search over names, in registration order
    pub fn search(conn: &Connection, fragment: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, url, created_at FROM packages
             WHERE instr(lower(name), lower(?1)) > 0 ORDER BY id",
        )?;

        let entries = stmt
            .query_map([fragment], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete an entry by name, returning whether a row was removed
    pub fn delete_by_name(conn: &Connection, name: &str) -> Result<bool> {
        let removed = conn.execute("DELETE FROM packages WHERE name = ?1", [name])?;
        Ok(removed > 0)
    }

    /// Convert a database row to a CatalogEntry
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            url: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_find() {
        let conn = test_conn();
        let mut entry = CatalogEntry::new("ember".to_string(), "/foo".to_string());
        let id = entry.insert(&conn).unwrap();
        assert_eq!(entry.id, Some(id));

        let found = CatalogEntry::find_by_name(&conn, "ember").unwrap().unwrap();
        assert_eq!(found.name, "ember");
        assert_eq!(found.url, "/foo");
        assert!(found.created_at.is_some());

        assert!(CatalogEntry::find_by_name(&conn, "moment").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let conn = test_conn();
        CatalogEntry::new("ember".to_string(), "/foo".to_string())
            .insert(&conn)
            .unwrap();

        let err = CatalogEntry::new("ember".to_string(), "/bar".to_string())
            .insert(&conn)
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let conn = test_conn();
        for (name, url) in [("moment", "/bar"), ("ember", "/foo"), ("angular", "/baz")] {
            CatalogEntry::new(name.to_string(), url.to_string())
                .insert(&conn)
                .unwrap();
        }

        let names: Vec<_> = CatalogEntry::list_all(&conn)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["moment", "ember", "angular"]);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let conn = test_conn();
        for name in ["ember", "ember-data", "Embed-JS", "moment"] {
            CatalogEntry::new(name.to_string(), format!("/{name}"))
                .insert(&conn)
                .unwrap();
        }

        let hits: Vec<_> = CatalogEntry::search(&conn, "MBE")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(hits, vec!["ember", "ember-data", "Embed-JS"]);

        let hits = CatalogEntry::search(&conn, "ember-da").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "ember-data");

        assert!(CatalogEntry::search(&conn, "wat").unwrap().is_empty());
    }

    #[test]
    fn test_delete_by_name() {
        let conn = test_conn();
        CatalogEntry::new("ember".to_string(), "/foo".to_string())
            .insert(&conn)
            .unwrap();

        assert!(CatalogEntry::delete_by_name(&conn, "ember").unwrap());
        assert!(!CatalogEntry::delete_by_name(&conn, "ember").unwrap());
        assert!(CatalogEntry::find_by_name(&conn, "ember").unwrap().is_none());
    }
}
