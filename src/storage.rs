use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::PortalResult;

const SCHOOL_ID_KEY: &str = "school_id";

/// Local key-value cache for the school identifier used in image URLs.
///
/// Not a source of truth: the profile fetch overwrites it whenever it carries one.
pub struct SchoolIdStore {
    conn: Connection,
}

impl SchoolIdStore {
    pub fn open(path: impl AsRef<Path>) -> PortalResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    pub fn in_memory() -> PortalResult<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init()?;
        Ok(store)
    }

    fn init(&self) -> PortalResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS settings (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT
            );
            "#,
        )?;
        Ok(())
    }

    pub fn school_id(&self) -> PortalResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![SCHOOL_ID_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_school_id(&self, school_id: &str) -> PortalResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![SCHOOL_ID_KEY, school_id, now],
        )?;
        Ok(())
    }

    pub fn clear(&self) -> PortalResult<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", params![SCHOOL_ID_KEY])?;
        Ok(())
    }
}

/// Composes the public URL of an uploaded image.
///
/// Absolute references are returned untouched; relative ones need the school id.
pub fn photo_url(api_url: &str, school_id: Option<&str>, photo: &str) -> Option<String> {
    if photo.starts_with("http://") || photo.starts_with("https://") {
        return Some(photo.to_string());
    }
    let school_id = school_id.filter(|id| !id.is_empty())?;
    Some(format!(
        "{}/uploads/{}/{}",
        api_url.trim_end_matches('/'),
        school_id,
        photo.trim_start_matches('/')
    ))
}
