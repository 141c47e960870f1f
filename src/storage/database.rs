//! clipkeep - History store
//!
//! Uses SQLite to persist clipboard history entries with capacity control

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::clipboard::{Entry, EntryContent, EntryKind};
use crate::config::Config;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store could not be opened or created; history is disabled
    #[error("failed to open history database: {0}")]
    InitFailed(String),
    /// An insert/update/delete failed; state is unchanged
    #[error("history write failed: {0}")]
    WriteFailed(String),
    /// A query failed; callers see an empty result instead
    #[error("history read failed: {0}")]
    ReadFailed(String),
}

/// Persistent, capacity-bounded collection of clipboard entries
///
/// The store owns its SQLite connection behind a mutex, so one instance can
/// be shared (via `Arc`) between the capture poll loop and UI consumers.
/// All mutations are serialized; retention cleanup runs under the same lock
/// acquisition as the insert that triggered it.
pub struct HistoryStore {
    conn: Mutex<Option<Connection>>,
    max_items: usize,
}

impl HistoryStore {
    /// Open (creating if needed) the history database under the configured
    /// data directory
    pub fn open(config: &Config) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| StorageError::InitFailed(e.to_string()))?;

        let db_path = config.data_dir.join("clipboard.sqlite3");
        log::info!("Opening history database at {:?}", db_path);

        let conn = Self::open_connection(&db_path)
            .map_err(|e| StorageError::InitFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            max_items: config.max_items,
        })
    }

    /// Build a store with no backing database: every read yields an empty
    /// result and every write is an accepted no-op
    ///
    /// Used when [`HistoryStore::open`] fails at startup, so the rest of the
    /// application keeps running with history disabled.
    pub fn disabled() -> Self {
        Self {
            conn: Mutex::new(None),
            max_items: 0,
        }
    }

    fn open_connection(db_path: &Path) -> Result<Connection, rusqlite::Error> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS clipboard_items (
                id           TEXT PRIMARY KEY,
                timestamp    TEXT NOT NULL,
                is_favorite  INTEGER NOT NULL DEFAULT 0,
                content_type TEXT NOT NULL,
                text_content TEXT,
                image_data   BLOB
            );

            CREATE INDEX IF NOT EXISTS idx_timestamp ON clipboard_items(timestamp DESC);
            "#,
        )?;
        Ok(conn)
    }

    /// Persist a new entry, then trim excess non-favorite entries
    pub fn insert(&self, entry: &Entry) -> Result<(), StorageError> {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            return Ok(());
        };

        let (text_content, image_data) = match &entry.content {
            EntryContent::Text(text) => (Some(text.as_str()), None),
            EntryContent::Image(data) => (None, Some(data.as_slice())),
        };

        conn.execute(
            r#"
            INSERT INTO clipboard_items (id, timestamp, is_favorite, content_type, text_content, image_data)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.id,
                format_timestamp(&entry.created_at),
                entry.favorite as i32,
                entry.kind().as_str(),
                text_content,
                image_data,
            ],
        )
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        self.cleanup_old_entries(conn)?;
        Ok(())
    }

    /// Trim the oldest non-favorite entries down to `max_items`
    ///
    /// Favorites are excluded from both the count and the deletion set.
    /// Ties on timestamp are broken by rowid (insertion order), so repeated
    /// cleanup with no new inserts deletes nothing further.
    fn cleanup_old_entries(&self, conn: &Connection) -> Result<(), StorageError> {
        let deleted = conn
            .execute(
                r#"
                DELETE FROM clipboard_items
                WHERE is_favorite = 0
                  AND id NOT IN (
                      SELECT id FROM clipboard_items
                      WHERE is_favorite = 0
                      ORDER BY timestamp DESC, rowid DESC
                      LIMIT ?1
                  )
                "#,
                [self.max_items as i64],
            )
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;

        if deleted > 0 {
            log::debug!("Retention cleanup removed {} old entries", deleted);
        }
        Ok(())
    }

    /// Update the favorite flag of the entry matching `id`
    ///
    /// Unknown ids are a successful no-op: the entry may have been removed
    /// by retention cleanup between the caller reading it and toggling it.
    pub fn set_favorite(&self, id: &str, favorite: bool) -> Result<(), StorageError> {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            return Ok(());
        };

        conn.execute(
            "UPDATE clipboard_items SET is_favorite = ?1 WHERE id = ?2",
            params![favorite as i32, id],
        )
        .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Delete a single entry by id; returns whether anything was removed
    pub fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            return Ok(false);
        };

        let affected = conn
            .execute("DELETE FROM clipboard_items WHERE id = ?1", [id])
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(affected > 0)
    }

    /// Delete all non-favorite entries; favorites are untouched
    pub fn clear_history(&self) -> Result<(), StorageError> {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            return Ok(());
        };

        conn.execute("DELETE FROM clipboard_items WHERE is_favorite = 0", [])
            .map_err(|e| StorageError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<Entry> {
        self.read_or_empty("recent", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, is_favorite, content_type, text_content, image_data
                 FROM clipboard_items
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )?;
            let entries = stmt
                .query_map([limit as i64], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    /// All favorite entries, newest first
    pub fn favorites(&self) -> Vec<Entry> {
        self.read_or_empty("favorites", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, is_favorite, content_type, text_content, image_data
                 FROM clipboard_items
                 WHERE is_favorite = 1
                 ORDER BY timestamp DESC, rowid DESC",
            )?;
            let entries = stmt
                .query_map([], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    /// Text entries containing `query` as a case-insensitive substring,
    /// newest first; image entries never match
    ///
    /// An empty query is equivalent to [`HistoryStore::recent`].
    pub fn search(&self, query: &str, limit: usize) -> Vec<Entry> {
        if query.is_empty() {
            return self.recent(limit);
        }

        let pattern = format!("%{}%", escape_like(query));
        self.read_or_empty("search", |conn| {
            let mut stmt = conn.prepare(
                r#"SELECT id, timestamp, is_favorite, content_type, text_content, image_data
                   FROM clipboard_items
                   WHERE content_type = 'text' AND text_content LIKE ?1 ESCAPE '\'
                   ORDER BY timestamp DESC, rowid DESC
                   LIMIT ?2"#,
            )?;
            let entries = stmt
                .query_map(params![pattern, limit as i64], entry_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
    }

    /// Compare `candidate` against the single most recently inserted entry;
    /// true only when kind and payload are byte-for-byte equal
    pub fn is_duplicate_of_most_recent(&self, candidate: &Entry) -> bool {
        let most_recent = self.read_or_empty("is_duplicate_of_most_recent", |conn| {
            conn.query_row(
                "SELECT id, timestamp, is_favorite, content_type, text_content, image_data
                 FROM clipboard_items
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT 1",
                [],
                entry_from_row,
            )
            .optional()
        });

        match most_recent {
            Some(last) => last.content == candidate.content,
            None => false,
        }
    }

    /// Total entry count, favorites included
    pub fn count(&self) -> usize {
        self.read_or_empty("count", |conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM clipboard_items", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    /// Run a read query, degrading to an empty/default result on failure
    ///
    /// History display must keep working (possibly empty) even when the
    /// database is unavailable, so read errors are logged, not propagated.
    fn read_or_empty<T, F>(&self, operation: &str, query: F) -> T
    where
        T: Default,
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let guard = self.conn.lock();
        let Some(conn) = guard.as_ref() else {
            return T::default();
        };

        match query(conn) {
            Ok(result) => result,
            Err(e) => {
                log::error!(
                    "History read '{}' failed: {}",
                    operation,
                    StorageError::ReadFailed(e.to_string())
                );
                T::default()
            }
        }
    }
}

/// RFC 3339 with fixed-width microseconds, so lexicographic order in the
/// timestamp column matches chronological order
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn entry_from_row(row: &Row) -> Result<Entry, rusqlite::Error> {
    let kind = EntryKind::from_str(row.get::<_, String>(3)?.as_str()).unwrap_or(EntryKind::Text);
    let content = match kind {
        EntryKind::Text => EntryContent::Text(row.get::<_, Option<String>>(4)?.unwrap_or_default()),
        EntryKind::Image => {
            EntryContent::Image(row.get::<_, Option<Vec<u8>>>(5)?.unwrap_or_default())
        }
    };

    Ok(Entry {
        id: row.get(0)?,
        created_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(1)?)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
        favorite: row.get::<_, i32>(2)? != 0,
        content,
    })
}

/// Escape LIKE wildcards so the user's query matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
