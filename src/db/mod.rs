mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};

use crate::storage::SnapshotStorage;

/// SQLite-backed snapshot storage.
///
/// Each snapshot is one row in `snapshots`, addressed by its storage key.
/// Clones share the same connection.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Metadata about a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub key: String,
    pub size: usize,
    pub updated_at: DateTime<Utc>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Snapshot operations
    // ============================================================

    pub fn get_snapshot(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.lock()?;
        let data = conn
            .query_row("SELECT data FROM snapshots WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(data)
    }

    pub fn put_snapshot(&self, key: &str, data: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        let now = Utc::now();

        conn.execute(
            "INSERT INTO snapshots (key, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            (key, data, now.to_rfc3339()),
        )?;

        Ok(())
    }

    pub fn delete_snapshot(&self, key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM snapshots WHERE key = ?", [key])?;
        Ok(rows > 0)
    }

    /// All stored snapshots, most recently written first.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key, length(data), updated_at FROM snapshots ORDER BY updated_at DESC, key",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(SnapshotRecord {
                    key: row.get(0)?,
                    size: row.get::<_, i64>(1)?.try_into().unwrap_or(0),
                    updated_at: parse_datetime(row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }
}

impl SnapshotStorage for Database {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get_snapshot(key)
    }

    fn set(&self, key: &str, data: &[u8]) -> Result<()> {
        self.put_snapshot(key, data)
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.delete_snapshot(key).map(|_| ())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// `retro.db` in the platform data directory.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "retro-session")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("retro.db"))
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
