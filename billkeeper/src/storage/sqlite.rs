//! SQLite key-value snapshot storage
//!
//! The device key-value store: a `kv` table in a local SQLite database,
//! with the snapshot envelope kept under `STORAGE_KEY`.

use super::{decode, encode, SnapshotStorage};
use crate::config::STORAGE_KEY;
use crate::error::Result;
use crate::store::Snapshot;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone)]
pub struct SqliteKvStorage {
    pool: SqlitePool,
    key: String,
}

impl SqliteKvStorage {
    /// Wrap an existing pool; the schema is created if missing
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        initialize_schema(&pool).await?;
        Ok(Self {
            pool,
            key: STORAGE_KEY.to_string(),
        })
    }

    /// Open (creating if needed) the database file at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        tracing::info!("Opening key-value store at: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!(
            "sqlite://{}?mode=rwc",
            db_path.display()
        ))?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::new(pool).await
    }

    /// Same database, different slot
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Drop the slot entirely
    pub async fn clear(&self) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(&self.key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

impl SnapshotStorage for SqliteKvStorage {
    async fn load(&self) -> Result<Option<Snapshot>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("value");
                Ok(Some(decode(&raw)?))
            }
            None => {
                tracing::info!("No snapshot stored under {:?}, starting empty", self.key);
                Ok(None)
            }
        }
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = encode(snapshot)?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.key)
        .bind(&raw)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        tracing::debug!("Snapshot saved under {:?} ({} bytes)", self.key, raw.len());
        Ok(())
    }
}
