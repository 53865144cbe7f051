//! SQLite-backed seen-article history.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use newsbot_core::{
    domain::{RecordOutcome, SeenRecord},
    errors::Error,
    store::SeenStore,
    Result,
};

const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS posted_articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        link TEXT UNIQUE NOT NULL,
        title TEXT,
        published_at TEXT
    )
    "#];

pub struct SqliteSeenStore {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteSeenStore {
    /// Open (creating if needed) the database file and its schema.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| store_err("failed to open database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| store_err(&format!("migration {i} failed"), e))?;
        }

        info!(path = %path.display(), "seen-article store ready");
        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SeenStore for SqliteSeenStore {
    async fn is_seen(&self, link: &str) -> Result<bool> {
        let hit: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posted_articles WHERE link = ? LIMIT 1")
            .bind(link)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_err("lookup failed", e))?;
        Ok(hit.is_some())
    }

    async fn record(&self, record: &SeenRecord) -> Result<RecordOutcome> {
        let done = sqlx::query(
            "INSERT OR IGNORE INTO posted_articles (link, title, published_at) VALUES (?, ?, ?)",
        )
        .bind(&record.link)
        .bind(&record.title)
        .bind(&record.published_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("insert failed", e))?;

        Ok(if done.rows_affected() == 0 {
            RecordOutcome::AlreadyPresent
        } else {
            RecordOutcome::Inserted
        })
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posted_articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_err("count failed", e))?;
        Ok(n.max(0) as u64)
    }
}

fn store_err(what: &str, e: sqlx::Error) -> Error {
    Error::Store(format!("{what}: {e}"))
}
