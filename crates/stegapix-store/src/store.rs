// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Duplicate store — which image URLs have been used, how far each search term
// has been paged, and which artifacts were published.
//
// Schema:
//   seen_urls(
//     url            TEXT PRIMARY KEY,   -- exact string, no normalisation
//     first_seen_at  TEXT NOT NULL       -- RFC 3339
//   )
//   search_cursors(
//     term           TEXT PRIMARY KEY,
//     page_index     INTEGER NOT NULL CHECK (page_index >= 1),
//     updated_at     TEXT NOT NULL
//   )
//   published_artifacts(
//     id INTEGER PRIMARY KEY AUTOINCREMENT, cycle_id, artifact_id,
//     message_url, veil_url, sha256, width, height, published_at
//   )

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, info, instrument};

use stegapix_core::error::{Result, StegapixError};
use stegapix_core::types::{CycleId, PublishedArtifact, SearchCursor};

/// SQLite schema, applied on every open.
const CREATE_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS seen_urls (
        url TEXT PRIMARY KEY,
        first_seen_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS search_cursors (
        term TEXT PRIMARY KEY,
        page_index INTEGER NOT NULL CHECK (page_index >= 1),
        updated_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS published_artifacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cycle_id TEXT NOT NULL,
        artifact_id TEXT NOT NULL,
        message_url TEXT NOT NULL,
        veil_url TEXT NOT NULL,
        sha256 TEXT NOT NULL,
        width INTEGER NOT NULL,
        height INTEGER NOT NULL,
        published_at TEXT NOT NULL
    );
"#;

/// Cursor writes never move a term backwards.
const UPSERT_CURSOR_SQL: &str = "INSERT INTO search_cursors (term, page_index, updated_at)
     VALUES (?1, ?2, ?3)
     ON CONFLICT(term) DO UPDATE SET
        page_index = MAX(page_index, excluded.page_index),
        updated_at = excluded.updated_at";

const INSERT_SEEN_SQL: &str =
    "INSERT OR IGNORE INTO seen_urls (url, first_seen_at) VALUES (?1, ?2)";

/// Convert a `rusqlite::Error` into a `StegapixError::Database`.
fn db_err(e: rusqlite::Error) -> StegapixError {
    StegapixError::Database(e.to_string())
}

/// Everything a successful cycle writes, applied in one transaction.
#[derive(Debug, Clone, Default)]
pub struct CycleCommit {
    /// URLs consumed by the cycle (message and veil).
    pub seen_urls: Vec<String>,
    /// Cursors staged by the discovery sessions.
    pub cursors: Vec<SearchCursor>,
    /// The artifact that was published.
    pub artifact: Option<PublishedArtifact>,
}

/// Persistence the discovery pipeline depends on.
///
/// Reads happen while discovering; writes are normally made once per cycle
/// through [`DuplicateStore::commit_cycle`].
pub trait DuplicateStore {
    /// Whether this exact URL has already been consumed.
    fn contains(&self, url: &str) -> Result<bool>;

    /// Add URLs to the seen set. Already-present URLs are left as they are.
    fn mark_seen(&self, urls: &[&str]) -> Result<()>;

    /// The persisted page index for `term`, if one exists.
    fn get_cursor(&self, term: &str) -> Result<Option<u32>>;

    /// Persist a page index for `term`. Lower values than the stored one are
    /// ignored.
    fn set_cursor(&self, term: &str, page_index: u32) -> Result<()>;

    /// Apply seen URLs, cursors, and the artifact log entry atomically.
    fn commit_cycle(&self, commit: &CycleCommit) -> Result<()>;
}

/// [`DuplicateStore`] backed by a SQLite database.
///
/// All methods are synchronous; the pipeline is strictly sequential.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `path`.
    ///
    /// WAL mode is enabled so an interrupted run leaves the database
    /// consistent.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(db_err)?;

        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .map_err(db_err)?;
        conn.execute_batch(CREATE_TABLES_SQL).map_err(db_err)?;

        info!("duplicate store opened");
        Ok(Self { conn })
    }

    /// Open an in-memory store (useful for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        conn.execute_batch(CREATE_TABLES_SQL).map_err(db_err)?;

        debug!("in-memory duplicate store opened");
        Ok(Self { conn })
    }

    /// Number of URLs in the seen set.
    pub fn seen_count(&self) -> Result<u64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM seen_urls", [], |row| row.get(0))
            .map_err(db_err)
    }

    /// All persisted cursors, ordered by term.
    pub fn cursors(&self) -> Result<Vec<SearchCursor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT term, page_index FROM search_cursors ORDER BY term ASC")
            .map_err(db_err)?;

        let cursors = stmt
            .query_map([], |row| {
                Ok(SearchCursor {
                    term: row.get(0)?,
                    page_index: row.get(1)?,
                })
            })
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(cursors)
    }

    /// The most recent `limit` artifacts, newest first.
    pub fn recent_artifacts(&self, limit: u32) -> Result<Vec<PublishedArtifact>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT cycle_id, artifact_id, message_url, veil_url, sha256,
                        width, height, published_at
                 FROM published_artifacts
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(db_err)?;

        let artifacts = stmt
            .query_map(params![limit], row_to_artifact)
            .map_err(db_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(db_err)?;
        Ok(artifacts)
    }
}

impl DuplicateStore for SqliteStore {
    fn contains(&self, url: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM seen_urls WHERE url = ?1",
                params![url],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    #[instrument(skip(self), fields(count = urls.len()))]
    fn mark_seen(&self, urls: &[&str]) -> Result<()> {
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        let now = Utc::now().to_rfc3339();
        for url in urls {
            tx.execute(INSERT_SEEN_SQL, params![url, now])
                .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        debug!("urls marked seen");
        Ok(())
    }

    fn get_cursor(&self, term: &str) -> Result<Option<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT page_index FROM search_cursors WHERE term = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map(params![term], |row| row.get::<_, u32>(0))
            .map_err(db_err)?;

        match rows.next() {
            Some(Ok(page_index)) => Ok(Some(page_index)),
            Some(Err(e)) => Err(db_err(e)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    fn set_cursor(&self, term: &str, page_index: u32) -> Result<()> {
        self.conn
            .execute(
                UPSERT_CURSOR_SQL,
                params![term, page_index, Utc::now().to_rfc3339()],
            )
            .map_err(db_err)?;
        debug!("cursor stored");
        Ok(())
    }

    #[instrument(skip_all, fields(urls = commit.seen_urls.len(), cursors = commit.cursors.len()))]
    fn commit_cycle(&self, commit: &CycleCommit) -> Result<()> {
        let tx = self.conn.unchecked_transaction().map_err(db_err)?;
        let now = Utc::now().to_rfc3339();

        for url in &commit.seen_urls {
            tx.execute(INSERT_SEEN_SQL, params![url, now])
                .map_err(db_err)?;
        }
        for cursor in &commit.cursors {
            tx.execute(UPSERT_CURSOR_SQL, params![cursor.term, cursor.page_index, now])
                .map_err(db_err)?;
        }
        if let Some(artifact) = &commit.artifact {
            tx.execute(
                "INSERT INTO published_artifacts (cycle_id, artifact_id, message_url,
                 veil_url, sha256, width, height, published_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    artifact.cycle_id.to_string(),
                    artifact.artifact_id,
                    artifact.message_url,
                    artifact.veil_url,
                    artifact.sha256,
                    artifact.width,
                    artifact.height,
                    artifact.published_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;
        }

        // Dropping `tx` on any early return above rolls everything back.
        tx.commit().map_err(db_err)?;
        info!("cycle committed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Map a SQLite row to a `PublishedArtifact`.
///
/// Column indices must match the SELECT order in `recent_artifacts`.
fn row_to_artifact(row: &rusqlite::Row<'_>) -> rusqlite::Result<PublishedArtifact> {
    let cycle_id_str: String = row.get(0)?;
    let published_at_str: String = row.get(7)?;

    let uuid = uuid::Uuid::parse_str(&cycle_id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let published_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&published_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(PublishedArtifact {
        cycle_id: CycleId(uuid),
        artifact_id: row.get(1)?,
        message_url: row.get(2)?,
        veil_url: row.get(3)?,
        sha256: row.get(4)?,
        width: row.get(5)?,
        height: row.get(6)?,
        published_at,
    })
}
