//! SQLite persistence for analysis records.
//!
//! Topics and keywords are stored as JSON arrays in TEXT columns; topic search
//! walks the array with `json_each`. `created_at` is stored as fixed-width
//! RFC 3339 (microseconds, `Z`), so text ordering is chronological.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{AnalysisMetadata, AnalysisRecord};
use crate::llm::Sentiment;

/// Errors raised by the persistence layer
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Stored record {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },
}

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS analyses (
        id          TEXT PRIMARY KEY NOT NULL,
        text        TEXT NOT NULL,
        summary     TEXT NOT NULL,
        title       TEXT NOT NULL,
        topics      TEXT NOT NULL,
        sentiment   TEXT NOT NULL,
        keywords    TEXT NOT NULL,
        created_at  TEXT NOT NULL
    )";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses (created_at)";

const SEARCH_BY_TOPIC: &str = r"
    SELECT id, text, summary, title, topics, sentiment, keywords, created_at
    FROM analyses
    WHERE EXISTS (
        SELECT 1 FROM json_each(analyses.topics)
        WHERE json_each.value LIKE ?1 ESCAPE '\'
    )
    ORDER BY created_at DESC, rowid DESC
    LIMIT ?2";

/// Persistent store of completed analyses
#[derive(Debug, Clone)]
pub struct AnalysisStore {
    pool: SqlitePool,
}

impl AnalysisStore {
    /// Open (creating if needed) the database at `url` and ensure the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so keep
        // exactly one alive for the life of the pool.
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "Analysis store ready");
        Ok(store)
    }

    /// Fresh private in-memory database
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:").await
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Persist one record
    pub async fn insert(&self, record: &AnalysisRecord) -> Result<(), StoreError> {
        let topics = serde_json::to_string(&record.metadata.topics)?;
        let keywords = serde_json::to_string(&record.metadata.keywords)?;

        sqlx::query(
            "INSERT INTO analyses (id, text, summary, title, topics, sentiment, keywords, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(record.id.to_string())
        .bind(&record.text)
        .bind(&record.summary)
        .bind(&record.metadata.title)
        .bind(topics)
        .bind(record.metadata.sentiment.as_str())
        .bind(keywords)
        .bind(format_timestamp(&record.created_at))
        .execute(&self.pool)
        .await?;

        debug!(id = %record.id, "Stored analysis");
        Ok(())
    }

    /// Records with at least one topic containing `topic`
    /// (ASCII case-insensitive), newest first, at most `limit`.
    pub async fn search_by_topic(
        &self,
        topic: &str,
        limit: u32,
    ) -> Result<Vec<AnalysisRecord>, StoreError> {
        let pattern = format!("%{}%", escape_like(topic));

        let rows: Vec<AnalysisRow> = sqlx::query_as(SEARCH_BY_TOPIC)
            .bind(pattern)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Cheap connectivity probe for health checks
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    id: String,
    text: String,
    summary: String,
    title: String,
    topics: String,
    sentiment: String,
    keywords: String,
    created_at: String,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = StoreError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            id: row.id.clone(),
            reason,
        };

        let id = Uuid::parse_str(&row.id).map_err(|e| corrupt(format!("id: {e}")))?;
        let topics: Vec<String> =
            serde_json::from_str(&row.topics).map_err(|e| corrupt(format!("topics: {e}")))?;
        let keywords: Vec<String> =
            serde_json::from_str(&row.keywords).map_err(|e| corrupt(format!("keywords: {e}")))?;
        let sentiment = row
            .sentiment
            .parse::<Sentiment>()
            .map_err(|e| corrupt(format!("sentiment: {e}")))?;
        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| corrupt(format!("created_at: {e}")))?
            .with_timezone(&Utc);

        Ok(AnalysisRecord {
            id,
            text: row.text,
            summary: row.summary,
            metadata: AnalysisMetadata {
                title: row.title,
                topics,
                sentiment,
                keywords,
            },
            created_at,
        })
    }
}
