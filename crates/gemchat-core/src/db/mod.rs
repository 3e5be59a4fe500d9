//! SQLite-backed store for chat history, feedback, and sample Q/A data.
//!
//! One connection behind a mutex; the handle is cheap to clone and share.
//! Schema creation is idempotent and versioned through `schema_meta`.

pub mod seed;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::metrics::ResponseMetrics;

const SCHEMA_VERSION: u32 = 1;

/// User rating for an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Good,
    Bad,
}

impl Feedback {
    fn as_i64(self) -> i64 {
        match self {
            Feedback::Good => 1,
            Feedback::Bad => 0,
        }
    }

    /// Maps a stored value back; anything non-zero counts as good.
    pub fn from_i64(value: i64) -> Self {
        if value == 0 { Feedback::Bad } else { Feedback::Good }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feedback::Good => "good",
            Feedback::Bad => "bad",
        }
    }
}

/// One recorded chat interaction.
#[derive(Debug, Clone)]
pub struct ChatRecord {
    pub id: i64,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub question: String,
    pub answer: String,
    /// Seconds spent generating the answer.
    pub response_time: f64,
    pub feedback: Option<Feedback>,
    /// User-supplied correction attached with negative feedback.
    pub correct_answer: Option<String>,
    pub word_count: Option<i64>,
    pub bleu_score: Option<f64>,
    pub similarity_score: Option<f64>,
    pub relevance_score: Option<f64>,
}

/// One sample question/answer pair.
#[derive(Debug, Clone)]
pub struct SampleRecord {
    pub id: i64,
    pub question: String,
    pub answer: String,
    /// "seed" for built-ins, "user" for manually added rows.
    pub source: String,
}

/// Store handle. Clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens (or creates) the store at `path` and initializes the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory store. Used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema().context("Failed to initialize database schema")?;
        Ok(db)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn();

        conn.execute(
            r"
            CREATE TABLE IF NOT EXISTS chat_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                response_time REAL NOT NULL DEFAULT 0.0,
                feedback INTEGER,
                correct_answer TEXT,
                word_count INTEGER,
                bleu_score REAL,
                similarity_score REAL,
                relevance_score REAL
            )
            ",
            [],
        )?;

        conn.execute(
            r"
            CREATE TABLE IF NOT EXISTS sample_qa (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                source TEXT NOT NULL DEFAULT 'seed',
                UNIQUE(question, answer)
            )
            ",
            [],
        )?;

        conn.execute(
            r"
            CREATE TABLE IF NOT EXISTS schema_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            ",
            [],
        )?;

        conn.execute(
            "INSERT OR REPLACE INTO schema_meta (key, value) VALUES ('version', ?1)",
            params![SCHEMA_VERSION.to_string()],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_chat_history_timestamp
             ON chat_history(timestamp)",
            [],
        )?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Chat history
    // ------------------------------------------------------------------

    /// Records one interaction, returning its row id.
    pub fn insert_chat(&self, question: &str, answer: &str, response_time: f64) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO chat_history (timestamp, question, answer, response_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![Utc::now().to_rfc3339(), question, answer, response_time],
        )
        .context("Failed to insert chat record")?;
        Ok(conn.last_insert_rowid())
    }

    /// Attaches a rating (and optional correction) plus recomputed metrics.
    pub fn update_feedback(
        &self,
        id: i64,
        feedback: Feedback,
        correct_answer: Option<&str>,
        metrics: &ResponseMetrics,
    ) -> Result<()> {
        let updated = self.conn().execute(
            "UPDATE chat_history
             SET feedback = ?2,
                 correct_answer = ?3,
                 word_count = ?4,
                 bleu_score = ?5,
                 similarity_score = ?6,
                 relevance_score = ?7
             WHERE id = ?1",
            params![
                id,
                feedback.as_i64(),
                correct_answer,
                metrics.word_count as i64,
                metrics.bleu_score,
                metrics.similarity_score,
                metrics.relevance_score,
            ],
        )?;
        if updated == 0 {
            anyhow::bail!("No chat record with id {id}");
        }
        Ok(())
    }

    pub fn get_chat(&self, id: i64) -> Result<Option<ChatRecord>> {
        let conn = self.conn();
        let record = conn
            .query_row(
                &format!("{CHAT_SELECT} WHERE id = ?1"),
                params![id],
                row_to_chat,
            )
            .optional()?;
        Ok(record)
    }

    /// Most recent interactions first.
    pub fn list_history(&self, limit: usize, rated_only: bool) -> Result<Vec<ChatRecord>> {
        let conn = self.conn();
        let sql = if rated_only {
            format!("{CHAT_SELECT} WHERE feedback IS NOT NULL ORDER BY id DESC LIMIT ?1")
        } else {
            format!("{CHAT_SELECT} ORDER BY id DESC LIMIT ?1")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], row_to_chat)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read chat history")
    }

    /// Deletes one record; false when the id did not exist.
    pub fn delete_chat(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM chat_history WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Deletes all history, returning the number of rows removed.
    pub fn clear_history(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM chat_history", [])?)
    }

    pub fn history_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM chat_history", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ------------------------------------------------------------------
    // Sample Q/A
    // ------------------------------------------------------------------

    pub fn list_samples(&self) -> Result<Vec<SampleRecord>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, question, answer, source FROM sample_qa ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(SampleRecord {
                id: row.get(0)?,
                question: row.get(1)?,
                answer: row.get(2)?,
                source: row.get(3)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to read samples")
    }

    /// Adds a sample pair. Duplicate question/answer pairs are rejected.
    pub fn add_sample(&self, question: &str, answer: &str, source: &str) -> Result<i64> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO sample_qa (question, answer, source) VALUES (?1, ?2, ?3)",
            params![question, answer, source],
        )
        .context("Failed to insert sample (duplicate question/answer?)")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn delete_sample(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn()
            .execute("DELETE FROM sample_qa WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    /// Deletes all samples, returning the number of rows removed.
    pub fn clear_samples(&self) -> Result<usize> {
        Ok(self.conn().execute("DELETE FROM sample_qa", [])?)
    }

    pub fn sample_count(&self) -> Result<usize> {
        let count: i64 =
            self.conn()
                .query_row("SELECT COUNT(*) FROM sample_qa", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Looks up the sample answer for a question, used as the metric
    /// reference. Case-insensitive exact match.
    pub fn reference_answer_for(&self, question: &str) -> Result<Option<String>> {
        let answer = self
            .conn()
            .query_row(
                "SELECT answer FROM sample_qa WHERE question = ?1 COLLATE NOCASE LIMIT 1",
                params![question],
                |row| row.get(0),
            )
            .optional()?;
        Ok(answer)
    }
}

const CHAT_SELECT: &str = "SELECT id, timestamp, question, answer, response_time, feedback,
            correct_answer, word_count, bleu_score, similarity_score, relevance_score
     FROM chat_history";

fn row_to_chat(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRecord> {
    Ok(ChatRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        question: row.get(2)?,
        answer: row.get(3)?,
        response_time: row.get(4)?,
        feedback: row.get::<_, Option<i64>>(5)?.map(Feedback::from_i64),
        correct_answer: row.get(6)?,
        word_count: row.get(7)?,
        bleu_score: row.get(8)?,
        similarity_score: row.get(9)?,
        relevance_score: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.db");
        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.history_count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let db = test_db();
        let id = db.insert_chat("what is rust", "a language", 1.25).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.question, "what is rust");
        assert_eq!(record.answer, "a language");
        assert!((record.response_time - 1.25).abs() < 1e-9);
        assert_eq!(record.feedback, None);
        assert_eq!(record.bleu_score, None);
    }

    #[test]
    fn test_feedback_updates_scores() {
        let db = test_db();
        let id = db.insert_chat("q", "rust is a language", 0.5).unwrap();

        let scores = metrics::evaluate("q", "rust is a language", Some("rust is a language"));
        db.update_feedback(id, Feedback::Good, None, &scores).unwrap();

        let record = db.get_chat(id).unwrap().unwrap();
        assert_eq!(record.feedback, Some(Feedback::Good));
        assert_eq!(record.word_count, Some(4));
        assert!(record.bleu_score.unwrap() > 0.99);
    }

    #[test]
    fn test_feedback_on_missing_row_errors() {
        let db = test_db();
        let scores = metrics::evaluate("q", "a", None);
        assert!(db.update_feedback(99, Feedback::Bad, None, &scores).is_err());
    }

    #[test]
    fn test_list_history_orders_and_limits() {
        let db = test_db();
        for i in 0..5 {
            db.insert_chat(&format!("q{i}"), "a", 0.0).unwrap();
        }

        let rows = db.list_history(3, false).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].question, "q4");
        assert_eq!(rows[2].question, "q2");
    }

    #[test]
    fn test_list_history_rated_only() {
        let db = test_db();
        let rated = db.insert_chat("rated", "a", 0.0).unwrap();
        db.insert_chat("unrated", "a", 0.0).unwrap();

        let scores = metrics::evaluate("rated", "a", None);
        db.update_feedback(rated, Feedback::Bad, Some("better"), &scores)
            .unwrap();

        let rows = db.list_history(10, true).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].question, "rated");
        assert_eq!(rows[0].correct_answer.as_deref(), Some("better"));
    }

    #[test]
    fn test_delete_and_clear() {
        let db = test_db();
        let id = db.insert_chat("q", "a", 0.0).unwrap();
        assert!(db.delete_chat(id).unwrap());
        assert!(!db.delete_chat(id).unwrap());

        db.insert_chat("q1", "a", 0.0).unwrap();
        db.insert_chat("q2", "a", 0.0).unwrap();
        assert_eq!(db.clear_history().unwrap(), 2);
        assert_eq!(db.history_count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_sample_rejected() {
        let db = test_db();
        db.add_sample("q", "a", "user").unwrap();
        assert!(db.add_sample("q", "a", "user").is_err());
    }

    #[test]
    fn test_reference_answer_lookup_is_case_insensitive() {
        let db = test_db();
        db.add_sample("What is attention?", "A weighting mechanism.", "seed")
            .unwrap();

        let found = db.reference_answer_for("what is attention?").unwrap();
        assert_eq!(found.as_deref(), Some("A weighting mechanism."));
        assert_eq!(db.reference_answer_for("unknown").unwrap(), None);
    }
}
