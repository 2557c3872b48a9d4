//! DuckDB storage for debates, speech samples, and classification outcomes.

use std::path::Path;

use chrono::NaiveDate;
use duckdb::{Connection, params};
use tracing::info;

use oratio_core::{Debate, Outcome};

use crate::StoreError;

/// At most this many matched keywords are recorded per debate.
const MAX_RECORDED_KEYWORDS: usize = 10;

/// Date-range restriction on the debate enumeration. Bounds are inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebateFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Related/total counts over an already-classified database.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationSummary {
    pub related_speeches: usize,
    pub total_speeches: usize,
    pub related_debates: usize,
    pub total_debates: usize,
}

/// DuckDB store holding the `debates` and `speeches` tables.
///
/// The same database serves as input (debate enumeration, speech samples)
/// and output (classification columns on `speeches`). The six
/// classification columns are bootstrapped idempotently before a run, so a
/// run can be pointed at a freshly ingested database or at one that was
/// partially classified by an earlier, aborted run.
pub struct DebateStore {
    conn: Connection,
}

impl DebateStore {
    /// Open an in-memory database. Used by tests; has no tables until the
    /// caller creates them.
    pub fn open() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open an existing debates database.
    ///
    /// The file must already exist: this engine consumes an ingested
    /// corpus, it never creates one.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::DatabaseNotFound(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Add the classification columns to `speeches` if they are absent.
    pub fn ensure_classification_columns(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_related BOOLEAN DEFAULT FALSE;
             ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_confidence DOUBLE DEFAULT 0.0;
             ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_keyword_confidence DOUBLE DEFAULT 0.0;
             ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_llm_confidence DOUBLE DEFAULT 0.0;
             ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_keywords_found VARCHAR;
             ALTER TABLE speeches ADD COLUMN IF NOT EXISTS brexit_llm_reasoning VARCHAR;",
        )?;
        Ok(())
    }

    /// Enumerate debates with a non-null title, ordered by date then id.
    ///
    /// The ordering is the unit of determinism for a run: two runs over the
    /// same database visit debates in the same sequence.
    pub fn debates(&self, filter: &DebateFilter) -> Result<Vec<Debate>, StoreError> {
        let mut sql = String::from(
            "SELECT DISTINCT d.debate_id, CAST(d.date AS VARCHAR), d.major_heading_text
             FROM debates d
             WHERE d.major_heading_text IS NOT NULL",
        );
        if let Some(from) = filter.from {
            sql.push_str(&format!(" AND d.date >= DATE '{from}'"));
        }
        if let Some(to) = filter.to {
            sql.push_str(&format!(" AND d.date <= DATE '{to}'"));
        }
        sql.push_str(" ORDER BY d.date, d.debate_id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut debates = Vec::new();
        for row in rows {
            let (debate_id, date, title) = row?;
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
                .map_err(|_| StoreError::InvalidDate(date.clone()))?;
            debates.push(Debate {
                debate_id,
                date,
                title,
            });
        }
        info!(count = debates.len(), "enumerated debates");
        Ok(debates)
    }

    /// The first `cap` non-null speech texts of a debate, ordered by
    /// `speech_id`.
    pub fn speech_sample(&self, debate_id: &str, cap: usize) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT speech_text FROM speeches
             WHERE debate_id = ? AND speech_text IS NOT NULL
             ORDER BY speech_id
             LIMIT {cap}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([debate_id], |row| row.get::<_, String>(0))?;
        let mut texts = Vec::new();
        for row in rows {
            texts.push(row?);
        }
        Ok(texts)
    }

    /// Write an outcome onto every speech row of its debate.
    ///
    /// One logical write per debate; re-running over the same debate
    /// overwrites the previous values. Returns the number of speech rows
    /// touched (zero for a debate with no speeches).
    pub fn persist_outcome(&self, outcome: &Outcome) -> Result<usize, StoreError> {
        let keywords = outcome
            .matched_keywords
            .iter()
            .take(MAX_RECORDED_KEYWORDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let rows = self.conn.execute(
            "UPDATE speeches SET
                brexit_related = ?,
                brexit_confidence = ?,
                brexit_keyword_confidence = ?,
                brexit_llm_confidence = ?,
                brexit_keywords_found = ?,
                brexit_llm_reasoning = ?
             WHERE debate_id = ?",
            params![
                outcome.related,
                outcome.confidence,
                outcome.keyword_confidence,
                outcome.llm_confidence,
                keywords,
                outcome.reasoning,
                outcome.debate_id,
            ],
        )?;
        Ok(rows)
    }

    /// Related/total counts across the classified database.
    pub fn summary(&self) -> Result<ClassificationSummary, StoreError> {
        Ok(ClassificationSummary {
            related_speeches: self
                .count("SELECT count(*) FROM speeches WHERE brexit_related")?,
            total_speeches: self.count("SELECT count(*) FROM speeches")?,
            related_debates: self
                .count("SELECT count(DISTINCT debate_id) FROM speeches WHERE brexit_related")?,
            total_debates: self.count(
                "SELECT count(DISTINCT debate_id) FROM debates
                 WHERE major_heading_text IS NOT NULL",
            )?,
        })
    }

    fn count(&self, sql: &str) -> Result<usize, StoreError> {
        let n: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }

    // ── Escape hatch ──

    /// Access the underlying DuckDB connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
