use crate::error::StoreError;
use crate::session::{NewSession, TestDuration, TextType, TypingSession};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::debug;

/// Persistence for typing sessions. Records are append-only.
pub trait SessionStore {
    fn insert(&self, user_id: &str, new: NewSession) -> Result<TypingSession, StoreError>;
    fn find_by_id(&self, id: i64) -> Result<Option<TypingSession>, StoreError>;
    /// Newest first.
    fn find_by_user(&self, user_id: &str) -> Result<Vec<TypingSession>, StoreError>;
}

#[derive(Debug)]
pub struct SqliteSessionStore {
    conn: Connection,
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, duration, wpm, accuracy, total_errors, error_words,
           typing_durations, text_type, raw_text, typed_text, created_at, updated_at
    FROM typing_sessions
"#;

impl SqliteSessionStore {
    /// Open (or create) a database file, creating its parent directory if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        debug!(path = %path.display(), "opening session database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS typing_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                duration INTEGER NOT NULL,
                wpm REAL NOT NULL,
                accuracy REAL NOT NULL,
                total_errors INTEGER NOT NULL,
                error_words TEXT NOT NULL DEFAULT '[]',
                typing_durations TEXT NOT NULL DEFAULT '[]',
                text_type TEXT NOT NULL DEFAULT 'words',
                raw_text TEXT NOT NULL,
                typed_text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_typing_sessions_user
                ON typing_sessions(user_id, created_at);
            "#,
        )?;

        Ok(Self { conn })
    }
}

impl SessionStore for SqliteSessionStore {
    fn insert(&self, user_id: &str, new: NewSession) -> Result<TypingSession, StoreError> {
        let now = Utc::now();
        let stamp = now.to_rfc3339_opts(SecondsFormat::Micros, true);

        self.conn.execute(
            r#"
            INSERT INTO typing_sessions
            (user_id, duration, wpm, accuracy, total_errors, error_words,
             typing_durations, text_type, raw_text, typed_text, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)
            "#,
            params![
                user_id,
                new.duration.secs(),
                new.wpm,
                new.accuracy,
                new.total_errors,
                serde_json::to_string(&new.error_words)?,
                serde_json::to_string(&new.typing_durations)?,
                new.text_type.to_string(),
                new.raw_text,
                new.typed_text,
                stamp,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        // Re-parse the stored stamp so the returned record matches a later read.
        let created_at = DateTime::parse_from_rfc3339(&stamp)?.with_timezone(&Utc);
        Ok(TypingSession::from_new(id, user_id, new, created_at))
    }

    fn find_by_id(&self, id: i64) -> Result<Option<TypingSession>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;

        let row = stmt.query_row([id], SessionRow::from_row).optional()?;
        row.map(TypingSession::try_from).transpose()
    }

    fn find_by_user(&self, user_id: &str) -> Result<Vec<TypingSession>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map([user_id], SessionRow::from_row)?;

        let mut sessions = Vec::new();
        for row in rows {
            sessions.push(TypingSession::try_from(row?)?);
        }

        Ok(sessions)
    }
}

/// Column values as stored, before list and timestamp decoding.
struct SessionRow {
    id: i64,
    user_id: String,
    duration: u32,
    wpm: f64,
    accuracy: f64,
    total_errors: u32,
    error_words: String,
    typing_durations: String,
    text_type: String,
    raw_text: String,
    typed_text: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            duration: row.get(2)?,
            wpm: row.get(3)?,
            accuracy: row.get(4)?,
            total_errors: row.get(5)?,
            error_words: row.get(6)?,
            typing_durations: row.get(7)?,
            text_type: row.get(8)?,
            raw_text: row.get(9)?,
            typed_text: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }
}

impl TryFrom<SessionRow> for TypingSession {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(TypingSession {
            id: row.id,
            user_id: row.user_id,
            duration: TestDuration::try_from(row.duration)?,
            wpm: row.wpm,
            accuracy: row.accuracy,
            total_errors: row.total_errors,
            error_words: serde_json::from_str(&row.error_words)?,
            typing_durations: serde_json::from_str(&row.typing_durations)?,
            text_type: serde_json::from_value::<TextType>(serde_json::Value::String(
                row.text_type,
            ))?,
            raw_text: row.raw_text,
            typed_text: row.typed_text,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&row.updated_at)?.with_timezone(&Utc),
        })
    }
}
