//! SQLite task store
//!
//! Records are stored as JSON documents next to a few indexed columns.
//! `rusqlite` is blocking, so every call runs on tokio's blocking pool.

use crate::report::Report;
use crate::state::{LogEntry, LogLevel};
use crate::storage::schema::initialize_schema;
use crate::storage::{StorageError, StorageResult, TaskStore};
use crate::task::{Task, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

/// SQLite storage backend
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `f` on the blocking pool; dropping the returned future does not abort it
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&guard)
        })
        .await
        .map_err(|e| StorageError::Database(format!("storage worker failed: {}", e)))?
    }
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn save_task(&self, task: &Task) -> StorageResult<()> {
        let json = serde_json::to_string(task)?;
        let id = task.id.to_string();
        let mode = task.mode.to_string();
        let status = task.status.to_db_string();
        let created_at = task.created_at.to_rfc3339();
        let updated_at = task.updated_at.to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO tasks (id, mode, status, created_at, updated_at, task_json)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    updated_at = excluded.updated_at,
                    task_json = excluded.task_json",
                params![id, mode, status, created_at, updated_at, json],
            )?;
            Ok(())
        })
        .await
    }

    async fn save_report(&self, task_id: &TaskId, report: &Report) -> StorageResult<()> {
        let json = serde_json::to_string(report)?;
        let id = task_id.to_string();
        let generated_at = report.generated_at.to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO reports (task_id, generated_at, report_json)
                 VALUES (?1, ?2, ?3)",
                params![id, generated_at, json],
            )?;
            Ok(())
        })
        .await
    }

    async fn append_log(&self, task_id: &TaskId, entry: &LogEntry) -> StorageResult<()> {
        let id = task_id.to_string();
        let seq = entry.seq as i64;
        let level = entry.level.to_string();
        let message = entry.message.clone();
        let timestamp = entry.timestamp.to_rfc3339();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO task_logs (task_id, seq, level, message, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, seq, level, message, timestamp],
            )?;
            Ok(())
        })
        .await
    }

    async fn load_task(&self, task_id: &TaskId) -> StorageResult<Option<Task>> {
        let id = task_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT task_json FROM tasks WHERE id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        json.map(|j| serde_json::from_str(&j).map_err(StorageError::from))
            .transpose()
    }

    async fn load_report(&self, task_id: &TaskId) -> StorageResult<Option<Report>> {
        let id = task_id.to_string();
        let json: Option<String> = self
            .with_conn(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT report_json FROM reports WHERE task_id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;

        json.map(|j| serde_json::from_str(&j).map_err(StorageError::from))
            .transpose()
    }

    async fn load_logs(&self, task_id: &TaskId) -> StorageResult<Vec<LogEntry>> {
        let id = task_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, level, message, timestamp FROM task_logs
                 WHERE task_id = ?1 ORDER BY seq",
            )?;
            let rows = stmt.query_map(params![id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?;

            let mut entries = Vec::new();
            for row in rows {
                let (seq, level, message, timestamp) = row?;
                entries.push(LogEntry {
                    seq: seq as u64,
                    level: parse_level(&level),
                    message,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| StorageError::Database(format!("bad timestamp: {}", e)))?,
                });
            }
            Ok(entries)
        })
        .await
    }
}

fn parse_level(s: &str) -> LogLevel {
    match s {
        "debug" => LogLevel::Debug,
        "warn" => LogLevel::Warn,
        "error" => LogLevel::Error,
        _ => LogLevel::Info,
    }
}
