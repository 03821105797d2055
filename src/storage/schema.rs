//! Database schema definitions

/// SQL schema for the task database
pub const SCHEMA_SQL: &str = r#"
-- One row per task, rewritten on every transition
CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    mode TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    task_json TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

-- Final or partial report per task
CREATE TABLE IF NOT EXISTS reports (
    task_id TEXT PRIMARY KEY,
    generated_at TEXT NOT NULL,
    report_json TEXT NOT NULL
);

-- Append-only log trail
CREATE TABLE IF NOT EXISTS task_logs (
    task_id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    level TEXT NOT NULL,
    message TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    PRIMARY KEY (task_id, seq)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
