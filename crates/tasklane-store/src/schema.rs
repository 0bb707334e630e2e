//! SQL DDL for the task store.
//!
//! Timestamps are stored as Unix seconds so they compare and sort as
//! integers. Booleans are stored as 0 or 1.

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, SqliteStoreError};

/// Current schema version, kept in `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Runs all migrations.
///
/// Idempotent: every statement uses `IF NOT EXISTS`.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    conn.execute_batch(SCHEMA_V1)
        .map_err(|source| SqliteStoreError::Migration {
            version: SCHEMA_VERSION,
            source,
        })?;
    if current < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
        debug!(from = current, to = SCHEMA_VERSION, "migrated task store schema");
    }
    Ok(())
}

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    identifier TEXT NOT NULL DEFAULT '',
    namespace_id INTEGER NOT NULL DEFAULT 0,
    updated INTEGER
);

CREATE TABLE IF NOT EXISTS buckets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    "limit" INTEGER NOT NULL DEFAULT 0,
    is_done_bucket INTEGER NOT NULL DEFAULT 0,
    position REAL NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_buckets_project ON buckets(project_id, position);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    done INTEGER NOT NULL DEFAULT 0,
    done_at INTEGER,
    due_date INTEGER,
    project_id INTEGER NOT NULL,
    repeat_after INTEGER NOT NULL DEFAULT 0,
    repeat_mode INTEGER NOT NULL DEFAULT 0,
    priority INTEGER NOT NULL DEFAULT 0,
    start_date INTEGER,
    end_date INTEGER,
    hex_color TEXT NOT NULL DEFAULT '',
    percent_done REAL NOT NULL DEFAULT 0,
    "index" INTEGER NOT NULL DEFAULT 0,
    uid TEXT NOT NULL DEFAULT '',
    cover_image_attachment_id INTEGER NOT NULL DEFAULT 0,
    created INTEGER,
    updated INTEGER,
    bucket_id INTEGER NOT NULL DEFAULT 0,
    position REAL NOT NULL DEFAULT 0,
    kanban_position REAL NOT NULL DEFAULT 0,
    created_by_id INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id, position);
CREATE INDEX IF NOT EXISTS idx_tasks_bucket ON tasks(bucket_id, kanban_position);

CREATE TABLE IF NOT EXISTS task_reminders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    reminder INTEGER,
    relative_period INTEGER NOT NULL DEFAULT 0,
    relative_to TEXT
);

CREATE INDEX IF NOT EXISTS idx_task_reminders_task ON task_reminders(task_id);

CREATE TABLE IF NOT EXISTS task_assignees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    UNIQUE(task_id, user_id)
);

CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    hex_color TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS label_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    label_id INTEGER NOT NULL,
    UNIQUE(task_id, label_id)
);

CREATE TABLE IF NOT EXISTS favorites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    kind INTEGER NOT NULL,
    UNIQUE(entity_id, user_id, kind)
);

CREATE TABLE IF NOT EXISTS task_relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    other_task_id INTEGER NOT NULL,
    relation_kind TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_task_relations_task ON task_relations(task_id);

CREATE TABLE IF NOT EXISTS task_attachments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id INTEGER NOT NULL,
    file_name TEXT NOT NULL DEFAULT ''
);
"#;
