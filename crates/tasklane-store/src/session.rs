//! [`Session`] backed by a SQLite connection.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

use tasklane_core::config::Config;
use tasklane_core::models::{
    Bucket, FavoriteKind, Label, Project, RelationKind, ReminderRelation, Task, TaskColumn,
    TaskRelation, TaskReminder, User,
};
use tasklane_core::query::{render_order_by, Cond, Dialect, SortParam, SqlValue, Window};
use tasklane_core::session::{Session, StoreResult};

use crate::error::{Result, SqliteStoreError};
use crate::schema::run_migrations;

const TASK_COLUMNS: &str = r#"id, title, description, done, done_at, due_date, project_id,
    repeat_after, repeat_mode, priority, start_date, end_date, hex_color, percent_done,
    "index", uid, cover_image_attachment_id, created, updated, bucket_id, position,
    kanban_position, created_by_id"#;

/// A task store session over one SQLite connection.
///
/// Every method runs on the connection as is. Wrap a request in
/// [`transaction`](Self::transaction) to make it atomic.
pub struct SqliteSession {
    conn: Connection,
}

impl SqliteSession {
    /// Opens (or creates) the database at `path` and migrates it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SqliteStoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| SqliteStoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened task store");
        Self::from_connection(conn)
    }

    /// Opens the database named by the config.
    pub fn open_configured(config: &Config) -> Result<Self> {
        let path = config
            .database
            .as_deref()
            .ok_or(SqliteStoreError::NoDatabasePath)?;
        Self::open(path)
    }

    /// Opens a fresh in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wraps an existing connection and migrates it.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Runs `f` in a transaction, committing when it returns `Ok`.
    ///
    /// The transaction rolls back when `f` fails.
    pub fn transaction<T, E>(
        &self,
        f: impl FnOnce(&Self) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<SqliteStoreError>,
    {
        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(SqliteStoreError::from)?;
        let out = f(self)?;
        tx.commit().map_err(SqliteStoreError::from)?;
        Ok(out)
    }

    pub fn insert_user(&self, username: &str, name: &str) -> Result<User> {
        self.conn.execute(
            "INSERT INTO users (username, name) VALUES (?1, ?2)",
            params![username, name],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            name: name.to_string(),
        })
    }

    /// Inserts a project, ignoring its id.
    pub fn insert_project(&self, project: &Project) -> Result<Project> {
        self.conn.execute(
            "INSERT INTO projects (title, identifier, namespace_id, updated) VALUES (?1, ?2, ?3, ?4)",
            params![
                project.title,
                project.identifier,
                project.namespace_id,
                to_ts(project.updated)
            ],
        )?;
        Ok(Project {
            id: self.conn.last_insert_rowid(),
            ..project.clone()
        })
    }

    /// Inserts a bucket, ignoring its id.
    pub fn insert_bucket(&self, bucket: &Bucket) -> Result<Bucket> {
        self.conn.execute(
            r#"INSERT INTO buckets (project_id, title, "limit", is_done_bucket, position)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                bucket.project_id,
                bucket.title,
                bucket.limit,
                bucket.is_done_bucket,
                bucket.position
            ],
        )?;
        Ok(Bucket {
            id: self.conn.last_insert_rowid(),
            ..bucket.clone()
        })
    }

    pub fn insert_label(&self, title: &str, hex_color: &str) -> Result<Label> {
        self.conn.execute(
            "INSERT INTO labels (title, hex_color) VALUES (?1, ?2)",
            params![title, hex_color],
        )?;
        Ok(Label {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            hex_color: hex_color.to_string(),
        })
    }

    pub fn add_label(&self, task_id: i64, label_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO label_tasks (task_id, label_id) VALUES (?1, ?2)",
            params![task_id, label_id],
        )?;
        Ok(())
    }

    pub fn insert_relation(&self, relation: &TaskRelation) -> Result<()> {
        self.conn.execute(
            "INSERT INTO task_relations (task_id, other_task_id, relation_kind) VALUES (?1, ?2, ?3)",
            params![
                relation.task_id,
                relation.other_task_id,
                relation.relation_kind.as_str()
            ],
        )?;
        Ok(())
    }

    /// Records an attachment on a task and returns its id.
    pub fn insert_attachment(&self, task_id: i64, file_name: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO task_attachments (task_id, file_name) VALUES (?1, ?2)",
            params![task_id, file_name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn run<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> StoreResult<T> {
        f(&self.conn).map_err(|e| SqliteStoreError::from(e).into())
    }
}

impl Session for SqliteSession {
    fn find_tasks(
        &self,
        cond: &Cond,
        order: &[SortParam],
        window: Option<Window>,
    ) -> StoreResult<Vec<Task>> {
        let (where_sql, values) = cond.to_sql(Dialect::Sqlite);
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE {where_sql}");
        if order.is_empty() {
            sql.push_str(" ORDER BY id ASC");
        } else {
            sql.push_str(" ORDER BY ");
            sql.push_str(&render_order_by(order, Dialect::Sqlite));
        }
        if let Some(window) = window {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", window.limit, window.offset));
        }
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter().map(to_value)), task_from_row)?;
            rows.collect()
        })
    }

    fn count_tasks(&self, cond: &Cond) -> StoreResult<i64> {
        let (where_sql, values) = cond.to_sql(Dialect::Sqlite);
        let sql = format!("SELECT COUNT(*) FROM tasks WHERE {where_sql}");
        self.run(|conn| {
            conn.query_row(&sql, params_from_iter(values.iter().map(to_value)), |row| {
                row.get(0)
            })
        })
    }

    fn insert_task(&self, task: &Task) -> StoreResult<i64> {
        self.run(|conn| {
            conn.execute(
                r#"INSERT INTO tasks (title, description, done, done_at, due_date, project_id,
                    repeat_after, repeat_mode, priority, start_date, end_date, hex_color,
                    percent_done, "index", uid, cover_image_attachment_id, created, updated,
                    bucket_id, position, kanban_position, created_by_id)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                    ?16, ?17, ?18, ?19, ?20, ?21, ?22)"#,
                params![
                    task.title,
                    task.description,
                    task.done,
                    to_ts(task.done_at),
                    to_ts(task.due_date),
                    task.project_id,
                    task.repeat_after,
                    i64::from(task.repeat_mode),
                    task.priority,
                    to_ts(task.start_date),
                    to_ts(task.end_date),
                    task.hex_color,
                    task.percent_done,
                    task.index,
                    task.uid,
                    task.cover_image_attachment_id,
                    to_ts(task.created),
                    to_ts(task.updated),
                    task.bucket_id,
                    task.position,
                    task.kanban_position,
                    task.created_by_id,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn update_task(&self, task: &Task, columns: &[TaskColumn]) -> StoreResult<()> {
        let mut assignments: Vec<String> = Vec::with_capacity(columns.len() + 1);
        let mut values: Vec<Value> = Vec::with_capacity(columns.len() + 2);
        for column in columns {
            assignments.push(format!("{} = ?", Dialect::Sqlite.quote(column.as_str())));
            values.push(column_value(task, *column));
        }
        assignments.push("updated = ?".to_string());
        values.push(ts_value(task.updated));
        values.push(Value::Integer(task.id));

        let sql = format!("UPDATE tasks SET {} WHERE id = ?", assignments.join(", "));
        self.run(|conn| conn.execute(&sql, params_from_iter(values.iter())))?;
        Ok(())
    }

    fn set_task_position(&self, task_id: i64, column: TaskColumn, value: f64) -> StoreResult<()> {
        let sql = format!(
            "UPDATE tasks SET {} = ?1 WHERE id = ?2",
            Dialect::Sqlite.quote(column.as_str())
        );
        self.run(|conn| conn.execute(&sql, params![value, task_id]))?;
        Ok(())
    }

    fn delete_tasks(&self, cond: &Cond) -> StoreResult<u64> {
        let (where_sql, values) = cond.to_sql(Dialect::Sqlite);
        let sql = format!("DELETE FROM tasks WHERE {where_sql}");
        let deleted = self.run(|conn| conn.execute(&sql, params_from_iter(values.iter().map(to_value))))?;
        Ok(deleted as u64)
    }

    fn max_task_index(&self, project_id: i64) -> StoreResult<i64> {
        self.run(|conn| {
            conn.query_row(
                r#"SELECT COALESCE(MAX("index"), 0) FROM tasks WHERE project_id = ?1"#,
                params![project_id],
                |row| row.get(0),
            )
        })
    }

    fn reminders_for(&self, task_ids: &[i64]) -> StoreResult<Vec<TaskReminder>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, task_id, reminder, relative_period, relative_to FROM task_reminders
             WHERE task_id IN ({}) ORDER BY reminder IS NULL, reminder ASC, id ASC",
            placeholders(task_ids.len())
        );
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(task_ids.iter()), |row| {
                let relative_to: Option<String> = row.get("relative_to")?;
                Ok(TaskReminder {
                    id: row.get("id")?,
                    task_id: row.get("task_id")?,
                    reminder: from_ts(row.get("reminder")?),
                    relative_period: row.get("relative_period")?,
                    relative_to: relative_to.as_deref().and_then(ReminderRelation::parse),
                })
            })?;
            rows.collect()
        })
    }

    fn replace_reminders(&self, task_id: i64, reminders: &[TaskReminder]) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute("DELETE FROM task_reminders WHERE task_id = ?1", params![task_id])?;
            let mut stmt = conn.prepare(
                "INSERT INTO task_reminders (task_id, reminder, relative_period, relative_to)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for reminder in reminders {
                stmt.execute(params![
                    task_id,
                    to_ts(reminder.reminder),
                    reminder.relative_period,
                    reminder.relative_to.map(|r| r.as_str()),
                ])?;
            }
            Ok(())
        })
    }

    fn assignees_for(&self, task_ids: &[i64]) -> StoreResult<Vec<(i64, User)>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT ta.task_id, u.id, u.username, u.name FROM task_assignees ta
             JOIN users u ON u.id = ta.user_id
             WHERE ta.task_id IN ({}) ORDER BY ta.id ASC",
            placeholders(task_ids.len())
        );
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(task_ids.iter()), |row| {
                Ok((
                    row.get(0)?,
                    User {
                        id: row.get(1)?,
                        username: row.get(2)?,
                        name: row.get(3)?,
                    },
                ))
            })?;
            rows.collect()
        })
    }

    fn set_assignees(&self, task_id: i64, user_ids: &[i64]) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute("DELETE FROM task_assignees WHERE task_id = ?1", params![task_id])?;
            let mut stmt = conn.prepare(
                "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?1, ?2)",
            )?;
            for user_id in user_ids {
                stmt.execute(params![task_id, user_id])?;
            }
            Ok(())
        })
    }

    fn users(&self, user_ids: &[i64]) -> StoreResult<Vec<User>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, username, name FROM users WHERE id IN ({}) ORDER BY id ASC",
            placeholders(user_ids.len())
        );
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(user_ids.iter()), |row| {
                Ok(User {
                    id: row.get("id")?,
                    username: row.get("username")?,
                    name: row.get("name")?,
                })
            })?;
            rows.collect()
        })
    }

    fn labels_for(&self, task_ids: &[i64]) -> StoreResult<Vec<(i64, Label)>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT lt.task_id, l.id, l.title, l.hex_color FROM label_tasks lt
             JOIN labels l ON l.id = lt.label_id
             WHERE lt.task_id IN ({}) ORDER BY l.id ASC",
            placeholders(task_ids.len())
        );
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(task_ids.iter()), |row| {
                Ok((
                    row.get(0)?,
                    Label {
                        id: row.get(1)?,
                        title: row.get(2)?,
                        hex_color: row.get(3)?,
                    },
                ))
            })?;
            rows.collect()
        })
    }

    fn delete_label_links(&self, task_id: i64) -> StoreResult<()> {
        self.run(|conn| conn.execute("DELETE FROM label_tasks WHERE task_id = ?1", params![task_id]))?;
        Ok(())
    }

    fn favorites(&self, user_id: i64, kind: FavoriteKind, entity_ids: &[i64]) -> StoreResult<Vec<i64>> {
        if entity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT entity_id FROM favorites WHERE user_id = ? AND kind = ? AND entity_id IN ({})
             ORDER BY entity_id ASC",
            placeholders(entity_ids.len())
        );
        let mut values = vec![Value::Integer(user_id), Value::Integer(kind.as_i64())];
        values.extend(entity_ids.iter().copied().map(Value::Integer));
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| row.get(0))?;
            rows.collect()
        })
    }

    fn add_favorite(&self, user_id: i64, kind: FavoriteKind, entity_id: i64) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO favorites (entity_id, user_id, kind) VALUES (?1, ?2, ?3)",
                params![entity_id, user_id, kind.as_i64()],
            )
        })?;
        Ok(())
    }

    fn remove_favorite(&self, user_id: Option<i64>, kind: FavoriteKind, entity_id: i64) -> StoreResult<()> {
        self.run(|conn| match user_id {
            Some(user_id) => conn.execute(
                "DELETE FROM favorites WHERE entity_id = ?1 AND kind = ?2 AND user_id = ?3",
                params![entity_id, kind.as_i64(), user_id],
            ),
            None => conn.execute(
                "DELETE FROM favorites WHERE entity_id = ?1 AND kind = ?2",
                params![entity_id, kind.as_i64()],
            ),
        })?;
        Ok(())
    }

    fn project(&self, project_id: i64) -> StoreResult<Option<Project>> {
        self.run(|conn| {
            conn.query_row(
                "SELECT id, title, identifier, namespace_id, updated FROM projects WHERE id = ?1",
                params![project_id],
                project_from_row,
            )
            .optional()
        })
    }

    fn projects(&self, project_ids: &[i64]) -> StoreResult<Vec<Project>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, title, identifier, namespace_id, updated FROM projects WHERE id IN ({})
             ORDER BY id ASC",
            placeholders(project_ids.len())
        );
        self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(project_ids.iter()), project_from_row)?;
            rows.collect()
        })
    }

    fn touch_project(&self, project_id: i64, at: DateTime<Utc>) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute(
                "UPDATE projects SET updated = ?1 WHERE id = ?2",
                params![at.timestamp(), project_id],
            )
        })?;
        Ok(())
    }

    fn bucket(&self, bucket_id: i64) -> StoreResult<Option<Bucket>> {
        self.run(|conn| {
            conn.query_row(
                r#"SELECT id, project_id, title, "limit", is_done_bucket, position
                   FROM buckets WHERE id = ?1"#,
                params![bucket_id],
                bucket_from_row,
            )
            .optional()
        })
    }

    fn default_bucket(&self, project_id: i64) -> StoreResult<Option<Bucket>> {
        self.run(|conn| {
            conn.query_row(
                r#"SELECT id, project_id, title, "limit", is_done_bucket, position
                   FROM buckets WHERE project_id = ?1
                   ORDER BY position ASC, id ASC LIMIT 1"#,
                params![project_id],
                bucket_from_row,
            )
            .optional()
        })
    }

    fn done_bucket(&self, project_id: i64) -> StoreResult<Option<Bucket>> {
        self.run(|conn| {
            conn.query_row(
                r#"SELECT id, project_id, title, "limit", is_done_bucket, position
                   FROM buckets WHERE project_id = ?1 AND is_done_bucket = 1
                   ORDER BY id ASC LIMIT 1"#,
                params![project_id],
                bucket_from_row,
            )
            .optional()
        })
    }

    fn relations_for(&self, task_ids: &[i64]) -> StoreResult<Vec<TaskRelation>> {
        if task_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT task_id, other_task_id, relation_kind FROM task_relations
             WHERE task_id IN ({}) ORDER BY id ASC",
            placeholders(task_ids.len())
        );
        let rows: Vec<(i64, i64, String)> = self.run(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(task_ids.iter()), |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?;
            rows.collect()
        })?;

        let mut relations = Vec::with_capacity(rows.len());
        for (task_id, other_task_id, kind) in rows {
            match RelationKind::parse(&kind) {
                Some(relation_kind) => relations.push(TaskRelation {
                    task_id,
                    other_task_id,
                    relation_kind,
                }),
                None => warn!(task_id, other_task_id, kind = %kind, "skipped relation of unknown kind"),
            }
        }
        Ok(relations)
    }

    fn delete_relations(&self, task_id: i64) -> StoreResult<()> {
        self.run(|conn| {
            conn.execute(
                "DELETE FROM task_relations WHERE task_id = ?1 OR other_task_id = ?1",
                params![task_id],
            )
        })?;
        Ok(())
    }

    fn attachment_task_id(&self, attachment_id: i64) -> StoreResult<Option<i64>> {
        self.run(|conn| {
            conn.query_row(
                "SELECT task_id FROM task_attachments WHERE id = ?1",
                params![attachment_id],
                |row| row.get(0),
            )
            .optional()
        })
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        done: row.get("done")?,
        done_at: from_ts(row.get("done_at")?),
        due_date: from_ts(row.get("due_date")?),
        project_id: row.get("project_id")?,
        repeat_after: row.get("repeat_after")?,
        repeat_mode: row.get::<_, i64>("repeat_mode")?.into(),
        priority: row.get("priority")?,
        start_date: from_ts(row.get("start_date")?),
        end_date: from_ts(row.get("end_date")?),
        hex_color: row.get("hex_color")?,
        percent_done: row.get("percent_done")?,
        index: row.get("index")?,
        uid: row.get("uid")?,
        cover_image_attachment_id: row.get("cover_image_attachment_id")?,
        created: from_ts(row.get("created")?),
        updated: from_ts(row.get("updated")?),
        bucket_id: row.get("bucket_id")?,
        position: row.get("position")?,
        kanban_position: row.get("kanban_position")?,
        created_by_id: row.get("created_by_id")?,
        ..Default::default()
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        title: row.get("title")?,
        identifier: row.get("identifier")?,
        namespace_id: row.get("namespace_id")?,
        updated: from_ts(row.get("updated")?),
    })
}

fn bucket_from_row(row: &Row<'_>) -> rusqlite::Result<Bucket> {
    Ok(Bucket {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        title: row.get("title")?,
        limit: row.get("limit")?,
        is_done_bucket: row.get("is_done_bucket")?,
        position: row.get("position")?,
    })
}

fn column_value(task: &Task, column: TaskColumn) -> Value {
    match column {
        TaskColumn::Title => Value::Text(task.title.clone()),
        TaskColumn::Description => Value::Text(task.description.clone()),
        TaskColumn::Done => Value::Integer(i64::from(task.done)),
        TaskColumn::DoneAt => ts_value(task.done_at),
        TaskColumn::DueDate => ts_value(task.due_date),
        TaskColumn::RepeatAfter => Value::Integer(task.repeat_after),
        TaskColumn::RepeatMode => Value::Integer(task.repeat_mode.into()),
        TaskColumn::Priority => Value::Integer(task.priority),
        TaskColumn::StartDate => ts_value(task.start_date),
        TaskColumn::EndDate => ts_value(task.end_date),
        TaskColumn::HexColor => Value::Text(task.hex_color.clone()),
        TaskColumn::PercentDone => Value::Real(task.percent_done),
        TaskColumn::ProjectId => Value::Integer(task.project_id),
        TaskColumn::BucketId => Value::Integer(task.bucket_id),
        TaskColumn::Position => Value::Real(task.position),
        TaskColumn::KanbanPosition => Value::Real(task.kanban_position),
        TaskColumn::CoverImageAttachmentId => Value::Integer(task.cover_image_attachment_id),
        TaskColumn::Index => Value::Integer(task.index),
    }
}

/// Binds a predicate value the way the schema stores it.
fn to_value(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Int(v) => Value::Integer(*v),
        SqlValue::Float(v) => Value::Real(*v),
        SqlValue::Text(v) => Value::Text(v.clone()),
        SqlValue::Bool(v) => Value::Integer(i64::from(*v)),
        SqlValue::Time(v) => Value::Integer(v.timestamp()),
    }
}

fn ts_value(at: Option<DateTime<Utc>>) -> Value {
    to_ts(at).map_or(Value::Null, Value::Integer)
}

fn to_ts(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|t| t.timestamp())
}

fn from_ts(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
