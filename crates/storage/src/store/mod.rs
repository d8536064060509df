#![forbid(unsafe_code)]

mod error;
mod periods;
mod projects;
mod requests;
mod tasks;
mod time_entries;
mod types;

pub use error::StoreError;
pub use requests::*;
pub use types::*;

use rusqlite::{Connection, ErrorCode, OptionalExtension, Transaction, params};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::{Date, Month};

const SCHEMA_VERSION: i64 = 1;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let db_path = storage_dir.join("hourbook.db");
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        preflight_gate(&conn)?;
        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn preflight_gate(conn: &Connection) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
    )?;
    let mut rows = stmt.query([])?;
    let mut tables = BTreeSet::new();
    while let Some(row) = rows.next()? {
        tables.insert(row.get::<_, String>(0)?);
    }

    if tables.is_empty() {
        return Ok(());
    }

    let required: BTreeSet<&str> = [
        "store_state",
        "projects",
        "retainer_contracts",
        "categories",
        "tasks",
        "time_entries",
        "retainer_periods",
        "counters",
        "events",
    ]
    .into_iter()
    .collect();

    if tables
        .iter()
        .any(|table| !required.contains(table.as_str()))
    {
        return Err(StoreError::InvalidInput(
            "RESET_REQUIRED: unsupported tables detected",
        ));
    }

    for table in required {
        if !tables.contains(table) {
            return Err(StoreError::InvalidInput(
                "RESET_REQUIRED: required table is missing",
            ));
        }
    }

    let version = conn
        .query_row(
            "SELECT schema_version FROM store_state WHERE singleton=1",
            [],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;

    match version {
        Some(v) if v == SCHEMA_VERSION => Ok(()),
        Some(_) => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema version mismatch",
        )),
        None => Err(StoreError::InvalidInput(
            "RESET_REQUIRED: schema state row is missing",
        )),
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    let now_ms = now_ms();

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS store_state (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          schema_version INTEGER NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          client TEXT NOT NULL,
          billing_type TEXT NOT NULL CHECK(billing_type IN ('retainer','hourly','fixed')),
          archived INTEGER NOT NULL DEFAULT 0,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS retainer_contracts (
          project_id TEXT PRIMARY KEY,
          included_minutes INTEGER NOT NULL CHECK(included_minutes >= 0),
          overage_rate_cents INTEGER NOT NULL CHECK(overage_rate_cents >= 0),
          rollover_enabled INTEGER NOT NULL,
          start_date TEXT NOT NULL,
          currency TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(project_id) REFERENCES projects(id)
        );

        CREATE TABLE IF NOT EXISTS categories (
          id TEXT PRIMARY KEY,
          name TEXT NOT NULL UNIQUE,
          created_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
          id TEXT PRIMARY KEY,
          project_id TEXT NOT NULL,
          category_id TEXT,
          title TEXT NOT NULL,
          description TEXT,
          archived INTEGER NOT NULL DEFAULT 0,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL,
          FOREIGN KEY(project_id) REFERENCES projects(id),
          FOREIGN KEY(category_id) REFERENCES categories(id)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_project
          ON tasks(project_id, archived, created_at_ms);

        CREATE TABLE IF NOT EXISTS time_entries (
          id TEXT PRIMARY KEY,
          task_id TEXT NOT NULL,
          entry_date TEXT NOT NULL,
          minutes INTEGER NOT NULL CHECK(minutes > 0),
          note TEXT,
          created_at_ms INTEGER NOT NULL,
          FOREIGN KEY(task_id) REFERENCES tasks(id)
        );

        CREATE INDEX IF NOT EXISTS idx_time_entries_task_date
          ON time_entries(task_id, entry_date);

        CREATE TABLE IF NOT EXISTS retainer_periods (
          project_id TEXT NOT NULL,
          period_start TEXT NOT NULL,
          id TEXT NOT NULL UNIQUE,
          period_end TEXT NOT NULL,
          included_minutes INTEGER NOT NULL CHECK(included_minutes >= 0),
          rollover_minutes INTEGER NOT NULL CHECK(rollover_minutes >= 0),
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY(project_id, period_start),
          FOREIGN KEY(project_id) REFERENCES projects(id)
        );

        CREATE TABLE IF NOT EXISTS counters (
          name TEXT PRIMARY KEY,
          value INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          ts_ms INTEGER NOT NULL,
          project_id TEXT,
          entity_id TEXT,
          event_type TEXT NOT NULL,
          payload_json TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_events_project
          ON events(project_id, seq);
        "#,
    )?;

    conn.execute(
        "INSERT INTO store_state(singleton, schema_version, created_at_ms, updated_at_ms) \
         VALUES (1, ?1, ?2, ?2) \
         ON CONFLICT(singleton) DO UPDATE SET schema_version=excluded.schema_version, updated_at_ms=excluded.updated_at_ms",
        params![SCHEMA_VERSION, now_ms],
    )?;

    Ok(())
}

fn next_counter_tx(tx: &Transaction<'_>, name: &str) -> Result<i64, StoreError> {
    let current: i64 = tx
        .query_row(
            "SELECT value FROM counters WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);
    let next = current + 1;
    tx.execute(
        r#"
        INSERT INTO counters(name, value) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET value=excluded.value
        "#,
        params![name, next],
    )?;
    Ok(next)
}

fn insert_event_tx(
    tx: &Transaction<'_>,
    ts_ms: i64,
    project_id: Option<&str>,
    entity_id: Option<&str>,
    event_type: &str,
    payload_json: &str,
) -> Result<i64, StoreError> {
    tx.execute(
        r#"
        INSERT INTO events(ts_ms, project_id, entity_id, event_type, payload_json)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![ts_ms, project_id, entity_id, event_type, payload_json],
    )?;
    Ok(tx.last_insert_rowid())
}

fn project_exists_tx(tx: &Transaction<'_>, project_id: &str) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM projects WHERE id=?1",
            params![project_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn ensure_project_tx(tx: &Transaction<'_>, project_id: &str) -> Result<(), StoreError> {
    if project_exists_tx(tx, project_id)? {
        Ok(())
    } else {
        Err(StoreError::UnknownProject)
    }
}

fn category_exists_tx(tx: &Transaction<'_>, category_id: &str) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM categories WHERE id=?1",
            params![category_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn task_project_tx(tx: &Transaction<'_>, task_id: &str) -> Result<Option<String>, StoreError> {
    Ok(tx
        .query_row(
            "SELECT project_id FROM tasks WHERE id=?1",
            params![task_id],
            |row| row.get::<_, String>(0),
        )
        .optional()?)
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn parse_date(value: &str) -> Result<Date, StoreError> {
    let mut parts = value.splitn(3, '-');
    let (Some(year), Some(month), Some(day)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(StoreError::InvalidInput("invalid stored date"));
    };
    let (Ok(year), Ok(month), Ok(day)) = (year.parse::<i32>(), month.parse::<u8>(), day.parse::<u8>())
    else {
        return Err(StoreError::InvalidInput("invalid stored date"));
    };
    let Ok(month) = Month::try_from(month) else {
        return Err(StoreError::InvalidInput("invalid stored date"));
    };
    Date::from_calendar_date(year, month, day)
        .map_err(|_| StoreError::InvalidInput("invalid stored date"))
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}
