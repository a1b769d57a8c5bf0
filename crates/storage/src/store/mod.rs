#![forbid(unsafe_code)]

mod boards;
mod columns;
mod error;
mod events;
mod memberships;
mod ordering;
mod requests;
mod tasks;
mod types;
mod users;

pub use error::StoreError;
pub use requests::*;
pub use types::*;

use kb_core::model::Entity;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DB_FILE: &str = "kanban.db";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    storage_dir: PathBuf,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let conn = Connection::open(storage_dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;

        install_schema(&conn)?;

        Ok(Self { conn, storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }
}

fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          email TEXT NOT NULL UNIQUE,
          password_digest TEXT NOT NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS boards (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          name TEXT NOT NULL,
          created_by INTEGER NOT NULL REFERENCES users(id),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS memberships (
          user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
          board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
          created_at_ms INTEGER NOT NULL,
          PRIMARY KEY (user_id, board_id)
        );

        CREATE TABLE IF NOT EXISTS columns (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          board_id INTEGER NOT NULL REFERENCES boards(id),
          name TEXT NOT NULL,
          rank INTEGER NOT NULL CHECK (rank >= 1),
          created_by INTEGER NOT NULL REFERENCES users(id),
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          column_id INTEGER NOT NULL REFERENCES columns(id),
          title TEXT NOT NULL,
          description TEXT,
          rank INTEGER NOT NULL CHECK (rank >= 1),
          created_by INTEGER NOT NULL REFERENCES users(id),
          assigned_to INTEGER REFERENCES users(id) ON DELETE SET NULL,
          created_at_ms INTEGER NOT NULL,
          updated_at_ms INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          ts_ms INTEGER NOT NULL,
          board_id INTEGER,
          entity TEXT NOT NULL,
          entity_id INTEGER,
          type TEXT NOT NULL,
          payload_json TEXT NOT NULL
        );

        -- Deliberately non-unique: a unique (scope, rank) index would trip
        -- mid-statement while a bulk shift renumbers the tail.
        CREATE INDEX IF NOT EXISTS idx_columns_board_rank ON columns(board_id, rank);
        CREATE INDEX IF NOT EXISTS idx_tasks_column_rank ON tasks(column_id, rank);
        CREATE INDEX IF NOT EXISTS idx_events_board_seq ON events(board_id, seq);
        "#,
    )?;
    Ok(())
}

/// Mutations begin IMMEDIATE so SQLite's write lock is taken at BEGIN, not at
/// the first write. Writers therefore serialize before reading the scope
/// size, and two rank shifts can never interleave. A cross-column move
/// touches both scopes inside this one transaction, so there is no lock
/// ordering to get wrong.
fn write_tx(conn: &mut Connection) -> Result<Transaction<'_>, StoreError> {
    Ok(conn.transaction_with_behavior(TransactionBehavior::Immediate)?)
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

fn user_exists_tx(tx: &Transaction<'_>, user_id: i64) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM users WHERE id=?1",
            params![user_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn ensure_user_exists_tx(tx: &Transaction<'_>, user_id: i64) -> Result<(), StoreError> {
    if user_exists_tx(tx, user_id)? {
        Ok(())
    } else {
        Err(StoreError::InvalidInput("created_by must be an existing user"))
    }
}

fn board_exists_tx(tx: &Transaction<'_>, board_id: i64) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM boards WHERE id=?1",
            params![board_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn membership_exists_tx(
    tx: &Transaction<'_>,
    user_id: i64,
    board_id: i64,
) -> Result<bool, StoreError> {
    Ok(tx
        .query_row(
            "SELECT 1 FROM memberships WHERE user_id=?1 AND board_id=?2",
            params![user_id, board_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == rusqlite::ErrorCode::ConstraintViolation
                || message.as_deref().is_some_and(|value| {
                    value.contains("UNIQUE constraint failed")
                        || value.contains("PRIMARY KEY constraint failed")
                })
        }
        _ => false,
    }
}

fn insert_event_tx(
    tx: &Transaction<'_>,
    ts_ms: i64,
    board_id: Option<i64>,
    entity: Entity,
    entity_id: Option<i64>,
    event_type: &str,
    payload_json: &str,
) -> Result<EventRow, StoreError> {
    tx.execute(
        r#"
        INSERT INTO events(ts_ms, board_id, entity, entity_id, type, payload_json)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![ts_ms, board_id, entity.as_str(), entity_id, event_type, payload_json],
    )?;
    let seq = tx.last_insert_rowid();
    Ok(EventRow {
        seq,
        ts_ms,
        board_id,
        entity: entity.as_str().to_string(),
        entity_id,
        event_type: event_type.to_string(),
        payload_json: payload_json.to_string(),
    })
}
