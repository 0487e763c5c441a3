//! SQLite database holding the `students` and `sync` collections
//!
//! One connection behind an async mutex. Every operation that reads and
//! then writes runs inside an immediate transaction while the mutex is
//! held, so operations are serialized and a failure rolls back to the
//! pre-call state.

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::event::{OutboxEvent, SyncEvent};
use crate::record::StudentRecord;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::fs;
use std::path::Path;
use tokio::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS students (
        id TEXT PRIMARY KEY,
        record TEXT NOT NULL
    ) WITHOUT ROWID;
    CREATE TABLE IF NOT EXISTS sync (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        student_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        payload TEXT NOT NULL
    );
";

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "FULL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    Ok(conn)
}

/// Shared handle to the local database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let conn = if config.in_memory {
            Connection::open_in_memory()?
        } else {
            fs::create_dir_all(&config.data_dir)?;
            open_connection(&config.db_path())?
        };
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Opened store database (in_memory: {})", config.in_memory);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` inside an immediate transaction.
    ///
    /// The transaction commits only if `f` returns `Ok`.
    pub async fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Run a read-only query without opening a write transaction.
    pub async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().await;
        f(&conn)
    }
}

pub(crate) fn load_student(conn: &Connection, id: &str) -> Result<Option<StudentRecord>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT record FROM students WHERE id = ?1",
            rusqlite::params![id],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|json| serde_json::from_str(&json).map_err(StoreError::from))
        .transpose()
}

pub(crate) fn store_student(conn: &Connection, record: &StudentRecord) -> Result<()> {
    let json = serde_json::to_string(record)?;
    conn.execute(
        "INSERT INTO students (id, record) VALUES (?1, ?2) \
         ON CONFLICT(id) DO UPDATE SET record = excluded.record",
        rusqlite::params![record.id, json],
    )?;
    Ok(())
}

pub(crate) fn list_students(conn: &Connection) -> Result<Vec<StudentRecord>> {
    let mut stmt = conn.prepare_cached("SELECT record FROM students ORDER BY id")?;
    let mut rows = stmt.query([])?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        let json: String = row.get(0)?;
        records.push(serde_json::from_str(&json)?);
    }
    Ok(records)
}

pub(crate) fn append_event(conn: &Connection, event: &SyncEvent) -> Result<u64> {
    let payload = serde_json::to_string(event)?;
    conn.execute(
        "INSERT INTO sync (student_id, kind, payload) VALUES (?1, ?2, ?3)",
        rusqlite::params![event.student_id(), event.kind(), payload],
    )?;
    Ok(conn.last_insert_rowid() as u64)
}

pub(crate) fn load_events(conn: &Connection) -> Result<Vec<OutboxEvent>> {
    let mut stmt = conn.prepare_cached("SELECT seq, payload FROM sync ORDER BY seq")?;
    let mut rows = stmt.query([])?;
    let mut events = Vec::new();
    while let Some(row) = rows.next()? {
        let seq: i64 = row.get(0)?;
        let payload: String = row.get(1)?;
        events.push(OutboxEvent {
            sequence_id: seq as u64,
            event: serde_json::from_str(&payload)?,
        });
    }
    Ok(events)
}

pub(crate) fn count_events(conn: &Connection) -> Result<usize> {
    let n: i64 = conn.query_row("SELECT COUNT(*) FROM sync", [], |r| r.get(0))?;
    Ok(n as usize)
}
