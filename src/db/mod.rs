//! Profile database — the authoritative, durable `user -> profile` mapping.
//!
//! All access is serialized through the connection mutex and every mutation
//! runs inside a single SQL transaction, so profile read-modify-write is
//! linearizable across concurrent callers and a failed write rolls back
//! without touching committed state.

pub mod tables;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

use crate::error::StoreResult;

#[derive(Debug)]
pub struct Database {
    pub(crate) conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the profile database and run migrations.
    ///
    /// A corrupt or unreadable database file is a hard error here, not an
    /// empty profile table: silently starting fresh would discard user data.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;
        Self::migrate(&conn)?;

        log::info!("[PROFILE] Opened profile database at {:?}", path.as_ref());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                active_subject_key TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS subjects (
                user_id TEXT NOT NULL,
                subject_key TEXT NOT NULL,
                display_name TEXT NOT NULL,
                game TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (user_id, subject_key)
            );

            CREATE TABLE IF NOT EXISTS question_bank (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                subject_key TEXT NOT NULL,
                question TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_question_bank_subject
                ON question_bank (user_id, subject_key);",
        )
    }
}
