//! Storage back-ends.
//!
//! The native back-end writes to disk immediately: one write connection
//! behind a mutex, pooled read connections, WAL journaling. The in-memory
//! back-end mirrors the whole database in RAM and flushes to its target
//! file through SQLite's online backup, on `close` and after
//! schema-mutating DDL. The choice is made once, at open time.

use crate::error::{GraphError, Result};
use crate::store::schema;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::backup::Backup;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
struct ReadCustomizer;

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for ReadCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(Duration::from_secs(30))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(())
    }
}

pub enum StoreBackend {
    Native {
        write: Mutex<Connection>,
        read_pool: Pool<SqliteConnectionManager>,
    },
    Memory {
        conn: Mutex<Connection>,
        /// Flush target; `None` keeps the graph purely in RAM.
        target: Option<PathBuf>,
        dirty: AtomicBool,
    },
}

impl StoreBackend {
    pub fn open_native(path: &Path, pool_size: u32) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let write = Connection::open(path)?;
        write.busy_timeout(Duration::from_secs(30))?;
        write.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;
        schema::ensure_schema(&write)?;

        let manager = SqliteConnectionManager::file(path);
        let read_pool = Pool::builder()
            .max_size(pool_size.max(1))
            .connection_timeout(Duration::from_secs(30))
            .connection_customizer(Box::new(ReadCustomizer))
            .build(manager)
            .map_err(|e| GraphError::StoreRead(format!("create read pool: {e}")))?;

        Ok(StoreBackend::Native {
            write: Mutex::new(write),
            read_pool,
        })
    }

    /// Open an in-memory database. When `target` names an existing file its
    /// contents are loaded first, so a sandboxed host can reopen a graph a
    /// native process produced.
    pub fn open_memory(target: Option<&Path>) -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        if let Some(path) = target {
            if path.is_file() {
                let source = Connection::open(path)?;
                let backup = Backup::new(&source, &mut conn)?;
                backup.run_to_completion(64, Duration::from_millis(0), None)?;
            }
        }
        schema::ensure_schema(&conn)?;
        Ok(StoreBackend::Memory {
            conn: Mutex::new(conn),
            target: target.map(Path::to_path_buf),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn is_memory(&self) -> bool {
        matches!(self, StoreBackend::Memory { .. })
    }

    /// Unflushed in-memory state; always false on the native back-end.
    pub fn is_dirty(&self) -> bool {
        match self {
            StoreBackend::Native { .. } => false,
            StoreBackend::Memory { dirty, .. } => dirty.load(Ordering::Relaxed),
        }
    }

    pub fn with_write<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        match self {
            StoreBackend::Native { write, .. } => {
                let mut conn = write
                    .lock()
                    .map_err(|_| GraphError::StoreWrite {
                        context: "write connection poisoned".to_string(),
                        dirty: false,
                    })?;
                f(&mut conn)
            }
            StoreBackend::Memory { conn, dirty, .. } => {
                let mut conn = conn
                    .lock()
                    .map_err(|_| GraphError::StoreWrite {
                        context: "connection poisoned".to_string(),
                        dirty: dirty.load(Ordering::Relaxed),
                    })?;
                dirty.store(true, Ordering::Relaxed);
                f(&mut conn)
            }
        }
    }

    pub fn with_read<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        match self {
            StoreBackend::Native { read_pool, .. } => {
                let conn = read_pool
                    .get()
                    .map_err(|e| GraphError::StoreRead(format!("get read connection: {e}")))?;
                f(&conn)
            }
            StoreBackend::Memory { conn, .. } => {
                let conn = conn
                    .lock()
                    .map_err(|_| GraphError::StoreRead("connection poisoned".to_string()))?;
                f(&conn)
            }
        }
    }

    /// Persist in-memory state to the target file. A no-op on the native
    /// back-end, where every write already hit disk.
    pub fn flush(&self) -> Result<()> {
        match self {
            StoreBackend::Native { .. } => Ok(()),
            StoreBackend::Memory {
                conn,
                target,
                dirty,
            } => {
                let Some(path) = target else {
                    dirty.store(false, Ordering::Relaxed);
                    return Ok(());
                };
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                let conn = conn
                    .lock()
                    .map_err(|_| GraphError::StoreWrite {
                        context: "connection poisoned".to_string(),
                        dirty: true,
                    })?;
                let mut out = Connection::open(path)?;
                {
                    let backup = Backup::new(&conn, &mut out)?;
                    backup
                        .run_to_completion(64, Duration::from_millis(0), None)
                        .map_err(|e| GraphError::StoreWrite {
                            context: format!("flush to {}: {e}", path.display()),
                            dirty: true,
                        })?;
                }
                dirty.store(false, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    /// Flush pending state and drop the connections. Prepared statements
    /// are scoped to individual calls and are already gone by now.
    pub fn close(self) -> Result<()> {
        self.flush()
    }
}
