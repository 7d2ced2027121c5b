//! Persisted schema DDL.
//!
//! Two tables plus a small key/value side table for graph-level attributes
//! (the absolute source root). Edge identity is `(from_id, to_id, type)`;
//! the autoincrement id preserves insertion order for queries that walk
//! edges in insertion order.

use crate::error::Result;
use rusqlite::Connection;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS nodes (
  id   TEXT PRIMARY KEY,
  type TEXT NOT NULL,
  label TEXT,
  meta TEXT
);
CREATE TABLE IF NOT EXISTS edges (
  id      INTEGER PRIMARY KEY AUTOINCREMENT,
  from_id TEXT NOT NULL,
  to_id   TEXT NOT NULL,
  type    TEXT NOT NULL,
  meta    TEXT,
  UNIQUE(from_id, to_id, type)
);
CREATE TABLE IF NOT EXISTS graph_meta (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_nodes_type ON nodes(type);
CREATE INDEX IF NOT EXISTS idx_edges_from ON edges(from_id);
CREATE INDEX IF NOT EXISTS idx_edges_to   ON edges(to_id);
";

const RESET: &str = "
DROP TABLE IF EXISTS edges;
DROP TABLE IF EXISTS nodes;
DROP TABLE IF EXISTS graph_meta;
";

/// Create missing tables. Safe to replay on an initialized database; the
/// read path relies on this never dropping anything.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Drop and recreate everything. Only the write workflow calls this; a
/// build replaces the previous graph wholesale.
pub fn reset_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(RESET)?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
