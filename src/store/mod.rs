//! Durable graph store.
//!
//! One writer at a time; reads go through prepared statements that live
//! only for the duration of each call. A build replaces the stored graph
//! wholesale: reset, upsert every node, upsert every edge, commit, flush.

use crate::config::Config;
use crate::error::{GraphError, Result};
use crate::model::{CallGraph, Edge, EdgeKind, Meta, Node, NodeKind};
use rusqlite::{params, OptionalExtension, Row};
use std::collections::HashMap;
use std::path::Path;

pub mod backend;
pub mod schema;

pub use backend::StoreBackend;

pub struct GraphStore {
    backend: StoreBackend,
}

impl GraphStore {
    /// Disk-backed store for server and CLI hosts.
    pub fn open_native(path: &Path) -> Result<Self> {
        let backend = StoreBackend::open_native(path, Config::get().pool_size)?;
        Ok(Self { backend })
    }

    /// RAM-mirrored store for sandboxed hosts; flushes to `target` on close.
    pub fn open_memory(target: Option<&Path>) -> Result<Self> {
        let backend = StoreBackend::open_memory(target)?;
        Ok(Self { backend })
    }

    pub fn is_dirty(&self) -> bool {
        self.backend.is_dirty()
    }

    /// Persist a freshly built graph, replacing whatever was stored.
    ///
    /// The node and edge loops run inside one transaction; on failure the
    /// batch rolls back (native) or the error surfaces with `dirty = true`
    /// (in-memory, until the next successful flush).
    pub fn save_graph(&self, graph: &CallGraph) -> Result<()> {
        let dirty_on_err = self.backend.is_memory();
        self.backend.with_write(|conn| {
            schema::reset_schema(conn).map_err(|e| write_error(e, dirty_on_err))?;
            let tx = conn.transaction().map_err(GraphError::from)?;
            {
                let mut node_stmt = tx.prepare(
                    "INSERT INTO nodes (id, type, label, meta) VALUES (?, ?, ?, ?)
                     ON CONFLICT(id) DO UPDATE SET
                        type = excluded.type,
                        label = excluded.label,
                        meta = excluded.meta",
                )?;
                for node in &graph.nodes {
                    node_stmt
                        .execute(params![
                            node.id,
                            node.kind.as_str(),
                            node.label.as_deref(),
                            meta_json(&node.meta)?,
                        ])
                        .map_err(|e| write_error(e.into(), dirty_on_err))?;
                }

                let mut edge_stmt = tx.prepare(
                    "INSERT INTO edges (from_id, to_id, type, meta) VALUES (?, ?, ?, ?)
                     ON CONFLICT(from_id, to_id, type) DO UPDATE SET meta = excluded.meta",
                )?;
                for edge in &graph.edges {
                    edge_stmt
                        .execute(params![
                            edge.from,
                            edge.to,
                            edge.kind.as_str(),
                            meta_json(&edge.meta)?,
                        ])
                        .map_err(|e| write_error(e.into(), dirty_on_err))?;
                }

                tx.execute(
                    "INSERT INTO graph_meta (key, value) VALUES ('source_root', ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![graph.source_root],
                )
                .map_err(|e| write_error(e.into(), dirty_on_err))?;
            }
            tx.commit().map_err(|e| write_error(e.into(), dirty_on_err))?;
            Ok(())
        })?;
        self.backend.flush()
    }

    /// Rehydrate the whole stored graph, nodes and edges in insertion order.
    pub fn load_graph(&self) -> Result<CallGraph> {
        let nodes = self.all_nodes()?;
        let edges = self.all_edges()?;
        let source_root = self.source_root()?.unwrap_or_default();
        Ok(CallGraph {
            nodes,
            edges,
            source_root,
        })
    }

    pub fn source_root(&self) -> Result<Option<String>> {
        self.backend.with_read(|conn| {
            conn.query_row(
                "SELECT value FROM graph_meta WHERE key = 'source_root'",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(read_error)
        })
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        self.backend.with_read(|conn| {
            conn.query_row(
                "SELECT id, type, label, meta FROM nodes WHERE id = ?",
                params![id],
                node_from_row,
            )
            .optional()
            .map_err(read_error)
        })
    }

    pub fn all_nodes(&self) -> Result<Vec<Node>> {
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare("SELECT id, type, label, meta FROM nodes ORDER BY rowid")?;
            collect_nodes(&mut stmt, params![])
        })
    }

    pub fn nodes_by_kind(&self, kind: NodeKind) -> Result<Vec<Node>> {
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, type, label, meta FROM nodes WHERE type = ? ORDER BY rowid",
            )?;
            collect_nodes(&mut stmt, params![kind.as_str()])
        })
    }

    /// Substring match on id or label, capped. Stage 1 of node search.
    pub fn nodes_matching(&self, query: &str, limit: usize) -> Result<Vec<Node>> {
        let pattern = format!("%{}%", query.replace('%', "\\%").replace('_', "\\_"));
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, type, label, meta FROM nodes
                 WHERE id LIKE ? ESCAPE '\\' OR label LIKE ? ESCAPE '\\'
                 ORDER BY rowid LIMIT ?",
            )?;
            collect_nodes(&mut stmt, params![pattern, pattern, limit as i64])
        })
    }

    pub fn all_edges(&self) -> Result<Vec<Edge>> {
        self.backend.with_read(|conn| {
            let mut stmt =
                conn.prepare("SELECT from_id, to_id, type, meta FROM edges ORDER BY id")?;
            collect_edges(&mut stmt, params![])
        })
    }

    /// Outgoing edges in insertion order, optionally restricted by kind.
    pub fn edges_from(&self, id: &str, kinds: Option<&[EdgeKind]>) -> Result<Vec<Edge>> {
        self.edges_touching("from_id", id, kinds)
    }

    /// Incoming edges in insertion order, optionally restricted by kind.
    pub fn edges_to(&self, id: &str, kinds: Option<&[EdgeKind]>) -> Result<Vec<Edge>> {
        self.edges_touching("to_id", id, kinds)
    }

    fn edges_touching(
        &self,
        column: &str,
        id: &str,
        kinds: Option<&[EdgeKind]>,
    ) -> Result<Vec<Edge>> {
        let kind_clause = match kinds {
            Some(kinds) if !kinds.is_empty() => {
                let list = kinds
                    .iter()
                    .map(|k| format!("'{}'", k.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("AND type IN ({list})")
            }
            _ => String::new(),
        };
        let sql = format!(
            "SELECT from_id, to_id, type, meta FROM edges
             WHERE {column} = ? {kind_clause} ORDER BY id"
        );
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            collect_edges(&mut stmt, params![id])
        })
    }

    /// Node counts per kind, one scan.
    pub fn node_kind_counts(&self) -> Result<HashMap<NodeKind, usize>> {
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM nodes GROUP BY type")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })
                .map_err(read_error)?;
            let mut counts = HashMap::new();
            for row in rows {
                let (kind, count) = row.map_err(read_error)?;
                if let Some(kind) = NodeKind::parse(&kind) {
                    counts.insert(kind, count as usize);
                }
            }
            Ok(counts)
        })
    }

    pub fn edge_kind_counts(&self) -> Result<HashMap<EdgeKind, usize>> {
        self.backend.with_read(|conn| {
            let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM edges GROUP BY type")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })
                .map_err(read_error)?;
            let mut counts = HashMap::new();
            for row in rows {
                let (kind, count) = row.map_err(read_error)?;
                if let Some(kind) = EdgeKind::parse(&kind) {
                    counts.insert(kind, count as usize);
                }
            }
            Ok(counts)
        })
    }

    /// Count of call edges carrying `"isFramework": true`. Metadata is
    /// serialized by this crate, so the compact JSON encoding is stable.
    pub fn framework_edge_count(&self) -> Result<usize> {
        self.backend.with_read(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM edges WHERE meta LIKE '%\"isFramework\":true%'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map(|n| n as usize)
            .map_err(read_error)
        })
    }

    /// Per-node fan-in/fan-out over call edges, for hotspot ranking.
    pub fn call_degrees(&self) -> Result<HashMap<String, (usize, usize)>> {
        self.backend.with_read(|conn| {
            let mut degrees: HashMap<String, (usize, usize)> = HashMap::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT to_id, COUNT(*) FROM edges
                     WHERE type IN ('call', 'method_call') GROUP BY to_id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .map_err(read_error)?;
                for row in rows {
                    let (id, count) = row.map_err(read_error)?;
                    degrees.entry(id).or_default().0 = count as usize;
                }
            }
            {
                let mut stmt = conn.prepare(
                    "SELECT from_id, COUNT(*) FROM edges
                     WHERE type IN ('call', 'method_call') GROUP BY from_id",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                    })
                    .map_err(read_error)?;
                for row in rows {
                    let (id, count) = row.map_err(read_error)?;
                    degrees.entry(id).or_default().1 = count as usize;
                }
            }
            Ok(degrees)
        })
    }

    /// Flush (in-memory) and release connections.
    pub fn close(self) -> Result<()> {
        self.backend.close()
    }
}

fn write_error(err: GraphError, dirty: bool) -> GraphError {
    match err {
        GraphError::Sqlite(e) => GraphError::StoreWrite {
            context: e.to_string(),
            dirty,
        },
        other => other,
    }
}

fn read_error(err: rusqlite::Error) -> GraphError {
    GraphError::StoreRead(err.to_string())
}

fn meta_json(meta: &Meta) -> Result<Option<String>> {
    if meta.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(meta)?))
}

fn parse_meta(raw: Option<String>) -> Meta {
    raw.and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

fn node_from_row(row: &Row<'_>) -> std::result::Result<Node, rusqlite::Error> {
    let kind_raw: String = row.get(1)?;
    let kind = NodeKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unknown node kind {kind_raw}").into(),
        )
    })?;
    Ok(Node {
        id: row.get(0)?,
        kind,
        label: row.get(2)?,
        meta: parse_meta(row.get(3)?),
    })
}

fn edge_from_row(row: &Row<'_>) -> std::result::Result<Edge, rusqlite::Error> {
    let kind_raw: String = row.get(2)?;
    let kind = EdgeKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown edge kind {kind_raw}").into(),
        )
    })?;
    Ok(Edge {
        from: row.get(0)?,
        to: row.get(1)?,
        kind,
        meta: parse_meta(row.get(3)?),
    })
}

fn collect_nodes<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<Node>> {
    let rows = stmt.query_map(params, node_from_row).map_err(read_error)?;
    let mut nodes = Vec::new();
    for row in rows {
        nodes.push(row.map_err(read_error)?);
    }
    Ok(nodes)
}

fn collect_edges<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<Edge>> {
    let rows = stmt.query_map(params, edge_from_row).map_err(read_error)?;
    let mut edges = Vec::new();
    for row in rows {
        edges.push(row.map_err(read_error)?);
    }
    Ok(edges)
}
