//! # jsgraph
//!
//! Static call-graph analysis for JS/TS source trees.
//!
//! One tree-sitter pass per file extracts entities and raw call sites, a
//! cross-file pass binds callees to stable entity IDs, and a builder
//! materializes a deduplicated node/edge graph that is persisted to SQLite
//! and served through a query engine: neighbors, bounded traversals (flat
//! and tree-shaped), simple-path enumeration, hotspot ranking, and fuzzy
//! search.
//!
//! ```rust,no_run
//! use jsgraph::analyzer::Analyzer;
//! use jsgraph::progress::{CancelToken, NoopProgress};
//! use jsgraph::query::QueryEngine;
//! use jsgraph::store::GraphStore;
//! use std::path::PathBuf;
//!
//! # fn main() -> anyhow::Result<()> {
//! let analyzer = Analyzer::new(PathBuf::from("."));
//! let (graph, _stats) = analyzer.analyze(&NoopProgress, &CancelToken::new())?;
//!
//! let store = GraphStore::open_native(std::path::Path::new("graph.sqlite"))?;
//! store.save_graph(&graph)?;
//!
//! let engine = QueryEngine::new(&store);
//! let stats = engine.semantic_stats()?;
//! println!("{} nodes", stats.total_nodes);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod project;
pub mod query;
pub mod rpc;
pub mod store;
pub mod util;

// Re-exports for convenience
pub use error::{GraphError, Result};
pub use model::{
    CallGraph, Edge, EdgeKind, ExpandedNode, Node, NodeHit, NodeKind, QueryOptions, SemanticStats,
};
