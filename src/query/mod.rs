//! Query engine over a stored graph.
//!
//! Every operation is read-only and total: a missing node yields an empty
//! result (or `None` for [`QueryEngine::get_node`]), never an error. Store
//! read failures are the only error path.

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    Edge, EdgeKind, ExpandedNode, Node, NodeHit, QueryOptions, SemanticStats, TreeNode,
};
use crate::store::GraphStore;
use std::collections::HashSet;

pub mod hotspots;
pub mod traverse;

pub use traverse::Direction;

pub struct QueryEngine<'a> {
    store: &'a GraphStore,
}

impl<'a> QueryEngine<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    pub fn get_node(&self, id: &str) -> Result<Option<Node>> {
        self.store.get_node(id)
    }

    pub fn get_all_edges(&self) -> Result<Vec<Edge>> {
        self.store.all_edges()
    }

    pub fn get_all_nodes(&self, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let mut hits = Vec::new();
        for node in self.store.all_nodes()? {
            if !opts.kind_passes(node.kind) {
                continue;
            }
            hits.push(self.node_hit(node, opts));
        }
        Ok(hits)
    }

    /// Direct callers: sources of incoming `call`/`method_call` edges.
    pub fn get_callers(&self, id: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let ids = traverse::neighbors(self.store, id, Direction::Callers)?;
        self.collect_hits(ids, opts)
    }

    /// Direct callees: targets of outgoing `call`/`method_call` edges.
    pub fn get_callees(&self, id: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let ids = traverse::neighbors(self.store, id, Direction::Callees)?;
        self.collect_hits(ids, opts)
    }

    /// Containment expansion: entities a file (or class) directly contains.
    /// Callers narrow with `include_types` to get "methods of class" or
    /// "classes in file".
    pub fn get_functions_in_file(&self, id: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let edges = self
            .store
            .edges_from(id, Some(&[EdgeKind::Contains]))?;
        let ids = edges.into_iter().map(|e| e.to).collect();
        self.collect_hits(ids, opts)
    }

    pub fn transitive_callers_flat(&self, id: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let depth = opts.max_depth.unwrap_or(Config::get().bfs_max_depth);
        let ids = traverse::bfs_flat(self.store, id, Direction::Callers, depth)?;
        self.collect_hits(ids, opts)
    }

    pub fn transitive_callees_flat(&self, id: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let depth = opts.max_depth.unwrap_or(Config::get().bfs_max_depth);
        let ids = traverse::bfs_flat(self.store, id, Direction::Callees, depth)?;
        self.collect_hits(ids, opts)
    }

    pub fn transitive_callers_tree(&self, id: &str, opts: &QueryOptions) -> Result<TreeNode> {
        let depth = opts.max_depth.unwrap_or(Config::get().tree_max_depth);
        traverse::dfs_tree(self.store, id, Direction::Callers, depth, opts)
    }

    pub fn transitive_callees_tree(&self, id: &str, opts: &QueryOptions) -> Result<TreeNode> {
        let depth = opts.max_depth.unwrap_or(Config::get().tree_max_depth);
        traverse::dfs_tree(self.store, id, Direction::Callees, depth, opts)
    }

    /// All simple call paths from `start` to `target`.
    /// `start == target` yields the zero-length path `[start]`.
    pub fn all_call_chains(
        &self,
        start: &str,
        target: &str,
        opts: &QueryOptions,
    ) -> Result<Vec<Vec<NodeHit>>> {
        let config = Config::get();
        let depth_limit = opts.depth_limit.unwrap_or(config.path_depth_limit);
        let max_paths = opts.max_paths.unwrap_or(config.max_paths);
        let paths = traverse::simple_paths(self.store, start, target, depth_limit, max_paths)?;
        let mut out = Vec::with_capacity(paths.len());
        for path in paths {
            let mut hits = Vec::with_capacity(path.len());
            for id in path {
                hits.push(self.hit_by_id(id, opts)?);
            }
            out.push(hits);
        }
        Ok(out)
    }

    pub fn hotspots(&self, opts: &QueryOptions) -> Result<Vec<crate::model::HotspotEntry>> {
        hotspots::hotspots(self.store, opts)
    }

    pub fn semantic_stats(&self) -> Result<SemanticStats> {
        hotspots::semantic_stats(self.store)
    }

    /// Four-stage fuzzy search, first match wins:
    /// ① substring over id/label, ② substring over `meta.name` and
    /// `meta.moduleName` (case-insensitive), ③ edge-metadata alias match
    /// (receiver/moduleName) yielding the edge targets, ④ kind filters.
    /// Deduplicated by ID preserving first occurrence, capped.
    pub fn search_nodes(&self, query: &str, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let limit = Config::get().search_limit.min(100);
        let needle = query.to_lowercase();
        let mut ordered: Vec<Node> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // stage 1: id / label substring, in the store
        for node in self.store.nodes_matching(query, limit)? {
            if seen.insert(node.id.clone()) {
                ordered.push(node);
            }
        }

        // stage 2: metadata name / moduleName substring
        for node in self.store.all_nodes()? {
            if seen.contains(&node.id) {
                continue;
            }
            let matched = ["moduleName", "name"].iter().any(|key| {
                node.meta_str(key)
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
            if matched {
                seen.insert(node.id.clone());
                ordered.push(node);
            }
        }

        // stage 3: edge alias metadata, collecting edge targets
        for edge in self.store.all_edges()? {
            if seen.contains(&edge.to) {
                continue;
            }
            let matched = ["receiver", "moduleName"].iter().any(|key| {
                edge.meta
                    .get(*key)
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            });
            if matched {
                if let Some(node) = self.store.get_node(&edge.to)? {
                    seen.insert(node.id.clone());
                    ordered.push(node);
                }
            }
        }

        // stage 4: kind filters, then cap
        let mut hits = Vec::new();
        for node in ordered {
            if !opts.kind_passes(node.kind) {
                continue;
            }
            hits.push(self.node_hit(node, opts));
            if hits.len() >= limit {
                break;
            }
        }
        Ok(hits)
    }

    fn node_hit(&self, node: Node, opts: &QueryOptions) -> NodeHit {
        if opts.expanded {
            NodeHit::Node(Box::new(ExpandedNode::from_node(node)))
        } else {
            NodeHit::Id(node.id)
        }
    }

    fn hit_by_id(&self, id: String, opts: &QueryOptions) -> Result<NodeHit> {
        if !opts.expanded {
            return Ok(NodeHit::Id(id));
        }
        Ok(match self.store.get_node(&id)? {
            Some(node) => NodeHit::Node(Box::new(ExpandedNode::from_node(node))),
            None => NodeHit::Id(id),
        })
    }

    fn collect_hits(&self, ids: Vec<String>, opts: &QueryOptions) -> Result<Vec<NodeHit>> {
        let mut hits = Vec::new();
        for id in ids {
            match self.store.get_node(&id)? {
                Some(node) => {
                    if !opts.kind_passes(node.kind) {
                        continue;
                    }
                    hits.push(self.node_hit(node, opts));
                }
                None => {
                    // dangling target; only meaningful when no kind filter
                    if opts.include_types.is_none() && opts.exclude_types.is_none() {
                        hits.push(NodeHit::Id(id));
                    }
                }
            }
        }
        Ok(hits)
    }
}
