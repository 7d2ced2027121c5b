//! Hotspot ranking and aggregate graph statistics.

use crate::config::Config;
use crate::error::Result;
use crate::model::{EdgeKind, ExpandedNode, HotspotEntry, NodeKind, QueryOptions, SemanticStats};
use crate::store::GraphStore;

/// Hard bound on how many hotspot entries one call may return.
const HOTSPOT_CAP: usize = 100;

/// Rank nodes by `in × out` over call edges, descending, ties broken by ID
/// ascending.
pub fn hotspots(store: &GraphStore, opts: &QueryOptions) -> Result<Vec<HotspotEntry>> {
    let degrees = store.call_degrees()?;
    let mut entries: Vec<HotspotEntry> = Vec::new();
    for node in store.all_nodes()? {
        if !opts.kind_passes(node.kind) {
            continue;
        }
        let (fan_in, fan_out) = degrees.get(&node.id).copied().unwrap_or((0, 0));
        entries.push(HotspotEntry {
            id: node.id.clone(),
            node: opts.expanded.then(|| ExpandedNode::from_node(node)),
            fan_in,
            fan_out,
            score: fan_in * fan_out,
        });
    }
    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    let top = opts
        .top
        .unwrap_or(Config::get().hotspot_top)
        .min(HOTSPOT_CAP);
    entries.truncate(top);
    Ok(entries)
}

pub fn semantic_stats(store: &GraphStore) -> Result<SemanticStats> {
    let node_counts = store.node_kind_counts()?;
    let edge_counts = store.edge_kind_counts()?;
    let count = |kind: NodeKind| node_counts.get(&kind).copied().unwrap_or(0);
    Ok(SemanticStats {
        total_nodes: node_counts.values().sum(),
        total_edges: edge_counts.values().sum(),
        classes: count(NodeKind::Class),
        methods: count(NodeKind::Method),
        functions: count(NodeKind::Function),
        files: count(NodeKind::File),
        function_calls: edge_counts.get(&EdgeKind::Call).copied().unwrap_or(0),
        method_calls: edge_counts.get(&EdgeKind::MethodCall).copied().unwrap_or(0),
        framework_calls: store.framework_edge_count()?,
    })
}
