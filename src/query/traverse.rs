//! Bounded graph traversals over call edges.
//!
//! Call graphs are cyclic, so every traversal carries a visited set; in
//! tree-shaped results a back-edge shows up as a leaf. Neighbor iteration
//! follows edge-insertion order, which is deterministic per build.

use crate::error::Result;
use crate::model::{EdgeKind, ExpandedNode, QueryOptions, TreeNode};
use crate::store::GraphStore;
use std::collections::{HashSet, VecDeque};

pub const CALL_KINDS: &[EdgeKind] = &[EdgeKind::Call, EdgeKind::MethodCall];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow incoming call edges (who calls this).
    Callers,
    /// Follow outgoing call edges (what this calls).
    Callees,
}

/// Direct call neighbors in edge-insertion order, deduplicated.
pub fn neighbors(store: &GraphStore, id: &str, direction: Direction) -> Result<Vec<String>> {
    let edges = match direction {
        Direction::Callers => store.edges_to(id, Some(CALL_KINDS))?,
        Direction::Callees => store.edges_from(id, Some(CALL_KINDS))?,
    };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for edge in edges {
        let other = match direction {
            Direction::Callers => edge.from,
            Direction::Callees => edge.to,
        };
        if seen.insert(other.clone()) {
            out.push(other);
        }
    }
    Ok(out)
}

/// Flat BFS. Depth counts edges; the start node is never part of the
/// result. `max_depth = 0` yields nothing.
pub fn bfs_flat(
    store: &GraphStore,
    start: &str,
    direction: Direction,
    max_depth: usize,
) -> Result<Vec<String>> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((start.to_string(), 0));
    let mut out = Vec::new();

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for next in neighbors(store, &id, direction)? {
            if visited.insert(next.clone()) {
                out.push(next.clone());
                queue.push_back((next, depth + 1));
            }
        }
    }
    Ok(out)
}

/// DFS producing a tree rooted at `start`. A previously-visited node, or
/// one at the depth bound, appears as a leaf. Kind filters prune a node
/// together with its subtree; the root is always kept.
pub fn dfs_tree(
    store: &GraphStore,
    start: &str,
    direction: Direction,
    max_depth: usize,
    opts: &QueryOptions,
) -> Result<TreeNode> {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(start.to_string());
    build_tree(store, start, direction, 0, max_depth, &mut visited, opts)
}

fn build_tree(
    store: &GraphStore,
    id: &str,
    direction: Direction,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<String>,
    opts: &QueryOptions,
) -> Result<TreeNode> {
    let mut tree = make_node(store, id, opts)?;
    if depth >= max_depth {
        return Ok(tree);
    }
    for next in neighbors(store, id, direction)? {
        let kind = store.get_node(&next)?.map(|n| n.kind);
        if let Some(kind) = kind {
            if !opts.kind_passes(kind) {
                continue;
            }
        }
        if visited.contains(&next) {
            tree.children.push(make_node(store, &next, opts)?);
            continue;
        }
        visited.insert(next.clone());
        tree.children.push(build_tree(
            store, &next, direction, depth + 1, max_depth, visited, opts,
        )?);
    }
    Ok(tree)
}

fn make_node(store: &GraphStore, id: &str, opts: &QueryOptions) -> Result<TreeNode> {
    let node = if opts.expanded {
        store.get_node(id)?.map(ExpandedNode::from_node)
    } else {
        None
    };
    Ok(TreeNode {
        node_id: id.to_string(),
        node,
        children: Vec::new(),
    })
}

/// All simple paths from `start` to `target` over outgoing call edges, in
/// edge-insertion order, at most `depth_limit` edges long, capped at
/// `max_paths`.
///
/// `start == target` returns the single zero-length path `[start]`.
pub fn simple_paths(
    store: &GraphStore,
    start: &str,
    target: &str,
    depth_limit: usize,
    max_paths: usize,
) -> Result<Vec<Vec<String>>> {
    if max_paths == 0 {
        return Ok(Vec::new());
    }
    if start == target {
        return Ok(vec![vec![start.to_string()]]);
    }
    let mut out = Vec::new();
    let mut path = vec![start.to_string()];
    let mut on_path: HashSet<String> = HashSet::new();
    on_path.insert(start.to_string());
    walk_paths(
        store,
        start,
        target,
        0,
        depth_limit,
        max_paths,
        &mut path,
        &mut on_path,
        &mut out,
    )?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn walk_paths(
    store: &GraphStore,
    current: &str,
    target: &str,
    depth: usize,
    depth_limit: usize,
    max_paths: usize,
    path: &mut Vec<String>,
    on_path: &mut HashSet<String>,
    out: &mut Vec<Vec<String>>,
) -> Result<()> {
    for next in neighbors(store, current, Direction::Callees)? {
        if out.len() >= max_paths {
            return Ok(());
        }
        if next == target {
            if depth + 1 <= depth_limit {
                let mut found = path.clone();
                found.push(next.clone());
                out.push(found);
            }
            continue;
        }
        if depth + 1 >= depth_limit || on_path.contains(&next) {
            continue;
        }
        on_path.insert(next.clone());
        path.push(next.clone());
        walk_paths(
            store,
            &next,
            target,
            depth + 1,
            depth_limit,
            max_paths,
            path,
            on_path,
            out,
        )?;
        path.pop();
        on_path.remove(&next);
    }
    Ok(())
}
