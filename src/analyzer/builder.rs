//! Materializes the final node/edge lists from the resolved IR.
//!
//! Nodes are deduplicated by ID, edges by `(from, to, kind)`; re-inserting
//! an edge overwrites its metadata. Two distinct entities claiming one ID
//! abort the build.

use crate::analyzer::extract::{CallKind, FileAnalysis};
use crate::analyzer::ids;
use crate::analyzer::resolve::{CallTarget, ResolvedCall};
use crate::error::{GraphError, Result};
use crate::model::{CallGraph, Edge, EdgeKind, Meta, Node, NodeKind};
use serde_json::json;
use std::collections::{HashMap, HashSet};

/// Receiver and method names that mark a call as host-framework traffic.
/// These are configuration: callers override them per project.
#[derive(Debug, Clone)]
pub struct FrameworkConfig {
    /// Receivers that make any call a framework call.
    pub receivers: HashSet<String>,
    /// Method names that mark a framework call when paired with one of
    /// `method_receivers`.
    pub methods: HashSet<String>,
    pub method_receivers: HashSet<String>,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        let set = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            receivers: set(&["res", "req", "app", "next", "router"]),
            methods: set(&[
                "json", "send", "status", "render", "redirect", "listen", "use", "get", "post",
                "put", "delete", "patch", "route", "set", "header", "end", "sendStatus",
            ]),
            method_receivers: set(&["res", "req", "app", "router"]),
        }
    }
}

impl FrameworkConfig {
    pub fn is_framework(&self, receiver: Option<&str>, method: Option<&str>) -> bool {
        if let Some(receiver) = receiver {
            if self.receivers.contains(receiver) {
                return true;
            }
            if let Some(method) = method {
                return self.methods.contains(method) && self.method_receivers.contains(receiver);
            }
        }
        false
    }
}

#[derive(Default)]
struct GraphAccumulator {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
    edge_index: HashMap<(String, String, EdgeKind), usize>,
}

impl GraphAccumulator {
    /// Insert an entity node. Re-inserting the same entity is idempotent;
    /// a different entity under the same ID is fatal.
    fn insert_entity(&mut self, node: Node) -> Result<()> {
        if let Some(&existing) = self.node_index.get(&node.id) {
            let current = &self.nodes[existing];
            if current.kind == node.kind && current.meta.get("start") == node.meta.get("start") {
                return Ok(());
            }
            return Err(GraphError::IdentifierCollision {
                id: node.id.clone(),
                first: describe(current),
                second: describe(&node),
            });
        }
        self.node_index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Insert a synthesized node (file/external/placeholder) if absent.
    fn ensure_node(&mut self, node: Node) {
        if !self.node_index.contains_key(&node.id) {
            self.node_index.insert(node.id.clone(), self.nodes.len());
            self.nodes.push(node);
        }
    }

    fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    fn add_edge(&mut self, edge: Edge) {
        let key = (edge.from.clone(), edge.to.clone(), edge.kind);
        match self.edge_index.get(&key) {
            Some(&index) => self.edges[index].meta = edge.meta,
            None => {
                self.edge_index.insert(key, self.edges.len());
                self.edges.push(edge);
            }
        }
    }
}

fn describe(node: &Node) -> String {
    match node.label.as_deref() {
        Some(label) => format!("{} `{}`", node.kind, label),
        None => node.kind.to_string(),
    }
}

/// Build the final graph from per-file analyses and resolved calls.
pub fn build_graph(
    analyses: &[FileAnalysis],
    calls: &[ResolvedCall],
    source_root: &str,
    framework: &FrameworkConfig,
) -> Result<CallGraph> {
    let mut acc = GraphAccumulator::default();

    // 1. class nodes, with file → class containment
    for analysis in analyses {
        for class in &analysis.classes {
            acc.ensure_node(file_node(&analysis.rel_path));
            let mut meta = Meta::new();
            meta.insert("file".into(), json!(analysis.rel_path));
            meta.insert("name".into(), json!(class.name));
            meta.insert("start".into(), class.start.to_value());
            meta.insert("end".into(), class.end.to_value());
            let node = Node {
                id: class.id.clone(),
                kind: NodeKind::Class,
                label: Some(class.name.clone()),
                meta,
            };
            acc.insert_entity(node)?;
            acc.add_edge(Edge::new(
                ids::file_id(&analysis.rel_path),
                class.id.clone(),
                EdgeKind::Contains,
            ));
        }
    }

    // 2. method nodes, with class → method containment
    for analysis in analyses {
        for class in &analysis.classes {
            for method in &class.methods {
                let mut meta = Meta::new();
                meta.insert("file".into(), json!(analysis.rel_path));
                meta.insert("className".into(), json!(class.name));
                meta.insert("methodName".into(), json!(method.name));
                meta.insert("start".into(), method.start.to_value());
                meta.insert("end".into(), method.end.to_value());
                let node = Node {
                    id: method.id.clone(),
                    kind: NodeKind::Method,
                    label: Some(format!("{}.{}", class.name, method.name)),
                    meta,
                };
                acc.insert_entity(node)?;
                acc.add_edge(Edge::new(
                    class.id.clone(),
                    method.id.clone(),
                    EdgeKind::Contains,
                ));
            }
        }
    }

    // 3. file nodes (idempotent with step 1)
    for analysis in analyses {
        acc.ensure_node(file_node(&analysis.rel_path));
    }

    // 4. function nodes, with file → function containment
    for analysis in analyses {
        for function in &analysis.functions {
            let mut meta = Meta::new();
            meta.insert("file".into(), json!(analysis.rel_path));
            if let Some(name) = &function.name {
                meta.insert("name".into(), json!(name));
            }
            meta.insert("start".into(), function.start.to_value());
            meta.insert("end".into(), function.end.to_value());
            let node = Node {
                id: function.id.clone(),
                kind: NodeKind::Function,
                label: function.name.clone(),
                meta,
            };
            acc.insert_entity(node)?;
            acc.add_edge(Edge::new(
                ids::file_id(&analysis.rel_path),
                function.id.clone(),
                EdgeKind::Contains,
            ));
        }
    }

    // 5. call edges
    for call in calls {
        let from = match ids::toplevel_file(&call.from) {
            Some(file) => {
                let id = ids::file_id(file);
                acc.ensure_node(file_node(file));
                id
            }
            None => call.from.clone(),
        };
        let edge_kind = match call.kind {
            CallKind::Call => EdgeKind::Call,
            CallKind::MethodCall => EdgeKind::MethodCall,
        };
        let is_framework =
            framework.is_framework(call.receiver.as_deref(), call.method.as_deref());

        let mut edge_meta = Meta::new();
        if let Some(receiver) = &call.receiver {
            edge_meta.insert("receiver".into(), json!(receiver));
        }
        if let Some(method) = &call.method {
            edge_meta.insert("method".into(), json!(method));
        }
        if is_framework {
            edge_meta.insert("isFramework".into(), json!(true));
        }

        let to = match &call.target {
            CallTarget::Internal(id) => {
                edge_meta.insert("resolved".into(), json!(true));
                if !acc.has_node(id) {
                    // defensive: a resolved ID should exist by now
                    let mut meta = Meta::new();
                    meta.insert("placeholderId".into(), json!(id));
                    acc.ensure_node(Node {
                        id: id.clone(),
                        kind: NodeKind::Placeholder,
                        label: None,
                        meta,
                    });
                }
                id.clone()
            }
            CallTarget::External { module } => {
                edge_meta.insert("resolved".into(), json!(false));
                edge_meta.insert("external".into(), json!(true));
                edge_meta.insert("moduleName".into(), json!(module));
                acc.ensure_node(external_node(module));
                acc.ensure_node(placeholder_node(call, Some(module), is_framework));
                call.placeholder.clone()
            }
            CallTarget::Unresolved => {
                edge_meta.insert("resolved".into(), json!(false));
                acc.ensure_node(placeholder_node(call, None, is_framework));
                call.placeholder.clone()
            }
        };

        acc.add_edge(Edge {
            from,
            to,
            kind: edge_kind,
            meta: edge_meta,
        });
    }

    Ok(CallGraph {
        nodes: acc.nodes,
        edges: acc.edges,
        source_root: source_root.to_string(),
    })
}

fn file_node(rel_path: &str) -> Node {
    let mut meta = Meta::new();
    meta.insert("path".into(), json!(rel_path));
    Node {
        id: ids::file_id(rel_path),
        kind: NodeKind::File,
        label: Some(rel_path.to_string()),
        meta,
    }
}

fn external_node(module: &str) -> Node {
    let mut meta = Meta::new();
    meta.insert("moduleName".into(), json!(module));
    Node {
        id: ids::external_id(module),
        kind: NodeKind::External,
        label: Some(module.to_string()),
        meta,
    }
}

fn placeholder_node(call: &ResolvedCall, module: Option<&str>, is_framework: bool) -> Node {
    let mut meta = Meta::new();
    meta.insert("placeholderId".into(), json!(call.placeholder));
    meta.insert("file".into(), json!(call.file));
    if let Some(callee) = &call.callee_name {
        meta.insert("calleeName".into(), json!(callee));
    }
    meta.insert("line".into(), json!(call.line));
    if let Some(receiver) = &call.receiver {
        meta.insert("receiver".into(), json!(receiver));
    }
    if let Some(method) = &call.method {
        meta.insert("method".into(), json!(method));
    }
    if let Some(module) = module {
        meta.insert("external".into(), json!(true));
        meta.insert("moduleName".into(), json!(module));
    }
    if is_framework {
        meta.insert("isFramework".into(), json!(true));
    }

    let label = match (&call.receiver, &call.method) {
        (Some(receiver), Some(method)) => format!("{receiver}.{method}()"),
        _ => match &call.callee_name {
            Some(callee) => format!("{callee}()"),
            None => "anonymous()".to_string(),
        },
    };

    Node {
        id: call.placeholder.clone(),
        kind: NodeKind::Placeholder,
        label: Some(label),
        meta,
    }
}
