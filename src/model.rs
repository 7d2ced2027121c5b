use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Open metadata record attached to nodes and edges. Downstream consumers
/// may add fields without schema churn, so this stays a JSON map end to end.
pub type Meta = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A source file in the project.
    File,
    /// A class declaration.
    Class,
    /// A method of a class.
    Method,
    /// Any non-method callable (declaration, expression, arrow, object method).
    Function,
    /// A foreign module referenced by import.
    External,
    /// An unresolved call site.
    Placeholder,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Class => "class",
            NodeKind::Method => "method",
            NodeKind::Function => "function",
            NodeKind::External => "external",
            NodeKind::Placeholder => "placeholder",
        }
    }

    pub fn parse(value: &str) -> Option<NodeKind> {
        match value {
            "file" => Some(NodeKind::File),
            "class" => Some(NodeKind::Class),
            "method" => Some(NodeKind::Method),
            "function" => Some(NodeKind::Function),
            "external" => Some(NodeKind::External),
            "placeholder" => Some(NodeKind::Placeholder),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Lexical containment: file → class/function, class → method.
    Contains,
    /// Function-level invocation.
    Call,
    /// Member-call expression (`obj.m()`); carries `receiver` and `method`.
    MethodCall,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "contains",
            EdgeKind::Call => "call",
            EdgeKind::MethodCall => "method_call",
        }
    }

    pub fn parse(value: &str) -> Option<EdgeKind> {
        match value {
            "contains" => Some(EdgeKind::Contains),
            "call" => Some(EdgeKind::Call),
            "method_call" => Some(EdgeKind::MethodCall),
            _ => None,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, EdgeKind::Call | EdgeKind::MethodCall)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source position. Lines are 1-based, columns 0-based, matching what the
/// parser reports plus the usual editor convention for lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    pub fn to_value(self) -> Value {
        serde_json::json!({ "line": self.line, "col": self.col })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            meta: Meta::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub meta: Meta,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            meta: Meta::new(),
        }
    }
}

/// The build artifact: a whole graph plus the absolute project root it was
/// analyzed from. Serializes to `{ nodes, edges, sourceRoot }` so it can
/// cross a process boundary between the builder and the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(rename = "sourceRoot")]
    pub source_root: String,
}

impl CallGraph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A node resolved for presentation: common metadata fields pulled out of
/// the open map so transports do not have to know the per-kind layouts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Pos>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Pos>,
    pub meta: Meta,
}

impl ExpandedNode {
    pub fn from_node(node: Node) -> Self {
        let pos_of = |value: Option<&Value>| -> Option<Pos> {
            value.and_then(|v| serde_json::from_value(v.clone()).ok())
        };
        let file = node.meta_str("file").map(str::to_string);
        let name = node
            .meta_str("name")
            .or_else(|| node.meta_str("methodName"))
            .or_else(|| node.meta_str("moduleName"))
            .map(str::to_string);
        let start = pos_of(node.meta.get("start"));
        let end = pos_of(node.meta.get("end"));
        Self {
            id: node.id,
            kind: node.kind,
            label: node.label,
            file,
            name,
            start,
            end,
            meta: node.meta,
        }
    }
}

/// A query result entry: a bare ID when `expanded = false`, a full record
/// otherwise.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NodeHit {
    Id(String),
    Node(Box<ExpandedNode>),
}

impl NodeHit {
    pub fn id(&self) -> &str {
        match self {
            NodeHit::Id(id) => id,
            NodeHit::Node(node) => &node.id,
        }
    }
}

/// One level of a rooted traversal tree. A node already visited on the
/// traversal, or one past the depth bound, appears as a leaf.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub node_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<ExpandedNode>,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotEntry {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<ExpandedNode>,
    #[serde(rename = "in")]
    pub fan_in: usize,
    #[serde(rename = "out")]
    pub fan_out: usize,
    pub score: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub classes: usize,
    pub methods: usize,
    pub functions: usize,
    pub files: usize,
    pub function_calls: usize,
    pub method_calls: usize,
    pub framework_calls: usize,
}

/// Options accepted by every query operation. Unknown fields are ignored so
/// transports can pass options through untouched.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryOptions {
    /// Resolve raw IDs to expanded records. Defaults to true.
    pub expanded: bool,
    /// Restrict results to these node kinds.
    pub include_types: Option<Vec<NodeKind>>,
    /// Drop results of these node kinds. Applied before `include_types`.
    pub exclude_types: Option<Vec<NodeKind>>,
    /// Traversal bound; operation-specific default when unset.
    pub max_depth: Option<usize>,
    /// Return a rooted tree instead of a flat list (traversal only).
    pub tree: bool,
    /// DFS depth bound for path enumeration.
    pub depth_limit: Option<usize>,
    /// Result cap for path enumeration.
    pub max_paths: Option<usize>,
    /// Result cap for hotspots.
    pub top: Option<usize>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            expanded: true,
            include_types: None,
            exclude_types: None,
            max_depth: None,
            tree: false,
            depth_limit: None,
            max_paths: None,
            top: None,
        }
    }
}

impl QueryOptions {
    /// `exclude_types` wins over `include_types` when a kind appears in both.
    pub fn kind_passes(&self, kind: NodeKind) -> bool {
        if let Some(exclude) = &self.exclude_types {
            if exclude.contains(&kind) {
                return false;
            }
        }
        if let Some(include) = &self.include_types {
            return include.contains(&kind);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            NodeKind::File,
            NodeKind::Class,
            NodeKind::Method,
            NodeKind::Function,
            NodeKind::External,
            NodeKind::Placeholder,
        ] {
            assert_eq!(NodeKind::parse(kind.as_str()), Some(kind));
        }
        for kind in [EdgeKind::Contains, EdgeKind::Call, EdgeKind::MethodCall] {
            assert_eq!(EdgeKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn exclude_beats_include() {
        let opts = QueryOptions {
            include_types: Some(vec![NodeKind::Function]),
            exclude_types: Some(vec![NodeKind::Function]),
            ..QueryOptions::default()
        };
        assert!(!opts.kind_passes(NodeKind::Function));
        assert!(!opts.kind_passes(NodeKind::Class));
    }

    #[test]
    fn graph_artifact_shape() {
        let graph = CallGraph {
            nodes: vec![Node::new("file:a.js", NodeKind::File)],
            edges: Vec::new(),
            source_root: "/tmp/proj".to_string(),
        };
        let value = serde_json::to_value(&graph).unwrap();
        assert!(value.get("sourceRoot").is_some());
        assert_eq!(value["nodes"][0]["type"], "file");
    }
}
