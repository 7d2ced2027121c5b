//! Tree-sitter pass over one JS/TS source file.
//!
//! Produces the per-file IR of [`extract`](super::extract): entity records,
//! import/export maps, the instance map, and raw call sites with placeholder
//! targets. Resolution happens later, once every file has been walked.

use crate::analyzer::extract::{
    CallKind, CallSite, ClassRecord, FileAnalysis, FunctionRecord, ImportBinding, ImportKind,
    MethodRecord, LOCAL_SENTINEL,
};
use crate::analyzer::ids;
use crate::error::{GraphError, Result};
use crate::model::Pos;
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

pub struct SourceExtractor {
    javascript: Parser,
    typescript: Parser,
    tsx: Parser,
}

impl SourceExtractor {
    pub fn new() -> Result<Self> {
        let mut javascript = Parser::new();
        javascript
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .map_err(|e| GraphError::Parse {
                file: String::new(),
                message: format!("load javascript grammar: {e}"),
            })?;
        let mut typescript = Parser::new();
        typescript
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|e| GraphError::Parse {
                file: String::new(),
                message: format!("load typescript grammar: {e}"),
            })?;
        let mut tsx = Parser::new();
        tsx.set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| GraphError::Parse {
                file: String::new(),
                message: format!("load tsx grammar: {e}"),
            })?;
        Ok(Self {
            javascript,
            typescript,
            tsx,
        })
    }

    /// Walk one file. `rel_path` must already be project-relative with
    /// forward slashes; it is embedded in every ID this pass mints.
    pub fn extract(&mut self, rel_path: &str, source: &str) -> Result<FileAnalysis> {
        let parser = match rel_path.rsplit('.').next() {
            Some("ts") | Some("mts") | Some("cts") => &mut self.typescript,
            Some("tsx") => &mut self.tsx,
            _ => &mut self.javascript,
        };
        let tree = parser.parse(source, None).ok_or_else(|| GraphError::Parse {
            file: rel_path.to_string(),
            message: "parser produced no tree".to_string(),
        })?;

        let mut state = WalkState {
            rel_path,
            source,
            analysis: FileAnalysis::new(rel_path),
            recorded: HashMap::new(),
            caller_stack: Vec::new(),
            class_stack: Vec::new(),
        };
        walk(tree.root_node(), &mut state);
        let mut analysis = state.analysis;
        analysis.resolve_export_sentinels();
        Ok(analysis)
    }
}

struct WalkState<'a> {
    rel_path: &'a str,
    source: &'a str,
    analysis: FileAnalysis,
    /// AST-node id → entity ID; a callable is recorded exactly once per node.
    recorded: HashMap<usize, String>,
    caller_stack: Vec<String>,
    class_stack: Vec<String>,
}

impl<'a> WalkState<'a> {
    fn caller(&self) -> String {
        self.caller_stack
            .last()
            .cloned()
            .unwrap_or_else(|| ids::toplevel_id(self.rel_path))
    }

    /// Record a non-method callable, once per AST node, lazily on first
    /// encounter. Returns its stable ID either way.
    fn record_function(&mut self, node: Node<'a>, name: Option<String>) -> String {
        if let Some(existing) = self.recorded.get(&node.id()) {
            return existing.clone();
        }
        let (start, end) = span(node);
        let id = ids::function_id(self.rel_path, start, end);
        self.recorded.insert(node.id(), id.clone());
        self.analysis.functions.push(FunctionRecord {
            id: id.clone(),
            name,
            start,
            end,
        });
        id
    }

    fn record_class(&mut self, node: Node<'a>, name: &str) -> String {
        if let Some(existing) = self.recorded.get(&node.id()) {
            return existing.clone();
        }
        let (start, end) = span(node);
        let id = ids::class_id(self.rel_path, name);
        self.recorded.insert(node.id(), id.clone());
        self.analysis.classes.push(ClassRecord {
            id: id.clone(),
            name: name.to_string(),
            start,
            end,
            methods: Vec::new(),
        });
        id
    }
}

fn walk<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    match node.kind() {
        "import_statement" => {
            handle_import(node, state);
            return;
        }
        "export_statement" => {
            handle_export(node, state);
            // fall through to the children so declarations and their call
            // sites are walked exactly once, by the generic path
        }
        "class_declaration" | "abstract_class_declaration" => {
            handle_class(node, state);
            return;
        }
        "function_declaration" | "generator_function_declaration" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, state.source));
            enter_function(node, name, state);
            return;
        }
        "function_expression" | "function" | "arrow_function" | "generator_function" => {
            enter_function(node, None, state);
            return;
        }
        "method_definition" => {
            // class methods are consumed by handle_class; reaching here
            // means an object-literal method, which is a plain callable
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, state.source));
            enter_function(node, name, state);
            return;
        }
        "variable_declarator" => {
            handle_declarator(node, state);
            return;
        }
        "assignment_expression" => {
            if let (Some(left), Some(right)) = (
                node.child_by_field_name("left"),
                node.child_by_field_name("right"),
            ) {
                if left.kind() == "identifier" && right.kind() == "new_expression" {
                    record_instance(left, right, state);
                }
            }
        }
        "call_expression" => {
            handle_call(node, state);
            // arguments and chained callees may hold further callables
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, state);
    }
}

/// Record a callable (if not yet recorded), then walk its body with the
/// callable as the active caller.
fn enter_function<'a>(node: Node<'a>, name: Option<String>, state: &mut WalkState<'a>) {
    let id = state.record_function(node, name);
    state.caller_stack.push(id);
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, state);
    }
    state.caller_stack.pop();
}

fn handle_class<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        // anonymous class expressions contribute no class entity; still
        // walk the body for call sites
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            walk(child, state);
        }
        return;
    };
    let class_name = node_text(name_node, state.source);
    state.record_class(node, &class_name);
    state.class_stack.push(class_name.clone());

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            if member.kind() == "method_definition" {
                handle_method(member, &class_name, state);
            } else {
                walk(member, state);
            }
        }
    }
    state.class_stack.pop();
}

fn handle_method<'a>(node: Node<'a>, class_name: &str, state: &mut WalkState<'a>) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let method_name = node_text(name_node, state.source);
    let (start, end) = span(node);
    let id = ids::method_id(state.rel_path, class_name, &method_name);
    if !state.recorded.contains_key(&node.id()) {
        state.recorded.insert(node.id(), id.clone());
        if let Some(class) = state
            .analysis
            .classes
            .iter_mut()
            .find(|c| c.name == *class_name)
        {
            class.methods.push(MethodRecord {
                id: id.clone(),
                name: method_name,
                start,
                end,
            });
        }
    }
    state.caller_stack.push(id);
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk(child, state);
    }
    state.caller_stack.pop();
}

fn handle_declarator<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    let name_node = node.child_by_field_name("name");
    let value_node = node.child_by_field_name("value");

    if let (Some(name), Some(value)) = (name_node, value_node) {
        // const x = require("mod")
        if let Some(source) = require_source(value, state.source) {
            bind_require(name, &source, state);
        } else if name.kind() == "identifier" && value.kind() == "new_expression" {
            record_instance(name, value, state);
        } else if name.kind() == "identifier" && is_callable_kind(value.kind()) {
            let local = node_text(name, state.source);
            state.record_function(value, Some(local));
        }
    }

    if let Some(value) = value_node {
        walk(value, state);
    }
}

fn record_instance<'a>(name: Node<'a>, new_expr: Node<'a>, state: &mut WalkState<'a>) {
    let Some(ctor) = new_expr.child_by_field_name("constructor") else {
        return;
    };
    let class_name = match ctor.kind() {
        "identifier" => node_text(ctor, state.source),
        "member_expression" => ctor
            .child_by_field_name("property")
            .map(|p| node_text(p, state.source))
            .unwrap_or_default(),
        _ => return,
    };
    if class_name.is_empty() {
        return;
    }
    let var = node_text(name, state.source);
    state
        .analysis
        .instance_mapping
        .entry(var)
        .or_insert(class_name);
}

fn handle_call<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    let Some(callee) = node.child_by_field_name("function") else {
        return;
    };
    let line = node.start_position().row as u32 + 1;
    let from = state.caller();

    let (callee_name, receiver, method, kind) = match callee.kind() {
        "identifier" => {
            let name = node_text(callee, state.source);
            if name == "require" {
                return; // import binding, handled at the declarator
            }
            (Some(name), None, None, CallKind::Call)
        }
        "member_expression" => {
            let property = callee
                .child_by_field_name("property")
                .map(|p| node_text(p, state.source));
            let object = callee.child_by_field_name("object");
            let receiver = object.and_then(|o| match o.kind() {
                "identifier" => Some(node_text(o, state.source)),
                "this" => Some("this".to_string()),
                _ => None,
            });
            let callee_name = match (&receiver, &property) {
                (Some(r), Some(m)) => Some(format!("{r}.{m}")),
                (None, Some(m)) => Some(m.clone()),
                _ => None,
            };
            (callee_name, receiver, property, CallKind::MethodCall)
        }
        _ => (None, None, None, CallKind::Call),
    };

    let to = ids::placeholder_id(state.rel_path, callee_name.as_deref(), line);
    state.analysis.calls.push(CallSite {
        from,
        to,
        callee_name,
        receiver,
        method,
        kind,
        line,
    });
}

fn handle_import<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    let Some(source) = node
        .child_by_field_name("source")
        .map(|s| string_text(s, state.source))
    else {
        return;
    };

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "import_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for part in child.named_children(&mut clause_cursor) {
            match part.kind() {
                "identifier" => {
                    let local = node_text(part, state.source);
                    state.analysis.imports.insert(
                        local,
                        ImportBinding {
                            imported: "default".to_string(),
                            source: source.clone(),
                            kind: ImportKind::Default,
                        },
                    );
                }
                "namespace_import" => {
                    let mut ns_cursor = part.walk();
                    for ns_child in part.named_children(&mut ns_cursor) {
                        if ns_child.kind() == "identifier" {
                            let local = node_text(ns_child, state.source);
                            state.analysis.imports.insert(
                                local,
                                ImportBinding {
                                    imported: "*".to_string(),
                                    source: source.clone(),
                                    kind: ImportKind::Namespace,
                                },
                            );
                        }
                    }
                }
                "named_imports" => {
                    let mut named_cursor = part.walk();
                    for spec in part.named_children(&mut named_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec
                            .child_by_field_name("name")
                            .map(|n| node_text(n, state.source))
                        else {
                            continue;
                        };
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|a| node_text(a, state.source))
                            .unwrap_or_else(|| name.clone());
                        state.analysis.imports.insert(
                            local,
                            ImportBinding {
                                imported: name,
                                source: source.clone(),
                                kind: ImportKind::Named,
                            },
                        );
                    }
                }
                _ => {}
            }
        }
    }
}

fn bind_require<'a>(name: Node<'a>, source: &str, state: &mut WalkState<'a>) {
    match name.kind() {
        "identifier" => {
            let local = node_text(name, state.source);
            state.analysis.imports.insert(
                local,
                ImportBinding {
                    imported: "default".to_string(),
                    source: source.to_string(),
                    kind: ImportKind::Require,
                },
            );
        }
        "object_pattern" => {
            let mut cursor = name.walk();
            for prop in name.named_children(&mut cursor) {
                match prop.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let local = node_text(prop, state.source);
                        state.analysis.imports.insert(
                            local.clone(),
                            ImportBinding {
                                imported: local,
                                source: source.to_string(),
                                kind: ImportKind::Named,
                            },
                        );
                    }
                    "pair_pattern" => {
                        let imported = prop
                            .child_by_field_name("key")
                            .map(|k| node_text(k, state.source));
                        let local = prop
                            .child_by_field_name("value")
                            .map(|v| node_text(v, state.source));
                        if let (Some(imported), Some(local)) = (imported, local) {
                            state.analysis.imports.insert(
                                local,
                                ImportBinding {
                                    imported,
                                    source: source.to_string(),
                                    kind: ImportKind::Named,
                                },
                            );
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }
}

fn handle_export<'a>(node: Node<'a>, state: &mut WalkState<'a>) {
    let is_default = has_default_keyword(node, state.source);

    if let Some(declaration) = node.child_by_field_name("declaration") {
        match declaration.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let name = declaration
                    .child_by_field_name("name")
                    .map(|n| node_text(n, state.source));
                let id = state.record_function(declaration, name.clone());
                let exported = if is_default {
                    "default".to_string()
                } else {
                    name.unwrap_or_else(|| "default".to_string())
                };
                state.analysis.exports.entry(exported).or_default().push(id);
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name_node) = declaration.child_by_field_name("name") {
                    let class_name = node_text(name_node, state.source);
                    let id = state.record_class(declaration, &class_name);
                    let exported = if is_default {
                        "default".to_string()
                    } else {
                        class_name
                    };
                    state.analysis.exports.entry(exported).or_default().push(id);
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut cursor = declaration.walk();
                for declarator in declaration.named_children(&mut cursor) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let name = declarator
                        .child_by_field_name("name")
                        .filter(|n| n.kind() == "identifier")
                        .map(|n| node_text(n, state.source));
                    let value = declarator.child_by_field_name("value");
                    if let (Some(name), Some(value)) = (name, value) {
                        if is_callable_kind(value.kind()) {
                            let id = state.record_function(value, Some(name.clone()));
                            state.analysis.exports.entry(name).or_default().push(id);
                        }
                    }
                }
            }
            _ => {}
        }
        return;
    }

    // export { a, b as c } [from "./mod"], bound after the walk
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut clause_cursor = child.walk();
        for spec in child.named_children(&mut clause_cursor) {
            if spec.kind() != "export_specifier" {
                continue;
            }
            let Some(local) = spec
                .child_by_field_name("name")
                .map(|n| node_text(n, state.source))
            else {
                continue;
            };
            let exported = spec
                .child_by_field_name("alias")
                .map(|a| node_text(a, state.source))
                .unwrap_or_else(|| local.clone());
            state
                .analysis
                .exports
                .entry(exported)
                .or_default()
                .push(format!("{LOCAL_SENTINEL}{local}"));
        }
    }

    // export default <expr>
    if is_default {
        if let Some(value) = node.child_by_field_name("value") {
            match value.kind() {
                "identifier" => {
                    let local = node_text(value, state.source);
                    state
                        .analysis
                        .exports
                        .entry("default".to_string())
                        .or_default()
                        .push(format!("{LOCAL_SENTINEL}{local}"));
                }
                kind if is_callable_kind(kind) => {
                    let id = state.record_function(value, None);
                    state
                        .analysis
                        .exports
                        .entry("default".to_string())
                        .or_default()
                        .push(id);
                }
                _ => {}
            }
        }
    }
}

fn has_default_keyword(node: Node<'_>, source: &str) -> bool {
    let mut cursor = node.walk();
    let mut found = false;
    for child in node.children(&mut cursor) {
        if !child.is_named() && node_text(child, source) == "default" {
            found = true;
            break;
        }
    }
    found
}

fn require_source(value: Node<'_>, source: &str) -> Option<String> {
    if value.kind() != "call_expression" {
        return None;
    }
    let callee = value.child_by_field_name("function")?;
    if callee.kind() != "identifier" || node_text(callee, source) != "require" {
        return None;
    }
    let args = value.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args.named_children(&mut cursor).next()?;
    if first.kind() != "string" {
        return None;
    }
    Some(string_text(first, source))
}

fn is_callable_kind(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn node_text(node: Node<'_>, source: &str) -> String {
    source[node.byte_range()].to_string()
}

/// Text of a string literal without its quotes.
fn string_text(node: Node<'_>, source: &str) -> String {
    let raw = node_text(node, source);
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`').to_string()
}

fn span(node: Node<'_>) -> (Pos, Pos) {
    let start = node.start_position();
    let end = node.end_position();
    (
        Pos::new(start.row as u32 + 1, start.column as u32),
        Pos::new(end.row as u32 + 1, end.column as u32),
    )
}
