use jsgraph::analyzer::Analyzer;
use jsgraph::model::{CallGraph, EdgeKind, NodeHit, NodeKind, QueryOptions};
use jsgraph::progress::{CancelToken, NoopProgress};
use jsgraph::query::QueryEngine;
use jsgraph::store::GraphStore;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn temp_repo(label: &str, files: &[(&str, &str)]) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    let root = std::env::temp_dir().join(format!("jsgraph-e2e-{label}-{nanos}-{counter}"));
    for (rel, source) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, source).unwrap();
    }
    std::fs::create_dir_all(&root).unwrap();
    root
}

fn build(root: &PathBuf) -> CallGraph {
    let analyzer = Analyzer::new(root.clone());
    let (graph, _) = analyzer.analyze(&NoopProgress, &CancelToken::new()).unwrap();
    graph
}

fn save(graph: &CallGraph) -> GraphStore {
    let store = GraphStore::open_memory(None).unwrap();
    store.save_graph(graph).unwrap();
    store
}

fn function_id(graph: &CallGraph, name: &str) -> String {
    graph
        .nodes
        .iter()
        .find(|n| {
            n.kind == NodeKind::Function && n.meta.get("name").and_then(Value::as_str) == Some(name)
        })
        .unwrap_or_else(|| panic!("no function named {name}"))
        .id
        .clone()
}

fn hit_ids(hits: &[NodeHit]) -> Vec<String> {
    hits.iter().map(|h| h.id().to_string()).collect()
}

fn sorted_node_keys(graph: &CallGraph) -> Vec<String> {
    let mut keys: Vec<String> = graph
        .nodes
        .iter()
        .map(|n| {
            format!(
                "{}|{}|{}",
                n.id,
                n.kind,
                serde_json::to_string(&n.meta).unwrap()
            )
        })
        .collect();
    keys.sort();
    keys
}

fn sorted_edge_keys(graph: &CallGraph) -> Vec<String> {
    let mut keys: Vec<String> = graph
        .edges
        .iter()
        .map(|e| {
            format!(
                "{}|{}|{}|{}",
                e.from,
                e.to,
                e.kind,
                serde_json::to_string(&e.meta).unwrap()
            )
        })
        .collect();
    keys.sort();
    keys
}

#[test]
fn two_file_cycle_resolves_both_directions() {
    let root = temp_repo(
        "cycle",
        &[
            ("a.js", "import { b } from \"./b\";\nexport function a() { b(); }\n"),
            ("b.js", "import { a } from \"./a\";\nexport function b() { a(); }\n"),
        ],
    );
    let graph = build(&root);
    let fn_a = function_id(&graph, "a");
    let fn_b = function_id(&graph, "b");

    let store = save(&graph);
    let engine = QueryEngine::new(&store);

    let callers = engine.get_callers(&fn_a, &QueryOptions::default()).unwrap();
    assert_eq!(hit_ids(&callers), vec![fn_b.clone()]);
    match &callers[0] {
        NodeHit::Node(node) => assert_eq!(node.name.as_deref(), Some("b")),
        NodeHit::Id(_) => panic!("expected expanded node"),
    }

    // the cycle prevents re-entry; only fn:b is reachable from fn:a
    let reach = engine
        .transitive_callees_flat(&fn_a, &QueryOptions::default())
        .unwrap();
    assert_eq!(hit_ids(&reach), vec![fn_b.clone()]);
    let depth1 = engine
        .transitive_callees_flat(
            &fn_a,
            &QueryOptions {
                max_depth: Some(1),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(hit_ids(&depth1), vec![fn_b.clone()]);

    let chains = engine
        .all_call_chains(
            &fn_a,
            &fn_b,
            &QueryOptions {
                depth_limit: Some(5),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(chains.len(), 1);
    assert_eq!(hit_ids(&chains[0]), vec![fn_a, fn_b]);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn external_method_calls_keep_module_metadata() {
    let root = temp_repo(
        "jwt",
        &[(
            "c.js",
            "import jwt from \"jsonwebtoken\";\nfunction sign(x) { jwt.sign(x); }\n",
        )],
    );
    let graph = build(&root);
    let fn_sign = function_id(&graph, "sign");

    let external = graph.node("external:jsonwebtoken");
    assert!(external.is_some());

    let edge = graph
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::MethodCall && e.from == fn_sign)
        .unwrap();
    assert_eq!(edge.meta.get("external"), Some(&Value::Bool(true)));
    assert_eq!(
        edge.meta.get("moduleName").and_then(Value::as_str),
        Some("jsonwebtoken")
    );
    assert_eq!(edge.meta.get("receiver").and_then(Value::as_str), Some("jwt"));
    assert_eq!(edge.meta.get("method").and_then(Value::as_str), Some("sign"));

    let placeholder = graph.node(&edge.to).unwrap();
    assert_eq!(placeholder.kind, NodeKind::Placeholder);
    assert_eq!(
        placeholder.meta.get("moduleName").and_then(Value::as_str),
        Some("jsonwebtoken")
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn class_methods_link_through_this_calls() {
    let root = temp_repo(
        "svc",
        &[(
            "d.js",
            "class Svc { create(x) { this.save(x); } save(x) {} }\n",
        )],
    );
    let graph = build(&root);

    let methods: Vec<_> = graph
        .nodes
        .iter()
        .filter(|n| n.kind == NodeKind::Method)
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(methods.len(), 2);
    assert!(methods.contains(&"class:d.js:Svc.create".to_string()));
    assert!(methods.contains(&"class:d.js:Svc.save".to_string()));

    let edge = graph
        .edges
        .iter()
        .find(|e| {
            e.kind == EdgeKind::MethodCall
                && e.from == "class:d.js:Svc.create"
                && e.to == "class:d.js:Svc.save"
        })
        .unwrap();
    assert_eq!(edge.meta.get("resolved"), Some(&Value::Bool(true)));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn instance_variables_bind_to_their_class_methods() {
    let root = temp_repo(
        "inst",
        &[
            ("e.js", "import { R } from \"./r\";\nconst r = new R();\nr.doIt();\n"),
            ("r.js", "export class R { doIt() {} }\n"),
        ],
    );
    let graph = build(&root);

    let edge = graph
        .edges
        .iter()
        .find(|e| e.kind == EdgeKind::MethodCall && e.from == "file:e.js")
        .unwrap();
    assert_eq!(edge.to, "class:r.js:R.doIt");
    assert_eq!(edge.meta.get("resolved"), Some(&Value::Bool(true)));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn chain_across_files_ranks_the_middle_as_hotspot() {
    let root = temp_repo(
        "chain",
        &[
            ("x.js", "import { y } from \"./y\";\nexport function x() { y(); }\n"),
            ("y.js", "import { z } from \"./z\";\nexport function y() { z(); }\n"),
            ("z.js", "export function z() {}\n"),
        ],
    );
    let graph = build(&root);
    let fn_y = function_id(&graph, "y");

    let store = save(&graph);
    let engine = QueryEngine::new(&store);

    let entries = engine
        .hotspots(&QueryOptions {
            top: Some(3),
            ..QueryOptions::default()
        })
        .unwrap();
    assert_eq!(entries[0].id, fn_y);
    assert_eq!((entries[0].fan_in, entries[0].fan_out), (1, 1));
    assert_eq!(entries[0].score, 1);
    assert_eq!(entries[1].score, 0);

    let stats = engine.semantic_stats().unwrap();
    assert_eq!(stats.functions, 3);
    assert_eq!(stats.files, 3);
    assert_eq!(stats.function_calls, 2);
    assert_eq!(stats.method_calls, 0);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn empty_source_trees_build_empty_graphs() {
    let root = temp_repo("empty", &[]);
    let graph = build(&root);
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());

    let store = save(&graph);
    let engine = QueryEngine::new(&store);
    assert!(engine
        .get_all_nodes(&QueryOptions::default())
        .unwrap()
        .is_empty());
    assert!(engine.get_all_edges().unwrap().is_empty());
    assert!(engine
        .search_nodes("anything", &QueryOptions::default())
        .unwrap()
        .is_empty());
    assert_eq!(engine.semantic_stats().unwrap().total_nodes, 0);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn rebuilding_an_unchanged_tree_is_deterministic() {
    let files = [
        ("a.js", "import { b } from \"./b\";\nexport function a() { b(); }\n"),
        ("b.js", "import { a } from \"./a\";\nexport function b() { a(); }\n"),
        ("svc.js", "class Svc { create(x) { this.save(x); } save(x) {} }\n"),
    ];
    let root = temp_repo("determinism", &files);

    let first = build(&root);
    let second = build(&root);

    assert_eq!(sorted_node_keys(&first), sorted_node_keys(&second));
    assert_eq!(sorted_edge_keys(&first), sorted_edge_keys(&second));

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn contains_queries_narrow_by_kind() {
    let root = temp_repo(
        "contains",
        &[(
            "app.js",
            "class Svc { run() {} }\nfunction helper() {}\n",
        )],
    );
    let graph = build(&root);
    let store = save(&graph);
    let engine = QueryEngine::new(&store);

    let classes = engine
        .get_functions_in_file(
            "file:app.js",
            &QueryOptions {
                include_types: Some(vec![NodeKind::Class]),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(hit_ids(&classes), vec!["class:app.js:Svc"]);

    let functions = engine
        .get_functions_in_file(
            "file:app.js",
            &QueryOptions {
                include_types: Some(vec![NodeKind::Function]),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(hit_ids(&functions), vec![function_id(&graph, "helper")]);

    let methods = engine
        .get_functions_in_file(
            "class:app.js:Svc",
            &QueryOptions {
                include_types: Some(vec![NodeKind::Method]),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(hit_ids(&methods), vec!["class:app.js:Svc.run"]);

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn node_and_edge_invariants_hold_on_a_mixed_tree() {
    let root = temp_repo(
        "invariants",
        &[
            (
                "src/server.js",
                "import jwt from \"jsonwebtoken\";\nimport { helper } from \"./util\";\nfunction handle(req, res) { jwt.verify(req.token); helper(); res.json({}); }\nhandle();\n",
            ),
            ("src/util.js", "export function helper() { missing(); }\n"),
        ],
    );
    let graph = build(&root);

    // node IDs are injective
    let mut ids: Vec<_> = graph.nodes.iter().map(|n| n.id.clone()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);

    for edge in &graph.edges {
        match edge.kind {
            EdgeKind::Contains => {
                let target = graph.node(&edge.to).unwrap();
                assert!(matches!(
                    target.kind,
                    NodeKind::Class | NodeKind::Method | NodeKind::Function
                ));
            }
            EdgeKind::Call | EdgeKind::MethodCall => {
                let source = graph.node(&edge.from).unwrap();
                assert!(matches!(
                    source.kind,
                    NodeKind::File | NodeKind::Function | NodeKind::Method
                ));
                let target = graph.node(&edge.to).unwrap();
                assert!(matches!(
                    target.kind,
                    NodeKind::Function
                        | NodeKind::Method
                        | NodeKind::Placeholder
                        | NodeKind::External
                ));
                if edge.kind == EdgeKind::MethodCall {
                    let resolved = edge.meta.get("resolved") == Some(&Value::Bool(true));
                    if resolved {
                        assert!(matches!(
                            target.kind,
                            NodeKind::Method | NodeKind::Function
                        ));
                    } else {
                        assert_eq!(target.kind, NodeKind::Placeholder);
                        assert!(target.meta.get("receiver").is_some());
                        assert!(target.meta.get("method").is_some());
                    }
                }
            }
        }
    }

    // unresolved external placeholders keep their module
    let jwt_placeholder = graph
        .nodes
        .iter()
        .find(|n| n.kind == NodeKind::Placeholder && n.id.contains("jwt.verify"))
        .unwrap();
    assert_eq!(
        jwt_placeholder.meta.get("moduleName").and_then(Value::as_str),
        Some("jsonwebtoken")
    );

    let _ = std::fs::remove_dir_all(&root);
}
