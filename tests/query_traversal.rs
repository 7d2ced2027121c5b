use jsgraph::model::{CallGraph, Edge, EdgeKind, Node, NodeHit, NodeKind, QueryOptions, TreeNode};
use jsgraph::query::QueryEngine;
use jsgraph::store::GraphStore;
use std::collections::HashSet;

fn store_with(nodes: &[(&str, NodeKind)], edges: &[(&str, &str, EdgeKind)]) -> GraphStore {
    let graph = CallGraph {
        nodes: nodes
            .iter()
            .map(|(id, kind)| Node::new(*id, *kind))
            .collect(),
        edges: edges
            .iter()
            .map(|(from, to, kind)| Edge::new(*from, *to, *kind))
            .collect(),
        source_root: "/proj".to_string(),
    };
    let store = GraphStore::open_memory(None).unwrap();
    store.save_graph(&graph).unwrap();
    store
}

fn ids(hits: &[NodeHit]) -> Vec<String> {
    hits.iter().map(|h| h.id().to_string()).collect()
}

fn id_set(hits: &[NodeHit]) -> HashSet<String> {
    ids(hits).into_iter().collect()
}

fn tree_ids(tree: &TreeNode) -> HashSet<String> {
    let mut set = HashSet::new();
    collect_tree_ids(tree, &mut set);
    set
}

fn collect_tree_ids(tree: &TreeNode, set: &mut HashSet<String>) {
    set.insert(tree.node_id.clone());
    for child in &tree.children {
        collect_tree_ids(child, set);
    }
}

fn chain_store() -> GraphStore {
    // x → y → z
    store_with(
        &[
            ("fn:x", NodeKind::Function),
            ("fn:y", NodeKind::Function),
            ("fn:z", NodeKind::Function),
        ],
        &[
            ("fn:x", "fn:y", EdgeKind::Call),
            ("fn:y", "fn:z", EdgeKind::Call),
        ],
    )
}

#[test]
fn direct_neighbors_cross_call_and_method_call() {
    let store = store_with(
        &[
            ("fn:a", NodeKind::Function),
            ("fn:b", NodeKind::Function),
            ("class:m.js:S.go", NodeKind::Method),
        ],
        &[
            ("fn:a", "fn:b", EdgeKind::Call),
            ("fn:a", "class:m.js:S.go", EdgeKind::MethodCall),
        ],
    );
    let engine = QueryEngine::new(&store);
    let opts = QueryOptions::default();

    let callees = engine.get_callees("fn:a", &opts).unwrap();
    assert_eq!(
        id_set(&callees),
        HashSet::from(["fn:b".to_string(), "class:m.js:S.go".to_string()])
    );

    let callers = engine.get_callers("fn:b", &opts).unwrap();
    assert_eq!(ids(&callers), vec!["fn:a"]);
}

#[test]
fn bfs_excludes_the_start_and_respects_depth() {
    let store = chain_store();
    let engine = QueryEngine::new(&store);

    let all = engine
        .transitive_callees_flat("fn:x", &QueryOptions::default())
        .unwrap();
    assert_eq!(
        id_set(&all),
        HashSet::from(["fn:y".to_string(), "fn:z".to_string()])
    );

    let one = engine
        .transitive_callees_flat(
            "fn:x",
            &QueryOptions {
                max_depth: Some(1),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(id_set(&one), HashSet::from(["fn:y".to_string()]));

    let zero = engine
        .transitive_callees_flat(
            "fn:x",
            &QueryOptions {
                max_depth: Some(0),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert!(zero.is_empty());

    let callers = engine
        .transitive_callers_flat("fn:z", &QueryOptions::default())
        .unwrap();
    assert_eq!(
        id_set(&callers),
        HashSet::from(["fn:x".to_string(), "fn:y".to_string()])
    );
}

#[test]
fn cycles_terminate_and_prune_to_leaves() {
    let store = store_with(
        &[("fn:a", NodeKind::Function), ("fn:b", NodeKind::Function)],
        &[
            ("fn:a", "fn:b", EdgeKind::Call),
            ("fn:b", "fn:a", EdgeKind::Call),
        ],
    );
    let engine = QueryEngine::new(&store);

    let flat = engine
        .transitive_callees_flat("fn:a", &QueryOptions::default())
        .unwrap();
    assert_eq!(id_set(&flat), HashSet::from(["fn:b".to_string()]));

    let tree = engine
        .transitive_callees_tree("fn:a", &QueryOptions::default())
        .unwrap();
    assert_eq!(tree.node_id, "fn:a");
    assert_eq!(tree.children.len(), 1);
    let b = &tree.children[0];
    assert_eq!(b.node_id, "fn:b");
    // the back-edge to fn:a shows up as a leaf
    assert_eq!(b.children.len(), 1);
    assert_eq!(b.children[0].node_id, "fn:a");
    assert!(b.children[0].children.is_empty());
}

#[test]
fn self_recursion_appears_once_and_terminates() {
    let store = store_with(
        &[("fn:f", NodeKind::Function)],
        &[("fn:f", "fn:f", EdgeKind::Call)],
    );
    let engine = QueryEngine::new(&store);

    let flat = engine
        .transitive_callees_flat("fn:f", &QueryOptions::default())
        .unwrap();
    assert!(flat.is_empty());

    let chains = engine
        .all_call_chains("fn:f", "fn:f", &QueryOptions::default())
        .unwrap();
    assert_eq!(chains.len(), 1);
    assert_eq!(ids(&chains[0]), vec!["fn:f"]);
}

#[test]
fn flat_and_tree_traversals_agree_on_reach() {
    let store = store_with(
        &[
            ("fn:a", NodeKind::Function),
            ("fn:b", NodeKind::Function),
            ("fn:c", NodeKind::Function),
            ("fn:d", NodeKind::Function),
        ],
        &[
            ("fn:a", "fn:b", EdgeKind::Call),
            ("fn:a", "fn:c", EdgeKind::Call),
            ("fn:b", "fn:d", EdgeKind::Call),
            ("fn:c", "fn:d", EdgeKind::Call),
            ("fn:d", "fn:a", EdgeKind::Call),
        ],
    );
    let engine = QueryEngine::new(&store);

    for depth in [1, 2, 3, 10] {
        let opts = QueryOptions {
            max_depth: Some(depth),
            ..QueryOptions::default()
        };
        let flat = engine.transitive_callees_flat("fn:a", &opts).unwrap();
        let tree = engine.transitive_callees_tree("fn:a", &opts).unwrap();
        let mut from_tree = tree_ids(&tree);
        from_tree.remove("fn:a");
        assert_eq!(id_set(&flat), from_tree, "depth {depth}");
    }
}

#[test]
fn max_depth_zero_tree_is_root_only() {
    let store = chain_store();
    let engine = QueryEngine::new(&store);
    let tree = engine
        .transitive_callees_tree(
            "fn:x",
            &QueryOptions {
                max_depth: Some(0),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(tree.node_id, "fn:x");
    assert!(tree.children.is_empty());
}

#[test]
fn call_chains_are_simple_sound_and_bounded() {
    let store = store_with(
        &[
            ("fn:x", NodeKind::Function),
            ("fn:y", NodeKind::Function),
            ("fn:z", NodeKind::Function),
        ],
        &[
            ("fn:x", "fn:y", EdgeKind::Call),
            ("fn:x", "fn:z", EdgeKind::Call),
            ("fn:y", "fn:z", EdgeKind::Call),
            ("fn:z", "fn:x", EdgeKind::Call),
        ],
    );
    let engine = QueryEngine::new(&store);

    let chains = engine
        .all_call_chains("fn:x", "fn:z", &QueryOptions::default())
        .unwrap();
    let paths: HashSet<Vec<String>> = chains.iter().map(|c| ids(c)).collect();
    assert_eq!(
        paths,
        HashSet::from([
            vec!["fn:x".to_string(), "fn:z".to_string()],
            vec!["fn:x".to_string(), "fn:y".to_string(), "fn:z".to_string()],
        ])
    );

    for chain in &chains {
        let path = ids(chain);
        assert_eq!(path.first().map(String::as_str), Some("fn:x"));
        assert_eq!(path.last().map(String::as_str), Some("fn:z"));
        let unique: HashSet<_> = path.iter().collect();
        assert_eq!(unique.len(), path.len(), "no repeated node on a path");
    }

    let short = engine
        .all_call_chains(
            "fn:x",
            "fn:z",
            &QueryOptions {
                depth_limit: Some(1),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(short.len(), 1);
    assert_eq!(ids(&short[0]), vec!["fn:x", "fn:z"]);

    let capped = engine
        .all_call_chains(
            "fn:x",
            "fn:z",
            &QueryOptions {
                max_paths: Some(1),
                ..QueryOptions::default()
            },
        )
        .unwrap();
    assert_eq!(capped.len(), 1);
}

#[test]
fn missing_nodes_yield_empty_results_not_errors() {
    let store = chain_store();
    let engine = QueryEngine::new(&store);
    let opts = QueryOptions::default();

    assert!(engine.get_node("fn:absent").unwrap().is_none());
    assert!(engine.get_callers("fn:absent", &opts).unwrap().is_empty());
    assert!(engine.get_callees("fn:absent", &opts).unwrap().is_empty());
    assert!(engine
        .transitive_callees_flat("fn:absent", &opts)
        .unwrap()
        .is_empty());
    let tree = engine.transitive_callees_tree("fn:absent", &opts).unwrap();
    assert!(tree.children.is_empty());
    assert!(engine
        .all_call_chains("fn:absent", "fn:x", &opts)
        .unwrap()
        .is_empty());
}

#[test]
fn filters_drop_kinds_from_flat_results() {
    let store = store_with(
        &[
            ("fn:a", NodeKind::Function),
            ("placeholder::z.js::go::1", NodeKind::Placeholder),
            ("fn:b", NodeKind::Function),
        ],
        &[
            ("fn:a", "placeholder::z.js::go::1", EdgeKind::Call),
            ("fn:a", "fn:b", EdgeKind::Call),
        ],
    );
    let engine = QueryEngine::new(&store);

    let opts = QueryOptions {
        include_types: Some(vec![NodeKind::Function]),
        ..QueryOptions::default()
    };
    let callees = engine.get_callees("fn:a", &opts).unwrap();
    assert_eq!(ids(&callees), vec!["fn:b"]);

    let opts = QueryOptions {
        exclude_types: Some(vec![NodeKind::Placeholder]),
        ..QueryOptions::default()
    };
    let callees = engine.transitive_callees_flat("fn:a", &opts).unwrap();
    assert_eq!(ids(&callees), vec!["fn:b"]);
}

#[test]
fn tree_filters_prune_whole_subtrees() {
    // a → p (placeholder) → c ; filtering placeholders hides c as well
    let store = store_with(
        &[
            ("fn:a", NodeKind::Function),
            ("placeholder::z.js::go::1", NodeKind::Placeholder),
            ("fn:c", NodeKind::Function),
        ],
        &[
            ("fn:a", "placeholder::z.js::go::1", EdgeKind::Call),
            ("placeholder::z.js::go::1", "fn:c", EdgeKind::Call),
        ],
    );
    let engine = QueryEngine::new(&store);
    let opts = QueryOptions {
        exclude_types: Some(vec![NodeKind::Placeholder]),
        ..QueryOptions::default()
    };
    let tree = engine.transitive_callees_tree("fn:a", &opts).unwrap();
    assert!(tree.children.is_empty());
}

#[test]
fn unexpanded_results_are_bare_ids() {
    let store = chain_store();
    let engine = QueryEngine::new(&store);
    let opts = QueryOptions {
        expanded: false,
        ..QueryOptions::default()
    };
    let callees = engine.get_callees("fn:x", &opts).unwrap();
    assert!(matches!(callees[0], NodeHit::Id(_)));

    let expanded = engine.get_callees("fn:x", &QueryOptions::default()).unwrap();
    assert!(matches!(expanded[0], NodeHit::Node(_)));
}
