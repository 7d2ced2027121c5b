use criterion::{black_box, criterion_group, criterion_main, Criterion};
use jsgraph::model::{CallGraph, Edge, EdgeKind, Node, NodeKind, QueryOptions};
use jsgraph::query::QueryEngine;
use jsgraph::store::GraphStore;

/// Layered synthetic call graph: `width` functions per layer, every node
/// calling two nodes of the next layer.
fn synthetic_graph(layers: usize, width: usize) -> CallGraph {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    for layer in 0..layers {
        for slot in 0..width {
            nodes.push(Node::new(format!("fn:{layer}:{slot}"), NodeKind::Function));
            if layer > 0 {
                let from = format!("fn:{}:{slot}", layer - 1);
                edges.push(Edge::new(
                    from.clone(),
                    format!("fn:{layer}:{slot}"),
                    EdgeKind::Call,
                ));
                edges.push(Edge::new(
                    from,
                    format!("fn:{layer}:{}", (slot + 1) % width),
                    EdgeKind::Call,
                ));
            }
        }
    }
    CallGraph {
        nodes,
        edges,
        source_root: "/bench".to_string(),
    }
}

fn bench_traversal(c: &mut Criterion) {
    let graph = synthetic_graph(20, 50);
    let store = GraphStore::open_memory(None).unwrap();
    store.save_graph(&graph).unwrap();
    let engine = QueryEngine::new(&store);
    let opts = QueryOptions {
        expanded: false,
        ..QueryOptions::default()
    };

    c.bench_function("transitive_callees_flat", |b| {
        b.iter(|| {
            let hits = engine
                .transitive_callees_flat(black_box("fn:0:0"), &opts)
                .unwrap();
            black_box(hits.len())
        })
    });

    c.bench_function("transitive_callees_tree", |b| {
        let tree_opts = QueryOptions {
            expanded: false,
            max_depth: Some(10),
            ..QueryOptions::default()
        };
        b.iter(|| {
            let tree = engine
                .transitive_callees_tree(black_box("fn:0:0"), &tree_opts)
                .unwrap();
            black_box(tree.children.len())
        })
    });

    c.bench_function("hotspots", |b| {
        b.iter(|| {
            let entries = engine.hotspots(&opts).unwrap();
            black_box(entries.len())
        })
    });
}

fn bench_save(c: &mut Criterion) {
    let graph = synthetic_graph(10, 30);
    c.bench_function("save_graph", |b| {
        b.iter(|| {
            let store = GraphStore::open_memory(None).unwrap();
            store.save_graph(black_box(&graph)).unwrap();
            black_box(store.is_dirty())
        })
    });
}

criterion_group!(benches, bench_traversal, bench_save);
criterion_main!(benches);
