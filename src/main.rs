use anyhow::{Context, Result};
use clap::Parser;
use jsgraph::analyzer::{Analyzer, AnalyzerOptions, ScanOptions};
use jsgraph::progress::{CancelToken, StderrProgress};
use jsgraph::query::QueryEngine;
use jsgraph::store::GraphStore;
use jsgraph::{cli, project, rpc};
use std::path::{Path, PathBuf};

fn storage_root(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(home) = std::env::var("JSGRAPH_HOME") {
        return PathBuf::from(home);
    }
    match std::env::var("HOME") {
        Ok(home) => Path::new(&home).join(".jsgraph"),
        Err(_) => PathBuf::from(".jsgraph"),
    }
}

/// Resolve the project root and database path for a command, registering
/// the project along the way.
fn resolve_paths(
    path: &Path,
    db: Option<PathBuf>,
    storage: Option<PathBuf>,
) -> Result<(PathBuf, PathBuf, project::ProjectRegistry)> {
    let root = project::detect_project_root(path).unwrap_or_else(|| path.to_path_buf());
    let mut registry = project::ProjectRegistry::open(&storage_root(storage))?;
    let entry = registry.register(&root)?;
    let db_path = db.unwrap_or_else(|| PathBuf::from(entry.db_path));
    Ok((root, db_path, registry))
}

fn scan_options(no_ignore: bool, extensions: Option<Vec<String>>) -> ScanOptions {
    let mut options = ScanOptions::default();
    options.no_ignore = no_ignore;
    if let Some(extensions) = extensions {
        options.extensions = extensions;
    }
    options
}

fn main() -> Result<()> {
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Analyze {
            path,
            db,
            storage,
            no_ignore,
            memory,
            extensions,
        } => {
            let (root, db_path, mut registry) = resolve_paths(&path, db, storage)?;
            let options = AnalyzerOptions {
                scan: scan_options(no_ignore, extensions),
                ..AnalyzerOptions::default()
            };
            let analyzer = Analyzer::with_options(root.clone(), options);
            let (graph, stats) = analyzer.analyze(&StderrProgress, &CancelToken::new())?;

            let store = if memory {
                GraphStore::open_memory(Some(&db_path))?
            } else {
                GraphStore::open_native(&db_path)?
            };
            store
                .save_graph(&graph)
                .with_context(|| format!("persist graph to {}", db_path.display()))?;
            store.close()?;
            registry.mark_analyzed(&root)?;

            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        cli::Command::Overview { path, db, storage } => {
            let (_, db_path, _) = resolve_paths(&path, db, storage)?;
            let store = GraphStore::open_native(&db_path)?;
            let engine = QueryEngine::new(&store);
            let stats = engine.semantic_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        cli::Command::Request {
            path,
            db,
            storage,
            method,
            params,
            id,
        } => {
            let (root, db_path, _) = resolve_paths(&path, db, storage)?;
            let response = rpc::call(
                root,
                db_path,
                AnalyzerOptions::default(),
                method,
                &params,
                &id,
            )?;
            println!("{response}");
            Ok(())
        }
        cli::Command::Serve {
            path,
            db,
            storage,
            no_ignore,
        } => {
            let (root, db_path, _) = resolve_paths(&path, db, storage)?;
            let options = AnalyzerOptions {
                scan: scan_options(no_ignore, None),
                ..AnalyzerOptions::default()
            };
            rpc::serve(root, db_path, options)
        }
        cli::Command::Projects { storage } => {
            let registry = project::ProjectRegistry::open(&storage_root(storage))?;
            let entries: Vec<_> = registry.entries().collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
    }
}
