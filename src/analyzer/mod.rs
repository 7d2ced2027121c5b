use crate::error::{GraphError, Result};
use crate::model::CallGraph;
use crate::progress::{CancelToken, ProgressSink};
use crate::util;
use serde::Serialize;
use std::path::PathBuf;

pub mod builder;
pub mod extract;
pub mod ids;
pub mod javascript;
pub mod resolve;
pub mod scan;

pub use builder::FrameworkConfig;
pub use scan::ScanOptions;

#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    pub scan: ScanOptions,
    pub framework: FrameworkConfig,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub files: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub functions: usize,
    pub classes: usize,
    pub methods: usize,
    pub calls: usize,
    pub nodes: usize,
    pub edges: usize,
}

/// One-shot build driver: scan → extract → resolve → materialize.
///
/// The driver owns no UI and no store; it reports through the progress sink
/// and returns the graph artifact for the caller to persist.
pub struct Analyzer {
    root: PathBuf,
    options: AnalyzerOptions,
}

impl Analyzer {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            options: AnalyzerOptions::default(),
        }
    }

    pub fn with_options(root: PathBuf, options: AnalyzerOptions) -> Self {
        Self { root, options }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Run a full build. Parse failures skip the file and continue; path
    /// and collision failures abort. The token is checked between files
    /// and between phases.
    pub fn analyze(
        &self,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<(CallGraph, BuildStats)> {
        let mut stats = BuildStats::default();

        let files = scan::scan_directory(&self.root, &self.options.scan)?;
        stats.files = files.len();
        progress.report(&format!("scanning {} files", files.len()), 0);

        let mut extractor = javascript::SourceExtractor::new()?;
        let mut analyses = Vec::with_capacity(files.len());
        for file in &files {
            if cancel.is_cancelled() {
                return Err(GraphError::Cancelled);
            }
            let source = match util::read_to_string(&file.abs_path) {
                Ok(source) => source,
                Err(err) => {
                    eprintln!("jsgraph: skipping {}: {err}", file.rel_path);
                    stats.skipped += 1;
                    continue;
                }
            };
            match extractor.extract(&file.rel_path, &source) {
                Ok(analysis) => {
                    stats.parsed += 1;
                    stats.functions += analysis.functions.len();
                    stats.classes += analysis.classes.len();
                    stats.methods += analysis.classes.iter().map(|c| c.methods.len()).sum::<usize>();
                    stats.calls += analysis.calls.len();
                    analyses.push(analysis);
                }
                Err(err) => {
                    eprintln!("jsgraph: skipping {}: {err}", file.rel_path);
                    stats.skipped += 1;
                }
            }
            progress.report(&format!("extracted {}", file.rel_path), 1);
        }

        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }
        progress.report("resolving call targets", 0);
        let resolved = resolve::resolve_calls(&analyses);

        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }
        progress.report("materializing graph", 0);
        let source_root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone())
            .to_string_lossy()
            .to_string();
        let graph = builder::build_graph(
            &analyses,
            &resolved,
            &source_root,
            &self.options.framework,
        )?;
        stats.nodes = graph.nodes.len();
        stats.edges = graph.edges.len();
        Ok((graph, stats))
    }
}
