use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jsgraph",
    version,
    about = "Static call-graph analyzer for JS/TS source trees",
    after_help = r#"Examples:
  jsgraph analyze --path .
  jsgraph overview --path .
  jsgraph request --method search_nodes --params '{"query":"login"}'
  jsgraph request --method get_callers --params '{"id":"src/auth.js:4:0-9:1"}'
  jsgraph request --method hotspots --params '{"options":{"top":10}}'
  jsgraph serve --path .
  jsgraph projects
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Analyze a source tree and persist its call graph.
    Analyze {
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Database file; defaults to the project registry's path.
        #[arg(long)]
        db: Option<PathBuf>,
        /// Registry/storage root; defaults to $JSGRAPH_HOME or ~/.jsgraph.
        #[arg(long)]
        storage: Option<PathBuf>,
        /// Include files matched by .gitignore rules.
        #[arg(long)]
        no_ignore: bool,
        /// Build through the in-memory back-end, flushing on close.
        #[arg(long)]
        memory: bool,
        /// Extension allow-list, comma separated (default: js,jsx,mjs,cjs,ts,tsx,mts,cts).
        #[arg(long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,
    },
    /// Print aggregate statistics for a stored graph.
    Overview {
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        storage: Option<PathBuf>,
    },
    /// Run a single RPC request and exit.
    Request {
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        storage: Option<PathBuf>,
        #[arg(long)]
        method: String,
        #[arg(long, default_value = "{}")]
        params: String,
        #[arg(long, default_value = "1")]
        id: String,
    },
    /// Run the JSONL RPC server over stdin/stdout.
    Serve {
        #[arg(long, default_value = ".")]
        path: PathBuf,
        #[arg(long)]
        db: Option<PathBuf>,
        #[arg(long)]
        storage: Option<PathBuf>,
        /// Include files matched by .gitignore rules.
        #[arg(long)]
        no_ignore: bool,
    },
    /// List registered projects.
    Projects {
        #[arg(long)]
        storage: Option<PathBuf>,
    },
}
