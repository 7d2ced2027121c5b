//! JSONL RPC transport over stdin/stdout.
//!
//! One request per line, one response per line. Methods map 1:1 to the
//! query operations; error kinds travel in the response envelope and never
//! as panics.

mod handlers;

use crate::analyzer::{Analyzer, AnalyzerOptions};
use crate::error::GraphError;
use crate::progress::{CancelToken, NoopProgress};
use crate::store::GraphStore;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Deserialize)]
struct RpcRequest {
    #[serde(default)]
    id: Value,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Serialize)]
struct RpcResponse {
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Serialize)]
struct RpcError {
    kind: String,
    message: String,
}

/// Serve requests until stdin closes.
pub fn serve(root: PathBuf, db_path: PathBuf, options: AnalyzerOptions) -> Result<()> {
    let mut app = App::new(root, db_path, options)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(value) => value,
            Err(err) => {
                eprintln!("jsgraph: stdin error: {err}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => app.handle_request(request),
            Err(err) => error_response(Value::Null, "invalid-request", &err.to_string()),
        };
        writeln!(stdout, "{}", serde_json::to_string(&response)?)?;
        stdout.flush()?;
    }
    Ok(())
}

/// Run a single request and return the serialized response.
pub fn call(
    root: PathBuf,
    db_path: PathBuf,
    options: AnalyzerOptions,
    method: String,
    params_raw: &str,
    id_raw: &str,
) -> Result<String> {
    let params: Value = serde_json::from_str(params_raw).with_context(|| "parse params JSON")?;
    let id = parse_value(id_raw);
    let mut app = App::new(root, db_path, options)?;
    let request = RpcRequest { id, method, params };
    let response = app.handle_request(request);
    Ok(serde_json::to_string(&response)?)
}

struct App {
    root: PathBuf,
    store: GraphStore,
    options: AnalyzerOptions,
}

impl App {
    fn new(root: PathBuf, db_path: PathBuf, options: AnalyzerOptions) -> Result<Self> {
        let store = GraphStore::open_native(&db_path)?;
        Ok(Self {
            root,
            store,
            options,
        })
    }

    fn handle_request(&mut self, req: RpcRequest) -> RpcResponse {
        let id = req.id.clone();
        match handlers::handle_method(self, &req.method, req.params) {
            Ok(result) => RpcResponse {
                id,
                result: Some(result),
                error: None,
            },
            Err(err) => error_response(id, error_kind(&err), &err.to_string()),
        }
    }

    fn analyze(&mut self) -> crate::error::Result<Value> {
        let analyzer = Analyzer::with_options(self.root.clone(), self.options.clone());
        let (graph, stats) = analyzer.analyze(&NoopProgress, &CancelToken::new())?;
        self.store.save_graph(&graph)?;
        Ok(serde_json::to_value(stats)?)
    }
}

fn error_kind(err: &GraphError) -> &'static str {
    match err {
        // malformed params arrive as JSON conversion failures
        GraphError::Json(_) => "invalid-params",
        other => other.kind(),
    }
}

fn error_response(id: Value, kind: &str, message: &str) -> RpcResponse {
    RpcResponse {
        id,
        result: None,
        error: Some(RpcError {
            kind: kind.to_string(),
            message: message.to_string(),
        }),
    }
}

fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
