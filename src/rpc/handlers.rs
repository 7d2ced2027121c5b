//! Handler functions for RPC methods.
//! Each function corresponds to a match arm in `handle_method`.

use super::App;
use crate::error::Result;
use crate::model::QueryOptions;
use crate::query::QueryEngine;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
struct NodeParams {
    id: String,
    #[serde(default)]
    options: QueryOptions,
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default)]
    options: QueryOptions,
}

#[derive(Deserialize)]
struct OptionsParams {
    #[serde(default)]
    options: QueryOptions,
}

#[derive(Deserialize)]
struct ChainParams {
    start: String,
    target: String,
    #[serde(default)]
    options: QueryOptions,
}

pub(super) fn handle_method(app: &mut App, method: &str, params: Value) -> Result<Value> {
    match method {
        "analyze" => app.analyze(),
        "get_node" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_node(&params.id)?))
        }
        "search_nodes" => {
            let params: SearchParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.search_nodes(&params.query, &params.options)?))
        }
        "get_all_nodes" => {
            let params: OptionsParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_all_nodes(&params.options)?))
        }
        "get_all_edges" => {
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_all_edges()?))
        }
        "get_callers" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_callers(&params.id, &params.options)?))
        }
        "get_callees" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_callees(&params.id, &params.options)?))
        }
        "get_functions_in_file" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.get_functions_in_file(&params.id, &params.options)?))
        }
        "transitive_callers" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            if params.options.tree {
                Ok(json!(engine.transitive_callers_tree(&params.id, &params.options)?))
            } else {
                Ok(json!(engine.transitive_callers_flat(&params.id, &params.options)?))
            }
        }
        "transitive_callees" => {
            let params: NodeParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            if params.options.tree {
                Ok(json!(engine.transitive_callees_tree(&params.id, &params.options)?))
            } else {
                Ok(json!(engine.transitive_callees_flat(&params.id, &params.options)?))
            }
        }
        "all_call_chains" => {
            let params: ChainParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.all_call_chains(
                &params.start,
                &params.target,
                &params.options
            )?))
        }
        "hotspots" => {
            let params: OptionsParams = serde_json::from_value(params)?;
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.hotspots(&params.options)?))
        }
        "semantic_stats" => {
            let engine = QueryEngine::new(&app.store);
            Ok(json!(engine.semantic_stats()?))
        }
        "source_root" => Ok(json!(app.store.source_root()?)),
        other => Err(crate::error::GraphError::InvalidRequest(format!(
            "unknown method: {other}"
        ))),
    }
}
