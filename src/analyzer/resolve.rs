//! Cross-file call resolution (Pass 2).
//!
//! Consumes every per-file analysis, builds global registries once, then
//! rewrites each call site's placeholder target to a stable entity ID where
//! a binding exists. Targets that stay unbound are classified as external
//! (imported module receivers) or left as placeholders; ambiguity is never
//! fatal.

use crate::analyzer::extract::{CallKind, CallSite, FileAnalysis, ImportKind};
use crate::analyzer::ids;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    /// Bound to an internal entity.
    Internal(String),
    /// Unbound, but known to land in a foreign module.
    External { module: String },
    /// Unbound; the placeholder target is kept verbatim.
    Unresolved,
}

#[derive(Debug, Clone)]
pub struct ResolvedCall {
    /// File the call site lives in.
    pub file: String,
    pub from: String,
    pub placeholder: String,
    pub callee_name: Option<String>,
    pub receiver: Option<String>,
    pub method: Option<String>,
    pub kind: CallKind,
    pub line: u32,
    pub target: CallTarget,
}

#[derive(Debug, Clone)]
struct FunctionEntry {
    id: String,
    file: String,
}

#[derive(Debug, Clone)]
struct MethodEntry {
    id: String,
    file: String,
}

/// Global indices derived once per build.
pub struct Registries {
    /// name → functions, keyed by both local and exported names.
    functions: HashMap<String, Vec<FunctionEntry>>,
    /// "Class.method" → methods.
    methods: HashMap<String, Vec<MethodEntry>>,
    /// method name → methods; consulted when the enclosing class of a
    /// `this` call cannot be recovered from the caller ID.
    methods_by_name: HashMap<String, Vec<MethodEntry>>,
    /// union of per-file instance maps.
    instances: HashMap<String, String>,
    /// rel path → index into the analyses slice.
    files: HashMap<String, usize>,
}

impl Registries {
    pub fn build(analyses: &[FileAnalysis]) -> Self {
        let mut functions: HashMap<String, Vec<FunctionEntry>> = HashMap::new();
        let mut methods: HashMap<String, Vec<MethodEntry>> = HashMap::new();
        let mut methods_by_name: HashMap<String, Vec<MethodEntry>> = HashMap::new();
        let mut instances: HashMap<String, String> = HashMap::new();
        let mut files: HashMap<String, usize> = HashMap::new();

        for (index, analysis) in analyses.iter().enumerate() {
            files.insert(analysis.rel_path.clone(), index);

            for function in &analysis.functions {
                if let Some(name) = &function.name {
                    functions.entry(name.clone()).or_default().push(FunctionEntry {
                        id: function.id.clone(),
                        file: analysis.rel_path.clone(),
                    });
                }
            }
            for (exported, ids) in &analysis.exports {
                for id in ids {
                    // exported classes live in the method registry already;
                    // only function-shaped entities belong here
                    if analysis.functions.iter().any(|f| &f.id == id) {
                        let entry = FunctionEntry {
                            id: id.clone(),
                            file: analysis.rel_path.clone(),
                        };
                        let slot = functions.entry(exported.clone()).or_default();
                        if !slot.iter().any(|e| e.id == entry.id) {
                            slot.push(entry);
                        }
                    }
                }
            }

            for class in &analysis.classes {
                for method in &class.methods {
                    let entry = MethodEntry {
                        id: method.id.clone(),
                        file: analysis.rel_path.clone(),
                    };
                    methods
                        .entry(format!("{}.{}", class.name, method.name))
                        .or_default()
                        .push(entry.clone());
                    methods_by_name
                        .entry(method.name.clone())
                        .or_default()
                        .push(entry);
                }
            }

            for (var, class) in &analysis.instance_mapping {
                instances.entry(var.clone()).or_insert_with(|| class.clone());
            }
        }

        Self {
            functions,
            methods,
            methods_by_name,
            instances,
            files,
        }
    }

    /// Same-file candidate first, then first in insertion order.
    fn pick_method(&self, key: &str, file: &str) -> Option<&MethodEntry> {
        let candidates = self.methods.get(key)?;
        candidates
            .iter()
            .find(|c| c.file == file)
            .or_else(|| candidates.first())
    }
}

/// Resolve every call site of every file, in file order then call order.
pub fn resolve_calls(analyses: &[FileAnalysis]) -> Vec<ResolvedCall> {
    let registries = Registries::build(analyses);
    let mut resolved = Vec::new();
    for analysis in analyses {
        for call in &analysis.calls {
            let target = resolve_one(call, analysis, analyses, &registries);
            resolved.push(ResolvedCall {
                file: analysis.rel_path.clone(),
                from: call.from.clone(),
                placeholder: call.to.clone(),
                callee_name: call.callee_name.clone(),
                receiver: call.receiver.clone(),
                method: call.method.clone(),
                kind: call.kind,
                line: call.line,
                target,
            });
        }
    }
    resolved
}

fn resolve_one(
    call: &CallSite,
    analysis: &FileAnalysis,
    analyses: &[FileAnalysis],
    registries: &Registries,
) -> CallTarget {
    // 1. method call through a known instance
    if call.kind == CallKind::MethodCall {
        if let (Some(receiver), Some(method)) = (&call.receiver, &call.method) {
            if receiver != "this" {
                let class = analysis
                    .instance_mapping
                    .get(receiver)
                    .or_else(|| registries.instances.get(receiver));
                if let Some(class) = class {
                    let key = format!("{class}.{method}");
                    if let Some(entry) = registries.pick_method(&key, &analysis.rel_path) {
                        return CallTarget::Internal(entry.id.clone());
                    }
                }
            }
        }
    }

    // 2. this-qualified method call
    if call.receiver.as_deref() == Some("this") {
        if let Some(method) = &call.method {
            if let Some((_, class, _)) = ids::parse_method_id(&call.from) {
                let key = format!("{class}.{method}");
                if let Some(entry) = registries.pick_method(&key, &analysis.rel_path) {
                    return CallTarget::Internal(entry.id.clone());
                }
            } else if let Some(candidates) = registries.methods_by_name.get(method) {
                // enclosing class not recoverable (e.g. nested arrow);
                // bind only when the name is unambiguous project-wide
                if candidates.len() == 1 {
                    return CallTarget::Internal(candidates[0].id.clone());
                }
            }
        }
    }

    // 3. method call on an imported external module
    if call.kind == CallKind::MethodCall {
        if let Some(receiver) = &call.receiver {
            if let Some(binding) = analysis.imports.get(receiver) {
                if !binding.is_relative() {
                    return CallTarget::External {
                        module: binding.source.clone(),
                    };
                }
            }
        }
    }

    // 4. resolution via import of the callee name
    if let Some(callee) = &call.callee_name {
        if let Some(binding) = analysis.imports.get(callee) {
            if !binding.is_relative() {
                return CallTarget::External {
                    module: binding.source.clone(),
                };
            }
            if let Some(target_file) =
                locate_relative(&analysis.rel_path, &binding.source, registries)
            {
                let target = &analyses[target_file];
                let bound = match binding.kind {
                    ImportKind::Named => export_or_local(target, &binding.imported),
                    ImportKind::Default | ImportKind::Require => {
                        export_or_local(target, "default")
                    }
                    ImportKind::Namespace => None,
                };
                if let Some(id) = bound {
                    return CallTarget::Internal(id);
                }
                if binding.kind == ImportKind::Namespace {
                    return CallTarget::Unresolved;
                }
            }
        }
    }

    // 5. same-file function
    if let Some(callee) = &call.callee_name {
        if let Some(function) = analysis.function_named(callee) {
            return CallTarget::Internal(function.id.clone());
        }

        // 6. globally unique function name
        if let Some(candidates) = registries.functions.get(callee) {
            let mut unique: Option<&FunctionEntry> = None;
            for candidate in candidates {
                match unique {
                    None => unique = Some(candidate),
                    Some(existing) if existing.id == candidate.id => {}
                    Some(_) => return CallTarget::Unresolved, // ambiguous
                }
            }
            if let Some(entry) = unique {
                return CallTarget::Internal(entry.id.clone());
            }
        }
    }

    CallTarget::Unresolved
}

fn export_or_local(target: &FileAnalysis, name: &str) -> Option<String> {
    if let Some(ids) = target.exports.get(name) {
        if let Some(first) = ids.first() {
            return Some(first.clone());
        }
    }
    target.function_named(name).map(|f| f.id.clone())
}

const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Find the analysis for a relative import specifier by trying the bare
/// path, then `<src>.<ext>`, then `<src>/index.<ext>`.
fn locate_relative(from_rel: &str, source: &str, registries: &Registries) -> Option<usize> {
    let base = match source.strip_prefix('/') {
        Some(rooted) => rooted.to_string(),
        None => {
            let dir = match from_rel.rsplit_once('/') {
                Some((dir, _)) => dir,
                None => "",
            };
            if dir.is_empty() {
                source.to_string()
            } else {
                format!("{dir}/{source}")
            }
        }
    };
    let base = normalize_dots(&base);

    if let Some(index) = registries.files.get(&base) {
        return Some(*index);
    }
    for ext in RESOLVE_EXTENSIONS {
        if let Some(index) = registries.files.get(&format!("{base}.{ext}")) {
            return Some(*index);
        }
    }
    for ext in RESOLVE_EXTENSIONS {
        if let Some(index) = registries.files.get(&format!("{base}/index.{ext}")) {
            return Some(*index);
        }
    }
    None
}

fn normalize_dots(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().map_or(true, |p| *p == "..") {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
