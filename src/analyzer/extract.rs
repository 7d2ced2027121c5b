//! Per-file intermediate representation produced by the extractor pass.
//!
//! Call targets are placeholders at this stage; the resolver rewrites them
//! to stable entity IDs once every file has been walked.

use crate::model::Pos;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub id: String,
    pub name: Option<String>,
    pub start: Pos,
    pub end: Pos,
}

#[derive(Debug, Clone)]
pub struct MethodRecord {
    pub id: String,
    pub name: String,
    pub start: Pos,
    pub end: Pos,
}

#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub start: Pos,
    pub end: Pos,
    pub methods: Vec<MethodRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Named,
    Default,
    Namespace,
    /// CommonJS `require("…")`; resolves like a default import.
    Require,
}

#[derive(Debug, Clone)]
pub struct ImportBinding {
    /// Name under the source module (`*` for namespace imports).
    pub imported: String,
    /// Import specifier as written.
    pub source: String,
    pub kind: ImportKind,
}

impl ImportBinding {
    /// Sources starting with `.` or `/` are project files; everything else
    /// is an external module.
    pub fn is_relative(&self) -> bool {
        self.source.starts_with('.') || self.source.starts_with('/')
    }
}

/// Sentinel prefix for export targets that can only be bound after the
/// walk finishes (re-export lists and exported identifiers).
pub const LOCAL_SENTINEL: &str = "__LOCAL__:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    MethodCall,
}

#[derive(Debug, Clone)]
pub struct CallSite {
    /// Nearest enclosing callable, or `<rel>:TOPLEVEL` at module scope.
    pub from: String,
    /// Temporary placeholder target; rewritten by the resolver.
    pub to: String,
    pub callee_name: Option<String>,
    pub receiver: Option<String>,
    pub method: Option<String>,
    pub kind: CallKind,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct FileAnalysis {
    pub rel_path: String,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
    /// local-name → binding
    pub imports: HashMap<String, ImportBinding>,
    /// exported-name → entity IDs (post-walk, sentinels resolved)
    pub exports: HashMap<String, Vec<String>>,
    /// variable → class name, from `new C(...)` initializers only
    pub instance_mapping: HashMap<String, String>,
    pub calls: Vec<CallSite>,
}

impl FileAnalysis {
    pub fn new(rel_path: impl Into<String>) -> Self {
        Self {
            rel_path: rel_path.into(),
            ..Default::default()
        }
    }

    /// First function defined in this file with the given name.
    pub fn function_named(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
    }

    /// Pass 1.5: replace `__LOCAL__:<name>` sentinels with the ID of the
    /// first function of that name in this file; drop sentinels with no
    /// local match.
    pub fn resolve_export_sentinels(&mut self) {
        let functions = std::mem::take(&mut self.functions);
        for targets in self.exports.values_mut() {
            let mut resolved = Vec::with_capacity(targets.len());
            for target in targets.drain(..) {
                match target.strip_prefix(LOCAL_SENTINEL) {
                    Some(local) => {
                        if let Some(f) = functions
                            .iter()
                            .find(|f| f.name.as_deref() == Some(local))
                        {
                            resolved.push(f.id.clone());
                        }
                    }
                    None => resolved.push(target),
                }
            }
            *targets = resolved;
        }
        self.exports.retain(|_, targets| !targets.is_empty());
        self.functions = functions;
    }
}
