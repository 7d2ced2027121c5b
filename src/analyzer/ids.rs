//! Stable entity identifiers.
//!
//! Every ID embeds a project-relative forward-slash path, so the same tree
//! produces the same graph on every platform. Shapes per kind:
//!
//! - file       `file:<rel-path>`
//! - class      `class:<rel-path>:<ClassName>`
//! - method     `class:<rel-path>:<Class>.<method>`
//! - function   `<rel-path>:<startLine>:<startCol>-<endLine>:<endCol>`
//! - external   `external:<module-name>`
//! - placeholder `placeholder::<rel-path>::<callee|"anonymous">::<line>`

use crate::model::Pos;
use crate::util;

pub fn file_id(rel_path: &str) -> String {
    format!("file:{rel_path}")
}

pub fn class_id(rel_path: &str, class_name: &str) -> String {
    format!("class:{rel_path}:{class_name}")
}

pub fn method_id(rel_path: &str, class_name: &str, method_name: &str) -> String {
    format!("class:{rel_path}:{class_name}.{method_name}")
}

pub fn function_id(rel_path: &str, start: Pos, end: Pos) -> String {
    format!(
        "{rel_path}:{}:{}-{}:{}",
        start.line, start.col, end.line, end.col
    )
}

pub fn external_id(module_name: &str) -> String {
    format!("external:{module_name}")
}

pub fn placeholder_id(rel_path: &str, callee: Option<&str>, line: u32) -> String {
    let callee = match callee {
        Some(name) if !name.is_empty() => util::forward_slashes(name),
        _ => "anonymous".to_string(),
    };
    format!("placeholder::{rel_path}::{callee}::{line}")
}

/// Module-scope caller sentinel; the graph builder rewrites it to the file
/// node ID when edges are materialized.
pub fn toplevel_id(rel_path: &str) -> String {
    format!("{rel_path}:TOPLEVEL")
}

pub fn is_toplevel_id(id: &str) -> bool {
    id.ends_with(":TOPLEVEL")
}

pub fn toplevel_file(id: &str) -> Option<&str> {
    id.strip_suffix(":TOPLEVEL")
}

/// Split a method ID back into `(rel_path, class, method)`. Used by the
/// resolver for `this.m()` calls, where the enclosing class comes from the
/// caller's own ID.
pub fn parse_method_id(id: &str) -> Option<(&str, &str, &str)> {
    let rest = id.strip_prefix("class:")?;
    let (path, qualified) = rest.rsplit_once(':')?;
    let (class_name, method_name) = qualified.rsplit_once('.')?;
    if class_name.is_empty() || method_name.is_empty() {
        return None;
    }
    Some((path, class_name, method_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_shapes() {
        assert_eq!(file_id("src/a.js"), "file:src/a.js");
        assert_eq!(class_id("src/a.js", "Svc"), "class:src/a.js:Svc");
        assert_eq!(
            method_id("src/a.js", "Svc", "create"),
            "class:src/a.js:Svc.create"
        );
        assert_eq!(
            function_id("src/a.js", Pos::new(3, 0), Pos::new(5, 1)),
            "src/a.js:3:0-5:1"
        );
        assert_eq!(external_id("jsonwebtoken"), "external:jsonwebtoken");
        assert_eq!(
            placeholder_id("src/a.js", Some("jwt.sign"), 12),
            "placeholder::src/a.js::jwt.sign::12"
        );
        assert_eq!(placeholder_id("src/a.js", None, 4), "placeholder::src/a.js::anonymous::4");
    }

    #[test]
    fn method_id_round_trip() {
        let id = method_id("src/svc.ts", "Svc", "create");
        assert_eq!(parse_method_id(&id), Some(("src/svc.ts", "Svc", "create")));
        assert_eq!(parse_method_id("src/a.js:3:0-5:1"), None);
    }

    #[test]
    fn toplevel_rewrites() {
        let id = toplevel_id("src/a.js");
        assert!(is_toplevel_id(&id));
        assert_eq!(toplevel_file(&id), Some("src/a.js"));
    }
}
