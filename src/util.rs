use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path};

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Project-relative path with forward-slash separators. IDs are built from
/// these, so the same tree must normalize identically on every platform.
pub fn normalize_rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).with_context(|| {
        format!("strip prefix {} from {}", root.display(), path.display())
    })?;
    Ok(normalize_path(rel))
}

pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => {
                if parts.is_empty() || parts.last().map(String::as_str) == Some("..") {
                    parts.push("..".to_string());
                } else {
                    parts.pop();
                }
            }
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Replace backslashes so identifiers embedded in placeholder IDs stay
/// platform-independent.
pub fn forward_slashes(value: &str) -> String {
    value.replace('\\', "/")
}

pub fn unix_time() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalizes_separators_and_dots() {
        assert_eq!(normalize_path(&PathBuf::from("a/./b/c.js")), "a/b/c.js");
        assert_eq!(normalize_path(&PathBuf::from("a/b/../c.js")), "a/c.js");
        assert_eq!(normalize_path(&PathBuf::from("")), ".");
    }

    #[test]
    fn rel_path_is_forward_slashed() {
        let root = PathBuf::from("/repo");
        let file = PathBuf::from("/repo/src/app.js");
        assert_eq!(normalize_rel_path(&root, &file).unwrap(), "src/app.js");
    }
}
