use crate::error::{GraphError, Result};
use crate::util;
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Directories never descended into, regardless of ignore files.
pub const IGNORED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "coverage",
    "__pycache__",
    ".venv",
    "target",
];

/// Extensions analyzed when the caller does not configure an allow-list.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Extension allow-list, without dots.
    pub extensions: Vec<String>,
    /// Include files matched by .gitignore rules.
    pub no_ignore: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            no_ignore: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
}

/// Walk the source tree under `root` in stable order (lexicographic per
/// directory level) and collect files passing the extension allow-list.
///
/// Fails with `invalid-path` when `root` does not exist.
pub fn scan_directory(root: &Path, options: &ScanOptions) -> Result<Vec<ScannedFile>> {
    if !root.is_dir() {
        return Err(GraphError::InvalidPath(root.to_path_buf()));
    }

    let mut walker = WalkBuilder::new(root);
    walker
        .hidden(false)
        .git_ignore(!options.no_ignore)
        .git_global(false)
        .git_exclude(!options.no_ignore)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().map_or(false, |ft| ft.is_dir())
                && IGNORED_DIRS.iter().any(|dir| *dir == name))
        });

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                eprintln!("jsgraph: skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().map_or(false, |ft| ft.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if !extension_allowed(&path, &options.extensions) {
            continue;
        }
        let rel_path = util::normalize_rel_path(root, &path)
            .map_err(|_| GraphError::InvalidPath(path.clone()))?;
        files.push(ScannedFile {
            rel_path,
            abs_path: path,
        });
    }
    Ok(files)
}

fn extension_allowed(path: &Path, extensions: &[String]) -> bool {
    let ext = path.extension().and_then(OsStr::to_str);
    match ext {
        Some(ext) => extensions.iter().any(|allowed| allowed == ext),
        None => false,
    }
}
