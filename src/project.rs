//! Project detection and the persisted project registry.
//!
//! Given any directory the driver finds the owning project root by walking
//! up to the nearest ancestor with a recognized manifest. Each analyzed
//! project gets a registry entry and a database path derived from a hash of
//! its root, so repeated builds of the same tree land in the same file.

use crate::error::{GraphError, Result};
use crate::util;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const MARKER_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "pyproject.toml",
    "go.mod",
    "Cargo.toml",
];

const REGISTRY_FILE: &str = "projects.json";

/// Walk upward from `start` to the nearest ancestor holding a project
/// marker. Returns the start directory's own match first.
pub fn detect_project_root(start: &Path) -> Option<PathBuf> {
    let start = if start.is_file() { start.parent()? } else { start };
    let mut current = Some(start);
    while let Some(dir) = current {
        if MARKER_FILES.iter().any(|m| dir.join(m).is_file()) {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

pub fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "project".to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub name: String,
    pub root_path: String,
    pub db_path: String,
    pub last_analyzed: Option<i64>,
    pub last_used: i64,
}

/// Process-wide registry of analyzed projects, persisted on every mutation.
/// Owned by the host and passed explicitly to collaborators.
#[derive(Debug)]
pub struct ProjectRegistry {
    storage_root: PathBuf,
    // keyed by root_path; BTreeMap keeps the persisted file stable
    projects: BTreeMap<String, ProjectEntry>,
}

impl ProjectRegistry {
    pub fn open(storage_root: &Path) -> Result<Self> {
        fs::create_dir_all(storage_root)?;
        let registry_path = storage_root.join(REGISTRY_FILE);
        let projects = if registry_path.is_file() {
            let raw = fs::read_to_string(&registry_path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            storage_root: storage_root.to_path_buf(),
            projects,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProjectEntry> {
        self.projects.values()
    }

    pub fn get(&self, root: &Path) -> Option<&ProjectEntry> {
        self.projects.get(&root.to_string_lossy().to_string())
    }

    /// Register (or refresh) the project rooted at `root` and return its
    /// entry. The database path is a deterministic hash of the root path,
    /// collision-resistant within one machine.
    pub fn register(&mut self, root: &Path) -> Result<ProjectEntry> {
        if !root.is_dir() {
            return Err(GraphError::InvalidPath(root.to_path_buf()));
        }
        let key = root.to_string_lossy().to_string();
        let now = util::unix_time();
        let db_path = self
            .storage_root
            .join("graphs")
            .join(format!("{}.sqlite", db_hash(&key)))
            .to_string_lossy()
            .to_string();
        let entry = self
            .projects
            .entry(key.clone())
            .or_insert_with(|| ProjectEntry {
                name: project_name(root),
                root_path: key,
                db_path,
                last_analyzed: None,
                last_used: now,
            });
        entry.last_used = now;
        let entry = entry.clone();
        self.persist()?;
        Ok(entry)
    }

    pub fn mark_analyzed(&mut self, root: &Path) -> Result<()> {
        let key = root.to_string_lossy().to_string();
        if let Some(entry) = self.projects.get_mut(&key) {
            entry.last_analyzed = Some(util::unix_time());
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<()> {
        fs::create_dir_all(self.storage_root.join("graphs"))?;
        let registry_path = self.storage_root.join(REGISTRY_FILE);
        let raw = serde_json::to_string_pretty(&self.projects)?;
        fs::write(&registry_path, raw)?;
        Ok(())
    }
}

fn db_hash(root_path: &str) -> String {
    let hash = blake3::hash(root_path.as_bytes());
    hash.to_hex()[..16].to_string()
}
