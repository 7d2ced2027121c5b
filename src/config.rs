// Configuration module for jsgraph
// Reads from environment variables with sensible defaults

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Flat BFS traversal depth bound (JSGRAPH_BFS_MAX_DEPTH)
    pub bfs_max_depth: usize,

    /// Tree DFS traversal depth bound (JSGRAPH_TREE_MAX_DEPTH)
    pub tree_max_depth: usize,

    /// Path-enumeration DFS depth bound (JSGRAPH_PATH_DEPTH_LIMIT)
    pub path_depth_limit: usize,

    /// Path-enumeration result cap (JSGRAPH_MAX_PATHS)
    pub max_paths: usize,

    /// Search result cap (JSGRAPH_SEARCH_LIMIT)
    pub search_limit: usize,

    /// Default hotspot count (JSGRAPH_HOTSPOT_TOP)
    pub hotspot_top: usize,

    /// Read connection pool size for the native back-end (JSGRAPH_POOL_SIZE)
    pub pool_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bfs_max_depth: 200,
            tree_max_depth: 50,
            path_depth_limit: 20,
            max_paths: 1000,
            search_limit: 100,
            hotspot_top: 20,
            pool_size: 4,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();
        read_env("JSGRAPH_BFS_MAX_DEPTH", &mut config.bfs_max_depth);
        read_env("JSGRAPH_TREE_MAX_DEPTH", &mut config.tree_max_depth);
        read_env("JSGRAPH_PATH_DEPTH_LIMIT", &mut config.path_depth_limit);
        read_env("JSGRAPH_MAX_PATHS", &mut config.max_paths);
        read_env("JSGRAPH_SEARCH_LIMIT", &mut config.search_limit);
        read_env("JSGRAPH_HOTSPOT_TOP", &mut config.hotspot_top);
        read_env("JSGRAPH_POOL_SIZE", &mut config.pool_size);
        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn read_env<T: std::str::FromStr + std::fmt::Display>(name: &str, slot: &mut T) {
    if let Ok(val) = env::var(name) {
        if let Ok(parsed) = val.parse() {
            *slot = parsed;
        } else {
            eprintln!(
                "jsgraph: Warning: Invalid {} value: {}, using default: {}",
                name, val, slot
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bfs_max_depth, 200);
        assert_eq!(config.tree_max_depth, 50);
        assert_eq!(config.path_depth_limit, 20);
        assert_eq!(config.max_paths, 1000);
        assert_eq!(config.search_limit, 100);
        assert_eq!(config.hotspot_top, 20);
    }
}
