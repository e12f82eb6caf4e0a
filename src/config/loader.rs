use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::core::FileConfig;
use crate::errors::{Error, Result};

pub const CONFIG_FILE_NAME: &str = ".covgap.toml";
const MAX_TRAVERSAL_DEPTH: usize = 10;

/// Parse `.covgap.toml` contents.
pub fn parse_config(contents: &str) -> std::result::Result<FileConfig, String> {
    toml::from_str::<FileConfig>(contents)
        .map_err(|e| format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
}

/// Read and parse a config file at a known location.
///
/// Unlike discovery, an explicit path that is missing or malformed is an
/// error.
pub fn load_config_from_path(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_config(&contents).map_err(Error::config)
}

fn try_load_config_from_path(config_path: &Path) -> Option<FileConfig> {
    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            // Missing files are the common case while walking up.
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
            }
            return None;
        }
    };

    match parse_config(&contents) {
        Ok(config) => {
            debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            warn!("{}. Using defaults.", e);
            None
        }
    }
}

/// `start` and its parents, nearest first, at most `max_depth` entries.
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest `.covgap.toml` walking up from `start`.
pub fn discover_config(start: PathBuf) -> FileConfig {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_else(|| {
            debug!(
                "No config found after checking {} directories. Using defaults.",
                MAX_TRAVERSAL_DEPTH
            );
            FileConfig::default()
        })
}

/// Load from `explicit` when given, otherwise discover from `start`.
pub fn load_config(explicit: Option<&Path>, start: PathBuf) -> Result<FileConfig> {
    match explicit {
        Some(path) => load_config_from_path(path),
        None => Ok(discover_config(start)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::core::TestFramework;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_directory_ancestors_limited() {
        let dirs: Vec<PathBuf> = directory_ancestors(PathBuf::from("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b"),
            ]
        );
    }

    #[test]
    fn test_discover_config_in_parent() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("packages").join("web");
        fs::create_dir_all(&nested).unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "test_framework = \"vitest\"\ncoverage_threshold = 80\n",
        )
        .unwrap();

        let config = discover_config(nested);
        assert_eq!(config.test_framework, Some(TestFramework::Vitest));
        assert_eq!(config.coverage_threshold, Some(80.0));
    }

    #[test]
    fn test_malformed_discovered_config_falls_back() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "not valid = = toml").unwrap();

        assert_eq!(discover_config(temp.path().to_path_buf()), FileConfig::default());
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.toml");
        assert!(load_config(Some(&missing), temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_config("threshold = 3").is_err());
    }
}
