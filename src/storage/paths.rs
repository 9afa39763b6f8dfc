//! Application paths for config, cache, and data.

use directories::ProjectDirs;
use std::path::PathBuf;

/// Application paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Configuration directory.
    pub config: PathBuf,
    /// Cache directory.
    pub cache: PathBuf,
    /// Data directory.
    pub data: PathBuf,
}

impl AppPaths {
    /// Create paths for the costcalc application.
    #[must_use]
    pub fn new() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("com", "costcalc", "costcalc") {
            Self {
                config: proj_dirs.config_dir().to_path_buf(),
                cache: proj_dirs.cache_dir().to_path_buf(),
                data: proj_dirs.data_dir().to_path_buf(),
            }
        } else {
            // Fallback to home directory
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            Self {
                config: home.join(".config/costcalc"),
                cache: home.join(".cache/costcalc"),
                data: home.join(".local/share/costcalc"),
            }
        }
    }

    /// Paths rooted under a single directory.
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config: root.join("config"),
            cache: root.join("cache"),
            data: root.join("data"),
        }
    }

    /// Path to the config file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Path to the ledger database.
    #[must_use]
    pub fn database_file(&self) -> PathBuf {
        self.data.join("ledger.sqlite")
    }

    /// Directory holding cached calculation results.
    #[must_use]
    pub fn results_cache_dir(&self) -> PathBuf {
        self.cache.join("results")
    }

    /// Ensure all directories exist.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config)?;
        std::fs::create_dir_all(&self.data)?;
        std::fs::create_dir_all(self.results_cache_dir())?;
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDir;

    #[test]
    fn rooted_paths_share_root() {
        let paths = AppPaths::rooted("/tmp/costcalc-test");
        assert_eq!(
            paths.config_file(),
            PathBuf::from("/tmp/costcalc-test/config/config.toml")
        );
        assert_eq!(
            paths.database_file(),
            PathBuf::from("/tmp/costcalc-test/data/ledger.sqlite")
        );
        assert_eq!(
            paths.results_cache_dir(),
            PathBuf::from("/tmp/costcalc-test/cache/results")
        );
    }

    #[test]
    fn ensure_dirs_creates_tree() {
        let dir = TestDir::new();
        let paths = AppPaths::rooted(dir.path());
        paths.ensure_dirs().expect("create dirs");
        assert!(paths.config.is_dir());
        assert!(paths.data.is_dir());
        assert!(paths.results_cache_dir().is_dir());
    }
}
