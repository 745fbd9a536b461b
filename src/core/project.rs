//! Project discovery
//!
//! A project is any directory holding a `.jpc/` folder with the case
//! database and the project config.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::DEFAULT_CONFIG_TEMPLATE;

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".jpc";

const CONFIG_FILE: &str = "config.yaml";
const DATABASE_FILE: &str = "cases.db";

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Not inside a case file project (no .jpc/ found from {0}); run `jpc init` first")]
    NotFound(PathBuf),

    #[error("Project already initialized at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Find the project containing the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let cwd = std::env::current_dir()?;
        Self::discover_from(&cwd)
    }

    /// Walk up from `start` until a directory with `.jpc/` is found
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        start
            .ancestors()
            .find(|dir| dir.join(PROJECT_DIR).is_dir())
            .map(|root| Self {
                root: root.to_path_buf(),
            })
            .ok_or_else(|| ProjectError::NotFound(start.to_path_buf()))
    }

    /// Create `.jpc/` with a default config under `root`
    ///
    /// The database itself is created by the store on first open.
    pub fn init(root: &Path) -> Result<Self, ProjectError> {
        let dir = root.join(PROJECT_DIR);
        if dir.is_dir() {
            return Err(ProjectError::AlreadyInitialized(root.to_path_buf()));
        }
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(CONFIG_FILE), DEFAULT_CONFIG_TEMPLATE)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jpc_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.jpc_dir().join(CONFIG_FILE)
    }

    pub fn database_path(&self) -> PathBuf {
        self.jpc_dir().join(DATABASE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_init_then_discover_from_subdir() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(project.config_path().is_file());

        let nested = tmp.path().join("expedientes/2024");
        fs::create_dir_all(&nested).unwrap();
        let found = Project::discover_from(&nested).unwrap();
        assert_eq!(found.root(), tmp.path());
        assert_eq!(found.database_path(), tmp.path().join(".jpc/cases.db"));
    }

    #[test]
    fn test_init_twice_fails() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        assert!(matches!(
            Project::init(tmp.path()),
            Err(ProjectError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_discover_outside_project() {
        let tmp = tempdir().unwrap();
        assert!(matches!(
            Project::discover_from(tmp.path()),
            Err(ProjectError::NotFound(_))
        ));
    }
}
