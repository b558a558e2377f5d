//! Project file access rooted at the configured project root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Result, SolverError};

#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
}

impl ProjectFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a root-relative path. Absolute paths and `..` are rejected.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let path = Path::new(relative);
        if relative.trim().is_empty() {
            return Err(SolverError::InvalidArgument(
                "file path must not be empty".to_string(),
            ));
        }
        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                Component::ParentDir => {
                    return Err(SolverError::InvalidArgument(format!(
                        "file path '{relative}' must not contain '..'"
                    )));
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(SolverError::InvalidArgument(format!(
                        "file path '{relative}' must be relative to the project root"
                    )));
                }
            }
        }
        Ok(self.root.join(path))
    }

    pub fn exists(&self, relative: &str) -> Result<bool> {
        Ok(self.resolve(relative)?.is_file())
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(SolverError::FileNotFound { path });
        }
        fs::read_to_string(&path)
            .map_err(|err| SolverError::store(format!("read {}", path.display()), err))
    }

    /// Write `content`, creating parent directories as needed.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        debug!(path = %path.display(), bytes = content.len(), "writing project file");
        fs::write(&path, content)
            .map_err(|err| SolverError::store(format!("write {}", path.display()), err))?;
        Ok(path)
    }

    /// Remove an existing file; `FileNotFound` when it is absent.
    pub fn delete(&self, relative: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        if !path.is_file() {
            return Err(SolverError::FileNotFound { path });
        }
        debug!(path = %path.display(), "deleting project file");
        fs::remove_file(&path)
            .map_err(|err| SolverError::store(format!("remove {}", path.display()), err))?;
        Ok(path)
    }

    pub fn ensure_directory(&self, relative: &str) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        ensure_dir(&path)?;
        Ok(path)
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|err| SolverError::store(format!("create directory {}", path.display()), err))
}
