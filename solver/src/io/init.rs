//! Canonical paths and scaffolding for `.problems/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{SolverConfig, load_config, write_config};
use crate::core::problem::CONFIG_FILE_NAME;

pub const STORAGE_DIR_NAME: &str = ".problems";

/// Canonical paths for a workspace root, resolved against its configuration.
#[derive(Debug, Clone)]
pub struct SolverPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub storage_dir: PathBuf,
    pub project_root: PathBuf,
    pub instructions_dir: Option<PathBuf>,
}

impl SolverPaths {
    /// Default config location: `<root>/.problems/config.toml`.
    pub fn default_config_path(root: &Path) -> PathBuf {
        root.join(STORAGE_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    pub fn new(root: impl Into<PathBuf>, config_path: PathBuf, config: &SolverConfig) -> Self {
        let root = root.into();
        Self {
            storage_dir: root.join(&config.storage_dir),
            project_root: root.join(&config.project_root),
            instructions_dir: config.instructions_dir.as_ref().map(|dir| root.join(dir)),
            config_path,
            root,
        }
    }
}

/// Options for `init_solver`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config file with defaults.
    pub force: bool,
}

/// Create the storage directory and a config file.
///
/// An existing config is kept (and validated) unless `options.force` is set.
pub fn init_solver(
    root: &Path,
    config_path: &Path,
    options: &InitOptions,
) -> Result<(SolverPaths, SolverConfig)> {
    if config_path.exists() && !config_path.is_file() {
        return Err(anyhow!(
            "init: {} exists but is not a file",
            config_path.display()
        ));
    }
    let cfg = if config_path.exists() && !options.force {
        load_config(config_path)?
    } else {
        let cfg = SolverConfig::default();
        write_config(config_path, &cfg)?;
        cfg
    };

    let paths = SolverPaths::new(root, config_path.to_path_buf(), &cfg);
    fs::create_dir_all(&paths.storage_dir)
        .with_context(|| format!("create directory {}", paths.storage_dir.display()))?;
    Ok((paths, cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_creates_storage_and_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = SolverPaths::default_config_path(temp.path());

        let (paths, cfg) =
            init_solver(temp.path(), &config_path, &InitOptions { force: false }).expect("init");

        assert!(paths.storage_dir.is_dir());
        assert!(paths.config_path.is_file());
        assert_eq!(cfg, SolverConfig::default());
        assert_eq!(paths.storage_dir, temp.path().join(".problems"));
    }

    /// Verifies a second init keeps a hand-edited config unless forced.
    #[test]
    fn init_keeps_existing_config_without_force() {
        let temp = tempfile::tempdir().expect("tempdir");
        let config_path = SolverPaths::default_config_path(temp.path());
        let custom = SolverConfig {
            default_project: Some("api".to_string()),
            ..SolverConfig::default()
        };
        write_config(&config_path, &custom).expect("write");

        let (_, cfg) =
            init_solver(temp.path(), &config_path, &InitOptions { force: false }).expect("init");
        assert_eq!(cfg.default_project.as_deref(), Some("api"));

        let (_, cfg) =
            init_solver(temp.path(), &config_path, &InitOptions { force: true }).expect("init");
        assert_eq!(cfg, SolverConfig::default());
    }
}
