//! Solver configuration stored under `.problems/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Solver configuration (TOML).
///
/// Relative paths are resolved against the workspace root passed on the
/// command line. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SolverConfig {
    /// Directory holding one subdirectory per problem.
    pub storage_dir: PathBuf,

    /// Root that change file paths are resolved against.
    pub project_root: PathBuf,

    /// Project assigned to newly created problems.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_project: Option<String>,

    /// Directory with `<Kind>.md` files overriding the built-in instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions_dir: Option<PathBuf>,

    pub overview: OverviewConfig,
}

/// Limits for the rendered context block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OverviewConfig {
    /// Maximum directory depth listed in a directory overview.
    pub max_depth: usize,

    /// Files larger than this are truncated in a file source dump.
    pub max_file_bytes: u64,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_file_bytes: 64 * 1024,
        }
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".problems"),
            project_root: PathBuf::from("."),
            default_project: None,
            instructions_dir: None,
            overview: OverviewConfig::default(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<()> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage_dir must not be empty"));
        }
        if self.project_root.as_os_str().is_empty() {
            return Err(anyhow!("project_root must not be empty"));
        }
        if let Some(dir) = &self.instructions_dir
            && dir.as_os_str().is_empty()
        {
            return Err(anyhow!("instructions_dir must not be empty when set"));
        }
        if self
            .default_project
            .as_deref()
            .is_some_and(|p| p.trim().is_empty())
        {
            return Err(anyhow!("default_project must not be blank when set"));
        }
        if self.overview.max_depth == 0 {
            return Err(anyhow!("overview.max_depth must be > 0"));
        }
        if self.overview.max_file_bytes == 0 {
            return Err(anyhow!("overview.max_file_bytes must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SolverConfig::default()`.
pub fn load_config(path: &Path) -> Result<SolverConfig> {
    if !path.exists() {
        let cfg = SolverConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SolverConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SolverConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    super::write_atomic(path, &buf).with_context(|| format!("write config {}", path.display()))
}
