//! File-backed problem snapshots under `<storage_dir>/<id>/problem.json`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::problem::{LAST_PROBLEM_FILE, Problem};
use crate::error::{Result, SolverError};

const PROBLEM_FILE: &str = "problem.json";

/// Persistence contract for `Problem` snapshots.
pub trait ProblemStore {
    /// Persist the full snapshot, replacing any previous one.
    fn save(&self, problem: &Problem) -> Result<()>;

    /// Load a snapshot; `None` when no record exists.
    fn find_by_id(&self, id: &str) -> Result<Option<Problem>>;

    fn exists(&self, id: &str) -> bool;

    fn list_ids(&self) -> Result<Vec<String>>;

    /// Directory that colocates every artifact of one problem.
    fn problem_directory(&self, id: &str) -> PathBuf;

    /// Id of the most recently saved problem.
    fn last_problem_id(&self) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct FileProblemStore {
    storage_dir: PathBuf,
}

impl FileProblemStore {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
        }
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn problem_path(&self, id: &str) -> PathBuf {
        self.problem_directory(id).join(PROBLEM_FILE)
    }

    fn last_problem_path(&self) -> PathBuf {
        self.storage_dir.join(LAST_PROBLEM_FILE)
    }
}

impl ProblemStore for FileProblemStore {
    fn save(&self, problem: &Problem) -> Result<()> {
        let path = self.problem_path(problem.id());
        debug!(
            path = %path.display(),
            problem_id = problem.id(),
            step = %problem.current_step(),
            "writing problem"
        );
        let mut buf = serde_json::to_string_pretty(problem)
            .map_err(|err| SolverError::store(format!("serialize problem {}", problem.id()), err))?;
        buf.push('\n');
        super::write_atomic(&path, &buf)
            .map_err(|err| SolverError::store(format!("write {}", path.display()), err))?;

        let marker = self.last_problem_path();
        super::write_atomic(&marker, &format!("{}\n", problem.id()))
            .map_err(|err| SolverError::store(format!("write {}", marker.display()), err))?;
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<Problem>> {
        let path = self.problem_path(id);
        if !path.is_file() {
            debug!(path = %path.display(), "problem not stored");
            return Ok(None);
        }
        debug!(path = %path.display(), "loading problem");
        let contents = fs::read_to_string(&path)
            .map_err(|err| SolverError::store(format!("read {}", path.display()), err))?;
        let problem: Problem = serde_json::from_str(&contents)
            .map_err(|err| SolverError::store(format!("parse {}", path.display()), err))?;
        Ok(Some(problem))
    }

    fn exists(&self, id: &str) -> bool {
        self.problem_path(id).is_file()
    }

    fn list_ids(&self) -> Result<Vec<String>> {
        if !self.storage_dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.storage_dir).map_err(|err| {
            SolverError::store(format!("read {}", self.storage_dir.display()), err)
        })?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| {
                SolverError::store(format!("read {}", self.storage_dir.display()), err)
            })?;
            if !entry.path().join(PROBLEM_FILE).is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                ids.push(name.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn problem_directory(&self, id: &str) -> PathBuf {
        self.storage_dir.join(id)
    }

    fn last_problem_id(&self) -> Result<Option<String>> {
        let path = self.last_problem_path();
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .map_err(|err| SolverError::store(format!("read {}", path.display()), err))?;
        let id = contents.trim();
        Ok((!id.is_empty()).then(|| id.to_string()))
    }
}
