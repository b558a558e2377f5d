//! Test-only helpers: a temp-backed service and deterministic model builders.

use std::path::PathBuf;

use serde_json::Value;
use tempfile::TempDir;

use crate::core::context::{Change, Task};
use crate::core::problem::Problem;
use crate::core::step::ProblemStep;
use crate::core::types::{ChangeDraft, TaskDraft};
use crate::io::config::SolverConfig;
use crate::io::init::SolverPaths;
use crate::service::ProblemService;

/// File-backed service whose project root and storage live in a temp dir.
pub struct TestSolver {
    pub service: ProblemService,
    /// Project root; change file paths resolve against it.
    pub root: PathBuf,
    _temp: TempDir,
}

impl TestSolver {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_default_project(project: &str) -> Self {
        Self::with_config(SolverConfig {
            default_project: Some(project.to_string()),
            ..SolverConfig::default()
        })
    }

    pub fn with_config(config: SolverConfig) -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let root = temp.path().to_path_buf();
        let paths = SolverPaths::new(&root, SolverPaths::default_config_path(&root), &config);
        Self {
            service: ProblemService::from_config(&paths, &config),
            root: paths.project_root,
            _temp: temp,
        }
    }

    /// Create a problem and force it to `step` without running transitions.
    pub fn problem_at(&self, id: &str, step: ProblemStep) -> Problem {
        let mut problem = self
            .service
            .create_problem(&format!("{id} problem"), Some(id))
            .expect("create problem");
        problem.set_current_step(step);
        self.service.save(&problem).expect("save problem");
        problem
    }
}

impl Default for TestSolver {
    fn default() -> Self {
        Self::new()
    }
}

pub fn task_draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: format!("{title} description"),
        project_name: "web".to_string(),
        project_developer_id: String::new(),
    }
}

/// Task with deterministic metadata and no changes.
pub fn task(title: &str, approved: bool) -> Task {
    Task {
        title: title.to_string(),
        description: format!("{title} description"),
        project_name: "web".to_string(),
        approved,
        ..Task::default()
    }
}

pub fn change(change_type: &str, approved: bool) -> Change {
    Change {
        change_type: change_type.to_string(),
        goal: format!("{change_type} goal"),
        description: format!("{change_type} description"),
        context: Value::Null,
        approved,
    }
}

pub fn change_draft(change_type: &str) -> ChangeDraft {
    ChangeDraft {
        change_type: change_type.to_string(),
        goal: format!("{change_type} goal"),
        description: format!("{change_type} description"),
        context: Value::Null,
    }
}
