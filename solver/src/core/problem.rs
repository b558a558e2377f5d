//! The `Problem` aggregate persisted by the problem store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::context::ProblemContext;
use crate::core::step::ProblemStep;
use crate::error::{Result as SolverResult, SolverError};

/// Marker file in the storage directory naming the last saved problem.
pub const LAST_PROBLEM_FILE: &str = "last_problem";
/// Default config file name, stored next to the problem directories.
pub const CONFIG_FILE_NAME: &str = "config.toml";

const RESERVED_IDS: [&str; 2] = [LAST_PROBLEM_FILE, CONFIG_FILE_NAME];

/// Validate that an id is safe to use as a storage directory name.
///
/// Names the storage directory uses for its own files, and their `.tmp`
/// siblings from atomic writes, are rejected.
pub fn validate_problem_id(id: &str) -> SolverResult<()> {
    if id.is_empty() {
        return Err(SolverError::InvalidArgument(
            "problem id must not be empty".to_string(),
        ));
    }
    if id == "." || id == ".." {
        return Err(SolverError::InvalidArgument(format!(
            "problem id must not be '{id}'"
        )));
    }
    if id
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'))
    {
        return Err(SolverError::InvalidArgument(format!(
            "problem id must be [A-Za-z0-9._-] only (got '{id}')"
        )));
    }
    let base = id.strip_suffix(".tmp").unwrap_or(id);
    if RESERVED_IDS.contains(&base) {
        return Err(SolverError::InvalidArgument(format!(
            "problem id '{id}' is reserved by the problem storage"
        )));
    }
    Ok(())
}

/// Kind of work the agent classified the problem as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemType {
    Feature,
    Bug,
    Research,
    Refactoring,
}

impl ProblemType {
    pub const NAMES: [&'static str; 4] = ["feature", "bug", "research", "refactoring"];

    pub fn as_str(self) -> &'static str {
        match self {
            ProblemType::Feature => "feature",
            ProblemType::Bug => "bug",
            ProblemType::Research => "research",
            ProblemType::Refactoring => "refactoring",
        }
    }
}

impl fmt::Display for ProblemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "feature" => Ok(ProblemType::Feature),
            "bug" => Ok(ProblemType::Bug),
            "research" => Ok(ProblemType::Research),
            "refactoring" => Ok(ProblemType::Refactoring),
            other => Err(format!(
                "invalid problem type '{other}' (expected feature, bug, research or refactoring)"
            )),
        }
    }
}

/// A unit of agent-driven work.
///
/// `id` and `original_problem` are fixed at creation. The step and the return
/// reason only move through `ProblemService`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    id: String,
    #[serde(rename = "originalProblem")]
    original_problem: String,
    #[serde(rename = "type", default)]
    problem_type: Option<ProblemType>,
    #[serde(rename = "defaultProject", default)]
    default_project: Option<String>,
    #[serde(default)]
    context: ProblemContext,
    #[serde(rename = "currentStep")]
    current_step: ProblemStep,
    #[serde(rename = "returnReason", default)]
    return_reason: Option<String>,
}

impl Problem {
    pub fn new(id: impl Into<String>, original_problem: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            original_problem: original_problem.into(),
            problem_type: None,
            default_project: None,
            context: ProblemContext::default(),
            current_step: ProblemStep::New,
            return_reason: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn original_problem(&self) -> &str {
        &self.original_problem
    }

    pub fn problem_type(&self) -> Option<ProblemType> {
        self.problem_type
    }

    pub fn set_problem_type(&mut self, problem_type: ProblemType) {
        self.problem_type = Some(problem_type);
    }

    pub fn default_project(&self) -> Option<&str> {
        self.default_project.as_deref()
    }

    pub fn set_default_project(&mut self, project: impl Into<String>) {
        self.default_project = Some(project.into());
    }

    pub fn context(&self) -> &ProblemContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ProblemContext {
        &mut self.context
    }

    pub fn set_context(&mut self, context: ProblemContext) {
        self.context = context;
    }

    pub fn current_step(&self) -> ProblemStep {
        self.current_step
    }

    pub(crate) fn set_current_step(&mut self, step: ProblemStep) {
        self.current_step = step;
    }

    pub fn return_reason(&self) -> Option<&str> {
        self.return_reason.as_deref()
    }

    pub(crate) fn set_return_reason(&mut self, reason: Option<String>) {
        self.return_reason = reason;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_problem_starts_blank() {
        let problem = Problem::new("P1", "fix login");
        assert_eq!(problem.id(), "P1");
        assert_eq!(problem.original_problem(), "fix login");
        assert_eq!(problem.current_step(), ProblemStep::New);
        assert!(problem.problem_type().is_none());
        assert!(problem.return_reason().is_none());
        assert_eq!(problem.context(), &ProblemContext::default());
    }

    /// Ensures the persisted JSON uses the stable camelCase keys.
    #[test]
    fn serializes_with_stable_keys() {
        let mut problem = Problem::new("P1", "fix login");
        problem.set_problem_type(ProblemType::Bug);
        problem.set_default_project("web");
        problem.set_current_step(ProblemStep::Planning);
        problem.set_return_reason(Some("scope".to_string()));

        let value = serde_json::to_value(&problem).expect("serialize");
        assert_eq!(
            value,
            json!({
                "id": "P1",
                "originalProblem": "fix login",
                "type": "bug",
                "defaultProject": "web",
                "context": {},
                "currentStep": "planning",
                "returnReason": "scope"
            })
        );
    }

    #[test]
    fn missing_optional_keys_default() {
        let raw = json!({"id": "P2", "originalProblem": "x", "currentStep": "analyze"});
        let problem: Problem = serde_json::from_value(raw).expect("deserialize");
        assert_eq!(problem.current_step(), ProblemStep::Analyze);
        assert!(problem.default_project().is_none());
    }

    #[test]
    fn validate_problem_id_rejects_path_like_ids() {
        assert!(validate_problem_id("local-20240101120000").is_ok());
        assert!(validate_problem_id("P1.v2_x").is_ok());
        assert!(validate_problem_id("").is_err());
        assert!(validate_problem_id("..").is_err());
        assert!(validate_problem_id("a/b").is_err());
        assert!(validate_problem_id("a b").is_err());
    }

    #[test]
    fn validate_problem_id_rejects_storage_file_names() {
        for id in ["last_problem", "last_problem.tmp", "config.toml", "config.toml.tmp"] {
            let err = validate_problem_id(id).unwrap_err();
            assert_eq!(err.kind(), "invalid_argument", "{id}");
        }
        assert!(validate_problem_id("last_problem_2").is_ok());
        assert!(validate_problem_id("config").is_ok());
    }

    #[test]
    fn problem_type_rejects_unknown_names() {
        assert_eq!("research".parse::<ProblemType>(), Ok(ProblemType::Research));
        assert!("chore".parse::<ProblemType>().is_err());
    }
}
