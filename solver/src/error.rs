//! Error taxonomy for problem solver operations.
//!
//! Every variant maps to one failure category surfaced to the calling agent.
//! Nothing here is retried internally; the tool boundary logs the error and
//! turns it into an error result.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::step::ProblemStep;

pub type Result<T> = std::result::Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    /// Problem id unknown, or the current step has no handler.
    #[error("{0}")]
    NotFound(String),

    /// A problem with the requested id already exists.
    #[error("problem with ID {0} already exists")]
    Conflict(String),

    /// The operation requires a different workflow step.
    #[error("problem is at step '{actual}', but expected step is '{expected}'")]
    StepViolation {
        actual: ProblemStep,
        expected: String,
    },

    /// A referenced task or change does not exist in the problem context.
    #[error("{0}")]
    MissingEntity(String),

    /// Unrecognized value or missing request parameter.
    #[error("{0}")]
    InvalidArgument(String),

    /// A change targets a file that is not on disk.
    #[error("file {} does not exist", path.display())]
    FileNotFound { path: PathBuf },

    /// Serialization or I/O failure while reading or writing state.
    #[error("storage error: {0}")]
    Store(String),
}

impl SolverError {
    pub fn step_violation(actual: ProblemStep, expected: &[ProblemStep]) -> Self {
        let expected = expected
            .iter()
            .map(|step| step.as_str())
            .collect::<Vec<_>>()
            .join("' or '");
        Self::StepViolation { actual, expected }
    }

    pub fn missing_task(task_number: u32) -> Self {
        Self::MissingEntity(format!("task {task_number} does not exist"))
    }

    pub fn store(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Store(format!("{context}: {err}"))
    }

    /// Stable machine-readable category name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::StepViolation { .. } => "step_violation",
            Self::MissingEntity(_) => "missing_entity",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::FileNotFound { .. } => "file_not_found",
            Self::Store(_) => "store",
        }
    }
}
