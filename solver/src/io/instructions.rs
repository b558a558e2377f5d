//! Instruction templates: built-in defaults with optional on-disk overrides.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, SolverError};

/// Closed set of instruction templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstructionKind {
    FirstAnalyze,
    Analyze,
    AnalyzeComplete,
    StartBrainstorming,
    Brainstorming,
    TaskPlan,
    SolveTask,
    Pause,
    Continue,
    ContinueOnError,
    ProblemInfo,
}

impl InstructionKind {
    pub const ALL: [InstructionKind; 11] = [
        InstructionKind::FirstAnalyze,
        InstructionKind::Analyze,
        InstructionKind::AnalyzeComplete,
        InstructionKind::StartBrainstorming,
        InstructionKind::Brainstorming,
        InstructionKind::TaskPlan,
        InstructionKind::SolveTask,
        InstructionKind::Pause,
        InstructionKind::Continue,
        InstructionKind::ContinueOnError,
        InstructionKind::ProblemInfo,
    ];

    /// File stem used for overrides (`<name>.md`).
    pub fn name(self) -> &'static str {
        match self {
            InstructionKind::FirstAnalyze => "FirstAnalyze",
            InstructionKind::Analyze => "Analyze",
            InstructionKind::AnalyzeComplete => "AnalyzeComplete",
            InstructionKind::StartBrainstorming => "StartBrainstorming",
            InstructionKind::Brainstorming => "Brainstorming",
            InstructionKind::TaskPlan => "TaskPlan",
            InstructionKind::SolveTask => "SolveTask",
            InstructionKind::Pause => "Pause",
            InstructionKind::Continue => "Continue",
            InstructionKind::ContinueOnError => "ContinueOnError",
            InstructionKind::ProblemInfo => "ProblemInfo",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            InstructionKind::FirstAnalyze => include_str!("instructions/FirstAnalyze.md"),
            InstructionKind::Analyze => include_str!("instructions/Analyze.md"),
            InstructionKind::AnalyzeComplete => include_str!("instructions/AnalyzeComplete.md"),
            InstructionKind::StartBrainstorming => {
                include_str!("instructions/StartBrainstorming.md")
            }
            InstructionKind::Brainstorming => include_str!("instructions/Brainstorming.md"),
            InstructionKind::TaskPlan => include_str!("instructions/TaskPlan.md"),
            InstructionKind::SolveTask => include_str!("instructions/SolveTask.md"),
            InstructionKind::Pause => include_str!("instructions/Pause.md"),
            InstructionKind::Continue => include_str!("instructions/Continue.md"),
            InstructionKind::ContinueOnError => include_str!("instructions/ContinueOnError.md"),
            InstructionKind::ProblemInfo => include_str!("instructions/ProblemInfo.md"),
        }
    }
}

impl fmt::Display for InstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Source of raw (unsubstituted) instruction templates.
pub trait InstructionRepository {
    fn instruction_content(&self, kind: InstructionKind) -> Result<String>;
}

/// Reads `<dir>/<Kind>.md` when an override directory is configured and the
/// file exists, else serves the built-in template.
#[derive(Debug, Clone, Default)]
pub struct FileInstructionRepository {
    override_dir: Option<PathBuf>,
}

impl FileInstructionRepository {
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }

    /// Repository serving only the built-in templates.
    pub fn builtin() -> Self {
        Self::default()
    }
}

impl InstructionRepository for FileInstructionRepository {
    fn instruction_content(&self, kind: InstructionKind) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.md", kind.name()));
            if path.is_file() {
                debug!(path = %path.display(), %kind, "using instruction override");
                return fs::read_to_string(&path)
                    .map_err(|err| SolverError::store(format!("read {}", path.display()), err));
            }
        }
        Ok(kind.builtin().to_string())
    }
}
