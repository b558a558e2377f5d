//! Linear workflow steps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow step of a problem.
///
/// Order is linear with no branching:
/// `new < analyze < brainstorming < planning < changes < completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemStep {
    New,
    Analyze,
    Brainstorming,
    Planning,
    Changes,
    Completed,
}

impl ProblemStep {
    pub const ALL: [ProblemStep; 6] = [
        ProblemStep::New,
        ProblemStep::Analyze,
        ProblemStep::Brainstorming,
        ProblemStep::Planning,
        ProblemStep::Changes,
        ProblemStep::Completed,
    ];

    /// Steps an agent may return to.
    pub const RESTORABLE: [ProblemStep; 4] = [
        ProblemStep::Analyze,
        ProblemStep::Brainstorming,
        ProblemStep::Planning,
        ProblemStep::Changes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProblemStep::New => "new",
            ProblemStep::Analyze => "analyze",
            ProblemStep::Brainstorming => "brainstorming",
            ProblemStep::Planning => "planning",
            ProblemStep::Changes => "changes",
            ProblemStep::Completed => "completed",
        }
    }

    pub fn next(self) -> Option<ProblemStep> {
        match self {
            ProblemStep::New => Some(ProblemStep::Analyze),
            ProblemStep::Analyze => Some(ProblemStep::Brainstorming),
            ProblemStep::Brainstorming => Some(ProblemStep::Planning),
            ProblemStep::Planning => Some(ProblemStep::Changes),
            ProblemStep::Changes => Some(ProblemStep::Completed),
            ProblemStep::Completed => None,
        }
    }

    pub fn is_before(self, other: ProblemStep) -> bool {
        self < other
    }

    pub fn is_restorable(self) -> bool {
        Self::RESTORABLE.contains(&self)
    }
}

impl fmt::Display for ProblemStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProblemStep {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|step| step.as_str() == value)
            .ok_or_else(|| format!("unknown workflow step '{value}'"))
    }
}
