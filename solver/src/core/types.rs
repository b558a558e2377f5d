//! Value types exchanged between handlers, the service and the tool boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::approval::PendingChange;
use crate::core::context::Task;

/// Ordered instruction texts produced by a handler.
///
/// Handlers never return an empty list on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProblemActionInstructions(Vec<String>);

impl ProblemActionInstructions {
    pub fn new(parts: impl IntoIterator<Item = String>) -> Self {
        Self(parts.into_iter().collect())
    }

    pub fn push(&mut self, instruction: impl Into<String>) {
        self.0.push(instruction.into());
    }

    pub fn extend(&mut self, other: ProblemActionInstructions) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

/// Per-problem brainstorming record, stored beside the problem snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brainstorming {
    pub problem_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub context: BTreeMap<String, Value>,
}

impl Brainstorming {
    pub fn empty(problem_id: impl Into<String>) -> Self {
        Self {
            problem_id: problem_id.into(),
            participants: Vec::new(),
            context: BTreeMap::new(),
        }
    }
}

/// Task metadata supplied by `add-or-modify-task`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub project_name: String,
    pub project_developer_id: String,
}

/// Change description supplied by `add-task-change`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDraft {
    pub change_type: String,
    pub goal: String,
    pub description: String,
    pub context: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub number: u32,
    pub title: String,
    pub description: String,
    pub project_name: String,
    pub developer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub change_type: String,
    pub goal: String,
    pub approved: bool,
}

/// Read model returned by `get-task-changes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskChangesOverview {
    pub task: TaskSummary,
    pub changes: Vec<ChangeSummary>,
}

impl TaskChangesOverview {
    pub fn from_task(number: u32, task: &Task) -> Self {
        Self {
            task: TaskSummary {
                number,
                title: task.title.clone(),
                description: task.description.clone(),
                project_name: task.project_name.clone(),
                developer: task.project_developer_id.clone(),
            },
            changes: task
                .changes
                .iter()
                .map(|(path, change)| ChangeSummary {
                    file_path: path.to_string(),
                    change_type: change.change_type.clone(),
                    goal: change.goal.clone(),
                    approved: change.approved,
                })
                .collect(),
        }
    }
}

/// Owned view of the next change to implement, returned by `get-next-change`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextChange {
    pub task_number: u32,
    pub file_path: String,
    pub change_type: String,
    pub goal: String,
    pub description: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl From<PendingChange<'_>> for NextChange {
    fn from(pending: PendingChange<'_>) -> Self {
        Self {
            task_number: pending.task_number,
            file_path: pending.file_path.to_string(),
            change_type: pending.change.change_type.clone(),
            goal: pending.change.goal.clone(),
            description: pending.change.description.clone(),
            context: pending.change.context.clone(),
        }
    }
}
