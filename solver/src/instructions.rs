//! Instruction rendering: templates from the repository, variables from the
//! problem.

use tracing::debug;

use crate::core::approval::{format_tasks, next_change};
use crate::core::placeholder::{Variables, substitute};
use crate::core::problem::Problem;
use crate::error::Result;
use crate::io::instructions::{InstructionKind, InstructionRepository};

const NOT_SET: &str = "not set";

pub struct InstructionService {
    repository: Box<dyn InstructionRepository>,
}

impl InstructionService {
    pub fn new(repository: Box<dyn InstructionRepository>) -> Self {
        Self { repository }
    }

    /// Raw template for `kind`.
    pub fn template(&self, kind: InstructionKind) -> Result<String> {
        self.repository.instruction_content(kind)
    }

    pub fn render(&self, kind: InstructionKind, vars: &Variables) -> Result<String> {
        let template = self.template(kind)?;
        debug!(%kind, vars = vars.len(), "rendering instruction");
        Ok(Self::fill(&template, vars))
    }

    /// Substitute `vars` into an already loaded template.
    pub fn fill(template: &str, vars: &Variables) -> String {
        substitute(template, vars).trim_end().to_string()
    }

    /// Error instruction shown after a failed action.
    pub fn error_instruction(&self, message: &str) -> Result<String> {
        let mut vars = Variables::new();
        vars.insert("error_message", message.to_string());
        self.render(InstructionKind::ContinueOnError, &vars)
    }

    /// Variables derivable from the problem snapshot alone.
    pub fn problem_variables(problem: &Problem) -> Variables {
        let mut vars = Variables::new();
        vars.insert("problem_id", problem.id().to_string());
        vars.insert(
            "problem_type",
            problem
                .problem_type()
                .map_or_else(|| NOT_SET.to_string(), |t| t.to_string()),
        );
        vars.insert(
            "default_project",
            problem.default_project().unwrap_or(NOT_SET).to_string(),
        );
        vars.insert("current_step", problem.current_step().to_string());
        vars.insert("return_reason_text", return_reason_text(problem));
        vars.insert("original_problem", problem.original_problem().to_string());
        vars.insert("tasks_formatted", format_tasks(problem.context()));
        vars.insert("next_change_formatted", next_change_text(problem));
        vars
    }
}

fn return_reason_text(problem: &Problem) -> String {
    match problem.return_reason() {
        Some(reason) => format!("\nYou returned to this step because: {reason}\n"),
        None => String::new(),
    }
}

fn next_change_text(problem: &Problem) -> String {
    let Some(pending) = next_change(problem.context()) else {
        return "All planned changes are implemented.".to_string();
    };
    let change = pending.change;
    let mut out = format!(
        "Task {}: `{}` ({})\n\nGoal: {}\n\nDescription: {}",
        pending.task_number, pending.file_path, change.change_type, change.goal, change.description
    );
    if !change.context.is_null() {
        let rendered = serde_json::to_string_pretty(&change.context)
            .unwrap_or_else(|_| change.context.to_string());
        out.push_str(&format!("\n\nContext:\n\n```json\n{rendered}\n```"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{Change, Task};
    use crate::core::problem::ProblemType;
    use crate::core::step::ProblemStep;
    use crate::io::instructions::FileInstructionRepository;
    use serde_json::json;

    fn service() -> InstructionService {
        InstructionService::new(Box::new(FileInstructionRepository::builtin()))
    }

    #[test]
    fn problem_info_fills_every_field() {
        let mut problem = Problem::new("P1", "Login fails on Safari");
        problem.set_problem_type(ProblemType::Bug);
        problem.set_default_project("web");

        let vars = InstructionService::problem_variables(&problem);
        let text = service()
            .render(InstructionKind::ProblemInfo, &vars)
            .expect("render");
        assert!(text.contains("`P1`"));
        assert!(text.contains("Type: bug"));
        assert!(text.contains("Default project: web"));
        assert!(text.contains("Current step: new"));
        assert!(text.contains("Login fails on Safari"));
        assert!(!text.contains('{'), "unresolved placeholder in {text}");
    }

    #[test]
    fn continue_mentions_return_reason_only_when_set() {
        let mut problem = Problem::new("P1", "x");
        problem.set_current_step(ProblemStep::Analyze);
        let plain = service()
            .render(
                InstructionKind::Continue,
                &InstructionService::problem_variables(&problem),
            )
            .expect("render");
        assert!(!plain.contains("returned"));

        problem.set_return_reason(Some("re-check scope".to_string()));
        let restored = service()
            .render(
                InstructionKind::Continue,
                &InstructionService::problem_variables(&problem),
            )
            .expect("render");
        assert!(restored.contains("You returned to this step because: re-check scope"));
    }

    #[test]
    fn error_instruction_carries_message() {
        let text = service().error_instruction("task 3 does not exist").expect("render");
        assert!(text.contains("task 3 does not exist"));
    }

    #[test]
    fn next_change_text_describes_first_pending_change() {
        let mut problem = Problem::new("P1", "x");
        let mut task = Task::default();
        task.changes.upsert(
            "src/a.rs",
            Change {
                change_type: "new".to_string(),
                goal: "add module".to_string(),
                description: "create it".to_string(),
                context: json!({"files": ["src/lib.rs"]}),
                approved: true,
            },
        );
        problem.context_mut().tasks.insert(1, task);

        let text = next_change_text(&problem);
        assert!(text.starts_with("Task 1: `src/a.rs` (new)"));
        assert!(text.contains("\"src/lib.rs\""));

        problem.context_mut().mark_implemented(1, "src/a.rs");
        assert_eq!(next_change_text(&problem), "All planned changes are implemented.");
    }
}
