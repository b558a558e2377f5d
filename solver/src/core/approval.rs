//! Approval gates and change scheduling over a problem context.
//!
//! Every "all approved" check short-circuits on the first unapproved item and
//! treats an empty set as not approved.

use crate::core::context::{Change, ProblemContext};

/// A change that has not been implemented yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChange<'a> {
    pub task_number: u32,
    pub file_path: &'a str,
    pub change: &'a Change,
}

/// True when at least one task exists and every task is approved.
pub fn all_tasks_approved(context: &ProblemContext) -> bool {
    !context.tasks.is_empty() && context.tasks.values().all(|task| task.approved)
}

/// True when at least one change exists across all tasks and every change is
/// approved.
pub fn all_changes_approved(context: &ProblemContext) -> bool {
    let mut seen = false;
    for task in context.tasks.values() {
        for (_, change) in task.changes.iter() {
            if !change.approved {
                return false;
            }
            seen = true;
        }
    }
    seen
}

/// First change, by ascending task number then insertion order, whose
/// composite key is not in `implemented_changes`.
pub fn next_change(context: &ProblemContext) -> Option<PendingChange<'_>> {
    context.tasks.iter().find_map(|(&task_number, task)| {
        task.changes
            .iter()
            .find(|(path, _)| !context.is_implemented(task_number, path))
            .map(|(file_path, change)| PendingChange {
                task_number,
                file_path,
                change,
            })
    })
}

/// Human-readable task list used in brainstorming instructions.
pub fn format_tasks(context: &ProblemContext) -> String {
    if context.tasks.is_empty() {
        return "No tasks defined yet.".to_string();
    }
    let mut out = String::new();
    for (number, task) in &context.tasks {
        let status = if task.approved { "approved" } else { "pending" };
        out.push_str(&format!(
            "- Task {number} [{status}]: {} (project: {})\n",
            task.title, task.project_name
        ));
        if !task.description.is_empty() {
            out.push_str(&format!("  {}\n", task.description));
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Task;
    use serde_json::Value;

    fn change(approved: bool) -> Change {
        Change {
            change_type: "new".to_string(),
            goal: "g".to_string(),
            description: "d".to_string(),
            context: Value::Null,
            approved,
        }
    }

    fn task(approved: bool, changes: &[(&str, bool)]) -> Task {
        let mut task = Task {
            title: "t".to_string(),
            approved,
            ..Task::default()
        };
        for (path, approved) in changes {
            task.changes.upsert(path, change(*approved));
        }
        task
    }

    #[test]
    fn empty_task_set_is_not_approved() {
        assert!(!all_tasks_approved(&ProblemContext::default()));
    }

    #[test]
    fn one_unapproved_task_blocks_approval() {
        let mut ctx = ProblemContext::default();
        ctx.tasks.insert(1, task(true, &[]));
        assert!(all_tasks_approved(&ctx));
        ctx.tasks.insert(2, task(false, &[]));
        assert!(!all_tasks_approved(&ctx));
    }

    #[test]
    fn change_approval_needs_at_least_one_change() {
        let mut ctx = ProblemContext::default();
        ctx.tasks.insert(1, task(true, &[]));
        assert!(!all_changes_approved(&ctx));

        ctx.tasks.insert(2, task(true, &[("a.rs", true), ("b.rs", true)]));
        assert!(all_changes_approved(&ctx));

        ctx.tasks.insert(3, task(true, &[("c.rs", false)]));
        assert!(!all_changes_approved(&ctx));
    }

    /// Verifies scan order: ascending task number, then insertion order.
    #[test]
    fn next_change_follows_task_then_insertion_order() {
        let mut ctx = ProblemContext::default();
        ctx.tasks.insert(2, task(true, &[("z.rs", true), ("a.rs", true)]));
        ctx.tasks.insert(1, task(true, &[("m.rs", true)]));

        let mut order = Vec::new();
        while let Some(pending) = next_change(&ctx) {
            order.push((pending.task_number, pending.file_path.to_string()));
            let (number, path) = (pending.task_number, pending.file_path.to_string());
            ctx.mark_implemented(number, &path);
        }
        assert_eq!(
            order,
            vec![
                (1, "m.rs".to_string()),
                (2, "z.rs".to_string()),
                (2, "a.rs".to_string()),
            ]
        );
    }

    #[test]
    fn format_tasks_lists_status() {
        let mut ctx = ProblemContext::default();
        assert_eq!(format_tasks(&ctx), "No tasks defined yet.");
        ctx.tasks.insert(1, task(true, &[]));
        ctx.tasks.insert(2, task(false, &[]));
        let text = format_tasks(&ctx);
        assert!(text.contains("Task 1 [approved]"));
        assert!(text.contains("Task 2 [pending]"));
    }
}
