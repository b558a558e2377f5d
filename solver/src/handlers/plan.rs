//! Planning step: describe and approve the file changes of every task.

use tracing::info;

use crate::core::approval::all_changes_approved;
use crate::core::context::{Change, ChangeType};
use crate::core::problem::Problem;
use crate::core::step::ProblemStep;
use crate::core::types::{ChangeDraft, ProblemActionInstructions, TaskChangesOverview};
use crate::error::{Result, SolverError};
use crate::handlers::StepHandler;
use crate::io::instructions::InstructionKind;
use crate::service::ProblemService;

pub struct PlanHandler<'a> {
    service: &'a ProblemService,
}

impl<'a> PlanHandler<'a> {
    pub fn new(service: &'a ProblemService) -> Self {
        Self { service }
    }

    /// Add a change for `file_path` or replace the existing one. The change
    /// starts unapproved.
    pub fn add_or_modify_task_change(
        &self,
        problem: &mut Problem,
        task_number: u32,
        file_path: &str,
        draft: ChangeDraft,
    ) -> Result<ProblemActionInstructions> {
        self.service.check_step(problem, &[ProblemStep::Planning])?;
        self.service.files().resolve(file_path)?;
        draft
            .change_type
            .parse::<ChangeType>()
            .map_err(SolverError::InvalidArgument)?;

        let task = problem
            .context_mut()
            .tasks
            .get_mut(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        task.changes.upsert(
            file_path,
            Change {
                change_type: draft.change_type,
                goal: draft.goal,
                description: draft.description,
                context: draft.context,
                approved: false,
            },
        );
        self.service.save(problem)?;
        info!(problem_id = problem.id(), task_number, file_path, "task change saved");
        self.continue_only(problem)
    }

    /// Drop the change for `file_path`. An absent change is not an error.
    pub fn remove_task_change(
        &self,
        problem: &mut Problem,
        task_number: u32,
        file_path: &str,
    ) -> Result<ProblemActionInstructions> {
        self.service.check_step(problem, &[ProblemStep::Planning])?;
        let task = problem
            .context_mut()
            .tasks
            .get_mut(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        let removed = task.changes.remove(file_path).is_some();
        self.service.save(problem)?;
        info!(
            problem_id = problem.id(),
            task_number, file_path, removed, "task change removed"
        );
        self.continue_only(problem)
    }

    pub fn task_changes_overview(
        &self,
        problem: &Problem,
        task_number: u32,
    ) -> Result<TaskChangesOverview> {
        self.service.check_step(problem, &[ProblemStep::Planning])?;
        let task = problem
            .context()
            .tasks
            .get(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        Ok(TaskChangesOverview::from_task(task_number, task))
    }

    /// Approve every change of one task; once every change of every task is
    /// approved the problem moves to implementation.
    pub fn approve_task_changes(
        &self,
        problem: &mut Problem,
        task_number: u32,
    ) -> Result<ProblemActionInstructions> {
        self.service.check_step(problem, &[ProblemStep::Planning])?;
        let task = problem
            .context_mut()
            .tasks
            .get_mut(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        for change in task.changes.values_mut() {
            change.approved = true;
        }

        if all_changes_approved(problem.context()) {
            self.service.start_solve_step(problem)?;
            return self.finish_instructions(problem);
        }
        self.service.save(problem)?;
        info!(problem_id = problem.id(), task_number, "task changes approved");
        self.continue_only(problem)
    }

    fn continue_only(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service
            .instructions_for(problem, &[InstructionKind::Continue])
    }
}

impl StepHandler for PlanHandler<'_> {
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::TaskPlan],
        )
    }

    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        let mut out = self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::Continue],
        )?;
        out.extend(self.service.resume_blocks(problem)?);
        out.push(self.service.instruction(InstructionKind::TaskPlan, problem)?);
        Ok(out)
    }

    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service
            .instructions_for(problem, &[InstructionKind::Pause])
    }
}
