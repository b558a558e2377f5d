//! Brainstorming step: split the problem into approved tasks.

use tracing::info;

use crate::core::approval::all_tasks_approved;
use crate::core::problem::Problem;
use crate::core::step::ProblemStep;
use crate::core::types::{Brainstorming, ProblemActionInstructions, TaskDraft};
use crate::error::{Result, SolverError};
use crate::handlers::StepHandler;
use crate::io::instructions::InstructionKind;
use crate::service::ProblemService;

pub struct BrainstormingHandler<'a> {
    service: &'a ProblemService,
}

impl<'a> BrainstormingHandler<'a> {
    pub fn new(service: &'a ProblemService) -> Self {
        Self { service }
    }

    /// Create and persist an empty brainstorming record.
    pub fn add_brainstorming(&self, problem: &Problem) -> Result<Brainstorming> {
        let record = Brainstorming::empty(problem.id());
        self.service.brainstorming_store().save(&record)?;
        Ok(record)
    }

    /// Insert a task or replace its metadata. Existing changes are kept and
    /// the approval is withdrawn.
    pub fn add_or_modify_task(
        &self,
        problem: &mut Problem,
        task_number: u32,
        draft: TaskDraft,
    ) -> Result<ProblemActionInstructions> {
        self.service
            .check_step(problem, &[ProblemStep::Brainstorming])?;
        let task = problem.context_mut().tasks.entry(task_number).or_default();
        task.title = draft.title;
        task.description = draft.description;
        task.project_name = draft.project_name;
        task.project_developer_id = draft.project_developer_id;
        task.approved = false;
        self.service.save(problem)?;
        info!(problem_id = problem.id(), task_number, "task saved");
        self.continue_only(problem)
    }

    pub fn delete_task(
        &self,
        problem: &mut Problem,
        task_number: u32,
    ) -> Result<ProblemActionInstructions> {
        self.service
            .check_step(problem, &[ProblemStep::Brainstorming])?;
        if problem.context_mut().tasks.remove(&task_number).is_none() {
            return Err(SolverError::missing_task(task_number));
        }
        self.service.save(problem)?;
        info!(problem_id = problem.id(), task_number, "task deleted");
        self.continue_only(problem)
    }

    /// Approve one task; once every task is approved the problem moves to
    /// planning.
    pub fn approve_task(
        &self,
        problem: &mut Problem,
        task_number: u32,
    ) -> Result<ProblemActionInstructions> {
        self.service
            .check_step(problem, &[ProblemStep::Brainstorming])?;
        let task = problem
            .context_mut()
            .tasks
            .get_mut(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        task.approved = true;

        if all_tasks_approved(problem.context()) {
            self.service.start_plan_step(problem)?;
            return self.finish_instructions(problem);
        }
        self.service.save(problem)?;
        info!(problem_id = problem.id(), task_number, "task approved");
        self.continue_only(problem)
    }

    fn continue_only(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service
            .instructions_for(problem, &[InstructionKind::Continue])
    }
}

impl StepHandler for BrainstormingHandler<'_> {
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::StartBrainstorming],
        )
    }

    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        let mut out = self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::Continue],
        )?;
        out.extend(self.service.resume_blocks(problem)?);
        out.push(self.service.instruction(InstructionKind::Brainstorming, problem)?);
        Ok(out)
    }

    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service
            .instructions_for(problem, &[InstructionKind::Pause])
    }
}
