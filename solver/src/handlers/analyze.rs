//! Analyze step (also serves problems still at `new`).

use tracing::info;

use crate::core::context::ProblemContext;
use crate::core::problem::{Problem, ProblemType};
use crate::core::step::ProblemStep;
use crate::core::types::ProblemActionInstructions;
use crate::error::Result;
use crate::handlers::StepHandler;
use crate::handlers::brainstorming::BrainstormingHandler;
use crate::io::instructions::InstructionKind;
use crate::service::ProblemService;

pub struct AnalyzeHandler<'a> {
    service: &'a ProblemService,
}

impl<'a> AnalyzeHandler<'a> {
    pub fn new(service: &'a ProblemService) -> Self {
        Self { service }
    }

    /// Record the classification, collected context and draft, then ask for
    /// another refinement round. The step stays at (or moves to) `analyze`.
    ///
    /// Only the overview part of the context is replaced; tasks and
    /// implementation progress are kept.
    pub fn save_brainstorming_draft(
        &self,
        problem: &mut Problem,
        problem_type: ProblemType,
        default_project: &str,
        draft: &str,
        context: Option<ProblemContext>,
    ) -> Result<ProblemActionInstructions> {
        self.service
            .check_step(problem, &[ProblemStep::New, ProblemStep::Analyze])?;

        problem.set_problem_type(problem_type);
        problem.set_default_project(default_project);

        let mut changed_block = None;
        if let Some(overview) = context {
            let before = problem.context().clone();
            problem.context_mut().replace_overview(overview);
            if *problem.context() != before
                && let Some(block) = self.service.context_block(problem)?
            {
                self.service
                    .documents()
                    .store_context_overview(problem.id(), &block)?;
                changed_block = Some(block);
            }
        }

        self.service
            .documents()
            .set_brainstorming_draft(problem.id(), draft)?;
        self.service.save_analyze(problem)?;
        info!(
            problem_id = problem.id(),
            context_changed = changed_block.is_some(),
            "brainstorming draft saved"
        );

        let mut out = ProblemActionInstructions::default();
        out.push(self.service.instruction(InstructionKind::ProblemInfo, problem)?);
        if let Some(block) = changed_block {
            out.push(block);
        }
        out.push(self.service.instruction(InstructionKind::Analyze, problem)?);
        Ok(out)
    }

    /// Accept the draft and move on to brainstorming.
    pub fn approve_brainstorming_draft(
        &self,
        problem: &mut Problem,
    ) -> Result<ProblemActionInstructions> {
        self.service.start_brainstorming(problem)?;
        if !self.service.brainstorming_store().exists(problem.id()) {
            BrainstormingHandler::new(self.service).add_brainstorming(problem)?;
        }
        self.finish_instructions(problem)
    }
}

impl StepHandler for AnalyzeHandler<'_> {
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::FirstAnalyze],
        )
    }

    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        let mut out = self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::Continue],
        )?;
        if let Some(block) = self.service.context_block(problem)? {
            out.push(block);
        }
        out.push(self.service.instruction(InstructionKind::Analyze, problem)?);
        Ok(out)
    }

    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service.instructions_for(
            problem,
            &[InstructionKind::AnalyzeComplete, InstructionKind::Pause],
        )
    }
}
