//! Step handlers: one per workflow step, selected by `ProblemService::handler`.

pub mod analyze;
pub mod brainstorming;
pub mod changes;
pub mod plan;

use crate::core::problem::Problem;
use crate::core::types::ProblemActionInstructions;
use crate::error::Result;

use analyze::AnalyzeHandler;
use brainstorming::BrainstormingHandler;
use changes::ChangesHandler;
use plan::PlanHandler;

/// Instructions every step can produce.
pub trait StepHandler {
    /// Issued when a problem first enters the step.
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions>;

    /// Issued on continue or after returning to the step; reflects the current
    /// context and any return reason.
    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions>;

    /// Issued once the step is complete.
    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions>;
}

/// Handler for the problem's current step.
pub enum Handler<'a> {
    Analyze(AnalyzeHandler<'a>),
    Brainstorming(BrainstormingHandler<'a>),
    Plan(PlanHandler<'a>),
    Changes(ChangesHandler<'a>),
}

impl Handler<'_> {
    fn inner(&self) -> &dyn StepHandler {
        match self {
            Handler::Analyze(handler) => handler,
            Handler::Brainstorming(handler) => handler,
            Handler::Plan(handler) => handler,
            Handler::Changes(handler) => handler,
        }
    }
}

impl StepHandler for Handler<'_> {
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.inner().start_instructions(problem)
    }

    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.inner().continue_instructions(problem)
    }

    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.inner().finish_instructions(problem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::Note;
    use crate::core::step::ProblemStep;
    use crate::test_support::TestSolver;

    #[test]
    fn dispatch_follows_the_current_step() {
        let solver = TestSolver::new();
        let cases = [
            (ProblemStep::New, "analyze"),
            (ProblemStep::Analyze, "analyze"),
            (ProblemStep::Brainstorming, "brainstorming"),
            (ProblemStep::Planning, "plan"),
            (ProblemStep::Changes, "changes"),
        ];
        for (step, expected) in cases {
            let problem = solver.problem_at(&format!("P-{step}"), step);
            let name = match solver.service.handler(&problem).expect("handler") {
                Handler::Analyze(_) => "analyze",
                Handler::Brainstorming(_) => "brainstorming",
                Handler::Plan(_) => "plan",
                Handler::Changes(_) => "changes",
            };
            assert_eq!(name, expected, "step {step}");
        }
    }

    #[test]
    fn start_instructions_are_never_empty() {
        let solver = TestSolver::new();
        for step in [
            ProblemStep::New,
            ProblemStep::Brainstorming,
            ProblemStep::Planning,
            ProblemStep::Changes,
        ] {
            let problem = solver.problem_at(&format!("S-{step}"), step);
            let handler = solver.service.handler(&problem).expect("handler");
            let start = handler.start_instructions(&problem).expect("start");
            let cont = handler.continue_instructions(&problem).expect("continue");
            let finish = handler.finish_instructions(&problem).expect("finish");
            assert!(!start.is_empty() && !cont.is_empty() && !finish.is_empty());
        }
    }

    #[test]
    fn resuming_a_later_step_shows_context_and_draft() {
        let solver = TestSolver::new();
        for step in [
            ProblemStep::Brainstorming,
            ProblemStep::Planning,
            ProblemStep::Changes,
        ] {
            let id = format!("R-{step}");
            let mut problem = solver.problem_at(&id, step);
            let mut context = problem.context().clone();
            context.notes.push(Note {
                title: "Constraint".to_string(),
                content: "keep the public api".to_string(),
            });
            solver
                .service
                .update_problem_context(&mut problem, context)
                .expect("context");
            solver
                .service
                .documents()
                .set_brainstorming_draft(&id, "split the parser first")
                .expect("draft");

            let out = solver
                .service
                .continue_problem(&mut problem)
                .expect("continue");
            let text = out.as_slice().join("\n");
            assert!(text.contains("keep the public api"), "step {step}");
            assert!(text.contains("split the parser first"), "step {step}");
        }
    }
}
