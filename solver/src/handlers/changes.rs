//! Changes step: apply the approved file changes one at a time.

use tracing::{debug, info, instrument};

use crate::core::approval::next_change;
use crate::core::context::ChangeType;
use crate::core::problem::Problem;
use crate::core::step::ProblemStep;
use crate::core::types::{NextChange, ProblemActionInstructions};
use crate::error::{Result, SolverError};
use crate::handlers::StepHandler;
use crate::io::instructions::InstructionKind;
use crate::service::ProblemService;

pub struct ChangesHandler<'a> {
    service: &'a ProblemService,
}

impl<'a> ChangesHandler<'a> {
    pub fn new(service: &'a ProblemService) -> Self {
        Self { service }
    }

    /// The first change not implemented yet, by task number then plan order.
    pub fn next_change(&self, problem: &Problem) -> Option<NextChange> {
        next_change(problem.context()).map(NextChange::from)
    }

    /// Apply one planned change to the project and record it.
    ///
    /// The file operation is not undone if saving the problem fails
    /// afterwards.
    #[instrument(
        skip_all,
        fields(problem_id = %problem.id(), task_number = task_number, file_path = %file_path)
    )]
    pub fn make_change(
        &self,
        problem: &mut Problem,
        task_number: u32,
        file_path: &str,
        content: Option<&str>,
    ) -> Result<ProblemActionInstructions> {
        self.service.check_step(problem, &[ProblemStep::Changes])?;
        let task = problem
            .context()
            .tasks
            .get(&task_number)
            .ok_or_else(|| SolverError::missing_task(task_number))?;
        let change = task.changes.get(file_path).ok_or_else(|| {
            SolverError::MissingEntity(format!(
                "change for file {file_path} does not exist in task {task_number}"
            ))
        })?;
        let change_type = change
            .change_type
            .parse::<ChangeType>()
            .map_err(SolverError::InvalidArgument)?;

        let files = self.service.files();
        match change_type {
            ChangeType::New => {
                files.write(file_path, required_content(content, change_type)?)?;
            }
            ChangeType::Change => {
                let body = required_content(content, change_type)?;
                if !files.exists(file_path)? {
                    return Err(SolverError::FileNotFound {
                        path: files.resolve(file_path)?,
                    });
                }
                files.write(file_path, body)?;
            }
            ChangeType::Delete => {
                files.delete(file_path)?;
            }
        }
        debug!(?change_type, "file change applied");

        problem
            .context_mut()
            .mark_implemented(task_number, file_path);
        if next_change(problem.context()).is_none() {
            self.service.complete_problem(problem)?;
            return self.finish_instructions(problem);
        }
        self.service.save(problem)?;
        info!("change implemented");
        self.service
            .instructions_for(problem, &[InstructionKind::SolveTask])
    }
}

fn required_content(content: Option<&str>, change_type: ChangeType) -> Result<&str> {
    content.ok_or_else(|| {
        SolverError::InvalidArgument(format!(
            "content is required for change type '{}'",
            change_type.as_str()
        ))
    })
}

impl StepHandler for ChangesHandler<'_> {
    fn start_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::SolveTask],
        )
    }

    fn continue_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        let mut out = self.service.instructions_for(
            problem,
            &[InstructionKind::ProblemInfo, InstructionKind::Continue],
        )?;
        out.extend(self.service.resume_blocks(problem)?);
        out.push(self.service.instruction(InstructionKind::SolveTask, problem)?);
        Ok(out)
    }

    fn finish_instructions(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        self.service
            .instructions_for(problem, &[InstructionKind::Pause])
    }
}
