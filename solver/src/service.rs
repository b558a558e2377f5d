//! Problem lifecycle: creation, loading, step transitions and handler
//! dispatch.
//!
//! Handlers borrow the service, so every method takes `&self` and the problem
//! travels as `&mut Problem`. One action runs at a time per problem id;
//! callers that run actions in parallel must serialize them per id.

use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, info, instrument};

use crate::core::context::ProblemContext;
use crate::core::problem::{Problem, validate_problem_id};
use crate::core::step::ProblemStep;
use crate::core::types::ProblemActionInstructions;
use crate::error::{Result, SolverError};
use crate::handlers::analyze::AnalyzeHandler;
use crate::handlers::brainstorming::BrainstormingHandler;
use crate::handlers::changes::ChangesHandler;
use crate::handlers::plan::PlanHandler;
use crate::handlers::{Handler, StepHandler};
use crate::instructions::InstructionService;
use crate::io::brainstorming_store::BrainstormingStore;
use crate::io::compiler::{DocumentCompiler, FsDocumentCompiler, render_context};
use crate::io::config::SolverConfig;
use crate::io::documents::ProblemDocumentStore;
use crate::io::files::ProjectFiles;
use crate::io::init::SolverPaths;
use crate::io::instructions::{FileInstructionRepository, InstructionKind};
use crate::io::problem_store::{FileProblemStore, ProblemStore};

const NO_DRAFT: &str = "No brainstorming draft saved yet.";
const NO_CONTEXT: &str = "No context collected yet.";

pub struct ProblemService {
    store: Arc<dyn ProblemStore>,
    documents: ProblemDocumentStore,
    brainstorming: BrainstormingStore,
    instructions: InstructionService,
    compiler: Box<dyn DocumentCompiler>,
    files: ProjectFiles,
    default_project: Option<String>,
}

impl ProblemService {
    /// Documents and brainstorming records live in the directory `store`
    /// assigns to each problem.
    pub fn new(
        store: Arc<dyn ProblemStore>,
        instructions: InstructionService,
        compiler: Box<dyn DocumentCompiler>,
        files: ProjectFiles,
    ) -> Self {
        Self {
            documents: ProblemDocumentStore::new(store.clone()),
            brainstorming: BrainstormingStore::new(store.clone()),
            store,
            instructions,
            compiler,
            files,
            default_project: None,
        }
    }

    /// File-backed service for a resolved workspace.
    pub fn from_config(paths: &SolverPaths, config: &SolverConfig) -> Self {
        let files = ProjectFiles::new(&paths.project_root);
        let compiler = FsDocumentCompiler::new(
            files.clone(),
            config.overview.max_depth,
            config.overview.max_file_bytes,
        );
        let repository = FileInstructionRepository::new(paths.instructions_dir.clone());
        Self::new(
            Arc::new(FileProblemStore::new(&paths.storage_dir)),
            InstructionService::new(Box::new(repository)),
            Box::new(compiler),
            files,
        )
        .with_default_project(config.default_project.clone())
    }

    pub fn with_default_project(mut self, project: Option<String>) -> Self {
        self.default_project = project;
        self
    }

    pub fn documents(&self) -> &ProblemDocumentStore {
        &self.documents
    }

    pub fn brainstorming_store(&self) -> &BrainstormingStore {
        &self.brainstorming
    }

    pub fn files(&self) -> &ProjectFiles {
        &self.files
    }

    pub fn instructions(&self) -> &InstructionService {
        &self.instructions
    }

    /// Create and persist a new problem at step `new`.
    ///
    /// A supplied id must be unused; otherwise one is generated from the
    /// current time.
    #[instrument(skip_all, fields(problem_id = ?id))]
    pub fn create_problem(&self, original_problem: &str, id: Option<&str>) -> Result<Problem> {
        let id = match id {
            Some(id) => {
                validate_problem_id(id)?;
                if self.store.exists(id) {
                    return Err(SolverError::Conflict(id.to_string()));
                }
                id.to_string()
            }
            None => self.generate_id(),
        };
        let mut problem = Problem::new(id, original_problem);
        if let Some(project) = &self.default_project {
            problem.set_default_project(project.clone());
        }
        self.store.save(&problem)?;
        info!(problem_id = problem.id(), "problem created");
        Ok(problem)
    }

    fn generate_id(&self) -> String {
        let base = format!("local-{}", Utc::now().format("%Y%m%d%H%M%S"));
        if !self.store.exists(&base) {
            return base;
        }
        let mut rng = rand::thread_rng();
        loop {
            let suffix = std::iter::repeat_with(|| rng.sample(Alphanumeric))
                .map(char::from)
                .take(4)
                .collect::<String>()
                .to_lowercase();
            let candidate = format!("{base}-{suffix}");
            if !self.store.exists(&candidate) {
                return candidate;
            }
        }
    }

    pub fn get_problem(&self, id: &str) -> Result<Problem> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| SolverError::NotFound(format!("problem with ID {id} not found")))
    }

    /// The most recently saved problem.
    pub fn last_problem(&self) -> Result<Problem> {
        let id = self.store.last_problem_id()?.ok_or_else(|| {
            SolverError::NotFound("no problem has been worked on yet".to_string())
        })?;
        self.get_problem(&id)
    }

    pub fn problem_exists(&self, id: &str) -> bool {
        self.store.exists(id)
    }

    pub fn list_problem_ids(&self) -> Result<Vec<String>> {
        self.store.list_ids()
    }

    pub fn list_problems(&self) -> Result<Vec<Problem>> {
        self.list_problem_ids()?
            .iter()
            .map(|id| self.get_problem(id))
            .collect()
    }

    /// Fail with `StepViolation` unless the problem is at one of `expected`.
    pub fn check_step(&self, problem: &Problem, expected: &[ProblemStep]) -> Result<()> {
        if expected.contains(&problem.current_step()) {
            return Ok(());
        }
        Err(SolverError::step_violation(problem.current_step(), expected))
    }

    pub fn save(&self, problem: &Problem) -> Result<()> {
        self.store.save(problem)
    }

    fn advance(&self, problem: &mut Problem, from: ProblemStep, to: ProblemStep) -> Result<()> {
        self.check_step(problem, &[from])?;
        problem.set_current_step(to);
        problem.set_return_reason(None);
        self.store.save(problem)?;
        info!(problem_id = problem.id(), %from, %to, "step advanced");
        Ok(())
    }

    /// Persist the problem at `analyze`, moving it there from `new`.
    pub fn save_analyze(&self, problem: &mut Problem) -> Result<()> {
        match problem.current_step() {
            ProblemStep::New => self.advance(problem, ProblemStep::New, ProblemStep::Analyze),
            ProblemStep::Analyze => self.store.save(problem),
            actual => Err(SolverError::step_violation(
                actual,
                &[ProblemStep::New, ProblemStep::Analyze],
            )),
        }
    }

    pub fn start_brainstorming(&self, problem: &mut Problem) -> Result<()> {
        self.advance(problem, ProblemStep::Analyze, ProblemStep::Brainstorming)
    }

    pub fn start_plan_step(&self, problem: &mut Problem) -> Result<()> {
        self.advance(problem, ProblemStep::Brainstorming, ProblemStep::Planning)
    }

    pub fn start_solve_step(&self, problem: &mut Problem) -> Result<()> {
        self.advance(problem, ProblemStep::Planning, ProblemStep::Changes)
    }

    pub fn complete_problem(&self, problem: &mut Problem) -> Result<()> {
        self.advance(problem, ProblemStep::Changes, ProblemStep::Completed)
    }

    /// Move the problem back to `step`, recording why.
    ///
    /// Only working steps are valid targets, and never one after the current
    /// step. Applied file changes are not rolled back.
    #[instrument(skip_all, fields(problem_id = %problem.id(), step = %step))]
    pub fn restore_to_step(
        &self,
        problem: &mut Problem,
        step: ProblemStep,
        reason: &str,
    ) -> Result<()> {
        if reason.trim().is_empty() {
            return Err(SolverError::InvalidArgument(
                "return reason must not be empty".to_string(),
            ));
        }
        if !step.is_restorable() {
            return Err(SolverError::InvalidArgument(format!(
                "cannot return to step '{step}'"
            )));
        }
        if problem.current_step().is_before(step) {
            let allowed: Vec<ProblemStep> = ProblemStep::ALL
                .into_iter()
                .filter(|candidate| *candidate >= step)
                .collect();
            return Err(SolverError::step_violation(problem.current_step(), &allowed));
        }
        let from = problem.current_step();
        problem.set_current_step(step);
        problem.set_return_reason(Some(reason.to_string()));
        self.store.save(problem)?;
        info!(%from, reason, "returned to step");
        Ok(())
    }

    /// Clear the return reason; the step is unchanged.
    pub fn on_continue(&self, problem: &mut Problem) -> Result<()> {
        problem.set_return_reason(None);
        self.store.save(problem)
    }

    /// Replace the whole context and save.
    pub fn update_problem_context(
        &self,
        problem: &mut Problem,
        context: ProblemContext,
    ) -> Result<()> {
        problem.set_context(context);
        self.store.save(problem)
    }

    /// Handler for the problem's current step.
    pub fn handler(&self, problem: &Problem) -> Result<Handler<'_>> {
        match problem.current_step() {
            ProblemStep::New | ProblemStep::Analyze => {
                Ok(Handler::Analyze(AnalyzeHandler::new(self)))
            }
            ProblemStep::Brainstorming => {
                Ok(Handler::Brainstorming(BrainstormingHandler::new(self)))
            }
            ProblemStep::Planning => Ok(Handler::Plan(PlanHandler::new(self))),
            ProblemStep::Changes => Ok(Handler::Changes(ChangesHandler::new(self))),
            ProblemStep::Completed => Err(SolverError::NotFound(format!(
                "problem {} is completed; no handler for step 'completed'",
                problem.id()
            ))),
        }
    }

    /// Clear the return reason and emit the current step's continue
    /// instructions.
    pub fn continue_problem(&self, problem: &mut Problem) -> Result<ProblemActionInstructions> {
        self.on_continue(problem)?;
        self.handler(problem)?.continue_instructions(problem)
    }

    /// Render one instruction for `problem`.
    ///
    /// The draft and context variables are only resolved when the template
    /// references them.
    pub fn instruction(&self, kind: InstructionKind, problem: &Problem) -> Result<String> {
        let template = self.instructions.template(kind)?;
        let mut vars = InstructionService::problem_variables(problem);
        if template.contains("{brainstorming_draft_text}") {
            let draft = self.documents.brainstorming_draft(problem.id())?;
            vars.insert(
                "brainstorming_draft_text",
                draft.unwrap_or_else(|| NO_DRAFT.to_string()),
            );
        }
        if template.contains("{context_formatted}") {
            let block = self.context_block(problem)?;
            vars.insert(
                "context_formatted",
                block.unwrap_or_else(|| NO_CONTEXT.to_string()),
            );
        }
        Ok(InstructionService::fill(&template, &vars))
    }

    pub fn instructions_for(
        &self,
        problem: &Problem,
        kinds: &[InstructionKind],
    ) -> Result<ProblemActionInstructions> {
        let parts = kinds
            .iter()
            .map(|kind| self.instruction(*kind, problem))
            .collect::<Result<Vec<_>>>()?;
        Ok(ProblemActionInstructions::new(parts))
    }

    /// Context block and saved draft, shown when a later step is resumed.
    pub fn resume_blocks(&self, problem: &Problem) -> Result<ProblemActionInstructions> {
        let mut out = ProblemActionInstructions::default();
        if let Some(block) = self.context_block(problem)? {
            out.push(block);
        }
        if let Some(draft) = self.documents.brainstorming_draft(problem.id())? {
            out.push(format!("## Brainstorming draft\n\n{}", draft.trim_end()));
        }
        Ok(out)
    }

    /// Rendered overview of the problem context, if it has one.
    pub fn context_block(&self, problem: &Problem) -> Result<Option<String>> {
        debug!(problem_id = problem.id(), "rendering context block");
        render_context(problem.context(), self.compiler.as_ref())
    }
}
