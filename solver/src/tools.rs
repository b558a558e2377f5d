//! Tool boundary: named actions with JSON parameters, returning text results.
//!
//! Every action goes through the same pipeline: required parameters are
//! checked, the parameters are validated against the action's JSON Schema,
//! and the action runs against the [`ProblemService`]. Failures never
//! escape; they become an error result carrying the message and the
//! recovery instruction.

use jsonschema::Draft;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use crate::core::context::{ChangeType, ProblemContext};
use crate::core::problem::{Problem, ProblemType};
use crate::core::step::ProblemStep;
use crate::core::types::{ChangeDraft, ProblemActionInstructions, TaskDraft};
use crate::error::{Result, SolverError};
use crate::handlers::StepHandler;
use crate::handlers::analyze::AnalyzeHandler;
use crate::handlers::brainstorming::BrainstormingHandler;
use crate::handlers::changes::ChangesHandler;
use crate::handlers::plan::PlanHandler;
use crate::service::ProblemService;

const NO_CHANGES_LEFT: &str = "no changes left";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Result of one tool call, in the shape tool clients expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(texts: impl IntoIterator<Item = String>) -> Self {
        Self::from_texts(texts, false)
    }

    pub fn error(texts: impl IntoIterator<Item = String>) -> Self {
        Self::from_texts(texts, true)
    }

    fn from_texts(texts: impl IntoIterator<Item = String>, is_error: bool) -> Self {
        Self {
            content: texts
                .into_iter()
                .map(|text| TextContent { kind: "text", text })
                .collect(),
            is_error,
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().map(|item| item.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

fn tool(name: &'static str, description: &'static str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        input_schema,
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn text(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn task_number() -> Value {
    json!({
        "type": ["integer", "string"],
        "minimum": 1,
        "pattern": "^[0-9]+$",
        "description": "Task number, starting at 1",
    })
}

fn problem_id() -> Value {
    text("Problem identifier")
}

fn return_tool(name: &'static str, description: &'static str) -> ToolDefinition {
    tool(
        name,
        description,
        object(
            json!({
                "problem_id": text("Problem identifier; defaults to the last problem worked on"),
                "return_reason": text("Why the work goes back to this step"),
            }),
            &["return_reason"],
        ),
    )
}

/// Every action the solver exposes.
pub fn catalogue() -> Vec<ToolDefinition> {
    vec![
        tool(
            "add-problem",
            "Register a new problem and get the first analysis instructions",
            object(
                json!({
                    "original_problem": text("The problem as stated by its owner"),
                    "problem_id": text("Identifier to use instead of a generated one"),
                }),
                &["original_problem"],
            ),
        ),
        tool(
            "save-brainstorming-draft",
            "Save the classification, collected context and brainstorming draft",
            object(
                json!({
                    "problem_id": problem_id(),
                    "problem_type": {
                        "type": "string",
                        "enum": ProblemType::NAMES,
                        "description": "Problem classification",
                    },
                    "default_project": text("Project most changes will touch"),
                    "brainstorming_draft": text("Markdown draft of the solution"),
                    "brainstorming_context": {
                        "type": "object",
                        "description": "Directory, package, file and note overview",
                    },
                    "approved_by_owner": {
                        "type": "boolean",
                        "description": "The owner already approved this draft",
                    },
                }),
                &[
                    "problem_id",
                    "problem_type",
                    "default_project",
                    "brainstorming_draft",
                ],
            ),
        ),
        tool(
            "approve-brainstorming-draft",
            "Approve the draft and start splitting the problem into tasks",
            object(json!({ "problem_id": problem_id() }), &["problem_id"]),
        ),
        tool(
            "continue-problem",
            "Resume a problem at its current step",
            object(json!({ "problem_id": problem_id() }), &["problem_id"]),
        ),
        tool(
            "continue-last-problem",
            "Resume the problem worked on most recently",
            object(json!({}), &[]),
        ),
        return_tool("return-to-analyze-step", "Go back to analysis"),
        return_tool("return-to-brainstorming-step", "Go back to task brainstorming"),
        return_tool("return-to-planning-step", "Go back to change planning"),
        return_tool("return-to-changes-step", "Go back to implementing changes"),
        tool(
            "add-or-modify-task",
            "Add a task or replace its description; the task needs approval again",
            object(
                json!({
                    "problem_id": problem_id(),
                    "task_number": task_number(),
                    "title": text("Short task title"),
                    "description": text("What the task delivers"),
                    "project_name": text("Project the task belongs to"),
                    "project_developer_id": text("Developer responsible for the task"),
                }),
                &[
                    "problem_id",
                    "task_number",
                    "title",
                    "description",
                    "project_name",
                ],
            ),
        ),
        tool(
            "delete-task",
            "Delete a task",
            object(
                json!({ "problem_id": problem_id(), "task_number": task_number() }),
                &["problem_id", "task_number"],
            ),
        ),
        tool(
            "approve-task",
            "Approve a task; planning starts once every task is approved",
            object(
                json!({ "problem_id": problem_id(), "task_number": task_number() }),
                &["problem_id", "task_number"],
            ),
        ),
        tool(
            "add-task-change",
            "Plan a file change for a task; the change needs approval again",
            object(
                json!({
                    "problem_id": problem_id(),
                    "task_number": task_number(),
                    "file_path": text("File path relative to the project root"),
                    "change_type": {
                        "type": "string",
                        "enum": ChangeType::NAMES,
                        "description": "Kind of change",
                    },
                    "goal": text("What the change achieves"),
                    "description": text("How the file changes"),
                    "change_context": {
                        "description": "Extra structured context for the change",
                    },
                }),
                &[
                    "problem_id",
                    "task_number",
                    "file_path",
                    "change_type",
                    "goal",
                    "description",
                ],
            ),
        ),
        tool(
            "remove-task-change",
            "Remove a planned file change",
            object(
                json!({
                    "problem_id": problem_id(),
                    "task_number": task_number(),
                    "file_path": text("File path relative to the project root"),
                }),
                &["problem_id", "task_number", "file_path"],
            ),
        ),
        tool(
            "get-task-changes",
            "Show a task and its planned changes as JSON",
            object(
                json!({ "problem_id": problem_id(), "task_number": task_number() }),
                &["problem_id", "task_number"],
            ),
        ),
        tool(
            "approve-task-changes",
            "Approve the changes of a task; implementation starts once every change is approved",
            object(
                json!({ "problem_id": problem_id(), "task_number": task_number() }),
                &["problem_id", "task_number"],
            ),
        ),
        tool(
            "get-next-change",
            "Show the next change to implement as JSON",
            object(json!({ "problem_id": problem_id() }), &["problem_id"]),
        ),
        tool(
            "make-change",
            "Apply a planned change to the project",
            object(
                json!({
                    "problem_id": problem_id(),
                    "task_number": task_number(),
                    "file_path": text("File path relative to the project root"),
                    "content": text("Full new file content; ignored for deletions"),
                }),
                &["problem_id", "task_number", "file_path"],
            ),
        ),
        tool(
            "list-problems",
            "List stored problems with their current step",
            object(json!({}), &[]),
        ),
    ]
}

/// Run one action and convert the outcome into a [`ToolResult`].
#[instrument(skip_all, fields(tool = name))]
pub fn call_tool(service: &ProblemService, name: &str, params: &Value) -> ToolResult {
    match run_tool(service, name, params) {
        Ok(texts) => {
            info!("tool call succeeded");
            ToolResult::success(texts)
        }
        Err(err) => {
            let problem_id = params
                .get("problem_id")
                .and_then(Value::as_str)
                .unwrap_or("-");
            error!(problem_id, error = %err, kind = err.kind(), "tool call failed");
            let mut texts = vec![format!("Error: {err}")];
            match service.instructions().error_instruction(&err.to_string()) {
                Ok(instruction) => texts.push(instruction),
                Err(render_err) => warn!(error = %render_err, "error instruction unavailable"),
            }
            ToolResult::error(texts)
        }
    }
}

fn run_tool(service: &ProblemService, name: &str, params: &Value) -> Result<Vec<String>> {
    let definition = catalogue()
        .into_iter()
        .find(|definition| definition.name == name)
        .ok_or_else(|| SolverError::InvalidArgument(format!("unknown tool: {name}")))?;
    let empty = json!({});
    let params = if params.is_null() { &empty } else { params };
    check_required(&definition.input_schema, params)?;
    validate_params(&definition.input_schema, params)?;
    dispatch(service, name, params)
}

/// Missing, null and blank string values all count as missing.
fn check_required(schema: &Value, params: &Value) -> Result<()> {
    let required = schema["required"].as_array().into_iter().flatten();
    for field in required.filter_map(Value::as_str) {
        let missing = match params.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(value)) => value.trim().is_empty(),
            Some(_) => false,
        };
        if missing {
            return Err(SolverError::InvalidArgument(format!(
                "Missing required parameter: {field}"
            )));
        }
    }
    Ok(())
}

fn validate_params(schema: &Value, params: &Value) -> Result<()> {
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| SolverError::InvalidArgument(format!("invalid tool schema: {err}")))?;
    let messages: Vec<String> = validator
        .iter_errors(params)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(SolverError::InvalidArgument(format!(
            "invalid parameters: {}",
            messages.join("; ")
        )));
    }
    Ok(())
}

fn dispatch(service: &ProblemService, name: &str, params: &Value) -> Result<Vec<String>> {
    let out = match name {
        "add-problem" => {
            let problem = service.create_problem(
                required_str(params, "original_problem")?,
                optional_str(params, "problem_id"),
            )?;
            service.handler(&problem)?.start_instructions(&problem)?
        }
        "save-brainstorming-draft" => save_brainstorming_draft(service, params)?,
        "approve-brainstorming-draft" => {
            let mut problem = load(service, params)?;
            AnalyzeHandler::new(service).approve_brainstorming_draft(&mut problem)?
        }
        "continue-problem" => {
            let mut problem = load(service, params)?;
            service.continue_problem(&mut problem)?
        }
        "continue-last-problem" => {
            let mut problem = service.last_problem()?;
            service.continue_problem(&mut problem)?
        }
        "return-to-analyze-step" => return_to(service, params, ProblemStep::Analyze)?,
        "return-to-brainstorming-step" => {
            return_to(service, params, ProblemStep::Brainstorming)?
        }
        "return-to-planning-step" => return_to(service, params, ProblemStep::Planning)?,
        "return-to-changes-step" => return_to(service, params, ProblemStep::Changes)?,
        "add-or-modify-task" => {
            let mut problem = load(service, params)?;
            let draft = TaskDraft {
                title: required_str(params, "title")?.to_string(),
                description: required_str(params, "description")?.to_string(),
                project_name: required_str(params, "project_name")?.to_string(),
                project_developer_id: optional_str(params, "project_developer_id")
                    .unwrap_or_default()
                    .to_string(),
            };
            BrainstormingHandler::new(service).add_or_modify_task(
                &mut problem,
                parse_task_number(params)?,
                draft,
            )?
        }
        "delete-task" => {
            let mut problem = load(service, params)?;
            BrainstormingHandler::new(service)
                .delete_task(&mut problem, parse_task_number(params)?)?
        }
        "approve-task" => {
            let mut problem = load(service, params)?;
            BrainstormingHandler::new(service)
                .approve_task(&mut problem, parse_task_number(params)?)?
        }
        "add-task-change" => {
            let mut problem = load(service, params)?;
            let draft = ChangeDraft {
                change_type: required_str(params, "change_type")?.to_string(),
                goal: required_str(params, "goal")?.to_string(),
                description: required_str(params, "description")?.to_string(),
                context: params.get("change_context").cloned().unwrap_or(Value::Null),
            };
            PlanHandler::new(service).add_or_modify_task_change(
                &mut problem,
                parse_task_number(params)?,
                required_str(params, "file_path")?,
                draft,
            )?
        }
        "remove-task-change" => {
            let mut problem = load(service, params)?;
            PlanHandler::new(service).remove_task_change(
                &mut problem,
                parse_task_number(params)?,
                required_str(params, "file_path")?,
            )?
        }
        "get-task-changes" => {
            let problem = load(service, params)?;
            let overview = PlanHandler::new(service)
                .task_changes_overview(&problem, parse_task_number(params)?)?;
            return Ok(vec![to_json(&overview)?]);
        }
        "approve-task-changes" => {
            let mut problem = load(service, params)?;
            PlanHandler::new(service)
                .approve_task_changes(&mut problem, parse_task_number(params)?)?
        }
        "get-next-change" => {
            let problem = load(service, params)?;
            let text = match ChangesHandler::new(service).next_change(&problem) {
                Some(next) => to_json(&next)?,
                None => NO_CHANGES_LEFT.to_string(),
            };
            return Ok(vec![text]);
        }
        "make-change" => {
            let mut problem = load(service, params)?;
            ChangesHandler::new(service).make_change(
                &mut problem,
                parse_task_number(params)?,
                required_str(params, "file_path")?,
                params.get("content").and_then(Value::as_str),
            )?
        }
        "list-problems" => return Ok(vec![list_problems(service)?]),
        other => {
            return Err(SolverError::InvalidArgument(format!(
                "unknown tool: {other}"
            )));
        }
    };
    Ok(out.into_inner())
}

fn save_brainstorming_draft(
    service: &ProblemService,
    params: &Value,
) -> Result<ProblemActionInstructions> {
    let mut problem = load(service, params)?;
    let problem_type = required_str(params, "problem_type")?
        .parse::<ProblemType>()
        .map_err(SolverError::InvalidArgument)?;
    let context = match params.get("brainstorming_context") {
        None | Some(Value::Null) => None,
        Some(raw) => Some(
            serde_json::from_value::<ProblemContext>(raw.clone()).map_err(|err| {
                SolverError::InvalidArgument(format!("invalid brainstorming_context: {err}"))
            })?,
        ),
    };
    let handler = AnalyzeHandler::new(service);
    let saved = handler.save_brainstorming_draft(
        &mut problem,
        problem_type,
        required_str(params, "default_project")?,
        required_str(params, "brainstorming_draft")?,
        context,
    )?;
    let approved = params
        .get("approved_by_owner")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if approved {
        return handler.approve_brainstorming_draft(&mut problem);
    }
    Ok(saved)
}

/// Restore to `step` and return that step's continue instructions.
fn return_to(
    service: &ProblemService,
    params: &Value,
    step: ProblemStep,
) -> Result<ProblemActionInstructions> {
    let mut problem = match optional_str(params, "problem_id") {
        Some(id) => service.get_problem(id)?,
        None => service.last_problem()?,
    };
    service.restore_to_step(&mut problem, step, required_str(params, "return_reason")?)?;
    service.handler(&problem)?.continue_instructions(&problem)
}

fn list_problems(service: &ProblemService) -> Result<String> {
    let rows: Vec<Value> = service
        .list_problems()?
        .iter()
        .map(|problem| {
            json!({
                "id": problem.id(),
                "currentStep": problem.current_step(),
                "originalProblem": problem.original_problem(),
            })
        })
        .collect();
    to_json(&rows)
}

fn load(service: &ProblemService, params: &Value) -> Result<Problem> {
    service.get_problem(required_str(params, "problem_id")?)
}

fn required_str<'a>(params: &'a Value, field: &str) -> Result<&'a str> {
    optional_str(params, field).ok_or_else(|| {
        SolverError::InvalidArgument(format!("Missing required parameter: {field}"))
    })
}

/// A non-blank string parameter, if present.
fn optional_str<'a>(params: &'a Value, field: &str) -> Option<&'a str> {
    params
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
}

fn parse_task_number(params: &Value) -> Result<u32> {
    let raw = &params["task_number"];
    let number = match raw {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    number
        .filter(|number| *number >= 1)
        .and_then(|number| u32::try_from(number).ok())
        .ok_or_else(|| {
            SolverError::InvalidArgument(format!(
                "task_number must be a positive integer, got {raw}"
            ))
        })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| SolverError::store("encode tool output", err))
}
