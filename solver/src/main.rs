//! `problem-solver`: drive the problem workflow from the command line.
//!
//! Each `call` runs exactly one tool action against the stored problems and
//! prints the tool result as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use problem_solver::exit_codes;
use problem_solver::io::config::load_config;
use problem_solver::io::init::{InitOptions, SolverPaths, init_solver};
use problem_solver::logging;
use problem_solver::service::ProblemService;
use problem_solver::tools::{call_tool, catalogue};

#[derive(Debug, Parser)]
#[command(
    name = "problem-solver",
    version,
    about = "Step-by-step problem solving workflow for coding agents"
)]
struct Cli {
    /// Workspace root; storage and project paths are resolved against it.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file (default: `<root>/.problems/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the storage directory and a default config.
    Init {
        /// Overwrite an existing config with defaults.
        #[arg(short, long)]
        force: bool,
    },
    /// Print the tool catalogue as JSON.
    Tools,
    /// Run one tool action and print its result.
    Call {
        /// Tool name, e.g. `add-problem`.
        tool: String,
        /// Parameters as a JSON object.
        #[arg(long, conflicts_with = "params_file")]
        params: Option<String>,
        /// Read the parameters from a JSON file.
        #[arg(long)]
        params_file: Option<PathBuf>,
    },
    /// List stored problems with their current step.
    List,
    /// Print a stored problem as JSON.
    Show { id: String },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            std::process::exit(code);
        }
    };
    logging::init();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| SolverPaths::default_config_path(&cli.root));
    match cli.command {
        Command::Init { force } => {
            let (paths, _) = init_solver(&cli.root, &config_path, &InitOptions { force })?;
            println!("initialized {}", paths.storage_dir.display());
            Ok(exit_codes::OK)
        }
        Command::Tools => {
            print_json(&catalogue())?;
            Ok(exit_codes::OK)
        }
        Command::Call {
            tool,
            params,
            params_file,
        } => {
            let service = open_service(&cli.root, config_path)?;
            let params = read_params(params.as_deref(), params_file.as_deref())?;
            let result = call_tool(&service, &tool, &params);
            print_json(&result)?;
            Ok(if result.is_error {
                exit_codes::TOOL_ERROR
            } else {
                exit_codes::OK
            })
        }
        Command::List => {
            let service = open_service(&cli.root, config_path)?;
            for problem in service.list_problems()? {
                println!("{}\t{}", problem.id(), problem.current_step());
            }
            Ok(exit_codes::OK)
        }
        Command::Show { id } => {
            let service = open_service(&cli.root, config_path)?;
            print_json(&service.get_problem(&id)?)?;
            Ok(exit_codes::OK)
        }
    }
}

fn open_service(root: &Path, config_path: PathBuf) -> Result<ProblemService> {
    let config = load_config(&config_path)?;
    let paths = SolverPaths::new(root, config_path, &config);
    Ok(ProblemService::from_config(&paths, &config))
}

/// Parameters from `--params` or `--params-file`; an empty object otherwise.
fn read_params(inline: Option<&str>, file: Option<&Path>) -> Result<Value> {
    let raw = match (inline, file) {
        (Some(inline), _) => inline.to_string(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
        }
        (None, None) => return Ok(Value::Object(Default::default())),
    };
    serde_json::from_str(&raw).context("parse tool parameters as JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{payload}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["problem-solver", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
        assert_eq!(cli.root, PathBuf::from("."));
    }

    #[test]
    fn parse_init_force_with_root() {
        let cli = Cli::parse_from(["problem-solver", "--root", "/work", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
        assert_eq!(cli.root, PathBuf::from("/work"));
    }

    #[test]
    fn parse_call_with_inline_params() {
        let cli = Cli::parse_from([
            "problem-solver",
            "call",
            "continue-problem",
            "--params",
            r#"{"problem_id":"P1"}"#,
        ]);
        match cli.command {
            Command::Call { tool, params, .. } => {
                assert_eq!(tool, "continue-problem");
                assert_eq!(params.as_deref(), Some(r#"{"problem_id":"P1"}"#));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn params_and_params_file_conflict() {
        let err = Cli::try_parse_from([
            "problem-solver",
            "call",
            "list-problems",
            "--params",
            "{}",
            "--params-file",
            "p.json",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn missing_params_default_to_empty_object() {
        assert_eq!(read_params(None, None).expect("params"), serde_json::json!({}));
        assert!(read_params(Some("not json"), None).is_err());
    }
}
