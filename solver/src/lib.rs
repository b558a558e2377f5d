//! Step-by-step problem solving workflow for coding agents.
//!
//! A problem moves through `new → analyze → brainstorming → planning →
//! changes → completed`. Each tool action checks the step, mutates the
//! problem, persists it and answers with the next instructions for the agent.
//!
//! - **[`core`]**: The problem model, step machine rules and approval gates.
//!   No I/O.
//! - **[`io`]**: Problem snapshots, documents, instruction templates, project
//!   files and configuration on disk.
//!
//! Orchestration lives in [`service`] (lifecycle and transitions),
//! [`handlers`] (per-step operations) and [`tools`] (the named actions the
//! CLI exposes).

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod handlers;
pub mod instructions;
pub mod io;
pub mod logging;
pub mod service;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tools;
