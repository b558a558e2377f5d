//! Deterministic, pure logic for the problem workflow.
//!
//! Core modules are free of I/O. They operate on in-memory problem state and
//! return deterministic outputs suitable for tests.

pub mod approval;
pub mod context;
pub mod placeholder;
pub mod problem;
pub mod step;
pub mod types;
