//! Stable exit codes for `problem-solver` commands.

/// Command succeeded; for `call`, the action succeeded.
pub const OK: i32 = 0;
/// Invalid invocation, configuration or storage failure.
pub const INVALID: i32 = 1;
/// `call` ran the action and it returned an error result.
pub const TOOL_ERROR: i32 = 2;
