//! Exit codes for the diagsmoke CLI.

use diagsmoke_registry::LoadError;
use diagsmoke_report::RunOutcome;

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Every sample passed.
    pub const SUCCESS: i32 = 0;
    /// At least one expected diagnostic is missing or mismatched.
    pub const MISSING: i32 = 1;
    /// Only unexpected extra diagnostics.
    pub const UNEXPECTED: i32 = 2;
    /// An analyzer invocation failed or timed out.
    pub const INVOCATION_FAILURE: i32 = 3;
    /// The manifest could not be loaded.
    pub const LOAD_ERROR: i32 = 4;
    /// The report file could not be written.
    pub const REPORT_WRITE_ERROR: i32 = 5;
    /// Invalid arguments (EX_USAGE).
    pub const INVALID_ARGS: i32 = 64;
    /// Interrupted by signal (128 + signal number).
    pub const SIGINT: i32 = 130;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Load(LoadError::InvalidFilter(_)) => codes::INVALID_ARGS,
        CommandError::Load(_) => codes::LOAD_ERROR,
        CommandError::ReportWrite(_) => codes::REPORT_WRITE_ERROR,
        CommandError::Output(_) => codes::REPORT_WRITE_ERROR,
    }
}

/// Exit code for a finished run.
///
/// With `coarse`, every failing outcome maps to 1.
pub fn outcome_code(outcome: RunOutcome, coarse: bool) -> i32 {
    let code = match outcome {
        RunOutcome::Pass => codes::SUCCESS,
        RunOutcome::Regression => codes::MISSING,
        RunOutcome::FixtureDrift => codes::UNEXPECTED,
        RunOutcome::InvocationFailure => codes::INVOCATION_FAILURE,
    };
    if coarse && code != codes::SUCCESS {
        codes::MISSING
    } else {
        code
    }
}
