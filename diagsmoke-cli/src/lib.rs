//! diagsmoke CLI.
//!
//! Argument parsing, logging, shutdown handling, the concurrent runner and
//! command orchestration for the `diagsmoke` binary.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod io;
pub mod logger;
pub mod runner;
pub mod signal;

pub use cli::{parse_from, BackendArg, CheckArgs, Cli, CliError, Command, ListArgs, OutputFormat, RunArgs};
pub use commands::{execute_check, execute_list, execute_run, CommandError, CommandResult, RunResult};
pub use logger::{Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
pub use runner::{run_samples, RunOutput, RunnerConfig};
pub use signal::ShutdownFlag;
