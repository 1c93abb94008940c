//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `run` - Analyze every sample and report verdicts
//! - `list` - Print the samples in a manifest
//! - `check` - Validate a manifest

pub mod check;
pub mod list;
pub mod run;

pub use check::execute_check;
pub use list::execute_list;
pub use run::{execute_run, RunResult};

use std::path::Path;

use diagsmoke_fs::Filesystem;
use diagsmoke_registry::{LoadError, Registry};
use thiserror::Error;

use crate::cli::CliError;
use crate::io::ReportWriteError;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("report error: {0}")]
    ReportWrite(#[from] ReportWriteError),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Load a manifest and apply `--only` filters.
pub(crate) fn load_registry<F: Filesystem>(
    fs: &F,
    manifest: &Path,
    only: &[String],
) -> Result<Registry, LoadError> {
    let registry = diagsmoke_registry::load(fs, manifest)?;
    diagsmoke_registry::select(registry, only)
}
