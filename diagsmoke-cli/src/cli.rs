//! CLI argument parsing for diagsmoke.
//!
//! Provides the `run`, `list` and `check` subcommands.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use diagsmoke_analyzer::{AnalyzerCommand, BackendKind};
use thiserror::Error;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("analyzer command must not be empty")]
    EmptyAnalyzer,

    #[error("timeout must be at least 1 second, got {0}")]
    InvalidTimeout(u64),

    #[error("sample-timeout must be at least 1 second, got {0}")]
    InvalidSampleTimeout(u64),

    #[error("jobs must be at least 1, got {0}")]
    InvalidJobs(usize),
}

/// diagsmoke - check that a static analyzer still reports the diagnostics
/// each labeled code sample was written to trigger.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "diagsmoke")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the analyzer over every sample and report verdicts.
    Run(RunArgs),
    /// List the samples in a manifest.
    List(ListArgs),
    /// Validate a manifest without running the analyzer.
    Check(CheckArgs),
}

/// Analyzer output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    /// clang-tidy console output.
    ClangTidy,
    /// One JSON object per diagnostic line.
    Jsonl,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::ClangTidy => BackendKind::ClangTidy,
            BackendArg::Jsonl => BackendKind::JsonLines,
        }
    }
}

/// Report format written to stdout.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the run command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Sample manifest (JSON).
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Analyzer command, e.g. "clang-tidy" or "clang-tidy-17 -p build".
    #[arg(short, long)]
    pub analyzer: String,

    /// How to invoke the analyzer and parse its output.
    #[arg(long, value_enum, default_value_t = BackendArg::ClangTidy)]
    pub backend: BackendArg,

    /// Overall run timeout in seconds. Unfinished samples become Timeout.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Timeout for a single analyzer invocation in seconds.
    #[arg(long)]
    pub sample_timeout: Option<u64>,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Lines of drift still accepted as a match (overrides the manifest).
    #[arg(long)]
    pub tolerance: Option<u32>,

    /// Also write the JSON report to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Concurrent analyzer invocations (default: available parallelism).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Only run samples whose id matches this glob (repeatable).
    #[arg(long = "only", value_name = "GLOB")]
    pub only: Vec<String>,

    /// Match `note` diagnostics too.
    #[arg(long)]
    pub include_notes: bool,

    /// Exit 1 for every failure kind instead of distinct codes.
    #[arg(long)]
    pub coarse_exit: bool,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl RunArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.analyzer.trim().is_empty() {
            return Err(CliError::EmptyAnalyzer);
        }
        if self.timeout == Some(0) {
            return Err(CliError::InvalidTimeout(0));
        }
        if self.sample_timeout == Some(0) {
            return Err(CliError::InvalidSampleTimeout(0));
        }
        if self.jobs == Some(0) {
            return Err(CliError::InvalidJobs(0));
        }
        Ok(())
    }

    /// The analyzer program and its leading arguments.
    pub fn analyzer_command(&self) -> Result<AnalyzerCommand, CliError> {
        AnalyzerCommand::parse(&self.analyzer).ok_or(CliError::EmptyAnalyzer)
    }

    pub fn run_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn per_sample_timeout(&self) -> Option<Duration> {
        self.sample_timeout.map(Duration::from_secs)
    }

    /// Worker count: `--jobs` or the machine's available parallelism.
    pub fn worker_count(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Arguments for the list command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// Sample manifest (JSON).
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Only list samples whose id matches this glob (repeatable).
    #[arg(long = "only", value_name = "GLOB")]
    pub only: Vec<String>,
}

/// Arguments for the check command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct CheckArgs {
    /// Sample manifest (JSON).
    #[arg(short, long)]
    pub manifest: PathBuf,
}

/// Parse CLI arguments from an iterator of strings.
/// Useful for testing.
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["diagsmoke", "run", "--manifest", "m.json", "--analyzer", "clang-tidy"];
        argv.extend_from_slice(extra);
        match parse_from(argv).expect("parse").command {
            Command::Run(args) => args,
            other => panic!("expected run, got {:?}", other),
        }
    }

    // ===========================================
    // Category A: run arguments
    // ===========================================

    #[test]
    fn test_run_requires_manifest_and_analyzer() {
        let err = parse_from(["diagsmoke", "run", "--analyzer", "clang-tidy"]).unwrap_err();
        assert!(err.to_string().contains("--manifest"));

        let err = parse_from(["diagsmoke", "run", "--manifest", "m.json"]).unwrap_err();
        assert!(err.to_string().contains("--analyzer"));
    }

    #[test]
    fn test_run_defaults() {
        let args = run_args(&[]);

        assert_eq!(args.manifest, PathBuf::from("m.json"));
        assert_eq!(args.backend, BackendArg::ClangTidy);
        assert_eq!(args.format, OutputFormat::Text);
        assert_eq!(args.timeout, None);
        assert_eq!(args.tolerance, None);
        assert!(args.only.is_empty());
        assert!(!args.include_notes);
        assert!(!args.coarse_exit);
        assert_eq!(args.verbose, 0);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_run_all_args() {
        let args = run_args(&[
            "--backend",
            "jsonl",
            "--timeout",
            "60",
            "--sample-timeout",
            "10",
            "--format",
            "json",
            "--tolerance",
            "2",
            "--report",
            "out/report.json",
            "--jobs",
            "3",
            "--only",
            "bugprone-*",
            "--only",
            "cert-*",
            "--include-notes",
            "--coarse-exit",
            "-vv",
        ]);

        assert_eq!(args.backend, BackendArg::Jsonl);
        assert_eq!(args.run_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(args.per_sample_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.tolerance, Some(2));
        assert_eq!(args.report, Some(PathBuf::from("out/report.json")));
        assert_eq!(args.worker_count(), 3);
        assert_eq!(args.only, vec!["bugprone-*", "cert-*"]);
        assert!(args.include_notes);
        assert!(args.coarse_exit);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_run_rejects_unknown_backend() {
        let result = parse_from([
            "diagsmoke",
            "run",
            "--manifest",
            "m.json",
            "--analyzer",
            "x",
            "--backend",
            "cppcheck",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_backend_arg_maps_to_kind() {
        assert_eq!(BackendKind::from(BackendArg::ClangTidy), BackendKind::ClangTidy);
        assert_eq!(BackendKind::from(BackendArg::Jsonl), BackendKind::JsonLines);
    }

    // ===========================================
    // Category B: validation
    // ===========================================

    #[test]
    fn test_validate_zero_values() {
        assert_eq!(run_args(&["--timeout", "0"]).validate(), Err(CliError::InvalidTimeout(0)));
        assert_eq!(
            run_args(&["--sample-timeout", "0"]).validate(),
            Err(CliError::InvalidSampleTimeout(0))
        );
        assert_eq!(run_args(&["--jobs", "0"]).validate(), Err(CliError::InvalidJobs(0)));
    }

    #[test]
    fn test_validate_blank_analyzer() {
        let mut args = run_args(&[]);
        args.analyzer = "   ".to_string();
        assert_eq!(args.validate(), Err(CliError::EmptyAnalyzer));
        assert_eq!(args.analyzer_command(), Err(CliError::EmptyAnalyzer));
    }

    #[test]
    fn test_analyzer_command_split() {
        let mut args = run_args(&[]);
        args.analyzer = "clang-tidy-17 -p 'build dir'".to_string();

        let command = args.analyzer_command().unwrap();
        assert_eq!(command.program, "clang-tidy-17");
        assert_eq!(command.args, vec!["-p", "build dir"]);
    }

    #[test]
    fn test_worker_count_defaults_to_parallelism() {
        assert!(run_args(&[]).worker_count() >= 1);
    }

    // ===========================================
    // Category C: list and check
    // ===========================================

    #[test]
    fn test_list_args() {
        let cli = parse_from(["diagsmoke", "list", "-m", "m.json", "--only", "cert-*"]).unwrap();
        assert_eq!(
            cli.command,
            Command::List(ListArgs {
                manifest: PathBuf::from("m.json"),
                only: vec!["cert-*".to_string()],
            })
        );
    }

    #[test]
    fn test_check_args() {
        let cli = parse_from(["diagsmoke", "check", "--manifest", "m.json"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Check(CheckArgs {
                manifest: PathBuf::from("m.json"),
            })
        );
    }
}
