//! Analyzer backend abstraction.
//!
//! Each supported tool implements `AnalyzerBackend`. The tool is picked at
//! configuration time through `BackendKind` / `AnyBackend`.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use diagsmoke_registry::{RegistrySettings, Sample};
use thiserror::Error;

use crate::clang_tidy::ClangTidyBackend;
use crate::command::AnalyzerCommand;
use crate::diagnostic::Finding;
use crate::jsonl::JsonLinesBackend;

/// Errors from running the analyzer on one sample.
///
/// These never abort a run: the runner turns them into per-sample verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    #[error("failed to start analyzer '{program}': {message}")]
    Spawn { program: String, message: String },

    #[error("analyzer exited with unexpected status {code}: {stderr}")]
    UnexpectedStatus { code: i32, stderr: String },

    #[error("analyzer was terminated by a signal: {stderr}")]
    Terminated { stderr: String },

    #[error("analyzer timed out after {}s", .after.as_secs_f64())]
    TimedOut { after: Duration },

    #[error("failed to read analyzer output: {0}")]
    Io(String),
}

impl InvocationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InvocationError::TimedOut { .. })
    }
}

/// Configuration shared by every invocation in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub command: AnalyzerCommand,
    /// Arguments added to every invocation, after the backend's own flags.
    pub analyzer_args: Vec<String>,
    /// Exit codes that mean "ran and reported diagnostics".
    pub accepted_exit_codes: Vec<i32>,
    /// Keep `note` findings for matching.
    pub include_notes: bool,
    /// Limit for a single invocation.
    pub sample_timeout: Option<Duration>,
}

impl AnalyzerConfig {
    pub fn new(command: AnalyzerCommand) -> Self {
        Self::from_settings(command, &RegistrySettings::default())
    }

    /// Build a config from the manifest's run settings.
    pub fn from_settings(command: AnalyzerCommand, settings: &RegistrySettings) -> Self {
        Self {
            command,
            analyzer_args: settings.analyzer_args.clone(),
            accepted_exit_codes: settings.accepted_exit_codes.clone(),
            include_notes: settings.include_notes,
            sample_timeout: None,
        }
    }

    pub fn with_include_notes(mut self, include_notes: bool) -> Self {
        self.include_notes = include_notes;
        self
    }

    pub fn with_sample_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sample_timeout = timeout;
        self
    }

    pub fn with_accepted_exit_codes(mut self, codes: Vec<i32>) -> Self {
        self.accepted_exit_codes = codes;
        self
    }
}

/// A static analyzer the harness can run on a sample.
pub trait AnalyzerBackend: Send + Sync {
    /// Short backend name used in reports.
    fn name(&self) -> &'static str;

    /// Run the analyzer on `sample` and return its findings in output order.
    fn analyze(
        &self,
        sample: &Sample,
        config: &AnalyzerConfig,
    ) -> impl Future<Output = Result<Vec<Finding>, InvocationError>> + Send;
}

/// Supported analyzer backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    ClangTidy,
    JsonLines,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::ClangTidy => "clang-tidy",
            BackendKind::JsonLines => "jsonl",
        }
    }

    pub fn create(self) -> AnyBackend {
        match self {
            BackendKind::ClangTidy => AnyBackend::ClangTidy(ClangTidyBackend),
            BackendKind::JsonLines => AnyBackend::JsonLines(JsonLinesBackend),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clang-tidy" => Ok(BackendKind::ClangTidy),
            "jsonl" => Ok(BackendKind::JsonLines),
            other => Err(format!("unknown analyzer backend '{}'", other)),
        }
    }
}

/// Backend selected at configuration time.
#[derive(Debug, Clone)]
pub enum AnyBackend {
    ClangTidy(ClangTidyBackend),
    JsonLines(JsonLinesBackend),
}

impl AnalyzerBackend for AnyBackend {
    fn name(&self) -> &'static str {
        match self {
            AnyBackend::ClangTidy(b) => b.name(),
            AnyBackend::JsonLines(b) => b.name(),
        }
    }

    async fn analyze(
        &self,
        sample: &Sample,
        config: &AnalyzerConfig,
    ) -> Result<Vec<Finding>, InvocationError> {
        match self {
            AnyBackend::ClangTidy(b) => b.analyze(sample, config).await,
            AnyBackend::JsonLines(b) => b.analyze(sample, config).await,
        }
    }
}
