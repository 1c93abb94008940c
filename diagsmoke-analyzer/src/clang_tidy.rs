//! clang-tidy backend.

use std::path::PathBuf;
use std::sync::OnceLock;

use diagsmoke_registry::Sample;
use regex::Regex;

use crate::backend::{AnalyzerBackend, AnalyzerConfig, InvocationError};
use crate::diagnostic::{ActualDiagnostic, Finding, Severity};
use crate::process::run_process;

/// Full diagnostic line: `file:line:col: severity: message [check]`.
const DIAGNOSTIC_PATTERN: &str = r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): (?P<severity>warning|error|note|fatal error): (?P<message>.*?)(?: \[(?P<checks>[^\[\]]+)\])?$";

/// Anything that starts with a source location.
const LOCATION_PATTERN: &str = r"^(?P<file>[^\s:][^:]*):(?P<line>\d+):(?:\d+:)?";

fn diagnostic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DIAGNOSTIC_PATTERN).expect("valid regex pattern"))
}

fn location_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(LOCATION_PATTERN).expect("valid regex pattern"))
}

/// Runs `clang-tidy` and parses its console output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClangTidyBackend;

impl ClangTidyBackend {
    /// Arguments passed to clang-tidy for `sample`, given the file argument.
    pub fn build_args(sample: &Sample, config: &AnalyzerConfig, file_arg: &str) -> Vec<String> {
        let mut args = config.command.args.clone();
        args.push(file_arg.to_string());
        args.push("--quiet".to_string());
        args.push("-extra-arg=-fno-color-diagnostics".to_string());
        if let Some(checks) = &sample.checks {
            args.push(format!("-checks={}", checks));
        }
        args.extend(config.analyzer_args.iter().cloned());
        args.extend(sample.args.iter().cloned());
        args
    }
}

impl AnalyzerBackend for ClangTidyBackend {
    fn name(&self) -> &'static str {
        "clang-tidy"
    }

    async fn analyze(
        &self,
        sample: &Sample,
        config: &AnalyzerConfig,
    ) -> Result<Vec<Finding>, InvocationError> {
        let file_arg = sample.source.to_string_lossy();
        let args = Self::build_args(sample, config, &file_arg);

        let output = run_process(&config.command.program, &args, &[]).await?;
        output.check_status(&config.accepted_exit_codes)?;

        Ok(parse_clang_tidy_output(&output.combined()))
    }
}

/// Parse clang-tidy console output.
///
/// File paths are kept as reported. Source excerpts, caret lines and
/// summaries are skipped. A line with a readable location
/// that does not fit the diagnostic grammar becomes `Finding::Unparsed`.
pub fn parse_clang_tidy_output(output: &str) -> Vec<Finding> {
    output
        .lines()
        .filter_map(|line| parse_line(line.trim_end()))
        .collect()
}

fn parse_line(line: &str) -> Option<Finding> {
    if let Some(caps) = diagnostic_regex().captures(line) {
        let parsed_line = caps["line"].parse::<u32>().ok().filter(|l| *l > 0);
        let column = caps["col"].parse::<u32>().ok();
        let severity = caps["severity"].parse::<Severity>().ok();

        if let (Some(line_no), Some(column), Some(severity)) = (parsed_line, column, severity) {
            let rule = caps
                .name("checks")
                .and_then(|m| primary_check(m.as_str()))
                .unwrap_or_else(|| fallback_rule(severity).to_string());

            return Some(Finding::Diagnostic(ActualDiagnostic {
                rule,
                severity,
                file: PathBuf::from(&caps["file"]),
                line: line_no,
                column: column.max(1),
                message: caps["message"].to_string(),
            }));
        }
    }

    let caps = location_regex().captures(line)?;
    Some(Finding::Unparsed {
        raw: line.to_string(),
        line: caps["line"].parse::<u32>().ok().filter(|l| *l > 0),
    })
}

/// First check name in a `[a,b,-warnings-as-errors]` list.
fn primary_check(checks: &str) -> Option<String> {
    checks
        .split(',')
        .map(str::trim)
        .find(|c| !c.is_empty() && !c.starts_with('-'))
        .map(str::to_string)
}

fn fallback_rule(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "clang-diagnostic-error",
        Severity::Warning | Severity::Note => "clang-diagnostic-unknown",
    }
}
