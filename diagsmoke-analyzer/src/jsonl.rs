//! JSON-lines backend for analyzers that emit one JSON object per diagnostic.
//!
//! Each non-empty stdout line must be an object:
//!
//! ```json
//! {"rule": "modernize-use-nullptr", "severity": "warning", "file": "a.cpp", "line": 67, "column": 14, "message": "use nullptr"}
//! ```
//!
//! `column` defaults to 1 and `message` to an empty string. The sample's
//! checks filter and language reach the analyzer through the
//! `DIAGSMOKE_CHECKS` and `DIAGSMOKE_LANGUAGE` environment variables.

use std::path::PathBuf;

use diagsmoke_registry::Sample;
use serde::Deserialize;

use crate::backend::{AnalyzerBackend, AnalyzerConfig, InvocationError};
use crate::diagnostic::{ActualDiagnostic, Finding, Severity};
use crate::process::run_process;

pub const CHECKS_ENV: &str = "DIAGSMOKE_CHECKS";
pub const LANGUAGE_ENV: &str = "DIAGSMOKE_LANGUAGE";

#[derive(Debug, Deserialize)]
struct JsonRecord {
    rule: String,
    severity: Severity,
    file: PathBuf,
    line: u32,
    #[serde(default = "default_column")]
    column: u32,
    #[serde(default)]
    message: String,
}

fn default_column() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLinesBackend;

impl JsonLinesBackend {
    pub fn build_args(sample: &Sample, config: &AnalyzerConfig, file_arg: &str) -> Vec<String> {
        let mut args = config.command.args.clone();
        args.extend(config.analyzer_args.iter().cloned());
        args.extend(sample.args.iter().cloned());
        args.push(file_arg.to_string());
        args
    }
}

impl AnalyzerBackend for JsonLinesBackend {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn analyze(
        &self,
        sample: &Sample,
        config: &AnalyzerConfig,
    ) -> Result<Vec<Finding>, InvocationError> {
        let file_arg = sample.source.to_string_lossy();
        let args = Self::build_args(sample, config, &file_arg);
        let envs = [
            (CHECKS_ENV, sample.checks.clone().unwrap_or_default()),
            (LANGUAGE_ENV, sample.language.clone()),
        ];

        let output = run_process(&config.command.program, &args, &envs).await?;
        output.check_status(&config.accepted_exit_codes)?;

        Ok(parse_jsonl_output(&output.stdout))
    }
}

/// Parse JSON-lines output. Lines that are not valid records become
/// `Finding::Unparsed`, keeping a `line` field when one is readable.
pub fn parse_jsonl_output(stdout: &str) -> Vec<Finding> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_record)
        .collect()
}

fn parse_record(line: &str) -> Finding {
    match serde_json::from_str::<JsonRecord>(line) {
        Ok(record) if record.line > 0 && !record.rule.trim().is_empty() => {
            Finding::Diagnostic(ActualDiagnostic {
                rule: record.rule,
                severity: record.severity,
                file: record.file,
                line: record.line,
                column: record.column.max(1),
                message: record.message,
            })
        }
        _ => Finding::Unparsed {
            raw: line.to_string(),
            line: salvage_line(line),
        },
    }
}

fn salvage_line(line: &str) -> Option<u32> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value
        .get("line")?
        .as_u64()
        .and_then(|l| u32::try_from(l).ok())
        .filter(|l| *l > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::AnalyzerCommand;
    use diagsmoke_registry::ExpectedDiagnostic;

    #[test]
    fn test_parse_valid_records() {
        let stdout = r#"
{"rule":"modernize-use-nullptr","severity":"warning","file":"a.cpp","line":67,"column":14,"message":"use nullptr"}

{"rule":"clang-diagnostic-unused-variable","severity":"warning","file":"/abs/a.cpp","line":107}
"#;
        let findings = parse_jsonl_output(stdout);

        assert_eq!(findings.len(), 2);
        let first = findings[0].as_diagnostic().unwrap();
        assert_eq!(first.file, PathBuf::from("a.cpp"));
        assert_eq!(first.column, 14);

        let second = findings[1].as_diagnostic().unwrap();
        assert_eq!(second.file, PathBuf::from("/abs/a.cpp"));
        assert_eq!(second.column, 1);
        assert_eq!(second.message, "");
    }

    #[test]
    fn test_parse_bad_lines_become_unparsed() {
        let stdout = "not json\n{\"rule\":\"r\",\"severity\":\"bogus\",\"file\":\"a.cpp\",\"line\":9}\n{\"rule\":\"\",\"severity\":\"warning\",\"file\":\"a.cpp\",\"line\":4}\n";
        let findings = parse_jsonl_output(stdout);

        assert_eq!(findings.len(), 3);
        assert!(findings.iter().all(Finding::is_unparsed));
        assert_eq!(findings[0].line(), None);
        assert_eq!(findings[1].line(), Some(9));
        assert_eq!(findings[2].line(), Some(4));
    }

    #[test]
    fn test_build_args_puts_file_last() {
        let sample = Sample::new("s", "/src/a.cpp", vec![ExpectedDiagnostic::at_line("r", 1)]).with_args(&["--strict"]);
        let mut config = AnalyzerConfig::new(AnalyzerCommand::parse("lint --json").unwrap());
        config.analyzer_args = vec!["-q".to_string()];

        assert_eq!(
            JsonLinesBackend::build_args(&sample, &config, "a.cpp"),
            vec!["--json", "-q", "--strict", "a.cpp"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_analyze_passes_checks_through_env() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.cpp");
        std::fs::write(&source, "int main() {}\n").unwrap();

        let script = r#"printf '{"rule":"%s","severity":"warning","file":"%s","line":1}\n' "$DIAGSMOKE_CHECKS" "$1""#;
        let sample = Sample::new("s", &source, vec![ExpectedDiagnostic::at_line("r", 1)]).with_checks("my-check");
        let config = AnalyzerConfig::new(AnalyzerCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        });

        let findings = JsonLinesBackend.analyze(&sample, &config).await.unwrap();

        assert_eq!(findings.len(), 1);
        let diag = findings[0].as_diagnostic().unwrap();
        assert_eq!(diag.rule, "my-check");
        assert_eq!(diag.file, source);
    }
}
