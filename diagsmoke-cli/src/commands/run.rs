//! Run command orchestration.
//!
//! Loads the manifest, runs the analyzer over every selected sample, prints
//! the report and optionally writes it to a file.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use diagsmoke_analyzer::{AnalyzerBackend, AnalyzerCommand, AnalyzerConfig};
use diagsmoke_fs::Filesystem;
use diagsmoke_registry::RegistrySettings;
use diagsmoke_report::{render_json, render_text, MatchOptions, RunReport};

use crate::cli::{OutputFormat, RunArgs};
use crate::exit::{codes, outcome_code};
use crate::io::{ReportWriteError, ReportWriter};
use crate::logger::Logger;
use crate::runner::{run_samples, RunnerConfig};
use crate::signal::ShutdownFlag;

use super::{load_registry, CommandResult};

/// Result of run command execution.
#[derive(Debug)]
pub struct RunResult {
    pub report: RunReport,
    /// Where the JSON report was written, if requested.
    pub report_path: Option<PathBuf>,
    pub interrupted: bool,
    /// Process exit code for this run.
    pub exit_code: i32,
}

/// Execute the run command, writing the rendered report to `out`.
pub async fn execute_run<B, F, L, W>(
    args: &RunArgs,
    backend: Arc<B>,
    fs: &F,
    shutdown: &ShutdownFlag,
    logger: &L,
    out: &mut W,
) -> CommandResult<RunResult>
where
    B: AnalyzerBackend + 'static,
    F: Filesystem,
    L: Logger,
    W: Write,
{
    // Validate arguments
    args.validate()?;
    let command = args.analyzer_command()?;

    let registry = load_registry(fs, &args.manifest, &args.only)?;
    logger.verbose(&format!(
        "Loaded {} sample(s) from {}",
        registry.len(),
        args.manifest.display()
    ));

    let config = build_config(args, command, registry.settings());
    logger.debug(&format!(
        "Analyzer: {} (backend {}, tolerance {})",
        config.analyzer.command,
        backend.name(),
        config.match_options.tolerance
    ));

    let output = run_samples(&registry, backend, &config, shutdown, logger).await;

    // Print the report
    let rendered = match args.format {
        OutputFormat::Text => render_text(&output.report),
        OutputFormat::Json => render_json(&output.report).map_err(ReportWriteError::from)? + "\n",
    };
    out.write_all(rendered.as_bytes())?;
    out.flush()?;

    // Write the report file
    if let Some(path) = &args.report {
        ReportWriter::new(fs).write(&output.report, path)?;
        logger.verbose(&format!("Wrote report to {}", path.display()));
    }

    let exit_code = if output.interrupted {
        codes::SIGINT
    } else {
        outcome_code(output.report.outcome(), args.coarse_exit)
    };

    Ok(RunResult {
        report: output.report,
        report_path: args.report.clone(),
        interrupted: output.interrupted,
        exit_code,
    })
}

/// Resolve runner settings. CLI flags override manifest settings.
fn build_config(args: &RunArgs, command: AnalyzerCommand, settings: &RegistrySettings) -> RunnerConfig {
    let analyzer = AnalyzerConfig::from_settings(command, settings)
        .with_include_notes(settings.include_notes || args.include_notes)
        .with_sample_timeout(args.per_sample_timeout());

    RunnerConfig {
        analyzer,
        match_options: MatchOptions::with_tolerance(args.tolerance.unwrap_or(settings.tolerance)),
        jobs: args.worker_count(),
        run_timeout: args.run_timeout(),
    }
}
