//! Concurrent sample runner.
//!
//! Samples that need the same analyzer invocation (same source, language,
//! checks and args) share one invocation. Invocations run on the tokio
//! runtime, bounded by a semaphore. Each task matches its findings and
//! submits verdicts to a shared `RunAccumulator`; the report is sorted by
//! sample id regardless of completion order.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use diagsmoke_analyzer::{analyze, AnalyzerBackend, AnalyzerConfig, Finding, InvocationError};
use diagsmoke_registry::{Registry, Sample};
use diagsmoke_report::{aggregate, match_sample, MatchOptions, RunAccumulator, RunReport, Verdict};
use tokio::sync::Semaphore;
use tokio::time::Instant;

use crate::logger::Logger;
use crate::signal::ShutdownFlag;

/// Reason recorded for samples cut short by Ctrl+C.
pub const INTERRUPTED_REASON: &str = "interrupted";

/// Reason recorded when a task ended without reporting.
const NO_VERDICT_REASON: &str = "analysis task ended without a verdict";

/// Runner settings resolved from the manifest and CLI.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub analyzer: AnalyzerConfig,
    pub match_options: MatchOptions,
    /// Maximum concurrent analyzer invocations.
    pub jobs: usize,
    /// Deadline for the whole run.
    pub run_timeout: Option<Duration>,
}

/// Result of running every sample.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    pub interrupted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct InvocationKey {
    source: PathBuf,
    language: String,
    checks: Option<String>,
    args: Vec<String>,
}

impl InvocationKey {
    fn of(sample: &Sample) -> Self {
        Self {
            source: sample.source.clone(),
            language: sample.language.clone(),
            checks: sample.checks.clone(),
            args: sample.args.clone(),
        }
    }
}

/// Group samples by invocation. Each group is sorted by id; the first
/// sample drives the invocation.
pub fn group_samples(samples: &[Arc<Sample>]) -> Vec<Vec<Arc<Sample>>> {
    let mut groups: BTreeMap<InvocationKey, Vec<Arc<Sample>>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(InvocationKey::of(sample))
            .or_default()
            .push(Arc::clone(sample));
    }

    groups
        .into_values()
        .map(|mut group| {
            group.sort_by(|a, b| a.id.cmp(&b.id));
            group
        })
        .collect()
}

/// Run every registry sample and build the report.
pub async fn run_samples<B, L>(
    registry: &Registry,
    backend: Arc<B>,
    config: &RunnerConfig,
    shutdown: &ShutdownFlag,
    logger: &L,
) -> RunOutput
where
    B: AnalyzerBackend + 'static,
    L: Logger,
{
    let accumulator = Arc::new(RunAccumulator::new());
    let semaphore = Arc::new(Semaphore::new(config.jobs.max(1)));
    // A limit past the end of the clock means no deadline at all
    let deadline = config
        .run_timeout
        .and_then(|limit| Instant::now().checked_add(limit));
    let groups = group_samples(registry.samples());

    logger.verbose(&format!(
        "Running {} sample(s) in {} invocation(s), {} at a time",
        registry.len(),
        groups.len(),
        config.jobs.max(1)
    ));

    let mut handles = Vec::new();
    for samples in groups {
        logger.debug(&format!(
            "Invocation for {}: {}",
            samples
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            samples[0].source.display()
        ));

        let task = GroupTask {
            samples,
            backend: Arc::clone(&backend),
            analyzer: config.analyzer.clone(),
            match_options: config.match_options,
            run_timeout: config.run_timeout,
            deadline,
            semaphore: Arc::clone(&semaphore),
            shutdown: shutdown.clone(),
            accumulator: Arc::clone(&accumulator),
        };
        handles.push(tokio::spawn(task.run()));
    }

    // Warnings are logged in spawn order so output is stable
    for handle in handles {
        match handle.await {
            Ok(warnings) => {
                for warning in warnings {
                    logger.warn(&warning);
                }
            }
            Err(e) => logger.warn(&format!("analysis task failed: {}", e)),
        }
    }

    let interrupted = shutdown.should_stop();
    let missing_reason = if interrupted {
        INTERRUPTED_REASON
    } else {
        NO_VERDICT_REASON
    };
    let verdicts = accumulator.finish(registry, missing_reason);

    for verdict in &verdicts {
        match &verdict.reason {
            Some(reason) => logger.verbose(&format!("{}: {} ({})", verdict.sample_id, verdict.status, reason)),
            None => logger.verbose(&format!("{}: {}", verdict.sample_id, verdict.status)),
        }
    }

    RunOutput {
        report: aggregate(verdicts, backend.name(), config.match_options.tolerance),
        interrupted,
    }
}

enum GroupOutcome {
    Analyzed(Vec<Finding>),
    Failed(InvocationError),
    RunTimedOut,
    Interrupted,
}

/// One invocation and the samples that share it.
struct GroupTask<B> {
    samples: Vec<Arc<Sample>>,
    backend: Arc<B>,
    analyzer: AnalyzerConfig,
    match_options: MatchOptions,
    run_timeout: Option<Duration>,
    deadline: Option<Instant>,
    semaphore: Arc<Semaphore>,
    shutdown: ShutdownFlag,
    accumulator: Arc<RunAccumulator>,
}

impl<B: AnalyzerBackend + 'static> GroupTask<B> {
    /// Returns warnings for the caller to log.
    async fn run(self) -> Vec<String> {
        let outcome = self.invoke().await;
        self.record(outcome)
    }

    async fn invoke(&self) -> GroupOutcome {
        let Some(representative) = self.samples.first() else {
            return GroupOutcome::Analyzed(Vec::new());
        };

        // Waiting for a worker counts against the run deadline
        let work = async {
            let _permit = match self.semaphore.acquire().await {
                Ok(permit) => permit,
                Err(_) => return GroupOutcome::Interrupted,
            };
            match analyze(self.backend.as_ref(), representative, &self.analyzer).await {
                Ok(findings) => GroupOutcome::Analyzed(findings),
                Err(e) => GroupOutcome::Failed(e),
            }
        };

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, work)
                    .await
                    .unwrap_or(GroupOutcome::RunTimedOut),
                None => work.await,
            }
        };

        // Dropping the losing branch kills a running analyzer process
        tokio::select! {
            biased;
            _ = self.shutdown.wait() => GroupOutcome::Interrupted,
            outcome = bounded => outcome,
        }
    }

    fn record(&self, outcome: GroupOutcome) -> Vec<String> {
        let mut warnings = Vec::new();

        match outcome {
            // Left for the accumulator to fill in
            GroupOutcome::Interrupted => {}
            GroupOutcome::RunTimedOut => {
                let reason = match self.run_timeout {
                    Some(limit) => format!("run timeout of {}s exceeded", limit.as_secs_f64()),
                    None => "run timeout exceeded".to_string(),
                };
                for sample in &self.samples {
                    self.submit(Verdict::timeout(sample, reason.clone()), &mut warnings);
                }
            }
            GroupOutcome::Failed(err) => {
                for sample in &self.samples {
                    self.submit(Verdict::from_invocation_error(sample, &err), &mut warnings);
                }
            }
            GroupOutcome::Analyzed(findings) => {
                for (index, sample) in self.samples.iter().enumerate() {
                    let owned = findings_for(index == 0, &findings);

                    for finding in owned.iter().filter(|f| f.is_unparsed()) {
                        if finding.line().map_or(true, |line| sample.owns_line(line)) {
                            warnings.push(format!(
                                "sample {}: unparsed analyzer output: {}",
                                sample.id,
                                finding.message()
                            ));
                        }
                    }

                    let verdict = match_sample(sample, &owned, &self.match_options);
                    self.submit(verdict, &mut warnings);
                }
            }
        }

        warnings
    }

    fn submit(&self, verdict: Verdict, warnings: &mut Vec<String>) {
        if let Err(e) = self.accumulator.submit(verdict) {
            warnings.push(e.to_string());
        }
    }
}

/// Findings a sample of a shared invocation sees.
///
/// Line-less unparsed output goes to the first sample only, so it is
/// reported exactly once. Everything else is split by span in the matcher.
fn findings_for(first: bool, findings: &[Finding]) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| first || !matches!(f, Finding::Unparsed { line: None, .. }))
        .cloned()
        .collect()
}
