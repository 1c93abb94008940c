//! Run aggregation.

use std::collections::BTreeMap;
use std::sync::Mutex;

use diagsmoke_registry::Registry;
use serde::Serialize;
use thiserror::Error;

use crate::verdict::{Status, Verdict};

/// JSON report format version.
pub const REPORT_VERSION: u32 = 1;

/// Verdict counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub missing: usize,
    pub mismatched: usize,
    pub unexpected: usize,
    pub timeout: usize,
    pub error: usize,
}

impl Summary {
    fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Pass => self.passed += 1,
            Status::Missing => self.missing += 1,
            Status::Mismatched => self.mismatched += 1,
            Status::Unexpected => self.unexpected += 1,
            Status::Timeout => self.timeout += 1,
            Status::Error => self.error += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.passed
    }
}

/// Overall classification of a run, used to pick the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Pass,
    /// Only Unexpected verdicts: fixtures drifted or the analyzer got noisier.
    FixtureDrift,
    /// At least one Missing or Mismatched verdict.
    Regression,
    /// At least one sample timed out or could not be analyzed.
    InvocationFailure,
}

/// The full result of a run, ordered by sample id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub version: u32,
    pub backend: String,
    pub tolerance: u32,
    pub passed: bool,
    pub summary: Summary,
    pub verdicts: Vec<Verdict>,
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        let s = &self.summary;
        if s.timeout > 0 || s.error > 0 {
            RunOutcome::InvocationFailure
        } else if s.missing > 0 || s.mismatched > 0 {
            RunOutcome::Regression
        } else if s.unexpected > 0 {
            RunOutcome::FixtureDrift
        } else {
            RunOutcome::Pass
        }
    }

    pub fn sample_ids(&self) -> Vec<&str> {
        self.verdicts.iter().map(|v| v.sample_id.as_str()).collect()
    }
}

/// Build a report from verdicts in any order.
pub fn aggregate(verdicts: impl IntoIterator<Item = Verdict>, backend: &str, tolerance: u32) -> RunReport {
    let mut verdicts: Vec<Verdict> = verdicts.into_iter().collect();
    verdicts.sort_by(|a, b| a.sample_id.cmp(&b.sample_id));

    let mut summary = Summary::default();
    for verdict in &verdicts {
        summary.record(verdict.status);
    }

    RunReport {
        version: REPORT_VERSION,
        backend: backend.to_string(),
        tolerance,
        passed: summary.total == summary.passed,
        summary,
        verdicts,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("a verdict for sample '{0}' was already recorded")]
    Duplicate(String),
}

/// Collects verdicts submitted by concurrent workers.
#[derive(Debug, Default)]
pub struct RunAccumulator {
    verdicts: Mutex<BTreeMap<String, Verdict>>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verdict. Each sample contributes exactly once.
    pub fn submit(&self, verdict: Verdict) -> Result<(), AccumulatorError> {
        let mut verdicts = self.verdicts.lock().unwrap_or_else(|e| e.into_inner());
        if verdicts.contains_key(&verdict.sample_id) {
            return Err(AccumulatorError::Duplicate(verdict.sample_id));
        }
        verdicts.insert(verdict.sample_id.clone(), verdict);
        Ok(())
    }

    pub fn contains(&self, sample_id: &str) -> bool {
        self.verdicts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(sample_id)
    }

    pub fn len(&self) -> usize {
        self.verdicts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One verdict per registry sample, in id order.
    ///
    /// Samples nobody reported on get an `Error` verdict with `missing_reason`.
    /// Verdicts for ids outside the registry are dropped. Drains the
    /// accumulator.
    pub fn finish(&self, registry: &Registry, missing_reason: &str) -> Vec<Verdict> {
        let mut verdicts = std::mem::take(&mut *self.verdicts.lock().unwrap_or_else(|e| e.into_inner()));

        let mut out: Vec<Verdict> = registry
            .samples()
            .iter()
            .map(|sample| {
                verdicts
                    .remove(&sample.id)
                    .unwrap_or_else(|| Verdict::error(sample, missing_reason))
            })
            .collect();
        out.sort_by(|a, b| a.sample_id.cmp(&b.sample_id));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use diagsmoke_registry::{ExpectedDiagnostic, RegistrySettings, Sample};

    fn verdict(id: &str, status: Status) -> Verdict {
        Verdict {
            sample_id: id.to_string(),
            status,
            discrepancies: Vec::new(),
            expected_count: 1,
            actual_count: 1,
            source_sha256: String::new(),
            reason: None,
        }
    }

    fn registry(ids: &[&str]) -> Registry {
        let samples = ids
            .iter()
            .map(|id| Sample::new(id, "/src/a.cpp", vec![ExpectedDiagnostic::at_line("r", 1)]))
            .collect();
        Registry::new("/src/manifest.json", RegistrySettings::default(), samples)
    }

    // ===========================================
    // Category A: aggregate
    // ===========================================

    #[test]
    fn test_aggregate_sorts_by_id() {
        let report = aggregate(
            vec![verdict("c", Status::Pass), verdict("a", Status::Pass), verdict("b", Status::Pass)],
            "mock",
            0,
        );

        assert_eq!(report.sample_ids(), vec!["a", "b", "c"]);
        assert!(report.passed);
        assert_eq!(report.outcome(), RunOutcome::Pass);
        assert_eq!(report.version, REPORT_VERSION);
    }

    #[test]
    fn test_aggregate_counts() {
        let report = aggregate(
            vec![
                verdict("a", Status::Pass),
                verdict("b", Status::Missing),
                verdict("c", Status::Unexpected),
                verdict("d", Status::Mismatched),
                verdict("e", Status::Timeout),
                verdict("f", Status::Error),
            ],
            "mock",
            2,
        );

        assert_eq!(
            report.summary,
            Summary {
                total: 6,
                passed: 1,
                missing: 1,
                mismatched: 1,
                unexpected: 1,
                timeout: 1,
                error: 1,
            }
        );
        assert_eq!(report.summary.failed(), 5);
        assert!(!report.passed);
        assert_eq!(report.tolerance, 2);
    }

    #[test]
    fn test_outcome_priority() {
        let outcome = |statuses: &[Status]| {
            let verdicts = statuses
                .iter()
                .enumerate()
                .map(|(i, s)| verdict(&i.to_string(), *s));
            aggregate(verdicts, "mock", 0).outcome()
        };

        assert_eq!(outcome(&[Status::Pass, Status::Unexpected]), RunOutcome::FixtureDrift);
        assert_eq!(outcome(&[Status::Unexpected, Status::Missing]), RunOutcome::Regression);
        assert_eq!(outcome(&[Status::Mismatched]), RunOutcome::Regression);
        assert_eq!(outcome(&[Status::Missing, Status::Timeout]), RunOutcome::InvocationFailure);
        assert_eq!(outcome(&[Status::Error]), RunOutcome::InvocationFailure);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let forward = aggregate(vec![verdict("a", Status::Pass), verdict("b", Status::Missing)], "mock", 0);
        let reverse = aggregate(vec![verdict("b", Status::Missing), verdict("a", Status::Pass)], "mock", 0);

        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&reverse).unwrap()
        );
    }

    // ===========================================
    // Category B: RunAccumulator
    // ===========================================

    #[test]
    fn test_accumulator_rejects_duplicates() {
        let acc = RunAccumulator::new();
        acc.submit(verdict("a", Status::Pass)).unwrap();

        assert_eq!(
            acc.submit(verdict("a", Status::Missing)),
            Err(AccumulatorError::Duplicate("a".to_string()))
        );
        assert_eq!(acc.len(), 1);
        assert!(acc.contains("a"));
    }

    #[test]
    fn test_accumulator_fills_gaps_with_error() {
        let acc = RunAccumulator::new();
        acc.submit(verdict("b", Status::Pass)).unwrap();
        acc.submit(verdict("stray", Status::Pass)).unwrap();

        let verdicts = acc.finish(&registry(&["c", "b", "a"]), "interrupted");

        let ids: Vec<&str> = verdicts.iter().map(|v| v.sample_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(verdicts[0].status, Status::Error);
        assert_eq!(verdicts[0].reason.as_deref(), Some("interrupted"));
        assert_eq!(verdicts[1].status, Status::Pass);
        assert_eq!(verdicts[2].status, Status::Error);
    }

    #[test]
    fn test_accumulator_concurrent_submissions() {
        let acc = Arc::new(RunAccumulator::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let acc = Arc::clone(&acc);
                std::thread::spawn(move || acc.submit(verdict(&format!("s{}", i), Status::Pass)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        assert_eq!(acc.len(), 8);
    }
}
