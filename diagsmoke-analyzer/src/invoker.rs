//! Running a backend on one sample.

use std::collections::HashSet;
use std::path::Path;

use diagsmoke_registry::Sample;

use crate::backend::{AnalyzerBackend, AnalyzerConfig, InvocationError};
use crate::diagnostic::{Finding, Severity};

/// Run `backend` on `sample` and keep the findings that belong to it.
///
/// Applies the per-sample timeout from `config`. Dropped: findings in other
/// files (headers), notes unless `include_notes` is set, and exact
/// duplicates. Order of first occurrence is preserved.
pub async fn analyze<B: AnalyzerBackend>(
    backend: &B,
    sample: &Sample,
    config: &AnalyzerConfig,
) -> Result<Vec<Finding>, InvocationError> {
    let findings = match config.sample_timeout {
        Some(limit) => tokio::time::timeout(limit, backend.analyze(sample, config))
            .await
            .map_err(|_| InvocationError::TimedOut { after: limit })??,
        None => backend.analyze(sample, config).await?,
    };

    Ok(retain_relevant(findings, sample, config.include_notes))
}

fn retain_relevant(findings: Vec<Finding>, sample: &Sample, include_notes: bool) -> Vec<Finding> {
    let mut seen = HashSet::new();
    findings
        .into_iter()
        .filter(|finding| match finding {
            Finding::Diagnostic(d) => {
                (include_notes || d.severity != Severity::Note) && same_file(&d.file, &sample.source)
            }
            Finding::Unparsed { .. } => true,
        })
        .filter(|finding| seen.insert(finding.clone()))
        .collect()
}

/// Whether two paths name the same file.
///
/// Falls back to a suffix comparison for relative paths the analyzer
/// reported without a directory.
pub fn same_file(reported: &Path, source: &Path) -> bool {
    if reported == source {
        return true;
    }
    if let (Ok(a), Ok(b)) = (reported.canonicalize(), source.canonicalize()) {
        return a == b;
    }
    reported.is_relative() && source.ends_with(reported)
}
