//! Manifest loading and validation.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use diagsmoke_fs::{Filesystem, FsError};
use glob::Pattern;
use sha2::{Digest, Sha256};

use crate::manifest::{
    ManifestExpectation, ManifestFile, ManifestSample, ManifestSettings, MANIFEST_VERSION,
};
use crate::types::{
    ExpectedDiagnostic, LineSpec, Registry, RegistrySettings, Sample, DEFAULT_LANGUAGE,
};

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("manifest {path} has {} problem(s):\n{}", .issues.len(), format_issues(.issues))]
    Invalid {
        path: String,
        issues: Vec<ManifestIssue>,
    },

    #[error("invalid sample filter '{0}'")]
    InvalidFilter(String),

    #[error("sample filter '{0}' matched no samples")]
    FilterMatchedNothing(String),
}

/// A single validation problem found in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    /// Sample id, or `#<index>` when the id itself is unusable.
    pub sample: Option<String>,
    pub problem: String,
}

impl ManifestIssue {
    fn manifest(problem: impl Into<String>) -> Self {
        Self {
            sample: None,
            problem: problem.into(),
        }
    }

    fn sample(sample: &str, problem: impl Into<String>) -> Self {
        Self {
            sample: Some(sample.to_string()),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ManifestIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sample {
            Some(sample) => write!(f, "sample {}: {}", sample, self.problem),
            None => write!(f, "{}", self.problem),
        }
    }
}

fn format_issues(issues: &[ManifestIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("  - {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load and validate a manifest.
///
/// Source paths are resolved relative to the manifest's directory. Every
/// validation problem is collected before failing, so one run shows them all.
pub fn load<F: Filesystem>(fs: &F, manifest_path: &Path) -> Result<Registry, LoadError> {
    let content = fs.read_file(manifest_path).map_err(|e| LoadError::Read {
        path: manifest_path.display().to_string(),
        source: e,
    })?;

    let manifest = parse_manifest(&content).map_err(|e| LoadError::Json {
        path: manifest_path.display().to_string(),
        source: e,
    })?;

    let base_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut issues = Vec::new();

    if manifest.version != MANIFEST_VERSION {
        issues.push(ManifestIssue::manifest(format!(
            "unsupported manifest version {} (expected {})",
            manifest.version, MANIFEST_VERSION
        )));
    }

    let settings = build_settings(&manifest.settings, &mut issues);
    let samples = build_samples(fs, &base_dir, &manifest.samples, &mut issues);

    if !issues.is_empty() {
        return Err(LoadError::Invalid {
            path: manifest_path.display().to_string(),
            issues,
        });
    }

    Ok(Registry::new(manifest_path, settings, samples))
}

/// Parse manifest JSON without validating it.
pub fn parse_manifest(content: &str) -> Result<ManifestFile, serde_json::Error> {
    serde_json::from_str(content)
}

/// Keep only the samples whose ids match at least one glob pattern.
///
/// Every pattern must match at least one sample, so a typo in `--only`
/// cannot silently shrink the run.
pub fn select(registry: Registry, patterns: &[String]) -> Result<Registry, LoadError> {
    if patterns.is_empty() {
        return Ok(registry);
    }

    let compiled = patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| LoadError::InvalidFilter(p.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    for (pattern, raw) in compiled.iter().zip(patterns) {
        if !registry.samples().iter().any(|s| pattern.matches(&s.id)) {
            return Err(LoadError::FilterMatchedNothing(raw.clone()));
        }
    }

    Ok(registry.retain(|s| compiled.iter().any(|p| p.matches(&s.id))))
}

fn build_settings(raw: &ManifestSettings, issues: &mut Vec<ManifestIssue>) -> RegistrySettings {
    let mut settings = RegistrySettings::default();

    if let Some(tolerance) = raw.tolerance {
        settings.tolerance = tolerance;
    }
    if let Some(include_notes) = raw.include_notes {
        settings.include_notes = include_notes;
    }
    settings.analyzer_args = raw.analyzer_args.clone();

    if let Some(codes) = &raw.accepted_exit_codes {
        if codes.is_empty() {
            issues.push(ManifestIssue::manifest(
                "settings.accepted_exit_codes must not be empty",
            ));
        } else {
            settings.accepted_exit_codes = codes.clone();
        }
    }

    settings
}

fn build_samples<F: Filesystem>(
    fs: &F,
    base_dir: &Path,
    raw_samples: &[ManifestSample],
    issues: &mut Vec<ManifestIssue>,
) -> Vec<Sample> {
    let mut seen = HashSet::new();
    let mut samples = Vec::with_capacity(raw_samples.len());

    for (index, raw) in raw_samples.iter().enumerate() {
        let id = raw.id.trim();
        let label = if id.is_empty() {
            issues.push(ManifestIssue::sample(&format!("#{}", index), "id must not be empty"));
            format!("#{}", index)
        } else {
            if !seen.insert(id.to_string()) {
                issues.push(ManifestIssue::sample(id, "duplicate sample id"));
            }
            id.to_string()
        };

        if let Some(sample) = build_sample(fs, base_dir, raw, &label, issues) {
            samples.push(sample);
        }
    }

    samples
}

fn build_sample<F: Filesystem>(
    fs: &F,
    base_dir: &Path,
    raw: &ManifestSample,
    label: &str,
    issues: &mut Vec<ManifestIssue>,
) -> Option<Sample> {
    let before = issues.len();

    let span = raw.span.and_then(|[start, end]| {
        range_spec(start, end)
            .map_err(|problem| issues.push(ManifestIssue::sample(label, format!("span {}", problem))))
            .ok()
    });

    if raw.expect.is_empty() {
        issues.push(ManifestIssue::sample(label, "no expected diagnostics"));
    }

    let mut expected = Vec::with_capacity(raw.expect.len());
    for (index, raw_expect) in raw.expect.iter().enumerate() {
        match build_expectation(raw_expect) {
            Ok(expectation) => {
                if let Some(span) = span {
                    if !span.encloses(&expectation.lines) {
                        issues.push(ManifestIssue::sample(
                            label,
                            format!(
                                "expectation {} ({} at {}) lies outside span {}",
                                index, expectation.rule, expectation.lines, span
                            ),
                        ));
                    }
                }
                expected.push(expectation);
            }
            Err(problem) => issues.push(ManifestIssue::sample(
                label,
                format!("expectation {}: {}", index, problem),
            )),
        }
    }

    if let Some(checks) = &raw.checks {
        if checks.trim().is_empty() {
            issues.push(ManifestIssue::sample(label, "checks must not be blank when set"));
        }
    }

    let source = resolve_source(base_dir, &raw.source);
    let source_sha256 = if fs.is_file(&source) {
        match fs.read_bytes(&source) {
            Ok(bytes) => compute_sha256(&bytes),
            Err(e) => {
                issues.push(ManifestIssue::sample(
                    label,
                    format!("failed to read source {}: {}", source.display(), e),
                ));
                String::new()
            }
        }
    } else {
        issues.push(ManifestIssue::sample(
            label,
            format!("source file not found: {}", source.display()),
        ));
        String::new()
    };

    if issues.len() > before {
        return None;
    }

    Some(Sample {
        id: label.to_string(),
        source,
        language: raw
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE)
            .to_string(),
        span,
        checks: raw.checks.as_ref().map(|c| c.trim().to_string()),
        args: raw.args.clone(),
        expected,
        source_sha256,
    })
}

fn build_expectation(raw: &ManifestExpectation) -> Result<ExpectedDiagnostic, String> {
    let rule = raw.rule.trim();
    if rule.is_empty() {
        return Err("rule must not be empty".to_string());
    }

    let lines = match (raw.line, raw.lines) {
        (Some(_), Some(_)) => return Err("set either line or lines, not both".to_string()),
        (None, None) => return Err("one of line or lines is required".to_string()),
        (Some(0), None) => return Err("line numbers start at 1".to_string()),
        (Some(line), None) => LineSpec::Line(line),
        (None, Some([start, end])) => range_spec(start, end)?,
    };

    let message = match raw.message.as_deref() {
        Some(m) if m.is_empty() => return Err("message must not be empty when set".to_string()),
        other => other.map(str::to_string),
    };

    Ok(ExpectedDiagnostic {
        rule: rule.to_string(),
        lines,
        message,
    })
}

fn range_spec(start: u32, end: u32) -> Result<LineSpec, String> {
    if start == 0 {
        return Err("line numbers start at 1".to_string());
    }
    if start > end {
        return Err(format!("range {}-{} is inverted", start, end));
    }
    Ok(if start == end {
        LineSpec::Line(start)
    } else {
        LineSpec::Range { start, end }
    })
}

fn resolve_source(base_dir: &Path, source: &Path) -> PathBuf {
    if source.is_absolute() {
        source.to_path_buf()
    } else {
        base_dir.join(source)
    }
}

/// Compute SHA256 hash of data, returning hex string.
fn compute_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
