//! Registry types.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Default language tag for samples that do not declare one.
pub const DEFAULT_LANGUAGE: &str = "c++";

/// Default analyzer exit codes that mean "ran and reported diagnostics".
pub const DEFAULT_ACCEPTED_EXIT_CODES: &[i32] = &[0, 1];

/// A 1-based source line or inclusive line range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpec {
    Line(u32),
    Range { start: u32, end: u32 },
}

impl LineSpec {
    /// First line covered.
    pub fn start(&self) -> u32 {
        match *self {
            LineSpec::Line(line) => line,
            LineSpec::Range { start, .. } => start,
        }
    }

    /// Last line covered.
    pub fn end(&self) -> u32 {
        match *self {
            LineSpec::Line(line) => line,
            LineSpec::Range { end, .. } => end,
        }
    }

    pub fn contains(&self, line: u32) -> bool {
        line >= self.start() && line <= self.end()
    }

    /// Number of lines between `line` and the nearest covered line.
    pub fn distance(&self, line: u32) -> u32 {
        if line < self.start() {
            self.start() - line
        } else if line > self.end() {
            line - self.end()
        } else {
            0
        }
    }

    /// Whether `other` lies entirely inside this spec.
    pub fn encloses(&self, other: &LineSpec) -> bool {
        other.start() >= self.start() && other.end() <= self.end()
    }
}

impl fmt::Display for LineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LineSpec::Line(line) => write!(f, "line {}", line),
            LineSpec::Range { start, end } => write!(f, "lines {}-{}", start, end),
        }
    }
}

/// A diagnostic the analyzer is expected to report for a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedDiagnostic {
    pub rule: String,
    pub lines: LineSpec,
    /// Substring the diagnostic message must contain, if set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExpectedDiagnostic {
    pub fn new(rule: &str, lines: LineSpec) -> Self {
        Self {
            rule: rule.to_string(),
            lines,
            message: None,
        }
    }

    pub fn at_line(rule: &str, line: u32) -> Self {
        Self::new(rule, LineSpec::Line(line))
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    /// Whether a reported message satisfies the expected substring.
    pub fn message_matches(&self, actual: &str) -> bool {
        self.message.as_deref().map_or(true, |m| actual.contains(m))
    }
}

/// One labeled code sample. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id: String,
    /// Resolved path of the source file.
    pub source: PathBuf,
    pub language: String,
    /// Lines of `source` owned by this sample; `None` means the whole file.
    pub span: Option<LineSpec>,
    /// Analyzer check filter (e.g. `bugprone-*`).
    pub checks: Option<String>,
    /// Extra analyzer arguments for this sample.
    pub args: Vec<String>,
    pub expected: Vec<ExpectedDiagnostic>,
    /// Hex SHA-256 of the source file at load time.
    pub source_sha256: String,
}

impl Sample {
    /// Build a sample with defaults, mostly useful in tests.
    pub fn new(id: &str, source: impl Into<PathBuf>, expected: Vec<ExpectedDiagnostic>) -> Self {
        Self {
            id: id.to_string(),
            source: source.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            span: None,
            checks: None,
            args: Vec::new(),
            expected,
            source_sha256: String::new(),
        }
    }

    pub fn with_span(mut self, start: u32, end: u32) -> Self {
        self.span = Some(LineSpec::Range { start, end });
        self
    }

    pub fn with_checks(mut self, checks: &str) -> Self {
        self.checks = Some(checks.to_string());
        self
    }

    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Whether a reported line belongs to this sample.
    pub fn owns_line(&self, line: u32) -> bool {
        self.span.map_or(true, |span| span.contains(line))
    }
}

/// Run defaults declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Allowed line drift before an expectation counts as mismatched.
    pub tolerance: u32,
    /// Whether analyzer notes take part in matching.
    pub include_notes: bool,
    /// Arguments passed to the analyzer for every sample.
    pub analyzer_args: Vec<String>,
    /// Analyzer exit codes that mean the run completed.
    pub accepted_exit_codes: Vec<i32>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            tolerance: 0,
            include_notes: false,
            analyzer_args: Vec::new(),
            accepted_exit_codes: DEFAULT_ACCEPTED_EXIT_CODES.to_vec(),
        }
    }
}

/// The validated set of samples from one manifest load.
#[derive(Debug, Clone)]
pub struct Registry {
    manifest_path: PathBuf,
    settings: RegistrySettings,
    samples: Vec<Arc<Sample>>,
}

impl Registry {
    /// Create a registry from already-validated samples.
    pub fn new(manifest_path: impl Into<PathBuf>, settings: RegistrySettings, samples: Vec<Sample>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            settings,
            samples: samples.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn settings(&self) -> &RegistrySettings {
        &self.settings
    }

    /// Samples in manifest order.
    pub fn samples(&self) -> &[Arc<Sample>] {
        &self.samples
    }

    pub fn get(&self, id: &str) -> Option<&Arc<Sample>> {
        self.samples.iter().find(|s| s.id == id)
    }

    /// Sample ids in manifest order.
    pub fn ids(&self) -> Vec<String> {
        self.samples.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Keep only the samples whose ids satisfy `keep`.
    pub fn retain<P>(mut self, mut keep: P) -> Self
    where
        P: FnMut(&Sample) -> bool,
    {
        self.samples.retain(|s| keep(s));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===========================================
    // Test Category R1: Line Specs
    // ===========================================

    #[test]
    fn test_line_spec_single_line() {
        let spec = LineSpec::Line(5);
        assert!(spec.contains(5));
        assert!(!spec.contains(4));
        assert_eq!(spec.distance(2), 3);
        assert_eq!(spec.distance(9), 4);
        assert_eq!(spec.to_string(), "line 5");
    }

    #[test]
    fn test_line_spec_range() {
        let spec = LineSpec::Range { start: 10, end: 12 };
        assert!(spec.contains(10));
        assert!(spec.contains(12));
        assert!(!spec.contains(13));
        assert_eq!(spec.distance(11), 0);
        assert_eq!(spec.distance(8), 2);
        assert_eq!(spec.distance(15), 3);
        assert_eq!(spec.to_string(), "lines 10-12");
    }

    #[test]
    fn test_line_spec_encloses() {
        let span = LineSpec::Range { start: 10, end: 20 };
        assert!(span.encloses(&LineSpec::Line(10)));
        assert!(span.encloses(&LineSpec::Range { start: 12, end: 20 }));
        assert!(!span.encloses(&LineSpec::Range { start: 9, end: 12 }));
        assert!(!span.encloses(&LineSpec::Line(21)));
    }

    #[test]
    fn test_line_spec_serialization() {
        let json = serde_json::to_string(&LineSpec::Line(5)).unwrap();
        assert_eq!(json, r#"{"line":5}"#);
        let json = serde_json::to_string(&LineSpec::Range { start: 1, end: 3 }).unwrap();
        assert_eq!(json, r#"{"range":{"start":1,"end":3}}"#);
    }

    // ===========================================
    // Test Category R2: Samples and Registry
    // ===========================================

    #[test]
    fn test_expected_message_matching() {
        let any = ExpectedDiagnostic::at_line("bugprone-use-after-move", 54);
        assert!(any.message_matches("anything"));

        let specific = any.with_message("used after it was moved");
        assert!(specific.message_matches("'input' used after it was moved"));
        assert!(!specific.message_matches("something else"));
    }

    #[test]
    fn test_sample_owns_line() {
        let whole = Sample::new("a", "a.cpp", vec![]);
        assert!(whole.owns_line(1));
        assert!(whole.owns_line(9999));

        let spanned = Sample::new("b", "b.cpp", vec![]).with_span(10, 20);
        assert!(spanned.owns_line(15));
        assert!(!spanned.owns_line(21));
    }

    #[test]
    fn test_registry_lookup_and_retain() {
        let registry = Registry::new(
            "manifest.json",
            RegistrySettings::default(),
            vec![
                Sample::new("null-deref", "a.cpp", vec![]),
                Sample::new("unused-var", "a.cpp", vec![]),
            ],
        );

        assert_eq!(registry.len(), 2);
        assert!(registry.get("null-deref").is_some());
        assert!(registry.get("nope").is_none());

        let filtered = registry.retain(|s| s.id.starts_with("unused"));
        assert_eq!(filtered.ids(), vec!["unused-var".to_string()]);
    }

    #[test]
    fn test_registry_settings_default() {
        let settings = RegistrySettings::default();
        assert_eq!(settings.tolerance, 0);
        assert!(!settings.include_notes);
        assert_eq!(settings.accepted_exit_codes, vec![0, 1]);
    }
}
