//! Parsed analyzer output.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pseudo rule id carried by output lines that could not be parsed.
pub const UNPARSED_RULE: &str = "unparsed";

/// Diagnostic severity as reported by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" | "fatal" | "fatal error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "note" | "info" | "remark" => Ok(Severity::Note),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

/// One diagnostic reported by the analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualDiagnostic {
    pub rule: String,
    pub severity: Severity,
    pub file: PathBuf,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    pub message: String,
}

/// A single analyzer output record, parsed or not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Finding {
    Diagnostic(ActualDiagnostic),
    /// Output that looked like a diagnostic but did not parse.
    /// `line` is kept when the location prefix was readable.
    Unparsed { raw: String, line: Option<u32> },
}

impl Finding {
    pub fn rule(&self) -> &str {
        match self {
            Finding::Diagnostic(d) => &d.rule,
            Finding::Unparsed { .. } => UNPARSED_RULE,
        }
    }

    pub fn line(&self) -> Option<u32> {
        match self {
            Finding::Diagnostic(d) => Some(d.line),
            Finding::Unparsed { line, .. } => *line,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Finding::Diagnostic(d) => &d.message,
            Finding::Unparsed { raw, .. } => raw,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Finding::Unparsed { .. })
    }

    pub fn as_diagnostic(&self) -> Option<&ActualDiagnostic> {
        match self {
            Finding::Diagnostic(d) => Some(d),
            Finding::Unparsed { .. } => None,
        }
    }
}

impl From<ActualDiagnostic> for Finding {
    fn from(diagnostic: ActualDiagnostic) -> Self {
        Finding::Diagnostic(diagnostic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("ERROR".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("fatal error".parse::<Severity>(), Ok(Severity::Error));
        assert_eq!("note".parse::<Severity>(), Ok(Severity::Note));
        assert!("panic".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
        let parsed: Severity = serde_json::from_str("\"note\"").unwrap();
        assert_eq!(parsed, Severity::Note);
    }

    #[test]
    fn test_finding_accessors() {
        let diag = Finding::from(ActualDiagnostic {
            rule: "modernize-use-nullptr".to_string(),
            severity: Severity::Warning,
            file: PathBuf::from("a.cpp"),
            line: 67,
            column: 14,
            message: "use nullptr".to_string(),
        });
        assert_eq!(diag.rule(), "modernize-use-nullptr");
        assert_eq!(diag.line(), Some(67));
        assert!(!diag.is_unparsed());
        assert!(diag.as_diagnostic().is_some());

        let raw = Finding::Unparsed {
            raw: "a.cpp:3:1: remark?".to_string(),
            line: Some(3),
        };
        assert_eq!(raw.rule(), UNPARSED_RULE);
        assert_eq!(raw.line(), Some(3));
        assert_eq!(raw.message(), "a.cpp:3:1: remark?");
        assert!(raw.is_unparsed());
    }
}
