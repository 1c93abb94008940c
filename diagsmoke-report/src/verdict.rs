//! Per-sample verdicts.

use std::fmt;

use diagsmoke_analyzer::InvocationError;
use diagsmoke_registry::{LineSpec, Sample};
use serde::Serialize;

/// Outcome of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Missing,
    Unexpected,
    Mismatched,
    Timeout,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Missing => "missing",
            Status::Unexpected => "unexpected",
            Status::Mismatched => "mismatched",
            Status::Timeout => "timeout",
            Status::Error => "error",
        }
    }

    /// Status of a completed match. Missing outranks Mismatched, which
    /// outranks Unexpected.
    pub fn from_discrepancies(discrepancies: &[Discrepancy]) -> Self {
        let has = |kind: fn(&Discrepancy) -> bool| discrepancies.iter().any(kind);
        if has(|d| matches!(d, Discrepancy::Missing { .. })) {
            Status::Missing
        } else if has(|d| matches!(d, Discrepancy::Mismatched { .. })) {
            Status::Mismatched
        } else if has(|d| matches!(d, Discrepancy::Unexpected { .. })) {
            Status::Unexpected
        } else {
            Status::Pass
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a nearby same-rule diagnostic did not cover an expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchReason {
    LineDrift,
    MessageMismatch,
}

/// One difference between expected and actual diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    Missing {
        rule: String,
        expected: LineSpec,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Unexpected {
        rule: String,
        line: Option<u32>,
        message: String,
    },
    Mismatched {
        rule: String,
        expected: LineSpec,
        actual_line: u32,
        actual_message: String,
        reason: MismatchReason,
    },
}

impl Discrepancy {
    pub fn rule(&self) -> &str {
        match self {
            Discrepancy::Missing { rule, .. }
            | Discrepancy::Unexpected { rule, .. }
            | Discrepancy::Mismatched { rule, .. } => rule,
        }
    }

    /// Ordering key: kind (missing, mismatched, unexpected), then line, then rule.
    pub(crate) fn sort_key(&self) -> (u8, Option<u32>, &str) {
        match self {
            Discrepancy::Missing { rule, expected, .. } => (0, Some(expected.start()), rule),
            Discrepancy::Mismatched { rule, expected, .. } => (1, Some(expected.start()), rule),
            Discrepancy::Unexpected { rule, line, .. } => (2, *line, rule),
        }
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::Missing { rule, expected, message } => {
                write!(f, "missing {} at {}", rule, expected)?;
                if let Some(message) = message {
                    write!(f, " (message containing \"{}\")", message)?;
                }
                Ok(())
            }
            Discrepancy::Unexpected { rule, line, message } => match line {
                Some(line) => write!(f, "unexpected {} at line {}: {}", rule, line, message),
                None => write!(f, "unexpected {}: {}", rule, message),
            },
            Discrepancy::Mismatched {
                rule,
                expected,
                actual_line,
                actual_message,
                reason,
            } => match reason {
                MismatchReason::LineDrift => write!(
                    f,
                    "mismatched {}: expected at {}, reported at line {}",
                    rule, expected, actual_line
                ),
                MismatchReason::MessageMismatch => write!(
                    f,
                    "mismatched {} at line {}: message \"{}\" does not match",
                    rule, actual_line, actual_message
                ),
            },
        }
    }
}

/// Result of checking one sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub sample_id: String,
    pub status: Status,
    pub discrepancies: Vec<Discrepancy>,
    /// Expectations considered.
    pub expected_count: usize,
    /// Findings considered after span filtering.
    pub actual_count: usize,
    pub source_sha256: String,
    /// Failure reason for Timeout and Error verdicts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    pub fn timeout(sample: &Sample, reason: impl Into<String>) -> Self {
        Self::without_findings(sample, Status::Timeout, reason.into())
    }

    pub fn error(sample: &Sample, reason: impl Into<String>) -> Self {
        Self::without_findings(sample, Status::Error, reason.into())
    }

    /// Verdict for a sample whose analyzer invocation failed.
    pub fn from_invocation_error(sample: &Sample, err: &InvocationError) -> Self {
        if err.is_timeout() {
            Self::timeout(sample, err.to_string())
        } else {
            Self::error(sample, err.to_string())
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }

    fn without_findings(sample: &Sample, status: Status, reason: String) -> Self {
        Self {
            sample_id: sample.id.clone(),
            status,
            discrepancies: Vec::new(),
            expected_count: sample.expected.len(),
            actual_count: 0,
            source_sha256: sample.source_sha256.clone(),
            reason: Some(reason),
        }
    }
}
