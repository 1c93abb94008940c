//! Diagnostic matcher.
//!
//! Reconciles a sample's expectations against the findings the analyzer
//! reported for it:
//!
//! 1. Findings outside the sample's span are ignored.
//! 2. Per rule, exact matches are consumed first (line inside the expected
//!    line or range, message substring satisfied). Narrower expectations
//!    pick before wider ones.
//! 3. Each remaining expectation consumes the closest remaining same-rule
//!    diagnostic (ties go to the lower line). Within `tolerance` lines and
//!    with a matching message it is covered, otherwise it is `Mismatched`.
//! 4. Leftover expectations are `Missing`, leftover findings `Unexpected`.

use diagsmoke_analyzer::{ActualDiagnostic, Finding};
use diagsmoke_registry::{ExpectedDiagnostic, Sample};

use crate::verdict::{Discrepancy, MismatchReason, Status, Verdict};

/// Matcher settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Lines of drift still counted as covering an expectation.
    pub tolerance: u32,
}

impl MatchOptions {
    pub fn with_tolerance(tolerance: u32) -> Self {
        Self { tolerance }
    }
}

/// Produce the verdict for `sample` given its findings.
pub fn match_sample(sample: &Sample, findings: &[Finding], options: &MatchOptions) -> Verdict {
    // Restrict to the sample's span; findings without a line stay
    let relevant: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.line().map_or(true, |line| sample.owns_line(line)))
        .collect();

    let mut consumed = vec![false; relevant.len()];
    let mut discrepancies = Vec::new();

    // Narrow expectations first so a range does not take a point's diagnostic
    let mut order: Vec<&ExpectedDiagnostic> = sample.expected.iter().collect();
    order.sort_by_key(|e| (e.lines.end() - e.lines.start(), e.lines.start()));

    let mut pending = Vec::new();
    for expected in order {
        let exact = candidates(&relevant, &consumed, expected)
            .filter(|(_, d)| expected.lines.contains(d.line) && expected.message_matches(&d.message))
            .min_by_key(|(_, d)| d.line)
            .map(|(i, _)| i);

        match exact {
            Some(i) => consumed[i] = true,
            None => pending.push(expected),
        }
    }

    // Second pass: nearest same-rule diagnostic
    for expected in pending {
        let nearest = candidates(&relevant, &consumed, expected)
            .min_by_key(|(_, d)| (expected.lines.distance(d.line), d.line))
            .map(|(i, d)| (i, d.line, d.message.clone()));

        let Some((i, actual_line, actual_message)) = nearest else {
            discrepancies.push(Discrepancy::Missing {
                rule: expected.rule.clone(),
                expected: expected.lines,
                message: expected.message.clone(),
            });
            continue;
        };
        consumed[i] = true;

        let within_tolerance = expected.lines.distance(actual_line) <= options.tolerance;
        if within_tolerance && expected.message_matches(&actual_message) {
            continue;
        }

        discrepancies.push(Discrepancy::Mismatched {
            rule: expected.rule.clone(),
            expected: expected.lines,
            actual_line,
            actual_message,
            reason: if within_tolerance {
                MismatchReason::MessageMismatch
            } else {
                MismatchReason::LineDrift
            },
        });
    }

    // Whatever is left was not expected
    for (finding, _) in relevant.iter().zip(&consumed).filter(|(_, used)| !**used) {
        discrepancies.push(Discrepancy::Unexpected {
            rule: finding.rule().to_string(),
            line: finding.line(),
            message: finding.message().to_string(),
        });
    }

    discrepancies.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    Verdict {
        sample_id: sample.id.clone(),
        status: Status::from_discrepancies(&discrepancies),
        discrepancies,
        expected_count: sample.expected.len(),
        actual_count: relevant.len(),
        source_sha256: sample.source_sha256.clone(),
        reason: None,
    }
}

/// Unconsumed parsed diagnostics with the expectation's rule.
fn candidates<'a>(
    relevant: &'a [&'a Finding],
    consumed: &'a [bool],
    expected: &'a ExpectedDiagnostic,
) -> impl Iterator<Item = (usize, &'a ActualDiagnostic)> + 'a {
    relevant
        .iter()
        .enumerate()
        .filter(move |(i, _)| !consumed[*i])
        .filter_map(|(i, f)| f.as_diagnostic().map(|d| (i, d)))
        .filter(move |(_, d)| d.rule == expected.rule)
}
