//! Report rendering.

use std::fmt::Write;

use crate::aggregate::RunReport;
use crate::verdict::Status;

/// Human-readable summary, one line per sample followed by its discrepancies.
pub fn render_text(report: &RunReport) -> String {
    let mut out = String::new();

    for verdict in &report.verdicts {
        let _ = writeln!(out, "{:<10} {}", label(verdict.status), verdict.sample_id);
        if let Some(reason) = &verdict.reason {
            let _ = writeln!(out, "    {}", reason);
        }
        for discrepancy in &verdict.discrepancies {
            let _ = writeln!(out, "    {}", discrepancy);
        }
    }

    let s = &report.summary;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} samples: {} passed, {} missing, {} mismatched, {} unexpected, {} timeout, {} error",
        s.total, s.passed, s.missing, s.mismatched, s.unexpected, s.timeout, s.error
    );
    let _ = writeln!(
        out,
        "Result: {} (backend {}, tolerance {})",
        if report.passed { "PASS" } else { "FAIL" },
        report.backend,
        report.tolerance
    );
    out
}

/// Pretty-printed JSON form of the report.
pub fn render_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

fn label(status: Status) -> &'static str {
    match status {
        Status::Pass => "PASS",
        Status::Missing => "MISSING",
        Status::Unexpected => "UNEXPECTED",
        Status::Mismatched => "MISMATCHED",
        Status::Timeout => "TIMEOUT",
        Status::Error => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::verdict::{Discrepancy, Verdict};
    use diagsmoke_registry::LineSpec;

    fn report() -> RunReport {
        aggregate(
            vec![
                Verdict {
                    sample_id: "null-deref".to_string(),
                    status: Status::Missing,
                    discrepancies: vec![Discrepancy::Missing {
                        rule: "NullDereference".to_string(),
                        expected: LineSpec::Line(5),
                        message: None,
                    }],
                    expected_count: 1,
                    actual_count: 0,
                    source_sha256: "ab".repeat(32),
                    reason: None,
                },
                Verdict {
                    sample_id: "make-unique".to_string(),
                    status: Status::Pass,
                    discrepancies: Vec::new(),
                    expected_count: 1,
                    actual_count: 1,
                    source_sha256: "ab".repeat(32),
                    reason: None,
                },
            ],
            "clang-tidy",
            0,
        )
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&report());

        assert_eq!(
            text,
            "PASS       make-unique\n\
             MISSING    null-deref\n\
             \x20   missing NullDereference at line 5\n\
             \n\
             2 samples: 1 passed, 1 missing, 0 mismatched, 0 unexpected, 0 timeout, 0 error\n\
             Result: FAIL (backend clang-tidy, tolerance 0)\n"
        );
    }

    #[test]
    fn test_render_json_fields() {
        let json: serde_json::Value = serde_json::from_str(&render_json(&report()).unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["backend"], "clang-tidy");
        assert_eq!(json["passed"], false);
        assert_eq!(json["summary"]["missing"], 1);
        assert_eq!(json["verdicts"][0]["sample_id"], "make-unique");
        assert_eq!(json["verdicts"][1]["status"], "missing");
        assert_eq!(json["verdicts"][1]["discrepancies"][0]["kind"], "missing");
        assert!(json["verdicts"][0].get("reason").is_none());
    }
}
