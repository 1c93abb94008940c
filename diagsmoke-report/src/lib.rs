//! Verdicts and run reports for diagsmoke.
//!
//! - `match_sample` reconciles expected diagnostics against findings
//! - `RunAccumulator` collects verdicts from concurrent workers
//! - `aggregate` builds the ordered `RunReport`
//! - `render_text` / `render_json` format it

pub mod aggregate;
pub mod matcher;
pub mod render;
pub mod verdict;

pub use aggregate::{aggregate, AccumulatorError, RunAccumulator, RunOutcome, RunReport, Summary, REPORT_VERSION};
pub use matcher::{match_sample, MatchOptions};
pub use render::{render_json, render_text};
pub use verdict::{Discrepancy, MismatchReason, Status, Verdict};
