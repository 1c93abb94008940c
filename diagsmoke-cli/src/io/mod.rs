//! IO helpers for CLI operations.

pub mod report_writer;

pub use report_writer::{ReportWriteError, ReportWriter};
