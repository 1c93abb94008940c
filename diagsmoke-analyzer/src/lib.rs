//! Static analyzer invocation for diagsmoke.
//!
//! This crate provides:
//! - `ActualDiagnostic` / `Finding`, the parsed analyzer output
//! - `AnalyzerBackend` trait with clang-tidy and JSON-lines implementations
//! - Subprocess execution with accepted-exit-code checks
//! - `analyze`, which applies timeouts and drops findings that do not belong to the sample
//! - `MockBackend` for testing without an analyzer installed

pub mod backend;
pub mod clang_tidy;
pub mod command;
pub mod diagnostic;
pub mod invoker;
pub mod jsonl;
pub mod mock;
pub mod process;

pub use backend::{AnalyzerBackend, AnalyzerConfig, AnyBackend, BackendKind, InvocationError};
pub use clang_tidy::{parse_clang_tidy_output, ClangTidyBackend};
pub use command::{split_command, AnalyzerCommand};
pub use diagnostic::{ActualDiagnostic, Finding, Severity, UNPARSED_RULE};
pub use invoker::{analyze, same_file};
pub use jsonl::{parse_jsonl_output, JsonLinesBackend};
pub use mock::{MockBackend, MockResponse};
pub use process::{run_process, ProcessOutput};
