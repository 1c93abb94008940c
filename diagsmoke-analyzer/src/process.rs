//! Subprocess execution for analyzer backends.

use std::process::Stdio;

use tokio::process::Command;

use crate::backend::InvocationError;

/// Maximum stderr kept in error messages.
const STDERR_EXCERPT_CHARS: usize = 2000;

/// Captured output of a finished analyzer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Stdout followed by stderr. clang-tidy splits diagnostics across both.
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Fail unless the process exited with one of `accepted` codes.
    pub fn check_status(&self, accepted: &[i32]) -> Result<(), InvocationError> {
        match self.code {
            Some(code) if accepted.contains(&code) => Ok(()),
            Some(code) => Err(InvocationError::UnexpectedStatus {
                code,
                stderr: stderr_excerpt(&self.stderr),
            }),
            None => Err(InvocationError::Terminated {
                stderr: stderr_excerpt(&self.stderr),
            }),
        }
    }
}

/// Run a program to completion and capture its output.
///
/// The child inherits the harness's working directory, so relative program
/// paths and arguments resolve the way they do on the command line. It is
/// killed if the returned future is dropped, so wrapping this in a timeout
/// cancels the process too.
pub async fn run_process(
    program: &str,
    args: &[String],
    envs: &[(&str, String)],
) -> Result<ProcessOutput, InvocationError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    for (key, value) in envs {
        cmd.env(key, value);
    }

    let output = cmd.output().await.map_err(|e| InvocationError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    Ok(ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Keep the tail of stderr, where tools usually print the failure reason.
fn stderr_excerpt(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let tail: String = trimmed.chars().skip(count - STDERR_EXCERPT_CHARS).collect();
    format!("...{}", tail)
}
