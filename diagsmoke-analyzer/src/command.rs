//! Analyzer command-line handling.

use std::fmt;

/// The analyzer program and its leading arguments, split from `--analyzer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl AnalyzerCommand {
    /// Split a shell-style command string. Returns `None` for a blank command.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = split_command(command).into_iter();
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for AnalyzerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Split a command string into arguments, honouring single quotes,
/// double quotes and backslash escapes (outside single quotes).
pub fn split_command(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escape = false;
    // Distinguishes `''` (an empty argument) from no argument at all.
    let mut quoted = false;

    for ch in command.chars() {
        if escape {
            current.push(ch);
            escape = false;
            continue;
        }
        if ch == '\\' && !in_single {
            escape = true;
            continue;
        }
        if ch == '\'' && !in_double {
            in_single = !in_single;
            quoted = true;
            continue;
        }
        if ch == '"' && !in_single {
            in_double = !in_double;
            quoted = true;
            continue;
        }
        if ch.is_whitespace() && !in_single && !in_double {
            if !current.is_empty() || quoted {
                args.push(std::mem::take(&mut current));
                quoted = false;
            }
            continue;
        }
        current.push(ch);
    }
    if !current.is_empty() || quoted {
        args.push(current);
    }
    args
}
