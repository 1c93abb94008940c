//! Check command: validate a manifest without running the analyzer.

use std::io::Write;

use diagsmoke_fs::Filesystem;

use crate::cli::CheckArgs;

use super::{load_registry, CommandResult};

/// Validate the manifest and print a one-line summary. Returns the sample count.
pub fn execute_check<F, W>(args: &CheckArgs, fs: &F, out: &mut W) -> CommandResult<usize>
where
    F: Filesystem,
    W: Write,
{
    let registry = load_registry(fs, &args.manifest, &[])?;
    let expectations: usize = registry.samples().iter().map(|s| s.expected.len()).sum();

    writeln!(
        out,
        "{}: OK ({} samples, {} expected diagnostics)",
        args.manifest.display(),
        registry.len(),
        expectations
    )?;

    Ok(registry.len())
}
