//! List command: print the samples in a manifest.

use std::io::Write;

use diagsmoke_fs::Filesystem;

use crate::cli::ListArgs;

use super::{load_registry, CommandResult};

/// Print each sample with its source and expectations. Returns the sample count.
pub fn execute_list<F, W>(args: &ListArgs, fs: &F, out: &mut W) -> CommandResult<usize>
where
    F: Filesystem,
    W: Write,
{
    let registry = load_registry(fs, &args.manifest, &args.only)?;

    for sample in registry.samples() {
        write!(out, "{}  {}", sample.id, sample.source.display())?;
        if let Some(span) = sample.span {
            write!(out, " ({})", span)?;
        }
        writeln!(out)?;

        for expected in &sample.expected {
            write!(out, "    {} at {}", expected.rule, expected.lines)?;
            if let Some(message) = &expected.message {
                write!(out, " \"{}\"", message)?;
            }
            writeln!(out)?;
        }
    }

    Ok(registry.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use diagsmoke_registry::LoadError;

    use crate::commands::{fixtures, CommandError};

    fn args(only: &[&str]) -> ListArgs {
        ListArgs {
            manifest: PathBuf::from(fixtures::MANIFEST_PATH),
            only: only.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_list_all_samples() {
        let mut out = Vec::new();
        let count = execute_list(&args(&[]), &fixtures::filesystem(), &mut out).unwrap();

        assert_eq!(count, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "null-deref  /work/a.cpp\n\
             \x20   NullDeref at line 5\n\
             unused-var  /work/b.cpp (lines 10-14)\n\
             \x20   UnusedVar at lines 11-12 \"unused\"\n"
        );
    }

    #[test]
    fn test_list_with_filter() {
        let mut out = Vec::new();
        let count = execute_list(&args(&["unused-*"]), &fixtures::filesystem(), &mut out).unwrap();

        assert_eq!(count, 1);
        assert!(String::from_utf8(out).unwrap().starts_with("unused-var"));
    }

    #[test]
    fn test_list_filter_matching_nothing() {
        let err = execute_list(&args(&["nope-*"]), &fixtures::filesystem(), &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, CommandError::Load(LoadError::FilterMatchedNothing(_))));
    }
}
