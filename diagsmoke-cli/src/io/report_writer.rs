//! Writes the JSON run report to a file.

use std::path::Path;

use diagsmoke_fs::{Filesystem, FsError};
use diagsmoke_report::{render_json, RunReport};
use thiserror::Error;

/// Errors from report writing.
#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to create directory for {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: FsError,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: FsError,
    },
}

/// Writes reports through a `Filesystem`.
pub struct ReportWriter<'a, F: Filesystem> {
    fs: &'a F,
}

impl<'a, F: Filesystem> ReportWriter<'a, F> {
    pub fn new(fs: &'a F) -> Self {
        Self { fs }
    }

    /// Write `report` as pretty JSON, atomically, creating parent directories.
    pub fn write(&self, report: &RunReport, path: &Path) -> Result<(), ReportWriteError> {
        let mut content = render_json(report)?;
        content.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs
                .create_dir_all(parent)
                .map_err(|e| ReportWriteError::CreateDir {
                    path: path.display().to_string(),
                    source: e,
                })?;
        }

        self.fs
            .write_atomic(path, content.as_bytes())
            .map_err(|e| ReportWriteError::Write {
                path: path.display().to_string(),
                source: e,
            })
    }
}
