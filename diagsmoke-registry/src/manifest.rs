//! On-disk manifest schema.
//!
//! These types mirror the JSON file one-to-one. Validation and path
//! resolution happen in the loader, which turns them into `Sample`s.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Version of the manifest schema.
pub const MANIFEST_VERSION: u32 = 1;

fn default_version() -> u32 {
    MANIFEST_VERSION
}

/// Top-level manifest document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub settings: ManifestSettings,
    pub samples: Vec<ManifestSample>,
}

/// Run defaults. Every field is optional in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSettings {
    #[serde(default)]
    pub tolerance: Option<u32>,
    #[serde(default)]
    pub include_notes: Option<bool>,
    #[serde(default)]
    pub analyzer_args: Vec<String>,
    #[serde(default)]
    pub accepted_exit_codes: Option<Vec<i32>>,
}

/// One sample entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestSample {
    pub id: String,
    pub source: PathBuf,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub span: Option<[u32; 2]>,
    #[serde(default)]
    pub checks: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub expect: Vec<ManifestExpectation>,
}

/// One expected diagnostic. Exactly one of `line` / `lines` must be set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestExpectation {
    pub rule: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub lines: Option<[u32; 2]>,
    #[serde(default)]
    pub message: Option<String>,
}
