//! diagsmoke sample registry
//!
//! Loads the manifest that labels each code sample with the diagnostics a
//! static analyzer is expected to report for it.
//!
//! # Manifest
//!
//! The manifest is a JSON file:
//!
//! - `version` - Manifest format version (currently 1)
//! - `settings` - Run defaults (line tolerance, analyzer args, accepted exit codes)
//! - `samples` - Ordered list of samples, each with:
//!   - `id` - Unique sample identifier
//!   - `source` - Source file, relative to the manifest directory
//!   - `language` - Language/dialect tag (default `c++`)
//!   - `span` - Optional `[first, last]` line range owned by the sample
//!   - `checks` - Optional analyzer check filter
//!   - `args` - Optional extra analyzer arguments
//!   - `expect` - Expected diagnostics (`rule`, `line` or `lines`, optional `message`)
//!
//! Loading validates the whole manifest and reports every problem at once.

pub mod loader;
pub mod manifest;
pub mod types;

pub use loader::{load, parse_manifest, select, LoadError, ManifestIssue};
pub use manifest::{ManifestFile, MANIFEST_VERSION};
pub use types::{ExpectedDiagnostic, LineSpec, Registry, RegistrySettings, Sample};
